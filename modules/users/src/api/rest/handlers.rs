use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use tracing::{error, info};

use crate::api::rest::dto::{CreateUserReq, UpdateUserReq, UserDto};
use crate::api::rest::error::{
    map_domain_error, map_json_rejection, map_path_rejection, user_not_found,
};
use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::service::Service;

/// List all users ordered by id
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = [UserDto]),
        (status = 500, description = "Internal error", body = Problem, content_type = "application/problem+json")
    ),
    tag = "users",
    operation_id = "users.list"
)]
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
) -> Result<Json<Vec<UserDto>>, ProblemResponse> {
    info!("Listing users");

    match svc.list_users().await {
        Ok(users) => Ok(Json(users.into_iter().map(UserDto::from).collect())),
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserDto),
        (status = 404, description = "No such user", body = Problem, content_type = "application/problem+json")
    ),
    tag = "users",
    operation_id = "users.get"
)]
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    path: Result<Path<i32>, PathRejection>,
    uri: Uri,
) -> Result<Json<UserDto>, ProblemResponse> {
    let Path(id) = path.map_err(|r| map_path_rejection(&r, uri.path()))?;
    info!("Getting user with id: {}", id);

    match svc.get_user(id).await {
        Ok(Some(user)) => Ok(Json(UserDto::from(user))),
        Ok(None) => Err(user_not_found(id, uri.path())),
        Err(e) => {
            error!("Failed to get user {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "Created", body = UserDto),
        (status = 400, description = "Validation failed", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Email already in use", body = Problem, content_type = "application/problem+json")
    ),
    tag = "users",
    operation_id = "users.create"
)]
pub async fn create_user(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    let Json(req_body) = body.map_err(|r| map_json_rejection(&r, uri.path()))?;
    info!("Creating user: {:?}", req_body);

    match svc.create_user(req_body.into()).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserDto::from(user)))),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateUserReq,
    responses(
        (status = 200, description = "Updated", body = UserDto),
        (status = 400, description = "Validation failed", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "No such user", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Email already in use", body = Problem, content_type = "application/problem+json")
    ),
    tag = "users",
    operation_id = "users.update"
)]
pub async fn update_user(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<UpdateUserReq>, JsonRejection>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let Path(id) = path.map_err(|r| map_path_rejection(&r, uri.path()))?;
    let Json(req_body) = body.map_err(|r| map_json_rejection(&r, uri.path()))?;
    info!("Updating user {} with: {:?}", id, req_body);

    match svc.update_user(id, req_body.into()).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to update user {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete a user by ID
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such user", body = Problem, content_type = "application/problem+json")
    ),
    tag = "users",
    operation_id = "users.delete"
)]
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    path: Result<Path<i32>, PathRejection>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    let Path(id) = path.map_err(|r| map_path_rejection(&r, uri.path()))?;
    info!("Deleting user: {}", id);

    match svc.delete_user(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(user_not_found(id, uri.path())),
        Err(e) => {
            error!("Failed to delete user {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}
