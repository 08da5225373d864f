use utoipa::OpenApi;

use crate::api::rest::dto::{CreateUserReq, UpdateUserReq, UserDto};
use crate::api::rest::problem::Problem;

/// OpenAPI document for the users REST endpoints.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::rest::handlers::list_users,
        crate::api::rest::handlers::get_user,
        crate::api::rest::handlers::create_user,
        crate::api::rest::handlers::update_user,
        crate::api::rest::handlers::delete_user,
    ),
    components(schemas(UserDto, CreateUserReq, UpdateUserReq, Problem)),
    tags((name = "users", description = "User management"))
)]
pub struct UsersApiDoc;
