use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
};

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.userhub.dev/{}", code))
        .with_code(code)
        .with_instance(instance);

    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "USERS_NOT_FOUND",
            "User not found",
            format!("User with id {} was not found", id),
            instance,
        ),
        DomainError::EmailAlreadyExists { email } => from_parts(
            StatusCode::CONFLICT,
            "USERS_EMAIL_CONFLICT",
            "Email already exists",
            format!("Email '{}' is already in use", email),
            instance,
        ),
        DomainError::Validation { field, message } => from_parts(
            StatusCode::BAD_REQUEST,
            "USERS_VALIDATION",
            "Validation error",
            format!("{field}: {message}"),
            instance,
        ),
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_DB",
                "Internal error",
                "An internal database error occurred",
                instance,
            )
        }
    }
}

/// Undecodable request bodies are reported like any other validation failure.
pub fn map_json_rejection(rejection: &JsonRejection, instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::BAD_REQUEST,
        "USERS_VALIDATION",
        "Validation error",
        format!("invalid request body: {}", rejection.body_text()),
        instance,
    )
}

/// A path segment that does not parse as a user id.
pub fn map_path_rejection(rejection: &PathRejection, instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::BAD_REQUEST,
        "USERS_VALIDATION",
        "Validation error",
        format!("invalid user id: {}", rejection.body_text()),
        instance,
    )
}

/// The not-found problem for a lookup that returned nothing.
pub fn user_not_found(id: i32, instance: &str) -> ProblemResponse {
    map_domain_error(&DomainError::user_not_found(id), instance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses_and_codes() {
        let cases = [
            (DomainError::user_not_found(3), 404, "USERS_NOT_FOUND"),
            (
                DomainError::email_already_exists("a@b.c"),
                409,
                "USERS_EMAIL_CONFLICT",
            ),
            (
                DomainError::validation("age", "must not be negative"),
                400,
                "USERS_VALIDATION",
            ),
            (DomainError::database("disk I/O error"), 500, "INTERNAL_DB"),
        ];
        for (err, status, code) in cases {
            let ProblemResponse(p) = map_domain_error(&err, "/api/users");
            assert_eq!(p.status, status);
            assert_eq!(p.code, code);
            assert_eq!(p.instance, "/api/users");
        }
    }

    #[test]
    fn database_detail_is_not_exposed() {
        let ProblemResponse(p) =
            map_domain_error(&DomainError::database("secret table name"), "/api/users");
        assert!(!p.detail.contains("secret"));
    }
}
