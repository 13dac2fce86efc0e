use crate::application::content::ContentError;
use crate::application::error::ErrorReport;
use crate::domain::error::DomainError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

const SOURCE: &str = "infra::http::api";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const UNKNOWN_COLLECTION: &str = "unknown_collection";
    pub const INVALID_LANGUAGE: &str = "invalid_language";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const CORRUPT_CONTENT: &str = "corrupt_content";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    /// Diagnostic chain for the response log; never serialized.
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            report: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn rate_limited(retry_after: u64) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: codes::RATE_LIMITED.to_string(),
                message: "Rate limit exceeded".to_string(),
                hint: Some(format!("Retry after {retry_after} seconds")),
            },
        };
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, value);
        }
        ErrorReport::from_message(
            "infra::http::api::rate_limit",
            StatusCode::TOO_MANY_REQUESTS,
            format!("rate_limited: retry_after={retry_after}"),
        )
        .attach(&mut response);
        response
    }

    fn with_report(mut self, error: &dyn std::error::Error) -> Self {
        self.report = Some(ErrorReport::from_error(SOURCE, self.status, error));
        self
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let hint = Some(err.to_string());
        match err {
            DomainError::UnknownCollection { .. } => Self::new(
                StatusCode::NOT_FOUND,
                codes::UNKNOWN_COLLECTION,
                "Unknown collection",
                hint,
            ),
            DomainError::InvalidLanguage { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_LANGUAGE,
                "Invalid language code",
                hint,
            ),
            DomainError::Validation { .. } => Self::bad_request("Invalid request", hint),
        }
    }
}

/// Map a store failure to a response. Integrity and I/O details are only
/// exposed as a hint when `expose_detail` is set.
pub fn content_to_api(err: ContentError, expose_detail: bool) -> ApiError {
    let detail = expose_detail.then(|| err.to_string());
    let api = match &err {
        ContentError::Validation(domain) => return ApiError::from(domain.clone()),
        ContentError::Corrupt { .. } | ContentError::Schema { .. } => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::CORRUPT_CONTENT,
            "Stored content is unreadable",
            detail,
        ),
        ContentError::Repo(_) | ContentError::Encode { .. } => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Content storage failure",
            detail,
        ),
    };
    api.with_report(&err)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                SOURCE,
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message)
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::RepoError;

    #[test]
    fn io_failure_hides_detail_outside_development() {
        let err = ContentError::Repo(RepoError::io(
            "content/projects_de.json",
            std::io::Error::other("disk on fire"),
        ));
        let api = content_to_api(err, false);
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.code(), codes::INTERNAL);
        assert!(api.hint.is_none());
        assert!(
            api.report
                .as_ref()
                .is_some_and(|report| report.messages.iter().any(|m| m.contains("disk on fire")))
        );
    }

    #[test]
    fn unknown_collection_is_not_found() {
        let api = ApiError::from(DomainError::unknown_collection("albums"));
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
        assert_eq!(api.code(), codes::UNKNOWN_COLLECTION);
    }
}
