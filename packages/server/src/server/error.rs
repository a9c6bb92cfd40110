//! JSON error responses for the HTTP API.

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domains::search::SearchError;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(flatten)]
    rate_limit: Option<RateLimitInfo>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    rate_limit: Option<RateLimitInfo>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            rate_limit: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        if err.is_server_error() {
            tracing::error!(error = ?err, "Search failed");
        }

        let message = err.to_string();
        match err {
            SearchError::InvalidQuery => ApiError::bad_request(message),
            SearchError::HostForbidden => ApiError::new(StatusCode::FORBIDDEN, message),
            SearchError::BudgetExceeded => ApiError::new(StatusCode::TOO_MANY_REQUESTS, message),
            SearchError::RateLimited {
                limit,
                remaining,
                reset,
            } => ApiError {
                status: StatusCode::TOO_MANY_REQUESTS,
                message,
                rate_limit: Some(RateLimitInfo {
                    limit,
                    remaining,
                    reset,
                }),
            },
            SearchError::NeedSearch(_) | SearchError::ProviderFetch(_) | SearchError::Internal(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(info) = self.rate_limit {
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(info.limit));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(info.remaining));
            headers.insert(X_RATELIMIT_RESET, HeaderValue::from(info.reset));
        }

        let body = ErrorBody {
            error: self.message,
            rate_limit: self.rate_limit,
        };
        (self.status, headers, Json(body)).into_response()
    }
}
