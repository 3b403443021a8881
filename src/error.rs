use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Every failure a request can end with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No token, authorization denied")]
    Unauthenticated,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("User already exists")]
    DuplicateUser,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Already in your watchlist")]
    AlreadyExists,
    #[error("{0}")]
    Validation(String),
    #[error("store unavailable")]
    StoreUnavailable(#[from] sqlx::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::DuplicateUser => "DUPLICATE_USER",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::Validation(_) => "VALIDATION",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::DuplicateUser
            | Self::UserNotFound
            | Self::InvalidCredentials
            | Self::AlreadyExists
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 5xx bodies stay generic, the cause only goes to the log.
        match &self {
            Self::StoreUnavailable(e) => {
                tracing::error!(error = %e, kind = self.kind(), "store error");
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, kind = self.kind(), "internal error");
            }
            _ => {}
        }
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn gate_errors_are_unauthorized() {
        let (status, json) = body_json(AppError::Unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "UNAUTHENTICATED");
        assert_eq!(json["message"], "No token, authorization denied");

        let (status, json) = body_json(AppError::InvalidToken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Token is not valid");
    }

    #[tokio::test]
    async fn client_errors_are_bad_request() {
        for err in [
            AppError::DuplicateUser,
            AppError::UserNotFound,
            AppError::InvalidCredentials,
            AppError::AlreadyExists,
            AppError::Validation("title is required".into()),
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{}", err.kind());
        }
        let (_, json) = body_json(AppError::AlreadyExists).await;
        assert_eq!(json["error"], "ALREADY_EXISTS");
        assert_eq!(json["message"], "Already in your watchlist");
    }

    #[tokio::test]
    async fn internal_errors_hide_the_cause() {
        let (status, json) =
            body_json(AppError::Internal(anyhow::anyhow!("secret connection string"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "internal error");
        assert!(!json.to_string().contains("secret"));

        let (status, json) = body_json(AppError::StoreUnavailable(sqlx::Error::PoolTimedOut)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "STORE_UNAVAILABLE");
    }
}
