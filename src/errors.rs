use crate::storage::StorageError;
use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::QuotaExceeded { .. } => Self {
                status: StatusCode::INSUFFICIENT_STORAGE,
                message: err.to_string(),
            },
            other => Self::internal(other),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_maps_to_insufficient_storage() {
        let err = AppError::from(StorageError::QuotaExceeded { needed: 2, quota: 1 });
        assert_eq!(err.status, StatusCode::INSUFFICIENT_STORAGE);

        let err = AppError::from(StorageError::Io(std::io::Error::other("disk gone")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("disk gone"));
    }
}
