use thiserror::Error;

use super::repos::RepoError;

/// Error surface for the read-side services.
///
/// Admin mutation services carry their own error enums; this is what the
/// catalog and rating paths hand to embedders.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("resource not found")]
    NotFound,
    #[error("authentication required")]
    Unauthorized,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("store temporarily unavailable: {0}")]
    TransientStore(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<RepoError> for AppError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound => AppError::NotFound,
            RepoError::Duplicate { constraint } => {
                AppError::Validation(format!("duplicate value for `{constraint}`"))
            }
            RepoError::InvalidInput { message } => AppError::Validation(message),
            RepoError::Timeout => AppError::TransientStore("database timeout".to_string()),
            RepoError::Persistence(message) => AppError::TransientStore(message),
            RepoError::Integrity { message } => AppError::unexpected(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_errors_map_to_app_taxonomy() {
        assert!(matches!(
            AppError::from(RepoError::NotFound),
            AppError::NotFound
        ));
        assert!(matches!(
            AppError::from(RepoError::Duplicate {
                constraint: "tools_slug_key".to_string()
            }),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(RepoError::Timeout),
            AppError::TransientStore(_)
        ));
        assert!(matches!(
            AppError::from(RepoError::Integrity {
                message: "orphaned rating row".to_string()
            }),
            AppError::Unexpected(_)
        ));
    }
}
