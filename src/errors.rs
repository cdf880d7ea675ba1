use diesel::r2d2::PoolError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Application-wide error types with user-friendly messages
#[derive(Debug, Error)]
pub enum AppError {
    // Dispatch
    #[error("Command `{0}` does not exist")]
    UnknownCommand(String),

    // Authentication
    #[error("{}", login_required_message(.user_name))]
    AuthenticationRequired { user_name: Option<String> },

    // Validation Errors
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },
    #[error("{resource} not found")]
    ResourceNotFound { resource: String },
    #[error("{resource} already exists")]
    DuplicateResource { resource: String },
    #[error("Referenced record is missing ({detail})")]
    InvalidReference { detail: String },

    // Feed-related Errors
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Unable to parse feed: {0}")]
    FeedParseError(String),

    // Database Errors
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Database connection unavailable")]
    ConnectionPoolError,

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<AppError>,
    },
}

/// Coarse classification of an [`AppError`], looking through any context wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownCommand,
    AuthenticationRequired,
    Validation,
    NotFound,
    ConstraintViolation,
    UpstreamFetch,
    DocumentParse,
    Storage,
    Configuration,
}

fn login_required_message(user_name: &Option<String>) -> String {
    match user_name {
        Some(name) => format!("Login required: user with name {name} does not exist"),
        None => "Login required: no current user is set".to_string(),
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Helper functions for common error conversions
impl AppError {
    pub fn invalid_input(field: &str, message: &str) -> Self {
        AppError::InvalidInput {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn duplicate_resource(resource: &str) -> Self {
        AppError::DuplicateResource {
            resource: resource.to_string(),
        }
    }

    pub fn resource_not_found(resource: &str) -> Self {
        AppError::ResourceNotFound {
            resource: resource.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::UnknownCommand(_) => ErrorKind::UnknownCommand,
            AppError::AuthenticationRequired { .. } => ErrorKind::AuthenticationRequired,
            AppError::InvalidInput { .. } => ErrorKind::Validation,
            AppError::ResourceNotFound { .. } => ErrorKind::NotFound,
            AppError::DuplicateResource { .. } | AppError::InvalidReference { .. } => {
                ErrorKind::ConstraintViolation
            }
            AppError::NetworkError(_) => ErrorKind::UpstreamFetch,
            AppError::FeedParseError(_) => ErrorKind::DocumentParse,
            AppError::DatabaseError(_) | AppError::ConnectionPoolError => ErrorKind::Storage,
            AppError::ConfigurationError(_) => ErrorKind::Configuration,
            AppError::Context { source, .. } => source.kind(),
        }
    }

    /// True only for unique-key collisions; foreign-key failures share the kind but not this.
    pub fn is_duplicate(&self) -> bool {
        match self {
            AppError::DuplicateResource { .. } => true,
            AppError::Context { source, .. } => source.is_duplicate(),
            _ => false,
        }
    }

    fn from_source<E: Into<AppError>>(err: E) -> Self {
        err.into()
    }

    /// Wraps the error with a description of what was being attempted.
    pub fn context(self, context: impl Into<String>) -> Self {
        AppError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Adds context to any result whose error converts into [`AppError`].
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> AppResult<T>;

    fn with_context<C, F>(self, f: F) -> AppResult<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: impl Into<String>) -> AppResult<T> {
        self.map_err(|e| AppError::from_source(e).context(context))
    }

    fn with_context<C, F>(self, f: F) -> AppResult<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| AppError::from_source(e).context(f()))
    }
}

/// Convert database connection pool errors
impl From<PoolError> for AppError {
    fn from(err: PoolError) -> Self {
        log::error!("Database connection pool error: {}", err);
        AppError::ConnectionPoolError
    }
}

/// Convert diesel database errors
impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppError::resource_not_found("Record"),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let message = info.message();
                let resource = message
                    .strip_prefix("UNIQUE constraint failed: ")
                    .unwrap_or(message);
                AppError::duplicate_resource(resource)
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                AppError::InvalidReference {
                    detail: info.message().to_string(),
                }
            }
            _ => {
                log::error!("Database error: {}", err);
                AppError::DatabaseError(err.to_string())
            }
        }
    }
}

/// Convert network/reqwest errors
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        log::warn!("Network error: {}", err);
        AppError::NetworkError(err.to_string())
    }
}

/// Convert feed parsing errors
impl From<feed_rs::parser::ParseFeedError> for AppError {
    fn from(err: feed_rs::parser::ParseFeedError) -> Self {
        log::warn!("Feed parse error: {}", err);
        AppError::FeedParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_sees_through_context() {
        let err = AppError::invalid_input("interval", "bad").context("Unable to start");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Unable to start: Invalid interval: bad");
    }

    #[test]
    fn test_is_duplicate_separates_unique_from_reference_errors() {
        let duplicate = AppError::duplicate_resource("posts.url").context("Unable to save post");
        assert!(duplicate.is_duplicate());

        let reference = AppError::InvalidReference {
            detail: "FOREIGN KEY constraint failed".to_string(),
        }
        .context("Unable to save post");
        assert_eq!(reference.kind(), ErrorKind::ConstraintViolation);
        assert!(!reference.is_duplicate());
    }

    #[test]
    fn test_result_ext_wraps_converted_errors() {
        let res: Result<(), DieselError> = Err(DieselError::NotFound);
        let err = res.context("Feed with url x does not exist").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("Feed with url x does not exist"));
    }

    #[test]
    fn test_login_required_messages() {
        let err = AppError::AuthenticationRequired {
            user_name: Some("bob".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Login required: user with name bob does not exist"
        );
        let err = AppError::AuthenticationRequired { user_name: None };
        assert_eq!(err.kind(), ErrorKind::AuthenticationRequired);
    }
}
