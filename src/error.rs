use csync_core::{FsError, FsErrorKind};
use thiserror::Error;

/// Everything the application layer can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Fs(#[from] FsError),

    #[error("invalid whitelist record: {0}")]
    InvalidRecord(String),

    #[error("malformed JSON in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// Process exit status for this error.
    ///
    /// 2 configuration, 3 connection or transport, 4 filesystem,
    /// 5 invalid input data.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => 2,
            AppError::InvalidRecord(_) | AppError::Json { .. } => 5,
            AppError::Fs(e) => match e.kind {
                FsErrorKind::Configuration => 2,
                FsErrorKind::Connection | FsErrorKind::Transfer | FsErrorKind::Protocol => 3,
                FsErrorKind::NotFound | FsErrorKind::AlreadyExists | FsErrorKind::Io => 4,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(AppError::Config("x".into()).exit_code(), 2);
        assert_eq!(AppError::from(FsError::configuration("bad engine")).exit_code(), 2);
        assert_eq!(AppError::from(FsError::connection("refused")).exit_code(), 3);
        assert_eq!(AppError::from(FsError::transfer("reset")).exit_code(), 3);
        assert_eq!(AppError::from(FsError::not_found("gone")).exit_code(), 4);
        assert_eq!(AppError::from(FsError::already_exists("dup")).exit_code(), 4);
        assert_eq!(AppError::InvalidRecord("id".into()).exit_code(), 5);
    }
}
