use thiserror::Error;

#[derive(Error, Debug)]
pub enum AscentError {
    #[error("Unrecognized requirement line: {0}")]
    RequirementParse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    IndexStatus(String),

    #[error("{0}")]
    VersionResolution(String),

    #[error("Invalid version {0}")]
    InvalidVersion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported package index: {0}")]
    UnsupportedIndex(String),

    #[error("Package installation failed: {0}")]
    Installation(String),

    #[error("Virtual environment check failed")]
    VirtualenvMissing,

    #[error("{0}")]
    Selection(String),

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AscentError {
    /// Failures that only affect a single package and must not stop a batch.
    pub fn is_package_local(&self) -> bool {
        matches!(
            self,
            AscentError::RequirementParse(_)
                | AscentError::Network(_)
                | AscentError::IndexStatus(_)
                | AscentError::VersionResolution(_)
                | AscentError::InvalidVersion(_)
                | AscentError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AscentError>;
