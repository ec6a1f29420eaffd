use consign_config::ConfigError;
use consign_domain::DateRangeError;
use consign_engine::CoreError;
use thiserror::Error;

/// Unified error type for the engine, configuration and storage layers.
#[derive(Error, Debug)]
pub enum ConsignError {
    #[error("Ledger not loaded")]
    LedgerNotLoaded,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Persistence error: {0}")]
    StorageError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ConsignError>;

/// User-facing CLI error wrapper.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ConsignError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<CoreError> for ConsignError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(_)
            | CoreError::VendorNotFound(_)
            | CoreError::ClientNotFound(_)
            | CoreError::BrandNotFound(_)
            | CoreError::CategoryNotFound(_)
            | CoreError::InstallmentPlanNotFound(_)
            | CoreError::LedgerNotFound(_) => ConsignError::NotFound(err.to_string()),
            CoreError::Conflict { .. } => ConsignError::Conflict(err.to_string()),
            CoreError::InvalidOperation(message) | CoreError::Validation(message) => {
                ConsignError::InvalidInput(message)
            }
            CoreError::Storage(message) | CoreError::Serde(message) => {
                ConsignError::StorageError(message)
            }
            CoreError::Io(err) => ConsignError::StorageError(err.to_string()),
        }
    }
}

impl From<ConfigError> for ConsignError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(io) => ConsignError::StorageError(io.to_string()),
            ConfigError::Serde(message) | ConfigError::BackupNotFound(message) => {
                ConsignError::ConfigError(message)
            }
        }
    }
}

impl From<DateRangeError> for ConsignError {
    fn from(err: DateRangeError) -> Self {
        ConsignError::InvalidInput(err.to_string())
    }
}

impl From<std::io::Error> for ConsignError {
    fn from(err: std::io::Error) -> Self {
        ConsignError::StorageError(err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::Core(err.into())
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Core(err.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}
