use thiserror::Error;
use uuid::Uuid;

use consign_domain::DateRangeError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),
    #[error("Vendor not found: {0}")]
    VendorNotFound(Uuid),
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),
    #[error("Brand not found: {0}")]
    BrandNotFound(Uuid),
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),
    #[error("Installment plan not found: {0}")]
    InstallmentPlanNotFound(Uuid),
    #[error("Ledger not found: {0}")]
    LedgerNotFound(String),
    #[error("{entity} {id} is still referenced by {references} record(s)")]
    Conflict {
        entity: &'static str,
        id: Uuid,
        references: usize,
    },
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<DateRangeError> for CoreError {
    fn from(err: DateRangeError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
