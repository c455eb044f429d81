use thiserror::Error;
use uuid::Uuid;

/// Result type for calculation operations
pub type CalculationResult<T> = Result<T, CalculationError>;

/// Errors that can occur in the calculations domain
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Calculation not found
    #[error("Calculation not found: {0}")]
    NotFound(Uuid),

    /// Offer not found
    #[error("Offer not found: {0}")]
    OfferNotFound(Uuid),

    /// A lifecycle precondition was rejected
    #[error("{0}")]
    InvalidState(String),

    /// An offer for this leasing company already exists on the calculation.
    /// Callers should update the existing offer instead.
    #[error("Leasing company {leasing_company_id} already has an offer on calculation {calculation_id}")]
    DuplicateOffer {
        calculation_id: Uuid,
        leasing_company_id: Uuid,
    },

    /// Invalid input data
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}
