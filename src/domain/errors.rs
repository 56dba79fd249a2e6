use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid coupon: {0}")]
    Validation(String),
    #[error("Coupon '{0}' already exists")]
    DuplicateIdentifier(String),
    #[error("Invalid cart: {0}")]
    InvalidCart(String),
    #[error("Invalid customer: {0}")]
    InvalidCustomer(String),
    #[error("Coupon not found")]
    NotFound,
    #[error("Internal error: {0}")]
    Internal(String),
}
