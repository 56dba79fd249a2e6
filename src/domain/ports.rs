use std::sync::Arc;

use super::coupon::Coupon;
use super::errors::DomainError;

/// Storage for coupons. Implementations only ever grow: there is no update
/// or delete.
pub trait CouponRepository: Send + Sync + 'static {
    /// Insert a validated coupon, failing with
    /// [`DomainError::DuplicateIdentifier`] if its code is already taken.
    fn insert(&self, coupon: Coupon) -> Result<Arc<Coupon>, DomainError>;
    fn find(&self, code: &str) -> Result<Option<Arc<Coupon>>, DomainError>;
    /// Snapshot of every coupon in insertion order.
    fn list_all(&self) -> Result<Vec<Arc<Coupon>>, DomainError>;
}
