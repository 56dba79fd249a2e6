use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::coupon::Coupon;
use crate::domain::errors::DomainError;
use crate::domain::ports::CouponRepository;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl<T> From<PoisonError<T>> for DomainError {
    fn from(e: PoisonError<T>) -> Self {
        DomainError::Internal(format!("coupon store lock poisoned: {}", e))
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Coupons {
    by_code: HashMap<String, usize>,
    ordered: Vec<Arc<Coupon>>,
}

/// Process-lifetime coupon store. Starts empty and is gone when the process
/// exits; nothing is ever written to disk.
#[derive(Debug, Default)]
pub struct InMemoryCouponRepository {
    coupons: RwLock<Coupons>,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CouponRepository for InMemoryCouponRepository {
    fn insert(&self, coupon: Coupon) -> Result<Arc<Coupon>, DomainError> {
        let mut coupons = self.coupons.write()?;

        if coupons.by_code.contains_key(&coupon.code) {
            return Err(DomainError::DuplicateIdentifier(coupon.code));
        }

        let coupon = Arc::new(coupon);
        let position = coupons.ordered.len();
        coupons.by_code.insert(coupon.code.clone(), position);
        coupons.ordered.push(Arc::clone(&coupon));
        Ok(coupon)
    }

    fn find(&self, code: &str) -> Result<Option<Arc<Coupon>>, DomainError> {
        let coupons = self.coupons.read()?;
        Ok(coupons
            .by_code
            .get(code)
            .map(|&i| Arc::clone(&coupons.ordered[i])))
    }

    fn list_all(&self) -> Result<Vec<Arc<Coupon>>, DomainError> {
        Ok(self.coupons.read()?.ordered.clone())
    }
}
