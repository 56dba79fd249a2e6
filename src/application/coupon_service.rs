use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::cart::{Cart, CustomerContext};
use crate::domain::coupon::{Coupon, CouponSpec};
use crate::domain::engine::{self, Selection};
use crate::domain::errors::DomainError;
use crate::domain::ports::CouponRepository;

pub struct CouponService<R> {
    repo: R,
}

impl<R: CouponRepository> CouponService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validate and store a coupon. A spec without a code gets a generated
    /// one.
    pub fn create_coupon(&self, mut spec: CouponSpec) -> Result<Arc<Coupon>, DomainError> {
        spec.code.get_or_insert_with(generate_code);
        let coupon = spec.validate()?;
        let stored = self.repo.insert(coupon)?;
        log::info!(
            "Created coupon {} ({:?} {})",
            stored.code,
            stored.discount.kind,
            stored.discount.value
        );
        Ok(stored)
    }

    pub fn get_coupon(&self, code: &str) -> Result<Arc<Coupon>, DomainError> {
        self.repo.find(code)?.ok_or(DomainError::NotFound)
    }

    pub fn list_coupons(&self) -> Result<Vec<Arc<Coupon>>, DomainError> {
        self.repo.list_all()
    }

    /// Best coupon for `cart` as of today (UTC).
    pub fn best_coupon(
        &self,
        cart: &Cart,
        customer: &CustomerContext,
    ) -> Result<Selection, DomainError> {
        self.best_coupon_on(cart, customer, Utc::now().date_naive())
    }

    pub fn best_coupon_on(
        &self,
        cart: &Cart,
        customer: &CustomerContext,
        today: NaiveDate,
    ) -> Result<Selection, DomainError> {
        let coupons = self.repo.list_all()?;
        let selection =
            engine::select_best(cart, customer, today, coupons.iter().map(Arc::as_ref))?;

        match &selection {
            Selection::Best(offer) => log::info!(
                "Best coupon {} saves {} on a {}-line cart",
                offer.code,
                offer.discount,
                cart.items.len()
            ),
            Selection::NoneEligible => log::debug!(
                "No eligible coupon among {} for a {}-line cart",
                coupons.len(),
                cart.items.len()
            ),
        }
        Ok(selection)
    }
}

fn generate_code() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}
