use std::collections::BTreeSet;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountKind {
    Percentage,
    Flat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Discount {
    pub kind: DiscountKind,
    /// Percent (0, 100] for percentage coupons, an amount for flat ones.
    pub value: BigDecimal,
    /// Upper bound on the computed amount. Only binds percentage coupons.
    pub max_discount: Option<BigDecimal>,
}

/// Which cart lines make a coupon applicable. A restricted coupon applies
/// when at least one line matches (any-match).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Restriction {
    #[default]
    Unrestricted,
    Categories(BTreeSet<String>),
    Items(BTreeSet<String>),
}

/// Rules on the shopper rather than on the cart. Every rule left unset
/// passes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomerRules {
    pub allowed_tiers: Option<BTreeSet<String>>,
    pub allowed_countries: Option<BTreeSet<String>>,
    pub min_lifetime_spend: Option<BigDecimal>,
    pub min_orders_placed: Option<u32>,
    pub first_order_only: bool,
}

/// A coupon as submitted for creation, before its invariants are checked.
#[derive(Debug, Clone)]
pub struct CouponSpec {
    pub code: Option<String>,
    pub description: Option<String>,
    pub discount: Discount,
    pub min_cart_value: BigDecimal,
    pub restriction: Restriction,
    pub excluded_categories: BTreeSet<String>,
    pub min_items_count: Option<u32>,
    pub active: bool,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub customer: CustomerRules,
}

/// A stored coupon. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    pub code: String,
    pub description: Option<String>,
    pub discount: Discount,
    pub min_cart_value: BigDecimal,
    pub restriction: Restriction,
    pub excluded_categories: BTreeSet<String>,
    pub min_items_count: Option<u32>,
    pub active: bool,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub customer: CustomerRules,
}

impl CouponSpec {
    /// Check every creation-time invariant and produce the coupon to store.
    ///
    /// The code must already be resolved; an absent or blank code is a
    /// validation failure.
    pub fn validate(self) -> Result<Coupon, DomainError> {
        let code = self
            .code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| invalid("code must not be empty"))?;

        let zero = BigDecimal::from(0);
        if self.discount.value <= zero {
            return Err(invalid("discount_value must be greater than 0"));
        }
        if self.discount.kind == DiscountKind::Percentage
            && self.discount.value > BigDecimal::from(100)
        {
            return Err(invalid("percentage discount_value must not exceed 100"));
        }
        if matches!(&self.discount.max_discount, Some(cap) if *cap <= zero) {
            return Err(invalid("max_discount must be greater than 0"));
        }
        if self.min_cart_value < zero {
            return Err(invalid("min_cart_value must not be negative"));
        }
        match &self.restriction {
            Restriction::Categories(set) if set.is_empty() => {
                return Err(invalid("applicable_categories must not be empty"));
            }
            Restriction::Items(set) if set.is_empty() => {
                return Err(invalid("applicable_items must not be empty"));
            }
            _ => {}
        }
        if self.min_items_count == Some(0) {
            return Err(invalid("min_items_count must be greater than 0"));
        }
        if self.customer.min_orders_placed == Some(0) {
            return Err(invalid("min_orders_placed must be greater than 0"));
        }
        if let (Some(start), Some(end)) = (self.starts_on, self.ends_on) {
            if start > end {
                return Err(invalid("starts_on must not be after ends_on"));
            }
        }
        if matches!(&self.customer.min_lifetime_spend, Some(spend) if *spend < zero) {
            return Err(invalid("min_lifetime_spend must not be negative"));
        }
        if matches!(&self.customer.allowed_tiers, Some(set) if set.is_empty()) {
            return Err(invalid("allowed_tiers must not be empty"));
        }
        if matches!(&self.customer.allowed_countries, Some(set) if set.is_empty()) {
            return Err(invalid("allowed_countries must not be empty"));
        }

        Ok(Coupon {
            code,
            description: self.description,
            discount: self.discount,
            min_cart_value: self.min_cart_value,
            restriction: self.restriction,
            excluded_categories: self.excluded_categories,
            min_items_count: self.min_items_count,
            active: self.active,
            starts_on: self.starts_on,
            ends_on: self.ends_on,
            customer: self.customer,
        })
    }
}

impl Coupon {
    /// Whether `day` falls inside the coupon's inclusive validity window.
    pub fn is_valid_on(&self, day: NaiveDate) -> bool {
        self.active
            && self.starts_on.map_or(true, |start| start <= day)
            && self.ends_on.map_or(true, |end| day <= end)
    }
}

fn invalid(msg: &str) -> DomainError {
    DomainError::Validation(msg.to_string())
}
