//! Coupon eligibility and best-offer selection.
//!
//! Everything here is a pure function of the cart, the customer, the
//! evaluation date and the coupons passed in. Nothing is stored or mutated.

use std::cmp::{min, Ordering};
use std::collections::BTreeSet;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::NaiveDate;

use super::cart::{Cart, CustomerContext};
use super::coupon::{Coupon, CustomerRules, DiscountKind, Restriction};
use super::errors::DomainError;

/// Discounts are reported to the cent.
const MONEY_SCALE: i64 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct BestOffer {
    pub code: String,
    pub discount: BigDecimal,
    pub payable: BigDecimal,
}

/// Outcome of a selection. Finding no coupon is a normal result.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Best(BestOffer),
    NoneEligible,
}

/// Everything a coupon is evaluated against, with the cart totals computed
/// once up front.
#[derive(Debug)]
pub struct Evaluation<'a> {
    pub cart: &'a Cart,
    pub customer: &'a CustomerContext,
    pub today: NaiveDate,
    pub subtotal: BigDecimal,
    pub total_quantity: i64,
}

impl<'a> Evaluation<'a> {
    pub fn new(cart: &'a Cart, customer: &'a CustomerContext, today: NaiveDate) -> Self {
        Self {
            cart,
            customer,
            today,
            subtotal: cart.subtotal(),
            total_quantity: cart.total_quantity(),
        }
    }
}

/// Whether every applicability rule of `coupon` holds.
pub fn is_eligible(coupon: &Coupon, eval: &Evaluation<'_>) -> bool {
    coupon.is_valid_on(eval.today)
        && eval.subtotal >= coupon.min_cart_value
        && restriction_matches(&coupon.restriction, eval.cart)
        && !eval
            .cart
            .categories()
            .any(|c| coupon.excluded_categories.contains(c))
        && coupon
            .min_items_count
            .map_or(true, |n| eval.total_quantity >= i64::from(n))
        && customer_matches(&coupon.customer, eval.customer)
}

/// Any-match: one matching line is enough. Lines without a category never
/// match a category restriction.
fn restriction_matches(restriction: &Restriction, cart: &Cart) -> bool {
    match restriction {
        Restriction::Unrestricted => true,
        Restriction::Categories(set) => cart.categories().any(|c| set.contains(c)),
        Restriction::Items(set) => cart.item_ids().any(|id| set.contains(id)),
    }
}

fn customer_matches(rules: &CustomerRules, customer: &CustomerContext) -> bool {
    allowed(&rules.allowed_tiers, &customer.tier)
        && allowed(&rules.allowed_countries, &customer.country)
        && rules
            .min_lifetime_spend
            .as_ref()
            .map_or(true, |min| customer.lifetime_spend >= *min)
        && rules
            .min_orders_placed
            .map_or(true, |min| customer.orders_placed >= min)
        && (!rules.first_order_only || customer.orders_placed == 0)
}

/// An unset allow-list admits everyone; a set one rejects a missing value.
fn allowed(set: &Option<BTreeSet<String>>, value: &Option<String>) -> bool {
    match (set, value) {
        (None, _) => true,
        (Some(set), Some(v)) => set.contains(v),
        (Some(_), None) => false,
    }
}

/// The amount `coupon` takes off `subtotal`, never more than the subtotal
/// itself.
///
/// Percentages are rounded half-up to the cent before the cap applies. The
/// clamped amount is then truncated to whole cents, so a cap or subtotal
/// with sub-cent digits is never exceeded.
pub fn compute_discount(coupon: &Coupon, subtotal: &BigDecimal) -> BigDecimal {
    let raw = match coupon.discount.kind {
        DiscountKind::Flat => coupon.discount.value.clone(),
        DiscountKind::Percentage => {
            let pct = (subtotal.clone() * coupon.discount.value.clone() / BigDecimal::from(100))
                .with_scale_round(MONEY_SCALE, RoundingMode::HalfUp);
            match &coupon.discount.max_discount {
                Some(cap) => min(pct, cap.clone()),
                None => pct,
            }
        }
    };
    min(raw, subtotal.clone()).with_scale_round(MONEY_SCALE, RoundingMode::Down)
}

/// Pick the coupon giving the largest discount on `cart`.
///
/// Ties go to the lower `min_cart_value`, then to whichever coupon comes
/// first in `coupons`. A coupon whose discount works out to zero is never
/// offered.
pub fn select_best<'c, I>(
    cart: &Cart,
    customer: &CustomerContext,
    today: NaiveDate,
    coupons: I,
) -> Result<Selection, DomainError>
where
    I: IntoIterator<Item = &'c Coupon>,
{
    cart.validate()?;
    customer.validate()?;
    let eval = Evaluation::new(cart, customer, today);
    let zero = BigDecimal::from(0);

    let mut best: Option<(&Coupon, BigDecimal)> = None;
    for coupon in coupons {
        if !is_eligible(coupon, &eval) {
            continue;
        }
        let discount = compute_discount(coupon, &eval.subtotal);
        if discount <= zero {
            continue;
        }
        let better = match &best {
            None => true,
            Some((current, current_discount)) => match discount.cmp(current_discount) {
                Ordering::Greater => true,
                Ordering::Equal => coupon.min_cart_value < current.min_cart_value,
                Ordering::Less => false,
            },
        };
        if better {
            best = Some((coupon, discount));
        }
    }

    Ok(match best {
        Some((coupon, discount)) => Selection::Best(BestOffer {
            code: coupon.code.clone(),
            payable: eval.subtotal.clone() - discount.clone(),
            discount,
        }),
        None => Selection::NoneEligible,
    })
}
