use std::collections::BTreeSet;
use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, RoundingMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::cart::{Cart, CustomerContext, LineItem};
use crate::domain::coupon::{
    Coupon, CouponSpec, CustomerRules, Discount, DiscountKind, Restriction,
};
use crate::domain::engine::Selection;
use crate::domain::errors::DomainError;
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountType {
    Percent,
    Flat,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CustomerRulesDto {
    pub allowed_tiers: Option<Vec<String>>,
    pub allowed_countries: Option<Vec<String>>,
    /// Decimal amount as a string, e.g. "250.00"
    pub min_lifetime_spend: Option<String>,
    pub min_orders_placed: Option<u32>,
    #[serde(default)]
    pub first_order_only: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    /// Unique coupon code. Generated by the server when omitted.
    pub code: Option<String>,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Decimal as a string: a percentage in (0, 100] or a flat amount, e.g. "15"
    pub discount_value: String,
    /// Cap on the computed amount for percentage coupons, e.g. "20.00"
    pub max_discount: Option<String>,
    /// Minimum cart subtotal, e.g. "100". Defaults to "0".
    pub min_cart_value: Option<String>,
    /// The coupon applies if any cart line is in one of these categories.
    pub applicable_categories: Option<Vec<String>>,
    /// The coupon applies if any cart line is one of these items.
    pub applicable_items: Option<Vec<String>>,
    /// The coupon never applies if any cart line is in one of these categories.
    pub excluded_categories: Option<Vec<String>>,
    /// Minimum total quantity across all cart lines.
    pub min_items_count: Option<u32>,
    /// Defaults to true.
    pub active: Option<bool>,
    /// First day the coupon is valid (inclusive), e.g. "2026-01-01"
    pub starts_on: Option<NaiveDate>,
    /// Last day the coupon is valid (inclusive)
    pub ends_on: Option<NaiveDate>,
    pub customer: Option<CustomerRulesDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponResponse {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: String,
    pub max_discount: Option<String>,
    pub min_cart_value: String,
    pub applicable_categories: Option<Vec<String>>,
    pub applicable_items: Option<Vec<String>>,
    pub excluded_categories: Vec<String>,
    pub min_items_count: Option<u32>,
    pub active: bool,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub customer: CustomerRulesDto,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartItemRequest {
    pub item_id: String,
    pub category: Option<String>,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartRequest {
    pub items: Vec<CartItemRequest>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CustomerRequest {
    pub tier: Option<String>,
    pub country: Option<String>,
    /// Decimal amount as a string. Defaults to "0".
    pub lifetime_spend: Option<String>,
    #[serde(default)]
    pub orders_placed: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BestCouponRequest {
    pub cart: CartRequest,
    /// Shopper details used by customer rules. Anonymous when omitted.
    #[serde(alias = "user")]
    pub customer: Option<CustomerRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BestCouponResponse {
    /// False when no coupon applies; `code` and `discount` are then null.
    pub eligible: bool,
    pub code: Option<String>,
    pub discount: Option<String>,
    pub subtotal: String,
    pub payable: String,
}

// ── Conversions ──────────────────────────────────────────────────────────────

fn parse_amount<E>(field: &str, raw: &str, err: E) -> Result<BigDecimal, DomainError>
where
    E: FnOnce(String) -> DomainError,
{
    BigDecimal::from_str(raw.trim())
        .map_err(|e| err(format!("{} '{}' is not a valid decimal: {}", field, raw, e)))
}

fn parse_optional_amount(field: &str, raw: Option<&str>) -> Result<Option<BigDecimal>, DomainError> {
    raw.map(|r| parse_amount(field, r, DomainError::Validation))
        .transpose()
}

fn to_set(values: Vec<String>) -> BTreeSet<String> {
    values.into_iter().collect()
}

/// Amounts computed by the engine are always shown to the cent, rounded
/// half-up so that the shown subtotal minus discount equals the shown payable.
fn money(amount: &BigDecimal) -> String {
    amount.with_scale_round(2, RoundingMode::HalfUp).to_string()
}

impl TryFrom<CustomerRulesDto> for CustomerRules {
    type Error = DomainError;

    fn try_from(dto: CustomerRulesDto) -> Result<Self, Self::Error> {
        Ok(CustomerRules {
            allowed_tiers: dto.allowed_tiers.map(to_set),
            allowed_countries: dto.allowed_countries.map(to_set),
            min_lifetime_spend: parse_optional_amount(
                "min_lifetime_spend",
                dto.min_lifetime_spend.as_deref(),
            )?,
            min_orders_placed: dto.min_orders_placed,
            first_order_only: dto.first_order_only,
        })
    }
}

impl TryFrom<CreateCouponRequest> for CouponSpec {
    type Error = DomainError;

    fn try_from(req: CreateCouponRequest) -> Result<Self, Self::Error> {
        let restriction = match (req.applicable_categories, req.applicable_items) {
            (Some(_), Some(_)) => {
                return Err(DomainError::Validation(
                    "only one of applicable_categories and applicable_items may be set"
                        .to_string(),
                ))
            }
            (Some(categories), None) => Restriction::Categories(to_set(categories)),
            (None, Some(items)) => Restriction::Items(to_set(items)),
            (None, None) => Restriction::Unrestricted,
        };

        Ok(CouponSpec {
            code: req.code,
            description: req.description,
            discount: Discount {
                kind: match req.discount_type {
                    DiscountType::Percent => DiscountKind::Percentage,
                    DiscountType::Flat => DiscountKind::Flat,
                },
                value: parse_amount(
                    "discount_value",
                    &req.discount_value,
                    DomainError::Validation,
                )?,
                max_discount: parse_optional_amount("max_discount", req.max_discount.as_deref())?,
            },
            min_cart_value: parse_optional_amount(
                "min_cart_value",
                req.min_cart_value.as_deref(),
            )?
            .unwrap_or_default(),
            restriction,
            excluded_categories: req.excluded_categories.map(to_set).unwrap_or_default(),
            min_items_count: req.min_items_count,
            active: req.active.unwrap_or(true),
            starts_on: req.starts_on,
            ends_on: req.ends_on,
            customer: req.customer.unwrap_or_default().try_into()?,
        })
    }
}

impl From<&Coupon> for CouponResponse {
    fn from(c: &Coupon) -> Self {
        let (applicable_categories, applicable_items) = match &c.restriction {
            Restriction::Unrestricted => (None, None),
            Restriction::Categories(set) => (Some(set.iter().cloned().collect()), None),
            Restriction::Items(set) => (None, Some(set.iter().cloned().collect())),
        };
        CouponResponse {
            code: c.code.clone(),
            description: c.description.clone(),
            discount_type: match c.discount.kind {
                DiscountKind::Percentage => DiscountType::Percent,
                DiscountKind::Flat => DiscountType::Flat,
            },
            discount_value: c.discount.value.to_string(),
            max_discount: c.discount.max_discount.as_ref().map(ToString::to_string),
            min_cart_value: c.min_cart_value.to_string(),
            applicable_categories,
            applicable_items,
            excluded_categories: c.excluded_categories.iter().cloned().collect(),
            min_items_count: c.min_items_count,
            active: c.active,
            starts_on: c.starts_on,
            ends_on: c.ends_on,
            customer: CustomerRulesDto {
                allowed_tiers: c
                    .customer
                    .allowed_tiers
                    .as_ref()
                    .map(|s| s.iter().cloned().collect()),
                allowed_countries: c
                    .customer
                    .allowed_countries
                    .as_ref()
                    .map(|s| s.iter().cloned().collect()),
                min_lifetime_spend: c
                    .customer
                    .min_lifetime_spend
                    .as_ref()
                    .map(ToString::to_string),
                min_orders_placed: c.customer.min_orders_placed,
                first_order_only: c.customer.first_order_only,
            },
        }
    }
}

impl TryFrom<CartRequest> for Cart {
    type Error = DomainError;

    fn try_from(req: CartRequest) -> Result<Self, Self::Error> {
        let items = req
            .items
            .into_iter()
            .map(|i| {
                let unit_price = parse_amount("unit_price", &i.unit_price, DomainError::InvalidCart)?;
                Ok(LineItem {
                    item_id: i.item_id,
                    category: i.category,
                    unit_price,
                    quantity: i.quantity,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        Ok(Cart::new(items))
    }
}

impl TryFrom<CustomerRequest> for CustomerContext {
    type Error = DomainError;

    fn try_from(req: CustomerRequest) -> Result<Self, Self::Error> {
        let lifetime_spend = match req.lifetime_spend.as_deref() {
            Some(raw) => parse_amount("lifetime_spend", raw, DomainError::InvalidCustomer)?,
            None => BigDecimal::from(0),
        };
        Ok(CustomerContext {
            tier: req.tier,
            country: req.country,
            lifetime_spend,
            orders_placed: req.orders_placed,
        })
    }
}

impl BestCouponResponse {
    fn new(selection: Selection, subtotal: &BigDecimal) -> Self {
        match selection {
            Selection::Best(offer) => BestCouponResponse {
                eligible: true,
                code: Some(offer.code),
                discount: Some(money(&offer.discount)),
                subtotal: money(subtotal),
                payable: money(&offer.payable),
            },
            Selection::NoneEligible => BestCouponResponse {
                eligible: false,
                code: None,
                discount: None,
                subtotal: money(subtotal),
                payable: money(subtotal),
            },
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /coupons
///
/// Validates and stores a new coupon. Coupons live only as long as the
/// process.
#[utoipa::path(
    post,
    path = "/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = CouponResponse),
        (status = 400, description = "Malformed request body"),
        (status = 409, description = "A coupon with this code already exists"),
        (status = 422, description = "Coupon rules are invalid"),
    ),
    tag = "coupons"
)]
pub async fn create_coupon(
    service: web::Data<AppState>,
    body: web::Json<CreateCouponRequest>,
) -> Result<HttpResponse, AppError> {
    let spec = CouponSpec::try_from(body.into_inner())?;
    let coupon = service.create_coupon(spec)?;
    Ok(HttpResponse::Created().json(CouponResponse::from(coupon.as_ref())))
}

/// GET /coupons
///
/// Returns every coupon in creation order.
#[utoipa::path(
    get,
    path = "/coupons",
    responses(
        (status = 200, description = "All coupons", body = [CouponResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "coupons"
)]
pub async fn list_coupons(service: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let coupons: Vec<CouponResponse> = service
        .list_coupons()?
        .iter()
        .map(|c| CouponResponse::from(c.as_ref()))
        .collect();
    Ok(HttpResponse::Ok().json(coupons))
}

/// GET /coupons/{code}
#[utoipa::path(
    get,
    path = "/coupons/{code}",
    params(
        ("code" = String, Path, description = "Coupon code"),
    ),
    responses(
        (status = 200, description = "Coupon found", body = CouponResponse),
        (status = 404, description = "Coupon not found"),
    ),
    tag = "coupons"
)]
pub async fn get_coupon(
    service: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let coupon = service.get_coupon(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(CouponResponse::from(coupon.as_ref())))
}

/// POST /best-coupon
///
/// Picks the coupon that saves the most on the submitted cart. Finding none
/// is a normal `200` answer with `eligible: false`.
#[utoipa::path(
    post,
    path = "/best-coupon",
    request_body = BestCouponRequest,
    responses(
        (status = 200, description = "Selection result", body = BestCouponResponse),
        (status = 400, description = "Cart is empty or has invalid lines"),
    ),
    tag = "coupons"
)]
pub async fn best_coupon(
    service: web::Data<AppState>,
    body: web::Json<BestCouponRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let cart = Cart::try_from(body.cart)?;
    let customer = match body.customer {
        Some(c) => CustomerContext::try_from(c)?,
        None => CustomerContext::default(),
    };

    let selection = service.best_coupon(&cart, &customer)?;
    Ok(HttpResponse::Ok().json(BestCouponResponse::new(selection, &cart.subtotal())))
}
