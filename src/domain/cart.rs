use bigdecimal::BigDecimal;

use super::errors::DomainError;

#[derive(Debug, Clone)]
pub struct LineItem {
    pub item_id: String,
    pub category: Option<String>,
    pub unit_price: BigDecimal,
    pub quantity: i32,
}

/// A cart submitted for evaluation. Never stored.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    pub items: Vec<LineItem>,
}

impl Cart {
    pub fn new(items: Vec<LineItem>) -> Self {
        Self { items }
    }

    /// A cart must have at least one line, every quantity must be positive
    /// and no unit price may be negative.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::InvalidCart(
                "cart must contain at least one item".to_string(),
            ));
        }
        let zero = BigDecimal::from(0);
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(DomainError::InvalidCart(format!(
                    "quantity for item '{}' must be greater than 0",
                    item.item_id
                )));
            }
            if item.unit_price < zero {
                return Err(DomainError::InvalidCart(format!(
                    "unit_price for item '{}' must not be negative",
                    item.item_id
                )));
            }
        }
        Ok(())
    }

    /// Sum of unit price times quantity over every line.
    pub fn subtotal(&self) -> BigDecimal {
        self.items
            .iter()
            .map(|i| i.unit_price.clone() * BigDecimal::from(i.quantity))
            .sum()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|i| i.category.as_deref())
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.item_id.as_str())
    }
}

/// Who is shopping. Defaults to an anonymous first-time customer.
#[derive(Debug, Clone, Default)]
pub struct CustomerContext {
    pub tier: Option<String>,
    pub country: Option<String>,
    pub lifetime_spend: BigDecimal,
    pub orders_placed: u32,
}

impl CustomerContext {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.lifetime_spend < BigDecimal::from(0) {
            return Err(DomainError::InvalidCustomer(
                "lifetime_spend must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
