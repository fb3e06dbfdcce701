//! Cart consolidation.
//!
//! A cart is a request-scoped value rebuilt from add/set/remove events. Every
//! line satisfies `0 < quantity <= stock` against the stock supplied when
//! the event is applied: increases are clamped silently, never rejected.
//! Unknown or inactive products have an effective stock of zero.

use crate::error::EngineError;
use crate::types::{CartLine, Money, Product, ProductId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One change to a cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CartEvent {
    /// Increase a product's quantity, merging with an existing line
    Add {
        /// Product
        product_id: ProductId,
        /// Units to add
        quantity: u32,
    },
    /// Replace a product's quantity; `<= 0` removes the line
    Set {
        /// Product
        product_id: ProductId,
        /// New quantity
        quantity: i64,
    },
    /// Drop a product's line
    Remove {
        /// Product
        product_id: ProductId,
    },
}

/// Consolidated cart, lines in first-insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Apply one event; `stock_of` gives the effective stock of a product.
    pub fn apply<F>(&mut self, event: &CartEvent, stock_of: F)
    where
        F: Fn(&ProductId) -> u32,
    {
        match *event {
            CartEvent::Add {
                product_id,
                quantity,
            } => {
                let current = self.quantity_of(&product_id);
                let wanted = current.saturating_add(quantity);
                self.put(product_id, wanted.min(stock_of(&product_id)));
            }
            CartEvent::Set {
                product_id,
                quantity,
            } => {
                let wanted = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
                self.put(product_id, wanted.min(stock_of(&product_id)));
            }
            CartEvent::Remove { product_id } => self.put(product_id, 0),
        }
    }

    /// Quantity held for a product (0 if absent)
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| &l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Lines in insertion order
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Consume into lines
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// Whether the cart holds nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, l| acc.saturating_add(l.quantity))
    }

    fn put(&mut self, product_id: ProductId, quantity: u32) {
        let position = self.lines.iter().position(|l| l.product_id == product_id);
        match (position, quantity) {
            (Some(i), 0) => {
                self.lines.remove(i);
            }
            (Some(i), q) => self.lines[i].quantity = q,
            (None, 0) => {}
            (None, q) => self.lines.push(CartLine {
                product_id,
                quantity: q,
            }),
        }
    }
}

/// Effective stock of a product for cart purposes.
#[must_use]
pub fn sellable_stock(products: &BTreeMap<ProductId, Product>, id: &ProductId) -> u32 {
    products
        .get(id)
        .filter(|p| p.is_active)
        .map_or(0, |p| p.stock)
}

/// Fold a sequence of events into a cart against a product snapshot.
#[must_use]
pub fn consolidate<'a, I>(events: I, products: &BTreeMap<ProductId, Product>) -> Cart
where
    I: IntoIterator<Item = &'a CartEvent>,
{
    let mut cart = Cart::new();
    for event in events {
        cart.apply(event, |id| sellable_stock(products, id));
    }
    cart
}

/// Cart line priced against the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummaryLine {
    /// Product
    pub product_id: ProductId,
    /// Product name
    pub name: String,
    /// Current unit price
    pub unit_price: Money,
    /// Units held
    pub quantity: u32,
    /// `unit_price × quantity`
    pub line_total: Money,
    /// Stock at pricing time
    pub available_stock: u32,
}

/// Priced cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    /// Lines in insertion order
    pub lines: Vec<CartSummaryLine>,
    /// Sum of quantities
    pub total_items: u32,
    /// Sum of line totals
    pub total_amount: Money,
}

/// Price a consolidated cart.
///
/// # Errors
///
/// Returns a validation error if an amount overflows.
pub fn summarize(
    cart: &Cart,
    products: &BTreeMap<ProductId, Product>,
) -> Result<CartSummary, EngineError> {
    let overflow = || EngineError::validation("Cart total is too large");
    let mut lines = Vec::with_capacity(cart.lines().len());
    let mut total_amount = Money::ZERO;

    for line in cart.lines() {
        let Some(product) = products.get(&line.product_id) else {
            continue;
        };
        let line_total = product.price.checked_mul(line.quantity).ok_or_else(overflow)?;
        total_amount = total_amount.checked_add(line_total).ok_or_else(overflow)?;
        lines.push(CartSummaryLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity: line.quantity,
            line_total,
            available_stock: product.stock,
        });
    }

    Ok(CartSummary {
        lines,
        total_items: cart.total_items(),
        total_amount,
    })
}
