//! Inventory aggregate: product stock and the sales that consume it.
//!
//! Checkout locks every product on the cart plus the new sale. Keys are
//! taken in one global order by the runtime, so two carts that share
//! products in different orders cannot deadlock. Stock is re-verified in
//! `decide` while the product locks are held and decremented in `apply`;
//! either every line commits or none does.
//!
//! Cancelling a sale returns its quantities to stock as a relative
//! increment. Increments commute with concurrent checkouts and can only
//! make an earlier stock check more conservative.

use crate::error::EngineError;
use crate::types::{
    CartLine, Money, OwnerId, Product, ProductId, Sale, SaleId, SaleItem, SaleStatus,
};
use dogspa_core::environment::Clock;
use dogspa_core::reducer::Reducer;
use dogspa_core::{SmallVec, smallvec};
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// State
// ============================================================================

/// Products with live stock, and every committed sale.
#[derive(Debug, Clone, Default)]
pub struct InventoryState {
    products: BTreeMap<ProductId, Product>,
    sales: BTreeMap<SaleId, Sale>,
}

impl InventoryState {
    /// Start from a product snapshot with no sales.
    #[must_use]
    pub fn new(products: BTreeMap<ProductId, Product>) -> Self {
        Self {
            products,
            sales: BTreeMap::new(),
        }
    }

    /// Product by ID
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    /// Every product keyed by ID
    #[must_use]
    pub const fn product_map(&self) -> &BTreeMap<ProductId, Product> {
        &self.products
    }

    /// Every product ordered by name
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        let mut all: Vec<Product> = self.products.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Sale by ID
    #[must_use]
    pub fn sale(&self, id: &SaleId) -> Option<&Sale> {
        self.sales.get(id)
    }

    /// An owner's sales, newest first
    #[must_use]
    pub fn sales_of(&self, owner_id: &OwnerId) -> Vec<Sale> {
        let mut sales: Vec<Sale> = self
            .sales
            .values()
            .filter(|s| &s.owner_id == owner_id)
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sales
    }
}

// ============================================================================
// Actions & Events
// ============================================================================

/// Requests against the inventory.
#[derive(Debug, Clone)]
pub enum InventoryAction {
    /// Turn cart lines into a confirmed sale
    Checkout {
        /// ID for the new sale
        sale_id: SaleId,
        /// Buyer
        owner_id: OwnerId,
        /// Requested lines in cart order
        lines: Vec<CartLine>,
    },
    /// Mark a sale as handed over
    CompleteSale {
        /// Sale
        sale_id: SaleId,
    },
    /// Owner cancels a sale; stock is returned
    CancelSale {
        /// Sale
        sale_id: SaleId,
        /// Caller
        requester: OwnerId,
    },
}

/// Facts recorded by the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryEvent {
    /// Stock was reserved and a sale recorded
    SaleCommitted(Sale),
    /// A sale changed status
    SaleStatusChanged {
        /// Sale after the change
        sale: Sale,
        /// Previous status
        from: SaleStatus,
        /// Quantities going back on the shelf
        restock: Vec<CartLine>,
    },
}

impl InventoryEvent {
    /// The sale this event created or changed
    #[must_use]
    pub const fn sale(&self) -> &Sale {
        match self {
            Self::SaleCommitted(sale) | Self::SaleStatusChanged { sale, .. } => sale,
        }
    }
}

/// Lock keys of the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InventoryKey {
    /// Stock of one product
    Product(ProductId),
    /// Status of one sale
    Sale(SaleId),
}

/// Dependencies of the inventory reducer.
#[derive(Clone)]
pub struct InventoryEnvironment {
    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl InventoryEnvironment {
    /// Create a new environment
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the inventory aggregate.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryReducer;

/// Sum quantities of repeated products, keeping first-occurrence order.
///
/// # Errors
///
/// Returns a validation error for an empty cart, a zero quantity, or a
/// combined quantity that overflows.
pub fn merge_lines(lines: &[CartLine]) -> Result<Vec<CartLine>, EngineError> {
    if lines.is_empty() {
        return Err(EngineError::validation("Cart is empty"));
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(EngineError::validation(format!(
                "Quantity for product {} must be at least 1",
                line.product_id
            )));
        }
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(line.quantity).ok_or_else(|| {
                    EngineError::validation(format!(
                        "Quantity for product {} is too large",
                        line.product_id
                    ))
                })?;
            }
            None => merged.push(*line),
        }
    }
    Ok(merged)
}

impl InventoryReducer {
    /// Create a new reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn checkout(
        state: &InventoryState,
        env: &InventoryEnvironment,
        sale_id: SaleId,
        owner_id: OwnerId,
        lines: &[CartLine],
    ) -> Result<InventoryEvent, EngineError> {
        let merged = merge_lines(lines)?;
        let overflow = || EngineError::validation("Sale total is too large");

        let mut items = Vec::with_capacity(merged.len());
        let mut total_amount = Money::ZERO;
        for line in &merged {
            let product = state
                .product(&line.product_id)
                .ok_or_else(|| EngineError::not_found("Product", line.product_id))?;
            if !product.is_active {
                return Err(EngineError::validation(format!(
                    "Product {} is not available for sale",
                    product.name
                )));
            }
            if product.stock < line.quantity {
                return Err(EngineError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            let total_price = product.price.checked_mul(line.quantity).ok_or_else(overflow)?;
            total_amount = total_amount.checked_add(total_price).ok_or_else(overflow)?;
            items.push(SaleItem {
                sale_id,
                product_id: product.id,
                quantity: line.quantity,
                unit_price: product.price,
                total_price,
            });
        }

        if state.sales.contains_key(&sale_id) {
            return Err(EngineError::InvalidState(format!("Sale {sale_id} already exists")));
        }

        let now = env.clock.now();
        Ok(InventoryEvent::SaleCommitted(Sale {
            id: sale_id,
            owner_id,
            items,
            total_amount,
            status: SaleStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }))
    }

    fn transition(
        state: &InventoryState,
        env: &InventoryEnvironment,
        sale_id: SaleId,
        requester: Option<OwnerId>,
        next: SaleStatus,
    ) -> Result<InventoryEvent, EngineError> {
        let current = state
            .sale(&sale_id)
            .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;
        if let Some(requester) = requester {
            if current.owner_id != requester {
                return Err(EngineError::Forbidden(format!(
                    "Sale {sale_id} belongs to another owner"
                )));
            }
        }
        if current.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "Sale {sale_id} is {} and cannot become {next}",
                current.status
            )));
        }

        let restock = if next == SaleStatus::Cancelled {
            current
                .items
                .iter()
                .map(|item| CartLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut sale = current.clone();
        sale.status = next;
        sale.updated_at = env.clock.now();
        Ok(InventoryEvent::SaleStatusChanged {
            sale,
            from: current.status,
            restock,
        })
    }
}

impl Reducer for InventoryReducer {
    type State = InventoryState;
    type Action = InventoryAction;
    type Event = InventoryEvent;
    type Error = EngineError;
    type Environment = InventoryEnvironment;
    type Key = InventoryKey;

    fn lock_keys(&self, action: &InventoryAction) -> SmallVec<[InventoryKey; 4]> {
        match action {
            InventoryAction::Checkout { sale_id, lines, .. } => {
                let mut keys: SmallVec<[InventoryKey; 4]> = lines
                    .iter()
                    .map(|l| InventoryKey::Product(l.product_id))
                    .collect();
                keys.push(InventoryKey::Sale(*sale_id));
                keys
            }
            InventoryAction::CompleteSale { sale_id } | InventoryAction::CancelSale { sale_id, .. } => {
                smallvec![InventoryKey::Sale(*sale_id)]
            }
        }
    }

    fn decide(
        &self,
        state: &InventoryState,
        action: InventoryAction,
        env: &InventoryEnvironment,
    ) -> Result<InventoryEvent, EngineError> {
        match action {
            InventoryAction::Checkout {
                sale_id,
                owner_id,
                lines,
            } => Self::checkout(state, env, sale_id, owner_id, &lines),
            InventoryAction::CompleteSale { sale_id } => {
                Self::transition(state, env, sale_id, None, SaleStatus::Completed)
            }
            InventoryAction::CancelSale { sale_id, requester } => {
                Self::transition(state, env, sale_id, Some(requester), SaleStatus::Cancelled)
            }
        }
    }

    fn apply(&self, state: &mut InventoryState, event: &InventoryEvent) {
        match event {
            InventoryEvent::SaleCommitted(sale) => {
                for item in &sale.items {
                    if let Some(product) = state.products.get_mut(&item.product_id) {
                        product.stock = product.stock.saturating_sub(item.quantity);
                    }
                }
                state.sales.insert(sale.id, sale.clone());
            }
            InventoryEvent::SaleStatusChanged { sale, restock, .. } => {
                for line in restock {
                    if let Some(product) = state.products.get_mut(&line.product_id) {
                        product.stock = product.stock.saturating_add(line.quantity);
                    }
                }
                state.sales.insert(sale.id, sale.clone());
            }
        }
    }
}
