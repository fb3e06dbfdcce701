//! Service and product catalog.
//!
//! Services are immutable for the life of the engine and live behind
//! [`ServiceCatalog`]. Products carry mutable stock, so after seeding they
//! are owned by the inventory aggregate; the seed here only provides their
//! starting state.

use crate::types::{Product, ProductId, Service, ServiceId};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

const DEMO_CATALOG: &str = include_str!("../fixtures/catalog.json");

/// Errors loading or validating a catalog seed.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be read
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid catalog JSON
    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Seed violates a catalog rule
    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// Read-only lookup of bookable services.
pub trait ServiceCatalog: Send + Sync {
    /// Service by ID
    fn service(&self, id: &ServiceId) -> Option<&Service>;

    /// All services ordered by name
    fn services(&self) -> Vec<Service>;
}

/// In-memory service catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    services: BTreeMap<ServiceId, Service>,
}

impl InMemoryCatalog {
    /// Build from a list of services.
    #[must_use]
    pub fn new(services: impl IntoIterator<Item = Service>) -> Self {
        Self {
            services: services.into_iter().map(|s| (s.id, s)).collect(),
        }
    }
}

impl ServiceCatalog for InMemoryCatalog {
    fn service(&self, id: &ServiceId) -> Option<&Service> {
        self.services.get(id)
    }

    fn services(&self) -> Vec<Service> {
        let mut all: Vec<Service> = self.services.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

/// Initial catalog contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    /// Bookable services
    #[serde(default)]
    pub services: Vec<Service>,
    /// Products with starting stock
    #[serde(default)]
    pub products: Vec<Product>,
}

impl CatalogSeed {
    /// Parse and validate seed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] or [`CatalogError::Invalid`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let seed: Self = serde_json::from_str(json)?;
        seed.validate()?;
        Ok(seed)
    }

    /// Load and validate a seed file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise as
    /// [`CatalogSeed::from_json`].
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Built-in demo catalog.
    ///
    /// # Errors
    ///
    /// Only if the bundled fixture is malformed.
    pub fn demo() -> Result<Self, CatalogError> {
        Self::from_json(DEMO_CATALOG)
    }

    /// Check catalog rules.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Invalid`] on a zero-length service, an empty
    /// name, or a duplicate identifier.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut service_ids = HashSet::new();
        for service in &self.services {
            if service.duration_minutes == 0 {
                return Err(CatalogError::Invalid(format!(
                    "service {} has zero duration",
                    service.id
                )));
            }
            if service.name.trim().is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "service {} has an empty name",
                    service.id
                )));
            }
            if !service_ids.insert(service.id) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate service id {}",
                    service.id
                )));
            }
        }

        let mut product_ids = HashSet::new();
        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "product {} has an empty name",
                    product.id
                )));
            }
            if !product_ids.insert(product.id) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
        }

        Ok(())
    }

    /// Split into the service catalog and the starting product map.
    #[must_use]
    pub fn into_parts(self) -> (InMemoryCatalog, BTreeMap<ProductId, Product>) {
        let products = self.products.into_iter().map(|p| (p.id, p)).collect();
        (InMemoryCatalog::new(self.services), products)
    }
}
