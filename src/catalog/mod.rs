// ============================================================================
// Catalog Lookup - products, colors, sizes and per-method prices
// ============================================================================

mod record;
mod service;

use std::collections::{BTreeSet, HashMap};
use std::io::Read;

use rust_decimal::Decimal;

pub use record::{parse_price, CatalogEntry, PriceColumn, ProductRow};
pub use service::CatalogService;

use crate::domain::order::{DecorationMethod, PricingTier, Size};
use crate::lookup::SourceError;
use crate::pricing::PriceLookup;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Products sheet is missing required column {0}")]
    MissingColumn(&'static str),

    #[error("Products sheet could not be read: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Indexed snapshot of the Products sheet.
///
/// Lookups are keyed by trimmed SKU; when a SKU appears twice the first row wins.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, CatalogEntry>,
    rejected_rows: usize,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Self::empty();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    fn insert(&mut self, entry: CatalogEntry) {
        if entry.sku.is_empty() {
            self.rejected_rows += 1;
            return;
        }
        if self.entries.contains_key(&entry.sku) {
            tracing::debug!(sku = %entry.sku, "Duplicate SKU row ignored");
            return;
        }
        self.entries.insert(entry.sku.clone(), entry);
    }

    /// Parse a Products CSV export. The `SKU` header is mandatory; rows that
    /// fail to deserialize are skipped and counted.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        if !reader.headers()?.iter().any(|header| header == "SKU") {
            return Err(CatalogError::MissingColumn("SKU"));
        }

        let mut catalog = Self::empty();
        for (index, result) in reader.deserialize::<ProductRow>().enumerate() {
            match result {
                Ok(row) => catalog.insert(row.into()),
                Err(e) => {
                    tracing::warn!(row = index + 2, error = %e, "Rejected Products row");
                    catalog.rejected_rows += 1;
                }
            }
        }

        tracing::info!(
            products = catalog.len(),
            rejected = catalog.rejected_rows,
            "Catalog loaded"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rejected_rows(&self) -> usize {
        self.rejected_rows
    }

    pub fn get(&self, sku: &str) -> Option<&CatalogEntry> {
        self.entries.get(sku.trim())
    }

    /// Gatekeeper check. Unknown SKUs, blank SKUs and an empty catalog are
    /// allowed; a known SKU needs a positive price in one of the method's columns.
    pub fn check_sku_for_method(&self, sku: &str, method: DecorationMethod) -> Result<(), String> {
        let Some(entry) = self.get(sku) else {
            return Ok(());
        };

        let columns = PriceColumn::for_method(method);
        if columns.iter().any(|&column| entry.price(column) > Decimal::ZERO) {
            return Ok(());
        }

        let names = columns
            .iter()
            .map(|column| column.header())
            .collect::<Vec<_>>()
            .join(" and ");
        Err(format!(
            "SKU {} is not available for {} ({} {} 0 or missing)",
            entry.sku,
            method,
            names,
            if columns.len() > 1 { "are" } else { "is" }
        ))
    }

    pub fn is_sku_valid_for_method(&self, sku: &str, method: DecorationMethod) -> bool {
        self.check_sku_for_method(sku, method).is_ok()
    }

    /// Every SKU sellable under `method`, ascending
    pub fn skus_for_method(&self, method: DecorationMethod) -> Vec<String> {
        self.entries
            .keys()
            .filter(|sku| self.is_sku_valid_for_method(sku, method))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn colors_for_sku(&self, sku: &str) -> Vec<String> {
        self.get(sku).map(|entry| entry.colors.clone()).unwrap_or_default()
    }

    pub fn sizes_for_sku(&self, sku: &str) -> Vec<Size> {
        self.get(sku).map(|entry| entry.sizes.clone()).unwrap_or_default()
    }

    /// Sizes open for entry on a grid row: all of them until a SKU is chosen,
    /// then only what the catalog lists (possibly none).
    pub fn enabled_sizes(&self, sku: &str) -> Vec<Size> {
        if sku.trim().is_empty() {
            Size::ALL.to_vec()
        } else {
            self.sizes_for_sku(sku)
        }
    }

    /// `(brand, description)`, blank when the SKU is unknown
    pub fn sku_details(&self, sku: &str) -> (String, String) {
        self.get(sku)
            .map(|entry| (entry.brand.clone(), entry.description.clone()))
            .unwrap_or_default()
    }
}

impl PriceLookup for Catalog {
    fn base_price(&self, sku: &str, method: DecorationMethod, tier: PricingTier) -> Decimal {
        self.get(sku)
            .map(|entry| entry.price(PriceColumn::for_tier(method, tier)))
            .unwrap_or(Decimal::ZERO)
    }
}
