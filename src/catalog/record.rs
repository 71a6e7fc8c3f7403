use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::Deserialize;

use crate::domain::order::{DecorationMethod, PricingTier, Size};

// ============================================================================
// Products sheet schema
// ============================================================================

/// Price column on the Products sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceColumn {
    Sp36,
    Sp72,
    Emb36,
    Emb72,
    App36,
    Sub50,
    Lth50,
}

impl PriceColumn {
    pub fn header(self) -> &'static str {
        match self {
            PriceColumn::Sp36 => "SP 36",
            PriceColumn::Sp72 => "SP 72",
            PriceColumn::Emb36 => "EMB 36",
            PriceColumn::Emb72 => "EMB 72",
            PriceColumn::App36 => "APP 36",
            PriceColumn::Sub50 => "SUB 50",
            PriceColumn::Lth50 => "LTH 50",
        }
    }

    /// Columns that make a SKU sellable under `method`
    pub fn for_method(method: DecorationMethod) -> &'static [PriceColumn] {
        match method {
            DecorationMethod::Screenprint => &[PriceColumn::Sp36, PriceColumn::Sp72],
            DecorationMethod::Embroidery => &[PriceColumn::Emb36, PriceColumn::Emb72],
            DecorationMethod::Applique => &[PriceColumn::App36],
            DecorationMethod::SublimatedPatches => &[PriceColumn::Sub50],
            DecorationMethod::LeatherPatches => &[PriceColumn::Lth50],
        }
    }

    /// Column holding the base price for a method at a tier
    pub fn for_tier(method: DecorationMethod, tier: PricingTier) -> PriceColumn {
        match (method, tier) {
            (DecorationMethod::Screenprint, PricingTier::Pc72) => PriceColumn::Sp72,
            (DecorationMethod::Screenprint, _) => PriceColumn::Sp36,
            (DecorationMethod::Embroidery, PricingTier::Pc72) => PriceColumn::Emb72,
            (DecorationMethod::Embroidery, _) => PriceColumn::Emb36,
            (DecorationMethod::Applique, _) => PriceColumn::App36,
            (DecorationMethod::SublimatedPatches, _) => PriceColumn::Sub50,
            (DecorationMethod::LeatherPatches, _) => PriceColumn::Lth50,
        }
    }
}

impl fmt::Display for PriceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One row of the Products sheet as exported. Every column but `SKU` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Brand", default)]
    pub brand: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Colors", default)]
    pub colors: String,
    #[serde(rename = "Sizes", default)]
    pub sizes: String,
    #[serde(rename = "SP 36", default)]
    pub sp36: String,
    #[serde(rename = "SP 72", default)]
    pub sp72: String,
    #[serde(rename = "EMB 36", default)]
    pub emb36: String,
    #[serde(rename = "EMB 72", default)]
    pub emb72: String,
    #[serde(rename = "APP 36", default)]
    pub app36: String,
    #[serde(rename = "SUB 50", default)]
    pub sub50: String,
    #[serde(rename = "LTH 50", default)]
    pub lth50: String,
}

/// Normalized catalog record
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub sku: String,
    pub brand: String,
    pub description: String,
    pub colors: Vec<String>,
    pub sizes: Vec<Size>,
    pub prices: BTreeMap<PriceColumn, Decimal>,
}

impl CatalogEntry {
    pub fn price(&self, column: PriceColumn) -> Decimal {
        self.prices.get(&column).copied().unwrap_or(Decimal::ZERO)
    }
}

impl From<ProductRow> for CatalogEntry {
    fn from(row: ProductRow) -> Self {
        let prices = [
            (PriceColumn::Sp36, &row.sp36),
            (PriceColumn::Sp72, &row.sp72),
            (PriceColumn::Emb36, &row.emb36),
            (PriceColumn::Emb72, &row.emb72),
            (PriceColumn::App36, &row.app36),
            (PriceColumn::Sub50, &row.sub50),
            (PriceColumn::Lth50, &row.lth50),
        ]
        .into_iter()
        .map(|(column, raw)| (column, parse_price(raw)))
        .collect();

        let sizes = split_list(&row.sizes)
            .filter_map(|label| match label.parse::<Size>() {
                Ok(size) => Some(size),
                Err(_) => {
                    tracing::debug!(sku = %row.sku, label, "Ignoring unknown size label");
                    None
                }
            })
            .collect();

        Self {
            sku: row.sku.trim().to_string(),
            brand: row.brand.trim().to_string(),
            description: row.description.trim().to_string(),
            colors: split_list(&row.colors).map(str::to_string).collect(),
            sizes,
            prices,
        }
    }
}

/// Comma-separated sheet cell, trimmed, empty tokens dropped
fn split_list(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(',').map(str::trim).filter(|token| !token.is_empty())
}

/// Blank or non-numeric cells price at 0
pub fn parse_price(raw: &str) -> Decimal {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&cleaned)
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().and_then(Decimal::from_f64))
        .unwrap_or(Decimal::ZERO)
}
