use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    art_setup_fee, pricing_tier, size_upcharge, PriceLookup, CONFETTI_UPCHARGE,
    PREMIUM_FOUR_COLOR_UPCHARGE, SECOND_DESIGN_UPCHARGE,
};
use crate::domain::order::{Decoration, DecorationMethod, PricingTier, ProductLine, Size};

/// Per-option surcharges. Holds either per-piece rates or order-wide charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpchargeBreakdown {
    pub confetti: Decimal,
    pub premium_4color: Decimal,
    pub second_design: Decimal,
    pub design2_premium_4color: Decimal,
}

impl UpchargeBreakdown {
    /// Per-piece rates in effect. Flags that do not apply to the current
    /// method are ignored.
    pub fn rates(decoration: &Decoration) -> Self {
        let method = decoration.method;
        let second_design = decoration.second_design_active();

        let pick = |enabled: bool, rate: Decimal| if enabled { rate } else { Decimal::ZERO };

        Self {
            confetti: pick(
                decoration.confetti && method == Some(DecorationMethod::Embroidery),
                CONFETTI_UPCHARGE,
            ),
            premium_4color: pick(
                decoration.premium_4color && method == Some(DecorationMethod::Screenprint),
                PREMIUM_FOUR_COLOR_UPCHARGE,
            ),
            second_design: pick(second_design, SECOND_DESIGN_UPCHARGE),
            design2_premium_4color: pick(
                second_design && decoration.design2_premium_4color,
                PREMIUM_FOUR_COLOR_UPCHARGE,
            ),
        }
    }

    pub fn total(&self) -> Decimal {
        self.confetti + self.premium_4color + self.second_design + self.design2_premium_4color
    }

    /// Scale every rate by a unit count
    pub fn times(&self, units: u64) -> Self {
        let units = Decimal::from(units);
        Self {
            confetti: self.confetti * units,
            premium_4color: self.premium_4color * units,
            second_design: self.second_design * units,
            design2_premium_4color: self.design2_premium_4color * units,
        }
    }
}

/// Pricing of one grid row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePricing {
    pub row: usize,
    pub sku: String,
    pub base_price: Decimal,
    pub units: u64,
    /// Zero when the SKU has no base price for this method and tier
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSummary {
    pub total_units: u64,
    pub tier: PricingTier,
    pub per_unit_upcharge: Decimal,
    /// Order-wide option charges as shown to the rep; already part of `product_total`
    pub option_charges: UpchargeBreakdown,
    pub lines: Vec<LinePricing>,
    pub product_total: Decimal,
    pub art_setup_fee: Decimal,
    pub grand_total: Decimal,
}

/// Price an order.
///
/// The tier is decided once from the units on every SKU-bearing row, then
/// each piece costs `base + size upcharge + per-unit upcharge`. Rows whose SKU
/// has no base price contribute nothing. Freight is not part of the total.
pub fn price_order(
    grid: &[ProductLine],
    decoration: &Decoration,
    prices: &impl PriceLookup,
) -> PricingSummary {
    let total_units: u64 = grid
        .iter()
        .filter(|line| !line.is_placeholder())
        .map(ProductLine::row_total)
        .sum();

    let tier = decoration
        .method
        .map(|method| pricing_tier(total_units, method))
        .unwrap_or(PricingTier::Pc36);

    let rates = UpchargeBreakdown::rates(decoration);
    let per_unit_upcharge = rates.total();

    let lines: Vec<LinePricing> = grid
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.is_placeholder())
        .map(|(row, line)| {
            let base_price = decoration
                .method
                .map(|method| prices.base_price(&line.sku, method, tier))
                .unwrap_or(Decimal::ZERO);

            let subtotal = if base_price.is_zero() {
                Decimal::ZERO
            } else {
                Size::ALL
                    .iter()
                    .map(|&size| (size, line.quantity(size)))
                    .filter(|&(_, qty)| qty > 0)
                    .map(|(size, qty)| {
                        (base_price + size_upcharge(size) + per_unit_upcharge) * Decimal::from(qty)
                    })
                    .sum()
            };

            LinePricing {
                row,
                sku: line.sku.trim().to_string(),
                base_price,
                units: line.row_total(),
                subtotal,
            }
        })
        .collect();

    let product_total: Decimal = lines.iter().map(|line| line.subtotal).sum();
    let art_setup_fee = art_setup_fee(decoration.art_setup_hours);

    PricingSummary {
        total_units,
        tier,
        per_unit_upcharge,
        option_charges: rates.times(total_units),
        lines,
        product_total,
        art_setup_fee,
        grand_total: product_total + art_setup_fee,
    }
}
