//! Pricing engine.
//!
//! Turns the product grid plus decoration options into a volume tier, a
//! per-piece price and order totals. Everything here is a pure function of
//! its inputs; money is `rust_decimal::Decimal`, unrounded until display.

mod calculator;

pub use calculator::{price_order, LinePricing, PricingSummary, UpchargeBreakdown};

use rust_decimal::prelude::*;

use crate::domain::order::{Decoration, DecorationMethod, PricingTier, Size};

/// Units at which Screenprint and Embroidery switch to the 72pc column
pub const VOLUME_BREAK_UNITS: u64 = 72;

/// Art/setup is billed at $25 per half hour
pub const ART_SETUP_HOURLY_RATE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

pub const CONFETTI_UPCHARGE: Decimal = Decimal::from_parts(200, 0, 0, false, 2);
pub const PREMIUM_FOUR_COLOR_UPCHARGE: Decimal = Decimal::from_parts(200, 0, 0, false, 2);
pub const SECOND_DESIGN_UPCHARGE: Decimal = Decimal::from_parts(350, 0, 0, false, 2);

const DISPLAY_PLACES: u32 = 2;

/// Base-price source consulted per line. Unknown SKUs price at zero.
pub trait PriceLookup {
    fn base_price(&self, sku: &str, method: DecorationMethod, tier: PricingTier) -> Decimal;
}

/// Order-wide volume tier
pub fn pricing_tier(total_units: u64, method: DecorationMethod) -> PricingTier {
    match method {
        DecorationMethod::Screenprint | DecorationMethod::Embroidery => {
            if total_units >= VOLUME_BREAK_UNITS {
                PricingTier::Pc72
            } else {
                PricingTier::Pc36
            }
        }
        DecorationMethod::Applique => PricingTier::Pc36,
        DecorationMethod::SublimatedPatches | DecorationMethod::LeatherPatches => PricingTier::Pc50,
    }
}

/// Extended-size surcharge per piece
pub fn size_upcharge(size: Size) -> Decimal {
    match size {
        Size::XS | Size::S | Size::M | Size::L | Size::XL => Decimal::ZERO,
        Size::XXL => Decimal::from(3),
        Size::XXXL => Decimal::from(4),
        Size::XXXXL => Decimal::from(5),
    }
}

/// Sum of decoration-driven surcharges added to every priced piece
pub fn per_unit_upcharge(decoration: &Decoration) -> Decimal {
    UpchargeBreakdown::rates(decoration).total()
}

pub fn art_setup_fee(hours: Decimal) -> Decimal {
    hours * ART_SETUP_HOURLY_RATE
}

/// `$1,234.50` style rendering, rounded half away from zero
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(DISPLAY_PLACES, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(pricing_tier(71, DecorationMethod::Screenprint), PricingTier::Pc36);
        assert_eq!(pricing_tier(72, DecorationMethod::Screenprint), PricingTier::Pc72);
        assert_eq!(pricing_tier(500, DecorationMethod::Embroidery), PricingTier::Pc72);
        assert_eq!(pricing_tier(0, DecorationMethod::Applique), PricingTier::Pc36);
        assert_eq!(pricing_tier(1000, DecorationMethod::Applique), PricingTier::Pc36);
        assert_eq!(pricing_tier(1, DecorationMethod::SublimatedPatches), PricingTier::Pc50);
        assert_eq!(pricing_tier(0, DecorationMethod::LeatherPatches), PricingTier::Pc50);
    }

    #[test]
    fn test_size_upcharge_table() {
        for size in [Size::XS, Size::S, Size::M, Size::L, Size::XL] {
            assert_eq!(size_upcharge(size), Decimal::ZERO);
        }
        assert_eq!(size_upcharge(Size::XXL), Decimal::new(300, 2));
        assert_eq!(size_upcharge(Size::XXXL), Decimal::new(400, 2));
        assert_eq!(size_upcharge(Size::XXXXL), Decimal::new(500, 2));
    }

    #[test]
    fn test_upcharge_stacking() {
        let decoration = Decoration {
            premium_4color: true,
            has_second_design: true,
            design2_premium_4color: true,
            ..Default::default()
        };
        assert_eq!(per_unit_upcharge(&decoration), Decimal::new(750, 2));
    }

    #[test]
    fn test_inert_flags_do_not_charge() {
        let decoration = Decoration {
            method: Some(DecorationMethod::Embroidery),
            premium_4color: true,
            has_second_design: true,
            design2_premium_4color: true,
            ..Default::default()
        };
        assert_eq!(per_unit_upcharge(&decoration), Decimal::ZERO);

        let screenprint = Decoration {
            design2_premium_4color: true,
            ..Default::default()
        };
        assert_eq!(per_unit_upcharge(&screenprint), Decimal::ZERO);
    }

    #[test]
    fn test_art_setup_fee() {
        assert_eq!(art_setup_fee(Decimal::new(15, 1)), Decimal::from(75));
        assert_eq!(art_setup_fee(Decimal::new(5, 1)), Decimal::from(25));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::from(960)), "$960.00");
        assert_eq!(format_money(Decimal::new(1234505, 3)), "$1,234.51");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
        assert_eq!(format_money(Decimal::new(-25, 1)), "-$2.50");
    }
}
