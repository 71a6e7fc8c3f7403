use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Order Value Objects
// ============================================================================

/// Garment size. Declaration order is the canonical export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Size {
    XS,
    S,
    M,
    L,
    XL,
    #[serde(rename = "2XL")]
    XXL,
    #[serde(rename = "3XL")]
    XXXL,
    #[serde(rename = "4XL")]
    XXXXL,
}

impl Size {
    pub const ALL: [Size; 8] = [
        Size::XS,
        Size::S,
        Size::M,
        Size::L,
        Size::XL,
        Size::XXL,
        Size::XXXL,
        Size::XXXXL,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Size::XS => "XS",
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::XL => "XL",
            Size::XXL => "2XL",
            Size::XXXL => "3XL",
            Size::XXXXL => "4XL",
        }
    }

    /// 0-based position in canonical order
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Size {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Size::ALL
            .into_iter()
            .find(|size| size.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown size: {value}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecorationMethod {
    Screenprint,
    Embroidery,
    Applique,
    #[serde(alias = "Sublimation")]
    SublimatedPatches,
    #[serde(alias = "Leather")]
    LeatherPatches,
}

impl DecorationMethod {
    pub const ALL: [DecorationMethod; 5] = [
        DecorationMethod::Screenprint,
        DecorationMethod::Embroidery,
        DecorationMethod::Applique,
        DecorationMethod::SublimatedPatches,
        DecorationMethod::LeatherPatches,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DecorationMethod::Screenprint => "Screenprint",
            DecorationMethod::Embroidery => "Embroidery",
            DecorationMethod::Applique => "Applique",
            DecorationMethod::SublimatedPatches => "Sublimation",
            DecorationMethod::LeatherPatches => "Leather",
        }
    }
}

impl fmt::Display for DecorationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DecorationMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
            "screenprint" => Ok(Self::Screenprint),
            "embroidery" => Ok(Self::Embroidery),
            "applique" => Ok(Self::Applique),
            "sublimation" | "sublimatedpatches" => Ok(Self::SublimatedPatches),
            "leather" | "leatherpatches" => Ok(Self::LeatherPatches),
            _ => Err(format!("Unknown decoration method: {value}")),
        }
    }
}

/// Volume bracket selecting the base-price column for the whole order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PricingTier {
    #[serde(rename = "36pc")]
    Pc36,
    #[serde(rename = "72pc")]
    Pc72,
    #[serde(rename = "50pc")]
    Pc50,
}

impl fmt::Display for PricingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingTier::Pc36 => f.write_str("36pc"),
            PricingTier::Pc72 => f.write_str("72pc"),
            PricingTier::Pc50 => f.write_str("50pc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DesignType {
    #[default]
    NewDesign,
    ReOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaxStatus {
    #[default]
    Taxable,
    Exempt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Draft,
    Submitted,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Draft => f.write_str("Draft"),
            OrderStatus::Submitted => f.write_str("Submitted"),
        }
    }
}

/// Postal address as entered on the intake form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

// ============================================================================
// Design Slots
// ============================================================================

pub const DESIGNER_PICK_SENTINEL: &str = "Let designers pick colors";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    #[default]
    Manual,
    DesignerPick,
}

/// Requested ink/thread colors for one design.
///
/// Switching to `DesignerPick` writes the sentinel text; switching back to
/// `Manual` clears the text only when it still holds the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DesignColors {
    pub mode: ColorMode,
    pub text: String,
}

impl DesignColors {
    pub fn set_mode(&mut self, mode: ColorMode) {
        self.mode = mode;
        match mode {
            ColorMode::DesignerPick => self.text = DESIGNER_PICK_SENTINEL.to_string(),
            ColorMode::Manual => {
                if self.text == DESIGNER_PICK_SENTINEL {
                    self.text.clear();
                }
            }
        }
    }

    /// Manual text is ignored while designers pick.
    pub fn set_text(&mut self, text: impl Into<String>) {
        if self.mode == ColorMode::Manual {
            self.text = text.into();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DesignSlotId {
    First,
    Second,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DesignSlot {
    pub number: String,
    pub location: String,
    pub description: String,
    pub colors: DesignColors,
}

// ============================================================================
// Header / Decoration / Grid
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub sales_rep: Option<String>,
    pub customer: Option<String>,
    pub order_date: NaiveDate,
    pub ship_date: Option<NaiveDate>,
    pub drop_dead_date: Option<NaiveDate>,
    pub po_number: String,
    pub tax_status: TaxStatus,
    pub tags: bool,
    pub delivery_method: String,
    /// Informational only; never added to the grand total
    pub freight: Decimal,
    pub notes: String,
    pub shipping: Address,
    pub billing: Address,
    pub billing_same_as_shipping: bool,
}

impl OrderHeader {
    pub fn new(order_date: NaiveDate) -> Self {
        Self {
            sales_rep: None,
            customer: None,
            order_date,
            ship_date: None,
            drop_dead_date: None,
            po_number: String::new(),
            tax_status: TaxStatus::Taxable,
            tags: false,
            delivery_method: String::new(),
            freight: Decimal::ZERO,
            notes: String::new(),
            shipping: Address::default(),
            billing: Address::default(),
            billing_same_as_shipping: false,
        }
    }

    /// Billing as it should be printed: the shipping address while the flag is set
    pub fn effective_billing(&self) -> &Address {
        if self.billing_same_as_shipping {
            &self.shipping
        } else {
            &self.billing
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub design_type: DesignType,
    pub reference_order_number: String,
    pub method: Option<DecorationMethod>,
    pub design1: DesignSlot,
    pub design2: DesignSlot,
    pub has_second_design: bool,
    pub confetti: bool,
    pub premium_4color: bool,
    pub design2_premium_4color: bool,
    pub art_setup_hours: Decimal,
}

impl Default for Decoration {
    fn default() -> Self {
        Self {
            design_type: DesignType::NewDesign,
            reference_order_number: String::new(),
            method: Some(DecorationMethod::Screenprint),
            design1: DesignSlot::default(),
            design2: DesignSlot::default(),
            has_second_design: false,
            confetti: false,
            premium_4color: false,
            design2_premium_4color: false,
            art_setup_hours: Decimal::ZERO,
        }
    }
}

/// Most art/setup time a single order may bill
pub const MAX_ART_SETUP_HOURS: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

impl Decoration {
    /// Art time is billed in half-hour steps between zero and `MAX_ART_SETUP_HOURS`
    pub fn is_valid_art_setup_hours(hours: Decimal) -> bool {
        hours >= Decimal::ZERO && hours <= MAX_ART_SETUP_HOURS && (hours * Decimal::TWO).fract().is_zero()
    }

    /// Second design only counts under Screenprint with the flag set
    pub fn second_design_active(&self) -> bool {
        self.method == Some(DecorationMethod::Screenprint) && self.has_second_design
    }
}

/// One row of the product grid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductLine {
    pub sku: String,
    pub brand: String,
    pub description: String,
    pub color: String,
    #[serde(default)]
    pub quantities: BTreeMap<Size, u32>,
}

impl ProductLine {
    pub fn new(sku: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            color: color.into(),
            ..Default::default()
        }
    }

    pub fn with_quantity(mut self, size: Size, quantity: u32) -> Self {
        self.set_quantity(size, quantity);
        self
    }

    /// Rows without a SKU are placeholders: unpriced, uncounted, not exported
    pub fn is_placeholder(&self) -> bool {
        self.sku.trim().is_empty()
    }

    pub fn quantity(&self, size: Size) -> u32 {
        self.quantities.get(&size).copied().unwrap_or(0)
    }

    pub fn set_quantity(&mut self, size: Size, quantity: u32) {
        if quantity == 0 {
            self.quantities.remove(&size);
        } else {
            self.quantities.insert(size, quantity);
        }
    }

    pub fn row_total(&self) -> u64 {
        self.quantities.values().map(|&qty| u64::from(qty)).sum()
    }
}

/// Parse a quantity field the way the form does: blank, negative or
/// non-numeric input is 0, fractions truncate.
pub fn parse_quantity(input: &str) -> u32 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// Sequential number issued on submission, displayed as `#N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionNumber(pub u64);

impl SubmissionNumber {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
