use serde::Deserialize;

use crate::domain::order::Address;

// ============================================================================
// SalesReps / Customers sheet schema
// ============================================================================

/// One row of the SalesReps sheet. Only `SalesRep` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct SalesRepRow {
    #[serde(rename = "SalesRep")]
    pub name: String,
    #[serde(rename = "PIN", default)]
    pub pin: String,
    #[serde(rename = "UrlId", alias = "URL ID", alias = "UrlID", default)]
    pub url_id: String,
    #[serde(rename = "SheetAccess", alias = "Sheet Access", default)]
    pub sheet_access: String,
}

/// One row of the Customers sheet; the name column is `CompanyName` or `Customer`
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRow {
    #[serde(rename = "CompanyName", alias = "Customer")]
    pub name: String,
    #[serde(rename = "SalesRep", default)]
    pub sales_rep: String,
    #[serde(rename = "Address1", default)]
    pub address1: String,
    #[serde(rename = "Address2", default)]
    pub address2: String,
    #[serde(rename = "AddressCity", default)]
    pub city: String,
    #[serde(rename = "AddressState", default)]
    pub state: String,
    #[serde(rename = "AddressZip", default)]
    pub zip: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRep {
    pub name: String,
    pub pin: Option<String>,
    pub url_id: Option<String>,
    pub sheet_access: bool,
}

impl From<SalesRepRow> for SalesRep {
    fn from(row: SalesRepRow) -> Self {
        Self {
            name: row.name.trim().to_string(),
            pin: non_blank(&row.pin),
            url_id: non_blank(&row.url_id),
            sheet_access: parse_flag(&row.sheet_access),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub name: String,
    pub sales_rep: String,
    pub address: Address,
}

impl From<CustomerRow> for CustomerRecord {
    fn from(row: CustomerRow) -> Self {
        Self {
            name: row.name.trim().to_string(),
            sales_rep: row.sales_rep.trim().to_string(),
            address: Address {
                line1: row.address1.trim().to_string(),
                line2: row.address2.trim().to_string(),
                city: row.city.trim().to_string(),
                state: row.state.trim().to_string(),
                zip: row.zip.trim().to_string(),
            },
        }
    }
}

/// An authenticated rep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepIdentity {
    pub name: String,
    pub sheet_access: bool,
}

impl From<&SalesRep> for RepIdentity {
    fn from(rep: &SalesRep) -> Self {
        Self {
            name: rep.name.clone(),
            sheet_access: rep.sheet_access,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Sheet checkbox or yes/no cell
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "x"
    )
}
