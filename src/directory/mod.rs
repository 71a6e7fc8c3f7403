// ============================================================================
// Directory Lookup - sales reps, their customers and customer addresses
// ============================================================================

mod auth;
mod record;
mod service;

use std::collections::BTreeSet;
use std::io::Read;

use serde::de::DeserializeOwned;

pub use auth::RepAuthenticator;
pub use record::{CustomerRecord, CustomerRow, RepIdentity, SalesRep, SalesRepRow};
pub use service::DirectoryService;

use crate::domain::order::Address;
use crate::lookup::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("{table} sheet is missing required column {column}")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("Directory sheet could not be read: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Unknown sales rep: {0}")]
    UnknownRep(String),

    #[error("Incorrect PIN for {0}")]
    InvalidPin(String),

    #[error("Unrecognized access link")]
    UnknownIdentifier,
}

/// Parse a sheet export. At least one of `key_columns` must be present.
fn read_rows<T, R>(
    table: &'static str,
    reader: R,
    key_columns: &[&'static str],
) -> Result<(Vec<T>, csv::StringRecord), DirectoryError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if !key_columns.iter().any(|key| headers.iter().any(|header| header == *key)) {
        return Err(DirectoryError::MissingColumn {
            table,
            column: key_columns[0],
        });
    }

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => tracing::warn!(table, row = index + 2, error = %e, "Rejected directory row"),
        }
    }
    Ok((rows, headers))
}

/// Parse the SalesReps sheet. Blank names are dropped; the first row per name wins.
pub fn parse_sales_reps<R: Read>(reader: R) -> Result<Vec<SalesRep>, DirectoryError> {
    let (rows, _) = read_rows::<SalesRepRow, _>("SalesReps", reader, &["SalesRep"])?;

    let mut seen = BTreeSet::new();
    let reps: Vec<SalesRep> = rows
        .into_iter()
        .map(SalesRep::from)
        .filter(|rep| !rep.name.is_empty() && seen.insert(rep.name.clone()))
        .collect();

    tracing::info!(reps = reps.len(), "Sales reps loaded");
    Ok(reps)
}

/// Customers sheet contents
#[derive(Debug, Clone, Default)]
pub struct CustomerTable {
    records: Vec<CustomerRecord>,
    has_rep_column: bool,
}

impl CustomerTable {
    pub fn new(records: Vec<CustomerRecord>, has_rep_column: bool) -> Self {
        Self { records, has_rep_column }
    }
}

pub fn parse_customers<R: Read>(reader: R) -> Result<CustomerTable, DirectoryError> {
    let (rows, headers) =
        read_rows::<CustomerRow, _>("Customers", reader, &["CompanyName", "Customer"])?;

    let records: Vec<CustomerRecord> = rows
        .into_iter()
        .map(CustomerRecord::from)
        .filter(|customer| !customer.name.is_empty())
        .collect();
    let has_rep_column = headers.iter().any(|header| header == "SalesRep");

    tracing::info!(customers = records.len(), has_rep_column, "Customers loaded");
    Ok(CustomerTable::new(records, has_rep_column))
}

/// Snapshot of both directory sheets
#[derive(Debug, Clone, Default)]
pub struct Directory {
    reps: Vec<SalesRep>,
    customers: CustomerTable,
}

impl Directory {
    pub fn new(reps: Vec<SalesRep>, customers: CustomerTable) -> Self {
        Self { reps, customers }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_empty() && self.customers.records.is_empty()
    }

    /// Rep names, sorted. Falls back to the reps named on the Customers sheet
    /// when the SalesReps sheet is empty.
    pub fn sales_reps(&self) -> Vec<String> {
        let names: BTreeSet<String> = if self.reps.is_empty() {
            self.customers
                .records
                .iter()
                .map(|customer| customer.sales_rep.clone())
                .filter(|rep| !rep.is_empty())
                .collect()
        } else {
            self.reps.iter().map(|rep| rep.name.clone()).collect()
        };
        names.into_iter().collect()
    }

    pub fn rep(&self, name: &str) -> Option<&SalesRep> {
        let name = name.trim();
        self.reps.iter().find(|rep| rep.name == name)
    }

    /// Customers assigned to `rep`, sorted and unique. Without a SalesRep
    /// column every customer is offered.
    pub fn customers_for_rep(&self, rep: &str) -> Vec<String> {
        let rep = rep.trim();
        self.customers
            .records
            .iter()
            .filter(|customer| !self.customers.has_rep_column || customer.sales_rep == rep)
            .map(|customer| customer.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn is_customer_of(&self, rep: &str, customer: &str) -> bool {
        let customer = customer.trim();
        self.customers_for_rep(rep).iter().any(|name| name == customer)
    }

    /// Address of the first row for `name`; `None` for a customer not on the sheet
    pub fn customer_address(&self, name: &str) -> Option<Address> {
        let name = name.trim();
        self.customers
            .records
            .iter()
            .find(|customer| customer.name == name)
            .map(|customer| customer.address.clone())
    }

    /// A rep without a PIN on file is admitted without one
    pub fn authenticate_pin(&self, rep: &str, pin: &str) -> Result<RepIdentity, DirectoryError> {
        let record = self
            .rep(rep)
            .ok_or_else(|| DirectoryError::UnknownRep(rep.trim().to_string()))?;

        match &record.pin {
            Some(expected) if expected != pin.trim() => {
                Err(DirectoryError::InvalidPin(record.name.clone()))
            }
            _ => Ok(RepIdentity::from(record)),
        }
    }

    /// Resolve a per-rep access link identifier
    pub fn resolve_identifier(&self, url_id: &str) -> Option<RepIdentity> {
        let url_id = url_id.trim();
        if url_id.is_empty() {
            return None;
        }
        self.reps
            .iter()
            .find(|rep| rep.url_id.as_deref() == Some(url_id))
            .map(RepIdentity::from)
    }
}
