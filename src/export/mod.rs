// ============================================================================
// Export Transformer - wide product grid to flat line items
// ============================================================================
//
// One row per (line, size) with a positive quantity, in grid order and then
// canonical size order. The projection is pure; submission numbers come from
// the order store, not from here.
//
// ============================================================================

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::order::{ProductLine, Size, SubmissionNumber};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Export CSV could not be written: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export file {path} could not be written: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One exported record, column names as the production system imports them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "CustomerID")]
    pub customer_id: String,
    #[serde(rename = "ItemCode")]
    pub item_code: String,
    #[serde(rename = "ColorCode")]
    pub color_code: String,
    #[serde(rename = "SizeIndex")]
    pub size_index: usize,
    #[serde(rename = "Size")]
    pub size: Size,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    /// Unit price is not carried into the export
    #[serde(rename = "Price")]
    pub price: f64,
}

pub fn pivot_grid_to_line_items(customer_id: &str, grid: &[ProductLine]) -> Vec<LineItem> {
    grid.iter()
        .filter(|line| !line.is_placeholder())
        .flat_map(|line| {
            Size::ALL.into_iter().filter_map(move |size| {
                let quantity = line.quantity(size);
                (quantity > 0).then(|| LineItem {
                    customer_id: customer_id.to_string(),
                    item_code: line.sku.trim().to_string(),
                    color_code: line.color.trim().to_string(),
                    size_index: size.index(),
                    size,
                    quantity,
                    price: 0.0,
                })
            })
        })
        .collect()
}

/// Write items as CSV with a header row, even when there are no items
pub fn write_csv<W: Write>(writer: W, items: &[LineItem]) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(["CustomerID", "ItemCode", "ColorCode", "SizeIndex", "Size", "Quantity", "Price"])?;
    for item in items {
        writer.serialize(item)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn to_csv_string(items: &[LineItem]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, items)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// `shopworks_export_1001_20260416_093015.csv`
pub fn export_file_name(number: SubmissionNumber, at: DateTime<Utc>) -> String {
    format!("shopworks_export_{}_{}.csv", number.value(), at.format("%Y%m%d_%H%M%S"))
}

/// Write the export for a submission into `dir`, returning the file path
pub async fn write_export_file(
    dir: &Path,
    number: SubmissionNumber,
    at: DateTime<Utc>,
    items: &[LineItem],
) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(number, at));
    let body = to_csv_string(items)?;

    let io_error = |source| ExportError::Io {
        path: path.clone(),
        source,
    };
    tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
    tokio::fs::write(&path, body).await.map_err(io_error)?;

    tracing::info!(path = %path.display(), rows = items.len(), "Export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn grid() -> Vec<ProductLine> {
        vec![
            ProductLine::new("TS100", "Navy")
                .with_quantity(Size::XXXXL, 1)
                .with_quantity(Size::S, 6)
                .with_quantity(Size::M, 12),
            ProductLine::default().with_quantity(Size::L, 99),
            ProductLine::new("HD200", "Black"),
            ProductLine::new("CP300", "Khaki").with_quantity(Size::XS, 3),
        ]
    }

    #[test]
    fn test_pivot_emits_positive_cells_in_grid_then_size_order() {
        let items = pivot_grid_to_line_items("Beach Club", &grid());

        let cells: Vec<_> = items
            .iter()
            .map(|item| (item.item_code.as_str(), item.size.label(), item.size_index, item.quantity))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("TS100", "S", 1, 6),
                ("TS100", "M", 2, 12),
                ("TS100", "4XL", 7, 1),
                ("CP300", "XS", 0, 3),
            ]
        );
        assert!(items.iter().all(|item| item.customer_id == "Beach Club" && item.price == 0.0));
    }

    #[test]
    fn test_pivot_trims_sku_and_color() {
        let grid = vec![ProductLine::new(" TS100 ", " Navy ").with_quantity(Size::M, 2)];
        let items = pivot_grid_to_line_items("Beach Club", &grid);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_code, "TS100");
        assert_eq!(items[0].color_code, "Navy");
    }

    #[test]
    fn test_pivot_quantities_match_row_totals() {
        let grid = grid();
        let items = pivot_grid_to_line_items("", &grid);

        for line in grid.iter().filter(|line| !line.is_placeholder()) {
            let exported: u64 = items
                .iter()
                .filter(|item| item.item_code == line.sku)
                .map(|item| u64::from(item.quantity))
                .sum();
            assert_eq!(exported, line.row_total());
        }
    }

    #[test]
    fn test_pivot_is_idempotent() {
        let grid = grid();
        assert_eq!(
            pivot_grid_to_line_items("X", &grid),
            pivot_grid_to_line_items("X", &grid)
        );
    }

    #[test]
    fn test_csv_layout() {
        let items = pivot_grid_to_line_items("Beach Club", &grid()[3..]);
        let csv = to_csv_string(&items).unwrap();
        assert_eq!(
            csv,
            "CustomerID,ItemCode,ColorCode,SizeIndex,Size,Quantity,Price\nBeach Club,CP300,Khaki,0,XS,3,0.0\n"
        );
    }

    #[test]
    fn test_empty_export_keeps_header() {
        let csv = to_csv_string(&[]).unwrap();
        assert_eq!(csv, "CustomerID,ItemCode,ColorCode,SizeIndex,Size,Quantity,Price\n");
    }

    #[test]
    fn test_export_file_name_embeds_number_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 4, 16, 9, 30, 15).unwrap();
        assert_eq!(
            export_file_name(SubmissionNumber(1001), at),
            "shopworks_export_1001_20260416_093015.csv"
        );
    }

    #[tokio::test]
    async fn test_write_export_file() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2026, 4, 16, 9, 30, 15).unwrap();
        let items = pivot_grid_to_line_items("Beach Club", &grid());

        let path = write_export_file(dir.path(), SubmissionNumber(1002), at, &items)
            .await
            .unwrap();
        let body = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(body.lines().count(), 5);
    }
}
