use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use apparel_order_intake::activity::{ActivityLog, ClientContext, InMemoryActivityLog, JsonLinesActivityLog};
use apparel_order_intake::catalog::CatalogService;
use apparel_order_intake::config::{AppConfig, CliArgs, Command};
use apparel_order_intake::directory::DirectoryService;
use apparel_order_intake::domain::order::{Order, OrderCommandHandler, OrderError};
use apparel_order_intake::lookup::FileSource;
use apparel_order_intake::metrics::Metrics;
use apparel_order_intake::pricing::{format_money, PricingSummary};
use apparel_order_intake::store::{InMemoryOrderStore, SubmissionCounter};
use apparel_order_intake::validation::{validate, ValidationReport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = AppConfig::from_args(&args)?;

    // Default filter comes from the config file, RUST_LOG overrides it
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .init();

    tracing::info!(
        catalog = %config.catalog_csv.display(),
        customers = %config.customers_csv.display(),
        reps = %config.reps_csv.display(),
        ttl_secs = config.lookup_ttl.as_secs(),
        "Starting order intake"
    );

    let metrics = Arc::new(Metrics::new()?);
    let handler = build_handler(&config, metrics.clone());

    match args.command {
        Command::Price { order } => {
            let order = read_order(&order).await?;
            let summary = handler.price(&order).await;
            print_summary(&summary);
            print_report(&validate(&order));
        }
        Command::Submit { order } => {
            let mut order = read_order(&order).await?;
            let context = ClientContext::new("cli", format!("order-intake/{}", env!("CARGO_PKG_VERSION")));

            match handler.submit(&mut order, &context).await {
                Ok(receipt) => {
                    println!("Order submitted: {}", receipt.submission_number);
                    print_summary(&receipt.pricing);
                    if let Some(path) = &receipt.export_path {
                        println!("Export written to {}", path.display());
                    }
                    for warning in &receipt.warnings {
                        println!("warning: {warning}");
                    }
                }
                Err(OrderError::ValidationFailed(report)) => {
                    print_report(&report);
                    anyhow::bail!("order was not submitted");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    tracing::debug!(metrics = %metrics.render()?, "Final metrics");
    Ok(())
}

fn build_handler(config: &AppConfig, metrics: Arc<Metrics>) -> OrderCommandHandler {
    let catalog = CatalogService::new(Arc::new(FileSource::new("Products", &config.catalog_csv)), config.lookup_ttl)
        .with_metrics(metrics.clone());
    let directory = DirectoryService::new(
        Arc::new(FileSource::new("SalesReps", &config.reps_csv)),
        Arc::new(FileSource::new("Customers", &config.customers_csv)),
        config.lookup_ttl,
    )
    .with_metrics(metrics.clone());

    let store = InMemoryOrderStore::with_counter(SubmissionCounter::starting_at(config.first_submission_number));
    let activity: Arc<dyn ActivityLog> = match &config.activity_log {
        Some(path) => Arc::new(JsonLinesActivityLog::new(path)),
        None => Arc::new(InMemoryActivityLog::new()),
    };

    OrderCommandHandler::new(Arc::new(store), Arc::new(catalog), Arc::new(directory), activity, metrics)
        .with_retry(config.store_retry())
        .with_export_dir(&config.export_dir)
}

async fn read_order(path: &Path) -> anyhow::Result<Order> {
    let body = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read order {:?}", path))?;
    let order: Order = serde_json::from_str(&body).with_context(|| format!("failed to parse order {:?}", path))?;
    order
        .check_document()
        .with_context(|| format!("order {:?} carries values the form would refuse", path))?;
    tracing::debug!(order_id = %order.id, rows = order.grid.len(), "Loaded order document");
    Ok(order)
}

fn print_summary(summary: &PricingSummary) {
    println!("Total units:     {}", summary.total_units);
    println!("Pricing tier:    {}", summary.tier);
    println!("Per-unit extras: {}", format_money(summary.per_unit_upcharge));
    for line in &summary.lines {
        println!(
            "  row {:>2} {:<10} {:>5} @ {} = {}",
            line.row + 1,
            line.sku,
            line.units,
            format_money(line.base_price),
            format_money(line.subtotal)
        );
    }
    println!("Product total:   {}", format_money(summary.product_total));
    println!("Art setup:       {}", format_money(summary.art_setup_fee));
    println!("Grand total:     {}", format_money(summary.grand_total));
}

fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        println!("error: {error}");
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
}
