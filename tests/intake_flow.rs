use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use apparel_order_intake::activity::{ActivityLog, ClientContext, JsonLinesActivityLog};
use apparel_order_intake::catalog::CatalogService;
use apparel_order_intake::directory::{DirectoryService, RepAuthenticator};
use apparel_order_intake::domain::order::{
    DesignSlotId, HeaderChange, Order, OrderCommand, OrderCommandHandler, OrderError, OrderStatus, Size,
};
use apparel_order_intake::lookup::InlineSource;
use apparel_order_intake::metrics::Metrics;
use apparel_order_intake::store::{InMemoryOrderStore, OrderStore};

const PRODUCTS: &str = "\
SKU,Brand,Description,Colors,Sizes,SP 36,SP 72,EMB 36,EMB 72,APP 36,SUB 50,LTH 50
TS100,Gildan,Heavy Cotton Tee,\"Navy, White\",\"S, M, L, XL, 2XL\",8.00,6.50,12.00,10.00,,,
HD200,Independent,Pullover Hood,Black,\"M, L, XL\",18.00,16.00,,,24.00,,
";

const REPS: &str = "\
SalesRep,PIN,UrlId,SheetAccess
Dana,4821,dana-7f3a,Yes
Lee,,lee-19bc,
";

const CUSTOMERS: &str = "\
CompanyName,SalesRep,Address1,Address2,AddressCity,AddressState,AddressZip
Beach Club,Dana,1 Gulf Blvd,Suite 4,Destin,FL,32541
Pine Ridge School,Lee,7 Ridge Way,,Tallahassee,FL,32301
";

struct Fixture {
    handler: OrderCommandHandler,
    auth: RepAuthenticator,
    store: Arc<InMemoryOrderStore>,
    export_dir: tempfile::TempDir,
    log_path: std::path::PathBuf,
    _log_dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let ttl = Duration::from_secs(300);
    let metrics = Arc::new(Metrics::new().unwrap());
    let catalog = Arc::new(CatalogService::new(Arc::new(InlineSource::new("Products", PRODUCTS)), ttl));
    let directory = Arc::new(DirectoryService::new(
        Arc::new(InlineSource::new("SalesReps", REPS)),
        Arc::new(InlineSource::new("Customers", CUSTOMERS)),
        ttl,
    ));

    let log_dir = tempfile::tempdir().unwrap();
    let log_path = log_dir.path().join("activity.jsonl");
    let activity: Arc<dyn ActivityLog> = Arc::new(JsonLinesActivityLog::new(&log_path));

    let store = Arc::new(InMemoryOrderStore::new());
    let export_dir = tempfile::tempdir().unwrap();

    let handler = OrderCommandHandler::new(store.clone(), catalog, directory.clone(), activity.clone(), metrics)
        .with_export_dir(export_dir.path());
    let auth = RepAuthenticator::new(directory, activity);

    Fixture {
        handler,
        auth,
        store,
        export_dir,
        log_path,
        _log_dir: log_dir,
    }
}

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

async fn apply(handler: &OrderCommandHandler, order: &mut Order, commands: Vec<OrderCommand>) {
    for command in commands {
        handler.handle(order, command).await.unwrap();
    }
}

fn select_sku(row: usize, sku: &str) -> OrderCommand {
    OrderCommand::SelectSku {
        row,
        sku: sku.into(),
        brand: String::new(),
        description: String::new(),
        offered_colors: vec![],
    }
}

#[tokio::test]
async fn test_rep_signs_in_prices_and_submits_order() {
    let f = fixture();
    let context = ClientContext::new("10.1.2.3", "Mozilla/5.0");

    let identity = f.auth.open_session(&context, Some("dana-7f3a")).await.unwrap().unwrap();
    assert_eq!(identity.name, "Dana");

    let mut order = f.handler.new_order(date(4, 10));
    apply(
        &f.handler,
        &mut order,
        vec![
            OrderCommand::SelectSalesRep { sales_rep: Some(identity.name.clone()), keeps_customer: false },
            OrderCommand::SelectCustomer { customer: Some("Beach Club".into()), address: None },
            OrderCommand::EditHeader(HeaderChange::PoNumber("PO-7781".into())),
            OrderCommand::EditHeader(HeaderChange::ShipDate(Some(date(4, 24)))),
            OrderCommand::EditHeader(HeaderChange::DropDeadDate(Some(date(4, 30)))),
            OrderCommand::SetPremiumFourColor { slot: DesignSlotId::First, enabled: true },
            OrderCommand::SetArtSetupHours(Decimal::new(15, 1)),
            select_sku(0, "TS100"),
            OrderCommand::SetColor { row: 0, color: "Navy".into() },
            OrderCommand::SetQuantity { row: 0, size: Size::M, quantity: 60 },
            OrderCommand::SetQuantity { row: 0, size: Size::L, quantity: 12 },
        ],
    )
    .await;
    assert_eq!(order.header.shipping.city, "Destin");

    // 72 pieces reach the volume break: (6.50 + 2.00 premium) * 72, plus 1.5h of art
    let quote = f.handler.price(&order).await;
    assert_eq!(quote.total_units, 72);
    assert_eq!(quote.product_total, Decimal::from(612));
    assert_eq!(quote.grand_total, Decimal::from(687));

    f.handler.save_draft(&order, &context).await.unwrap();
    let receipt = f.handler.submit(&mut order, &context).await.unwrap();

    assert_eq!(receipt.submission_number.value(), 1001);
    assert!(receipt.warnings.is_empty());
    assert_eq!(receipt.pricing, quote);
    assert_eq!(order.status, OrderStatus::Submitted);

    let export_path = receipt.export_path.unwrap();
    assert!(export_path.starts_with(f.export_dir.path()));
    let file_name = export_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("shopworks_export_1001_"));

    let exported = tokio::fs::read_to_string(&export_path).await.unwrap();
    assert_eq!(
        exported.lines().collect::<Vec<_>>(),
        vec![
            "CustomerID,ItemCode,ColorCode,SizeIndex,Size,Quantity,Price",
            "Beach Club,TS100,Navy,2,M,60,0.0",
            "Beach Club,TS100,Navy,3,L,12,0.0",
        ]
    );

    let stored = f.store.list_for_rep("Dana").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_submitted());

    let result = f.handler.open_draft(order.id).await;
    assert!(matches!(result, Err(OrderError::AlreadySubmitted)));

    let log = tokio::fs::read_to_string(&f.log_path).await.unwrap();
    let event_types: Vec<String> = log
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["event_type"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(event_types, vec!["LOGIN_SUCCESS", "DRAFT_SAVED", "ORDER_SUBMITTED"]);
}

#[tokio::test]
async fn test_submissions_are_numbered_in_sequence() {
    let f = fixture();
    let context = ClientContext::new("10.1.2.4", "Safari");

    let mut numbers = Vec::new();
    for (rep, customer, sku) in [("Dana", "Beach Club", "TS100"), ("Lee", "Pine Ridge School", "HD200")] {
        let mut order = f.handler.new_order(date(5, 1));
        apply(
            &f.handler,
            &mut order,
            vec![
                OrderCommand::SelectSalesRep { sales_rep: Some(rep.into()), keeps_customer: false },
                OrderCommand::SelectCustomer { customer: Some(customer.into()), address: None },
                OrderCommand::EditHeader(HeaderChange::PoNumber(format!("PO-{rep}"))),
                select_sku(0, sku),
                OrderCommand::SetQuantity { row: 0, size: Size::L, quantity: 12 },
            ],
        )
        .await;

        let receipt = f.handler.submit(&mut order, &context).await.unwrap();
        assert_eq!(receipt.warnings.len(), 2);
        numbers.push(receipt.submission_number.value());
    }

    assert_eq!(numbers, vec![1001, 1002]);
    assert_eq!(f.store.len().await, 2);

    let exports = std::fs::read_dir(f.export_dir.path()).unwrap().count();
    assert_eq!(exports, 2);
}

#[tokio::test]
async fn test_incomplete_order_is_rejected_and_logged() {
    let f = fixture();
    let context = ClientContext::new("10.1.2.5", "Chrome");

    let mut order = f.handler.new_order(date(4, 10));
    let draft = order.clone();

    match f.handler.submit(&mut order, &context).await {
        Err(OrderError::ValidationFailed(report)) => {
            let fields: Vec<&str> = report.errors.iter().map(|issue| issue.field).collect();
            assert_eq!(
                fields,
                vec!["PO Number", "Customer", "Shipping Address", "Shipping City", "Shipping State/ZIP", "Products"]
            );
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
    assert_eq!(order, draft);
    assert_eq!(f.store.len().await, 0);

    let log = tokio::fs::read_to_string(&f.log_path).await.unwrap();
    assert!(log.contains("\"VALIDATION_FAILED\""));
}
