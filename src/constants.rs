use crate::types::CanonicalKey;

/// Canonical field names, in the column order used for the cleaned output
pub const ORDER_ID: &str = "order_id";
pub const CUSTOMER_NAME: &str = "customer_name";
pub const PRODUCT: &str = "product";
pub const QUANTITY: &str = "quantity";
pub const UNIT_PRICE: &str = "unit_price";
pub const ORDER_DATE: &str = "order_date";

/// Substituted when a record carries no usable customer name
pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";

/// Output format for normalized order dates
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

// Default locations used when no config file is present
pub const DEFAULT_CONFIG_PATH: &str = "sales_etl.toml";
pub const DEFAULT_CSV_SOURCE: &str = "data/raw/sales_q1.csv";
pub const DEFAULT_JSON_SOURCE: &str = "data/raw/sales_q2.json";
pub const DEFAULT_SPREADSHEET_SOURCE: &str = "data/raw/sales_q3.xlsx";
pub const DEFAULT_CLEANED_OUTPUT: &str = "data/processed/cleaned_sales.csv";

pub const DEFAULT_TOP_CUSTOMERS: usize = 5;
pub const DEFAULT_PREVIEW_RECORDS: usize = 3;

/// Default alias table: canonical key followed by the header spellings seen in the wild
pub const DEFAULT_ALIASES: &[(CanonicalKey, &[&str])] = &[
    (CanonicalKey::OrderId, &["Order_ID", "Order ID", "order_id"]),
    (CanonicalKey::CustomerName, &["CustomerName", "Customer_Name", "customer name"]),
    (CanonicalKey::Product, &["PRODUCT", "Product", "product"]),
    (CanonicalKey::Quantity, &["Quantity", "qty", "quantity"]),
    (CanonicalKey::UnitPrice, &["Price", "Unit Price", "price", "unit_price"]),
    (CanonicalKey::OrderDate, &["Date", "Purchase Date", "order_date"]),
];
