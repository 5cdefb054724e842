use std::fmt;
use std::io::Write;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::{Jsonb, Text};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::orders;

/// Product and service names offered by the order-entry form. Orders may
/// reference products outside this list; it is a picker catalog, not a
/// constraint.
pub const PRODUCT_CATALOG: [&str; 18] = [
    "09 Ltrs Water Fire Extinguishers",
    "09 Ltrs Foam Fire Extinguishers",
    "09 Kg Dry Powder Fire Extinguishers",
    "06 Kg Dry Powder Fire Extinguishers",
    "05 Kg Dry Powder Fire Extinguishers",
    "05 Kg CO₂ Fire Extinguishers",
    "03 Kg CO₂ Fire Extinguishers",
    "02 Kg CO₂ Fire Extinguishers",
    "100 Ltr water/Foam/Fire Extinguishers",
    "25 kg Dry Powder/CO₂/Fire Extinguishers",
    "Water/Foam/DCP Head",
    "Water/Foam/DCP Gauges",
    "Water/Foam/DCP Discharge Hose",
    "05 kg Complete Hose",
    "02 kg/03 Kg Complete Hose",
    "05kg, 03kg, 02kg Carbon Dioxide Head",
    "1KG Dry Powder",
    "Fire Blanket",
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

// ── Status ───────────────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
pub enum OrderStatus {
    #[default]
    New,
    Refilling,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::Refilling => "Refilling",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql<Text, Pg> for OrderStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for OrderStatus {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        match value.as_bytes() {
            b"New" => Ok(OrderStatus::New),
            b"Refilling" => Ok(OrderStatus::Refilling),
            other => Err(format!(
                "unknown order status: {}",
                String::from_utf8_lossy(other)
            )
            .into()),
        }
    }
}

// ── Line items ───────────────────────────────────────────────────────────────

/// One product/quantity/price entry. Items live embedded inside their order
/// and have no identity or lifecycle of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: String,
    pub quantity: i32,
    /// Decimal amount, serialized as a string to avoid floating-point issues,
    /// e.g. "500" or "9.99".
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    /// Recomputed server-side as `quantity × unitPrice` on every write.
    #[schema(value_type = String)]
    pub total: BigDecimal,
}

/// Item list persisted as a JSONB array column on the orders table, keeping
/// each order a single row and every write to it atomic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Jsonb)]
pub struct OrderItems(pub Vec<OrderItem>);

impl OrderItems {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OrderItem> {
        self.0.iter()
    }
}

impl FromSql<Jsonb, Pg> for OrderItems {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        let json = <serde_json::Value as FromSql<Jsonb, Pg>>::from_sql(value)?;
        Ok(serde_json::from_value(json)?)
    }
}

impl ToSql<Jsonb, Pg> for OrderItems {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let json = serde_json::to_value(self)?;
        <serde_json::Value as ToSql<Jsonb, Pg>>::to_sql(&json, &mut out.reborrow())
    }
}

// ── Rows ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Queryable, Selectable, Identifiable, ToSchema)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub invoice_no: Option<String>,
    pub customer_name: String,
    pub address: String,
    pub contact_no: Option<String>,
    pub service_date: NaiveDate,
    pub insert_date: NaiveDate,
    pub status: OrderStatus,
    #[schema(value_type = Vec<OrderItem>)]
    pub items: OrderItems,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub invoice_no: Option<String>,
    pub customer_name: String,
    pub address: String,
    pub contact_no: Option<String>,
    pub service_date: NaiveDate,
    pub insert_date: NaiveDate,
    pub status: OrderStatus,
    pub items: OrderItems,
    pub total_amount: BigDecimal,
}

/// Full-document replacement: every column is rewritten, optional fields
/// absent from the payload become NULL, and `updated_at` is bumped even when
/// the new content equals the old.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
#[diesel(treat_none_as_null = true)]
pub struct OrderChangeset {
    pub invoice_no: Option<String>,
    pub customer_name: String,
    pub address: String,
    pub contact_no: Option<String>,
    pub service_date: NaiveDate,
    pub insert_date: NaiveDate,
    pub status: OrderStatus,
    pub items: OrderItems,
    pub total_amount: BigDecimal,
    pub updated_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn from_draft(id: Uuid, draft: OrderDraft) -> Self {
        NewOrder {
            id,
            invoice_no: draft.invoice_no,
            customer_name: draft.customer_name,
            address: draft.address,
            contact_no: draft.contact_no,
            service_date: draft.service_date,
            insert_date: draft.insert_date,
            status: draft.status,
            items: draft.items,
            total_amount: draft.total_amount,
        }
    }
}

impl OrderChangeset {
    pub fn from_draft(draft: OrderDraft) -> Self {
        OrderChangeset {
            invoice_no: draft.invoice_no,
            customer_name: draft.customer_name,
            address: draft.address,
            contact_no: draft.contact_no,
            service_date: draft.service_date,
            insert_date: draft.insert_date,
            status: draft.status,
            items: draft.items,
            total_amount: draft.total_amount,
            updated_at: Utc::now(),
        }
    }
}

// ── Incoming payload & validation ────────────────────────────────────────────

/// Order body as submitted on create and replace. `totalAmount` and each
/// item's `total` stay required for compatibility with existing clients, but
/// both are recomputed before anything is persisted.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(default)]
    pub invoice_no: Option<String>,
    pub customer_name: String,
    pub address: String,
    #[serde(default)]
    pub contact_no: Option<String>,
    pub service_date: NaiveDate,
    pub insert_date: NaiveDate,
    #[serde(default)]
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
}

/// A validated, normalized order body: trimmed text fields and
/// server-computed totals, ready to persist.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub invoice_no: Option<String>,
    pub customer_name: String,
    pub address: String,
    pub contact_no: Option<String>,
    pub service_date: NaiveDate,
    pub insert_date: NaiveDate,
    pub status: OrderStatus,
    pub items: OrderItems,
    pub total_amount: BigDecimal,
}

impl OrderPayload {
    pub fn validate(self) -> Result<OrderDraft, ValidationError> {
        let customer_name = required_text("customerName", &self.customer_name)?;
        let address = required_text("address", &self.address)?;
        let invoice_no = optional_text(self.invoice_no);
        let contact_no = optional_text(self.contact_no);

        if self.items.is_empty() {
            return Err(ValidationError(
                "order must contain at least one item".to_string(),
            ));
        }
        let mut items = Vec::with_capacity(self.items.len());
        for (idx, item) in self.items.into_iter().enumerate() {
            items.push(validate_item(idx, item)?);
        }
        let total_amount = compute_totals(&mut items);

        Ok(OrderDraft {
            invoice_no,
            customer_name,
            address,
            contact_no,
            service_date: self.service_date,
            insert_date: self.insert_date,
            status: self.status,
            items: OrderItems(items),
            total_amount,
        })
    }
}

/// Recompute every line total (`quantity × unitPrice`) and return their sum.
/// The single derivation used on both write paths, so a stored order's
/// `totalAmount` can never drift from its items.
pub fn compute_totals(items: &mut [OrderItem]) -> BigDecimal {
    let mut order_total = BigDecimal::zero();
    for item in items.iter_mut() {
        item.total = BigDecimal::from(item.quantity) * &item.unit_price;
        order_total += &item.total;
    }
    order_total
}

fn required_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_item(idx: usize, item: OrderItem) -> Result<OrderItem, ValidationError> {
    let product = item.product.trim().to_string();
    if product.is_empty() {
        return Err(ValidationError(format!(
            "items[{idx}].product must not be empty"
        )));
    }
    if item.quantity < 1 {
        return Err(ValidationError(format!(
            "items[{idx}].quantity must be at least 1"
        )));
    }
    if item.unit_price < BigDecimal::zero() {
        return Err(ValidationError(format!(
            "items[{idx}].unitPrice must not be negative"
        )));
    }
    Ok(OrderItem { product, ..item })
}
