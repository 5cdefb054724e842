//! Date-range order reports: range validation, aggregation, and the
//! printable text rendering.

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};

use crate::models::order::{Order, ValidationError};
use crate::query;

/// Inclusive service-date window for a report. Both bounds are mandatory and
/// must be in chronological order; anything else is rejected before the
/// store is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError(
                "startDate must not be after endDate".to_string(),
            ));
        }
        Ok(ReportRange { start, end })
    }

    /// Parse the raw query parameters, requiring both bounds. Blank values
    /// count as missing, like everywhere else in the filter surface.
    pub fn parse(start: Option<String>, end: Option<String>) -> Result<Self, ValidationError> {
        let start = query::parse_date("startDate", start)?;
        let end = query::parse_date("endDate", end)?;
        match (start, end) {
            (Some(start), Some(end)) => ReportRange::new(start, end),
            _ => Err(ValidationError(
                "Start date and end date are required".to_string(),
            )),
        }
    }
}

/// Response shape for the report endpoint: the raw order array (default) or
/// the printable text document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Text,
}

impl ReportFormat {
    pub fn parse(value: Option<String>) -> Result<Self, ValidationError> {
        match value.as_deref().map(str::trim) {
            None | Some("") | Some("json") => Ok(ReportFormat::Json),
            Some("text") => Ok(ReportFormat::Text),
            Some(other) => Err(ValidationError(format!(
                "unsupported report format '{other}'"
            ))),
        }
    }
}

/// Aggregated report: the matching orders ascending by service date plus the
/// sum of their totals.
#[derive(Debug)]
pub struct OrderReport {
    pub range: ReportRange,
    pub generated_at: DateTime<Utc>,
    pub orders: Vec<Order>,
    pub total_amount: BigDecimal,
}

impl OrderReport {
    pub fn build(range: ReportRange, orders: Vec<Order>) -> Self {
        let total_amount = orders
            .iter()
            .fold(BigDecimal::zero(), |acc, o| acc + &o.total_amount);
        OrderReport {
            range,
            generated_at: Utc::now(),
            orders,
            total_amount,
        }
    }

    /// Render the printable document: title, period, generation timestamp,
    /// one table row per order, and a total-amount footer row.
    pub fn to_text(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Invoice No", "Customer", "Service Date", "Status", "Amount"]);
        for order in &self.orders {
            builder.push_record([
                order.invoice_no.clone().unwrap_or_default(),
                order.customer_name.clone(),
                order.service_date.to_string(),
                order.status.to_string(),
                format!("Rs. {}", order.total_amount),
            ]);
        }
        builder.push_record([
            String::new(),
            String::new(),
            String::new(),
            "Total Amount".to_string(),
            format!("Rs. {}", self.total_amount),
        ]);

        let mut table = builder.build();
        table.with(Style::sharp());
        table.modify(Columns::last(), Alignment::right());

        format!(
            "Order Report\nPeriod: {} to {}\nGenerated: {}\n\n{}\n",
            self.range.start,
            self.range.end,
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            table
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{OrderItem, OrderItems, OrderStatus};
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    fn order(invoice: Option<&str>, customer: &str, day: &str, total: i64) -> Order {
        Order {
            id: Uuid::new_v4(),
            invoice_no: invoice.map(str::to_string),
            customer_name: customer.to_string(),
            address: "123 Main St".to_string(),
            contact_no: None,
            service_date: date(day),
            insert_date: date(day),
            status: OrderStatus::New,
            items: OrderItems(vec![OrderItem {
                product: "1KG Dry Powder".to_string(),
                quantity: 1,
                unit_price: BigDecimal::from(total),
                total: BigDecimal::from(total),
            }]),
            total_amount: BigDecimal::from(total),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn range_requires_both_bounds() {
        let missing_end = ReportRange::parse(Some("2024-01-01".to_string()), None).unwrap_err();
        assert_eq!(missing_end.0, "Start date and end date are required");

        let missing_start = ReportRange::parse(None, Some("2024-01-31".to_string())).unwrap_err();
        assert_eq!(missing_start.0, "Start date and end date are required");
    }

    #[test]
    fn blank_bounds_count_as_missing() {
        let err =
            ReportRange::parse(Some("  ".to_string()), Some("2024-01-31".to_string())).unwrap_err();
        assert_eq!(err.0, "Start date and end date are required");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = ReportRange::parse(
            Some("2024-02-01".to_string()),
            Some("2024-01-01".to_string()),
        )
        .unwrap_err();
        assert_eq!(err.0, "startDate must not be after endDate");
    }

    #[test]
    fn malformed_bound_is_rejected() {
        let err = ReportRange::parse(
            Some("2024-01-01".to_string()),
            Some("31/01/2024".to_string()),
        )
        .unwrap_err();
        assert_eq!(err.0, "endDate must be a valid YYYY-MM-DD date");
    }

    #[test]
    fn single_day_range_is_valid() {
        let range = ReportRange::parse(
            Some("2024-01-15".to_string()),
            Some("2024-01-15".to_string()),
        )
        .expect("same-day range");
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn build_sums_order_totals() {
        let range = ReportRange::new(date("2024-01-01"), date("2024-01-31")).unwrap();
        let report = OrderReport::build(
            range,
            vec![
                order(Some("INV-1"), "A. Silva", "2024-01-05", 1000),
                order(None, "B. Perera", "2024-01-20", 2250),
            ],
        );

        assert_eq!(report.total_amount, BigDecimal::from(3250));
    }

    #[test]
    fn text_report_lists_orders_and_total() {
        let range = ReportRange::new(date("2024-01-01"), date("2024-01-31")).unwrap();
        let report = OrderReport::build(
            range,
            vec![
                order(Some("INV-1"), "A. Silva", "2024-01-05", 1000),
                order(None, "B. Perera", "2024-01-20", 2250),
            ],
        );

        let text = report.to_text();

        assert!(text.starts_with("Order Report\n"));
        assert!(text.contains("Period: 2024-01-01 to 2024-01-31"));
        assert!(text.contains("Generated: "));
        assert!(text.contains("Invoice No"));
        assert!(text.contains("A. Silva"));
        assert!(text.contains("B. Perera"));
        assert!(text.contains("Rs. 1000"));
        assert!(text.contains("Total Amount"));
        assert!(text.contains("Rs. 3250"));
    }

    #[test]
    fn empty_report_renders_zero_total() {
        let range = ReportRange::new(date("2024-01-01"), date("2024-01-31")).unwrap();
        let report = OrderReport::build(range, vec![]);

        let text = report.to_text();

        assert!(text.contains("Total Amount"));
        assert!(text.contains("Rs. 0"));
    }

    #[test]
    fn format_defaults_to_json() {
        assert_eq!(ReportFormat::parse(None).unwrap(), ReportFormat::Json);
        assert_eq!(
            ReportFormat::parse(Some("".to_string())).unwrap(),
            ReportFormat::Json
        );
        assert_eq!(
            ReportFormat::parse(Some("json".to_string())).unwrap(),
            ReportFormat::Json
        );
    }

    #[test]
    fn text_format_is_recognized() {
        assert_eq!(
            ReportFormat::parse(Some("text".to_string())).unwrap(),
            ReportFormat::Text
        );
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = ReportFormat::parse(Some("pdf".to_string())).unwrap_err();
        assert_eq!(err.0, "unsupported report format 'pdf'");
    }
}
