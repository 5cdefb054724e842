//! Filter criteria for order listings and reports, and their translation
//! into SQL.

use chrono::NaiveDate;
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use diesel_full_text_search::configuration::TsConfigurationByName;
use diesel_full_text_search::{
    plainto_tsquery_with_search_config, to_tsvector_with_search_config, TsVectorExtensions,
};
use serde::Deserialize;

use crate::models::order::ValidationError;
use crate::schema::orders;

/// Raw query-string filters as the client sends them. Blank values are legal
/// and mean "not filtered" (the order list form submits empty strings for
/// untouched boxes).
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
    pub invoice_no: Option<String>,
    pub customer_name: Option<String>,
    pub contact_no: Option<String>,
    pub product: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Normalized criteria: trimmed, blanks dropped, dates parsed. The service
/// window only applies when both bounds were supplied; a lone bound is
/// ignored on the list path.
#[derive(Debug, Default, Clone)]
pub struct OrderQuery {
    pub invoice_no: Option<String>,
    pub customer_name: Option<String>,
    pub contact_no: Option<String>,
    pub product: Option<String>,
    pub service_window: Option<(NaiveDate, NaiveDate)>,
}

impl TryFrom<ListParams> for OrderQuery {
    type Error = ValidationError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let start = parse_date("startDate", params.start_date)?;
        let end = parse_date("endDate", params.end_date)?;

        Ok(OrderQuery {
            invoice_no: normalize(params.invoice_no),
            customer_name: normalize(params.customer_name),
            contact_no: normalize(params.contact_no),
            product: normalize(params.product),
            service_window: start.zip(end),
        })
    }
}

/// Parse an optional `YYYY-MM-DD` parameter, treating blanks as absent.
pub(crate) fn parse_date(
    field: &str,
    value: Option<String>,
) -> Result<Option<NaiveDate>, ValidationError> {
    match normalize(value) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError(format!("{field} must be a valid YYYY-MM-DD date"))),
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build the orders select for the given criteria. Filters are ANDed; with
/// no criteria the whole table matches. Callers pick the sort direction.
pub fn filtered(criteria: &OrderQuery) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();

    if let Some(invoice_no) = &criteria.invoice_no {
        query = query.filter(orders::invoice_no.eq(invoice_no.clone()));
    }
    if let Some(name) = &criteria.customer_name {
        // Word-based relevance match, same configuration as the GIN index.
        query = query.filter(
            to_tsvector_with_search_config(
                TsConfigurationByName("english"),
                orders::customer_name,
            )
            .matches(plainto_tsquery_with_search_config(
                TsConfigurationByName("english"),
                name.clone(),
            )),
        );
    }
    if let Some(contact_no) = &criteria.contact_no {
        query = query.filter(orders::contact_no.eq(contact_no.clone()));
    }
    if let Some(product) = &criteria.product {
        // No typed DSL reaches inside a JSONB array, so the item walk stays
        // a SQL fragment with a bound pattern.
        query = query.filter(
            sql::<Bool>(
                "EXISTS (SELECT 1 FROM jsonb_array_elements(items) AS item \
                 WHERE item->>'product' ILIKE ",
            )
            .bind::<Text, _>(like_pattern(product))
            .sql(")"),
        );
    }
    if let Some((start, end)) = criteria.service_window {
        query = query.filter(orders::service_date.between(start, end));
    }

    query
}

/// Wrap a search term in `%` wildcards, escaping any LIKE metacharacters the
/// term itself contains.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
