//! Per-field filter expression evaluation over a declared column schema.

use std::collections::HashMap;

use tracing::debug;

use crate::join::CombinedRecord;

/// Field name -> raw expression. Empty values impose no constraint.
pub type FilterSet = HashMap<String, String>;

/// Columns are typed once here rather than inferred per token, so a `>`
/// comparison only ever runs against a numeric column. Tokens that make no
/// sense for a column's kind fall back to the permissive vacuous rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Text,
}

pub fn field_kind(name: &str) -> Option<FieldKind> {
    match name {
        "id" | "limit" | "price" | "volume" | "lowalch" | "highalch" | "market_high"
        | "high_time" | "market_low" | "low_time" | "difference" | "price_percentage" => {
            Some(FieldKind::Numeric)
        }
        "name" | "examine" | "members" | "icon" => Some(FieldKind::Text),
        _ => None,
    }
}

/// A record matches iff it satisfies every non-empty filter entry, and each
/// entry's whitespace-split tokens must all hold (conjunctive both ways).
pub fn matches(record: &CombinedRecord, filters: &FilterSet) -> bool {
    filters
        .iter()
        .all(|(field, raw)| field_matches(record, field, raw))
}

fn field_matches(record: &CombinedRecord, field: &str, raw: &str) -> bool {
    raw.split_whitespace()
        .all(|token| token_matches(record, field, token))
}

fn token_matches(record: &CombinedRecord, field: &str, token: &str) -> bool {
    let kind = field_kind(field);

    if let Some(rest) = token.strip_prefix('>') {
        return comparison_matches(record, field, kind, rest, token, |value, bound| {
            value > bound
        });
    }
    if let Some(rest) = token.strip_prefix('<') {
        return comparison_matches(record, field, kind, rest, token, |value, bound| {
            value < bound
        });
    }

    match kind {
        Some(FieldKind::Numeric) => match token.parse::<f64>() {
            Ok(expected) => record
                .numeric_field(field)
                .map(|value| value == expected)
                .unwrap_or(false),
            Err(_) => substring_matches(record, field, token),
        },
        Some(FieldKind::Text) => substring_matches(record, field, token),
        None => false,
    }
}

fn comparison_matches(
    record: &CombinedRecord,
    field: &str,
    kind: Option<FieldKind>,
    rest: &str,
    token: &str,
    cmp: impl Fn(f64, f64) -> bool,
) -> bool {
    match (kind, rest.parse::<f64>()) {
        (Some(FieldKind::Numeric), Ok(bound)) => record
            .numeric_field(field)
            .map(|value| cmp(value, bound))
            .unwrap_or(false),
        // A real bound against an unknown column has nothing to compare
        // with; the condition fails like any other absent value.
        (None, Ok(_)) => false,
        // Unparsable bound, or an ordering comparison on a text column: the
        // token is satisfied vacuously. Kept observable rather than silent.
        _ => {
            debug!(
                component = "filter",
                event = "filter.token.vacuous",
                field,
                token
            );
            true
        }
    }
}

fn substring_matches(record: &CombinedRecord, field: &str, token: &str) -> bool {
    record
        .text_field(field)
        .map(|value| value.to_lowercase().contains(&token.to_lowercase()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::{RawMarketRecord, RawMetadataRecord};
    use crate::join::join_records;

    fn record(name: &str, price: i64, high: Option<i64>) -> CombinedRecord {
        let metadata = vec![RawMetadataRecord {
            id: 1,
            name: name.to_string(),
            limit: Some(100),
            price,
            volume: 5,
            examine: Some("Some old bones.".to_string()),
            members: false,
            lowalch: None,
            highalch: None,
            icon: None,
        }];
        let market = vec![RawMarketRecord {
            id: 1,
            high,
            high_time: None,
            low: None,
            low_time: None,
        }];
        join_records(&metadata, &market).remove(0)
    }

    fn filters(entries: &[(&str, &str)]) -> FilterSet {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_filter_set_accepts_everything() {
        assert!(matches(&record("A", 1, None), &FilterSet::new()));
    }

    #[test]
    fn empty_expression_imposes_no_constraint() {
        assert!(matches(&record("A", 1, None), &filters(&[("price", "")])));
        assert!(matches(&record("A", 1, None), &filters(&[("price", "  ")])));
    }

    #[test]
    fn numeric_comparison_tokens() {
        let r = record("A", 15000, None);
        assert!(matches(&r, &filters(&[("price", ">10000")])));
        assert!(!matches(&r, &filters(&[("price", "<10000")])));
        assert!(matches(&r, &filters(&[("price", "15000")])));
        assert!(!matches(&r, &filters(&[("price", "15001")])));
    }

    #[test]
    fn tokens_within_a_field_are_conjunctive() {
        let r = record("A", 15000, None);
        assert!(matches(&r, &filters(&[("price", ">10000 <20000")])));
        assert!(!matches(&r, &filters(&[("price", ">10000 <12000")])));
    }

    #[test]
    fn fields_are_conjunctive() {
        let r = record("Dragon bones", 15000, None);
        let both = filters(&[("price", ">10000"), ("name", "drag")]);
        let price_only = filters(&[("price", ">10000")]);
        let name_only = filters(&[("name", "drag")]);

        assert_eq!(
            matches(&r, &both),
            matches(&r, &price_only) && matches(&r, &name_only)
        );
        assert!(matches(&r, &both));
        assert!(!matches(&r, &filters(&[("price", ">10000"), ("name", "zzz")])));
    }

    #[test]
    fn substring_is_case_insensitive() {
        let r = record("Dragon bones", 1, None);
        assert!(matches(&r, &filters(&[("name", "drag")])));
        assert!(matches(&r, &filters(&[("name", "DRAGON")])));
        assert!(!matches(&r, &filters(&[("name", "zzz")])));
    }

    #[test]
    fn comparison_with_unparsable_bound_is_vacuously_true() {
        let r = record("A", 15000, None);
        assert!(matches(&r, &filters(&[("price", ">abc")])));
        assert!(matches(&r, &filters(&[("price", "<")])));
    }

    #[test]
    fn comparison_against_a_text_field_is_vacuously_true() {
        let r = record("A", 1, None);
        assert!(matches(&r, &filters(&[("name", ">100")])));
    }

    #[test]
    fn absent_value_fails_numeric_and_substring_tokens() {
        let r = record("A", 15000, None);
        assert!(!matches(&r, &filters(&[("market_high", ">0")])));
        assert!(!matches(&r, &filters(&[("market_high", "0")])));
        assert!(!matches(&r, &filters(&[("icon", "coins")])));
    }

    #[test]
    fn unknown_field_fails_everything_except_unparsable_comparisons() {
        let r = record("A", 1, None);
        assert!(!matches(&r, &filters(&[("bogus", "1")])));
        assert!(!matches(&r, &filters(&[("bogus", "text")])));
        assert!(matches(&r, &filters(&[("bogus", ">abc")])));
    }

    #[test]
    fn parsable_comparison_on_unknown_field_fails() {
        let r = record("A", 15000, None);
        assert!(!matches(&r, &filters(&[("bogus", ">100")])));
        assert!(!matches(&r, &filters(&[("bogus", "<100")])));
    }

    #[test]
    fn numeric_field_with_market_data_filters_on_derived_values() {
        let r = record("A", 12000, Some(10000));
        assert!(matches(&r, &filters(&[("difference", "2000")])));
        assert!(matches(&r, &filters(&[("price_percentage", ">19 <21")])));
    }
}
