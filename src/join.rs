//! Left-biased join of the official and market feeds into table records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::feeds::{RawMarketRecord, RawMetadataRecord};

/// The join output, one per official-feed item. Market-derived fields stay
/// `None` when no market record exists for the id; `limit` is the one field
/// deliberately defaulted to 0 instead of propagating the absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRecord {
    pub id: i64,
    pub name: String,
    pub limit: i64,
    pub price: i64,
    pub volume: i64,
    pub examine: Option<String>,
    pub members: bool,
    pub lowalch: Option<i64>,
    pub highalch: Option<i64>,
    pub icon: Option<String>,
    pub market_high: Option<i64>,
    pub high_time: Option<i64>,
    pub market_low: Option<i64>,
    pub low_time: Option<i64>,
    pub difference: Option<i64>,
    pub price_percentage: Option<f64>,
}

/// Full outer join on id, restricted to the official-feed universe: every
/// metadata record yields exactly one output row in input order, market-only
/// ids yield nothing. Duplicate market ids resolve last-write-wins.
pub fn join_records(
    metadata: &[RawMetadataRecord],
    market: &[RawMarketRecord],
) -> Vec<CombinedRecord> {
    let mut by_id: HashMap<i64, &RawMarketRecord> = HashMap::new();
    for record in market {
        by_id.insert(record.id, record);
    }

    metadata
        .iter()
        .map(|meta| combine(meta, by_id.get(&meta.id).copied()))
        .collect()
}

fn combine(meta: &RawMetadataRecord, market: Option<&RawMarketRecord>) -> CombinedRecord {
    let market_high = market.and_then(|m| m.high);
    let market_low = market.and_then(|m| m.low);

    let difference = market_high.map(|high| meta.price - high);
    let price_percentage = market_high.and_then(|high| {
        if high == 0 {
            None
        } else {
            Some((meta.price - high) as f64 / high as f64 * 100.0)
        }
    });

    CombinedRecord {
        id: meta.id,
        name: meta.name.clone(),
        limit: meta.limit.unwrap_or(0),
        price: meta.price,
        volume: meta.volume,
        examine: meta.examine.clone(),
        members: meta.members,
        lowalch: meta.lowalch,
        highalch: meta.highalch,
        icon: meta.icon.clone(),
        market_high,
        high_time: market.and_then(|m| m.high_time),
        market_low,
        low_time: market.and_then(|m| m.low_time),
        difference,
        price_percentage,
    }
}

impl CombinedRecord {
    /// Numeric view of a field for comparison filters and sorting.
    /// `None` for text fields, unknown names, and absent optional values.
    pub fn numeric_field(&self, name: &str) -> Option<f64> {
        match name {
            "id" => Some(self.id as f64),
            "limit" => Some(self.limit as f64),
            "price" => Some(self.price as f64),
            "volume" => Some(self.volume as f64),
            "lowalch" => self.lowalch.map(|v| v as f64),
            "highalch" => self.highalch.map(|v| v as f64),
            "market_high" => self.market_high.map(|v| v as f64),
            "high_time" => self.high_time.map(|v| v as f64),
            "market_low" => self.market_low.map(|v| v as f64),
            "low_time" => self.low_time.map(|v| v as f64),
            "difference" => self.difference.map(|v| v as f64),
            "price_percentage" => self.price_percentage,
            _ => None,
        }
    }

    /// String view of a field for substring filters. `None` when the value is
    /// absent or the name is unknown.
    pub fn text_field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "name" => Some(self.name.clone()),
            "limit" => Some(self.limit.to_string()),
            "price" => Some(self.price.to_string()),
            "volume" => Some(self.volume.to_string()),
            "examine" => self.examine.clone(),
            "members" => Some(self.members.to_string()),
            "lowalch" => self.lowalch.map(|v| v.to_string()),
            "highalch" => self.highalch.map(|v| v.to_string()),
            "icon" => self.icon.clone(),
            "market_high" => self.market_high.map(|v| v.to_string()),
            "high_time" => self.high_time.map(|v| v.to_string()),
            "market_low" => self.market_low.map(|v| v.to_string()),
            "low_time" => self.low_time.map(|v| v.to_string()),
            "difference" => self.difference.map(|v| v.to_string()),
            "price_percentage" => self.price_percentage.map(|v| v.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: i64, name: &str, price: i64) -> RawMetadataRecord {
        RawMetadataRecord {
            id,
            name: name.to_string(),
            limit: None,
            price,
            volume: 0,
            examine: None,
            members: false,
            lowalch: None,
            highalch: None,
            icon: None,
        }
    }

    fn market(id: i64, high: Option<i64>, low: Option<i64>) -> RawMarketRecord {
        RawMarketRecord {
            id,
            high,
            high_time: high.map(|_| 1_735_689_600),
            low,
            low_time: low.map(|_| 1_735_689_500),
        }
    }

    #[test]
    fn empty_market_yields_one_row_per_metadata_record_with_null_derivations() {
        let metadata = vec![meta(1, "A", 10), meta(2, "B", 20)];
        let joined = join_records(&metadata, &[]);

        assert_eq!(joined.len(), 2);
        for row in &joined {
            assert_eq!(row.market_high, None);
            assert_eq!(row.market_low, None);
            assert_eq!(row.difference, None);
            assert_eq!(row.price_percentage, None);
        }
    }

    #[test]
    fn market_only_ids_produce_no_rows_and_order_follows_metadata() {
        let metadata = vec![meta(5, "E", 1), meta(3, "C", 1)];
        let rows = join_records(&metadata, &[market(3, Some(2), None), market(99, Some(9), None)]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 5);
        assert_eq!(rows[1].id, 3);
        assert_eq!(rows[1].market_high, Some(2));
    }

    #[test]
    fn derived_fields_follow_the_spec_arithmetic() {
        let rows = join_records(&[meta(1, "A", 12000)], &[market(1, Some(10000), Some(9000))]);

        assert_eq!(rows[0].difference, Some(2000));
        assert_eq!(rows[0].price_percentage, Some(20.0));
        assert_eq!(rows[0].market_low, Some(9000));
    }

    #[test]
    fn zero_market_high_yields_null_percentage_not_infinity() {
        let rows = join_records(&[meta(1, "A", 100)], &[market(1, Some(0), None)]);

        assert_eq!(rows[0].difference, Some(100));
        assert_eq!(rows[0].price_percentage, None);
    }

    #[test]
    fn null_market_high_propagates_through_both_derived_fields() {
        let rows = join_records(&[meta(1, "A", 100)], &[market(1, None, Some(50))]);

        assert_eq!(rows[0].market_low, Some(50));
        assert_eq!(rows[0].difference, None);
        assert_eq!(rows[0].price_percentage, None);
    }

    #[test]
    fn duplicate_market_ids_resolve_last_write_wins() {
        let rows = join_records(
            &[meta(1, "A", 100)],
            &[market(1, Some(10), None), market(1, Some(30), None)],
        );

        assert_eq!(rows[0].market_high, Some(30));
    }

    #[test]
    fn missing_limit_is_normalized_to_zero() {
        let rows = join_records(&[meta(1, "A", 100)], &[]);
        assert_eq!(rows[0].limit, 0);
    }

    #[test]
    fn field_accessors_cover_absent_values_and_unknown_names() {
        let rows = join_records(&[meta(1, "Dragon bones", 100)], &[]);
        let row = &rows[0];

        assert_eq!(row.numeric_field("price"), Some(100.0));
        assert_eq!(row.numeric_field("difference"), None);
        assert_eq!(row.numeric_field("name"), None);
        assert_eq!(row.numeric_field("nope"), None);
        assert_eq!(row.text_field("name").as_deref(), Some("Dragon bones"));
        assert_eq!(row.text_field("examine"), None);
        assert_eq!(row.text_field("nope"), None);
    }
}
