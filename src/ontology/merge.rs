// Copyright (c) 2025 - Cowboy AI, Inc.

//! Merging projected records that share an identity

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::record::Record;

/// Merge records sharing the same `id_field` value
///
/// Output keeps the order in which each identity first appeared. Fields are
/// merged independently: the first non-null value seen for a field wins and
/// later values only fill fields that are still null or absent. Records
/// without an identity are dropped.
pub fn merge_records<I>(id_field: &str, records: I) -> Vec<Record>
where
    I: IntoIterator<Item = Record>,
{
    let mut merged: Vec<Record> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(id) = record.get(id_field).filter(|id| !id.is_null()) else {
            debug!("Dropping record without '{}'", id_field);
            continue;
        };
        let key = id.to_string();

        match positions.get(&key) {
            Some(&position) => {
                let existing = &mut merged[position];
                for (field, value) in record {
                    if value.is_null() {
                        continue;
                    }
                    let slot = existing.entry(field).or_insert(Value::Null);
                    if slot.is_null() {
                        *slot = value;
                    }
                }
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    merged
}
