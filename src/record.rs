// Copyright (c) 2025 - Cowboy AI, Inc.

//! Records, batch parameters and the parameter names shared with statement text

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A flat record produced by an ingestion module
pub type Record = Map<String, Value>;

/// Parameter holding the record batch; statements iterate it as `item`
pub const BATCH_PARAMETER: &str = "DictList";

/// Parameter the Loader binds to the current run's tag
pub const LASTUPDATED_PARAMETER: &str = "lastupdated";

/// Parameter cleanup jobs compare `lastupdated` against
pub const UPDATE_TAG_PARAMETER: &str = "UPDATE_TAG";

/// Page size for iterative cleanup statements
pub const LIMIT_SIZE_PARAMETER: &str = "LIMIT_SIZE";

/// Current UNIX time in seconds, the conventional update tag for a sync run
pub fn update_tag_now() -> i64 {
    Utc::now().timestamp()
}

/// Per-batch values referenced from statements as `$<name>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    /// Create an empty parameter mapping
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Bind `name`, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Copy every binding from `other`, overriding existing names
    pub fn merge(&mut self, other: &Parameters) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overrides_existing_bindings() {
        let mut params = Parameters::new().with("AWS_ID", "111").with("UPDATE_TAG", 1);
        params.merge(&Parameters::new().with("UPDATE_TAG", 2));

        assert_eq!(params.get("AWS_ID"), Some(&json!("111")));
        assert_eq!(params.get("UPDATE_TAG"), Some(&json!(2)));
    }

    #[test]
    fn test_parameters_serialize_as_plain_map() {
        let params = Parameters::new().with("UPDATE_TAG", 7);
        let text = serde_json::to_string(&params).unwrap();
        assert_eq!(text, r#"{"UPDATE_TAG":7}"#);
    }
}
