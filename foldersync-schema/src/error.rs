use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Error envelope returned by the document store on non-success statuses.
///
/// Example: `{"error":"not_found","reason":"Database does not exist."}`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreErrorBody {
    #[serde(default)]
    pub error: String,

    #[serde(default)]
    pub reason: String,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl StoreErrorBody {
    pub fn is_not_found(&self) -> bool {
        self.error == "not_found"
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.error.as_str(), "unauthorized" | "forbidden")
    }
}
