use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Response of `GET /{db}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseInfo {
    pub db_name: String,

    #[serde(default)]
    pub doc_count: u64,

    #[serde(default)]
    pub doc_del_count: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<Value>,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

/// Response of `PUT /{db}/{doc}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DocumentWriteResponse {
    #[serde(default)]
    pub ok: bool,
    pub id: String,
    pub rev: String,
}
