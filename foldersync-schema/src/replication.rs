use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Body of `POST /_replicate`.
///
/// Both endpoints are full URLs; the instance receiving the request drives the
/// transfer, so credentials for the far side travel inside the URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReplicateRequest {
    pub source: String,
    pub target: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub create_target: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub continuous: bool,
}

impl ReplicateRequest {
    pub fn one_shot(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            create_target: false,
            continuous: false,
        }
    }
}

/// Response of a one-shot replication.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReplicationStatus {
    #[serde(default)]
    pub ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_changes: bool,

    /// Sequence ids are opaque: integers on old servers, strings on newer ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_last_seq: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ReplicationHistory>,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl ReplicationStatus {
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Documents written on the target by the most recent session, if reported.
    pub fn docs_written(&self) -> Option<u64> {
        self.history.first().and_then(|h| h.docs_written)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReplicationHistory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_read: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_written: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_write_failures: Option<u64>,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}
