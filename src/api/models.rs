//! API wire models.
//!
//! Both the inbound listing envelope and the subset of the upstream
//! `/models` response that discovery cares about. Unknown upstream fields
//! are ignored rather than rejected.

use serde::{Deserialize, Serialize};

/// Model information as exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub owned_by: String,
}

/// `GET /v1/models` response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

impl ModelList {
    pub fn new(data: Vec<ModelInfo>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}

/// One model as reported by an upstream `/models` endpoint.
///
/// `object` and `owned_by` are frequently absent or null upstream; defaults
/// are filled in at registration time.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamModel {
    pub id: String,

    #[serde(default)]
    pub object: Option<String>,

    #[serde(default)]
    pub owned_by: Option<String>,
}

/// Upstream `/models` response body.
#[derive(Debug, Deserialize)]
pub struct UpstreamModelList {
    pub data: Vec<UpstreamModel>,
}
