use serde::{Deserialize, Serialize};

/// Document category, mirrored from the server. The upload form requires one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}
