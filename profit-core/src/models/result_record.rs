use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AnalysisInput, AnalysisResult};

/// A stored analysis. Records are append-only; `id` increases with every
/// insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: i64,
    pub input: AnalysisInput,
    pub result: AnalysisResult,
    pub created_at: DateTime<Utc>,
}

/// For appending new records (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResultRecord {
    pub input: AnalysisInput,
    pub result: AnalysisResult,
}

impl NewResultRecord {
    pub fn new(
        input: AnalysisInput,
        result: AnalysisResult,
    ) -> Self {
        Self { input, result }
    }
}
