//! JSONL job and result records for `stanza batch`
//!
//! Input, one object per line:
//!
//! ```json
//! {"id": "a", "text": "roses are red", "font": "y2", "background": "y1"}
//! ```
//!
//! Output, one object per job, in input order:
//!
//! ```json
//! {"id": "a", "status": "ok", "fingerprint": "…", "path": "out/….png"}
//! {"id": "b", "status": "error", "error": "Unknown font: …"}
//! ```

use serde::{Deserialize, Serialize};

/// One line of batch input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJob {
    /// Caller's label for the job; the line number when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Ok,
    Error,
}

/// One line of batch output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub id: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    pub fn ok(id: impl Into<String>, fingerprint: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Ok,
            fingerprint: Some(fingerprint.into()),
            path: Some(path.into()),
            error: None,
        }
    }

    pub fn error(id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Error,
            fingerprint: None,
            path: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == JobStatus::Ok
    }
}
