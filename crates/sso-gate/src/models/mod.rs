//! Wire models for the identity server API.

use serde::{Deserialize, Serialize};

/// Response envelope used by every identity server JSON endpoint.
///
/// `code == 0` means success; `result` carries the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEnvelope<T> {
    /// Zero on success, non-zero error code otherwise.
    pub code: i64,

    /// Payload; may be absent or null on failure.
    pub result: Option<T>,

    /// Optional human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ServiceEnvelope<T> {
    /// Whether the identity server reported success.
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}
