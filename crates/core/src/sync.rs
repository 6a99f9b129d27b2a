//! Sync codes: portable snapshots of progress and entitlement.
//!
//! A code is the JSON document `{"progress": {...}, "isPremium": bool}`
//! wrapped in standard padded base64, so it survives being pasted through
//! chat messages. It carries no signature or checksum.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{Entitlement, ProgressStore};

const PROGRESS_FIELD: &str = "progress";
const PREMIUM_FIELD: &str = "isPremium";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons a sync code was rejected. None of them touch live state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("sync code is empty")]
    Empty,

    #[error("sync code is not valid base64: {0}")]
    MalformedEncoding(String),

    #[error("sync code does not contain a JSON document: {0}")]
    MalformedPayload(String),

    #[error("sync code has an unexpected shape: {0}")]
    SchemaInvalid(String),
}

//
// ─── PAYLOAD ───────────────────────────────────────────────────────────────────
//

/// Snapshot moved between devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub progress: ProgressStore,
    pub is_premium: bool,
}

impl SyncPayload {
    #[must_use]
    pub fn new(progress: ProgressStore, entitlement: Entitlement) -> Self {
        Self {
            progress,
            is_premium: entitlement.is_premium(),
        }
    }

    #[must_use]
    pub fn entitlement(&self) -> Entitlement {
        Entitlement::from_flag(self.is_premium)
    }

    #[must_use]
    pub fn into_parts(self) -> (ProgressStore, Entitlement) {
        let entitlement = self.entitlement();
        (self.progress, entitlement)
    }
}

//
// ─── CODEC ─────────────────────────────────────────────────────────────────────
//

/// Encodes progress and entitlement into a single-line sync code.
#[must_use]
pub fn encode(progress: &ProgressStore, is_premium: bool) -> String {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Borrowed<'a> {
        progress: &'a ProgressStore,
        is_premium: bool,
    }

    // Map keys are integers and values are plain structs, so this cannot fail.
    let json = serde_json::to_string(&Borrowed {
        progress,
        is_premium,
    })
    .unwrap_or_default();
    BASE64.encode(json.as_bytes())
}

/// Decodes and validates a sync code without applying it.
///
/// # Errors
///
/// - `DecodeError::Empty` for blank input.
/// - `DecodeError::MalformedEncoding` when the base64 layer cannot be inverted.
/// - `DecodeError::MalformedPayload` when the decoded bytes are not UTF-8 JSON.
/// - `DecodeError::SchemaInvalid` when `progress` is missing or not an object,
///   when `isPremium` is missing or not a boolean, or when the progress entries
///   cannot be read.
pub fn decode(code: &str) -> Result<SyncPayload, DecodeError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = BASE64
        .decode(trimmed)
        .map_err(|err| DecodeError::MalformedEncoding(err.to_string()))?;
    let text =
        String::from_utf8(bytes).map_err(|err| DecodeError::MalformedPayload(err.to_string()))?;
    let document: Value = serde_json::from_str(&text)
        .map_err(|err| DecodeError::MalformedPayload(err.to_string()))?;

    let Value::Object(mut fields) = document else {
        return Err(DecodeError::SchemaInvalid("top level is not an object".into()));
    };

    let is_premium = match fields.get(PREMIUM_FIELD) {
        Some(Value::Bool(flag)) => *flag,
        Some(_) => {
            return Err(DecodeError::SchemaInvalid(format!(
                "`{PREMIUM_FIELD}` is not a boolean"
            )));
        }
        None => {
            return Err(DecodeError::SchemaInvalid(format!(
                "missing `{PREMIUM_FIELD}`"
            )));
        }
    };

    let progress = match fields.remove(PROGRESS_FIELD) {
        Some(value @ Value::Object(_)) => serde_json::from_value::<ProgressStore>(value)
            .map_err(|err| DecodeError::SchemaInvalid(format!("`{PROGRESS_FIELD}`: {err}")))?,
        Some(_) => {
            return Err(DecodeError::SchemaInvalid(format!(
                "`{PROGRESS_FIELD}` is not an object"
            )));
        }
        None => {
            return Err(DecodeError::SchemaInvalid(format!(
                "missing `{PROGRESS_FIELD}`"
            )));
        }
    };

    Ok(SyncPayload {
        progress,
        is_premium,
    })
}
