//! Maps raw agent responses to typed chat messages.
//!
//! Every record yields zero or one message and output order follows input
//! order. Records that do not produce a message are logged, never raised.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::protocol::{RawResponseRecord, ResponseAction, UiMessage};

/// Classify a whole response batch.
pub fn classify(records: &[RawResponseRecord]) -> Vec<UiMessage> {
    records.iter().filter_map(classify_one).collect()
}

/// Classify a single record.
pub fn classify_one(record: &RawResponseRecord) -> Option<UiMessage> {
    let action = &record.action;
    match action {
        ResponseAction::Ignore | ResponseAction::Agent => {
            return Some(UiMessage::Agent(record.text.clone()));
        }
        ResponseAction::Unknown(name) => {
            warn!(action = %name, user = %record.user, "Dropping response with unrecognized action");
            return None;
        }
        _ => {}
    }

    if !record.content.success {
        debug!(action = %action, user = %record.user, "Dropping unsuccessful response");
        return None;
    }

    match action {
        ResponseAction::Strategy => match record.content.get("strategy") {
            Some(value) => decode(action, value.clone()).map(|strategy| UiMessage::Strategy { strategy }),
            None => {
                warn!(action = %action, "Dropping strategy response without a strategy");
                None
            }
        },
        ResponseAction::Transaction => {
            decode(action, payload(record, "transaction")).map(UiMessage::Transaction)
        }
        ResponseAction::Opportunity => {
            decode(action, payload(record, "opportunity")).map(UiMessage::Opportunity)
        }
        ResponseAction::Vault => decode(action, payload(record, "vault")).map(UiMessage::Vault),
        _ => None,
    }
}

/// Payload for a structured action: the object nested under the
/// lower-case action key when present, otherwise the flattened content.
fn payload(record: &RawResponseRecord, key: &str) -> Value {
    match record.content.get(key) {
        Some(nested @ Value::Object(_)) => nested.clone(),
        _ => Value::Object(record.content.fields.clone()),
    }
}

fn decode<T: DeserializeOwned>(action: &ResponseAction, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(action = %action, error = %e, "Dropping response with malformed payload");
            None
        }
    }
}
