//! Mapping of Graph API lead responses into `LeadRecord`s.
//!
//! Values are looked up as top-level keys of the response first. Graph lead
//! objects normally carry form answers in a `field_data` array of
//! `{"name": ..., "values": [...]}` objects, so that array is consulted next.
//! Absent, null and empty values fall back to the record defaults.

use serde_json::Value;
use tracing::debug;

use super::types::LeadRecord;

const SERIAL_KEYS: &[&str] = &["sl", "id"];
const FULL_NAME_KEYS: &[&str] = &["full_name"];
const HOSPITAL_NAME_KEYS: &[&str] = &["hospital_name"];
const PHONE_NUMBER_KEYS: &[&str] = &["phone", "phone_number"];
const LOCATION_KEYS: &[&str] = &["location", "city"];

/// Map an enrichment response (or its absence) into a `LeadRecord`.
pub fn map_lead(lead: Option<&Value>) -> LeadRecord {
    let empty = Value::Null;
    let lead = lead.unwrap_or(&empty);

    let record = LeadRecord {
        serial: lookup(lead, SERIAL_KEYS)
            .and_then(|v| as_serial(&v))
            .unwrap_or(LeadRecord::DEFAULT_SERIAL),
        full_name: text_or(lead, FULL_NAME_KEYS, LeadRecord::DEFAULT_FULL_NAME),
        hospital_name: text_or(lead, HOSPITAL_NAME_KEYS, LeadRecord::DEFAULT_HOSPITAL_NAME),
        phone_number: text_or(lead, PHONE_NUMBER_KEYS, LeadRecord::DEFAULT_PHONE_NUMBER),
        location: text_or(lead, LOCATION_KEYS, LeadRecord::DEFAULT_LOCATION),
    };

    debug!(
        serial = record.serial,
        has_full_name = record.full_name != LeadRecord::DEFAULT_FULL_NAME,
        "lead_mapped"
    );

    record
}

fn text_or(lead: &Value, keys: &[&str], default: &str) -> String {
    lookup(lead, keys)
        .and_then(|v| as_text(&v))
        .unwrap_or_else(|| default.to_string())
}

/// Find the first usable value for any of `keys`.
fn lookup(lead: &Value, keys: &[&str]) -> Option<Value> {
    for key in keys {
        if let Some(v) = lead.get(*key).filter(|v| is_present(v)) {
            return Some(v.clone());
        }
    }

    let field_data = lead.get("field_data")?.as_array()?;
    for key in keys {
        let found = field_data
            .iter()
            .filter(|f| f.get("name").and_then(Value::as_str) == Some(*key))
            .filter_map(|f| f.get("values")?.as_array()?.first())
            .find(|v| is_present(v));
        if let Some(v) = found {
            return Some(v.clone());
        }
    }

    None
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Serial numbers must be positive integers; zero counts as absent.
fn as_serial(value: &Value) -> Option<u64> {
    let serial = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (serial != 0).then_some(serial)
}
