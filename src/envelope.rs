//! Response envelope normalization.
//!
//! Both the JSON and the XML encodings of a Bus Tracker response arrive here as
//! a [`serde_json::Value`] tree rooted at `bustime-response`. [`normalize`]
//! turns the envelope into a list of flat [`Record`]s, or an
//! [`EnvelopeError::Upstream`] when the API answered with an error.
//!
//! The XML encoding drops the list wrapper when there is exactly one record,
//! so a lone object under the record key is promoted to a one-element list.
//! Field names are trimmed because XML tag text can carry stray whitespace.

use serde_json::Value;

use crate::error::EnvelopeError;
use crate::records::{Record, Table};

/// Root key wrapping every response body.
pub const ROOT_KEY: &str = "bustime-response";

const ERROR_KEY: &str = "error";

static NO_ENVELOPE: Value = Value::Null;

/// Selects the envelope under [`ROOT_KEY`].
///
/// A body without the root yields a null envelope, which normalizes to an
/// empty list.
pub fn unwrap_root(body: &Value) -> Result<&Value, EnvelopeError> {
    match body {
        Value::Object(map) => Ok(map.get(ROOT_KEY).unwrap_or(&NO_ENVELOPE)),
        other => Err(EnvelopeError::Malformed(format!(
            "expected an object body, found {}",
            type_name(other)
        ))),
    }
}

/// Extracts the records stored under `record_key`.
///
/// # Errors
///
/// [`EnvelopeError::Upstream`] if the envelope has an `error` entry;
/// [`EnvelopeError::Malformed`] if the envelope or an entry is not an object.
pub fn normalize(envelope: &Value, record_key: &str) -> Result<Vec<Record>, EnvelopeError> {
    let map = match envelope {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(EnvelopeError::Malformed(format!(
                "expected an object envelope, found {}",
                type_name(other)
            )));
        }
    };

    if let Some(error) = map.get(ERROR_KEY) {
        return Err(EnvelopeError::Upstream {
            message: error_message(error),
        });
    }

    let entries: Vec<&Value> = match map.get(record_key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| to_record(entry, record_key, index))
        .collect()
}

/// [`normalize`] followed by [`Table::from_records`].
pub fn normalize_table(envelope: &Value, record_key: &str) -> Result<Table, EnvelopeError> {
    normalize(envelope, record_key).map(Table::from_records)
}

fn to_record(entry: &Value, record_key: &str, index: usize) -> Result<Record, EnvelopeError> {
    let Value::Object(fields) = entry else {
        return Err(EnvelopeError::Malformed(format!(
            "{record_key} entry {index} is {}, not an object",
            type_name(entry)
        )));
    };

    // Keys that collide after trimming keep the first position and the last value.
    Ok(fields
        .iter()
        .map(|(name, value)| (name.trim().to_string(), cell_text(value)))
        .collect())
}

/// Renders a field value as the string stored in a [`Record`].
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn error_message(error: &Value) -> String {
    match error {
        Value::Object(map) => match map.get("msg") {
            Some(msg) => cell_text(msg),
            None => error.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(error_message)
            .collect::<Vec<_>>()
            .join("; "),
        other => cell_text(other),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_route_is_promoted_to_list() {
        let envelope = json!({"route": {"rt": "151", "rtnm": "Sheridan"}});
        let records = normalize(&envelope, "route").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["rt"], "151");
        assert_eq!(records[0]["rtnm"], "Sheridan");
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn test_error_envelope_returns_upstream_error() {
        let envelope = json!({"error": {"msg": "No API key"}});
        let err = normalize(&envelope, "route").unwrap_err();
        assert_eq!(
            err,
            EnvelopeError::Upstream {
                message: "No API key".to_string()
            }
        );
    }

    #[test]
    fn test_error_wins_over_data() {
        let envelope = json!({
            "error": [{"vid": "9999", "msg": "No data found for parameter"}],
            "vehicle": [{"vid": "1234"}]
        });
        assert!(matches!(
            normalize(&envelope, "vehicle"),
            Err(EnvelopeError::Upstream { .. })
        ));
    }

    #[test]
    fn test_error_list_messages_are_joined() {
        let envelope = json!({"error": [{"msg": "first"}, {"msg": "second"}]});
        let err = normalize(&envelope, "stop").unwrap_err();
        assert_eq!(
            err,
            EnvelopeError::Upstream {
                message: "first; second".to_string()
            }
        );
    }

    #[test]
    fn test_bare_string_error() {
        let envelope = json!({"error": "Invalid API access key supplied"});
        let err = normalize(&envelope, "route").unwrap_err();
        assert_eq!(err.to_string(), "upstream error: Invalid API access key supplied");
    }

    #[test]
    fn test_missing_record_key_is_empty() {
        assert!(normalize(&json!({}), "stop").unwrap().is_empty());
        assert!(normalize(&json!({"stop": null}), "stop").unwrap().is_empty());
        assert!(normalize(&Value::Null, "stop").unwrap().is_empty());
    }

    #[test]
    fn test_field_names_are_trimmed_and_values_untouched() {
        let envelope = json!({"stop": [
            {" stpid ": "1", "\tstpnm\n": " Sheridan & Devon ", "lat": "42.0"},
            {"stpid": "2", "stpnm": "Sheridan & Pratt", " lat": "41.9"}
        ]});
        let records = normalize(&envelope, "stop").unwrap();
        for record in &records {
            for key in record.keys() {
                assert_eq!(key, key.trim());
            }
            let keys: Vec<&str> = record.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["stpid", "stpnm", "lat"]);
        }
        assert_eq!(records[0]["stpnm"], " Sheridan & Devon ");
    }

    #[test]
    fn test_colliding_trimmed_names_keep_first_position_last_value() {
        let envelope = json!({"route": {" rt": "1", "rtnm": "Sheridan", "rt ": "2"}});
        let records = normalize(&envelope, "route").unwrap();
        let keys: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["rt", "rtnm"]);
        assert_eq!(records[0]["rt"], "2");
    }

    #[test]
    fn test_row_count_matches_record_count() {
        for n in 0..6 {
            let rows: Vec<Value> = (0..n)
                .map(|i| json!({"rt": i.to_string(), "rtnm": format!("Route {i}")}))
                .collect();
            let envelope = json!({"route": rows});
            let records = normalize(&envelope, "route").unwrap();
            assert_eq!(records.len(), n);
            for (i, record) in records.iter().enumerate() {
                assert_eq!(record["rt"], i.to_string());
                assert_eq!(record["rtnm"], format!("Route {i}"));
            }
        }
    }

    #[test]
    fn test_scalars_are_rendered_as_strings() {
        let envelope = json!({"vehicle": {"vid": "1234", "dly": false, "pdist": 11516, "lat": 41.5, "zone": null}});
        let records = normalize(&envelope, "vehicle").unwrap();
        assert_eq!(records[0]["dly"], "false");
        assert_eq!(records[0]["pdist"], "11516");
        assert_eq!(records[0]["lat"], "41.5");
        assert_eq!(records[0]["zone"], "");
    }

    #[test]
    fn test_non_object_entry_is_malformed() {
        let envelope = json!({"route": ["151"]});
        assert!(matches!(
            normalize(&envelope, "route"),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_object_envelope_is_malformed() {
        assert!(matches!(
            normalize(&json!([1, 2]), "route"),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn test_unwrap_root() {
        let body = json!({"bustime-response": {"route": {"rt": "6"}}});
        let envelope = unwrap_root(&body).unwrap();
        assert_eq!(normalize(envelope, "route").unwrap().len(), 1);

        let missing = json!({"something-else": {}});
        assert!(unwrap_root(&missing).unwrap().is_null());

        assert!(unwrap_root(&json!("text")).is_err());
    }

    #[test]
    fn test_normalize_table_columns() {
        let envelope = json!({"route": [{"rt": "1"}, {"rt": "2", "rtclr": "#336633"}]});
        let table = normalize_table(&envelope, "route").unwrap();
        assert_eq!(table.columns, vec!["rt", "rtclr"]);
        assert_eq!(table.len(), 2);
    }
}
