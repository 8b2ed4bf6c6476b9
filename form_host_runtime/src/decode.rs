use crate::error::{BuildIssue, DataIntegrityError, DecodeError};
use crate::payload::{
    CanonicalPayload, SubscriptionVariant, WrappingOption, from_value, lookup, value_kind,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Upstream has been seen encoding the same field as a value, a JSON string,
/// and a JSON string of a JSON string.
pub const MAX_ENCODING_DEPTH: usize = 2;

const QUANTITY_LABEL_KEYS: &[&str] = &["quantityLabel", "lb_quantity"];
const SUBMIT_LABEL_KEYS: &[&str] = &["submitLabel", "bt_submit"];
const WRAPPING_LABEL_KEYS: &[&str] = &["wrappingSectionLabel", "lb_chooseWrapping"];
const WRAPPING_KEYS: &[&str] = &["wrappingOptions", "filteredWrapping"];
const VARIANT_TITLE_KEYS: &[&str] = &["variantTitles", "selectedVariantTitle"];
const VARIANT_ID_KEYS: &[&str] = &["variantIds", "selectedVariantID"];
const SUBSCRIPTION_KEYS: &[&str] = &["subscriptionVariants", "subscriptionVariantData"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub payload: CanonicalPayload,
    pub errors: Vec<BuildIssue>,
}

/// Normalizes a raw trace payload. Never fails: every problem degrades the
/// affected field to its empty default and is recorded in `errors`.
pub fn decode_payload(raw: Option<&Value>) -> Decoded {
    let mut errors = Vec::new();
    let record = decode_record(raw, &mut errors);

    let payload = CanonicalPayload {
        quantity_label: decode_text(&record, QUANTITY_LABEL_KEYS, "quantityLabel", &mut errors),
        submit_label: decode_text(&record, SUBMIT_LABEL_KEYS, "submitLabel", &mut errors),
        wrapping_section_label: decode_text(
            &record,
            WRAPPING_LABEL_KEYS,
            "wrappingSectionLabel",
            &mut errors,
        ),
        wrapping_options: decode_records::<WrappingOption>(
            &record,
            WRAPPING_KEYS,
            "wrappingOptions",
            &mut errors,
        ),
        variant_titles: decode_text(&record, VARIANT_TITLE_KEYS, "variantTitles", &mut errors),
        variant_ids: decode_text(&record, VARIANT_ID_KEYS, "variantIds", &mut errors),
        subscription_variants: decode_records::<SubscriptionVariant>(
            &record,
            SUBSCRIPTION_KEYS,
            "subscriptionVariants",
            &mut errors,
        ),
        record,
    };

    log::debug!("decoded payload: {payload:?}");

    Decoded { payload, errors }
}

fn decode_record(raw: Option<&Value>, errors: &mut Vec<BuildIssue>) -> Map<String, Value> {
    let Some(raw) = raw.filter(|value| !value.is_null()) else {
        return Map::new();
    };

    let decoded = match unwrap_encoded(raw) {
        Ok(decoded) => decoded,
        Err(message) => {
            record_issue(errors, DecodeError::Payload(message));
            return Map::new();
        }
    };

    match decoded.into_owned() {
        Value::Object(map) => map,
        other => {
            record_issue(
                errors,
                DecodeError::PayloadShape {
                    found: value_kind(&other),
                },
            );
            Map::new()
        }
    }
}

fn decode_text(
    record: &Map<String, Value>,
    keys: &[&str],
    field: &'static str,
    errors: &mut Vec<BuildIssue>,
) -> Option<String> {
    match lookup(record, keys)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        other => {
            record_issue(
                errors,
                DecodeError::FieldShape {
                    field,
                    found: value_kind(other),
                    expected: "a string",
                },
            );
            None
        }
    }
}

fn decode_records<T: DeserializeOwned>(
    record: &Map<String, Value>,
    keys: &[&str],
    field: &'static str,
    errors: &mut Vec<BuildIssue>,
) -> Vec<T> {
    let Some(value) = lookup(record, keys) else {
        return Vec::new();
    };

    if value.as_str().is_some_and(|text| text.trim().is_empty()) {
        return Vec::new();
    }

    let decoded = match unwrap_encoded(value) {
        Ok(decoded) => decoded,
        Err(message) => {
            record_issue(errors, DecodeError::Field { field, message });
            return Vec::new();
        }
    };

    let Value::Array(items) = decoded.as_ref() else {
        record_issue(
            errors,
            DecodeError::FieldShape {
                field,
                found: value_kind(&decoded),
                expected: "an array of records",
            },
        );
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match from_value::<T>(item) {
            Ok(entry) => Some(entry),
            Err(err) => {
                record_issue(
                    errors,
                    DataIntegrityError::InvalidEntry {
                        field,
                        index,
                        message: err.to_string(),
                    },
                );
                None
            }
        })
        .collect()
}

/// Peels up to [`MAX_ENCODING_DEPTH`] layers of JSON string encoding.
/// Structured values are returned as-is.
pub fn unwrap_encoded(value: &Value) -> Result<Cow<'_, Value>, String> {
    let mut current = Cow::Borrowed(value);

    for _ in 0..MAX_ENCODING_DEPTH {
        let Value::String(text) = current.as_ref() else {
            break;
        };
        let next = serde_json::from_str::<Value>(text).map_err(|err| err.to_string())?;
        current = Cow::Owned(next);
    }

    Ok(current)
}

fn record_issue(errors: &mut Vec<BuildIssue>, issue: impl Into<BuildIssue>) {
    let issue = issue.into();
    log::warn!("{}: {issue}", issue.code());
    errors.push(issue);
}
