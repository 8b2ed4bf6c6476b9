use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

pub const DEFAULT_QUANTITY_LABEL: &str = "Quantity";
pub const DEFAULT_SUBMIT_LABEL: &str = "Submit";

/// A price as upstream sends it: a JSON number or a numeric string like `"9.99"`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Price(pub f64);

impl Price {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => number
                .as_f64()
                .filter(|value| value.is_finite())
                .map(Price)
                .ok_or_else(|| de::Error::custom(format!("price {number} is out of range"))),
            Value::String(text) => parse_price(&text)
                .map(Price)
                .ok_or_else(|| de::Error::custom(format!("price `{text}` is not numeric"))),
            other => Err(de::Error::custom(format!(
                "price must be a number or numeric string, got {}",
                value_kind(&other)
            ))),
        }
    }
}

pub fn parse_price(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappingOption {
    #[serde(deserialize_with = "id_string")]
    pub variant_id: String,
    pub price: Price,
    #[serde(default)]
    pub product_name: String,
    #[serde(default, alias = "featuredImageUrl")]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionVariant {
    #[serde(alias = "subscriptionVariantID", deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "subscriptionVariantTitle")]
    pub title: String,
    #[serde(alias = "subscriptionVariantPrice")]
    pub price: Price,
}

/// The decoded trace payload with every well-known field normalized.
///
/// `record` keeps the decoded top-level object so forms can read labels
/// that are not modelled here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalPayload {
    pub quantity_label: Option<String>,
    pub submit_label: Option<String>,
    pub wrapping_section_label: Option<String>,
    pub wrapping_options: Vec<WrappingOption>,
    pub variant_titles: Option<String>,
    pub variant_ids: Option<String>,
    pub subscription_variants: Vec<SubscriptionVariant>,
    pub record: Map<String, Value>,
}

impl CanonicalPayload {
    pub fn label(&self, keys: &[&str]) -> Option<&str> {
        lookup(&self.record, keys).and_then(Value::as_str)
    }
}

/// First non-null value stored under any of `keys`, in order.
pub fn lookup<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(value)
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!(
            "id must be a non-empty string or number, got {}",
            value_kind(&other)
        ))),
    }
}
