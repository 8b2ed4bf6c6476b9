use crate::options::FormKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_WAITING_TEXT: &str = "I am searching for the best match...";
pub const DEFAULT_WAITING_DELAY_MS: u64 = 3000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrace {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl RawTrace {
    pub fn payload(&self) -> Option<&Value> {
        Some(&self.payload).filter(|payload| !payload.is_null())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceKind {
    Form { form: FormKind },
    WaitingAnimation { text: String, delay_ms: u64 },
    DoneAnimation,
}

impl TraceKind {
    /// Matches on the trace `type`, or on `payload.name` when the payload is
    /// an object.
    pub fn detect(trace: &RawTrace) -> Option<Self> {
        let payload_name = trace.payload.get("name").and_then(Value::as_str);

        [Some(trace.kind.as_str()), payload_name]
            .into_iter()
            .flatten()
            .find_map(|name| Self::from_discriminator(name, &trace.payload))
    }

    fn from_discriminator(name: &str, payload: &Value) -> Option<Self> {
        let kind = match name {
            "order_form_with_wrapping" => TraceKind::Form {
                form: FormKind::OrderWithWrapping,
            },
            "subscription_form" => TraceKind::Form {
                form: FormKind::Subscription,
            },
            "personal_info_form" => TraceKind::Form {
                form: FormKind::PersonalInfo,
            },
            "ext_waitingAnimation" => TraceKind::WaitingAnimation {
                text: payload
                    .get("text")
                    .and_then(Value::as_str)
                    .filter(|text| !text.is_empty())
                    .unwrap_or(DEFAULT_WAITING_TEXT)
                    .to_string(),
                delay_ms: payload
                    .get("delay")
                    .and_then(Value::as_u64)
                    .filter(|delay| *delay > 0)
                    .unwrap_or(DEFAULT_WAITING_DELAY_MS),
            },
            "ext_doneAnimation" => TraceKind::DoneAnimation,
            _ => return None,
        };

        Some(kind)
    }
}
