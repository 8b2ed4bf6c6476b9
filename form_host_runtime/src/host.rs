use crate::error::HostError;
use crate::submit::OutboundPayload;
use serde::Serialize;

/// What the conversation resumes with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostAction {
    Complete { payload: OutboundPayload },
    Continue,
}

/// The chat host. `resume` is the only write the forms make to their
/// environment; it is fire-and-forget and never retried.
pub trait Host {
    fn resume(&mut self, action: HostAction) -> Result<(), HostError>;
}

impl<H: Host + ?Sized> Host for &mut H {
    fn resume(&mut self, action: HostAction) -> Result<(), HostError> {
        (**self).resume(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::OrderPayload;
    use serde_json::json;

    #[test]
    fn complete_action_wraps_payload() {
        let action = HostAction::Complete {
            payload: OutboundPayload::Order(OrderPayload {
                quantity: 1,
                selected_variant_title: None,
                selected_variant_id: None,
                wrapping_variant_id: None,
                wrapping_price: None,
                wrapping_title: None,
                wrapping_quantity: None,
            }),
        };

        assert_eq!(
            serde_json::to_value(&action).expect("serialize"),
            json!({ "type": "complete", "payload": { "quantity": 1 } })
        );
    }

    #[test]
    fn continue_action_has_only_a_type() {
        assert_eq!(
            serde_json::to_value(HostAction::Continue).expect("serialize"),
            json!({ "type": "continue" })
        );
    }
}
