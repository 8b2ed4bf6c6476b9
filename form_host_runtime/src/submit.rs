use crate::error::SubmitError;
use crate::options::{FormKind, OptionSpace, matrix_key};
use crate::payload::WrappingOption;
use crate::personal::PersonalInfoPayload;
use crate::selection::SelectionState;
use serde::{Deserialize, Serialize, Serializer};

/// Wrapping quantity is fixed; one wrap covers the whole order.
pub const WRAPPING_QUANTITY: u32 = 1;

/// How "offered wrapping, user picked none" reaches the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclinedWrapping {
    /// `"wrappingVariantId": false`
    #[default]
    ExplicitFalse,
    /// field left out, as older hosts expect
    Omit,
}

impl DeclinedWrapping {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "false" | "explicit_false" => Some(DeclinedWrapping::ExplicitFalse),
            "omit" => Some(DeclinedWrapping::Omit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WrappingDecision<'a> {
    NotOffered,
    Declined,
    Chosen(&'a WrappingOption),
}

impl<'a> WrappingDecision<'a> {
    pub fn from_selection(space: &'a OptionSpace, state: &SelectionState) -> Self {
        match state.selected_wrapping(space) {
            Some(option) => WrappingDecision::Chosen(option),
            None if space.offers_wrapping() => WrappingDecision::Declined,
            None => WrappingDecision::NotOffered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrappingVariantId {
    Chosen(String),
    Declined,
}

impl Serialize for WrappingVariantId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WrappingVariantId::Chosen(id) => serializer.serialize_str(id),
            WrappingVariantId::Declined => serializer.serialize_bool(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_variant_title: Option<String>,
    #[serde(rename = "selectedVariantID", skip_serializing_if = "Option::is_none")]
    pub selected_variant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapping_variant_id: Option<WrappingVariantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapping_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapping_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapping_quantity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPayload {
    pub selected_color: String,
    pub selected_scent: String,
    pub selected_delivery: String,
    pub selected_variant_title: String,
    #[serde(rename = "selectedVariantID")]
    pub selected_variant_id: String,
    pub selected_variant_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundPayload {
    Order(OrderPayload),
    Subscription(SubscriptionPayload),
    PersonalInfo(PersonalInfoPayload),
}

pub fn assemble(
    space: &OptionSpace,
    state: &SelectionState,
    policy: DeclinedWrapping,
) -> Result<OutboundPayload, SubmitError> {
    match space.kind() {
        FormKind::OrderWithWrapping => Ok(OutboundPayload::Order(assemble_order(
            space, state, policy,
        ))),
        FormKind::Subscription => assemble_subscription(space, state).map(OutboundPayload::Subscription),
        FormKind::PersonalInfo => state.fields().to_payload().map(OutboundPayload::PersonalInfo),
    }
}

fn assemble_order(space: &OptionSpace, state: &SelectionState, policy: DeclinedWrapping) -> OrderPayload {
    let variants = space.variants();
    let variant = if variants.has_control() {
        state
            .variant_index()
            .and_then(|index| variants.pairs().get(index))
    } else {
        variants.auto_selected()
    };

    let mut payload = OrderPayload {
        quantity: state.quantity(),
        selected_variant_title: variant.map(|pair| pair.title.clone()),
        selected_variant_id: variant.map(|pair| pair.id.clone()),
        wrapping_variant_id: None,
        wrapping_price: None,
        wrapping_title: None,
        wrapping_quantity: None,
    };

    match WrappingDecision::from_selection(space, state) {
        WrappingDecision::Chosen(option) => {
            payload.wrapping_variant_id = Some(WrappingVariantId::Chosen(option.variant_id.clone()));
            payload.wrapping_price = Some(option.price.value());
            payload.wrapping_title = Some(option.product_name.clone());
            payload.wrapping_quantity = Some(WRAPPING_QUANTITY);
        }
        WrappingDecision::Declined if policy == DeclinedWrapping::ExplicitFalse => {
            payload.wrapping_variant_id = Some(WrappingVariantId::Declined);
        }
        WrappingDecision::Declined | WrappingDecision::NotOffered => {}
    }

    payload
}

fn assemble_subscription(
    space: &OptionSpace,
    state: &SelectionState,
) -> Result<SubscriptionPayload, SubmitError> {
    let selection = state.matrix();
    let (Some(color), Some(scent), Some(delivery)) =
        (&selection.color, &selection.scent, &selection.delivery)
    else {
        let unset = |slot: &Option<String>| slot.clone().unwrap_or_else(|| "?".to_string());
        return Err(SubmitError::LookupMiss(matrix_key(
            &unset(&selection.color),
            &unset(&selection.scent),
            &unset(&selection.delivery),
        )));
    };

    let entry = space
        .matrix()
        .resolve(color, scent, delivery)
        .ok_or_else(|| SubmitError::LookupMiss(matrix_key(color, scent, delivery)))?;

    Ok(SubscriptionPayload {
        selected_color: color.clone(),
        selected_scent: scent.clone(),
        selected_delivery: delivery.clone(),
        selected_variant_title: entry.title.clone(),
        selected_variant_id: entry.id.clone(),
        selected_variant_price: entry.price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_payload;
    use crate::selection::MatrixAxis;
    use serde_json::{Value, json};

    fn space(payload: Value, kind: FormKind) -> OptionSpace {
        OptionSpace::build(&decode_payload(Some(&payload)).payload, kind)
    }

    fn gift_space() -> OptionSpace {
        space(
            json!({ "wrappingOptions": [
                { "variantId": "W1", "price": 5, "productName": "Gift", "imageUrl": "x" }
            ]}),
            FormKind::OrderWithWrapping,
        )
    }

    fn to_json(payload: &OutboundPayload) -> Value {
        serde_json::to_value(payload).expect("serialize payload")
    }

    #[test]
    fn chosen_wrapping_is_submitted_with_fixed_quantity() {
        let space = gift_space();
        let mut state = SelectionState::for_space(&space);
        state.toggle_wrapping(0).expect("select W1");
        state.set_quantity_text("2").expect("quantity");

        let payload = assemble(&space, &state, DeclinedWrapping::default()).expect("order");
        assert_eq!(
            to_json(&payload),
            json!({
                "quantity": 2,
                "wrappingVariantId": "W1",
                "wrappingPrice": 5.0,
                "wrappingTitle": "Gift",
                "wrappingQuantity": 1
            })
        );
    }

    #[test]
    fn declined_wrapping_is_explicit_false_by_default() {
        let space = gift_space();
        let mut state = SelectionState::for_space(&space);
        state.set_quantity_text("2").expect("quantity");

        let payload = assemble(&space, &state, DeclinedWrapping::ExplicitFalse).expect("order");
        assert_eq!(to_json(&payload), json!({ "quantity": 2, "wrappingVariantId": false }));
    }

    #[test]
    fn declined_wrapping_can_be_omitted() {
        let space = gift_space();
        let mut state = SelectionState::for_space(&space);
        state.set_quantity_text("2").expect("quantity");

        let payload = assemble(&space, &state, DeclinedWrapping::Omit).expect("order");
        assert_eq!(to_json(&payload), json!({ "quantity": 2 }));
    }

    #[test]
    fn wrapping_never_offered_leaves_field_absent() {
        let space = space(json!({}), FormKind::OrderWithWrapping);
        let state = SelectionState::for_space(&space);

        let payload = assemble(&space, &state, DeclinedWrapping::ExplicitFalse).expect("order");
        assert_eq!(to_json(&payload), json!({ "quantity": 1 }));
    }

    #[test]
    fn variant_control_value_is_submitted() {
        let space = space(
            json!({ "variantTitles": "Black,Silver", "variantIds": "11,12" }),
            FormKind::OrderWithWrapping,
        );
        let mut state = SelectionState::for_space(&space);
        state.choose_variant(1).expect("Silver");

        let payload = to_json(&assemble(&space, &state, DeclinedWrapping::Omit).expect("order"));
        assert_eq!(payload["selectedVariantTitle"], "Silver");
        assert_eq!(payload["selectedVariantID"], "12");
    }

    #[test]
    fn lone_variant_is_submitted_without_interaction() {
        for titles in ["Black", "No additional variants"] {
            let space = space(
                json!({ "variantTitles": titles, "variantIds": "11" }),
                FormKind::OrderWithWrapping,
            );
            let state = SelectionState::for_space(&space);

            let payload = to_json(&assemble(&space, &state, DeclinedWrapping::Omit).expect("order"));
            assert_eq!(payload["selectedVariantTitle"], titles);
            assert_eq!(payload["selectedVariantID"], "11");
        }
    }

    #[test]
    fn subscription_resolves_selected_triple() {
        let space = space(
            json!({ "subscriptionVariants": [
                { "id": "V1", "title": "Red / Vanilla / Weekly", "price": "9.99" }
            ]}),
            FormKind::Subscription,
        );
        let state = SelectionState::for_space(&space);

        let payload = to_json(&assemble(&space, &state, DeclinedWrapping::default()).expect("subscription"));
        assert_eq!(
            payload,
            json!({
                "selectedColor": "Red",
                "selectedScent": "Vanilla",
                "selectedDelivery": "Weekly",
                "selectedVariantTitle": "Red / Vanilla / Weekly",
                "selectedVariantID": "V1",
                "selectedVariantPrice": 9.99
            })
        );
    }

    #[test]
    fn subscription_combination_without_variant_is_a_lookup_miss() {
        let space = space(
            json!({ "subscriptionVariants": [
                { "id": "V1", "title": "Red / Vanilla / Weekly", "price": 1 },
                { "id": "V2", "title": "Blue / Mint / Monthly", "price": 2 }
            ]}),
            FormKind::Subscription,
        );
        let mut state = SelectionState::for_space(&space);
        state
            .select_matrix(MatrixAxis::Color, "Blue", space.matrix())
            .expect("Blue offered");

        assert_eq!(
            assemble(&space, &state, DeclinedWrapping::default()),
            Err(SubmitError::LookupMiss("Blue / Vanilla / Weekly".to_string()))
        );
    }

    #[test]
    fn empty_matrix_cannot_be_submitted() {
        let space = space(json!({ "subscriptionVariants": [] }), FormKind::Subscription);
        let state = SelectionState::for_space(&space);
        assert!(matches!(
            assemble(&space, &state, DeclinedWrapping::default()),
            Err(SubmitError::LookupMiss(_))
        ));
    }

    #[test]
    fn declined_policy_parses_from_config_text() {
        assert_eq!(DeclinedWrapping::parse("omit"), Some(DeclinedWrapping::Omit));
        assert_eq!(DeclinedWrapping::parse(" FALSE "), Some(DeclinedWrapping::ExplicitFalse));
        assert_eq!(DeclinedWrapping::parse("maybe"), None);
    }
}
