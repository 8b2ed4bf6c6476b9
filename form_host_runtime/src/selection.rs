use crate::error::SelectionError;
use crate::options::{OptionSpace, VariantMatrix};
use crate::payload::WrappingOption;
use crate::personal::PersonalFields;
use serde::Serialize;

/// One axis of tiles or dropdown entries where at most one index is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleSelect {
    axis: &'static str,
    len: usize,
    selected: Option<usize>,
}

impl SingleSelect {
    pub fn new(axis: &'static str, len: usize) -> Self {
        Self {
            axis,
            len,
            selected: None,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Tile semantics: picking the selected index clears it, anything else
    /// replaces the previous choice.
    pub fn toggle(&mut self, index: usize) -> Result<Option<usize>, SelectionError> {
        self.check(index)?;
        self.selected = match self.selected {
            Some(current) if current == index => None,
            _ => Some(index),
        };
        Ok(self.selected)
    }

    /// Dropdown semantics: always selects.
    pub fn choose(&mut self, index: usize) -> Result<(), SelectionError> {
        self.check(index)?;
        self.selected = Some(index);
        Ok(())
    }

    fn check(&self, index: usize) -> Result<(), SelectionError> {
        if index < self.len {
            Ok(())
        } else {
            Err(SelectionError::OutOfRange {
                axis: self.axis,
                index,
                len: self.len,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixAxis {
    Color,
    Scent,
    Delivery,
}

impl MatrixAxis {
    pub fn name(self) -> &'static str {
        match self {
            MatrixAxis::Color => "color",
            MatrixAxis::Scent => "scent",
            MatrixAxis::Delivery => "delivery",
        }
    }

    fn options(self, matrix: &VariantMatrix) -> &[String] {
        match self {
            MatrixAxis::Color => matrix.colors(),
            MatrixAxis::Scent => matrix.scents(),
            MatrixAxis::Delivery => matrix.deliveries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixSelection {
    pub color: Option<String>,
    pub scent: Option<String>,
    pub delivery: Option<String>,
}

impl MatrixSelection {
    fn first_of(matrix: &VariantMatrix) -> Self {
        Self {
            color: matrix.colors().first().cloned(),
            scent: matrix.scents().first().cloned(),
            delivery: matrix.deliveries().first().cloned(),
        }
    }

    fn slot(&mut self, axis: MatrixAxis) -> &mut Option<String> {
        match axis {
            MatrixAxis::Color => &mut self.color,
            MatrixAxis::Scent => &mut self.scent,
            MatrixAxis::Delivery => &mut self.delivery,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    quantity: u32,
    wrapping: SingleSelect,
    variant: SingleSelect,
    matrix: MatrixSelection,
    fields: PersonalFields,
}

impl SelectionState {
    pub fn for_space(space: &OptionSpace) -> Self {
        let variants = space.variants();
        let mut variant = SingleSelect::new("variant", variants.pairs().len());
        if variants.has_control() {
            variant.selected = Some(0);
        }

        Self {
            quantity: 1,
            wrapping: SingleSelect::new("wrapping", space.wrapping().len()),
            variant,
            matrix: MatrixSelection::first_of(space.matrix()),
            fields: PersonalFields::default(),
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Reads the quantity text field. Invalid input leaves the previous
    /// quantity in place.
    pub fn set_quantity_text(&mut self, text: &str) -> Result<u32, SelectionError> {
        let quantity =
            parse_quantity(text).ok_or_else(|| SelectionError::InvalidQuantity(text.to_string()))?;
        self.quantity = quantity;
        Ok(quantity)
    }

    pub fn increment_quantity(&mut self) -> u32 {
        self.quantity = self.quantity.saturating_add(1);
        self.quantity
    }

    pub fn decrement_quantity(&mut self) -> u32 {
        if self.quantity > 1 {
            self.quantity -= 1;
        }
        self.quantity
    }

    pub fn toggle_wrapping(&mut self, index: usize) -> Result<Option<usize>, SelectionError> {
        self.wrapping.toggle(index)
    }

    pub fn wrapping_index(&self) -> Option<usize> {
        self.wrapping.selected()
    }

    pub fn selected_wrapping<'a>(&self, space: &'a OptionSpace) -> Option<&'a WrappingOption> {
        self.wrapping
            .selected()
            .and_then(|index| space.wrapping().get(index))
    }

    pub fn toggle_variant(&mut self, index: usize) -> Result<Option<usize>, SelectionError> {
        self.variant.toggle(index)
    }

    pub fn choose_variant(&mut self, index: usize) -> Result<(), SelectionError> {
        self.variant.choose(index)
    }

    pub fn variant_index(&self) -> Option<usize> {
        self.variant.selected()
    }

    pub fn select_matrix(
        &mut self,
        axis: MatrixAxis,
        value: &str,
        matrix: &VariantMatrix,
    ) -> Result<(), SelectionError> {
        if !axis.options(matrix).iter().any(|option| option == value) {
            return Err(SelectionError::UnknownOption {
                axis: axis.name(),
                value: value.to_string(),
            });
        }

        *self.matrix.slot(axis) = Some(value.to_string());
        Ok(())
    }

    pub fn matrix(&self) -> &MatrixSelection {
        &self.matrix
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), SelectionError> {
        self.fields.set(name, value)
    }

    pub fn fields(&self) -> &PersonalFields {
        &self.fields
    }
}

fn parse_quantity(text: &str) -> Option<u32> {
    let trimmed = text.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(unsigned.len());

    unsigned[..digits_end]
        .parse::<u32>()
        .ok()
        .filter(|quantity| *quantity >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_payload;
    use crate::options::FormKind;
    use serde_json::json;

    fn order_space() -> OptionSpace {
        let payload = decode_payload(Some(&json!({
            "wrappingOptions": [
                { "variantId": "A", "price": 1, "productName": "Paper" },
                { "variantId": "B", "price": 2, "productName": "Box" }
            ],
            "variantTitles": "Black,Silver",
            "variantIds": "1,2"
        })))
        .payload;
        OptionSpace::build(&payload, FormKind::OrderWithWrapping)
    }

    fn subscription_space() -> OptionSpace {
        let payload = decode_payload(Some(&json!({
            "subscriptionVariants": [
                { "id": "V1", "title": "Red / Vanilla / Weekly", "price": 1 },
                { "id": "V2", "title": "Blue / Mint / Monthly", "price": 2 }
            ]
        })))
        .payload;
        OptionSpace::build(&payload, FormKind::Subscription)
    }

    #[test]
    fn reselecting_a_tile_clears_it() {
        let space = order_space();
        let mut state = SelectionState::for_space(&space);

        assert_eq!(state.toggle_wrapping(0), Ok(Some(0)));
        assert_eq!(state.toggle_wrapping(0), Ok(None));
        assert_eq!(state.selected_wrapping(&space), None);
    }

    #[test]
    fn selecting_another_tile_replaces_the_first() {
        let space = order_space();
        let mut state = SelectionState::for_space(&space);

        state.toggle_wrapping(0).expect("tile A");
        state.toggle_wrapping(1).expect("tile B");

        assert_eq!(state.wrapping_index(), Some(1));
        assert_eq!(
            state.selected_wrapping(&space).map(|w| w.variant_id.as_str()),
            Some("B")
        );
    }

    #[test]
    fn out_of_range_tile_is_rejected_without_change() {
        let space = order_space();
        let mut state = SelectionState::for_space(&space);
        state.toggle_wrapping(1).expect("tile B");

        assert_eq!(
            state.toggle_wrapping(5),
            Err(SelectionError::OutOfRange {
                axis: "wrapping",
                index: 5,
                len: 2
            })
        );
        assert_eq!(state.wrapping_index(), Some(1));
    }

    #[test]
    fn variant_control_defaults_to_first_entry() {
        let space = order_space();
        let mut state = SelectionState::for_space(&space);
        assert_eq!(state.variant_index(), Some(0));

        state.choose_variant(1).expect("second variant");
        state.choose_variant(1).expect("dropdown keeps selection");
        assert_eq!(state.variant_index(), Some(1));

        assert_eq!(state.toggle_variant(1), Ok(None));
    }

    #[test]
    fn quantity_text_parses_like_a_form_field() {
        let space = order_space();
        let mut state = SelectionState::for_space(&space);
        assert_eq!(state.quantity(), 1);

        assert_eq!(state.set_quantity_text(" 3 "), Ok(3));
        assert_eq!(state.set_quantity_text("4 pieces"), Ok(4));
        assert!(state.set_quantity_text("0").is_err());
        assert!(state.set_quantity_text("-2").is_err());
        assert!(state.set_quantity_text("").is_err());
        assert!(state.set_quantity_text("many").is_err());
        assert_eq!(state.quantity(), 4);
    }

    #[test]
    fn stepper_never_goes_below_one() {
        let space = order_space();
        let mut state = SelectionState::for_space(&space);

        assert_eq!(state.decrement_quantity(), 1);
        assert_eq!(state.increment_quantity(), 2);
        assert_eq!(state.decrement_quantity(), 1);
        assert_eq!(state.decrement_quantity(), 1);
    }

    #[test]
    fn matrix_defaults_to_first_options() {
        let space = subscription_space();
        let state = SelectionState::for_space(&space);

        assert_eq!(state.matrix().color.as_deref(), Some("Red"));
        assert_eq!(state.matrix().scent.as_deref(), Some("Vanilla"));
        assert_eq!(state.matrix().delivery.as_deref(), Some("Weekly"));
    }

    #[test]
    fn matrix_selection_only_accepts_offered_values() {
        let space = subscription_space();
        let mut state = SelectionState::for_space(&space);

        state
            .select_matrix(MatrixAxis::Scent, "Mint", space.matrix())
            .expect("offered scent");
        assert_eq!(state.matrix().scent.as_deref(), Some("Mint"));

        assert_eq!(
            state.select_matrix(MatrixAxis::Color, "Green", space.matrix()),
            Err(SelectionError::UnknownOption {
                axis: "color",
                value: "Green".to_string()
            })
        );
        assert_eq!(state.matrix().color.as_deref(), Some("Red"));
    }
}
