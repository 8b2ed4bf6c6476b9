use crate::decode::decode_payload;
use crate::error::{BuildIssue, FormError, SubmitError};
use crate::host::{Host, HostAction};
use crate::options::{FormKind, FormLabels, OptionSpace, VariantPair};
use crate::payload::{CanonicalPayload, WrappingOption};
use crate::selection::{MatrixAxis, MatrixSelection, SelectionState};
use crate::submit::{DeclinedWrapping, OutboundPayload, assemble};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    Unrendered,
    Rendered,
    Interacting,
    Submitted,
}

/// User interaction forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormEvent {
    SetQuantity { text: String },
    IncrementQuantity,
    DecrementQuantity,
    ToggleWrapping { index: usize },
    ToggleVariant { index: usize },
    ChooseVariant { index: usize },
    SelectColor { value: String },
    SelectScent { value: String },
    SelectDelivery { value: String },
    SetField { name: String, value: String },
    Submit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    pub quantity: u32,
    pub wrapping: Option<usize>,
    pub variant: Option<usize>,
    pub matrix: MatrixSelection,
}

/// What the presentation layer needs to draw a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub form: FormKind,
    pub labels: FormLabels,
    pub wrapping: Vec<WrappingOption>,
    pub variants: Vec<VariantPair>,
    pub variant_control: bool,
    pub colors: Vec<String>,
    pub scents: Vec<String>,
    pub deliveries: Vec<String>,
    pub selection: SelectionView,
    pub issues: Vec<String>,
}

#[derive(Debug)]
pub struct FormSession {
    kind: FormKind,
    policy: DeclinedWrapping,
    phase: FormPhase,
    space: OptionSpace,
    selection: SelectionState,
    issues: Vec<BuildIssue>,
}

impl FormSession {
    pub fn new(kind: FormKind, policy: DeclinedWrapping) -> Self {
        let space = OptionSpace::build(&CanonicalPayload::default(), kind);
        let selection = SelectionState::for_space(&space);

        Self {
            kind,
            policy,
            phase: FormPhase::Unrendered,
            space,
            selection,
            issues: Vec::new(),
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn space(&self) -> &OptionSpace {
        &self.space
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Decode and build problems from rendering, in the order found.
    pub fn issues(&self) -> &[BuildIssue] {
        &self.issues
    }

    pub fn render(&mut self, payload: Option<&Value>) -> Result<FormView, FormError> {
        if self.phase != FormPhase::Unrendered {
            return Err(FormError::AlreadyRendered);
        }

        let decoded = decode_payload(payload);
        self.space = OptionSpace::build(&decoded.payload, self.kind);
        self.selection = SelectionState::for_space(&self.space);
        self.issues = decoded.errors;
        self.issues.extend(self.space.issues().iter().cloned());
        self.phase = FormPhase::Rendered;

        log::info!(
            "rendered {:?} form: {} wrapping option(s), {} variant(s), {} matrix variant(s), {} issue(s)",
            self.kind,
            self.space.wrapping().len(),
            self.space.variants().pairs().len(),
            self.space.matrix().len(),
            self.issues.len()
        );

        Ok(self.view())
    }

    pub fn view(&self) -> FormView {
        let matrix = self.space.matrix();

        FormView {
            form: self.kind,
            labels: self.space.labels().clone(),
            wrapping: self.space.wrapping().to_vec(),
            variants: self.space.variants().pairs().to_vec(),
            variant_control: self.space.variants().has_control(),
            colors: matrix.colors().to_vec(),
            scents: matrix.scents().to_vec(),
            deliveries: matrix.deliveries().to_vec(),
            selection: SelectionView {
                quantity: self.selection.quantity(),
                wrapping: self.selection.wrapping_index(),
                variant: self.selection.variant_index(),
                matrix: self.selection.matrix().clone(),
            },
            issues: self.issues.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn handle<H: Host>(&mut self, event: FormEvent, host: &mut H) -> Result<(), FormError> {
        match self.phase {
            FormPhase::Unrendered => return Err(FormError::NotRendered),
            FormPhase::Submitted => return Err(SubmitError::AlreadySubmitted.into()),
            FormPhase::Rendered | FormPhase::Interacting => {}
        }

        if event == FormEvent::Submit {
            return self.submit(host).map(|_| ());
        }

        self.apply(event)?;
        self.phase = FormPhase::Interacting;
        Ok(())
    }

    fn apply(&mut self, event: FormEvent) -> Result<(), FormError> {
        let state = &mut self.selection;
        let matrix = self.space.matrix();

        match event {
            FormEvent::SetQuantity { text } => {
                state.set_quantity_text(&text)?;
            }
            FormEvent::IncrementQuantity => {
                state.increment_quantity();
            }
            FormEvent::DecrementQuantity => {
                state.decrement_quantity();
            }
            FormEvent::ToggleWrapping { index } => {
                state.toggle_wrapping(index)?;
            }
            FormEvent::ToggleVariant { index } => {
                state.toggle_variant(index)?;
            }
            FormEvent::ChooseVariant { index } => state.choose_variant(index)?,
            FormEvent::SelectColor { value } => state.select_matrix(MatrixAxis::Color, &value, matrix)?,
            FormEvent::SelectScent { value } => state.select_matrix(MatrixAxis::Scent, &value, matrix)?,
            FormEvent::SelectDelivery { value } => {
                state.select_matrix(MatrixAxis::Delivery, &value, matrix)?
            }
            FormEvent::SetField { name, value } => state.set_field(&name, &value)?,
            FormEvent::Submit => {}
        }

        Ok(())
    }

    /// Assembles the payload and resumes the host. On any error nothing is
    /// sent and the form stays open.
    pub fn submit<H: Host>(&mut self, host: &mut H) -> Result<OutboundPayload, FormError> {
        match self.phase {
            FormPhase::Unrendered => return Err(FormError::NotRendered),
            FormPhase::Submitted => return Err(SubmitError::AlreadySubmitted.into()),
            FormPhase::Rendered | FormPhase::Interacting => {}
        }

        let payload = match assemble(&self.space, &self.selection, self.policy) {
            Ok(payload) => payload,
            Err(err) => {
                log::error!("{:?} submission aborted: {err}", self.kind);
                return Err(err.into());
            }
        };

        log::info!("submitting {:?} form", self.kind);
        log::debug!("submission payload: {payload:?}");

        host.resume(HostAction::Complete {
            payload: payload.clone(),
        })?;
        self.phase = FormPhase::Submitted;
        Ok(payload)
    }
}
