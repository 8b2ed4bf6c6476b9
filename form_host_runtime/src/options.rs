use crate::error::{BuildIssue, DataIntegrityError};
use crate::payload::{
    CanonicalPayload, DEFAULT_QUANTITY_LABEL, DEFAULT_SUBMIT_LABEL, WrappingOption,
};
use crate::personal::{self, FieldLabel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const NO_ADDITIONAL_VARIANTS: &str = "No additional variants";
pub const DEFAULT_VARIANT_TITLE: &str = "Default Title";
pub const TITLE_SEPARATOR: &str = " / ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    OrderWithWrapping,
    Subscription,
    PersonalInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantPair {
    pub title: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantChoices {
    pairs: Vec<VariantPair>,
    has_control: bool,
}

impl VariantChoices {
    pub fn pairs(&self) -> &[VariantPair] {
        &self.pairs
    }

    /// Whether the user is shown a variant control at all.
    pub fn has_control(&self) -> bool {
        self.has_control
    }

    /// The pair submitted without interaction when no control is shown.
    pub fn auto_selected(&self) -> Option<&VariantPair> {
        match self.pairs.as_slice() {
            [only] if !self.has_control => Some(only),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixEntry {
    pub id: String,
    pub title: String,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariantMatrix {
    colors: Vec<String>,
    scents: Vec<String>,
    deliveries: Vec<String>,
    #[serde(skip)]
    lookup: HashMap<String, MatrixEntry>,
}

impl VariantMatrix {
    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn scents(&self) -> &[String] {
        &self.scents
    }

    pub fn deliveries(&self) -> &[String] {
        &self.deliveries
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn resolve(&self, color: &str, scent: &str, delivery: &str) -> Option<&MatrixEntry> {
        self.lookup.get(&matrix_key(color, scent, delivery))
    }

    fn insert(
        &mut self,
        [color, scent, delivery]: [&str; 3],
        entry: MatrixEntry,
    ) -> Result<(), MatrixEntry> {
        let key = matrix_key(color, scent, delivery);
        if self.lookup.contains_key(&key) {
            return Err(entry);
        }

        push_unique(&mut self.colors, color);
        push_unique(&mut self.scents, scent);
        push_unique(&mut self.deliveries, delivery);
        self.lookup.insert(key, entry);
        Ok(())
    }
}

pub fn matrix_key(color: &str, scent: &str, delivery: &str) -> String {
    format!("{color}{TITLE_SEPARATOR}{scent}{TITLE_SEPARATOR}{delivery}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormLabels {
    pub quantity: String,
    pub submit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapping_section: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldLabel>,
}

/// Every choice a form presents, derived once from the decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpace {
    kind: FormKind,
    labels: FormLabels,
    wrapping: Vec<WrappingOption>,
    variants: VariantChoices,
    matrix: VariantMatrix,
    issues: Vec<BuildIssue>,
}

impl OptionSpace {
    pub fn build(payload: &CanonicalPayload, kind: FormKind) -> Self {
        let mut issues = Vec::new();
        let labels = build_labels(payload, kind);

        let (wrapping, variants, matrix) = match kind {
            FormKind::OrderWithWrapping => (
                build_wrapping(&payload.wrapping_options),
                build_variant_choices(payload, &mut issues),
                VariantMatrix::default(),
            ),
            FormKind::Subscription => (
                Vec::new(),
                VariantChoices::default(),
                build_matrix(payload, &mut issues),
            ),
            FormKind::PersonalInfo => (
                Vec::new(),
                VariantChoices::default(),
                VariantMatrix::default(),
            ),
        };

        Self {
            kind,
            labels,
            wrapping,
            variants,
            matrix,
            issues,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn labels(&self) -> &FormLabels {
        &self.labels
    }

    /// Empty means no wrapping is offered on this form.
    pub fn wrapping(&self) -> &[WrappingOption] {
        &self.wrapping
    }

    pub fn offers_wrapping(&self) -> bool {
        !self.wrapping.is_empty()
    }

    pub fn variants(&self) -> &VariantChoices {
        &self.variants
    }

    pub fn matrix(&self) -> &VariantMatrix {
        &self.matrix
    }

    pub fn issues(&self) -> &[BuildIssue] {
        &self.issues
    }
}

fn build_labels(payload: &CanonicalPayload, kind: FormKind) -> FormLabels {
    FormLabels {
        quantity: payload
            .quantity_label
            .clone()
            .unwrap_or_else(|| DEFAULT_QUANTITY_LABEL.to_string()),
        submit: payload
            .submit_label
            .clone()
            .unwrap_or_else(|| DEFAULT_SUBMIT_LABEL.to_string()),
        wrapping_section: payload.wrapping_section_label.clone(),
        fields: match kind {
            FormKind::PersonalInfo => personal::field_labels(payload),
            _ => Vec::new(),
        },
    }
}

fn build_wrapping(options: &[WrappingOption]) -> Vec<WrappingOption> {
    let mut seen = Vec::with_capacity(options.len());
    let mut wrapping = Vec::with_capacity(options.len());

    for option in options {
        if seen.contains(&option.variant_id.as_str()) {
            log::debug!("dropping repeated wrapping option {}", option.variant_id);
            continue;
        }
        seen.push(option.variant_id.as_str());
        wrapping.push(option.clone());
    }

    wrapping
}

fn build_variant_choices(payload: &CanonicalPayload, issues: &mut Vec<BuildIssue>) -> VariantChoices {
    let titles = split_list(payload.variant_titles.as_deref());
    let ids = split_list(payload.variant_ids.as_deref());

    // Only a lone title can be a sentinel; `"Default Title,Large"` is a real list.
    let sentinel = matches!(
        titles.as_slice(),
        [only] if only == NO_ADDITIONAL_VARIANTS || only == DEFAULT_VARIANT_TITLE
    );

    if sentinel && ids.is_empty() {
        return VariantChoices::default();
    }

    if titles.len() != ids.len() {
        record(
            issues,
            DataIntegrityError::VariantLengthMismatch {
                titles: titles.len(),
                ids: ids.len(),
                kept: titles.len().min(ids.len()),
            },
        );
    }

    let mut pairs = Vec::with_capacity(titles.len().min(ids.len()));
    for (index, (title, id)) in titles.into_iter().zip(ids).enumerate() {
        let blank = match (title.is_empty(), id.is_empty()) {
            (true, _) => Some(("variantTitles", "blank variant title")),
            (false, true) => Some(("variantIds", "blank variant id")),
            (false, false) => None,
        };
        if let Some((field, message)) = blank {
            record(
                issues,
                DataIntegrityError::InvalidEntry {
                    field,
                    index,
                    message: message.to_string(),
                },
            );
            continue;
        }
        pairs.push(VariantPair { title, id });
    }
    let has_control = pairs.len() > 1;

    VariantChoices { pairs, has_control }
}

fn build_matrix(payload: &CanonicalPayload, issues: &mut Vec<BuildIssue>) -> VariantMatrix {
    let mut matrix = VariantMatrix::default();

    for variant in &payload.subscription_variants {
        let parts: Vec<&str> = variant.title.split(TITLE_SEPARATOR).map(str::trim).collect();

        let issue = match parts.as_slice() {
            [color, scent, delivery] => {
                let entry = MatrixEntry {
                    id: variant.id.clone(),
                    title: variant.title.clone(),
                    price: variant.price.value(),
                };
                match matrix.insert([*color, *scent, *delivery], entry) {
                    Ok(()) => continue,
                    Err(entry) => DataIntegrityError::DuplicateTriple {
                        id: entry.id,
                        key: matrix_key(color, scent, delivery),
                    },
                }
            }
            _ => DataIntegrityError::VariantTitleArity {
                title: variant.title.clone(),
                parts: parts.len(),
            },
        };

        record(issues, issue);
    }

    matrix
}

fn record(issues: &mut Vec<BuildIssue>, issue: DataIntegrityError) {
    let issue = BuildIssue::from(issue);
    log::warn!("{}: {issue}", issue.code());
    issues.push(issue);
}

/// Splits a comma-delimited list and trims each element. A blank source is an
/// empty list.
pub fn split_list(source: Option<&str>) -> Vec<String> {
    match source {
        Some(text) if !text.trim().is_empty() => {
            text.split(',').map(|item| item.trim().to_string()).collect()
        }
        _ => Vec::new(),
    }
}

fn push_unique(set: &mut Vec<String>, value: &str) {
    if !set.iter().any(|existing| existing == value) {
        set.push(value.to_string());
    }
}
