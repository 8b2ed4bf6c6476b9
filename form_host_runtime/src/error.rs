use std::io;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Payload(String),
    #[error("payload decoded to {found}, expected an object")]
    PayloadShape { found: &'static str },
    #[error("field `{field}` is not valid JSON: {message}")]
    Field { field: &'static str, message: String },
    #[error("field `{field}` decoded to {found}, expected {expected}")]
    FieldShape {
        field: &'static str,
        found: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataIntegrityError {
    #[error("{field}[{index}] skipped: {message}")]
    InvalidEntry {
        field: &'static str,
        index: usize,
        message: String,
    },
    #[error("{titles} variant title(s) but {ids} variant id(s); kept the first {kept}")]
    VariantLengthMismatch { titles: usize, ids: usize, kept: usize },
    #[error("variant title `{title}` has {parts} component(s), expected 3")]
    VariantTitleArity { title: String, parts: usize },
    #[error("variant `{id}` repeats combination `{key}`")]
    DuplicateTriple { id: String, key: String },
}

/// Recoverable problem found while turning a trace into an option space.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildIssue {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Data(#[from] DataIntegrityError),
}

impl BuildIssue {
    pub fn code(&self) -> &'static str {
        match self {
            BuildIssue::Decode(_) => "decode_error",
            BuildIssue::Data(_) => "data_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("quantity `{0}` is not a whole number of at least 1")]
    InvalidQuantity(String),
    #[error("{axis} index {index} is out of range ({len} option(s))")]
    OutOfRange {
        axis: &'static str,
        index: usize,
        len: usize,
    },
    #[error("`{value}` is not a {axis} option")]
    UnknownOption { axis: &'static str, value: String },
    #[error("unknown field `{0}`")]
    UnknownField(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("no variant matches `{0}`")]
    LookupMiss(String),
    #[error("form was already submitted")]
    AlreadySubmitted,
    #[error("required field `{0}` is empty")]
    MissingField(&'static str),
    #[error("`{value}` is not a {field} option")]
    UnknownOption { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to deliver resume call: {0}")]
    Io(#[from] io::Error),
    #[error("resume call is {len} bytes, limit is {max}")]
    FrameTooLarge { len: usize, max: usize },
}

impl From<HostError> for io::Error {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Io(err) => err,
            err @ HostError::FrameTooLarge { .. } => {
                io::Error::new(io::ErrorKind::InvalidData, err.to_string())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form has not been rendered")]
    NotRendered,
    #[error("form is already rendered")]
    AlreadyRendered,
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Host(#[from] HostError),
}

impl FormError {
    pub fn code(&self) -> &'static str {
        match self {
            FormError::NotRendered | FormError::AlreadyRendered => "invalid_phase",
            FormError::Selection(_) => "invalid_input",
            FormError::Submit(SubmitError::LookupMiss(_)) => "lookup_miss",
            FormError::Submit(SubmitError::AlreadySubmitted) => "already_submitted",
            FormError::Submit(_) => "invalid_input",
            FormError::Host(HostError::FrameTooLarge { .. }) => "payload_too_large",
            FormError::Host(HostError::Io(_)) => "host_unavailable",
        }
    }
}
