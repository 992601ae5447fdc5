//! Shared value types for the EHR summary service.
//!
//! Every customization knob and every categorical field of the structured summary is a closed
//! enumeration. Values are matched exactly against their wire text; there is no case folding and
//! no fallback variant, so an unsupported value can only surface as an [`EnumParseError`].

#[macro_use]
mod closed_enum;
mod clinical;
mod customization;
mod text;

pub use clinical::{Priority, ProblemStatus};
pub use customization::{Audience, FocusArea, SummaryLength, TimeFrame, UrgencyLevel};
pub use text::{NonEmptyText, TextError};

/// Error returned when text does not name a variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported value {value:?} for {field} (expected one of: {})", .allowed.join(", "))]
pub struct EnumParseError {
    /// Wire name of the field being parsed, for example `time_frame`.
    pub field: &'static str,
    /// The rejected input, verbatim.
    pub value: String,
    /// Every accepted value for the field.
    pub allowed: &'static [&'static str],
}
