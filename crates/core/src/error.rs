use serde::Serialize;

/// Kind of field-level validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum FieldErrorKind {
    MissingField,
    TypeMismatch,
    InvalidEnumValue,
}

impl FieldErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldErrorKind::MissingField => "MissingField",
            FieldErrorKind::TypeMismatch => "TypeMismatch",
            FieldErrorKind::InvalidEnumValue => "InvalidEnumValue",
        }
    }
}

impl std::fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rejected field in a summarisation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    /// Dotted path of the offending field, for example `ehr_data.medications`.
    pub field: String,
    pub kind: FieldErrorKind,
    /// The value that was supplied, absent for missing fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub value: Option<serde_json::Value>,
}

impl FieldError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::MissingField,
            value: None,
        }
    }

    pub fn type_mismatch(field: impl Into<String>, value: &serde_json::Value) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::TypeMismatch,
            value: Some(value.clone()),
        }
    }

    pub fn invalid_enum(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::InvalidEnumValue,
            value: Some(serde_json::Value::String(value.into())),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} at {}: {}", self.kind, self.field, value),
            None => write!(f, "{} at {}", self.kind, self.field),
        }
    }
}

/// Every field-level problem found in one request, in a stable order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.0
    }

    /// Finds the first error reported for `field`.
    pub fn find(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("invalid request: {0}")]
    Validation(ValidationErrors),

    /// The narrative backend could not produce output. Safe to retry.
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to serialize summary input: {0}")]
    Serialization(serde_json::Error),
}

impl From<ValidationErrors> for SummaryError {
    fn from(errors: ValidationErrors) -> Self {
        SummaryError::Validation(errors)
    }
}

pub type SummaryResult<T> = std::result::Result<T, SummaryError>;
