//! JSON bodies returned by the summarisation APIs.

use serde::{Deserialize, Serialize};
use summary_core::{FieldError, ValidationErrors};
use utoipa::ToSchema;

pub const INVALID_JSON: &str = "invalid_json";
pub const VALIDATION_FAILED: &str = "validation_failed";
pub const GENERATION_UNAVAILABLE: &str = "generation_unavailable";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// The request body could not be read as JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct InvalidJsonBody {
    pub error: String,
    pub message: String,
}

impl InvalidJsonBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: INVALID_JSON.to_string(),
            message: message.into(),
        }
    }
}

/// Every field-level problem found in a request.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ValidationFailedBody {
    pub error: String,
    pub errors: Vec<FieldError>,
}

impl From<ValidationErrors> for ValidationFailedBody {
    fn from(errors: ValidationErrors) -> Self {
        Self {
            error: VALIDATION_FAILED.to_string(),
            errors: errors.into_errors(),
        }
    }
}

/// The overview could not be generated. `error_id` matches the server log entry holding the
/// detail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct GenerationUnavailableBody {
    pub error: String,
    pub error_id: String,
}

impl GenerationUnavailableBody {
    pub fn new(error_id: impl Into<String>) -> Self {
        Self {
            error: GENERATION_UNAVAILABLE.to_string(),
            error_id: error_id.into(),
        }
    }
}
