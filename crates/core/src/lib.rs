//! # Summary Core
//!
//! Core business logic for the EHR summarisation service.
//!
//! This crate contains the pure summarisation contract:
//! - Input validation of untrusted request documents ([`validation`])
//! - The deterministic Summarization Engine ([`SummaryEngine`])
//! - Overview narrative generators, template or remote ([`generation`])
//! - Startup configuration and the content-addressed summary cache
//!
//! **No API concerns**: HTTP servers and wire error bodies belong in `api-rest` and `api-shared`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod generation;
pub mod model;
pub mod validation;

pub use cache::{cache_key, CacheKey, SummaryCache};
pub use config::{GeneratorKind, SummaryConfig};
pub use engine::SummaryEngine;
pub use error::{FieldError, FieldErrorKind, SummaryError, SummaryResult, ValidationErrors};
pub use generation::{NarrativeGenerator, NarrativeRequest, RemoteGenerator, RemoteSettings, TemplateGenerator};
pub use model::{
    ActionableItem, Allergy, ClinicalFinding, CustomizationParameters, EhrSnapshot, MedicalProblem,
    Medication, MedicationsAndAllergies, PatientOverview, PendingItem, StructuredSummary,
    SummarizeRequest,
};
pub use validation::{validate, validate_json};

pub use summary_types;
