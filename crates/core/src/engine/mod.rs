//! Summarization Engine.
//!
//! Turns a validated [`EhrSnapshot`] and [`CustomizationParameters`] into a
//! [`StructuredSummary`]. Every section is produced by a deterministic pipeline:
//!
//! 1. **Extract** facts from the free-text fields.
//! 2. **Assess** problem status and derive actionable items.
//! 3. **Select** what the time frame and urgency level admit.
//! 4. **Order** by criticality, then focus relevance, then record order.
//! 5. **Phrase** each entry for the audience at the requested length.
//!
//! Only the overview paragraph goes through a [`NarrativeGenerator`], and it is written from the
//! facts already selected, so it can never mention something the sections leave out.

mod extract;
mod lexicon;
mod phrasing;
mod recency;
mod rules;

pub(crate) use extract::capitalise;
pub(crate) use phrasing::decapitalise;

use crate::cache::{cache_key, SummaryCache};
use crate::config::{GeneratorKind, SummaryConfig};
use crate::generation::{NarrativeGenerator, NarrativeRequest, RemoteGenerator, TemplateGenerator};
use crate::model::{
    ActionableItem, ClinicalFinding, CustomizationParameters, EhrSnapshot, MedicalProblem,
    MedicationsAndAllergies, PatientOverview, PendingItem, StructuredSummary,
};
use crate::validation::validate;
use crate::SummaryResult;
use extract::{Finding, Problem};
use lexicon::{contains_term, focus_domains, plain_language, DomainSet};
use phrasing::{Change, Phraser, Trend};
use serde_json::Value;
use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::sync::Arc;
use summary_types::{Audience, Priority, ProblemStatus, UrgencyLevel};

/// Entry point for summarisation. Cheap to clone; clones share the generator and cache.
#[derive(Clone)]
pub struct SummaryEngine {
    generator: Arc<dyn NarrativeGenerator>,
    cache: Option<Arc<SummaryCache>>,
}

impl fmt::Debug for SummaryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryEngine")
            .field("generator", &self.generator.id())
            .field("cache", &self.cache)
            .finish()
    }
}

impl Default for SummaryEngine {
    fn default() -> Self {
        Self::new(Arc::new(TemplateGenerator))
    }
}

impl SummaryEngine {
    /// Creates an engine without a cache.
    pub fn new(generator: Arc<dyn NarrativeGenerator>) -> Self {
        Self {
            generator,
            cache: None,
        }
    }

    /// Attaches a summary cache. A zero-capacity cache is not attached.
    pub fn with_cache(mut self, cache: Arc<SummaryCache>) -> Self {
        self.cache = (cache.capacity() > 0).then_some(cache);
        self
    }

    /// Builds the engine described by startup configuration.
    pub fn from_config(config: &SummaryConfig) -> SummaryResult<Self> {
        let generator: Arc<dyn NarrativeGenerator> = match config.generator() {
            GeneratorKind::Template => Arc::new(TemplateGenerator),
            GeneratorKind::Remote(settings) => Arc::new(RemoteGenerator::new(settings.clone())?),
        };
        Ok(Self::new(generator).with_cache(Arc::new(SummaryCache::new(config.cache_capacity()))))
    }

    pub fn generator_id(&self) -> &str {
        self.generator.id()
    }

    /// Summarises a validated snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::GenerationUnavailable`](crate::SummaryError::GenerationUnavailable)
    /// when the narrative generator fails. Nothing is cached in that case.
    pub async fn summarize(
        &self,
        snapshot: &EhrSnapshot,
        params: &CustomizationParameters,
    ) -> SummaryResult<StructuredSummary> {
        let key = cache_key(snapshot, params, self.generator.id())?;
        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            tracing::debug!(key = key.as_str(), "summary cache hit");
            return Ok(hit);
        }

        let (mut summary, mut narrative) = compose(snapshot, params);
        narrative.seed = key.seed();
        summary.patient_overview.summary = self.generator.overview(&narrative).await?;

        if let Some(cache) = &self.cache {
            cache.insert(key, summary.clone());
        }
        Ok(summary)
    }

    /// Validates an untrusted request body and summarises it.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::Validation`](crate::SummaryError::Validation) listing every field
    /// problem, or any error of [`Self::summarize`].
    pub async fn summarize_raw(&self, raw: &Value) -> SummaryResult<StructuredSummary> {
        let (snapshot, params) = validate(raw)?;
        self.summarize(&snapshot, &params).await
    }
}

/// Builds every section except the overview text, plus the facts the overview is written from.
pub(crate) fn compose(
    snapshot: &EhrSnapshot,
    params: &CustomizationParameters,
) -> (StructuredSummary, NarrativeRequest) {
    let mut facts = extract::extract(snapshot);
    rules::assess_problems(&mut facts);
    let actions = rules::derive_actions(&facts, params.time_frame);

    let focus = focus_domains(params.focus_area);
    let critical_only = params.urgency_level == UrgencyLevel::CriticalOnly;
    let window = params.time_frame;
    let phraser = Phraser {
        audience: params.audience,
        length: params.length,
        focus,
    };
    let relevant = |domains: DomainSet| domains.intersects(focus);

    // Problems are never time-filtered.
    let mut problems: Vec<&Problem> = facts
        .problems
        .iter()
        .filter(|p| !critical_only || p.critical || p.status.needs_attention())
        .collect();
    problems.sort_by_key(|p| (Reverse(p.critical), Reverse(relevant(p.domains)), p.order));

    let in_window: Vec<&Finding> = facts
        .findings
        .iter()
        .filter(|f| window.admits(f.age_days))
        .collect();
    let mut findings: Vec<&Finding> = in_window
        .iter()
        .copied()
        .filter(|f| !critical_only || f.is_critical())
        .collect();
    findings.sort_by_key(|f| (Reverse(f.is_critical()), Reverse(relevant(f.domains)), f.order));

    let mut pending: Vec<_> = facts
        .pending
        .iter()
        .filter(|p| !critical_only || p.urgent)
        .collect();
    pending.sort_by_key(|p| (Reverse(p.urgent), Reverse(relevant(p.domains)), p.order));

    let mut actions: Vec<_> = actions
        .iter()
        .filter(|a| !critical_only || a.priority == Priority::Urgent)
        .collect();
    actions.sort_by_key(|a| (Reverse(a.priority.rank()), Reverse(relevant(a.domains)), a.order));

    let medications = facts
        .medications
        .iter()
        .map(|medication| {
            let indication = facts.problems.iter().find(|p| {
                p.condition.is_some_and(|c| {
                    c.treated_by.iter().any(|t| contains_term(&medication.lower, t))
                })
            });
            phraser.medication(medication, indication)
        })
        .collect();

    let summary = StructuredSummary {
        patient_overview: PatientOverview::default(),
        active_medical_problems: problems
            .iter()
            .map(|p| MedicalProblem {
                problem: phraser.problem(p),
                status: p.status,
            })
            .collect(),
        current_medications_and_allergies: MedicationsAndAllergies {
            medications,
            allergies: facts.allergies.iter().map(|a| phraser.allergy(a)).collect(),
        },
        recent_clinical_findings: findings
            .iter()
            .map(|f| {
                let trend = trend(&facts.findings, f, |p| window.admits(p.age_days));
                let related = same_kind_count(&in_window, f);
                ClinicalFinding {
                    finding: phraser.finding(f, trend.as_ref(), related),
                }
            })
            .collect(),
        actionable_items: actions
            .iter()
            .map(|a| ActionableItem {
                item: phraser.action(a),
                priority: a.priority,
            })
            .collect(),
        pending_items: pending
            .iter()
            .map(|p| PendingItem {
                item: phraser.pending(p),
            })
            .collect(),
    };

    let complaint_text = |text: &str| match params.audience {
        Audience::Patient => plain_language(text),
        _ => text.to_string(),
    };
    let narrative = NarrativeRequest {
        audience: params.audience,
        length: params.length,
        demographics: facts.demographics.clone(),
        chief_complaint: facts.complaint.as_ref().map(|c| complaint_text(&c.text)),
        routine_visit: facts.complaint.as_ref().is_some_and(|c| c.routine),
        problems: problems.iter().map(|p| phraser.problem_name(p)).collect(),
        worsening: problems
            .iter()
            .filter(|p| p.status == ProblemStatus::Worsening)
            .map(|p| phraser.problem_name(p))
            .collect(),
        medication_count: facts.medications.len(),
        allergies: facts.allergies.iter().map(|a| a.name.clone()).collect(),
        no_known_allergies: facts.no_known_allergies,
        critical_findings: findings.iter().filter(|f| f.is_critical()).count(),
        findings: findings.len(),
        pending: pending.len(),
        actions: actions.len(),
        urgent_actions: actions.iter().filter(|a| a.priority == Priority::Urgent).count(),
        seed: 0,
    };

    (summary, narrative)
}

/// Change against the previous reading of the same kind inside the window.
fn trend(all: &[Finding], finding: &Finding, admit: impl Fn(&Finding) -> bool) -> Option<Trend> {
    let current = finding.measurement.as_ref()?;
    let previous_finding = rules::previous_reading(all, finding, admit)?;
    let previous = previous_finding.measurement.as_ref()?;

    let now = (current.value, current.secondary.unwrap_or_default());
    let before = (previous.value, previous.secondary.unwrap_or_default());
    let change = match now.partial_cmp(&before) {
        Some(Ordering::Greater) => Change::Up,
        Some(Ordering::Less) => Change::Down,
        _ => Change::Same,
    };
    Some(Trend {
        previous: previous.display.clone(),
        previous_when: previous_finding.when.clone(),
        change,
    })
}

fn same_kind_count(in_window: &[&Finding], finding: &Finding) -> usize {
    let Some(kind) = finding.measurement.as_ref().map(|m| m.kind) else {
        return 1;
    };
    in_window
        .iter()
        .filter(|f| f.measurement.as_ref().is_some_and(|m| m.kind == kind))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SummaryError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use summary_types::{FocusArea, SummaryLength, TimeFrame};

    fn routine_record() -> EhrSnapshot {
        EhrSnapshot {
            demographics: "65-year-old male".into(),
            chief_complaint: "Routine follow-up".into(),
            past_medical_history: "Hypertension, Type 2 Diabetes".into(),
            medications: vec!["Lisinopril 10mg daily".into(), "Metformin 500mg twice daily".into()],
            allergies: vec!["Penicillin: Hives".into()],
            vital_signs: "BP 130/80, HR 72".into(),
            lab_results: vec!["HbA1c 7.2% (3 months ago)".into()],
            imaging_reports: vec![],
        }
    }

    fn acute_record() -> EhrSnapshot {
        EhrSnapshot {
            demographics: "58-year-old female".into(),
            chief_complaint: "Chest pain and shortness of breath".into(),
            past_medical_history: "Hypertension, Type 2 Diabetes, Asthma - well controlled".into(),
            medications: vec!["Lisinopril 20mg daily".into(), "Metformin 1000mg twice daily".into()],
            allergies: vec!["Sulfa: rash".into()],
            vital_signs: "BP 185/110, HR 88".into(),
            lab_results: vec![
                "HbA1c 8.1% (2 weeks ago)".into(),
                "Glucose 250 (today)".into(),
                "Troponin pending".into(),
            ],
            imaging_reports: vec!["Chest X-ray: no acute findings (today)".into()],
        }
    }

    fn params(
        length: SummaryLength,
        time_frame: TimeFrame,
        audience: Audience,
    ) -> CustomizationParameters {
        CustomizationParameters {
            length,
            time_frame,
            audience,
            ..CustomizationParameters::default()
        }
    }

    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NarrativeGenerator for CountingGenerator {
        fn id(&self) -> &str {
            "counting"
        }

        async fn overview(&self, _request: &NarrativeRequest) -> SummaryResult<String> {
            let call = self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(format!("call {call}"))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl NarrativeGenerator for FailingGenerator {
        fn id(&self) -> &str {
            "failing"
        }

        async fn overview(&self, _request: &NarrativeRequest) -> SummaryResult<String> {
            Err(SummaryError::GenerationUnavailable("backend down".into()))
        }
    }

    #[tokio::test]
    async fn test_summarize_routine_record() {
        let engine = SummaryEngine::default();
        let summary = engine
            .summarize(&routine_record(), &CustomizationParameters::default())
            .await
            .expect("summary");

        assert!(!summary.patient_overview.summary.is_empty());
        let problems: Vec<_> = summary
            .active_medical_problems
            .iter()
            .map(|p| p.problem.as_str())
            .collect();
        assert_eq!(problems, vec!["Hypertension", "Type 2 Diabetes"]);

        let meds = &summary.current_medications_and_allergies;
        let names: Vec<_> = meds.medications.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Lisinopril", "Metformin"]);
        assert_eq!(meds.allergies.len(), 1);
        assert_eq!(meds.allergies[0].name, "Penicillin");
        assert_eq!(meds.allergies[0].reaction, "Hives");

        // The A1c is three months old, outside the default 30-day window.
        assert!(summary
            .recent_clinical_findings
            .iter()
            .all(|f| !f.finding.contains("HbA1c")));
        assert!(summary.pending_items.is_empty());
    }

    #[tokio::test]
    async fn test_summarize_is_deterministic() {
        let engine = SummaryEngine::default();
        let params = params(SummaryLength::Comprehensive, TimeFrame::CompleteHistory, Audience::Nurse);
        let first = engine.summarize(&acute_record(), &params).await.expect("first");
        let second = engine.summarize(&acute_record(), &params).await.expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn test_critical_only_keeps_urgent_content() {
        let params = CustomizationParameters {
            urgency_level: UrgencyLevel::CriticalOnly,
            time_frame: TimeFrame::CompleteHistory,
            ..CustomizationParameters::default()
        };
        let (summary, narrative) = compose(&acute_record(), &params);

        assert!(!summary.active_medical_problems.is_empty());
        assert!(summary
            .active_medical_problems
            .iter()
            .all(|p| p.status.needs_attention()));
        assert!(!summary.actionable_items.is_empty());
        assert!(summary
            .actionable_items
            .iter()
            .all(|a| a.priority == Priority::Urgent));
        assert!(summary
            .recent_clinical_findings
            .iter()
            .any(|f| f.finding.contains("185/110")));
        assert!(summary
            .recent_clinical_findings
            .iter()
            .all(|f| !f.finding.contains("HbA1c")));
        // Medications and allergies are never filtered.
        assert_eq!(summary.current_medications_and_allergies.medications.len(), 2);
        assert_eq!(summary.current_medications_and_allergies.allergies.len(), 1);
        assert_eq!(narrative.urgent_actions, narrative.actions);
    }

    #[test]
    fn test_wider_time_frames_include_narrower_findings() {
        let record = EhrSnapshot {
            lab_results: vec![
                "Glucose 250 (today)".into(),
                "LDL 160 (2 weeks ago)".into(),
                "HbA1c 8.1% (3 months ago)".into(),
                "TSH 2.1 (2 years ago)".into(),
            ],
            ..EhrSnapshot::default()
        };
        let frames = [
            TimeFrame::LastEncounter,
            TimeFrame::Last30Days,
            TimeFrame::Last6Months,
            TimeFrame::CompleteHistory,
        ];
        let lists: Vec<Vec<String>> = frames
            .iter()
            .map(|frame| {
                let (summary, _) =
                    compose(&record, &params(SummaryLength::Standard, *frame, Audience::Physician));
                summary
                    .recent_clinical_findings
                    .into_iter()
                    .map(|f| f.finding)
                    .collect()
            })
            .collect();

        assert_eq!(lists.iter().map(Vec::len).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        for pair in lists.windows(2) {
            assert!(pair[0].iter().all(|f| pair[1].contains(f)));
        }
    }

    #[test]
    fn test_problems_survive_every_time_frame() {
        let (summary, _) = compose(
            &routine_record(),
            &params(SummaryLength::Standard, TimeFrame::LastEncounter, Audience::Physician),
        );
        assert_eq!(summary.active_medical_problems.len(), 2);
    }

    #[test]
    fn test_focus_area_moves_relevant_findings_first() {
        let record = EhrSnapshot {
            lab_results: vec!["HbA1c 7.5% (today)".into()],
            imaging_reports: vec!["Echocardiogram: mild LVH (today)".into()],
            ..EhrSnapshot::default()
        };
        let general = CustomizationParameters::default();
        let (summary, _) = compose(&record, &general);
        assert!(summary.recent_clinical_findings[0].finding.starts_with("HbA1c"));

        let cardiology = CustomizationParameters {
            focus_area: FocusArea::Cardiology,
            ..general
        };
        let (focused, _) = compose(&record, &cardiology);
        assert_eq!(focused.recent_clinical_findings.len(), 2);
        assert!(focused.recent_clinical_findings[0]
            .finding
            .starts_with("Echocardiogram"));
    }

    #[test]
    fn test_audience_changes_wording_not_selection() {
        let counts = |audience: Audience| {
            let (s, _) = compose(
                &acute_record(),
                &params(SummaryLength::Standard, TimeFrame::CompleteHistory, audience),
            );
            (
                s.active_medical_problems.len(),
                s.current_medications_and_allergies.medications.len(),
                s.current_medications_and_allergies.allergies.len(),
                s.recent_clinical_findings.len(),
                s.actionable_items.len(),
                s.pending_items.len(),
            )
        };
        let physician = counts(Audience::Physician);
        for audience in Audience::ALL {
            assert_eq!(counts(*audience), physician, "{audience}");
        }
    }

    #[test]
    fn test_focus_area_keeps_safety_facts() {
        let record = EhrSnapshot {
            past_medical_history: "Hypertension, Breast cancer in remission".into(),
            allergies: vec!["Penicillin: anaphylaxis".into()],
            vital_signs: "BP 190/125".into(),
            lab_results: vec!["CA 15-3 elevated (today)".into()],
            ..EhrSnapshot::default()
        };
        let selection = |focus_area: FocusArea| {
            let params = CustomizationParameters {
                focus_area,
                ..CustomizationParameters::default()
            };
            compose(&record, &params).0
        };
        let problems = |s: &StructuredSummary| {
            let mut names: Vec<String> =
                s.active_medical_problems.iter().map(|p| p.problem.clone()).collect();
            names.sort();
            names
        };

        let general = selection(FocusArea::General);
        assert_eq!(general.current_medications_and_allergies.allergies.len(), 1);
        for focus in FocusArea::ALL {
            let focused = selection(*focus);
            assert_eq!(
                focused.current_medications_and_allergies.allergies.len(),
                general.current_medications_and_allergies.allergies.len(),
                "{focus}"
            );
            assert_eq!(problems(&focused), problems(&general), "{focus}");
            assert_eq!(
                focused.recent_clinical_findings.len(),
                general.recent_clinical_findings.len(),
                "{focus}"
            );
        }

        let oncology = selection(FocusArea::Oncology);
        assert!(oncology.recent_clinical_findings[0].finding.contains("190/125"));
    }

    #[test]
    fn test_longer_lengths_only_append() {
        let compose_at = |length| {
            compose(
                &acute_record(),
                &params(length, TimeFrame::CompleteHistory, Audience::Physician),
            )
            .0
        };
        let brief = compose_at(SummaryLength::Brief);
        let standard = compose_at(SummaryLength::Standard);
        let comprehensive = compose_at(SummaryLength::Comprehensive);

        for (short, long) in [(&brief, &standard), (&standard, &comprehensive)] {
            assert_eq!(short.recent_clinical_findings.len(), long.recent_clinical_findings.len());
            for (a, b) in short
                .recent_clinical_findings
                .iter()
                .zip(&long.recent_clinical_findings)
            {
                assert!(b.finding.starts_with(&a.finding), "{} / {}", a.finding, b.finding);
            }
            for (a, b) in short.active_medical_problems.iter().zip(&long.active_medical_problems) {
                assert!(b.problem.starts_with(&a.problem));
            }
            for (a, b) in short.actionable_items.iter().zip(&long.actionable_items) {
                assert!(b.item.starts_with(&a.item));
            }
        }
    }

    #[tokio::test]
    async fn test_empty_record_has_every_section() {
        let summary = SummaryEngine::default()
            .summarize(&EhrSnapshot::default(), &CustomizationParameters::default())
            .await
            .expect("summary");

        assert!(!summary.patient_overview.summary.is_empty());
        assert!(summary.active_medical_problems.is_empty());
        assert!(summary.current_medications_and_allergies.medications.is_empty());
        assert!(summary.recent_clinical_findings.is_empty());
        assert!(summary.pending_items.is_empty());
    }

    #[tokio::test]
    async fn test_cache_returns_stored_summary() {
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
        });
        let engine =
            SummaryEngine::new(generator.clone()).with_cache(Arc::new(SummaryCache::new(8)));
        let params = CustomizationParameters::default();

        let first = engine.summarize(&routine_record(), &params).await.expect("first");
        let second = engine.summarize(&routine_record(), &params).await.expect("second");

        assert_eq!(first, second);
        assert_eq!(generator.calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generator_failure_is_reported_and_not_cached() {
        let cache = Arc::new(SummaryCache::new(8));
        let engine = SummaryEngine::new(Arc::new(FailingGenerator)).with_cache(cache.clone());

        let err = engine
            .summarize(&routine_record(), &CustomizationParameters::default())
            .await
            .expect_err("generation fails");
        assert!(matches!(err, SummaryError::GenerationUnavailable(_)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_summarize_raw_reports_validation_errors() {
        let err = SummaryEngine::default()
            .summarize_raw(&json!({ "ehr_data": { "demographics": 5 } }))
            .await
            .expect_err("invalid");
        let SummaryError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.find("ehr_data.demographics").is_some());
        assert!(errors.find("ehr_data.chief_complaint").is_some());
    }

    #[test]
    fn test_zero_capacity_cache_is_not_attached() {
        let engine = SummaryEngine::default().with_cache(Arc::new(SummaryCache::new(0)));
        assert!(engine.cache.is_none());
        assert_eq!(engine.generator_id(), "template");
    }
}
