//! Extraction: free-text snapshot fields into typed facts.

use super::lexicon::{
    classify, contains_term, find_term, match_condition, mentions_unnegated, Condition,
    DomainSet, MeasureKind, ABNORMAL_TERMS, CONTROLLED_TERMS, CRITICAL_TERMS, PENDING_TERMS,
    RED_FLAG_TERMS, RESOLVED_TERMS, ROUTINE_VISIT_TERMS, STABLE_TERMS, URGENT_ORDER_TERMS,
    WORSENING_TERMS,
};
use super::recency::{find_mention, strip_mention, RecencyAnchor};
use crate::model::EhrSnapshot;
use regex::Regex;
use std::sync::LazyLock;
use summary_types::{NonEmptyText, ProblemStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Severity {
    Normal,
    Abnormal,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Source {
    Vitals,
    Lab,
    Imaging,
}

/// Reading of a result, worded for clinicians and for patients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Interpretation {
    pub clinical: &'static str,
    pub plain: &'static str,
}

const fn interp(clinical: &'static str, plain: &'static str) -> Interpretation {
    Interpretation { clinical, plain }
}

const TEXT_ABNORMAL: Interpretation = interp("abnormal", "needs follow-up");
const TEXT_CRITICAL: Interpretation = interp("critical", "needs urgent attention");

/// A numeric reading found in a vital-sign or lab entry.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Measurement {
    pub kind: MeasureKind,
    pub value: f64,
    /// Diastolic pressure for blood pressure readings.
    pub secondary: Option<f64>,
    /// Reading as written, with its unit.
    pub display: String,
    pub severity: Severity,
    pub interpretation: Interpretation,
}

impl Measurement {
    /// Distance of the reading outside its reference band; 0 inside it.
    pub(crate) fn deviation(&self) -> f64 {
        let outside = |v: f64, low: f64, high: f64| (low - v).max(0.0) + (v - high).max(0.0);
        let v = self.value;
        match self.kind {
            MeasureKind::BloodPressure => {
                outside(v, 90.0, 139.0) + outside(self.secondary.unwrap_or(0.0), 0.0, 89.0)
            }
            MeasureKind::HeartRate => outside(v, 60.0, 100.0),
            MeasureKind::OxygenSaturation => outside(v, 94.0, 100.0),
            MeasureKind::Temperature => outside(fahrenheit(v), 0.0, 100.3),
            MeasureKind::HbA1c => outside(v, 0.0, 6.9),
            MeasureKind::Glucose => outside(v, 70.0, 179.0),
            MeasureKind::Potassium => outside(v, 3.5, 5.0),
        }
    }
}

/// Temperatures below 50 are taken to be Celsius.
fn fahrenheit(v: f64) -> f64 {
    if v < 50.0 { v * 9.0 / 5.0 + 32.0 } else { v }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Finding {
    pub order: usize,
    pub source: Source,
    /// Entry text with its timing phrase removed.
    pub text: String,
    pub when: Option<String>,
    pub age_days: u32,
    pub domains: DomainSet,
    pub severity: Severity,
    pub measurement: Option<Measurement>,
}

impl Finding {
    pub(crate) fn interpretation(&self) -> Option<Interpretation> {
        match (&self.measurement, self.severity) {
            (Some(m), severity) if m.severity == severity => Some(m.interpretation),
            (_, Severity::Critical) => Some(TEXT_CRITICAL),
            (_, Severity::Abnormal) => Some(TEXT_ABNORMAL),
            (_, Severity::Normal) => None,
        }
    }

    pub(crate) fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// Outstanding lab or imaging work.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PendingOrder {
    pub order: usize,
    pub source: Source,
    pub label: String,
    pub when: Option<String>,
    pub urgent: bool,
    pub domains: DomainSet,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MedicationFact {
    pub order: usize,
    pub name: String,
    pub details: String,
    pub lower: String,
    pub domains: DomainSet,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AllergyFact {
    pub order: usize,
    pub name: String,
    pub reaction: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ProblemOrigin {
    History,
    Complaint,
}

pub(crate) struct Problem {
    pub order: usize,
    pub name: String,
    pub condition: Option<&'static Condition>,
    /// Lowercased wording the problem was read from, used for status keywords.
    pub evidence: String,
    pub domains: DomainSet,
    pub origin: ProblemOrigin,
    pub red_flag: bool,
    pub status: ProblemStatus,
    pub critical: bool,
    pub treated_with: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Complaint {
    pub text: String,
    pub routine: bool,
    pub red_flag: bool,
    pub domains: DomainSet,
}

/// Everything the engine reads out of one snapshot.
pub(crate) struct Facts {
    pub demographics: String,
    pub complaint: Option<Complaint>,
    pub problems: Vec<Problem>,
    pub medications: Vec<MedicationFact>,
    pub allergies: Vec<AllergyFact>,
    pub no_known_allergies: bool,
    pub findings: Vec<Finding>,
    pub pending: Vec<PendingOrder>,
}

pub(crate) fn extract(snapshot: &EhrSnapshot) -> Facts {
    let anchor = RecencyAnchor::from_texts(snapshot_texts(snapshot));

    let medications = snapshot
        .medications
        .iter()
        .filter_map(|entry| parse_medication(entry))
        .enumerate()
        .map(|(order, (name, details, lower))| MedicationFact {
            order,
            domains: classify(&lower),
            name,
            details,
            lower,
        })
        .collect();

    let mut no_known_allergies = false;
    let mut allergies = Vec::new();
    for entry in &snapshot.allergies {
        match parse_allergy(entry) {
            AllergyEntry::NoneKnown => no_known_allergies = true,
            AllergyEntry::Skip => {}
            AllergyEntry::Allergy(name, reaction) => allergies.push(AllergyFact {
                order: allergies.len(),
                name,
                reaction,
            }),
        }
    }

    let mut findings = Vec::new();
    let mut pending = Vec::new();
    read_vitals(&snapshot.vital_signs, &anchor, &mut findings);
    for entry in &snapshot.lab_results {
        read_result(entry, Source::Lab, &anchor, &mut findings, &mut pending);
    }
    for entry in &snapshot.imaging_reports {
        read_result(entry, Source::Imaging, &anchor, &mut findings, &mut pending);
    }

    let complaint = read_complaint(&snapshot.chief_complaint);
    let mut problems = read_history(&snapshot.past_medical_history);
    if let Some(complaint) = &complaint {
        add_complaint_problem(complaint, &mut problems);
    }

    Facts {
        demographics: collapse(&snapshot.demographics),
        complaint,
        problems,
        medications,
        allergies,
        no_known_allergies,
        findings,
        pending,
    }
}

fn snapshot_texts(snapshot: &EhrSnapshot) -> impl Iterator<Item = &str> {
    [
        snapshot.demographics.as_str(),
        snapshot.chief_complaint.as_str(),
        snapshot.past_medical_history.as_str(),
        snapshot.vital_signs.as_str(),
    ]
    .into_iter()
    .chain(snapshot.medications.iter().map(String::as_str))
    .chain(snapshot.allergies.iter().map(String::as_str))
    .chain(snapshot.lab_results.iter().map(String::as_str))
    .chain(snapshot.imaging_reports.iter().map(String::as_str))
}

// ============================================================================
// Medications and allergies
// ============================================================================

/// Splits a medication entry into name and details. Returns `None` for blank entries.
fn parse_medication(entry: &str) -> Option<(String, String, String)> {
    let entry = NonEmptyText::new(entry).ok()?.into_string();
    let lower = entry.to_lowercase();

    if let Some((name, details)) = split_once_any(&entry, &[":", " - "]) {
        return Some((name, details, lower));
    }

    let tokens: Vec<&str> = entry.split(' ').collect();
    let split = tokens
        .iter()
        .position(|t| t.starts_with(|c: char| c.is_ascii_digit()))
        .filter(|i| *i > 0)
        .unwrap_or(tokens.len());
    let name = tokens[..split].join(" ");
    let details = tokens[split..].join(" ");
    Some((name, details, lower))
}

enum AllergyEntry {
    Allergy(String, String),
    NoneKnown,
    Skip,
}

const NO_KNOWN_ALLERGIES: &[&str] = &[
    "nkda", "nka", "none", "none known", "no known allergies", "no known drug allergies",
    "no allergies",
];

fn parse_allergy(entry: &str) -> AllergyEntry {
    let entry = collapse(entry);
    let lower = entry.to_lowercase();
    let bare = lower.trim_end_matches('.');
    if bare.is_empty() {
        return AllergyEntry::Skip;
    }
    if NO_KNOWN_ALLERGIES.contains(&bare) || bare.starts_with("no known") {
        return AllergyEntry::NoneKnown;
    }

    if let (Some(open), true) = (entry.find('('), entry.ends_with(')')) {
        let name = entry[..open].trim();
        let reaction = entry[open + 1..entry.len() - 1].trim();
        if !name.is_empty() {
            return AllergyEntry::Allergy(name.to_string(), reaction.to_string());
        }
    }
    match split_once_any(&entry, &[":", " - ", " -> ", " causes "]) {
        Some((name, reaction)) => AllergyEntry::Allergy(name, reaction),
        None => AllergyEntry::Allergy(entry, String::new()),
    }
}

/// Splits on the earliest of `separators`, trimming both halves. Both halves must be non-empty.
fn split_once_any(text: &str, separators: &[&str]) -> Option<(String, String)> {
    let (at, sep) = separators
        .iter()
        .filter_map(|sep| text.find(sep).map(|at| (at, *sep)))
        .min_by_key(|(at, _)| *at)?;
    let head = text[..at].trim();
    let tail = text[at + sep.len()..].trim();
    (!head.is_empty() && !tail.is_empty()).then(|| (head.to_string(), tail.to_string()))
}

// ============================================================================
// Findings and pending work
// ============================================================================

static VITALS_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;\n]+").expect("valid regex"));

fn read_vitals(vitals: &str, anchor: &RecencyAnchor, findings: &mut Vec<Finding>) {
    let mention = find_mention(vitals);
    let text = match &mention {
        Some(m) => strip_mention(vitals, m),
        None => vitals.to_string(),
    };
    let age_days = anchor.age_days(mention.as_ref());
    let when = mention.map(|m| m.phrase);

    let mut parts: Vec<String> = Vec::new();
    for part in VITALS_SPLIT.split(&text).map(collapse).filter(|p| !p.is_empty()) {
        let lower = part.to_lowercase();
        let trailing = part.split(' ').count() <= 2
            && read_measurements(&part).is_empty()
            && classify(&lower) == DomainSet::default()
            && text_severity(&lower) == Severity::Normal;
        match parts.last_mut() {
            Some(last) if trailing => {
                last.push_str(", ");
                last.push_str(&part);
            }
            _ => parts.push(part),
        }
    }

    for part in parts {
        let finding = build_finding(part, Source::Vitals, when.clone(), age_days, findings.len());
        findings.push(finding);
    }
}

fn read_result(
    entry: &str,
    source: Source,
    anchor: &RecencyAnchor,
    findings: &mut Vec<Finding>,
    pending: &mut Vec<PendingOrder>,
) {
    let Ok(entry) = NonEmptyText::new(entry).map(NonEmptyText::into_string) else {
        return;
    };
    let mention = find_mention(&entry);
    let text = match &mention {
        Some(m) => strip_mention(&entry, m),
        None => entry.clone(),
    };
    let lower = text.to_lowercase();
    let ascii = text.to_ascii_lowercase();

    if let Some(at) = PENDING_TERMS.iter().filter_map(|t| find_term(&ascii, t)).min() {
        let urgent = URGENT_ORDER_TERMS.iter().any(|t| contains_term(&lower, t));
        pending.push(PendingOrder {
            order: pending.len(),
            source,
            label: pending_label(&text, at),
            when: mention.map(|m| m.phrase),
            urgent,
            domains: classify(&lower),
        });
        return;
    }

    let age_days = anchor.age_days(mention.as_ref());
    let when = mention.map(|m| m.phrase);
    let finding = build_finding(text, source, when, age_days, findings.len());
    findings.push(finding);
}

/// Label of a pending entry: the wording before the pending keyword, or after it when nothing
/// precedes it.
fn pending_label(text: &str, keyword_at: usize) -> String {
    const SEPARATORS: &[char] = &[':', '-', ',', ';', '(', ')', ' '];
    let before = text[..keyword_at].trim_matches(SEPARATORS);
    let label = if before.is_empty() {
        let after = &text[keyword_at..];
        let skip = after.find(' ').map_or(after.len(), |i| i + 1);
        after[skip..].trim_matches(SEPARATORS)
    } else {
        before
    };
    let label = label
        .strip_suffix(" stat")
        .or_else(|| label.strip_suffix(" STAT"))
        .unwrap_or(label);
    capitalise(label.trim())
}

fn build_finding(
    text: String,
    source: Source,
    when: Option<String>,
    age_days: u32,
    order: usize,
) -> Finding {
    let lower = text.to_lowercase();
    let measurement = match source {
        Source::Imaging => None,
        Source::Vitals | Source::Lab => read_measurements(&text)
            .into_iter()
            .enumerate()
            .max_by_key(|(i, m)| (m.severity, std::cmp::Reverse(*i)))
            .map(|(_, m)| m),
    };
    let severity = measurement
        .as_ref()
        .map_or(Severity::Normal, |m| m.severity)
        .max(text_severity(&lower));

    Finding {
        order,
        source,
        domains: classify(&lower),
        text,
        when,
        age_days,
        severity,
        measurement,
    }
}

fn text_severity(lower: &str) -> Severity {
    if mentions_unnegated(lower, CRITICAL_TERMS) {
        Severity::Critical
    } else if mentions_unnegated(lower, ABNORMAL_TERMS) {
        Severity::Abnormal
    } else {
        Severity::Normal
    }
}

// ============================================================================
// Measurements
// ============================================================================

const LEAD: &str = r"[\s:=-]*(?:of\s+|was\s+|is\s+)?";

fn pattern(body: String) -> Regex {
    Regex::new(&body).expect("valid regex")
}

static MEASURES: LazyLock<Vec<(MeasureKind, Regex)>> = LazyLock::new(|| {
    vec![
        (
            MeasureKind::BloodPressure,
            pattern(format!(
                r"(?i)\b(?:bp|b/p|blood pressure){LEAD}(\d{{2,3}})\s*/\s*(\d{{2,3}})"
            )),
        ),
        (
            MeasureKind::BloodPressure,
            pattern(r"(?i)\b(\d{2,3})\s*/\s*(\d{2,3})\s*mm\s*hg".to_string()),
        ),
        (
            MeasureKind::HeartRate,
            pattern(format!(r"(?i)\b(?:hr|heart rate|pulse){LEAD}(\d{{2,3}})\b")),
        ),
        (
            MeasureKind::HeartRate,
            pattern(r"(?i)\b(\d{2,3})\s*bpm\b".to_string()),
        ),
        (
            MeasureKind::OxygenSaturation,
            pattern(format!(
                r"(?i)\b(?:spo2|sao2|o2 sat(?:uration)?|oxygen saturation|sat){LEAD}(\d{{2,3}})\s*%?"
            )),
        ),
        (
            MeasureKind::Temperature,
            pattern(format!(
                r"(?i)\b(?:temp|temperature|t){LEAD}(\d{{2,3}}(?:\.\d+)?)\s*°?\s*([fc])?\b"
            )),
        ),
        (
            MeasureKind::HbA1c,
            pattern(format!(
                r"(?i)\b(?:hba1c|a1c|hemoglobin a1c|glycated hemoglobin){LEAD}(\d{{1,2}}(?:\.\d+)?)\s*%?"
            )),
        ),
        (
            MeasureKind::Glucose,
            pattern(format!(
                r"(?i)\b(?:glucose|blood sugar|blood glucose|fasting glucose|bg|fbg){LEAD}(\d{{2,3}})\b"
            )),
        ),
        (
            MeasureKind::Potassium,
            pattern(format!(r"(?i)\b(?:potassium|k)\+?{LEAD}(\d(?:\.\d+)?)\b")),
        ),
    ]
});

/// Every recognised reading in `text`, at most one per kind.
pub(crate) fn read_measurements(text: &str) -> Vec<Measurement> {
    let mut out: Vec<Measurement> = Vec::new();
    for (kind, re) in MEASURES.iter() {
        if out.iter().any(|m| m.kind == *kind) {
            continue;
        }
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
            continue;
        };
        let second = caps.get(2).map(|m| m.as_str());
        if let Some(m) = interpret(*kind, value, &caps[1], second) {
            out.push(m);
        }
    }
    out
}

fn interpret(kind: MeasureKind, value: f64, raw: &str, second: Option<&str>) -> Option<Measurement> {
    let (severity, interpretation, secondary, display) = match kind {
        MeasureKind::BloodPressure => {
            let raw_dia = second?;
            let dia: f64 = raw_dia.parse().ok()?;
            let (severity, reading) = if value >= 180.0 || dia >= 120.0 {
                (Severity::Critical, interp("in hypertensive crisis range", "dangerously high"))
            } else if value >= 140.0 || dia >= 90.0 {
                (Severity::Abnormal, interp("above goal", "higher than the goal"))
            } else if value < 90.0 {
                (Severity::Abnormal, interp("low", "lower than normal"))
            } else {
                (Severity::Normal, interp("at goal", "in the healthy range"))
            };
            (severity, reading, Some(dia), format!("{raw}/{raw_dia}"))
        }
        MeasureKind::HeartRate => {
            let (severity, reading) = if value > 130.0 || value < 40.0 {
                (Severity::Critical, interp("critically abnormal rate", "much too fast or slow"))
            } else if value > 100.0 {
                (Severity::Abnormal, interp("tachycardic", "faster than normal"))
            } else if value < 60.0 {
                (Severity::Abnormal, interp("bradycardic", "slower than normal"))
            } else {
                (Severity::Normal, interp("normal rate", "normal"))
            };
            (severity, reading, None, format!("{raw} bpm"))
        }
        MeasureKind::OxygenSaturation => {
            let (severity, reading) = if value < 88.0 {
                (Severity::Critical, interp("critically low", "dangerously low"))
            } else if value < 94.0 {
                (Severity::Abnormal, interp("low", "lower than normal"))
            } else {
                (Severity::Normal, interp("normal", "normal"))
            };
            (severity, reading, None, format!("{raw}%"))
        }
        MeasureKind::Temperature => {
            let celsius = match second.map(str::to_ascii_lowercase).as_deref() {
                Some("c") => true,
                Some(_) => false,
                None => value < 50.0,
            };
            let (critical, fever) = if celsius { (39.4, 38.0) } else { (103.0, 100.4) };
            let (severity, reading) = if value >= critical {
                (Severity::Critical, interp("high fever", "a high fever"))
            } else if value >= fever {
                (Severity::Abnormal, interp("febrile", "a fever"))
            } else {
                (Severity::Normal, interp("afebrile", "no fever"))
            };
            let unit = if celsius { "C" } else { "F" };
            (severity, reading, None, format!("{raw} {unit}"))
        }
        MeasureKind::HbA1c => {
            let (severity, reading) = if value >= 7.0 {
                (Severity::Abnormal, interp("above target", "higher than the goal"))
            } else {
                (Severity::Normal, interp("at target", "at the goal"))
            };
            (severity, reading, None, format!("{raw}%"))
        }
        MeasureKind::Glucose => {
            let (severity, reading) = if value >= 400.0 {
                (Severity::Critical, interp("critically high", "dangerously high"))
            } else if value < 54.0 {
                (Severity::Critical, interp("critically low", "dangerously low"))
            } else if value >= 180.0 {
                (Severity::Abnormal, interp("high", "higher than normal"))
            } else if value < 70.0 {
                (Severity::Abnormal, interp("low", "lower than normal"))
            } else {
                (Severity::Normal, interp("in range", "in the healthy range"))
            };
            (severity, reading, None, format!("{raw} mg/dL"))
        }
        MeasureKind::Potassium => {
            let (severity, reading) = if value > 6.0 {
                (Severity::Critical, interp("critically high", "dangerously high"))
            } else if value < 2.5 {
                (Severity::Critical, interp("critically low", "dangerously low"))
            } else if value > 5.0 {
                (Severity::Abnormal, interp("high", "higher than normal"))
            } else if value < 3.5 {
                (Severity::Abnormal, interp("low", "lower than normal"))
            } else {
                (Severity::Normal, interp("normal", "normal"))
            };
            (severity, reading, None, raw.to_string())
        }
    };
    Some(Measurement {
        kind,
        value,
        secondary,
        display,
        severity,
        interpretation,
    })
}

// ============================================================================
// Problems
// ============================================================================

static HISTORY_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[,;\n]+|\.\s+|\s+and\s+").expect("valid regex"));

const LEAD_INS: &[&str] = &[
    "past medical history", "pmh", "history of", "hx of", "h/o", "significant for", "known",
];

const NOTHING_TO_REPORT: &[&str] = &[
    "none", "n/a", "unremarkable", "noncontributory", "non-contributory", "nil",
];

fn read_complaint(text: &str) -> Option<Complaint> {
    let text = NonEmptyText::new(text).ok()?.into_string();
    let lower = text.to_lowercase();
    let red_flag = mentions_unnegated(&lower, RED_FLAG_TERMS);
    let routine = !red_flag && ROUTINE_VISIT_TERMS.iter().any(|t| contains_term(&lower, t));
    Some(Complaint {
        domains: classify(&lower),
        text,
        routine,
        red_flag,
    })
}

/// A history fragment before it becomes a problem: its own wording plus any status
/// qualifiers that followed it.
struct Fragment {
    base: String,
    full: String,
}

fn read_history(history: &str) -> Vec<Problem> {
    let mut fragments: Vec<Fragment> = Vec::new();
    for raw in HISTORY_SPLIT.split(history) {
        let collapsed = collapse(raw);
        let fragment = strip_lead_ins(collapsed.trim_end_matches('.'));
        if fragment.is_empty() {
            continue;
        }
        let lower = fragment.to_lowercase();
        if is_negated(&lower) {
            continue;
        }
        match fragments.last_mut() {
            Some(last) if is_qualifier(&lower) => {
                last.full.push_str(", ");
                last.full.push_str(fragment);
            }
            _ => fragments.push(Fragment {
                base: fragment.to_string(),
                full: fragment.to_string(),
            }),
        }
    }

    let mut problems: Vec<Problem> = Vec::new();
    for fragment in fragments {
        let evidence = fragment.full.to_lowercase();
        let condition = match_condition(&evidence);
        let name = match condition.and_then(|c| c.canonical) {
            Some(canonical) => canonical.to_string(),
            None => {
                let base = match find_mention(&fragment.base) {
                    Some(m) => strip_mention(&fragment.base, &m),
                    None => fragment.base.clone(),
                };
                capitalise(&base)
            }
        };
        if name.is_empty() {
            continue;
        }

        if let Some(existing) = problems.iter_mut().find(|p| p.name.eq_ignore_ascii_case(&name)) {
            existing.evidence.push_str("; ");
            existing.evidence.push_str(&evidence);
            continue;
        }

        let mut domains = classify(&evidence);
        if let Some(c) = condition {
            domains.insert(c.domain);
        }
        problems.push(Problem {
            order: problems.len(),
            name,
            condition,
            evidence,
            domains,
            origin: ProblemOrigin::History,
            red_flag: false,
            status: ProblemStatus::Unknown,
            critical: false,
            treated_with: None,
        });
    }
    problems
}

/// Folds the chief complaint into the problem list. A complaint about a condition already on
/// the list adds to that problem's evidence; any other non-routine complaint becomes a problem
/// of its own.
fn add_complaint_problem(complaint: &Complaint, problems: &mut Vec<Problem>) {
    let lower = complaint.text.to_lowercase();
    let condition = match_condition(&lower);

    let existing = condition.and_then(|c| {
        problems
            .iter_mut()
            .find(|p| p.condition.is_some_and(|pc| std::ptr::eq(pc, c)))
    });
    if let Some(existing) = existing {
        existing.evidence.push_str("; ");
        existing.evidence.push_str(&lower);
        existing.red_flag |= complaint.red_flag;
        return;
    }
    if complaint.routine {
        return;
    }

    let mut domains = complaint.domains;
    if let Some(c) = condition {
        domains.insert(c.domain);
    }
    problems.push(Problem {
        order: problems.len(),
        name: capitalise(&complaint.text),
        condition,
        evidence: lower,
        domains,
        origin: ProblemOrigin::Complaint,
        red_flag: complaint.red_flag,
        status: ProblemStatus::Unknown,
        critical: false,
        treated_with: None,
    });
}

fn strip_lead_ins(fragment: &str) -> &str {
    let mut rest = fragment.trim();
    loop {
        let lower = rest.to_ascii_lowercase();
        let lead = LEAD_INS.iter().find(|lead| {
            lower.starts_with(*lead)
                && lower[lead.len()..]
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_alphanumeric())
        });
        match lead {
            Some(lead) => rest = rest[lead.len()..].trim_start_matches([':', ' ', '-']).trim(),
            None => return rest,
        }
    }
}

fn is_negated(lower: &str) -> bool {
    lower.starts_with("no ") || lower.starts_with("denies") || NOTHING_TO_REPORT.contains(&lower)
}

/// Short status-only fragments such as `well controlled` or `on metformin` qualify the
/// fragment before them rather than naming a problem.
fn is_qualifier(lower: &str) -> bool {
    let status_words = [WORSENING_TERMS, RESOLVED_TERMS, CONTROLLED_TERMS, STABLE_TERMS]
        .iter()
        .any(|terms| terms.iter().any(|t| contains_term(lower, t)));
    match_condition(lower).is_none()
        && lower.split_whitespace().count() <= 3
        && (status_words || lower.starts_with("on ") || lower.starts_with("well "))
}

// ============================================================================
// Text helpers
// ============================================================================

/// Collapses runs of whitespace into single spaces and trims the ends.
pub(crate) fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Upper-cases the first character.
pub(crate) fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
