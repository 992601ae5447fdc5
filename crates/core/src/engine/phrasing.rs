//! Wording of summary entries for an audience at a length.
//!
//! Phrasing never decides which facts appear. Longer lengths only ever append to the text a
//! shorter length produces.

use super::extract::{
    AllergyFact, Finding, MedicationFact, PendingOrder, Problem, ProblemOrigin, Source,
};
use super::lexicon::{plain_language, DomainSet};
use super::rules::{Action, ActionKind};
use crate::model::{Allergy, Medication};
use summary_types::{Audience, SummaryLength};

/// Direction of a reading against the previous one of its kind.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Trend {
    pub previous: String,
    pub previous_when: Option<String>,
    pub change: Change,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Change {
    Up,
    Down,
    Same,
}

pub(crate) struct Phraser {
    pub audience: Audience,
    pub length: SummaryLength,
    pub focus: DomainSet,
}

impl Phraser {
    fn patient(&self) -> bool {
        self.audience == Audience::Patient
    }

    fn detailed(&self) -> bool {
        self.length != SummaryLength::Brief
    }

    fn comprehensive(&self) -> bool {
        self.length == SummaryLength::Comprehensive
    }

    /// Text in the audience's vocabulary.
    fn vocabulary(&self, text: &str) -> String {
        if self.patient() {
            plain_language(text)
        } else {
            text.to_string()
        }
    }

    /// Problem name alone, as used in running prose.
    pub(crate) fn problem_name(&self, problem: &Problem) -> String {
        match (self.patient(), problem.condition) {
            (true, Some(condition)) if condition.canonical.is_some() => condition.plain.to_string(),
            _ => self.vocabulary(&problem.name),
        }
    }

    pub(crate) fn problem(&self, problem: &Problem) -> String {
        let mut text = self.problem_name(problem);
        if self.detailed() && problem.origin == ProblemOrigin::Complaint {
            text.push_str(if self.patient() {
                " (the reason for this visit)"
            } else {
                " (presenting complaint)"
            });
        }
        if self.comprehensive() {
            if let Some(drug) = &problem.treated_with {
                text.push_str(&format!(" (treated with {drug})"));
            }
        }
        text
    }

    pub(crate) fn medication(&self, medication: &MedicationFact, indication: Option<&Problem>) -> Medication {
        let details = self.vocabulary(&medication.details);
        let note = match (self.audience, indication) {
            (_, None) => None,
            _ if !self.detailed() => None,
            (Audience::Patient, Some(problem)) => Some(format!("for {}", lay_condition(problem))),
            (Audience::Nurse, Some(problem)) => Some(format!("indication: {}", problem.name)),
            (_, Some(_)) => None,
        };
        let details = match note {
            Some(note) if details.is_empty() => note,
            Some(note) => format!("{details} ({note})"),
            None => details,
        };
        Medication {
            name: medication.name.clone(),
            details,
        }
    }

    pub(crate) fn allergy(&self, allergy: &AllergyFact) -> Allergy {
        let reaction = match (allergy.reaction.is_empty(), self.patient()) {
            (true, true) => "reaction not recorded".to_string(),
            (true, false) => "reaction not documented".to_string(),
            (false, _) => self.vocabulary(&allergy.reaction),
        };
        Allergy {
            name: allergy.name.clone(),
            reaction,
        }
    }

    /// `related` counts the results of the same kind within the window, this one included.
    pub(crate) fn finding(&self, finding: &Finding, trend: Option<&Trend>, related: usize) -> String {
        let mut text = self.vocabulary(&finding.text);

        if self.detailed() {
            if let Some(when) = &finding.when {
                text.push_str(&format!(" ({when})"));
            }
            if let Some(reading) = finding.interpretation() {
                text.push_str(", ");
                text.push_str(if self.patient() { reading.plain } else { reading.clinical });
            }
        }
        if self.comprehensive() {
            if let Some(trend) = trend {
                text.push_str("; ");
                text.push_str(&self.trend(trend));
            }
            if related > 1 {
                text.push_str(&if self.patient() {
                    format!("; {related} results like this on file")
                } else {
                    format!("; {related} results of this kind in range")
                });
            }
        }

        match self.audience {
            Audience::Nurse if finding.is_critical() => format!("Notify provider: {text}"),
            Audience::Specialist => match self.focus_tag(finding.domains) {
                Some(tag) => format!("[{tag}] {text}"),
                None => text,
            },
            _ => text,
        }
    }

    fn trend(&self, trend: &Trend) -> String {
        let when = trend
            .previous_when
            .as_ref()
            .map(|w| format!(" ({w})"))
            .unwrap_or_default();
        let previous = &trend.previous;
        match (self.patient(), trend.change) {
            (false, Change::Up) => format!("up from {previous}{when}"),
            (false, Change::Down) => format!("down from {previous}{when}"),
            (false, Change::Same) => format!("unchanged from {previous}{when}"),
            (true, Change::Up) => format!("higher than the previous {previous}{when}"),
            (true, Change::Down) => format!("lower than the previous {previous}{when}"),
            (true, Change::Same) => format!("the same as the previous {previous}{when}"),
        }
    }

    fn focus_tag(&self, domains: DomainSet) -> Option<&'static str> {
        domains.intersection(self.focus).first().map(|d| d.label())
    }

    pub(crate) fn pending(&self, order: &PendingOrder) -> String {
        let noun = match order.source {
            Source::Imaging => "report",
            Source::Lab | Source::Vitals => "results",
        };
        let label = self.vocabulary(&order.label);
        let mut text = match (self.audience, order.urgent) {
            (Audience::Patient, true) => format!("Urgent: {label} {noun}"),
            (Audience::Patient, false) => format!("{label} {noun}"),
            (Audience::Nurse, true) => format!("STAT: track {} {noun}", decapitalise(&label)),
            (Audience::Nurse, false) => format!("Track {} {noun}", decapitalise(&label)),
            (_, true) => format!("STAT: {label} {noun}"),
            (_, false) => format!("{label} {noun}"),
        };
        if self.detailed() {
            if let Some(when) = &order.when {
                let verb = if self.patient() { "requested" } else { "ordered" };
                text.push_str(&format!(" ({verb} {when})"));
            }
        }
        text
    }

    pub(crate) fn action(&self, action: &Action) -> String {
        let (lead, detail) = match self.audience {
            Audience::Patient => patient_action(&action.kind),
            Audience::Nurse => nurse_action(&action.kind),
            Audience::Physician | Audience::Specialist => clinician_action(&action.kind),
        };
        if self.detailed() {
            format!("{lead}; {detail}")
        } else {
            lead
        }
    }
}

fn patient_action(kind: &ActionKind) -> (String, String) {
    match kind {
        ActionKind::EvaluateComplaint { complaint, red_flag } => (
            format!("Your care team will look into your symptoms: {}", plain_language(complaint)),
            if *red_flag {
                "call emergency services if your symptoms get worse".into()
            } else {
                "tell them when it started".into()
            },
        ),
        ActionKind::AllergyConflict {
            medication,
            allergen,
        } => (
            format!(
                "Check with your care team before taking {medication}: you have a recorded {allergen} allergy"
            ),
            "do not stop other medicines on your own".into(),
        ),
        ActionKind::ReviewCriticalFinding { finding } => (
            format!(
                "Your care team needs to review this result urgently: {}",
                plain_language(finding)
            ),
            "they will contact you about next steps".into(),
        ),
        ActionKind::ReassessProblem { problem, plain } => {
            let name = match plain {
                Some(plain) => lay(plain),
                None => decapitalise(&plain_language(problem)),
            };
            (
                format!("Your care team will review the plan for your {name}"),
                "recent results suggest it is getting worse".into(),
            )
        }
        ActionKind::FollowUpFinding { finding } => (
            format!("Your care team will follow up on this result: {}", plain_language(finding)),
            "you may need a repeat test".into(),
        ),
        ActionKind::DiscussA1cGoal { reading } => (
            "Talk with your care team about your blood sugar goal".into(),
            format!("your latest HbA1c was {reading}"),
        ),
        ActionKind::DiabeticEyeExam => (
            "Book your yearly diabetes eye check".into(),
            "it helps catch eye problems early".into(),
        ),
        ActionKind::HomeBpMonitoring => (
            "Check your blood pressure at home and keep a log".into(),
            "bring it to your next visit".into(),
        ),
        ActionKind::ConfirmAllergyHistory => (
            "Tell your care team about any allergies you have".into(),
            "none are on your record yet".into(),
        ),
    }
}

fn clinician_action(kind: &ActionKind) -> (String, String) {
    match kind {
        ActionKind::EvaluateComplaint { complaint, red_flag } => (
            format!("Evaluate presenting complaint: {complaint}"),
            if *red_flag {
                "red-flag presentation, exclude emergency causes first".into()
            } else {
                "document history and examination".into()
            },
        ),
        ActionKind::AllergyConflict {
            medication,
            allergen,
        } => (
            format!("Review {medication} prescription: documented {allergen} allergy"),
            "possible cross-reactivity".into(),
        ),
        ActionKind::ReviewCriticalFinding { finding } => (
            format!("Review critical result: {finding}"),
            "confirm and act on the result today".into(),
        ),
        ActionKind::ReassessProblem { problem, .. } => (
            format!("Reassess management of {problem}"),
            "latest evidence indicates worsening".into(),
        ),
        ActionKind::FollowUpFinding { finding } => (
            format!("Follow up abnormal result: {finding}"),
            "repeat or investigate as indicated".into(),
        ),
        ActionKind::DiscussA1cGoal { reading } => (
            "Discuss HbA1c goal and treatment intensification".into(),
            format!("latest HbA1c {reading}"),
        ),
        ActionKind::DiabeticEyeExam => (
            "Schedule annual diabetic eye exam".into(),
            "retinopathy screening".into(),
        ),
        ActionKind::HomeBpMonitoring => (
            "Recommend home blood pressure monitoring".into(),
            "review readings at next visit".into(),
        ),
        ActionKind::ConfirmAllergyHistory => (
            "Confirm and document allergy history".into(),
            "no allergies recorded".into(),
        ),
    }
}

fn nurse_action(kind: &ActionKind) -> (String, String) {
    match kind {
        ActionKind::EvaluateComplaint { complaint, red_flag } => (
            format!("Obtain full vital signs and notify provider: {complaint}"),
            if *red_flag {
                "red-flag presentation".into()
            } else {
                "record onset and severity".into()
            },
        ),
        ActionKind::AllergyConflict {
            medication,
            allergen,
        } => (
            format!("Hold {medication} and confirm with prescriber: documented {allergen} allergy"),
            "check reaction history with patient".into(),
        ),
        ActionKind::ReviewCriticalFinding { finding } => (
            format!("Notify provider of critical result: {finding}"),
            "follow critical-value escalation protocol".into(),
        ),
        ActionKind::ReassessProblem { problem, .. } => (
            format!("Monitor {problem} closely and report changes to provider"),
            "latest evidence indicates worsening".into(),
        ),
        ActionKind::FollowUpFinding { finding } => (
            format!("Recheck and document: {finding}"),
            "report persistent abnormality to provider".into(),
        ),
        ActionKind::DiscussA1cGoal { reading } => (
            "Reinforce diabetes self-management education".into(),
            format!("latest HbA1c {reading}"),
        ),
        ActionKind::DiabeticEyeExam => (
            "Confirm annual diabetic eye exam is booked".into(),
            "retinopathy screening".into(),
        ),
        ActionKind::HomeBpMonitoring => (
            "Teach home blood pressure monitoring technique".into(),
            "provide a reading log".into(),
        ),
        ActionKind::ConfirmAllergyHistory => (
            "Ask patient about allergies and update the record".into(),
            "no allergies recorded".into(),
        ),
    }
}

/// Lay name of a problem for use mid-sentence.
fn lay_condition(problem: &Problem) -> String {
    match problem.condition {
        Some(condition) if condition.canonical.is_some() => lay(condition.plain),
        _ => decapitalise(&plain_language(&problem.name)),
    }
}

/// Lay wording without its bracketed clinical term, for use mid-sentence.
fn lay(plain: &str) -> String {
    let short = plain.split(" (").next().unwrap_or(plain);
    decapitalise(short)
}

/// Lower-cases a leading capital unless the word is an acronym.
pub(crate) fn decapitalise(text: &str) -> String {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_lowercase() => {
            first.to_lowercase().chain(text.chars().skip(1)).collect()
        }
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::extract::extract;
    use crate::engine::lexicon::focus_domains;
    use crate::engine::rules::assess_problems;
    use crate::model::EhrSnapshot;
    use summary_types::{FocusArea, Priority};

    fn phraser(audience: Audience, length: SummaryLength) -> Phraser {
        Phraser {
            audience,
            length,
            focus: DomainSet::default(),
        }
    }

    fn record() -> EhrSnapshot {
        EhrSnapshot {
            demographics: "65-year-old male".into(),
            chief_complaint: "Routine follow-up".into(),
            past_medical_history: "Hypertension, Type 2 Diabetes".into(),
            medications: vec!["Lisinopril 10mg daily".into(), "Metformin 500mg twice daily".into()],
            allergies: vec!["Penicillin: Hives".into()],
            vital_signs: "BP 150/95".into(),
            lab_results: vec!["HbA1c 7.2% (3 months ago)".into()],
            imaging_reports: vec!["CT head stat pending".into()],
        }
    }

    #[test]
    fn test_finding_grows_with_length() {
        let facts = extract(&record());
        let a1c = &facts.findings[1];

        let brief = phraser(Audience::Physician, SummaryLength::Brief).finding(a1c, None, 1);
        let standard = phraser(Audience::Physician, SummaryLength::Standard).finding(a1c, None, 1);
        let trend = Trend {
            previous: "6.8%".into(),
            previous_when: Some("1 year ago".into()),
            change: Change::Up,
        };
        let full = phraser(Audience::Physician, SummaryLength::Comprehensive).finding(a1c, Some(&trend), 2);

        assert_eq!(brief, "HbA1c 7.2%");
        assert_eq!(standard, "HbA1c 7.2% (3 months ago), above target");
        assert_eq!(
            full,
            "HbA1c 7.2% (3 months ago), above target; up from 6.8% (1 year ago); 2 results of this kind in range"
        );
    }

    #[test]
    fn test_patient_wording_is_plain() {
        let mut facts = extract(&record());
        assess_problems(&mut facts);
        let patient = phraser(Audience::Patient, SummaryLength::Standard);

        assert_eq!(patient.problem(&facts.problems[0]), "High blood pressure (hypertension)");
        assert_eq!(
            patient.finding(&facts.findings[0], None, 1),
            "blood pressure 150/95, higher than the goal"
        );
        let med = patient.medication(&facts.medications[1], Some(&facts.problems[1]));
        assert_eq!(med.details, "500mg twice a day (for type 2 diabetes)");
        assert_eq!(patient.allergy(&facts.allergies[0]).reaction, "hives (itchy raised welts)");
    }

    #[test]
    fn test_nurse_wording_is_task_oriented() {
        let mut facts = extract(&record());
        assess_problems(&mut facts);
        let nurse = phraser(Audience::Nurse, SummaryLength::Standard);

        let med = nurse.medication(&facts.medications[0], Some(&facts.problems[0]));
        assert_eq!(med.details, "10mg daily (indication: Hypertension)");
        assert_eq!(nurse.pending(&facts.pending[0]), "STAT: track CT head report");
    }

    #[test]
    fn test_specialist_tags_focus_findings() {
        let facts = extract(&record());
        let specialist = Phraser {
            audience: Audience::Specialist,
            length: SummaryLength::Brief,
            focus: focus_domains(FocusArea::Cardiology),
        };
        assert_eq!(specialist.finding(&facts.findings[0], None, 1), "[cardiovascular] BP 150/95");
        assert_eq!(specialist.finding(&facts.findings[1], None, 1), "HbA1c 7.2%");
    }

    #[test]
    fn test_action_detail_only_beyond_brief() {
        let action = Action {
            kind: ActionKind::DiabeticEyeExam,
            priority: Priority::Routine,
            domains: DomainSet::default(),
            order: 0,
        };
        assert_eq!(
            phraser(Audience::Physician, SummaryLength::Brief).action(&action),
            "Schedule annual diabetic eye exam"
        );
        assert_eq!(
            phraser(Audience::Physician, SummaryLength::Standard).action(&action),
            "Schedule annual diabetic eye exam; retinopathy screening"
        );
        assert_eq!(
            phraser(Audience::Patient, SummaryLength::Brief).action(&action),
            "Book your yearly diabetes eye check"
        );
    }

    #[test]
    fn test_decapitalise_keeps_acronyms() {
        assert_eq!(decapitalise("Lipid panel"), "lipid panel");
        assert_eq!(decapitalise("CT head"), "CT head");
        assert_eq!(decapitalise(""), "");
    }
}
