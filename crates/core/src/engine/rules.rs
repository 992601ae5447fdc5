//! Clinical reasoning over extracted facts: problem status and actionable items.

use super::extract::{Facts, Finding, Problem, ProblemOrigin, Severity};
use super::lexicon::{
    allergy_conflict, contains_term, mentions_unnegated, Domain, DomainSet, MeasureKind,
    CONTROLLED_TERMS, CRITICAL_TERMS, RESOLVED_TERMS, STABLE_TERMS, WORSENING_TERMS,
};
use std::cmp::Reverse;
use summary_types::{Priority, ProblemStatus, TimeFrame};

// ============================================================================
// Problem status
// ============================================================================

/// Fills in status, critical flag and treating medication for every problem.
pub(crate) fn assess_problems(facts: &mut Facts) {
    let Facts {
        problems,
        medications,
        findings,
        ..
    } = facts;

    for problem in problems.iter_mut() {
        problem.treated_with = problem.condition.and_then(|condition| {
            medications
                .iter()
                .find(|m| condition.treated_by.iter().any(|t| contains_term(&m.lower, t)))
                .map(|m| m.name.clone())
        });

        let (status, evidence_critical) = match (keyword_status(&problem.evidence), problem.origin) {
            (Some(status), _) => (status, latest_marker_is_critical(problem, findings)),
            (None, ProblemOrigin::Complaint) => (ProblemStatus::Unknown, false),
            (None, ProblemOrigin::History) => evidence_status(problem, findings),
        };

        let text_critical = status != ProblemStatus::Resolved
            && mentions_unnegated(&problem.evidence, CRITICAL_TERMS);
        problem.critical = problem.red_flag || text_critical || evidence_critical;
        problem.status = if problem.critical && !status.needs_attention() {
            ProblemStatus::Worsening
        } else {
            status
        };
    }
}

/// Status stated in the record's own wording.
fn keyword_status(evidence: &str) -> Option<ProblemStatus> {
    let says = |terms: &[&str]| terms.iter().any(|t| contains_term(evidence, t));
    if says(WORSENING_TERMS) {
        Some(ProblemStatus::Worsening)
    } else if says(RESOLVED_TERMS) {
        Some(ProblemStatus::Resolved)
    } else if says(CONTROLLED_TERMS) {
        Some(ProblemStatus::Controlled)
    } else if says(STABLE_TERMS) {
        Some(ProblemStatus::Stable)
    } else {
        None
    }
}

/// Status read from the latest related measurement and the medication list.
fn evidence_status(problem: &Problem, findings: &[Finding]) -> (ProblemStatus, bool) {
    let treated = problem.treated_with.is_some();
    let Some(condition) = problem.condition else {
        return (ProblemStatus::Unknown, false);
    };
    let untroubled = if treated {
        ProblemStatus::Controlled
    } else {
        ProblemStatus::Stable
    };

    let Some(latest) = latest_reading(findings, |kind| condition.markers.contains(&kind)) else {
        return (untroubled, false);
    };
    let Some(reading) = latest.measurement.as_ref() else {
        return (untroubled, false);
    };

    match reading.severity {
        Severity::Critical => (ProblemStatus::Worsening, true),
        Severity::Normal => (untroubled, false),
        Severity::Abnormal => {
            let status = match previous_reading(findings, latest, |_| true) {
                Some(prev) => match prev.measurement.as_ref() {
                    Some(p) if reading.deviation() < p.deviation() => ProblemStatus::Stable,
                    _ => ProblemStatus::Worsening,
                },
                None if treated => ProblemStatus::Stable,
                None => ProblemStatus::Worsening,
            };
            (status, false)
        }
    }
}

fn latest_marker_is_critical(problem: &Problem, findings: &[Finding]) -> bool {
    problem.condition.is_some_and(|condition| {
        latest_reading(findings, |kind| condition.markers.contains(&kind))
            .and_then(|f| f.measurement.as_ref())
            .is_some_and(|m| m.severity == Severity::Critical)
    })
}

/// Newest finding carrying a measurement of an accepted kind. Among equal ages the later entry
/// wins.
pub(crate) fn latest_reading(
    findings: &[Finding],
    accept: impl Fn(MeasureKind) -> bool,
) -> Option<&Finding> {
    findings
        .iter()
        .filter(|f| f.measurement.as_ref().is_some_and(|m| accept(m.kind)))
        .min_by_key(|f| (f.age_days, Reverse(f.order)))
}

/// The reading of the same kind that came just before `latest`, among findings `admit` accepts.
pub(crate) fn previous_reading<'a>(
    findings: &'a [Finding],
    latest: &Finding,
    admit: impl Fn(&Finding) -> bool,
) -> Option<&'a Finding> {
    let kind = latest.measurement.as_ref()?.kind;
    findings
        .iter()
        .filter(|f| f.measurement.as_ref().is_some_and(|m| m.kind == kind))
        .filter(|f| {
            f.age_days > latest.age_days || (f.age_days == latest.age_days && f.order < latest.order)
        })
        .filter(|f| admit(f))
        .min_by_key(|f| (f.age_days, Reverse(f.order)))
}

// ============================================================================
// Actionable items
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ActionKind {
    EvaluateComplaint { complaint: String, red_flag: bool },
    AllergyConflict { medication: String, allergen: String },
    ReviewCriticalFinding { finding: String },
    ReassessProblem { problem: String, plain: Option<&'static str> },
    FollowUpFinding { finding: String },
    DiscussA1cGoal { reading: String },
    DiabeticEyeExam,
    HomeBpMonitoring,
    ConfirmAllergyHistory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Action {
    pub kind: ActionKind,
    pub priority: Priority,
    pub domains: DomainSet,
    pub order: usize,
}

/// Derives every actionable item from assessed facts. Items repeating an earlier item keep
/// the higher of the two priorities.
pub(crate) fn derive_actions(facts: &Facts, window: TimeFrame) -> Vec<Action> {
    let mut actions: Vec<Action> = Vec::new();

    if let Some(complaint) = facts.complaint.as_ref().filter(|c| !c.routine) {
        let priority = if complaint.red_flag {
            Priority::Urgent
        } else {
            Priority::Important
        };
        let kind = ActionKind::EvaluateComplaint {
            complaint: complaint.text.clone(),
            red_flag: complaint.red_flag,
        };
        push(&mut actions, kind, priority, complaint.domains);
    }

    for medication in &facts.medications {
        for allergy in &facts.allergies {
            if allergy_conflict(&allergy.name.to_lowercase(), &medication.lower) {
                let kind = ActionKind::AllergyConflict {
                    medication: medication.name.clone(),
                    allergen: allergy.name.clone(),
                };
                push(&mut actions, kind, Priority::Urgent, medication.domains);
            }
        }
    }

    let in_window: Vec<&Finding> = facts
        .findings
        .iter()
        .filter(|f| window.admits(f.age_days))
        .collect();

    for finding in in_window.iter().filter(|f| f.is_critical()) {
        let kind = ActionKind::ReviewCriticalFinding {
            finding: finding.text.clone(),
        };
        push(&mut actions, kind, Priority::Urgent, finding.domains);
    }

    for problem in &facts.problems {
        if problem.origin == ProblemOrigin::History && problem.status == ProblemStatus::Worsening {
            let priority = if problem.critical {
                Priority::Urgent
            } else {
                Priority::Important
            };
            let kind = ActionKind::ReassessProblem {
                problem: problem.name.clone(),
                plain: problem.condition.filter(|c| c.canonical.is_some()).map(|c| c.plain),
            };
            push(&mut actions, kind, priority, problem.domains);
        }
    }

    for finding in in_window.iter().filter(|f| f.severity == Severity::Abnormal) {
        let kind = ActionKind::FollowUpFinding {
            finding: finding.text.clone(),
        };
        push(&mut actions, kind, Priority::Important, finding.domains);
    }

    let a1c = latest_reading(&facts.findings, |kind| kind == MeasureKind::HbA1c)
        .and_then(|f| f.measurement.as_ref())
        .filter(|m| m.severity != Severity::Normal);
    if let Some(reading) = a1c {
        let kind = ActionKind::DiscussA1cGoal {
            reading: reading.display.clone(),
        };
        push(&mut actions, kind, Priority::Important, DomainSet::of(Domain::Metabolic));
    }

    let active = |canonical: &str| {
        facts.problems.iter().any(|p| {
            p.status != ProblemStatus::Resolved
                && p.condition.and_then(|c| c.canonical) == Some(canonical)
        })
    };
    if active("Type 2 Diabetes") || active("Type 1 Diabetes") {
        let domains = DomainSet::of(Domain::Metabolic).union(DomainSet::of(Domain::Preventive));
        push(&mut actions, ActionKind::DiabeticEyeExam, Priority::Routine, domains);
    }
    if active("Hypertension") {
        let domains = DomainSet::of(Domain::Cardiovascular).union(DomainSet::of(Domain::Preventive));
        push(&mut actions, ActionKind::HomeBpMonitoring, Priority::Routine, domains);
    }

    if facts.allergies.is_empty() && !facts.no_known_allergies {
        push(
            &mut actions,
            ActionKind::ConfirmAllergyHistory,
            Priority::Routine,
            DomainSet::default(),
        );
    }

    actions
}

fn push(actions: &mut Vec<Action>, kind: ActionKind, priority: Priority, domains: DomainSet) {
    if let Some(existing) = actions.iter_mut().find(|a| a.kind == kind) {
        if priority.rank() > existing.priority.rank() {
            existing.priority = priority;
        }
        return;
    }
    let order = actions.len();
    actions.push(Action {
        kind,
        priority,
        domains,
        order,
    });
}
