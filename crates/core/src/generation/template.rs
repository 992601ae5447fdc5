use super::{NarrativeGenerator, NarrativeRequest};
use crate::SummaryResult;
use async_trait::async_trait;
use summary_types::{Audience, SummaryLength};

/// Deterministic template prose.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub const ID: &'static str = "template";

    pub fn render(request: &NarrativeRequest) -> String {
        let sentences = match request.audience {
            Audience::Patient => patient(request),
            Audience::Nurse => nurse(request),
            Audience::Physician | Audience::Specialist => clinician(request),
        };
        sentences.join(" ")
    }
}

#[async_trait]
impl NarrativeGenerator for TemplateGenerator {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn overview(&self, request: &NarrativeRequest) -> SummaryResult<String> {
        Ok(Self::render(request))
    }
}

fn clinician(r: &NarrativeRequest) -> Vec<String> {
    let who = subject(&r.demographics, "Patient");
    let mut out = vec![match (&r.chief_complaint, r.routine_visit) {
        (Some(c), false) => format!("{who} presenting with {}.", lower_first(c)),
        (Some(c), true) => format!("{who} seen for {}.", lower_first(c)),
        (None, _) => format!("{who}."),
    }];
    if !r.problems.is_empty() {
        out.push(format!("Active problems: {}.", join(&r.problems)));
    }
    if r.length == SummaryLength::Brief {
        return out;
    }

    let meds = match r.medication_count {
        0 => "No current medications".to_string(),
        n => format!("On {}", count(n, "medication")),
    };
    let allergies = if !r.allergies.is_empty() {
        format!("allergies: {}", join(&r.allergies))
    } else if r.no_known_allergies {
        "no known drug allergies".to_string()
    } else {
        "allergy history not documented".to_string()
    };
    out.push(format!("{meds}; {allergies}."));
    if r.critical_findings > 0 {
        let verb = if r.critical_findings == 1 { "needs" } else { "need" };
        out.push(format!(
            "{} {verb} review.",
            capital(&count(r.critical_findings, "critical finding"))
        ));
    }
    if !r.worsening.is_empty() {
        out.push(format!("Worsening: {}.", join(&r.worsening)));
    }
    if r.length == SummaryLength::Comprehensive {
        out.push(format!(
            "This summary lists {}, {} and {} ({} urgent).",
            count(r.findings, "recent finding"),
            count(r.pending, "pending item"),
            count(r.actions, "actionable item"),
            r.urgent_actions,
        ));
    }
    out
}

fn nurse(r: &NarrativeRequest) -> Vec<String> {
    let who = subject(&r.demographics, "Patient");
    let mut out = vec![match &r.chief_complaint {
        Some(c) => format!("{who}, here for {}.", lower_first(c)),
        None => format!("{who}."),
    }];
    if !r.problems.is_empty() {
        out.push(format!("Active problems: {}.", join(&r.problems)));
    }
    if r.length == SummaryLength::Brief {
        return out;
    }

    let allergies = if !r.allergies.is_empty() {
        format!("allergies: {}", join(&r.allergies))
    } else if r.no_known_allergies {
        "NKDA".to_string()
    } else {
        "allergies not yet documented".to_string()
    };
    out.push(format!(
        "{} on the list; {allergies}.",
        capital(&count(r.medication_count, "medication"))
    ));
    if r.critical_findings > 0 {
        out.push(format!(
            "Notify provider: {}.",
            count(r.critical_findings, "critical finding")
        ));
    }
    if r.urgent_actions > 0 {
        out.push(format!("{} outstanding.", capital(&count(r.urgent_actions, "urgent task"))));
    }
    if r.length == SummaryLength::Comprehensive {
        out.push(format!(
            "{} to track and {} in total.",
            capital(&count(r.pending, "pending result")),
            count(r.actions, "task"),
        ));
    }
    out
}

fn patient(r: &NarrativeRequest) -> Vec<String> {
    let mut out = vec![match (&r.chief_complaint, r.routine_visit) {
        (Some(c), false) => format!("You came in because of {}.", lower_first(c)),
        (Some(c), true) => format!("This summary covers your {} visit.", lower_first(c)),
        (None, _) => "This is a summary of your health record.".to_string(),
    }];
    if !r.problems.is_empty() {
        let problems: Vec<String> = r.problems.iter().map(|p| lower_first(p)).collect();
        out.push(format!("Your health conditions include {}.", join(&problems)));
    }
    if r.length == SummaryLength::Brief {
        return out;
    }

    out.push(match r.medication_count {
        0 => "You have no medicines on your list.".to_string(),
        n => format!("You take {}.", count(n, "medicine")),
    });
    out.push(if !r.allergies.is_empty() {
        format!("Your record lists allergies to {}.", join(&r.allergies))
    } else if r.no_known_allergies {
        "Your record says you have no known drug allergies.".to_string()
    } else {
        "No allergies are recorded yet.".to_string()
    });
    if r.critical_findings > 0 {
        out.push("Some results need prompt attention from your care team.".to_string());
    }
    if !r.worsening.is_empty() {
        let worsening: Vec<String> = r.worsening.iter().map(|p| lower_first(p)).collect();
        out.push(format!("Your care team is keeping a close eye on your {}.", join(&worsening)));
    }
    if r.length == SummaryLength::Comprehensive {
        out.push(format!(
            "Tests still waiting for results: {}. Next steps listed below: {}.",
            r.pending, r.actions
        ));
    }
    out
}

fn subject(demographics: &str, fallback: &str) -> String {
    if demographics.trim().is_empty() {
        fallback.to_string()
    } else {
        capital(demographics.trim())
    }
}

/// Joins items as `A, B and C`.
pub(crate) fn join(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn capital(text: &str) -> String {
    crate::engine::capitalise(text)
}

fn lower_first(text: &str) -> String {
    crate::engine::decapitalise(text)
}
