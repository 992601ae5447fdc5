//! Prompt text for the remote generator.

use super::NarrativeRequest;
use crate::{SummaryError, SummaryResult};
use summary_types::{Audience, SummaryLength};

const SYSTEM_PROMPT: &str = r#"You write the overview paragraph of a clinical summary.

RULES:
1. Use only the facts given between <facts> tags. Never add diagnoses, values or advice.
2. Mention every critical finding count and every worsening problem that is given.
3. Write plain prose: no headings, no lists, no markdown.
4. Answer with the paragraph only."#;

pub(super) fn system_prompt(audience: Audience, length: SummaryLength) -> String {
    let voice = match audience {
        Audience::Physician => "Write for a physician, using standard clinical terminology.",
        Audience::Specialist => {
            "Write for a specialist colleague, using precise clinical terminology."
        }
        Audience::Nurse => "Write for a nurse, framing the content as tasks and things to monitor.",
        Audience::Patient => {
            "Write for the patient in the second person, in plain language, explaining any \
             medical term you use."
        }
    };
    let size = match length {
        SummaryLength::Brief => "Use one or two sentences.",
        SummaryLength::Standard => "Use three to four sentences.",
        SummaryLength::Comprehensive => "Use up to six sentences and include the counts given.",
    };
    format!("{SYSTEM_PROMPT}\n\n{voice}\n{size}")
}

pub(super) fn user_prompt(request: &NarrativeRequest) -> SummaryResult<String> {
    let facts = serde_json::to_string_pretty(request).map_err(|e| {
        SummaryError::GenerationUnavailable(format!("failed to serialise narrative request: {e}"))
    })?;
    Ok(format!("<facts>\n{facts}\n</facts>\n\nWrite the overview paragraph."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_follows_audience_and_length() {
        let prompt = system_prompt(Audience::Patient, SummaryLength::Brief);
        assert!(prompt.contains("second person"));
        assert!(prompt.contains("one or two sentences"));
    }

    #[test]
    fn test_user_prompt_wraps_facts() {
        let request = NarrativeRequest {
            demographics: "65-year-old male".into(),
            ..NarrativeRequest::default()
        };
        let prompt = user_prompt(&request).expect("prompt");
        assert!(prompt.starts_with("<facts>"));
        assert!(prompt.contains("\"demographics\": \"65-year-old male\""));
        assert!(!prompt.contains("seed"));
    }
}
