//! Customization parameters accepted alongside an EHR snapshot.

closed_enum! {
    /// Verbosity of the generated summary. Never changes which facts are selected.
    pub enum SummaryLength as "length" {
        Brief => "Brief",
        Standard => "Standard",
        Comprehensive => "Comprehensive",
    }
}

impl Default for SummaryLength {
    fn default() -> Self {
        Self::Standard
    }
}

closed_enum! {
    /// Window applied to dated clinical findings.
    pub enum TimeFrame as "time_frame" {
        LastEncounter => "Last encounter",
        Last30Days => "Last 30 days",
        Last6Months => "Last 6 months",
        CompleteHistory => "Complete history",
    }
}

impl TimeFrame {
    /// Oldest age in days a finding may have and still fall inside the window.
    ///
    /// `None` means unbounded. Windows are nested: each variant admits a superset of the ages
    /// admitted by the variants declared before it.
    pub fn max_age_days(self) -> Option<u32> {
        match self {
            TimeFrame::LastEncounter => Some(0),
            TimeFrame::Last30Days => Some(30),
            TimeFrame::Last6Months => Some(183),
            TimeFrame::CompleteHistory => None,
        }
    }

    /// Returns true if a fact recorded `age_days` ago falls inside this window.
    pub fn admits(self, age_days: u32) -> bool {
        self.max_age_days().map_or(true, |max| age_days <= max)
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self::Last30Days
    }
}

closed_enum! {
    /// Clinical specialty lens used to order facts.
    pub enum FocusArea as "focus_area" {
        General => "General",
        Cardiology => "Cardiology",
        Oncology => "Oncology",
        PrimaryCare => "Primary Care",
    }
}

impl Default for FocusArea {
    fn default() -> Self {
        Self::General
    }
}

closed_enum! {
    /// Reader of the summary; drives vocabulary and framing only.
    pub enum Audience as "audience" {
        Physician => "Physician",
        Nurse => "Nurse",
        Specialist => "Specialist",
        Patient => "Patient",
    }
}

impl Audience {
    /// Physicians and specialists read clinical terminology unchanged.
    pub fn is_clinician(self) -> bool {
        matches!(self, Audience::Physician | Audience::Specialist)
    }
}

impl Default for Audience {
    fn default() -> Self {
        Self::Physician
    }
}

closed_enum! {
    /// Hard inclusion filter on problems and actionable items.
    pub enum UrgencyLevel as "urgency_level" {
        CriticalOnly => "Critical only",
        Standard => "Standard",
    }
}

impl Default for UrgencyLevel {
    fn default() -> Self {
        Self::Standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EnumParseError;

    #[test]
    fn test_defaults_match_documented_values() {
        assert_eq!(SummaryLength::default().as_str(), "Standard");
        assert_eq!(TimeFrame::default().as_str(), "Last 30 days");
        assert_eq!(FocusArea::default().as_str(), "General");
        assert_eq!(Audience::default().as_str(), "Physician");
        assert_eq!(UrgencyLevel::default().as_str(), "Standard");
    }

    #[test]
    fn test_from_str_accepts_every_declared_value() {
        for value in TimeFrame::VALUES {
            let parsed: TimeFrame = value.parse().expect("declared value should parse");
            assert_eq!(parsed.as_str(), *value);
        }
        for value in FocusArea::VALUES {
            assert!(value.parse::<FocusArea>().is_ok());
        }
    }

    #[test]
    fn test_from_str_is_exact_match() {
        let err = "brief".parse::<SummaryLength>().expect_err("lowercase must be rejected");
        assert_eq!(
            err,
            EnumParseError {
                field: "length",
                value: "brief".into(),
                allowed: SummaryLength::VALUES,
            }
        );

        assert!("Critical Only".parse::<UrgencyLevel>().is_err());
        assert!(" Nurse".parse::<Audience>().is_err());
        assert!("Last 7 days".parse::<TimeFrame>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_text() {
        let json = serde_json::to_string(&TimeFrame::LastEncounter).expect("serialize");
        assert_eq!(json, "\"Last encounter\"");

        let focus: FocusArea = serde_json::from_str("\"Primary Care\"").expect("deserialize");
        assert_eq!(focus, FocusArea::PrimaryCare);

        assert!(serde_json::from_str::<UrgencyLevel>("\"critical only\"").is_err());
    }

    #[test]
    fn test_time_frame_windows_are_nested() {
        for age in [0, 1, 30, 31, 183, 184, 5000] {
            for pair in TimeFrame::ALL.windows(2) {
                if pair[0].admits(age) {
                    assert!(pair[1].admits(age), "{:?} admits {age} but {:?} does not", pair[0], pair[1]);
                }
            }
        }
        assert!(TimeFrame::LastEncounter.admits(0));
        assert!(!TimeFrame::LastEncounter.admits(1));
        assert!(TimeFrame::CompleteHistory.admits(u32::MAX));
    }
}
