//! Categorical fields of the structured summary.

closed_enum! {
    /// Clinical status of an active medical problem.
    pub enum ProblemStatus as "status" {
        Controlled => "Controlled",
        Stable => "Stable",
        Worsening => "Worsening",
        Resolved => "Resolved",
        /// Not enough evidence in the record to judge, or still under evaluation.
        Unknown => "Unknown",
    }
}

impl ProblemStatus {
    /// Statuses retained when the caller asks for critical content only.
    pub fn needs_attention(self) -> bool {
        matches!(self, ProblemStatus::Worsening | ProblemStatus::Unknown)
    }
}

closed_enum! {
    /// Priority of an actionable item.
    ///
    /// Variants are declared from least to most pressing so the derived ordering can rank them.
    pub enum Priority as "priority" {
        Routine => "Routine",
        Important => "Important",
        Urgent => "Urgent",
    }
}

impl Priority {
    /// Position used for ranking; higher is more pressing.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Routine => 0,
            Priority::Important => 1,
            Priority::Urgent => 2,
        }
    }
}
