use serde::{Deserialize, Serialize};

/// The six wizard stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Consent,
    DateTime,
    Narrative,
    Involved,
    Evidence,
    Review,
}

/// What must hold before the wizard may leave a step going forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceGuard {
    /// The step's own validator must report no errors.
    Validate,
    /// Validate, then generate the report; the edge is only taken if generation succeeds.
    ValidateAndGenerate,
}

/// Forward edge out of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceEdge {
    pub from: WizardStep,
    pub to: WizardStep,
    pub guard: AdvanceGuard,
}

const ADVANCE_EDGES: [AdvanceEdge; 5] = [
    AdvanceEdge {
        from: WizardStep::Consent,
        to: WizardStep::DateTime,
        guard: AdvanceGuard::Validate,
    },
    AdvanceEdge {
        from: WizardStep::DateTime,
        to: WizardStep::Narrative,
        guard: AdvanceGuard::Validate,
    },
    AdvanceEdge {
        from: WizardStep::Narrative,
        to: WizardStep::Involved,
        guard: AdvanceGuard::Validate,
    },
    AdvanceEdge {
        from: WizardStep::Involved,
        to: WizardStep::Evidence,
        guard: AdvanceGuard::Validate,
    },
    AdvanceEdge {
        from: WizardStep::Evidence,
        to: WizardStep::Review,
        guard: AdvanceGuard::ValidateAndGenerate,
    },
];

impl WizardStep {
    pub const FIRST: Self = Self::Consent;
    pub const LAST: Self = Self::Review;

    pub const fn ordered() -> [Self; 6] {
        [
            Self::Consent,
            Self::DateTime,
            Self::Narrative,
            Self::Involved,
            Self::Evidence,
            Self::Review,
        ]
    }

    /// 1-based position shown in the progress indicator.
    pub const fn number(self) -> u8 {
        match self {
            Self::Consent => 1,
            Self::DateTime => 2,
            Self::Narrative => 3,
            Self::Involved => 4,
            Self::Evidence => 5,
            Self::Review => 6,
        }
    }

    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Consent),
            2 => Some(Self::DateTime),
            3 => Some(Self::Narrative),
            4 => Some(Self::Involved),
            5 => Some(Self::Evidence),
            6 => Some(Self::Review),
            _ => None,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Consent => "Consent",
            Self::DateTime => "Date & Time",
            Self::Narrative => "What Happened",
            Self::Involved => "Who Was Involved",
            Self::Evidence => "Location & Evidence",
            Self::Review => "Review & Export",
        }
    }

    /// Icon identifier from the front end's icon set.
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Consent => "shield-check",
            Self::DateTime => "clock",
            Self::Narrative => "file-text",
            Self::Involved => "users",
            Self::Evidence => "map-pin",
            Self::Review => "check-square",
        }
    }

    /// Front-end component rendered for the step.
    pub const fn component(self) -> &'static str {
        match self {
            Self::Consent => "consent_form",
            Self::DateTime => "date_time_form",
            Self::Narrative => "narrative_form",
            Self::Involved => "involved_parties_form",
            Self::Evidence => "evidence_form",
            Self::Review => "review_export",
        }
    }

    pub fn advance_edge(self) -> Option<AdvanceEdge> {
        ADVANCE_EDGES.iter().copied().find(|edge| edge.from == self)
    }

    /// Backward moves are unguarded.
    pub fn previous(self) -> Option<Self> {
        ADVANCE_EDGES
            .iter()
            .find(|edge| edge.to == self)
            .map(|edge| edge.from)
    }

    /// Steps strictly before `self`, in order.
    pub fn preceding(self) -> impl Iterator<Item = WizardStep> {
        Self::ordered()
            .into_iter()
            .take_while(move |step| *step < self)
    }
}

/// Static registry entry for a step, as served to front ends.
#[derive(Debug, Clone, Serialize)]
pub struct StepDescriptor {
    pub number: u8,
    pub step: WizardStep,
    pub title: &'static str,
    pub icon: &'static str,
    pub component: &'static str,
}

pub fn step_registry() -> Vec<StepDescriptor> {
    WizardStep::ordered()
        .into_iter()
        .map(|step| StepDescriptor {
            number: step.number(),
            step,
            title: step.title(),
            icon: step.icon(),
            component: step.component(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_round_trip_for_every_step() {
        for step in WizardStep::ordered() {
            assert_eq!(WizardStep::from_number(step.number()), Some(step));
        }
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(7), None);
    }

    #[test]
    fn only_leaving_evidence_generates() {
        let generating: Vec<_> = WizardStep::ordered()
            .into_iter()
            .filter_map(WizardStep::advance_edge)
            .filter(|edge| edge.guard == AdvanceGuard::ValidateAndGenerate)
            .collect();
        assert_eq!(generating.len(), 1);
        assert_eq!(generating[0].from, WizardStep::Evidence);
        assert_eq!(generating[0].to, WizardStep::Review);
    }

    #[test]
    fn review_is_terminal_and_consent_has_no_previous() {
        assert!(WizardStep::Review.advance_edge().is_none());
        assert!(WizardStep::Consent.previous().is_none());
        assert_eq!(WizardStep::Review.previous(), Some(WizardStep::Evidence));
    }

    #[test]
    fn edges_connect_consecutive_numbers() {
        for step in WizardStep::ordered() {
            if let Some(edge) = step.advance_edge() {
                assert_eq!(edge.to.number(), step.number() + 1);
            }
        }
    }

    #[test]
    fn preceding_lists_earlier_steps() {
        let before: Vec<_> = WizardStep::Narrative.preceding().collect();
        assert_eq!(before, vec![WizardStep::Consent, WizardStep::DateTime]);
        assert_eq!(WizardStep::Consent.preceding().count(), 0);
    }

    #[test]
    fn registry_lists_six_titled_steps() {
        let registry = step_registry();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry[0].title, "Consent");
        assert_eq!(registry[5].title, "Review & Export");
    }
}
