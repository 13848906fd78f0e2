use serde::{Deserialize, Serialize};

/// One of the four breathing phases, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
    Rest,
}

/// Label shown when no session is running.
pub const READY_LABEL: &str = "Ready";

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Inhale, Phase::Hold, Phase::Exhale, Phase::Rest];

    pub fn index(self) -> usize {
        match self {
            Phase::Inhale => 0,
            Phase::Hold => 1,
            Phase::Exhale => 2,
            Phase::Rest => 3,
        }
    }

    /// Phase at `index`, wrapping modulo 4.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Cyclic successor: Rest wraps back to Inhale.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Text shown to the user while in this phase.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe In",
            Phase::Hold => "Hold",
            Phase::Exhale => "Breathe Out",
            Phase::Rest => "Rest",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_wraps_after_rest() {
        assert_eq!(Phase::Inhale.next(), Phase::Hold);
        assert_eq!(Phase::Exhale.next(), Phase::Rest);
        assert_eq!(Phase::Rest.next(), Phase::Inhale);
    }

    #[test]
    fn index_roundtrips() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_index(phase.index()), phase);
        }
        assert_eq!(Phase::from_index(5), Phase::Hold);
    }

    #[test]
    fn labels_match_display() {
        assert_eq!(Phase::Inhale.to_string(), "Breathe In");
        assert_eq!(Phase::Exhale.to_string(), "Breathe Out");
    }
}
