//! Pipeline stage state machine

use serde::{Deserialize, Serialize};

/// Named step of the registration pipeline
///
/// Wire form is the variant name (`"Uploading"`), which is also what terminal
/// error events report as the stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Received,
    Normalizing,
    Validating,
    Incomplete,
    Enriching,
    Uploading,
    Registering,
    Complete,
    Failed,
}

impl Stage {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Incomplete | Stage::Complete | Stage::Failed)
    }

    /// Check whether `self -> next` is an allowed transition
    ///
    /// `Failed` is reachable from every non-terminal stage.
    pub fn can_transition_to(&self, next: Stage) -> bool {
        use Stage::*;
        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Received, Normalizing)
                | (Normalizing, Validating)
                | (Validating, Incomplete)
                | (Validating, Enriching)
                | (Enriching, Uploading)
                | (Uploading, Registering)
                | (Registering, Complete)
        )
    }

    /// Progress checkpoint reported when the stage is entered
    ///
    /// Terminal stages all report 100 so the sequence never decreases.
    pub fn percentage(&self) -> u8 {
        match self {
            Stage::Received => 5,
            Stage::Normalizing => 15,
            Stage::Validating => 25,
            Stage::Enriching => 35,
            Stage::Uploading => 55,
            Stage::Registering => 75,
            Stage::Incomplete | Stage::Complete | Stage::Failed => 100,
        }
    }

    /// Whether a caller-initiated cancel can still stop the pipeline
    ///
    /// Once uploading starts, external side effects may already exist.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            Stage::Received | Stage::Normalizing | Stage::Validating | Stage::Enriching
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "Received",
            Stage::Normalizing => "Normalizing",
            Stage::Validating => "Validating",
            Stage::Incomplete => "Incomplete",
            Stage::Enriching => "Enriching",
            Stage::Uploading => "Uploading",
            Stage::Registering => "Registering",
            Stage::Complete => "Complete",
            Stage::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
