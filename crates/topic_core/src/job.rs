use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type JobId = u64;

/// A job lane. At most one job runs per slot at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Preprocess,
    Modeling,
    Visualization,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Preprocess, Slot::Modeling, Slot::Visualization];

    pub fn name(self) -> &'static str {
        match self {
            Slot::Preprocess => "preprocess",
            Slot::Modeling => "modeling",
            Slot::Visualization => "visualization",
        }
    }

    /// Whether jobs in this slot run the topic model and need its parameters.
    pub fn needs_model(self) -> bool {
        !matches!(self, Slot::Preprocess)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preprocess" | "pre" => Ok(Slot::Preprocess),
            "modeling" | "model" | "train" => Ok(Slot::Modeling),
            "visualization" | "viz" | "charts" => Ok(Slot::Visualization),
            other => Err(format!("unknown slot '{other}'")),
        }
    }
}

/// The screens of the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Preprocess,
    Modeling,
    Visualization,
    Settings,
}

impl Screen {
    pub const ALL: [Screen; 4] = [
        Screen::Preprocess,
        Screen::Modeling,
        Screen::Visualization,
        Screen::Settings,
    ];

    /// The job slot shown on this screen, if any.
    pub fn slot(self) -> Option<Slot> {
        match self {
            Screen::Preprocess => Some(Slot::Preprocess),
            Screen::Modeling => Some(Slot::Modeling),
            Screen::Visualization => Some(Slot::Visualization),
            Screen::Settings => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Preprocess => "Preprocess",
            Screen::Modeling => "Modeling",
            Screen::Visualization => "Visualization",
            Screen::Settings => "Settings",
        }
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "settings" | "config" => Ok(Screen::Settings),
            other => other
                .parse::<Slot>()
                .map(|slot| match slot {
                    Slot::Preprocess => Screen::Preprocess,
                    Slot::Modeling => Screen::Modeling,
                    Slot::Visualization => Screen::Visualization,
                })
                .map_err(|_| format!("unknown screen '{other}'")),
        }
    }
}

/// Lifecycle status of one job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Validating,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunState {
    /// A slot in an active state rejects new submissions.
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Validating | RunState::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::Failed | RunState::Cancelled
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            RunState::Idle => "Idle",
            RunState::Validating => "Validating",
            RunState::Running => "Running",
            RunState::Succeeded => "Succeeded",
            RunState::Failed => "Failed",
            RunState::Cancelled => "Cancelled",
        }
    }
}
