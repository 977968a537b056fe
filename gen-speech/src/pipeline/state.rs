use std::fmt;

/// Pipeline step a job was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Extracting,
    Normalizing,
    Chunking,
    Synthesizing,
    Merging,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Pending => "pending",
            Stage::Extracting => "extracting",
            Stage::Normalizing => "normalizing",
            Stage::Chunking => "chunking",
            Stage::Synthesizing => "synthesizing",
            Stage::Merging => "merging",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a synthesis job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Pending,
    Extracting,
    Normalizing,
    Chunking,
    /// `current` chunks of `total` are done
    Synthesizing { current: usize, total: usize },
    Merging,
    Done,
    Failed { stage: Stage, message: String },
}

impl JobState {
    /// The step this state belongs to, None once the job has finished.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            JobState::Pending => Some(Stage::Pending),
            JobState::Extracting => Some(Stage::Extracting),
            JobState::Normalizing => Some(Stage::Normalizing),
            JobState::Chunking => Some(Stage::Chunking),
            JobState::Synthesizing { .. } => Some(Stage::Synthesizing),
            JobState::Merging => Some(Stage::Merging),
            JobState::Done | JobState::Failed { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed { .. })
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Synthesizing { current, total } => {
                write!(f, "synthesizing ({}/{})", current, total)
            }
            JobState::Done => f.write_str("done"),
            JobState::Failed { stage, message } => write!(f, "failed while {}: {}", stage, message),
            other => match other.stage() {
                Some(stage) => write!(f, "{}", stage),
                None => Ok(()),
            },
        }
    }
}
