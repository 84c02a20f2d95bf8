use crate::utils::Step;

pub type Result<T> = std::result::Result<T, HyperPlayError>;

/// Failures that leave the sampler. Dead ends inside a single forward step are not
/// errors; the sampler reports them through the step it returns.
#[derive(Debug, thiserror::Error)]
pub enum HyperPlayError {
    #[error("game_play called before game_start")]
    NotStarted,

    #[error("no percepts recorded for step {step}")]
    MissingPercepts { step: Step },

    #[error("no own move recorded for step {step}")]
    MissingAction { step: Step },

    #[error("no hypergame consistent with the percepts at step {step}")]
    EmptyBag { step: Step },

    #[error("turn deadline passed while updating beliefs at step {step}")]
    DeadlinePressure { step: Step },

    #[error("oracle fault: {0}")]
    OracleFault(String),

    #[error("no legal move for the agent at step {step}")]
    NoLegalMoves { step: Step },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for HyperPlayError {
    fn from(e: serde_json::Error) -> Self {
        HyperPlayError::Config(e.to_string())
    }
}
