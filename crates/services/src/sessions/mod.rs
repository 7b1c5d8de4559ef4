mod history;
mod phase;
mod progress;
mod sampler;
mod tracker;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use history::{AttemptHistoryService, AttemptListItem};
pub use phase::{SessionEvent, SessionPhase};
pub use progress::SessionProgress;
pub use sampler::QuestionSampler;
pub use tracker::{AdvanceOutcome, QuizSession};
pub use workflow::{AdvanceResult, QuizLoopService};
