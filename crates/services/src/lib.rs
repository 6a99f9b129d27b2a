#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod learner;
pub mod mentor;

pub use course_core::Clock;

pub use config::MentorConfig;
pub use error::{ConfigError, LearnerError, MentorError};
pub use learner::{CompletionOutcome, LearnerSession, PendingSubmission, SubmissionOutcome};
pub use mentor::{Mentor, MentorService};
