mod entitlement;
mod ids;
mod lesson;
mod progress;

pub use entitlement::Entitlement;
pub use ids::{LessonId, ParseIdError};
pub use lesson::{LessonDefinition, Week, WeekError};
pub use progress::{LessonProgress, LessonStatus, ProgressInvariantError, ProgressStore};
