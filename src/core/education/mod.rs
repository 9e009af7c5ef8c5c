//! Curriculum, canned tutor and progress tracking

pub mod progress;
pub mod subjects;
pub mod tutor;

pub use progress::{LearningProgress, ProgressAnalysis, ProgressTracker};
pub use subjects::{find_subject, learning_objective, subjects, Difficulty, LearningObjective, Subject, Topic};
pub use tutor::{QuestionDifficulty, QuestionRequest, Tutor, TutorResponse};
