mod ids;
mod question;
mod result;
mod selection;
mod session;
mod settings;

pub use ids::QuestionId;
pub use question::{
    FALSE_LABEL, Question, QuestionBank, QuestionError, QuestionKind, TRUE_FALSE_LABELS,
    TRUE_LABEL,
};
pub use result::{ResultRecord, ResultsHistory};
pub use selection::{SelectionEntry, SelectionError};
pub use session::{AnswerError, SessionState, SessionStatus, TickOutcome};
pub use settings::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_SAMPLE_SIZE, DEFAULT_TOTAL_SECONDS,
    DEFAULT_WARNING_MINUTES, QuizSettings, QuizSettingsDraft, SettingsError,
};
