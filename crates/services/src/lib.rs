pub use quiz_core::Clock;

pub mod app_services;
pub mod error;
pub mod quiz;

pub use app_services::QuizServices;
pub use error::{QuizError, QuizServicesError};
pub use quiz::{
    CountdownTimer, QuizSession, ResultsHistoryService, ReviewItem, Sampler, TickReport,
    TimerTick,
};
