mod history;
mod review;
mod sampler;
mod session;
mod timer;

pub use history::ResultsHistoryService;
pub use review::{ReviewItem, export_text, review_items};
pub use sampler::Sampler;
pub use session::{QuizSession, TickReport};
pub use timer::{CountdownTimer, TimerTick};
