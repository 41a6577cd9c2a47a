pub mod countdown;
pub mod model;
pub mod scoring;
pub mod time;

pub use time::Clock;
