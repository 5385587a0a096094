pub mod associations;
pub mod classifier;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod hasher;
pub mod history;
pub mod progress;
pub mod runlog;
pub mod scanner;
pub mod scoring;
pub mod text;

pub use config::AppConfig;
pub use engine::{Explanation, SortEngine, SortReport};
pub use error::Error;
pub use progress::{CancelToken, Outcome, ProgressReporter, SilentReporter};
