//! Monitor module: the check pipeline, error accounting and scheduling.

mod checker;
mod error_window;
mod report;
mod scheduler;

pub use checker::{CheckError, CheckOutcome, StockChecker};
pub use error_window::ErrorWindow;
pub use report::DailyReporter;
pub use scheduler::Scheduler;
