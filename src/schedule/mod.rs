pub mod error;
pub mod expander;
pub mod range;
pub mod types;
pub mod validate;

pub use error::ScheduleError;
pub use expander::SessionExpander;
pub use range::DateRange;
pub use types::*;
pub use validate::{validate_schedules, ValidationRules};
