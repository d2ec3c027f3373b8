pub mod classroom;
pub mod session;
pub mod weekly_schedule;

pub use classroom::{Classroom, ClassroomIntegration};
pub use session::{SessionPatch, SessionRow};
pub use weekly_schedule::WeeklyScheduleRow;
