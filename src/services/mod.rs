pub mod classroom_service;

pub use classroom_service::{ClassroomService, ClassroomServiceError};
