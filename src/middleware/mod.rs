pub mod json_body;
pub mod response;

pub use json_body::JsonBody;
pub use response::{ApiResponse, ApiResult};
