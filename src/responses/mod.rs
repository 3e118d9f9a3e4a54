pub mod errors;
pub mod json;

pub use errors::error_to_response;
pub use json::{json_response, ok_json};
