pub mod extractor;
pub mod parameter_error_handler;
pub mod random_code;
pub mod sql;

pub use extractor::{SafeClassIdI64, SafeStudentIdI64};
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::escape_like_pattern;
