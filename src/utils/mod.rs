mod format;
mod string;

pub use format::DocumentFormat;
pub use string::{extract_last_segment, join_package, unquote_string};
