//! Report writers.

mod json;
mod report;
mod text;

pub use self::json::*;
pub use self::report::*;
pub use self::text::*;
