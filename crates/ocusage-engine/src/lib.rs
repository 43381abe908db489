pub mod convert;
pub mod jsonl;

pub use convert::{ConvertOptions, Conversion, convert_session};
pub use jsonl::to_jsonl;
