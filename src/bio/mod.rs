pub mod identifier;
pub mod record;
pub mod sample_input;

pub use record::InputRecord;
pub use sample_input::{parse, render, ParseOptions, ParseReport};
