pub mod writer;

pub use writer::{NamingPolicy, ResultWriter};
