// Buffer module: try-lock queue primitives shared by caller and workers
pub mod staged;

pub use staged::*;
