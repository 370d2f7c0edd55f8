// Core module: connection state and address types (NO I/O dependencies)
pub mod types;

pub use types::*;
