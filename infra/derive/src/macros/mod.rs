pub mod error;
pub mod slice;
pub mod runtime;
