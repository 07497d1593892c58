pub mod error;
pub mod expectation;
pub mod payload;
pub mod signature;
pub mod target;
