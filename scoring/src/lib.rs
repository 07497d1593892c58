pub mod aggregate;
pub mod classify;
pub mod expiration;
pub mod factory;
pub mod normalize;
pub mod platform;
pub mod report;
pub mod rows;
pub mod signatures;
