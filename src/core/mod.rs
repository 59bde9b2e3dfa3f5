pub mod cache;
pub mod engine;
pub mod error;
pub mod hash;
pub mod store;
pub mod types;
