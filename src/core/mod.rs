// Core modules implementing the record model, persistence, queries, and errors.
pub mod codec;
pub mod error;
pub mod query;
pub mod store;
