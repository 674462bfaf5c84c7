//! Purpose: Shared library crate used by the `pointbase` CLI and tests.
//! Exports: `api` (stable surface), `core` (store, codec, query, errors), `propnames`.
//! Role: Flat-file record stores for schema-less data points in human-readable JSON.
//! Invariants: Stores are single-process, single-threaded; persistence is explicit.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub mod propnames;
