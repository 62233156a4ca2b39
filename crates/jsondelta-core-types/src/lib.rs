//! Core types shared by the jsondelta engine and its logging facility
//!
//! - **Correlation types**: RunId, one per differ run
//! - **Schema constants**: canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::RunId;
