//! Posture Core
//!
//! Core types, the plugin contract, and error handling for the posture evaluator.

pub mod config;
pub mod error;
pub mod event;
pub mod fanout;
pub mod finding;
pub mod region;
pub mod report;
pub mod traits;

pub use config::*;
pub use error::{ContractViolation, PostureError, Result};
pub use event::*;
pub use fanout::{fan_out, Detection};
pub use finding::*;
pub use region::*;
pub use report::*;
pub use traits::*;
