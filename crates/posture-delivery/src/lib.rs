//! Batch delivery for the posture evaluator
//!
//! Every batch goes to two independent sinks: the structured security-report
//! ingestion service (gRPC) and, when enabled, the HTTP logs endpoint. A
//! failing sink is logged and reported; it never stops the run or the other
//! sink.

mod channel;
mod ingestion;
mod logs;
pub mod proto;
mod sink;

pub use channel::*;
pub use ingestion::*;
pub use logs::*;
pub use sink::*;
