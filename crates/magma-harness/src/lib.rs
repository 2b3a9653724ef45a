//! Conformance harness: runs the literal end-to-end scenarios a client
//! binding must satisfy against an in-process mock node.

mod mock_node;
pub mod report;
pub mod scenario;

pub use report::ConformanceReport;
pub use scenario::{run_all, ScenarioResult};
