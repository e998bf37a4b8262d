//! Loop execution: the orchestrator and the external test harness.

pub mod correction;
pub mod testrun;

pub use correction::{CorrectionLoop, LoopError, Workspace};
pub use testrun::{CommandRunner, HarnessError, RoundOutcome, RunnerConfig, TestHarness};
