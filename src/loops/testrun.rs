//! External test runner behind a trait seam.
//!
//! A failing or timed-out test command is a normal RoundOutcome, not an
//! error; only failing to spawn the command at all is an error. The trait
//! exists so the orchestrator can be unit-tested with an in-process fake.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Errors from test harness operations
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to run test command: {0}")]
    CommandStart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for the command-based test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Shell command to run (e.g., "pytest -q")
    pub command: String,

    /// Timeout for one test run
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: "pytest -q".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl RunnerConfig {
    /// Create a new config with the given command
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of one test run: pass/fail plus the combined output blob that
/// feeds the critic on failure.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    /// Whether the test command exited successfully
    pub passed: bool,

    /// Combined stdout and stderr
    pub output: String,

    /// Exit code of the test command
    pub exit_code: Option<i32>,

    /// Whether the command timed out
    pub timed_out: bool,
}

impl RoundOutcome {
    /// Outcome for a timed-out run
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            passed: false,
            output: format!("test command timed out after {:?}", timeout),
            exit_code: None,
            timed_out: true,
        }
    }
}

/// Something that can run the test artifact against the code artifact in
/// a working directory and report the outcome.
#[async_trait]
pub trait TestHarness: Send + Sync {
    /// Run the tests in the given working directory
    async fn run(&self, working_dir: &Path) -> Result<RoundOutcome, HarnessError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Harness that runs a shell command in the working directory
pub struct CommandRunner {
    config: RunnerConfig,
}

impl CommandRunner {
    /// Create a new runner with the given config
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Get the test command
    pub fn command(&self) -> &str {
        &self.config.command
    }
}

#[async_trait]
impl TestHarness for CommandRunner {
    async fn run(&self, working_dir: &Path) -> Result<RoundOutcome, HarnessError> {
        let output = tokio::time::timeout(
            self.config.timeout,
            Command::new("sh")
                .args(["-c", &self.config.command])
                .current_dir(working_dir)
                .output(),
        )
        .await;

        match output {
            Ok(Ok(output)) => {
                let exit_code = output.status.code();
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);

                Ok(RoundOutcome {
                    passed: output.status.success(),
                    output: format!("{}{}", stdout, stderr),
                    exit_code,
                    timed_out: false,
                })
            }
            Ok(Err(e)) => Err(HarnessError::CommandStart(e.to_string())),
            Err(_) => Ok(RoundOutcome::timeout(self.config.timeout)),
        }
    }

    fn describe(&self) -> String {
        self.config.command.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_success() {
        let temp = TempDir::new().unwrap();
        let runner = CommandRunner::new(RunnerConfig::new("true"));

        let outcome = runner.run(temp.path()).await.unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.exit_code, Some(0));
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn test_run_failure() {
        let temp = TempDir::new().unwrap();
        let runner = CommandRunner::new(RunnerConfig::new("false"));

        let outcome = runner.run(temp.path()).await.unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_output_combines_stdout_and_stderr() {
        let temp = TempDir::new().unwrap();
        let runner =
            CommandRunner::new(RunnerConfig::new("echo 'on stdout' && echo 'on stderr' >&2 && exit 1"));

        let outcome = runner.run(temp.path()).await.unwrap();
        assert!(!outcome.passed);
        assert!(outcome.output.contains("on stdout"));
        assert!(outcome.output.contains("on stderr"));
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "present").unwrap();
        let runner = CommandRunner::new(RunnerConfig::new("test -f marker.txt"));

        let outcome = runner.run(temp.path()).await.unwrap();
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn test_timeout() {
        let temp = TempDir::new().unwrap();
        let runner = CommandRunner::new(
            RunnerConfig::new("sleep 10").with_timeout(Duration::from_millis(100)),
        );

        let outcome = runner.run(temp.path()).await.unwrap();
        assert!(!outcome.passed);
        assert!(outcome.timed_out);
        assert!(outcome.output.contains("timed out"));
    }

    #[tokio::test]
    async fn test_unknown_command_is_failed_outcome() {
        // sh itself starts fine and exits 127; that is a failed round,
        // not a harness error.
        let temp = TempDir::new().unwrap();
        let runner = CommandRunner::new(RunnerConfig::new("nonexistent_command_xyz123"));

        let outcome = runner.run(temp.path()).await.unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.exit_code, Some(127));
    }

    #[test]
    fn test_runner_config_default() {
        let config = RunnerConfig::default();
        assert_eq!(config.command, "pytest -q");
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_runner_config_builder() {
        let config = RunnerConfig::new("python -m pytest").with_timeout(Duration::from_secs(30));
        assert_eq!(config.command, "python -m pytest");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_round_outcome_timeout() {
        let outcome = RoundOutcome::timeout(Duration::from_secs(60));
        assert!(!outcome.passed);
        assert!(outcome.timed_out);
        assert!(outcome.exit_code.is_none());
    }

    #[test]
    fn test_describe() {
        let runner = CommandRunner::new(RunnerConfig::new("pytest -q"));
        assert_eq!(runner.describe(), "pytest -q");
        assert_eq!(runner.command(), "pytest -q");
    }
}
