//! The self-correcting loop: draft code, draft tests once, then repeat
//! run-tests -> critique -> repatch until the tests pass or the round
//! budget is exhausted.
//!
//! State machine:
//! INIT -> DRAFT_CODE -> DRAFT_TESTS -> RUN_TESTS -> (DONE | CRITIQUE -> RUN_TESTS) -> FAILED

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::agents::{RoleAgent, code_writer, critic, test_writer};
use crate::extract::extract;
use crate::llm::{LlmError, ModelClient};

use super::testrun::{HarnessError, RoundOutcome, TestHarness};

/// Cap on failure-output lines fed back to the critic, to keep one noisy
/// test run from flooding the prompt.
const MAX_FEEDBACK_LINES: usize = 200;

/// Errors that can occur during loop execution
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("model error: {0}")]
    Llm(#[from] LlmError),

    #[error("test harness error: {0}")]
    Harness(#[from] HarnessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The round budget ran out with the tests still failing. No partial
    /// artifact is returned.
    #[error("tests still failing after {0} rounds")]
    RoundsExhausted(u32),
}

/// The working directory and its two artifact files. Holds the only
/// on-disk state of a run: one code file and one test file.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
    code_file: String,
    test_file: String,
}

impl Workspace {
    pub fn new(
        dir: impl Into<PathBuf>,
        code_file: impl Into<String>,
        test_file: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            code_file: code_file.into(),
            test_file: test_file.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn code_file(&self) -> &str {
        &self.code_file
    }

    pub fn test_file(&self) -> &str {
        &self.test_file
    }

    pub fn code_path(&self) -> PathBuf {
        self.dir.join(&self.code_file)
    }

    pub fn test_path(&self) -> PathBuf {
        self.dir.join(&self.test_file)
    }

    /// Delete and recreate the working directory. Destructive by design:
    /// anything from a previous run is gone.
    pub fn reset(&self) -> io::Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        fs::create_dir_all(&self.dir)
    }

    /// Persist artifact text: trimmed, with one trailing newline.
    fn persist(path: &Path, text: &str) -> io::Result<()> {
        fs::write(path, format!("{}\n", text.trim()))
    }

    pub fn write_code(&self, text: &str) -> io::Result<()> {
        Self::persist(&self.code_path(), text)
    }

    pub fn write_tests(&self, text: &str) -> io::Result<()> {
        Self::persist(&self.test_path(), text)
    }

    pub fn read_code(&self) -> io::Result<String> {
        fs::read_to_string(self.code_path())
    }
}

/// The orchestrator. Owns the workspace, the three role agents, and the
/// test harness; nothing else holds state across steps.
pub struct CorrectionLoop {
    writer: RoleAgent,
    test_writer: RoleAgent,
    critic: RoleAgent,
    harness: Box<dyn TestHarness>,
    workspace: Workspace,
    max_rounds: u32,
}

impl CorrectionLoop {
    /// Build the loop from a model client, a test harness, and the
    /// workspace layout. The three agents share the one client handle.
    pub fn new(
        client: Arc<dyn ModelClient>,
        harness: Box<dyn TestHarness>,
        workspace: Workspace,
        max_rounds: u32,
    ) -> Self {
        let writer = code_writer(client.clone());
        let tests = test_writer(client.clone(), workspace.code_file(), workspace.test_file());
        let fixer = critic(client, workspace.code_file());

        Self {
            writer,
            test_writer: tests,
            critic: fixer,
            harness,
            workspace,
            max_rounds,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Run the loop for a spec. On success returns the final code text
    /// exactly as written in the passing round; on exhausting the budget
    /// returns `LoopError::RoundsExhausted` and no artifact.
    pub async fn run(&self, spec: &str) -> Result<String, LoopError> {
        log::info!(
            "starting run: max_rounds={}, workdir={}, harness={}",
            self.max_rounds,
            self.workspace.dir().display(),
            self.harness.describe()
        );

        self.workspace.reset()?;

        // Draft the code module.
        let raw_code = self.writer.run(spec).await?;
        self.persist_code(&raw_code, "writer")?;

        // Draft the test module, exactly once per run.
        let tests_task = format!(
            "Write tests for the following code:\n\n{}",
            self.workspace.read_code()?
        );
        let raw_tests = self.test_writer.run(&tests_task).await?;
        let tests = extract(&raw_tests);
        if !tests.fenced {
            log::warn!("test-writer response had no fenced code block, keeping raw text");
        }
        self.workspace.write_tests(&tests.text)?;

        for round in 1..=self.max_rounds {
            let outcome = self.harness.run(self.workspace.dir()).await?;
            log::info!(
                "round {}/{}: passed={} exit_code={:?}",
                round,
                self.max_rounds,
                outcome.passed,
                outcome.exit_code
            );

            if outcome.passed {
                return Ok(self.workspace.read_code()?);
            }

            // The final failing round gets no critique: its patch could
            // never be tested.
            if round == self.max_rounds {
                break;
            }

            let task = critic_task(&outcome, &self.workspace.read_code()?);
            let patch = self.critic.run(&task).await?;
            self.persist_code(&patch, "critic")?;
        }

        Err(LoopError::RoundsExhausted(self.max_rounds))
    }

    /// Extract and persist a code artifact, flagging the raw-text
    /// fallback so prose-as-code is at least observable.
    fn persist_code(&self, response: &str, source: &str) -> Result<(), LoopError> {
        let code = extract(response);
        if !code.fenced {
            log::warn!("{source} response had no fenced code block, keeping raw text");
        }
        self.workspace.write_code(&code.text)?;
        Ok(())
    }
}

/// Assemble the critique task: capped test output plus the current code.
fn critic_task(outcome: &RoundOutcome, code: &str) -> String {
    format!(
        "Tests output:\n```\n{}\n```\n\nCurrent code:\n```python\n{}\n```",
        cap_lines(&outcome.output, MAX_FEEDBACK_LINES),
        code
    )
}

/// Truncate text to a maximum number of lines.
fn cap_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().take(max_lines).collect();
    let mut result = lines.join("\n");
    if text.lines().count() > max_lines {
        result.push_str("\n... (truncated)");
    }
    result
}
