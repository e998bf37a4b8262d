//! Role agents: one parametrized type, three instructions.
//!
//! An agent pairs a fixed system instruction with a shared model client.
//! Every call is a fresh single-turn exchange; nothing is remembered
//! between invocations.

use std::path::Path;
use std::sync::Arc;

use crate::llm::{CompletionRequest, LlmError, ModelClient};

/// A stateless wrapper pairing a fixed instruction with a model handle.
pub struct RoleAgent {
    name: String,
    instruction: String,
    client: Arc<dyn ModelClient>,
}

impl RoleAgent {
    pub fn new(
        name: impl Into<String>,
        instruction: impl Into<String>,
        client: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Produce response text for a task prompt.
    pub async fn run(&self, task: &str) -> Result<String, LlmError> {
        log::debug!("agent {}: sending {} char task", self.name, task.len());

        let request = CompletionRequest::new(&self.instruction).with_user_message(task);
        let response = self.client.complete(request).await?;

        log::debug!(
            "agent {}: received {} chars",
            self.name,
            response.content.len()
        );
        Ok(response.content.trim().to_string())
    }
}

impl std::fmt::Debug for RoleAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAgent").field("name", &self.name).finish()
    }
}

/// The writer drafts the initial code module from the user's spec.
pub fn code_writer(client: Arc<dyn ModelClient>) -> RoleAgent {
    RoleAgent::new(
        "code-writer",
        "You are CodeWriter, an expert Python engineer. Return the full contents \
         of a single Python module that fulfils the spec. Do NOT write tests and \
         do NOT call open(); output only the code text.",
        client,
    )
}

/// The test writer drafts the test module once per run, from the current
/// code artifact. Instructions name the real files so imports line up.
pub fn test_writer(client: Arc<dyn ModelClient>, code_file: &str, test_file: &str) -> RoleAgent {
    let module = module_name(code_file);
    RoleAgent::new(
        "test-writer",
        format!(
            "You are TestWriter. Write pytest unit tests for the code under test. \
             Use assert statements only, no print. Place the tests in a file named \
             {test_file}. Import the code under test via `from {module} import *`."
        ),
        client,
    )
}

/// The critic turns failing test output plus current code into a complete
/// replacement module.
pub fn critic(client: Arc<dyn ModelClient>, code_file: &str) -> RoleAgent {
    RoleAgent::new(
        "critic",
        format!(
            "You are CodeCritic. Given failing test output and the current code, \
             return a complete replacement for {code_file} that fixes the bug. \
             Add explanations only as inline comments."
        ),
        client,
    )
}

/// Import-name of a module file: the stem of its file name.
fn module_name(code_file: &str) -> String {
    Path::new(code_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(code_file)
        .to_string()
}
