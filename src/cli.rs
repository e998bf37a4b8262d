//! CLI definition using clap.

use clap::Parser;
use std::path::PathBuf;

/// Fallback spec when none is given on the command line.
pub const DEFAULT_SPEC: &str = "Write fibonacci(n)";

/// redraft - self-correcting code generation: draft, test, critique, retry
#[derive(Parser, Debug)]
#[command(name = "redraft")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Free-text specification of the code to generate
    pub spec: Option<String>,

    /// Maximum test-and-critique rounds before giving up
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Working directory for generated artifacts (deleted and recreated)
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The spec to build, falling back to the sample
    pub fn spec(&self) -> &str {
        self.spec.as_deref().unwrap_or(DEFAULT_SPEC)
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}
