//! Port for running an external program to completion.

use crate::domain::entities::ImportResult;
use crate::domain::errors::Result;

/// Runs a program synchronously and captures its exit status and output.
///
/// There is no timeout: the call blocks for as long as the program runs.
pub trait CommandPort: Send + Sync {
    /// Fails only when the program cannot be started. A program that starts
    /// and exits nonzero is reported through `ImportResult::exit_code`.
    fn run(&self, program: &str, args: &[String]) -> Result<ImportResult>;
}
