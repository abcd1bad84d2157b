//! Infrastructure adapter that runs external programs with `std::process`.

use crate::domain::entities::ImportResult;
use crate::domain::errors::Result;
use crate::ports::command_port::CommandPort;
use log::debug;
use std::process::{Command, Stdio};

/// Runs a program to completion, capturing exit code, stdout and stderr.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandPort for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<ImportResult> {
        debug!("Spawning {} with {} argument(s)", program, args.len());
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(ImportResult {
            // A signal-terminated process has no code; treat it as a failure.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
