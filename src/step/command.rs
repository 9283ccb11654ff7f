use super::{ExternalStep, ProcessError, StepOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Program plus leading arguments; the experiment path is appended at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl StepCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits a command line on whitespace. No shell quoting is interpreted.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| "command must not be empty".to_string())?;
        Ok(Self::new(program, parts))
    }
}

impl TryFrom<String> for StepCommand {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StepCommand> for String {
    fn from(command: StepCommand) -> Self {
        command.to_string()
    }
}

impl fmt::Display for StepCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs an external program as a child process.
///
/// Stdout is discarded, stderr goes to the terminal and stdin is closed.
pub struct CommandStep {
    name: String,
    command: StepCommand,
    timeout: Option<Duration>,
}

impl CommandStep {
    pub fn new(name: impl Into<String>, command: StepCommand) -> Self {
        Self {
            name: name.into(),
            command,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ExternalStep for CommandStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, path: &Path) -> Result<StepOutcome, ProcessError> {
        let program = self.command.program.clone();
        let start = Instant::now();

        debug!(
            step = %self.name,
            command = %self.command,
            path = %path.display(),
            "Spawning step"
        );

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;

        let status = match self.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, child.wait()).await;
                match waited {
                    Ok(status) => status,
                    Err(_) => {
                        // Best effort: the child may already be gone.
                        let _ = child.kill().await;
                        return Err(ProcessError::Timeout {
                            program,
                            seconds: limit.as_secs(),
                        });
                    }
                }
            }
            None => child.wait().await,
        }
        .map_err(|source| ProcessError::Wait {
            program: program.clone(),
            source,
        })?;

        let duration = start.elapsed();
        match status.code() {
            Some(0) => Ok(StepOutcome {
                exit_code: 0,
                duration,
            }),
            Some(code) => Err(ProcessError::ExitStatus { program, code }),
            None => Err(ProcessError::Terminated { program }),
        }
    }
}
