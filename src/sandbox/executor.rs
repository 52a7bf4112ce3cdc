use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::GradeError;
use crate::session::Instance;

use super::CommandDescriptor;

pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

/// Exit status plus the not yet consumed output of a remote command
pub struct CommandOutput {
    pub status: i32,
    pub stream: OutputStream,
}

/// Fully drained output of a remote command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: i32,
    pub text: String,
}

/// Dispatches commands into a sandboxed instance
///
/// An `Err` means the command could not be dispatched or its result could not
/// be collected. A command that ran and exited non-zero is still `Ok`.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs a command whose output nobody reads
    async fn exec(&self, instance: &Instance, command: &CommandDescriptor) -> Result<i32>;

    /// Runs a command and hands back its combined stdout and stderr
    async fn exec_output(
        &self,
        instance: &Instance,
        command: &CommandDescriptor,
    ) -> Result<CommandOutput>;
}

/// Runs commands against one resolved instance and maps failures onto
/// [`GradeError`]
pub struct Invoker<'a> {
    executor: &'a dyn Executor,
    instance: &'a Instance,
}

impl<'a> Invoker<'a> {
    pub fn new(executor: &'a dyn Executor, instance: &'a Instance) -> Self {
        Self { executor, instance }
    }

    pub fn instance(&self) -> &Instance {
        self.instance
    }

    pub async fn run_for_status(&self, command: &CommandDescriptor) -> Result<i32, GradeError> {
        match self.executor.exec(self.instance, command).await {
            Ok(status) => {
                if status != 0 {
                    log::warn!(
                        "[{command}] exited with status {status} on instance {}",
                        self.instance.name
                    );
                }
                Ok(status)
            }
            Err(e) => {
                log::error!(
                    "Error executing [{command}] on instance {}: {e:#}",
                    self.instance.name
                );
                Err(GradeError::Internal(e))
            }
        }
    }

    pub async fn run_for_output(
        &self,
        command: &CommandDescriptor,
    ) -> Result<CommandOutput, GradeError> {
        self.executor
            .exec_output(self.instance, command)
            .await
            .map_err(|e| {
                log::error!(
                    "Error executing [{command}] on instance {}: {e:#}",
                    self.instance.name
                );
                GradeError::Internal(e)
            })
    }

    /// Runs a command and reads its output to the end
    ///
    /// The outer error is a dispatch failure. The inner one means the stream
    /// broke while being read; the stream has been dropped by then.
    pub async fn capture(
        &self,
        command: &CommandDescriptor,
    ) -> Result<Result<CapturedOutput, anyhow::Error>, GradeError> {
        let output = self.run_for_output(command).await?;
        let captured = drain(output)
            .await
            .with_context(|| format!("reading output of [{command}]"));
        if let Err(e) = &captured {
            log::error!("{e:#} on instance {}", self.instance.name);
        }
        Ok(captured)
    }
}

/// Reads a command's output stream to the end
pub async fn drain(output: CommandOutput) -> Result<CapturedOutput> {
    let CommandOutput { status, mut stream } = output;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(CapturedOutput {
        status,
        text: String::from_utf8_lossy(&buf).into_owned(),
    })
}
