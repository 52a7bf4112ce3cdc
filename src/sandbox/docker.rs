use std::io::Cursor;
use std::process::Stdio;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::session::Instance;

use super::command::join_path;
use super::{CommandDescriptor, CommandOutput, Executor, InstanceFileWriter};

/// Status `docker exec` exits with when it could not start the command
const DOCKER_FAILURE_STATUS: i32 = 125;

/// First stderr lines the docker CLI prints for its own failures
const DOCKER_ERROR_PREFIXES: &[&str] = &[
    "Error response from daemon:",
    "Cannot connect to the Docker daemon",
    "Error: No such container",
];

/// Reaches instances that are plain containers through the `docker` CLI
///
/// Commands run in the container's default working directory, which the
/// grading images set to the directory submissions are uploaded to.
/// Failures of docker itself (missing container, unreachable daemon) are
/// errors, never exit statuses of the command.
pub struct DockerExecutor {
    program: String,
}

impl DockerExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn docker_exec(&self, instance: &Instance, interactive: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("exec");
        if interactive {
            cmd.arg("-i");
        }
        cmd.arg(&instance.container).kill_on_drop(true);
        cmd
    }

    /// Fails when `stderr` shows that docker never reached the command
    fn check_dispatched(&self, instance: &Instance, status: i32, stderr: &[u8]) -> Result<()> {
        let stderr = String::from_utf8_lossy(stderr);
        let first_line = stderr.lines().next().unwrap_or_default().trim();
        if status == DOCKER_FAILURE_STATUS
            || DOCKER_ERROR_PREFIXES
                .iter()
                .any(|prefix| first_line.starts_with(prefix))
        {
            bail!(
                "{} exec on container {} failed with {status}: {first_line}",
                self.program,
                instance.container
            );
        }
        Ok(())
    }

    async fn run_quiet(&self, instance: &Instance, args: &[&str]) -> Result<i32> {
        let output = self
            .docker_exec(instance, false)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("failed to spawn {} exec", self.program))?;

        let status = exit_code(output.status)?;
        self.check_dispatched(instance, status, &output.stderr)?;
        Ok(status)
    }
}

#[async_trait]
impl Executor for DockerExecutor {
    async fn exec(&self, instance: &Instance, command: &CommandDescriptor) -> Result<i32> {
        let args: Vec<&str> = command.args().iter().map(String::as_str).collect();
        self.run_quiet(instance, &args).await
    }

    async fn exec_output(
        &self,
        instance: &Instance,
        command: &CommandDescriptor,
    ) -> Result<CommandOutput> {
        let mut child = self
            .docker_exec(instance, false)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {} exec", self.program))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout of [{command}] was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("stderr of [{command}] was not captured"))?;
        let (combined, errors) = read_interleaved(stdout, stderr)
            .await
            .with_context(|| format!("reading output of [{command}]"))?;

        let status = exit_code(child.wait().await?)?;
        self.check_dispatched(instance, status, &errors)?;
        log::debug!(
            "[{command}] on {} exited with {status}, {} bytes of output",
            instance.name,
            combined.len()
        );

        Ok(CommandOutput {
            status,
            stream: Box::new(Cursor::new(combined)),
        })
    }
}

#[async_trait(?Send)]
impl InstanceFileWriter for DockerExecutor {
    async fn upload_from_reader(
        &self,
        instance: &Instance,
        file_name: &str,
        dest_dir: &str,
        content: &mut (dyn AsyncRead + Unpin),
    ) -> Result<u64> {
        let status = self.run_quiet(instance, &["mkdir", "-p", dest_dir]).await?;
        if status != 0 {
            bail!("mkdir -p {dest_dir} exited with {status}");
        }

        let target = join_path(dest_dir, file_name);
        let mut child = self
            .docker_exec(instance, true)
            .args(["tee", target.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {} exec", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("stdin of tee was not captured"))?;
        let written = tokio::io::copy(content, &mut stdin)
            .await
            .with_context(|| format!("streaming into {target}"))?;
        // Closing stdin lets tee finish
        drop(stdin);

        let output = child.wait_with_output().await?;
        let status = exit_code(output.status)?;
        self.check_dispatched(instance, status, &output.stderr)?;
        if status != 0 {
            bail!(
                "tee {target} exited with {status}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(written)
    }
}

/// Reads both pipes until they close, merging chunks in arrival order
///
/// Returns the merged output and, separately, what came from `stderr`.
async fn read_interleaved(
    mut stdout: impl AsyncRead + Unpin,
    mut stderr: impl AsyncRead + Unpin,
) -> std::io::Result<(Vec<u8>, Vec<u8>)> {
    let mut combined = Vec::new();
    let mut errors = Vec::new();
    let mut out_buf = [0u8; 4096];
    let mut err_buf = [0u8; 4096];
    let (mut out_open, mut err_open) = (true, true);

    while out_open || err_open {
        tokio::select! {
            n = stdout.read(&mut out_buf), if out_open => {
                let n = n?;
                if n == 0 {
                    out_open = false;
                } else {
                    combined.extend_from_slice(&out_buf[..n]);
                }
            }
            n = stderr.read(&mut err_buf), if err_open => {
                let n = n?;
                if n == 0 {
                    err_open = false;
                } else {
                    combined.extend_from_slice(&err_buf[..n]);
                    errors.extend_from_slice(&err_buf[..n]);
                }
            }
        }
    }

    Ok((combined, errors))
}

fn exit_code(status: std::process::ExitStatus) -> Result<i32> {
    status
        .code()
        .ok_or_else(|| anyhow!("docker exec was terminated by a signal"))
}
