//! Interactive container shells.
//!
//! A `bash` process runs inside the container with a TTY. Its output is
//! copied to the host's stdout; input comes line by line from the same
//! [`Prompt`] the menu reads, so ending the session never strands a pending
//! terminal read. Ctrl-C while attached is forwarded to the shell.

use crate::container::{ContainerError, Result};
use crate::manager::Prompt;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::exec::{CreateExecOptions, StartExecResults};
use futures::stream::{Stream, StreamExt};
use std::future::Future;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::signal;
use tracing::{debug, warn};

/// Shell started when attaching to a container.
const SHELL: &str = "bash";

/// ETX, what a terminal sends for Ctrl-C.
const INTERRUPT: u8 = 0x03;

/// Interactive session bound to one container.
pub struct InteractiveSession {
    container: String,
    docker: Docker,
}

impl InteractiveSession {
    /// Bind a session to a running container (by name or ID).
    pub fn new(docker: Docker, container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            docker,
        }
    }

    /// Run `bash` with a TTY until it exits.
    ///
    /// # Errors
    ///
    /// [`ContainerError::NotFound`] if the container is gone, or any exec or
    /// terminal write failure.
    pub async fn start_shell(&self, input: &dyn Prompt) -> Result<()> {
        debug!("Starting interactive shell in container: {}", self.container);

        let exec = self
            .docker
            .create_exec(
                &self.container,
                CreateExecOptions {
                    attach_stdin: Some(true),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    tty: Some(true),
                    cmd: Some(vec![SHELL.to_string()]),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ContainerError::from_lookup(&self.container, e))?;

        match self.docker.start_exec(&exec.id, None).await? {
            StartExecResults::Attached {
                mut output,
                input: mut exec_input,
            } => {
                let mut stdout = tokio::io::stdout();
                relay(&mut output, &mut exec_input, &mut stdout, input, || {
                    async { signal::ctrl_c().await.is_ok() }
                })
                .await?;
                debug!("Shell in {} exited", self.container);
                Ok(())
            }
            StartExecResults::Detached => Err(ContainerError::ExecutionError(format!(
                "shell in {} started detached",
                self.container
            ))),
        }
    }
}

/// Copy shell output to `stdout` and operator lines into the shell until the
/// output stream ends.
///
/// Output is polled first, so once the shell has exited no further line is
/// taken from `lines`. `interrupted` resolves to `true` for each Ctrl-C,
/// which is passed on as [`INTERRUPT`].
pub(crate) async fn relay<S, W, O, F, Fut>(
    output: &mut S,
    shell_input: &mut W,
    stdout: &mut O,
    lines: &dyn Prompt,
    mut interrupted: F,
) -> Result<()>
where
    S: Stream<Item = std::result::Result<LogOutput, bollard::errors::Error>> + Unpin,
    W: AsyncWrite + Unpin,
    O: AsyncWrite + Unpin,
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let mut input_open = true;

    loop {
        tokio::select! {
            biased;
            chunk = output.next() => match chunk {
                Some(chunk) => {
                    stdout.write_all(&chunk?.into_bytes()).await?;
                    stdout.flush().await?;
                }
                None => return Ok(()),
            },
            line = lines.read_line(), if input_open => match line? {
                Some(line) => {
                    shell_input.write_all(line.as_bytes()).await?;
                    shell_input.write_all(b"\n").await?;
                    shell_input.flush().await?;
                }
                None => {
                    debug!("Input closed, closing shell stdin");
                    input_open = false;
                    if let Err(e) = shell_input.shutdown().await {
                        warn!("Failed to close shell stdin: {}", e);
                    }
                }
            },
            true = interrupted() => {
                shell_input.write_all(&[INTERRUPT]).await?;
                shell_input.flush().await?;
            }
        }
    }
}
