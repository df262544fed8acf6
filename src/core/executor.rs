use crate::core::error::{WorkbenchError, WorkbenchResult};
use crate::core::launch::LaunchArgs;
use crate::core::request::ResourceExpression;
use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};

/// How long a launch step gets to exit after a forwarded interrupt before it is killed.
pub const INTERRUPT_GRACE: Duration = Duration::from_secs(5);

/// The two scheduler invocations a session needs.
#[allow(async_fn_in_trait)]
pub trait Executor {
    /// Dry-run the expression and return the scheduler's diagnostic text.
    async fn test_only(&self, expression: &ResourceExpression) -> WorkbenchResult<String>;

    /// Run the remote launch step attached to the terminal until it exits.
    async fn launch(
        &self,
        expression: &ResourceExpression,
        launch_args: &LaunchArgs,
    ) -> WorkbenchResult<ExitStatus>;
}

#[derive(Debug, Clone)]
pub struct SrunExecutor {
    pub srun: String,
    pub probe_command: String,
    pub launch_script: PathBuf,
}

impl SrunExecutor {
    pub fn test_only_command(&self, expression: &ResourceExpression) -> Command {
        let mut command = Command::new(&self.srun);
        command
            .args(expression.args())
            .arg("--test-only")
            .arg(&self.probe_command);
        command
    }

    pub fn launch_command(&self, expression: &ResourceExpression, launch_args: &LaunchArgs) -> Command {
        let mut command = Command::new(&self.srun);
        command
            .args(expression.args())
            .arg("--pty")
            .arg(&self.launch_script)
            .args(launch_args.args());
        command
    }
}

impl Executor for SrunExecutor {
    async fn test_only(&self, expression: &ResourceExpression) -> WorkbenchResult<String> {
        tracing::debug!(
            "Running: {} {} --test-only {}",
            self.srun,
            expression,
            self.probe_command
        );
        let output = self
            .test_only_command(expression)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| WorkbenchError::CommandSpawn {
                program: self.srun.clone(),
                source,
            })?;

        let diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            // The scheduler explains itself on stderr; pass that through untouched.
            eprint!("{diagnostics}");
            return Err(WorkbenchError::CommandFailed {
                program: self.srun.clone(),
                status: output.status,
                diagnostics,
            });
        }
        Ok(diagnostics)
    }

    async fn launch(
        &self,
        expression: &ResourceExpression,
        launch_args: &LaunchArgs,
    ) -> WorkbenchResult<ExitStatus> {
        tracing::debug!(
            "Running: {} {} --pty {} {}",
            self.srun,
            expression,
            self.launch_script.display(),
            launch_args
        );
        let child = self
            .launch_command(expression, launch_args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WorkbenchError::CommandSpawn {
                program: self.srun.clone(),
                source,
            })?;

        wait_forwarding_interrupt(child, &self.srun, tokio::signal::ctrl_c(), INTERRUPT_GRACE).await
    }
}

/// Wait for a foreground child, relaying an interrupt to it.
///
/// When `interrupt` resolves first the child gets SIGINT, then SIGKILL if it is
/// still alive after `grace`, and the call ends with [`WorkbenchError::Interrupted`].
pub async fn wait_forwarding_interrupt<F>(
    mut child: Child,
    program: &str,
    interrupt: F,
    grace: Duration,
) -> WorkbenchResult<ExitStatus>
where
    F: Future<Output = std::io::Result<()>>,
{
    let wait_error = |source: std::io::Error| WorkbenchError::CommandSpawn {
        program: program.to_string(),
        source,
    };

    tokio::select! {
        status = child.wait() => status.map_err(wait_error),
        signal = interrupt => {
            if let Err(e) = signal {
                tracing::warn!("Interrupt handler unavailable ({e}); waiting for {program}");
                return child.wait().await.map_err(wait_error);
            }

            if let Some(pid) = child.id() {
                tracing::info!(pid, "Forwarding interrupt to {program}");
                // SAFETY: plain kill(2) on a pid we spawned and have not reaped.
                unsafe {
                    libc::kill(pid as libc::pid_t, libc::SIGINT);
                }
            }

            match tokio::time::timeout(grace, child.wait()).await {
                Ok(status) => {
                    tracing::debug!(?status, "{program} exited after interrupt");
                }
                Err(_) => {
                    tracing::warn!("{program} ignored the interrupt, killing it");
                    let _ = child.kill().await;
                }
            }
            Err(WorkbenchError::Interrupted {
                program: program.to_string(),
            })
        }
    }
}
