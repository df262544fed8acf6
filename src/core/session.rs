use crate::core::error::WorkbenchError;
use crate::core::executor::Executor;
use crate::core::launch::{LaunchArgs, LaunchArgsBuilder, LaunchOptions};
use crate::core::port::{PortAllocator, PortProbe};
use crate::core::probe::{AvailabilityProbe, FixedTokenScraper, StartTimeScraper};
use crate::core::request::{RequestBuilder, ResourceExpression, ResourceRequest};
use anyhow::{Context, Result};
use std::io::Write;
use std::process::ExitStatus;
use strum::Display;

pub const COMPLETION_MESSAGE: &str = "The interactive session has ended.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    Configuring,
    Probing,
    Launching,
    Done,
}

/// What a finished session did.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub expression: ResourceExpression,
    pub estimate: String,
    pub port: Option<u16>,
    pub launch_args: LaunchArgs,
    pub status: ExitStatus,
}

/// One interactive job request, driven from configuration to the end of the remote session.
pub struct Session<S = FixedTokenScraper> {
    request: ResourceRequest,
    options: LaunchOptions,
    request_builder: RequestBuilder,
    probe: AvailabilityProbe<S>,
    state: SessionState,
}

impl<S: StartTimeScraper> Session<S> {
    pub fn new(
        request: ResourceRequest,
        options: LaunchOptions,
        request_builder: RequestBuilder,
        probe: AvailabilityProbe<S>,
    ) -> Self {
        Self {
            request,
            options,
            request_builder,
            probe,
            state: SessionState::Configuring,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn advance(&mut self, next: SessionState) {
        tracing::info!(from = %self.state, to = %next, "Session state change");
        self.state = next;
    }

    pub async fn run<E, P>(
        &mut self,
        executor: &E,
        ports: &PortAllocator<P>,
        out: &mut impl Write,
    ) -> Result<SessionReport>
    where
        E: Executor,
        P: PortProbe,
    {
        let expression = self.request_builder.build(&self.request);
        write!(out, "{}", confirmation(&self.request))?;

        self.advance(SessionState::Probing);
        let estimate = self
            .probe
            .estimate_start_time(executor, &expression, out)
            .await
            .context("Failed to estimate the job start time")?;

        self.advance(SessionState::Launching);
        // Blocking connect checks; no other task shares this runtime while they run.
        let port = self.options.needs_port().then(|| ports.find_open_port());
        let launch_args = LaunchArgsBuilder::build(&self.options, port);
        tracing::debug!(%launch_args, "Built launch arguments");
        out.flush()?;
        let status = executor.launch(&expression, &launch_args).await?;

        self.advance(SessionState::Done);
        writeln!(out, "\n{COMPLETION_MESSAGE}\n")?;

        if !status.success() {
            return Err(WorkbenchError::CommandFailed {
                program: "interactive launch".to_string(),
                status,
                diagnostics: String::new(),
            }
            .into());
        }

        Ok(SessionReport {
            expression,
            estimate,
            port,
            launch_args,
            status,
        })
    }
}

/// Summary printed before the scheduler is contacted.
pub fn confirmation(request: &ResourceRequest) -> String {
    let mut text = format!(
        "\nPlease wait for your allocation to be created. You have requested:\n        -GPUs: {}\n        -CPUs: {}\n        -Memory: {}\n        -Time: {} Hours\n",
        request.accelerator_spec(),
        request.cpu_count,
        request.memory,
        request.wallclock_hours,
    );
    if let Some(account) = &request.account {
        text.push_str(&format!("        -Account: {account}\n"));
    }
    text
}
