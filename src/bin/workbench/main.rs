use anyhow::Result;
use clap::CommandFactory;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use workbench::config::load_config;
use workbench::core::executor::SrunExecutor;
use workbench::utils::{current_hostname, login_node};
use workbench::{AvailabilityProbe, PortAllocator, RequestBuilder, Session, WorkbenchError};

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match real_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<WorkbenchError>()
                .map_or(1, WorkbenchError::exit_code);
            eprintln!("{err:?}");
            ExitCode::from(code)
        }
    }
}

async fn real_main() -> Result<()> {
    let args = cli::Workbench::parse_known();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("WORKBENCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Some(shell) = args.completions {
        let mut cmd = cli::Workbench::command();
        clap_complete::generate(shell, &mut cmd, "workbench", &mut io::stdout());
        return Ok(());
    }

    let config = load_config(args.config.as_ref())?;
    tracing::debug!(?config, extra_args = ?args.extra_args, "Starting workbench");

    let hostname = current_hostname()?;
    let request = args.resource_request();
    let options = args.launch_options(login_node(&hostname));

    let ports = PortAllocator::tcp(config.ports.range()?);
    let executor = SrunExecutor {
        srun: config.scheduler.srun.clone(),
        probe_command: config.scheduler.probe_command.clone(),
        launch_script: config.launch.script.clone(),
    };
    let mut session = Session::new(
        request,
        options,
        RequestBuilder::new(&config.scheduler.qos, &config.scheduler.job_name),
        AvailabilityProbe::new(&config.advisory.dashboard),
    );

    session.run(&executor, &ports, &mut io::stdout()).await?;
    Ok(())
}
