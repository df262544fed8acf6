use clap::{Arg, Command, CommandFactory, Parser};
use clap_complete::Shell;
use std::ffi::OsString;
use std::path::PathBuf;
use workbench::core::launch::LaunchOptions;
use workbench::core::request::{GpuKind, ResourceRequest, MAX_GPUS};
use workbench::utils::parsers::{parse_memory, parse_partitions};

const AFTER_HELP: &str = "\
Any other scheduler option (see `man sbatch`) is forwarded as-is, e.g.
  workbench -g 2 -k v100 --jupyter --exclusive --constraint=ib

Workbench only launches jobs on a single node.";

#[derive(Debug, Parser)]
#[command(
    name = "workbench",
    author,
    version = workbench::core::version(),
    about = "Launch an interactive job via Slurm on the HPC cluster.",
    after_help = AFTER_HELP
)]
#[command(styles = workbench::utils::STYLES, infer_long_args = true)]
pub struct Workbench {
    /// Number of GPUs requested
    #[arg(
        short = 'g',
        long = "gpus",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=MAX_GPUS as i64)
    )]
    pub gpu_count: u8,

    /// Type of GPU, use `scontrol show nodes` to review which kinds are available
    #[arg(short = 'k', long = "kind", value_enum)]
    pub gpu_kind: Option<GpuKind>,

    /// Number of CPUs
    #[arg(
        short = 'c',
        long = "cpus",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub cpu_count: u32,

    /// Expected reservation duration in hours
    #[arg(
        short = 't',
        long = "time",
        default_value_t = 4,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub wallclock: u32,

    /// Memory for the job, with a K|M|G unit right after the number (bare numbers are MB)
    #[arg(short = 'm', long = "mem", default_value = "50G", value_parser = parse_memory)]
    pub memory: String,

    /// Comma-separated partitions to run the job on
    #[arg(short = 'p', long, default_value = "batch,short_jobs")]
    pub partition: String,

    /// Associated project for accounting
    #[arg(short = 'A', long)]
    pub account: Option<String>,

    /// Launch an interactive VS Code debug session
    #[arg(long = "vs_debug")]
    pub vs_debug: bool,

    /// Launch a Jupyter notebook instance
    #[arg(long)]
    pub jupyter: bool,

    /// Additional arguments for Jupyter, in quotes. Do not include the port or --no-browser
    #[arg(long = "jupyter_args", value_name = "ARGS", allow_hyphen_values = true)]
    pub jupyter_args: Option<String>,

    /// Launch a specific apptainer container (the .simg file name)
    #[arg(long = "container", value_name = "NAME")]
    pub container_name: Option<String>,

    /// Input for the apptainer bind option
    #[arg(long, value_name = "SPEC")]
    pub bind: Option<String>,

    /// Path to the config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Unrecognized options, forwarded to the scheduler in order
    #[arg(skip)]
    pub extra_args: Vec<String>,
}

impl Workbench {
    /// Parse the process arguments, keeping unknown options for the scheduler.
    pub fn parse_known() -> Self {
        Self::try_parse_known_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    pub fn try_parse_known_from<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let (known, unknown) = split_known_args(&Self::command(), argv);
        let mut args = Self::try_parse_from(known)?;
        args.extra_args = unknown;
        Ok(args)
    }

    pub fn resource_request(&self) -> ResourceRequest {
        ResourceRequest::builder()
            .gpus(self.gpu_count)
            .gpu_kind(self.gpu_kind)
            .cpus(self.cpu_count)
            .memory(self.memory.clone())
            .wallclock_hours(self.wallclock)
            .partitions(parse_partitions(&self.partition))
            .account(self.account.clone())
            .extra_args(self.extra_args.clone())
            .build()
    }

    pub fn launch_options(&self, login_node: &str) -> LaunchOptions {
        LaunchOptions {
            gpu_count: self.gpu_count,
            login_node: login_node.to_string(),
            container_name: self.container_name.clone(),
            bind_spec: self.bind.clone(),
            jupyter: self.jupyter,
            jupyter_args: self.jupyter_args.clone(),
            vs_debug: self.vs_debug,
        }
    }
}

/// Split argv into what `command` understands and everything else.
///
/// The program name stays first in the known list. Unknown options keep their
/// original order, and everything after a bare `--` is unknown. Long flags may
/// be abbreviated to a unique prefix.
pub fn split_known_args<I, T>(command: &Command, argv: I) -> (Vec<OsString>, Vec<String>)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut command = command.clone();
    command.build();

    let mut argv = argv.into_iter().map(Into::<OsString>::into);
    let mut known: Vec<OsString> = argv.next().into_iter().collect();
    let mut unknown = Vec::new();

    while let Some(raw) = argv.next() {
        let arg = raw.to_string_lossy().into_owned();
        if arg == "--" {
            unknown.extend(argv.by_ref().map(|a| a.to_string_lossy().into_owned()));
            break;
        }

        let needs_value = if let Some(long) = arg.strip_prefix("--") {
            let (name, inline_value) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            find_long(&command, name).map(|a| takes_value(a) && inline_value.is_none())
        } else if let Some(shorts) = arg.strip_prefix('-').filter(|s| !s.is_empty()) {
            let mut chars = shorts.chars();
            let flag = chars.next();
            let attached = chars.as_str();
            find_arg(&command, |a| a.get_short() == flag)
                .map(|a| takes_value(a) && attached.is_empty())
        } else {
            None
        };

        match needs_value {
            Some(needs_value) => {
                known.push(raw);
                if needs_value {
                    if let Some(value) = argv.next() {
                        known.push(value);
                    }
                }
            }
            None => unknown.push(arg),
        }
    }

    (known, unknown)
}

fn find_arg<'a>(command: &'a Command, pred: impl Fn(&Arg) -> bool) -> Option<&'a Arg> {
    command.get_arguments().find(|&a| pred(a))
}

fn find_long<'a>(command: &'a Command, name: &str) -> Option<&'a Arg> {
    if let Some(arg) = find_arg(command, |a| a.get_long() == Some(name)) {
        return Some(arg);
    }
    let mut candidates = command
        .get_arguments()
        .filter(|a| a.get_long().is_some_and(|long| long.starts_with(name)));
    match (candidates.next(), candidates.next()) {
        (Some(arg), None) => Some(arg),
        _ => None,
    }
}

fn takes_value(arg: &Arg) -> bool {
    arg.get_action().takes_values()
}
