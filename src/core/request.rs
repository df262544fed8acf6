use clap::ValueEnum;
use std::fmt;
use strum::{Display, EnumIter, EnumString};

/// Flag every resource expression starts with. Downstream tooling re-parses
/// the expression and anchors on it.
pub const ANCHOR_FLAG: &str = "-N1";
pub const DEFAULT_QOS: &str = "high";
pub const DEFAULT_JOB_NAME: &str = "Workbench Job";
pub const DEFAULT_PARTITIONS: &[&str] = &["batch", "short_jobs"];
pub const MAX_GPUS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum GpuKind {
    K80,
    M40,
    P100,
    V100,
    A100,
    A40,
}

/// What the user asked the scheduler for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub gpu_count: u8,
    pub gpu_kind: Option<GpuKind>,
    pub cpu_count: u32,
    pub memory: String,
    pub wallclock_hours: u32,
    pub partitions: Vec<String>,
    pub account: Option<String>,
    pub extra_args: Vec<String>,
}

impl ResourceRequest {
    pub fn builder() -> ResourceRequestBuilder {
        ResourceRequestBuilder::new()
    }

    /// `<kind>:<count>` when a kind is set and GPUs are requested, `<count>` otherwise.
    pub fn accelerator_spec(&self) -> String {
        match self.gpu_kind {
            Some(kind) if self.gpu_count > 0 => format!("{kind}:{}", self.gpu_count),
            _ => self.gpu_count.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceRequestBuilder {
    gpu_count: u8,
    gpu_kind: Option<GpuKind>,
    cpu_count: u32,
    memory: String,
    wallclock_hours: u32,
    partitions: Vec<String>,
    account: Option<String>,
    extra_args: Vec<String>,
}

impl Default for ResourceRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRequestBuilder {
    pub fn new() -> Self {
        Self {
            gpu_count: 1,
            gpu_kind: None,
            cpu_count: 5,
            memory: "50G".to_string(),
            wallclock_hours: 4,
            partitions: DEFAULT_PARTITIONS.iter().map(|p| p.to_string()).collect(),
            account: None,
            extra_args: Vec::new(),
        }
    }

    pub fn gpus(mut self, gpu_count: u8) -> Self {
        self.gpu_count = gpu_count;
        self
    }

    pub fn gpu_kind(mut self, gpu_kind: Option<GpuKind>) -> Self {
        self.gpu_kind = gpu_kind;
        self
    }

    pub fn cpus(mut self, cpu_count: u32) -> Self {
        self.cpu_count = cpu_count;
        self
    }

    pub fn memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = memory.into();
        self
    }

    pub fn wallclock_hours(mut self, hours: u32) -> Self {
        self.wallclock_hours = hours;
        self
    }

    pub fn partitions(mut self, partitions: Vec<String>) -> Self {
        self.partitions = partitions;
        self
    }

    /// An empty account is treated as unset.
    pub fn account(mut self, account: Option<String>) -> Self {
        self.account = account.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn build(self) -> ResourceRequest {
        ResourceRequest {
            gpu_count: self.gpu_count,
            gpu_kind: self.gpu_kind,
            cpu_count: self.cpu_count,
            memory: self.memory,
            wallclock_hours: self.wallclock_hours,
            partitions: self
                .partitions
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            account: self.account,
            extra_args: self.extra_args,
        }
    }
}

/// Scheduler arguments shared by the dry-run probe and the final launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceExpression {
    args: Vec<String>,
}

impl ResourceExpression {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn first(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl fmt::Display for ResourceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::utils::shell_join(&self.args))
    }
}

/// Turns a [`ResourceRequest`] into the ordered scheduler expression.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    qos: String,
    job_name: String,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_QOS, DEFAULT_JOB_NAME)
    }
}

impl RequestBuilder {
    pub fn new(qos: impl Into<String>, job_name: impl Into<String>) -> Self {
        Self {
            qos: qos.into(),
            job_name: job_name.into(),
        }
    }

    pub fn build(&self, request: &ResourceRequest) -> ResourceExpression {
        let mut args = vec![
            ANCHOR_FLAG.to_string(),
            format!("--qos={}", self.qos),
            format!("--gpus-per-node={}", request.accelerator_spec()),
            format!("-c{}", request.cpu_count),
            format!("--mem={}", request.memory),
            format!("-t{}:00:00", request.wallclock_hours),
            format!("-J{}", self.job_name),
        ];

        if let Some(account) = &request.account {
            args.push(format!("--account={account}"));
        }
        if !request.partitions.is_empty() {
            args.push(format!("--partition={}", request.partitions.join(",")));
        }
        args.extend(request.extra_args.iter().cloned());

        tracing::debug!(expression = ?args, "Built resource expression");
        ResourceExpression { args }
    }
}
