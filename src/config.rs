use crate::core::error::{WorkbenchError, WorkbenchResult};
use crate::core::get_config_dir;
use crate::core::port::DEFAULT_PORT_RANGE;
use crate::core::request::{DEFAULT_JOB_NAME, DEFAULT_QOS};
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
    #[serde(default)]
    pub ports: PortsConfig,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SchedulerConfig {
    /// Scheduler front-end used for both the dry-run and the launch
    #[serde(default = "default_srun")]
    pub srun: String,
    #[serde(default = "default_qos")]
    pub qos: String,
    #[serde(default = "default_job_name")]
    pub job_name: String,
    /// No-op command submitted with `--test-only`
    #[serde(default = "default_probe_command")]
    pub probe_command: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LaunchConfig {
    /// Script started on the compute node inside the allocation
    #[serde(default = "default_launch_script")]
    pub script: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PortsConfig {
    #[serde(default = "default_port_start")]
    pub start: u16,
    #[serde(default = "default_port_end")]
    pub end: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AdvisoryConfig {
    /// Where users can check cluster utilization when a job is slow to start
    #[serde(default = "default_dashboard")]
    pub dashboard: String,
}

fn default_srun() -> String {
    "srun".to_string()
}

fn default_qos() -> String {
    DEFAULT_QOS.to_string()
}

fn default_job_name() -> String {
    DEFAULT_JOB_NAME.to_string()
}

fn default_probe_command() -> String {
    "hostname".to_string()
}

fn default_launch_script() -> PathBuf {
    PathBuf::from("/usr/bin/workbench_launch.sh")
}

fn default_port_start() -> u16 {
    *DEFAULT_PORT_RANGE.start()
}

fn default_port_end() -> u16 {
    *DEFAULT_PORT_RANGE.end()
}

fn default_dashboard() -> String {
    "cspan.mitre.org".to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            srun: default_srun(),
            qos: default_qos(),
            job_name: default_job_name(),
            probe_command: default_probe_command(),
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            script: default_launch_script(),
        }
    }
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            start: default_port_start(),
            end: default_port_end(),
        }
    }
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            dashboard: default_dashboard(),
        }
    }
}

impl PortsConfig {
    pub fn range(&self) -> WorkbenchResult<RangeInclusive<u16>> {
        if self.start > self.end {
            return Err(WorkbenchError::InvalidInput(format!(
                "port range start {} is greater than end {}",
                self.start, self.end
            )));
        }
        Ok(self.start..=self.end)
    }
}

pub fn load_config(config_path: Option<&PathBuf>) -> WorkbenchResult<Config> {
    load_config_with_env(config_path, environment())
}

/// `WORKBENCH_<SECTION>__<KEY>`, e.g. `WORKBENCH_SCHEDULER__JOB_NAME`.
fn environment() -> config::Environment {
    config::Environment::with_prefix("WORKBENCH")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn load_config_with_env(
    config_path: Option<&PathBuf>,
    environment: config::Environment,
) -> WorkbenchResult<Config> {
    let mut config_vec = vec![];

    // User-provided config file
    if let Some(config_path) = config_path {
        if config_path.exists() {
            config_vec.push(config_path.clone());
        } else {
            tracing::warn!("Config file {config_path:?} not found.");
        }
    }

    // Default config file
    if let Ok(default_config_path) = get_config_dir().map(|d| d.join("workbench.toml")) {
        if default_config_path.exists() {
            config_vec.push(default_config_path);
        }
    }

    let settings = config::Config::builder();
    // Later sources win, so the user-provided file goes last.
    let settings = config_vec.iter().rev().fold(settings, |s, path| {
        s.add_source(config::File::from(path.as_path()))
    });

    let config = settings
        .add_source(environment)
        .build()?
        .try_deserialize()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_launcher_constants() {
        let config = Config::default();
        assert_eq!(config.scheduler.srun, "srun");
        assert_eq!(config.scheduler.qos, "high");
        assert_eq!(config.scheduler.job_name, "Workbench Job");
        assert_eq!(config.scheduler.probe_command, "hostname");
        assert_eq!(
            config.launch.script,
            PathBuf::from("/usr/bin/workbench_launch.sh")
        );
        assert_eq!(config.ports.range().unwrap(), 8008..=8099);
        assert_eq!(config.advisory.dashboard, "cspan.mitre.org");
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("workbench.toml");
        fs::write(
            &path,
            r#"
[scheduler]
qos = "normal"

[launch]
script = "/opt/workbench/launch.sh"

[ports]
start = 9000
end = 9010
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.scheduler.qos, "normal");
        assert_eq!(config.scheduler.srun, "srun");
        assert_eq!(
            config.launch.script,
            PathBuf::from("/opt/workbench/launch.sh")
        );
        assert_eq!(config.ports.range().unwrap(), 9000..=9010);
    }

    #[test]
    fn test_missing_config_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.ports.start, 8008);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("workbench.toml");
        fs::write(&path, "[ports]\nstart = 9000\nend = 9010\n").unwrap();

        let vars: config::Map<String, String> = [
            ("WORKBENCH_PORTS__START", "9001"),
            ("WORKBENCH_SCHEDULER__JOB_NAME", "Notebook"),
            ("WORKBENCH_ADVISORY_DASHBOARD", "ignored.example.org"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = load_config_with_env(Some(&path), environment().source(Some(vars))).unwrap();
        assert_eq!(config.ports.range().unwrap(), 9001..=9010);
        assert_eq!(config.scheduler.job_name, "Notebook");
        assert_eq!(config.advisory.dashboard, "cspan.mitre.org");
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("workbench.toml");
        fs::write(&path, "[ports]\nstart = \"not a port\"\n").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(WorkbenchError::Config(_))
        ));
    }

    #[test]
    fn test_inverted_port_range_is_rejected() {
        let ports = PortsConfig {
            start: 9000,
            end: 8000,
        };
        assert!(matches!(
            ports.range(),
            Err(WorkbenchError::InvalidInput(_))
        ));
    }
}
