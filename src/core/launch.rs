use std::fmt;

/// Options for the remote launch script, fixed once per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub gpu_count: u8,
    /// Short name of the host the session is launched from.
    pub login_node: String,
    pub container_name: Option<String>,
    pub bind_spec: Option<String>,
    pub jupyter: bool,
    pub jupyter_args: Option<String>,
    pub vs_debug: bool,
}

impl LaunchOptions {
    /// Only notebook and debugger sessions listen on a port.
    pub fn needs_port(&self) -> bool {
        self.jupyter || self.vs_debug
    }
}

/// Argument list handed to the launch script, one token per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArgs {
    args: Vec<String>,
}

impl LaunchArgs {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn port(&self) -> Option<u16> {
        self.args
            .iter()
            .position(|a| a == "-p")
            .and_then(|i| self.args.get(i + 1))
            .and_then(|p| p.parse().ok())
    }
}

impl fmt::Display for LaunchArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::utils::shell_join(&self.args))
    }
}

pub struct LaunchArgsBuilder;

impl LaunchArgsBuilder {
    pub fn build(opts: &LaunchOptions, allocated_port: Option<u16>) -> LaunchArgs {
        let mut args = vec![
            "-g".to_string(),
            opts.gpu_count.to_string(),
            "-l".to_string(),
            opts.login_node.clone(),
        ];

        if let Some(container) = non_empty(&opts.container_name) {
            args.extend(["-c".to_string(), container.to_string()]);
        }
        if let Some(bind) = non_empty(&opts.bind_spec) {
            args.extend(["-b".to_string(), format!("--bind={bind}")]);
        }
        if opts.jupyter {
            args.push("-j".to_string());
        }
        if let Some(jupyter_args) = non_empty(&opts.jupyter_args) {
            args.extend(["-a".to_string(), jupyter_args.to_string()]);
        }
        if let Some(port) = allocated_port {
            args.extend(["-p".to_string(), port.to_string()]);
        }
        if opts.vs_debug {
            args.push("-v".to_string());
        }

        LaunchArgs { args }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
