use std::process::ExitStatus;
use thiserror::Error;

pub type WorkbenchResult<T> = Result<T, WorkbenchError>;

#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The dry-run diagnostics did not carry a start-time estimate.
    #[error("could not find a start time estimate in scheduler output: {diagnostics:?}")]
    ProbeParse { diagnostics: String },

    #[error("failed to start `{program}`: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        diagnostics: String,
    },

    #[error("interrupted while waiting for `{program}`")]
    Interrupted { program: String },

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}

impl WorkbenchError {
    /// Process exit code the binary should report for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            WorkbenchError::CommandFailed { status, .. } => status
                .code()
                .and_then(|code| u8::try_from(code).ok())
                .filter(|code| *code != 0)
                .unwrap_or(1),
            WorkbenchError::Interrupted { .. } => 130,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn command_failure_reports_child_exit_code() {
        let err = WorkbenchError::CommandFailed {
            program: "srun".to_string(),
            status: ExitStatus::from_raw(3 << 8),
            diagnostics: String::new(),
        };
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn signalled_child_maps_to_generic_failure() {
        let err = WorkbenchError::CommandFailed {
            program: "srun".to_string(),
            status: ExitStatus::from_raw(libc::SIGKILL),
            diagnostics: String::new(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn interrupt_uses_conventional_code() {
        let err = WorkbenchError::Interrupted {
            program: "srun".to_string(),
        };
        assert_eq!(err.exit_code(), 130);
    }

    #[test]
    fn probe_parse_message_includes_diagnostics() {
        let err = WorkbenchError::ProbeParse {
            diagnostics: "srun: error".to_string(),
        };
        assert!(err.to_string().contains("srun: error"));
    }
}
