//! Best-effort post-processing of the filled grid by an external converter

use std::fs;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::ConversionConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCategory};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors from a conversion attempt
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("conversion I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start converter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("converter '{program}' exited with {status}")]
    Failed { program: String, status: ExitStatus },

    #[error("converter '{program}' timed out after {}s", timeout.as_secs_f64())]
    Timeout { program: String, timeout: Duration },
}

/// A generated document in some serialized format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    /// File extension without the dot, e.g. `toml` or `pdf`
    pub extension: String,
}

impl Artifact {
    pub fn new(bytes: impl Into<Vec<u8>>, extension: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            extension: extension.into(),
        }
    }
}

/// Turns one artifact into another within a time limit
pub trait Converter {
    fn convert(&self, artifact: &Artifact, timeout: Duration) -> Result<Artifact, ConvertError>;
}

/// Converter that runs an external program on temporary files
#[derive(Debug, Clone)]
pub struct CommandConverter {
    config: ConversionConfig,
}

impl CommandConverter {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }
}

impl Converter for CommandConverter {
    fn convert(&self, artifact: &Artifact, timeout: Duration) -> Result<Artifact, ConvertError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join(format!("input.{}", artifact.extension));
        let output = dir.path().join(format!("output.{}", self.config.extension));
        fs::write(&input, &artifact.bytes)?;

        let args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input.to_string_lossy())
                    .replace("{output}", &output.to_string_lossy())
            })
            .collect();

        let program = self.config.program.clone();
        tracing::debug!(%program, ?args, "starting converter");
        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ConvertError::Spawn {
                program: program.clone(),
                source,
            })?;

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                // A kill error means the child already exited
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConvertError::Timeout { program, timeout });
            }
            thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            return Err(ConvertError::Failed { program, status });
        }

        let bytes = fs::read(&output)?;
        Ok(Artifact::new(bytes, self.config.extension.clone()))
    }
}

/// Run the converter once; on any failure keep the original artifact and
/// report a diagnostic instead
pub fn postprocess(
    converter: &dyn Converter,
    artifact: Artifact,
    timeout: Duration,
) -> (Artifact, Option<Diagnostic>) {
    match converter.convert(&artifact, timeout) {
        Ok(converted) => (converted, None),
        Err(err) => {
            let diagnostic = Diagnostic::new(
                DiagnosticCategory::Conversion,
                format!("{}; returning the unconverted .{} output", err, artifact.extension),
            )
            .logged();
            (artifact, Some(diagnostic))
        }
    }
}
