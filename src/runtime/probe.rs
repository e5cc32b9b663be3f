use crate::error::{Error, Result};
use crate::runtime::Version;
use async_process::{Command, Stdio};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Name of the runtime command resolved through `PATH`.
pub const JAVA_COMMAND: &str = "java";

#[cfg(windows)]
const JAVA_BINARY: &str = "bin/java.exe";
#[cfg(not(windows))]
const JAVA_BINARY: &str = "bin/java";

/// Resolve the runtime executable for an optional installation root.
///
/// Without a root the bare `java` command is returned and the OS looks it
/// up on `PATH` at spawn time.
pub fn java_executable(jdk_path: Option<&Path>) -> PathBuf {
    match jdk_path {
        Some(root) => root.join(JAVA_BINARY),
        None => PathBuf::from(JAVA_COMMAND),
    }
}

/// Extract `JAVA_VERSION` from the contents of a JDK `release` file.
pub fn parse_release_file(contents: &str) -> Option<Version> {
    contents
        .lines()
        .find_map(|line| line.trim().strip_prefix("JAVA_VERSION="))
        .and_then(|value| Version::parse_runtime(value).ok())
}

/// Parse the first line of `java -version` or `java --version` output.
///
/// Handles both `openjdk version "17.0.2" 2022-01-18` and
/// `openjdk 21.0.1 2023-10-17`.
pub fn parse_version_banner(output: &str) -> Result<Version> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| Error::Probe("Runtime printed no version banner".to_string()))?;

    let token = match line.split('"').nth(1) {
        Some(quoted) => quoted,
        None => line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| Error::Probe(format!("Unrecognised version banner '{}'", line)))?,
    };

    Version::parse_runtime(token)
}

/// Determines the version of a Java runtime.
///
/// This is the seam between the supervisor and the host environment; tests
/// substitute a fixed answer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuntimeProbe: Send + Sync {
    /// Probe the runtime installed at `jdk_path`, or the one on `PATH`.
    async fn probe(&self, jdk_path: Option<PathBuf>) -> Result<Version>;
}

/// Probes a real Java installation.
#[derive(Debug, Clone, Default)]
pub struct JavaProbe;

impl JavaProbe {
    /// Installation root of the `java` found on `PATH`, if any.
    fn home_from_path() -> Option<PathBuf> {
        let paths = std::env::var_os("PATH")?;
        let binary = Path::new(JAVA_BINARY).file_name()?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(binary))
            .find(|candidate| candidate.is_file())
            .and_then(|exe| std::fs::canonicalize(exe).ok())
            .and_then(|exe| exe.parent()?.parent().map(Path::to_path_buf))
    }

    fn version_from_release(home: &Path) -> Option<Version> {
        let contents = std::fs::read_to_string(home.join("release")).ok()?;
        parse_release_file(&contents)
    }

    /// Raw output of `java -version`, which older runtimes print to stderr.
    pub async fn banner(jdk_path: Option<&Path>) -> Result<String> {
        let executable = java_executable(jdk_path);
        let output = Command::new(&executable)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                Error::Environment(format!(
                    "Failed to run {}: {}",
                    executable.display(),
                    e
                ))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(if stderr.trim().is_empty() {
            stdout.into_owned()
        } else {
            stderr.into_owned()
        })
    }
}

#[async_trait]
impl RuntimeProbe for JavaProbe {
    #[tracing::instrument(skip(self))]
    async fn probe(&self, jdk_path: Option<PathBuf>) -> Result<Version> {
        let home = match &jdk_path {
            Some(root) => Some(root.clone()),
            None => Self::home_from_path(),
        };

        if let Some(version) = home.as_deref().and_then(Self::version_from_release) {
            tracing::debug!(%version, "Runtime version read from release file");
            return Ok(version);
        }

        tracing::debug!("No release file, asking the runtime directly");
        let banner = Self::banner(jdk_path.as_deref()).await?;
        parse_version_banner(&banner)
    }
}
