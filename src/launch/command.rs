use crate::config::{Loader, ServerConfig};
use crate::error::Result;
use crate::launch::loader_args;
use crate::runtime::{Version, java_executable};
use std::fmt;
use std::path::{Path, PathBuf};

/// Trailing token the loader run scripts use to pass extra arguments on.
#[cfg(windows)]
pub const PASS_THROUGH: &str = "%*";
#[cfg(not(windows))]
pub const PASS_THROUGH: &str = "$@";

/// First game version whose Forge/NeoForge servers launch through an argument file.
pub const ARGS_FILE_SINCE: Version = Version::new(1, 17, 0);

/// Shape of the launch: a plain jar, or a loader argument file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchForm {
    /// `-jar <name> nogui`
    Jar,
    /// `@<args file> <pass-through> nogui`
    ArgsFile(PathBuf),
}

/// A program and its arguments, ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    program: PathBuf,
    args: Vec<String>,
    form: LaunchForm,
}

impl LaunchCommand {
    /// A command with no arguments yet, launched as a plain program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            form: LaunchForm::Jar,
        }
    }

    pub fn arg<S: Into<String>>(&mut self, val: S) -> &mut Self {
        self.args.push(val.into());
        self
    }

    pub fn args<I>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        iter.into_iter().for_each(|v| self.args.push(v.into()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn form(&self) -> &LaunchForm {
        &self.form
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Builds the Java command line for a server configuration.
///
/// The result depends only on the configuration and the contents of the
/// server directory, so building twice yields the same command.
///
/// # Examples
///
/// ```
/// use mc_server_runner::config::{Loader, ServerConfig};
/// use mc_server_runner::launch::{CommandBuilder, JvmArgs};
///
/// let config = ServerConfig {
///     loader: Loader::Vanilla,
///     min_memory: 4,
///     max_memory: 8,
///     jvm_args: JvmArgs::empty(),
///     ..ServerConfig::default()
/// };
///
/// let command = CommandBuilder::new(&config).build().unwrap();
/// assert_eq!(command.arguments(), ["-Xms4G", "-Xmx8G", "-jar", "server.jar", "nogui"]);
/// ```
pub struct CommandBuilder<'a> {
    config: &'a ServerConfig,
    server_dir: PathBuf,
}

impl<'a> CommandBuilder<'a> {
    /// Builder resolving loader files relative to the current directory.
    pub fn new(config: &'a ServerConfig) -> Self {
        Self {
            config,
            server_dir: PathBuf::from("."),
        }
    }

    /// Resolve loader files relative to `dir` instead.
    pub fn server_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.server_dir = dir.into();
        self
    }

    /// Build the launch command.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` if the game version is not three
    /// dot-separated numbers. A missing Forge/NeoForge installation is not
    /// an error; the plain jar form is used instead.
    #[tracing::instrument(skip(self), fields(loader = %self.config.loader, version = %self.config.version))]
    pub fn build(&self) -> Result<LaunchCommand> {
        let version: Version = self.config.version.parse()?;
        let form = self.launch_form(version);

        let mut command = LaunchCommand::new(java_executable(self.config.jdk_path.as_deref()));
        command
            .arg(format!("-Xms{}G", self.config.min_memory))
            .arg(format!("-Xmx{}G", self.config.max_memory))
            .args(self.config.jvm_args.flatten());

        match &form {
            LaunchForm::Jar => {
                command.args(["-jar", self.config.jar_name.as_str(), "nogui"]);
            }
            LaunchForm::ArgsFile(path) => {
                if let Some(user_args) = loader_args::user_jvm_args(&self.server_dir) {
                    command.arg(user_args);
                }
                command
                    .arg(format!("@{}", path.display()))
                    .args([PASS_THROUGH, "nogui"]);
            }
        }
        command.form = form;

        tracing::debug!(command = %command, "Built launch command");
        Ok(command)
    }

    fn launch_form(&self, version: Version) -> LaunchForm {
        let loader = self.config.loader;
        if !matches!(loader, Loader::Forge | Loader::NeoForge) || version < ARGS_FILE_SINCE {
            return LaunchForm::Jar;
        }

        match loader_args::find_args_file(&self.server_dir, loader) {
            Some(path) => LaunchForm::ArgsFile(path),
            None => {
                tracing::warn!(
                    %loader,
                    dir = %self.server_dir.display(),
                    "No installed {} libraries found, launching the jar directly",
                    loader
                );
                LaunchForm::Jar
            }
        }
    }
}
