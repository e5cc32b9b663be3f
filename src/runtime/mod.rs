//! Java runtime detection and compatibility checks.
//!
//! * `version` - three-component version numbers for games and runtimes
//! * `gate` - which Java release a game version needs
//! * `probe` - how the installed runtime's version is found
mod gate;
mod probe;
mod version;

pub use gate::{GateOutcome, VersionGate};
pub use probe::{
    JAVA_COMMAND, JavaProbe, RuntimeProbe, java_executable, parse_release_file,
    parse_version_banner,
};
pub use version::Version;

#[cfg(test)]
pub(crate) use probe::MockRuntimeProbe;
