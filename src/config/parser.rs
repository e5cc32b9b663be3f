use crate::error::{Error, Result};
use crate::launch::JvmArgs;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default configuration file name, relative to the server directory.
pub const CONFIG_FILE: &str = "config.json";

/// Mod loader (or none) the server jar was built for.
///
/// The loader decides the launch argument shape: Forge and NeoForge from
/// 1.17 onwards launch through a generated argument file instead of
/// `-jar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Loader {
    Vanilla,
    #[default]
    Fabric,
    Quilt,
    Forge,
    #[serde(alias = "Neoforge")]
    NeoForge,
}

impl Loader {
    /// Installer-created libraries directory holding the loader argument files.
    pub fn libraries_dir(&self) -> Option<&'static str> {
        match self {
            Loader::Forge => Some("libraries/net/minecraftforge/forge"),
            Loader::NeoForge => Some("libraries/net/neoforged/neoforge"),
            Loader::Vanilla | Loader::Fabric | Loader::Quilt => None,
        }
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Loader::Vanilla => "Vanilla",
            Loader::Fabric => "Fabric",
            Loader::Quilt => "Quilt",
            Loader::Forge => "Forge",
            Loader::NeoForge => "NeoForge",
        };
        f.write_str(name)
    }
}

/// Configuration for a supervised Minecraft server.
///
/// This structure defines how the server is launched and how it is
/// restarted. The supervisor only reads it.
///
/// # JSON Schema
///
/// ```json
/// {
///   "jdk_path": "/usr/lib/jvm/zulu-17",
///   "jar_name": "server.jar",
///   "min_memory": 4,
///   "max_memory": 8,
///   "loader": "Fabric",
///   "version": "1.20.1",
///   "reboot_seconds": 10,
///   "jvm_args": {
///     "server": true,
///     "XX_UseG1GC": true,
///     "XX_MaxGCPauseMillis": 200
///   }
/// }
/// ```
///
/// # Examples
///
/// ```
/// use mc_server_runner::config::{Loader, ServerConfig};
///
/// let config = ServerConfig::parse_from_str(r#"{ "loader": "Forge", "version": "1.16.5" }"#).unwrap();
/// assert_eq!(config.loader, Loader::Forge);
/// assert_eq!(config.jar_name, "server.jar");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Minimum heap size in GiB (`-Xms`).
    pub min_memory: u32,

    /// Maximum heap size in GiB (`-Xmx`).
    pub max_memory: u32,

    /// Server jar file name, relative to the server directory.
    pub jar_name: String,

    /// Game version, three dot-separated numbers.
    pub version: String,

    /// Mod loader the server runs on.
    pub loader: Loader,

    /// Root of an alternate Java installation.
    /// `None` (or the literal `"java"`) uses the runtime on `PATH`.
    #[serde(
        deserialize_with = "deserialize_jdk_path",
        skip_serializing_if = "Option::is_none"
    )]
    pub jdk_path: Option<PathBuf>,

    /// Seconds to count down between restarts.
    pub reboot_seconds: u64,

    /// Typed JVM flags, see [`JvmArgs`].
    pub jvm_args: JvmArgs,

    /// Launch even when the runtime does not match the game version.
    pub force_run: bool,

    /// Refuse to launch on a runtime mismatch instead of warning.
    pub strict_runtime_check: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            min_memory: 4,
            max_memory: 4,
            jar_name: "server.jar".to_string(),
            version: "1.20.1".to_string(),
            loader: Loader::default(),
            jdk_path: None,
            reboot_seconds: 10,
            jvm_args: JvmArgs::default(),
            force_run: false,
            strict_runtime_check: false,
        }
    }
}

fn deserialize_jdk_path<'de, D>(deserializer: D) -> std::result::Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != crate::runtime::JAVA_COMMAND)
        .map(PathBuf::from))
}

impl ServerConfig {
    /// Loads a configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be read
    /// * The file contents are not valid JSON
    /// * The JSON does not conform to the expected schema
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read config file: {}", e)))?;

        Self::parse_from_str(&content)
    }

    /// Loads a configuration file, or the defaults when it does not exist yet.
    ///
    /// A file that exists but does not parse is still an error, so a typo
    /// never silently resets the operator's settings.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Parses a configuration from a JSON string.
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Other(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
