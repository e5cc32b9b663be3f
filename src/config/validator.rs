use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::launch::{JvmArgValue, jvm_args};
use crate::runtime::Version;

/// Allowed values of `XX_G1HeapRegionSize`, in MiB.
pub const HEAP_REGION_SIZES: [i64; 6] = [1, 2, 4, 8, 16, 32];

/// Allowed range of `XX_MaxGCPauseMillis`.
pub const GC_PAUSE_RANGE: std::ops::RangeInclusive<i64> = 50..=1000;

/// Validates heap bounds and the jar name
pub fn validate_launch_settings(config: &ServerConfig) -> Result<()> {
    if config.min_memory == 0 || config.max_memory == 0 {
        return Err(Error::ConfigInvalid(
            "Heap sizes must be at least 1 GiB".to_string(),
        ));
    }

    if config.min_memory > config.max_memory {
        return Err(Error::ConfigInvalid(format!(
            "Minimum heap ({} GiB) exceeds maximum heap ({} GiB)",
            config.min_memory, config.max_memory
        )));
    }

    if config.jar_name.trim().is_empty() {
        return Err(Error::ConfigInvalid("Server jar name is empty".to_string()));
    }

    config.version.parse::<Version>()?;

    Ok(())
}

/// Validates the values of known JVM flags.
///
/// Unknown keys are left alone; they are ignored when the command is built.
pub fn validate_jvm_args(config: &ServerConfig) -> Result<()> {
    if let Some(JvmArgValue::Int(size)) = config.jvm_args.get(jvm_args::HEAP_REGION_SIZE) {
        if !HEAP_REGION_SIZES.contains(size) {
            return Err(Error::ConfigInvalid(format!(
                "{} must be one of {:?}, got {}",
                jvm_args::HEAP_REGION_SIZE,
                HEAP_REGION_SIZES,
                size
            )));
        }
    }

    if let Some(JvmArgValue::Int(pause)) = config.jvm_args.get(jvm_args::MAX_GC_PAUSE) {
        if !GC_PAUSE_RANGE.contains(pause) {
            return Err(Error::ConfigInvalid(format!(
                "{} must be between {} and {}, got {}",
                jvm_args::MAX_GC_PAUSE,
                GC_PAUSE_RANGE.start(),
                GC_PAUSE_RANGE.end(),
                pause
            )));
        }
    }

    Ok(())
}

/// Full configuration validation
pub fn validate_config(config: &ServerConfig) -> Result<()> {
    validate_launch_settings(config)?;
    validate_jvm_args(config)?;

    Ok(())
}
