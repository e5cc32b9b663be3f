use crate::config::Loader;
use std::path::{Path, PathBuf};

/// Loader-generated argument file for this platform.
#[cfg(windows)]
pub const ARGS_FILE: &str = "win_args.txt";
#[cfg(not(windows))]
pub const ARGS_FILE: &str = "unix_args.txt";

/// JVM options file the Forge installer leaves next to the server.
pub const USER_JVM_ARGS_FILE: &str = "user_jvm_args.txt";

/// Locate the argument file of an installed Forge or NeoForge server.
///
/// The libraries directory normally holds exactly one version
/// subdirectory. Entries are sorted so the choice is stable when more than
/// one is present. Returns `None` for loaders without an argument file, or
/// when the installation is missing; callers fall back to `-jar`.
pub fn find_args_file(server_dir: &Path, loader: Loader) -> Option<PathBuf> {
    let libraries = server_dir.join(loader.libraries_dir()?);

    let entries = match std::fs::read_dir(&libraries) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %libraries.display(), error = %e, "Loader libraries not readable");
            return None;
        }
    };

    let mut versions: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    versions.sort();

    if versions.len() > 1 {
        tracing::warn!(
            path = %libraries.display(),
            count = versions.len(),
            "Several {} installations found, using the first",
            loader
        );
    }

    let version_dir = versions.into_iter().next()?;
    let args_file = version_dir.join(ARGS_FILE);
    Some(std::path::absolute(&args_file).unwrap_or(args_file))
}

/// `@user_jvm_args.txt` when the installer left one in `server_dir`.
pub fn user_jvm_args(server_dir: &Path) -> Option<String> {
    server_dir
        .join(USER_JVM_ARGS_FILE)
        .is_file()
        .then(|| format!("@{}", USER_JVM_ARGS_FILE))
}
