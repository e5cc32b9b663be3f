use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

pub const EULA_FILE: &str = "eula.txt";

const EULA_ACCEPTED: &str = "#Accepted by mc-server-runner\neula=true\n";

/// Accept the Minecraft EULA for the server in `server_dir`.
///
/// Overwrites any existing `eula.txt` and returns its path.
pub fn accept_eula(server_dir: &Path) -> Result<PathBuf> {
    let path = server_dir.join(EULA_FILE);
    std::fs::write(&path, EULA_ACCEPTED).map_err(|e| {
        Error::Environment(format!("Failed to write {}: {}", path.display(), e))
    })?;
    tracing::info!(path = %path.display(), "EULA accepted");
    Ok(path)
}

/// Whether `server_dir` holds an `eula.txt` with `eula=true`.
pub fn eula_accepted(server_dir: &Path) -> bool {
    std::fs::read_to_string(server_dir.join(EULA_FILE))
        .map(|contents| {
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#'))
                .any(|line| line.eq_ignore_ascii_case("eula=true"))
        })
        .unwrap_or(false)
}
