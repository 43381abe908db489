use ocusage_types::DirectoryHash;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Points at the OpenCode data directory; storage lives in `storage/` below it
pub const OPENCODE_DATA_DIR_ENV: &str = "OPENCODE_DATA_DIR";

/// Overrides the ocusage config file location
pub const CONFIG_PATH_ENV: &str = "OCUSAGE_CONFIG";

/// Hex characters kept from the directory digest
const DIRECTORY_HASH_LEN: usize = 16;

/// Resolve the OpenCode storage root based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. OPENCODE_DATA_DIR environment variable, joined with `storage`
/// 3. XDG_DATA_HOME/opencode/storage
/// 4. ~/.local/share/opencode/storage (OpenCode uses XDG paths on every platform)
pub fn resolve_storage_root(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(&path.to_string_lossy()));
    }

    if let Some(data_dir) = non_empty_env(OPENCODE_DATA_DIR_ENV) {
        return Ok(expand_tilde(&data_dir).join("storage"));
    }

    if let Some(xdg) = non_empty_env("XDG_DATA_HOME") {
        return Ok(expand_tilde(&xdg).join("opencode").join("storage"));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        Error::Config("Could not determine OpenCode storage path: no HOME directory".to_string())
    })?;
    Ok(home
        .join(".local")
        .join("share")
        .join("opencode")
        .join("storage"))
}

/// Default export destination: `<system data dir>/ocusage`, or `~/.ocusage`
/// on systems without a standard data directory
pub fn default_output_dir() -> Result<PathBuf> {
    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("ocusage"));
    }

    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".ocusage"));
    }

    Err(Error::Config(
        "Could not determine output path: no HOME directory or system data directory found"
            .to_string(),
    ))
}

/// Config file location: OCUSAGE_CONFIG, else `<config dir>/ocusage/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(path) = non_empty_env(CONFIG_PATH_ENV) {
        return Ok(expand_tilde(&path));
    }

    dirs::config_dir()
        .map(|dir| dir.join("ocusage").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Short SHA256 digest of a working directory string.
///
/// The raw path text is hashed without canonicalization: the directory may
/// no longer exist, and the name must stay stable across runs.
pub fn directory_hash(directory: &Path) -> DirectoryHash {
    let mut hasher = Sha256::new();
    hasher.update(directory.to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    DirectoryHash::new(&digest[..DIRECTORY_HASH_LEN])
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
