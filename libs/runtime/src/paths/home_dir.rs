use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeDirError {
    #[error("cannot determine the user's home directory")]
    NoHome,
    #[error("cannot determine the current working directory: {0}")]
    Cwd(#[source] std::io::Error),
    #[error("failed to create home directory '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve the service home directory into an absolute path.
///
/// - `None` (or blank) selects the platform default: `<home>/<default_subdir>`
///   (`%APPDATA%` stands in for `<home>` on Windows).
/// - A leading `~` is expanded to the user's home directory.
/// - Relative paths are resolved against the current working directory.
///
/// With `create = true` the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let resolved = match configured.as_deref().map(str::trim) {
        None | Some("") => platform_base()?.join(default_subdir),
        Some(raw) => absolutize(&expand_tilde(raw)?)?,
    };

    if create {
        std::fs::create_dir_all(&resolved).map_err(|source| HomeDirError::Create {
            path: resolved.clone(),
            source,
        })?;
    }
    Ok(resolved)
}

#[cfg(windows)]
fn platform_base() -> Result<PathBuf, HomeDirError> {
    dirs::config_dir().ok_or(HomeDirError::NoHome)
}

#[cfg(not(windows))]
fn platform_base() -> Result<PathBuf, HomeDirError> {
    dirs::home_dir().ok_or(HomeDirError::NoHome)
}

fn expand_tilde(raw: &str) -> Result<PathBuf, HomeDirError> {
    if raw == "~" {
        return dirs::home_dir().ok_or(HomeDirError::NoHome);
    }
    match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        Some(rest) => Ok(dirs::home_dir().ok_or(HomeDirError::NoHome)?.join(rest)),
        None => Ok(PathBuf::from(raw)),
    }
}

fn absolutize(p: &Path) -> Result<PathBuf, HomeDirError> {
    if p.is_absolute() {
        Ok(p.to_path_buf())
    } else {
        Ok(std::env::current_dir().map_err(HomeDirError::Cwd)?.join(p))
    }
}
