use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Errors for resolving the home directory
#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("HOME environment variable is not set")]
    HomeMissing,
    #[error("APPDATA environment variable is not set")]
    AppDataMissing,
    #[error("home_dir must be an absolute path (after ~ expansion): {0}")]
    AbsoluteRequired(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve the host's home directory.
///
/// A provided path may start with `~` (expanded against the user profile)
/// and must be absolute after expansion. Without one, the platform
/// default is used: `%APPDATA%/<default_subdir>` on Windows,
/// `$HOME/<default_subdir>` elsewhere. With `create`, the directory is
/// created if missing.
pub fn resolve_home_dir(
    config_home: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let path = match config_home {
        Some(raw) => {
            let expanded = if raw == "~" {
                PathBuf::from(user_home()?)
            } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
                Path::new(&user_home()?).join(rest)
            } else {
                PathBuf::from(&raw)
            };
            if !expanded.is_absolute() {
                return Err(HomeDirError::AbsoluteRequired(
                    expanded.to_string_lossy().into(),
                ));
            }
            expanded
        }
        None => platform_base()?.join(default_subdir),
    };

    if create {
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}

#[cfg(target_os = "windows")]
fn user_home() -> Result<String, HomeDirError> {
    env::var("USERPROFILE")
        .or_else(|_| env::var("HOME"))
        .map_err(|_| HomeDirError::HomeMissing)
}

#[cfg(not(target_os = "windows"))]
fn user_home() -> Result<String, HomeDirError> {
    env::var("HOME").map_err(|_| HomeDirError::HomeMissing)
}

#[cfg(target_os = "windows")]
fn platform_base() -> Result<PathBuf, HomeDirError> {
    env::var("APPDATA")
        .map(PathBuf::from)
        .map_err(|_| HomeDirError::AppDataMissing)
}

#[cfg(not(target_os = "windows"))]
fn platform_base() -> Result<PathBuf, HomeDirError> {
    user_home().map(PathBuf::from)
}
