use std::path::{Path, PathBuf};

/// Resolve the uncookie root directory.
///
/// Priority:
/// 1. `--root` flag / `UNCOOKIE_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.uncookie/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    uncookie_core::paths::find_root(&cwd).unwrap_or(cwd)
}
