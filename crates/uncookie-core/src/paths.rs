use std::path::{Path, PathBuf};

pub const UNCOOKIE_DIR: &str = ".uncookie";
pub const CONFIG_FILE: &str = ".uncookie/config.yaml";
pub const STATE_FILE: &str = ".uncookie/state.yaml";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

/// Walk upward from `start` looking for a directory that holds `.uncookie/`.
pub fn find_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(UNCOOKIE_DIR).is_dir())
        .map(Path::to_path_buf)
}
