// to be called on main startup and quit; saves state of app so we can reload it later
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::pipeline::project::ProjectState;

pub const BEATSCOPE_DIR: &str = ".beatscope";
const PROJECT_FILE: &str = "project.json";
const PATTERNS_FILE: &str = "patterns.json";
const LOG_FILE: &str = "beatscope.log";

// <project_dir>/.beatscope
pub fn state_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(BEATSCOPE_DIR)
}

// <project_dir>/.beatscope/project.json
fn project_file_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(PROJECT_FILE)
}

// <project_dir>/.beatscope/patterns.json
pub fn patterns_file_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(PATTERNS_FILE)
}

// <project_dir>/.beatscope/beatscope.log
pub fn default_log_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(LOG_FILE)
}

// Missing file is the normal first run; a corrupt one is logged and ignored.
pub fn load_project(project_dir: &Path) -> Option<ProjectState> {
    let path = project_file_path(project_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(state) => Some(state),
        Err(err) => {
            tracing::warn!("ignoring unreadable {}: {err}", path.display());
            None
        }
    }
}

// Save the project state to disk, making the files if they don't exist already
pub fn save_project(project_dir: &Path, state: &ProjectState) -> anyhow::Result<()> {
    let path = project_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent) // create .beatscope/ if needed
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
