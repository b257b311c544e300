use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CLASSIFY_FILE: &str = "stage1_classify.md";
pub const SELECT_FILE: &str = "stage3_select_command.md";
pub const SYNTHESIZE_FILE: &str = "stage5_generate_final_command.md";

#[derive(Debug, thiserror::Error)]
#[error("could not load system prompt {}: {source}", .path.display())]
pub struct PromptError {
    path: PathBuf,
    source: io::Error,
}

/// Templates of the three model-facing stages of command resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePromptSet {
    pub classify: String,
    pub select: String,
    pub synthesize: String,
}

impl StagePromptSet {
    pub fn builtin() -> Self {
        Self {
            classify: include_str!("preset/stage1_classify.md").to_string(),
            select: include_str!("preset/stage3_select_command.md").to_string(),
            synthesize: include_str!("preset/stage5_generate_final_command.md").to_string(),
        }
    }

    /// Load all templates from a directory. If any of them is unavailable nothing is loaded.
    pub fn load(dir: &Path) -> Result<Self, PromptError> {
        let read = |file: &str| {
            let path = dir.join(file);
            fs::read_to_string(&path).map_err(|source| PromptError { path, source })
        };

        Ok(Self {
            classify: read(CLASSIFY_FILE)?,
            select: read(SELECT_FILE)?,
            synthesize: read(SYNTHESIZE_FILE)?,
        })
    }
}

/// Lazily loaded prompt set. A failed load is retried on every request until it succeeds,
/// after that the set stays for the session lifetime.
#[derive(Debug)]
pub struct PromptSource {
    dir: Option<PathBuf>,
    loaded: Option<StagePromptSet>,
}

impl PromptSource {
    pub fn builtin() -> Self {
        Self {
            dir: None,
            loaded: Some(StagePromptSet::builtin()),
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            loaded: None,
        }
    }

    pub fn get(&mut self) -> Result<&StagePromptSet, PromptError> {
        let prompts = match (self.loaded.take(), &self.dir) {
            (Some(prompts), _) => prompts,
            (None, Some(dir)) => StagePromptSet::load(dir)?,
            (None, None) => StagePromptSet::builtin(),
        };
        Ok(self.loaded.insert(prompts))
    }
}
