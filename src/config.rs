//! Persisted connection settings.
//!
//! Settings live in a directory as three single-line files, each one holds a single `KEY="value"`
//! pair: `.secret.txt` (`OPENAI_KEY`), `.model.txt` (`MODEL`) and `.url.txt` (`URL`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("home directory not found, use --config-dir to set a configuration directory")]
    NoHome,
    #[error("could not find {what} file at {}, run `dbgchat config` to set it up", .path.display())]
    Missing { what: &'static str, path: PathBuf },
    #[error("{key} not found in {}", .path.display())]
    NoKey { key: &'static str, path: PathBuf },
    #[error("malformed configuration file {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Connection settings of the model endpoint, immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub api_key: String,
    pub model: String,
    pub endpoint_url: String,
}

#[derive(Clone, Copy)]
enum Entry {
    Key,
    Model,
    Url,
}

impl Entry {
    fn file(self) -> &'static str {
        match self {
            Entry::Key => ".secret.txt",
            Entry::Model => ".model.txt",
            Entry::Url => ".url.txt",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Entry::Key => "OPENAI_KEY",
            Entry::Model => "MODEL",
            Entry::Url => "URL",
        }
    }

    fn what(self) -> &'static str {
        match self {
            Entry::Key => "api key",
            Entry::Model => "model",
            Entry::Url => "url",
        }
    }
}

/// Directory with the configuration files.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    const DEFAULT_PATH: &'static str = ".config/dbgchat";

    /// Store at `~/.config/dbgchat`.
    pub fn default_location() -> Result<Self, ConfigError> {
        let home = home::home_dir().ok_or(ConfigError::NoHome)?;
        Ok(Self::at(home.join(Self::DEFAULT_PATH)))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the whole configuration, any missing part is an error.
    pub fn load(&self) -> Result<Configuration, ConfigError> {
        Ok(Configuration {
            api_key: self.read(Entry::Key)?,
            model: self.read(Entry::Model)?,
            endpoint_url: self.read(Entry::Url)?,
        })
    }

    pub fn store_key(&self, key: &str) -> Result<PathBuf, ConfigError> {
        self.write(Entry::Key, key)
    }

    pub fn store_model(&self, model: &str) -> Result<PathBuf, ConfigError> {
        self.write(Entry::Model, model)
    }

    pub fn store_url(&self, url: &str) -> Result<PathBuf, ConfigError> {
        self.write(Entry::Url, url)
    }

    /// Write default model and url files unless they already exist.
    /// Return paths of the written files.
    pub fn store_missing_defaults(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut written = vec![];
        for (entry, value) in [(Entry::Model, DEFAULT_MODEL), (Entry::Url, DEFAULT_URL)] {
            if !self.dir.join(entry.file()).exists() {
                written.push(self.write(entry, value)?);
            }
        }
        Ok(written)
    }

    fn read(&self, entry: Entry) -> Result<String, ConfigError> {
        let path = self.dir.join(entry.file());
        let data = fs::read_to_string(&path).map_err(|_| ConfigError::Missing {
            what: entry.what(),
            path: path.clone(),
        })?;

        let table: toml::Table = toml::from_str(&data).map_err(|e| ConfigError::Malformed {
            path: path.clone(),
            reason: e.message().to_string(),
        })?;
        match table.get(entry.key()) {
            Some(toml::Value::String(value)) if !value.is_empty() => Ok(value.clone()),
            _ => Err(ConfigError::NoKey {
                key: entry.key(),
                path,
            }),
        }
    }

    fn write(&self, entry: Entry, value: &str) -> Result<PathBuf, ConfigError> {
        let path = self.dir.join(entry.file());
        let line = format!(
            "{}={}\n",
            entry.key(),
            toml::Value::String(value.to_string())
        );
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&path, line))
            .map_err(|source| ConfigError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("nested"));

        store.store_key("sk-123").unwrap();
        store.store_model(DEFAULT_MODEL).unwrap();
        let path = store.store_url(DEFAULT_URL).unwrap();
        assert_eq!(path, dir.path().join("nested/.url.txt"));

        let config = store.load().unwrap();
        assert_eq!(
            config,
            Configuration {
                api_key: "sk-123".to_string(),
                model: DEFAULT_MODEL.to_string(),
                endpoint_url: DEFAULT_URL.to_string(),
            }
        );
    }

    #[test]
    fn test_load_hand_written_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".secret.txt"), "OPENAI_KEY=\"sk-abc\"").unwrap();
        fs::write(dir.path().join(".model.txt"), "MODEL=\"gpt-4o\"\n").unwrap();
        fs::write(dir.path().join(".url.txt"), "URL=\"http://localhost:8080/v1\"").unwrap();

        let config = ConfigStore::at(dir.path()).load().unwrap();
        assert_eq!(config.api_key, "sk-abc");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.endpoint_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path());

        assert!(matches!(
            store.load(),
            Err(ConfigError::Missing {
                what: "api key",
                ..
            })
        ));

        store.store_key("sk").unwrap();
        fs::write(dir.path().join(".model.txt"), "NAME=\"gpt-4o\"").unwrap();
        assert!(matches!(
            store.load(),
            Err(ConfigError::NoKey { key: "MODEL", .. })
        ));

        fs::write(dir.path().join(".model.txt"), "MODEL=gpt-4o").unwrap();
        assert!(matches!(store.load(), Err(ConfigError::Malformed { .. })));
    }

    #[test]
    fn test_store_missing_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path());
        store.store_key("sk").unwrap();
        store.store_model("gpt-4o").unwrap();

        let written = store.store_missing_defaults().unwrap();
        assert_eq!(written, vec![dir.path().join(".url.txt")]);
        assert!(store.store_missing_defaults().unwrap().is_empty());

        let config = store.load().unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.endpoint_url, DEFAULT_URL);
    }

    #[test]
    fn test_value_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path());
        store.store_key("a\"b").unwrap();
        store.store_model("m").unwrap();
        store.store_url("u").unwrap();
        assert_eq!(store.load().unwrap().api_key, "a\"b");
    }
}
