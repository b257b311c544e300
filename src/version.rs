use crate::llm::{Transport, TransportError, ONE_SHOT_TIMEOUT};
use crate::weak_error;
use once_cell::sync;
use regex::Regex;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

const CRATES_IO_URL: &str = "https://crates.io/api/v1/crates/dbgchat";

/// SemVer version.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct Version(pub (u32, u32, u32));

impl Version {
    /// Parse the first `major.minor.patch` triple in a string like "0.3.1" or "dbgchat 0.3.1-rc1".
    pub fn parse(s: &str) -> Option<Self> {
        static V_RE: sync::Lazy<Regex> =
            sync::Lazy::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("must compile"));

        if let Some((_, [major, minor, patch])) = V_RE.captures_iter(s).next().map(|c| c.extract())
        {
            let major = weak_error!(major.parse::<u32>())?;
            let minor = weak_error!(minor.parse::<u32>())?;
            let patch = weak_error!(patch.parse::<u32>())?;
            return Some(Version((major, minor, patch)));
        }
        None
    }

    /// Version of this build.
    pub fn current() -> Self {
        Self::parse(env!("CARGO_PKG_VERSION")).unwrap_or(Version((0, 0, 0)))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (major, minor, patch) = self.0;
        write!(f, "{major}.{minor}.{patch}")
    }
}

#[derive(Deserialize)]
struct CrateInfo {
    #[serde(rename = "crate")]
    krate: CrateVersion,
}

#[derive(Deserialize)]
struct CrateVersion {
    max_version: String,
}

/// Return the latest published release version.
pub fn latest_published(transport: &dyn Transport) -> Result<Version, TransportError> {
    let body = transport.get(CRATES_IO_URL, ONE_SHOT_TIMEOUT)?;
    let info: CrateInfo =
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
    Version::parse(&info.krate.max_version).ok_or_else(|| {
        TransportError::Decode(format!("unexpected version: {}", info.krate.max_version))
    })
}
