//! Script locations and fetching.
//!
//! Supported forms:
//! - plain filesystem path or `file://` URL;
//! - `bundled:<name>` for scripts shipped inside this crate;
//! - `http://` / `https://` URL.
use std::{
    fmt,
    path::{Path, PathBuf},
    time::SystemTime,
};

use tracing::trace;
use url::Url;

/// Scripts compiled into the binary, addressable as `bundled:<name>`.
const BUNDLED: &[(&str, &str)] = &[
    (
        "first-candidate.rhai",
        include_str!("../scripts/first-candidate.rhai"),
    ),
    (
        "no-preference.json",
        include_str!("../scripts/no-preference.json"),
    ),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptSource {
    File(PathBuf),
    Bundled(String),
    Http(Url),
}

/// Script text together with its modification marker, when the source has one.
#[derive(Clone, Debug)]
pub(crate) struct Fetched {
    pub text: String,
    pub modified: Option<SystemTime>,
}

impl ScriptSource {
    /// Parse a script location.
    pub fn parse(uri: &str) -> Result<Self, String> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err("empty script location".into());
        }

        let url = match Url::parse(uri) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Ok(ScriptSource::File(PathBuf::from(uri)));
            }
            Err(e) => return Err(format!("invalid script location '{uri}': {e}")),
        };

        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(ScriptSource::File)
                .map_err(|_| format!("invalid file URL '{uri}'")),
            "bundled" => Ok(ScriptSource::Bundled(url.path().to_string())),
            "http" | "https" => Ok(ScriptSource::Http(url)),
            other => Err(format!("unsupported script scheme '{other}'")),
        }
    }

    /// Lower-cased file extension of the script name, used to pick an engine.
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            ScriptSource::File(path) => path.to_string_lossy().into_owned(),
            ScriptSource::Bundled(name) => name.clone(),
            ScriptSource::Http(url) => url.path().to_string(),
        };
        Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(str::to_ascii_lowercase)
    }

    /// Cheap change probe: the modification time, where the source has one.
    pub(crate) async fn modified(&self) -> Option<SystemTime> {
        match self {
            ScriptSource::File(path) => tokio::fs::metadata(path)
                .await
                .ok()
                .and_then(|m| m.modified().ok()),
            ScriptSource::Bundled(_) | ScriptSource::Http(_) => None,
        }
    }

    /// Read the full script text.
    pub(crate) async fn fetch(&self) -> Result<Fetched, String> {
        trace!(source = %self, "fetching script");
        match self {
            ScriptSource::File(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
                Ok(Fetched {
                    text,
                    modified: self.modified().await,
                })
            }
            ScriptSource::Bundled(name) => BUNDLED
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, text)| Fetched {
                    text: (*text).to_string(),
                    modified: None,
                })
                .ok_or_else(|| format!("no bundled script named '{name}'")),
            ScriptSource::Http(url) => {
                let client = reqwest::Client::builder()
                    .user_agent(concat!("binder/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .map_err(|e| format!("http client: {e}"))?;
                let text = client
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| format!("failed to fetch {url}: {e}"))?
                    .text()
                    .await
                    .map_err(|e| format!("failed to read body of {url}: {e}"))?;
                Ok(Fetched {
                    text,
                    modified: None,
                })
            }
        }
    }
}

impl fmt::Display for ScriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptSource::File(path) => write!(f, "{}", path.display()),
            ScriptSource::Bundled(name) => write!(f, "bundled:{name}"),
            ScriptSource::Http(url) => write!(f, "{url}"),
        }
    }
}
