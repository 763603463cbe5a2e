//! Defaults and settings for fetching patches.

use crate::TransportError;

/// Largest fragment, in bytes, pulled from a stream at once.
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

/// Mercurial server the raw patches are fetched from.
pub const DEFAULT_HG_URL: &str = "https://hg.mozilla.org";

/// Channel used when none is given.
pub const DEFAULT_CHANNEL: &str = "nightly";

/// Settings for [`crate::HgFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Server root, without a trailing slash
    pub base_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_HG_URL.to_string(),
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// URL of the raw patch of `revision` on `channel`.
    pub fn raw_revision_url(&self, channel: &str, revision: &str) -> Result<String, TransportError> {
        Ok(format!(
            "{}/{}/raw-rev/{}",
            self.base_url,
            repository(channel)?,
            revision
        ))
    }
}

/// Repository path serving a release channel.
pub fn repository(channel: &str) -> Result<String, TransportError> {
    let path = match channel {
        "nightly" | "central" => "mozilla-central".to_string(),
        "beta" => "releases/mozilla-beta".to_string(),
        "release" => "releases/mozilla-release".to_string(),
        "autoland" => "integration/autoland".to_string(),
        "inbound" => "integration/mozilla-inbound".to_string(),
        "try" => "try".to_string(),
        esr if is_esr(esr) => format!("releases/mozilla-{esr}"),
        _ => {
            return Err(TransportError::UnknownChannel {
                channel: channel.to_string(),
            });
        }
    };
    Ok(path)
}

fn is_esr(channel: &str) -> bool {
    channel
        .strip_prefix("esr")
        .is_some_and(|version| !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()))
}
