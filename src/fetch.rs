//! Fetching raw patches over HTTP.

use crate::TransportError;
use crate::config::FetchConfig;
use crate::source::ReadFragments;

/// Text fragments of a patch, in order.
pub type Fragments = Box<dyn Iterator<Item = Result<String, TransportError>>>;

/// Source of patch text for a revision.
pub trait FetchPatch {
    /// Start fetching the patch of `revision` on `channel`, delivered in
    /// fragments of at most `chunk_size` bytes.
    fn fetch(&self, revision: &str, channel: &str, chunk_size: usize)
    -> Result<Fragments, TransportError>;
}

/// Fetches `raw-rev` patches from a Mercurial server.
pub struct HgFetcher {
    client: reqwest::blocking::Client,
    config: FetchConfig,
}

impl HgFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            config,
        }
    }
}

impl Default for HgFetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

impl FetchPatch for HgFetcher {
    fn fetch(
        &self,
        revision: &str,
        channel: &str,
        chunk_size: usize,
    ) -> Result<Fragments, TransportError> {
        let url = self.config.raw_revision_url(channel, revision)?;
        tracing::debug!(%url, "fetching patch");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| TransportError::Request {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }

        Ok(Box::new(ReadFragments::new(response, chunk_size)))
    }
}
