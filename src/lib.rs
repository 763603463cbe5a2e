//! Line-level change maps from unified git patches.
//!
//! A patch is read once, forward only, one fragment at a time. For every file
//! the caller's interest predicate accepts, the result records whether the
//! file is new or which of its lines were added, deleted or touched.
//!
//! ```
//! use patch_lines::{FileChange, PatchParser};
//!
//! let patch = "\
//! diff --git a/src/main.cpp b/src/main.cpp
//! index 1111111..2222222 100644
//! --- a/src/main.cpp
//! +++ b/src/main.cpp
//! @@ -10,2 +10,3 @@ int main() {
//!    int a = 0;
//! -  return a;
//! +  return a + 1;
//! +
//! ";
//! let parser = PatchParser::new(|path: &str| path.ends_with(".cpp"));
//! let result = parser.parse_str(patch).unwrap();
//! assert_eq!(
//!     result["src/main.cpp"],
//!     FileChange::Modified { added: vec![], deleted: vec![], touched: vec![11] }
//! );
//! ```

use error_set::error_set;
use std::fmt;
use std::io::Read;
use std::path::Path;

mod change;
pub mod config;
pub mod diff;
pub mod fetch;
pub mod interest;
pub mod scanner;
pub mod source;

pub use change::{FileChange, PatchResult};
pub use config::FetchConfig;
pub use fetch::{FetchPatch, HgFetcher};
pub use interest::ExtensionFilter;

use diff::DiffScanner;
use scanner::Scanner;
use source::{ChunkSource, ReadFragments};

error_set! {
    /// Any fault that abandons a parse
    PatchError := ScanError || TransportError

    /// Structural faults found while scanning a patch
    ScanError := {
        /// A `diff --git` line without two paths
        #[display("Malformed file header at line {line_number}: '{text}'")]
        MalformedFileHeader { line_number: usize, text: String },
        /// A line starting with `@` that is not a hunk header
        #[display("Malformed hunk header at line {line_number}: '{text}'")]
        MalformedHunkHeader { line_number: usize, text: String },
        /// Input ended right after a hunk header announcing lines
        #[display("Patch ends inside a hunk of {path} at line {line_number}")]
        Truncated { path: String, line_number: usize },
        /// A hunk runs past the largest representable line number
        #[display("Line numbers of {path} overflow")]
        LineOverflow { path: String },
    }

    /// Faults while obtaining patch text
    TransportError := {
        #[display("Request to {url} failed: {message}")]
        Request { url: String, message: String },
        #[display("Request to {url} returned status {status}")]
        Status { url: String, status: u16 },
        #[display("Failed to read patch: {message}")]
        Read { message: String },
        #[display("Unknown channel '{channel}'")]
        UnknownChannel { channel: String },
    }
}

/// A parse abandoned because of `error`, tagged with the patch it concerns.
#[derive(Debug)]
pub struct Fault {
    pub patch_id: String,
    pub error: PatchError,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in parsing patch {}: {}", self.patch_id, self.error)
    }
}

impl std::error::Error for Fault {}

/// Receiver of abandoned parses.
pub trait FaultSink {
    fn report(&self, fault: &Fault);
}

/// Reports faults as `tracing` errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FaultSink for TracingSink {
    fn report(&self, fault: &Fault) {
        tracing::error!(patch = %fault.patch_id, error = %fault.error, "error in parsing patch");
    }
}

/// Collapse a parse outcome to a result map.
///
/// A fault is reported to `sink` once and yields an empty map: one broken
/// hunk anywhere discards the results of every file in the patch.
pub fn recover(outcome: Result<PatchResult, Fault>, sink: &dyn FaultSink) -> PatchResult {
    outcome.unwrap_or_else(|fault| {
        sink.report(&fault);
        PatchResult::new()
    })
}

/// Parse an in-memory patch, logging any fault and returning an empty map
/// for it.
pub fn parse_patch<P>(patch: &str, interest: P) -> PatchResult
where
    P: Fn(&str) -> bool,
{
    recover(PatchParser::new(interest).parse_str(patch), &TracingSink)
}

/// Entry points for the supported ways of supplying a patch.
pub struct PatchParser<P> {
    interest: P,
    chunk_size: usize,
}

impl<P> PatchParser<P>
where
    P: Fn(&str) -> bool,
{
    /// Create a parser keeping only files whose new path satisfies `interest`.
    pub fn new(interest: P) -> Self {
        Self {
            interest,
            chunk_size: config::DEFAULT_CHUNK_SIZE,
        }
    }

    /// Largest fragment, in bytes, pulled from readers and fetchers.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Parse a patch held in memory.
    pub fn parse_str(&self, patch: &str) -> Result<PatchResult, Fault> {
        self.parse_fragments("<inline>", std::iter::once(Ok(patch.to_string())))
    }

    /// Parse a patch file, read whole.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<PatchResult, Fault> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| TransportError::Read {
            message: format!("{}: {}", path.display(), e),
        });
        self.parse_fragments(&path.display().to_string(), std::iter::once(contents))
    }

    /// Parse a patch streamed from `reader` in fragments of at most
    /// `chunk_size` bytes.
    pub fn parse_reader<R: Read>(&self, patch_id: &str, reader: R) -> Result<PatchResult, Fault> {
        self.parse_fragments(patch_id, ReadFragments::new(reader, self.chunk_size))
    }

    /// Fetch the patch of `revision` on `channel` and parse it as it streams in.
    pub fn parse_revision<F>(
        &self,
        fetcher: &F,
        revision: &str,
        channel: &str,
    ) -> Result<PatchResult, Fault>
    where
        F: FetchPatch + ?Sized,
    {
        tracing::info!(revision, channel, "get patch for revision");
        match fetcher.fetch(revision, channel, self.chunk_size) {
            Ok(fragments) => self.parse_fragments(revision, fragments),
            Err(error) => Err(Fault {
                patch_id: revision.to_string(),
                error: error.into(),
            }),
        }
    }

    /// Parse a patch supplied as an arbitrary sequence of text fragments.
    pub fn parse_fragments<T>(&self, patch_id: &str, fragments: T) -> Result<PatchResult, Fault>
    where
        T: IntoIterator<Item = Result<String, TransportError>>,
    {
        self.scan(fragments).map_err(|error| Fault {
            patch_id: patch_id.to_string(),
            error,
        })
    }

    fn scan<T>(&self, fragments: T) -> Result<PatchResult, PatchError>
    where
        T: IntoIterator<Item = Result<String, TransportError>>,
    {
        let source = ChunkSource::open(fragments)?;
        DiffScanner::new(Scanner::new(source), &self.interest).run()
    }
}
