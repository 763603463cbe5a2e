use patch_lines::fetch::Fragments;
use patch_lines::{
    ExtensionFilter, FaultSink, FetchPatch, FileChange, Fault, PatchError, PatchParser,
    PatchResult, TransportError, parse_patch, recover,
};
use proptest::prelude::*;
use similar_asserts::assert_eq;
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// An `hg export` style patch touching several kinds of files
const PATCH: &str = r#"# HG changeset patch
# User Jane Doe <jane@example.com>
# Date 1700000000 0
# Node ID 0123456789abcdef0123456789abcdef01234567
# Parent  fedcba9876543210fedcba9876543210fedcba98
Bug 1800000 - Tidy up element layout. r=reviewer

diff --git a/dom/base/Element.cpp b/dom/base/Element.cpp
--- a/dom/base/Element.cpp
+++ b/dom/base/Element.cpp
@@ -100,7 +100,8 @@ void Element::Layout()
   int width = 0;
-  int height = 0;
-  int depth = 0;
+  int height = 1;
+  // height starts at one
+
+  int depth = 0;
   Compute(width);
@@ -200,3 +201,2 @@ void Element::Paint()
   Begin();
-  Flush();
   End();
diff --git a/dom/base/Element.h b/dom/base/Element.h
new file mode 100644
--- /dev/null
+++ b/dom/base/Element.h
@@ -0,0 +1,2 @@
+#pragma once
+class Element;
diff --git a/toolkit/Old.jsm b/toolkit/Old.jsm
deleted file mode 100644
--- a/toolkit/Old.jsm
+++ /dev/null
@@ -1,1 +0,0 @@
-var EXPORTED_SYMBOLS = [];
diff --git a/docs/README.md b/docs/README.md
--- a/docs/README.md
+++ b/docs/README.md
@@ -1 +1 @@
-Old
+New
diff --git a/widget/icon.png b/widget/icon.png
new file mode 100644
index 0000000000000000000000000000000000000000..1111111111111111111111111111111111111111
GIT binary patch
literal 4
Lcmb=e00001

literal 0
HcmV?d00001

diff --git a/gfx/Moved.cpp b/gfx/Renamed.cpp
similarity index 95%
rename from gfx/Moved.cpp
rename to gfx/Renamed.cpp
--- a/gfx/Moved.cpp
+++ b/gfx/Renamed.cpp
@@ -1,1 +1,1 @@
-int h();
+int h(int);
diff --git a/gfx/My Name.cpp b/gfx/My Name.cpp
--- a/gfx/My Name.cpp
+++ b/gfx/My Name.cpp
@@ -5,2 +5,2 @@
 int f();
-int g();
+int g(int);
"#;

/// A patch whose second hunk header is broken
const BROKEN: &str = r#"diff --git a/a.cpp b/a.cpp
--- a/a.cpp
+++ b/a.cpp
@@ -1 +1 @@
-x();
+y();
@@ -9,2 +9,two @@
 z();
"#;

fn expected() -> PatchResult {
    PatchResult::from([
        (
            "dom/base/Element.cpp".to_string(),
            FileChange::Modified {
                added: vec![104],
                deleted: vec![202],
                touched: vec![101, 102],
            },
        ),
        ("dom/base/Element.h".to_string(), FileChange::New),
        (
            "gfx/My Name.cpp".to_string(),
            FileChange::Modified {
                added: vec![],
                deleted: vec![],
                touched: vec![6],
            },
        ),
    ])
}

fn parser() -> PatchParser<impl Fn(&str) -> bool> {
    let filter = ExtensionFilter::default();
    PatchParser::new(move |path: &str| filter.is_interesting(path))
}

/// Split `text` into fragments of at most `size` bytes (ASCII input only)
fn chunks(text: &str, size: usize) -> Vec<Result<String, TransportError>> {
    text.as_bytes()
        .chunks(size)
        .map(|chunk| Ok(String::from_utf8_lossy(chunk).into_owned()))
        .collect()
}

/// Temporary directory holding patch files
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn write_patch(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }
}

/// Fetcher serving a canned patch and remembering what it was asked for
struct FakeFetcher {
    /// Patch text, or the HTTP status the fetch fails with
    patch: Result<String, u16>,
    requests: RefCell<Vec<(String, String, usize)>>,
}

impl FakeFetcher {
    fn serving(patch: &str) -> Self {
        Self {
            patch: Ok(patch.to_string()),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            patch: Err(status),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl FetchPatch for FakeFetcher {
    fn fetch(
        &self,
        revision: &str,
        channel: &str,
        chunk_size: usize,
    ) -> Result<Fragments, TransportError> {
        self.requests
            .borrow_mut()
            .push((revision.to_string(), channel.to_string(), chunk_size));
        match &self.patch {
            Ok(patch) => Ok(Box::new(chunks(patch, chunk_size).into_iter())),
            Err(status) => Err(TransportError::Status {
                url: format!("https://hg.example/mozilla-central/raw-rev/{revision}"),
                status: *status,
            }),
        }
    }
}

/// Sink keeping the message of every reported fault
#[derive(Default)]
struct RecordingSink {
    reports: RefCell<Vec<String>>,
}

impl FaultSink for RecordingSink {
    fn report(&self, fault: &Fault) {
        self.reports.borrow_mut().push(fault.to_string());
    }
}

// =============================================================================
// Supply modes
// =============================================================================

#[test]
fn parse_in_memory_patch() {
    assert_eq!(parser().parse_str(PATCH).unwrap(), expected());
}

#[test]
fn parse_patch_file() {
    let fixture = Fixture::new();
    let path = fixture.write_patch("layout.patch", PATCH);

    assert_eq!(parser().parse_file(&path).unwrap(), expected());
}

#[test]
fn parse_patch_file_with_crlf_endings() {
    let fixture = Fixture::new();
    let path = fixture.write_patch("layout.patch", &PATCH.replace('\n', "\r\n"));

    assert_eq!(parser().parse_file(&path).unwrap(), expected());
}

#[test]
fn missing_patch_file_is_a_read_fault() {
    let fixture = Fixture::new();
    let path = fixture.dir.path().join("absent.patch");

    let fault = parser().parse_file(&path).unwrap_err();
    assert_eq!(fault.patch_id, path.display().to_string());
    assert!(matches!(fault.error, PatchError::Read { .. }), "{fault}");
}

#[test]
fn parse_reader_in_small_chunks() {
    let parser = parser().with_chunk_size(7);
    assert_eq!(parser.chunk_size(), 7);

    let result = parser.parse_reader("stdin", PATCH.as_bytes()).unwrap();
    assert_eq!(result, expected());
}

#[test]
fn zero_chunk_size_reads_one_byte() {
    assert_eq!(parser().with_chunk_size(0).chunk_size(), 1);
}

#[test]
fn parse_reader_one_byte_at_a_time() {
    let result = parser()
        .with_chunk_size(1)
        .parse_reader("stdin", PATCH.as_bytes())
        .unwrap();
    assert_eq!(result, expected());
}

#[test]
fn transport_error_mid_stream_abandons_parse() {
    let mut fragments = chunks(PATCH, 64);
    fragments.truncate(5);
    fragments.push(Err(TransportError::Read {
        message: "connection reset".to_string(),
    }));

    let fault = parser().parse_fragments("c0ffee", fragments).unwrap_err();
    assert_eq!(fault.patch_id, "c0ffee");
    assert_eq!(
        fault.to_string(),
        "Error in parsing patch c0ffee: Failed to read patch: connection reset"
    );
}

#[test]
fn unterminated_last_line_is_parsed() {
    let patch = PATCH.trim_end_matches('\n');
    assert_eq!(parser().parse_str(patch).unwrap(), expected());
}

// =============================================================================
// Revisions
// =============================================================================

#[test]
fn parse_revision_streams_fetched_patch() {
    let fetcher = FakeFetcher::serving(PATCH);
    let parser = parser().with_chunk_size(16);

    let result = parser.parse_revision(&fetcher, "c0ffee", "beta").unwrap();
    assert_eq!(result, expected());
    assert_eq!(
        *fetcher.requests.borrow(),
        vec![("c0ffee".to_string(), "beta".to_string(), 16)]
    );
}

#[test]
fn failed_fetch_is_tagged_with_revision() {
    let fetcher = FakeFetcher::failing(404);

    let fault = parser()
        .parse_revision(&fetcher, "c0ffee", "nightly")
        .unwrap_err();
    assert_eq!(fault.patch_id, "c0ffee");
    assert!(
        matches!(fault.error, PatchError::Status { status: 404, .. }),
        "{fault}"
    );
}

#[test]
fn unknown_channel_fails_before_any_request() {
    let fetcher = patch_lines::HgFetcher::default();

    let fault = parser()
        .parse_revision(&fetcher, "c0ffee", "aurora")
        .unwrap_err();
    assert!(
        matches!(fault.error, PatchError::UnknownChannel { ref channel } if channel == "aurora"),
        "{fault}"
    );
}

// =============================================================================
// Faults
// =============================================================================

#[test]
fn broken_hunk_discards_every_file() {
    let sink = RecordingSink::default();

    let result = recover(parser().parse_str(BROKEN), &sink);
    assert!(result.is_empty());
    assert_eq!(
        *sink.reports.borrow(),
        vec![
            "Error in parsing patch <inline>: Malformed hunk header at line 7: '@@ -9,2 +9,two @@'"
                .to_string()
        ]
    );
}

#[test]
fn successful_parse_reports_nothing() {
    let sink = RecordingSink::default();

    let result = recover(parser().parse_str(PATCH), &sink);
    assert_eq!(result, expected());
    assert!(sink.reports.borrow().is_empty());
}

#[test]
fn parse_patch_convenience() {
    assert_eq!(parse_patch(PATCH, |path| path.ends_with(".h")).len(), 1);
    assert!(parse_patch(BROKEN, |_| true).is_empty());
    assert!(parse_patch("", |_| true).is_empty());
}

// =============================================================================
// Output
// =============================================================================

#[test]
fn json_shape() {
    let value = serde_json::to_value(expected()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "dom/base/Element.cpp": {
                "added": [104],
                "deleted": [202],
                "touched": [101, 102],
                "new": false
            },
            "dom/base/Element.h": { "new": true },
            "gfx/My Name.cpp": {
                "added": [],
                "deleted": [],
                "touched": [6],
                "new": false
            }
        })
    );
}

// =============================================================================
// Fragment boundaries
// =============================================================================

proptest! {
    #[test]
    fn fragment_boundaries_do_not_matter(
        mut cuts in prop::collection::vec(0..PATCH.len(), 0..12)
    ) {
        cuts.push(0);
        cuts.push(PATCH.len());
        cuts.sort_unstable();
        cuts.dedup();

        let fragments: Vec<Result<String, TransportError>> = cuts
            .windows(2)
            .map(|w| Ok(PATCH[w[0]..w[1]].to_string()))
            .collect();

        let result = parser().parse_fragments("split", fragments).unwrap();
        prop_assert_eq!(result, expected());
    }
}
