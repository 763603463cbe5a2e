/// Paths named by a `diff --git` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    /// Path before the change (without the `a/` prefix)
    pub old: String,
    /// Path after the change (without the `b/` prefix)
    pub new: String,
}

const FILE_HEADER: &str = "diff --git ";

/// Header lines skipped between `diff --git` and the first hunk.
///
/// Rename and copy headers are not among them: a renamed file stops the
/// metadata walk and is left out of the result.
const METADATA_PREFIXES: &[&str] = &["---", "+++", "index ", "old mode", "new mode"];

impl FilePair {
    /// Parse a `diff --git a/<old> b/<new>` line.
    ///
    /// With the usual `a/` and `b/` prefixes the split happens at the last
    /// ` b/`, so paths may contain spaces. Without prefixes the first two
    /// whitespace separated tokens are taken.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix(FILE_HEADER)?;

        let (old, new) = match rest.strip_prefix("a/").and_then(|r| r.rsplit_once(" b/")) {
            Some(paths) => paths,
            None => {
                let mut tokens = rest.split_whitespace();
                let old = tokens.next()?;
                let new = tokens.next()?;
                (
                    old.strip_prefix("a/").unwrap_or(old),
                    new.strip_prefix("b/").unwrap_or(new),
                )
            }
        };

        if old.is_empty() || new.is_empty() {
            return None;
        }

        Some(FilePair {
            old: old.to_string(),
            new: new.to_string(),
        })
    }
}

pub fn is_file_header(line: &str) -> bool {
    line.starts_with(FILE_HEADER)
}

pub fn is_metadata(line: &str) -> bool {
    METADATA_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

pub fn is_binary_marker(line: &str) -> bool {
    line == "GIT binary patch"
}

pub fn is_new_file(line: &str) -> bool {
    line.starts_with("new file")
}

pub fn is_deleted_file(line: &str) -> bool {
    line.starts_with("deleted file")
}
