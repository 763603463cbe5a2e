//! The patch grammar.
//!
//! [`DiffScanner`] walks a git patch once, line by line:
//!
//! ```text
//! SeekHeader -> FileHeader -> { Binary | NewFile | DeletedFile | Hunks } -> SeekHeader ...
//! ```
//!
//! Every added or removed line of a modified file becomes an [`line::Anchor`]
//! on the resulting file; when a file's hunk series ends its anchors are
//! reconciled into a [`FileChange`]. Nothing but the current fragment of
//! input and the anchors of the current file is held in memory.

pub mod file;
pub mod hunk;
pub mod line;
pub mod reconcile;

use crate::change::{FileChange, PatchResult};
use crate::scanner::Scanner;
use crate::{PatchError, ScanError, TransportError};
use file::FilePair;
use hunk::HunkHeader;
use line::{Anchor, anchor};

/// Raw anchors collected for the file being scanned.
#[derive(Debug, Default)]
struct Anchors {
    added: Vec<Anchor>,
    deleted: Vec<Anchor>,
}

impl Anchors {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}

/// Which side of a hunk header sizes the body of a created or removed file.
#[derive(Debug, Clone, Copy)]
enum Side {
    Old,
    New,
}

impl Side {
    fn count(self, header: &HunkHeader) -> u32 {
        match self {
            Side::Old => header.old_count,
            Side::New => header.new_count,
        }
    }
}

/// What follows the metadata of a created or removed file.
enum Body {
    Binary,
    Hunk(HunkHeader),
    Nothing,
}

fn is_hunk_header(line: &str) -> bool {
    line.starts_with('@')
}

fn is_hunk_body(line: &str) -> bool {
    matches!(line.as_bytes().first(), Some(b' ' | b'+' | b'-'))
}

fn is_deleted_line(line: &str) -> bool {
    line.starts_with('-')
}

fn is_not_file_header(line: &str) -> bool {
    !file::is_file_header(line)
}

fn is_not_blank(line: &str) -> bool {
    !line.is_empty()
}

/// Streaming scanner producing the [`PatchResult`] of one patch.
pub struct DiffScanner<'a, I> {
    scanner: Scanner<I>,
    interest: &'a dyn Fn(&str) -> bool,
    anchors: Anchors,
    results: PatchResult,
}

impl<'a, I> DiffScanner<'a, I>
where
    I: Iterator<Item = Result<String, TransportError>>,
{
    pub fn new(scanner: Scanner<I>, interest: &'a dyn Fn(&str) -> bool) -> Self {
        Self {
            scanner,
            interest,
            anchors: Anchors::default(),
            results: PatchResult::new(),
        }
    }

    /// Scan the whole patch.
    ///
    /// Any fault abandons the scan; results gathered for earlier files are
    /// discarded with it.
    pub fn run(mut self) -> Result<PatchResult, PatchError> {
        while self.seek_header()? {
            let line_number = self.scanner.line_number();
            let pair = match self.scanner.current() {
                Some(line) => FilePair::parse(line).ok_or_else(|| ScanError::MalformedFileHeader {
                    line_number,
                    text: line.to_string(),
                })?,
                None => break,
            };
            self.scanner.advance(1)?;

            if (self.interest)(&pair.new) {
                self.scan_file(pair)?;
            } else {
                tracing::debug!(path = %pair.new, "skipping uninteresting file");
            }
        }

        Ok(self.results)
    }

    /// Skip to the next `diff --git` line; `false` at end of input.
    fn seek_header(&mut self) -> Result<bool, PatchError> {
        self.scanner.push_guard(is_not_file_header);
        while self.scanner.in_scope().is_some() {
            self.scanner.advance(1)?;
        }
        Ok(self.scanner.current().is_some())
    }

    fn scan_file(&mut self, pair: FilePair) -> Result<(), PatchError> {
        let path = pair.new;
        let (new_file, deleted_file) = match self.scanner.current() {
            Some(line) => (file::is_new_file(line), file::is_deleted_file(line)),
            None => return Ok(()),
        };

        if new_file {
            self.scanner.advance(1)?;
            self.skip_metadata()?;
            self.skip_body(Side::New)?;
            tracing::debug!(path = %path, "new file");
            self.results.insert(path, FileChange::New);
        } else if deleted_file {
            // removed files are deliberately left out of the result
            self.scanner.advance(1)?;
            self.skip_metadata()?;
            self.skip_body(Side::Old)?;
            tracing::debug!(path = %path, "deleted file");
        } else {
            if pair.old != path {
                tracing::debug!(from = %pair.old, to = %path, "renamed file");
            }
            self.skip_metadata()?;
            if self.scanner.current().is_some_and(is_hunk_header) {
                self.scan_hunks(&path)?;
            }

            let anchors = std::mem::take(&mut self.anchors);
            if anchors.is_empty() {
                tracing::debug!(path = %path, "no line changes");
                return Ok(());
            }

            // recorded even when every anchor is noise and all sets come out empty
            let change = reconcile::reconcile(&anchors.added, &anchors.deleted);
            tracing::debug!(path = %path, "modified file");
            self.results.insert(path, change);
        }

        Ok(())
    }

    fn skip_metadata(&mut self) -> Result<(), PatchError> {
        self.scanner.push_guard(file::is_metadata);
        while self.scanner.in_scope().is_some() {
            self.scanner.advance(1)?;
        }
        Ok(())
    }

    /// Skip the content of a created or removed file without recording it.
    fn skip_body(&mut self, side: Side) -> Result<(), PatchError> {
        let line_number = self.scanner.line_number();
        let body = match self.scanner.current() {
            Some(line) if file::is_binary_marker(line) => Body::Binary,
            Some(line) if is_hunk_header(line) => {
                Body::Hunk(parse_hunk_header(line, line_number)?)
            }
            _ => Body::Nothing,
        };

        match body {
            Body::Binary => {
                self.scanner.push_guard(is_not_blank);
                while self.scanner.in_scope().is_some() {
                    self.scanner.advance(1)?;
                }
            }
            Body::Hunk(header) => {
                // land on the last body line, then step past it; running out
                // of input on the way simply ends the patch
                let count = side.count(&header) as usize;
                if count == 0 || self.scanner.advance(count)? {
                    self.scanner.advance(1)?;
                }
            }
            Body::Nothing => {}
        }

        Ok(())
    }

    fn scan_hunks(&mut self, path: &str) -> Result<(), PatchError> {
        self.scanner.push_guard(is_hunk_header);
        loop {
            let line_number = self.scanner.line_number();
            let header = match self.scanner.in_scope() {
                Some(line) => parse_hunk_header(line, line_number)?,
                None => break,
            };
            tracing::trace!(path, ?header, "hunk");
            self.scanner.advance(1)?;
            self.scan_hunk_body(&header, path)?;
        }
        Ok(())
    }

    /// Walk one hunk body, anchoring every added and removed line.
    ///
    /// `position` follows the resulting file: context and added lines move
    /// it, removed lines do not. A run of removed lines is anchored at
    /// consecutive positions starting where the run begins.
    fn scan_hunk_body(&mut self, header: &HunkHeader, path: &str) -> Result<(), PatchError> {
        let mut position = header.new_start;
        let mut body_lines = 0usize;

        self.scanner.push_guard(is_hunk_body);
        loop {
            let text = match self.scanner.in_scope() {
                Some(text) => text,
                None => break,
            };
            match text.as_bytes().first().copied() {
                Some(b' ') => {
                    position = next_position(position, path)?;
                }
                Some(b'+') => {
                    self.anchors.added.push(anchor(position, text));
                    position = next_position(position, path)?;
                }
                Some(b'-') => {
                    self.anchors.deleted.push(anchor(position, text));
                    self.scanner.advance(1)?;
                    let first = next_position(position, path)?;
                    body_lines += 1 + self.scan_deleted_run(first, path)?;
                    continue;
                }
                _ => {}
            }
            body_lines += 1;
            self.scanner.advance(1)?;
        }

        if body_lines == 0
            && self.scanner.current().is_none()
            && (header.old_count > 0 || header.new_count > 0)
        {
            return Err(ScanError::Truncated {
                path: path.to_string(),
                line_number: self.scanner.line_number(),
            }
            .into());
        }

        Ok(())
    }

    /// Anchor the removed lines following the first one of a run.
    ///
    /// Returns how many lines the run held.
    fn scan_deleted_run(&mut self, first: u32, path: &str) -> Result<usize, PatchError> {
        let mut position = first;
        let mut run = 0;

        self.scanner.push_guard(is_deleted_line);
        loop {
            let text = match self.scanner.in_scope() {
                Some(text) => text,
                None => break,
            };
            self.anchors.deleted.push(anchor(position, text));
            position = next_position(position, path)?;
            run += 1;
            self.scanner.advance(1)?;
        }

        Ok(run)
    }
}

fn parse_hunk_header(line: &str, line_number: usize) -> Result<HunkHeader, ScanError> {
    HunkHeader::parse(line).ok_or_else(|| ScanError::MalformedHunkHeader {
        line_number,
        text: line.to_string(),
    })
}

fn next_position(position: u32, path: &str) -> Result<u32, ScanError> {
    position.checked_add(1).ok_or_else(|| ScanError::LineOverflow {
        path: path.to_string(),
    })
}
