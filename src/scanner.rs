use crate::TransportError;
use crate::source::ChunkSource;

/// Predicate deciding whether a line still belongs to the current sub-scan.
pub type Guard = fn(&str) -> bool;

/// Forward-only line cursor with a stack of scope guards.
///
/// A sub-grammar pushes a guard describing the lines it owns and then reads
/// with [`Scanner::in_scope`] until it returns `None`. The first line the
/// guard rejects is left under the cursor for the enclosing scope to examine,
/// and the guard is popped. Only the innermost guard is evaluated.
pub struct Scanner<I> {
    source: ChunkSource<I>,
    guards: Vec<Guard>,
}

impl<I> Scanner<I>
where
    I: Iterator<Item = Result<String, TransportError>>,
{
    pub fn new(source: ChunkSource<I>) -> Self {
        Self {
            source,
            guards: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.source.current()
    }

    pub fn line_number(&self) -> usize {
        self.source.line_number()
    }

    /// Move `n` lines forward; `false` means end of input was reached first.
    pub fn advance(&mut self, n: usize) -> Result<bool, TransportError> {
        self.source.advance(n)
    }

    pub fn push_guard(&mut self, guard: Guard) {
        self.guards.push(guard);
    }

    pub fn pop_guard(&mut self) -> Option<Guard> {
        self.guards.pop()
    }

    /// The current line if the innermost guard accepts it.
    ///
    /// On rejection or at end of input the innermost guard is popped and
    /// `None` is returned; the cursor does not move.
    pub fn in_scope(&mut self) -> Option<&str> {
        let guard = self.guards.last().copied();
        match self.source.current() {
            Some(line) if guard.is_none_or(|accepts| accepts(line)) => Some(line),
            _ => {
                self.guards.pop();
                None
            }
        }
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.guards.len()
    }
}
