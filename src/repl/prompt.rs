//! Prompt pattern matching
//!
//! The interpreter announces readiness with `"> "` and asks for more input
//! with a bare two-space marker. Both are located by regex in the driver's
//! unconsumed stream buffer; `^` anchors the start of that buffer, not of
//! every line.

use regex::Regex;

use crate::error::Result;

/// Primary prompt: at the very start of the unconsumed buffer, or right
/// after a line break when earlier output ended with its own break.
pub const PRIMARY_PROMPT: &str = r"(^|\r?\n)> ";

/// Continuation prompt: two spaces at the start of the unconsumed buffer.
///
/// Anchoring it to every line would swallow the two-space indentation the
/// interpreter uses for ordinary results (e.g. export listings), so it only
/// matches when nothing else has arrived since the last consume.
pub const CONTINUATION_PROMPT: &str = r"^  ";

/// Which prompt a match corresponds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Ready for a new top-level command
    Primary,
    /// More input expected for the current command
    Continuation,
}

/// A located prompt in the stream buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptMatch {
    pub kind: PromptKind,
    /// Byte offset where the matched delimiter starts (text before it is
    /// command output)
    pub start: usize,
    /// Byte offset one past the matched delimiter
    pub end: usize,
}

/// Immutable (primary, continuation) matcher pair, fixed at construction
#[derive(Debug, Clone)]
pub struct PromptPattern {
    primary: Regex,
    continuation: Regex,
}

impl PromptPattern {
    /// Compile a custom matcher pair
    pub fn new(primary: &str, continuation: &str) -> Result<Self> {
        Ok(Self {
            primary: Regex::new(primary)?,
            continuation: Regex::new(continuation)?,
        })
    }

    /// Matchers for the Wasm reference interpreter
    pub fn wasm() -> Self {
        Self::new(PRIMARY_PROMPT, CONTINUATION_PROMPT)
            .expect("built-in prompt patterns compile")
    }

    /// Find the earliest prompt in `buffer`.
    ///
    /// With `allow_continuation`, both prompts compete and the earliest
    /// occurrence wins; the primary prompt wins ties. Without it, only the
    /// primary prompt is considered.
    pub fn find(&self, buffer: &str, allow_continuation: bool) -> Option<PromptMatch> {
        let primary = self.primary.find(buffer).map(|m| PromptMatch {
            kind: PromptKind::Primary,
            start: m.start(),
            end: m.end(),
        });
        if !allow_continuation {
            return primary;
        }
        let continuation = self.continuation.find(buffer).map(|m| PromptMatch {
            kind: PromptKind::Continuation,
            start: m.start(),
            end: m.end(),
        });
        match (primary, continuation) {
            (Some(p), Some(c)) => Some(if c.start < p.start { c } else { p }),
            (p, c) => p.or(c),
        }
    }
}
