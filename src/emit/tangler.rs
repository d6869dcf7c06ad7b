//! The tangling emitter: reconstructed source files.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::errors::{Result, WeftError};
use crate::model::{Chunk, ChunkKind, Web};

use super::emitter::Emitter;
use super::indent::IndentTracker;

/// Writes tangled source files under an output directory.
///
/// Content is buffered per destination and compared against the existing
/// file on close: identical content leaves the destination untouched, so
/// downstream build tools see no modification; differing content
/// replaces it. The quote transform is identity because tangled output
/// must be byte-identical to the authored text.
#[derive(Debug)]
pub struct Tangler {
    output_dir: PathBuf,
    target: Option<PathBuf>,
    buffer: String,
    indent: IndentTracker,
    include_line_numbers: bool,
    comment_start: Option<String>,
    comment_end: Option<String>,
}

impl Tangler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            target: None,
            buffer: String::new(),
            indent: IndentTracker::new(),
            include_line_numbers: false,
            comment_start: None,
            comment_end: None,
        }
    }

    /// Emit a source-line comment before each chunk body, using the
    /// comment delimiters declared on the output chunk.
    pub fn with_line_numbers(mut self, enabled: bool) -> Self {
        self.include_line_numbers = enabled;
        self
    }

    fn line_comment(&self, chunk: &Chunk) -> Option<String> {
        if !self.include_line_numbers {
            return None;
        }
        let start = self.comment_start.as_deref()?;
        let line = chunk.line_number()?;
        let mut comment = format!("\n{start} line {line}");
        if let Some(end) = self.comment_end.as_deref() {
            if !end.is_empty() {
                comment.push(' ');
                comment.push_str(end);
            }
        }
        comment.push('\n');
        Some(comment)
    }
}

impl Emitter for Tangler {
    fn open(&mut self, target: &Path) -> Result<()> {
        let destination = self.output_dir.join(target);
        tracing::debug!(destination = %destination.display(), "opening tangle target");
        self.target = Some(destination);
        self.buffer.clear();
        self.indent.reset();
        self.comment_start = None;
        self.comment_end = None;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let target = self.target.take().ok_or_else(|| {
            WeftError::Structural("tangler closed without an open destination".to_string())
        })?;
        self.indent.finish(&mut self.buffer);

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Leave an up-to-date destination untouched so its filesystem
        // identity and modification time survive a re-tangle.
        if let Ok(existing) = fs::read(&target) {
            if hexdigest(&existing) == hexdigest(self.buffer.as_bytes()) {
                tracing::info!(path = %target.display(), "unchanged, not rewritten");
                return Ok(());
            }
        }
        fs::write(&target, &self.buffer)?;
        tracing::info!(path = %target.display(), "written");
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.buffer.push_str(text);
        Ok(())
    }

    fn code_block(&mut self, text: &str) -> Result<()> {
        self.indent.code_block(text, &mut self.buffer);
        Ok(())
    }

    fn add_indent(&mut self, spaces: usize) {
        self.indent.add_indent(spaces);
    }

    fn set_indent(&mut self, spaces: usize) {
        self.indent.set_indent(spaces);
    }

    fn clr_indent(&mut self) {
        self.indent.clr_indent();
    }

    fn code_begin(&mut self, _web: &Web, chunk: &Chunk) -> Result<()> {
        if let ChunkKind::Output {
            comment_start,
            comment_end,
        } = chunk.kind()
        {
            self.comment_start = comment_start.clone();
            self.comment_end = comment_end.clone();
        }
        if let Some(comment) = self.line_comment(chunk) {
            self.buffer.push_str(&comment);
        }
        Ok(())
    }
}

fn hexdigest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
