//! Atomic content commands owned by chunks.

use regex::Regex;

use crate::emit::Emitter;
use crate::errors::{Result, WeftError};

use super::chunk::{Chunk, ChunkKind};
use super::web::Web;

/// A literal or quoted span of text with the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub line: usize,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }
}

/// One content command of a chunk.
///
/// `Text` and `Code` have the same shape and differ only in how they are
/// written out: `Code` passes through the emitter's quote transform when
/// woven, `Text` never does. The three cross-reference commands carry no
/// payload; their content is derived from the [`Web`] at emission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Literal document text, written verbatim.
    Text(TextSpan),
    /// Quoted or code text.
    Code(TextSpan),
    /// A reference to a named chunk, resolved lazily against the web.
    Reference { name: String, line: usize },
    /// File cross-reference report.
    FileXref { line: usize },
    /// Macro (named chunk) cross-reference report.
    MacroXref { line: usize },
    /// User-identifier cross-reference report.
    UserIdXref { line: usize },
}

impl Command {
    /// Line number at which this command started.
    pub fn line_number(&self) -> usize {
        match self {
            Command::Text(span) | Command::Code(span) => span.line,
            Command::Reference { line, .. }
            | Command::FileXref { line }
            | Command::MacroXref { line }
            | Command::UserIdXref { line } => *line,
        }
    }

    /// True for the text-bearing variants.
    pub fn is_text(&self) -> bool {
        matches!(self, Command::Text(_) | Command::Code(_))
    }

    /// The text payload, for the text-bearing variants.
    pub fn text(&self) -> Option<&str> {
        match self {
            Command::Text(span) | Command::Code(span) => Some(&span.text),
            _ => None,
        }
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.text().is_some_and(|t| t.starts_with(prefix))
    }

    pub fn matches(&self, pattern: &Regex) -> bool {
        self.text().is_some_and(|t| pattern.is_match(t))
    }

    /// Width of the last, unterminated line of this command's text: the
    /// column at which a directly following command would appear. Zero
    /// when the text ends in a newline or the command bears no text.
    pub fn trailing_indent(&self) -> usize {
        match self.text() {
            Some(text) if !text.ends_with('\n') => {
                text.rsplit('\n').next().map_or(0, |l| l.chars().count())
            }
            _ => 0,
        }
    }

    /// Renders this command through a weaving emitter.
    pub fn weave(&self, web: &Web, emitter: &mut dyn Emitter) -> Result<()> {
        match self {
            Command::Text(span) => emitter.write(&span.text),
            Command::Code(span) => {
                let quoted = emitter.quote(&span.text);
                emitter.code_block(&quoted)
            }
            Command::Reference { name, .. } => emitter.write(&web.full_name_for(name)?),
            Command::FileXref { .. } => {
                emitter.xref_head()?;
                for (name, refs) in web.file_xref() {
                    emitter.xref_line(&name, &refs)?;
                }
                emitter.xref_foot()
            }
            Command::MacroXref { .. } => {
                emitter.xref_head()?;
                for (name, refs) in web.chunk_xref() {
                    emitter.xref_line(&name, &refs)?;
                }
                emitter.xref_foot()
            }
            Command::UserIdXref { .. } => {
                emitter.xref_head()?;
                for (name, (def_seq, refs)) in web.user_names_xref()? {
                    emitter.xref_def_line(&name, def_seq, &refs)?;
                }
                emitter.xref_foot()
            }
        }
    }

    /// Emits this command as tangled source.
    ///
    /// `chunk` is the owning chunk (its variant decides the re-indent
    /// policy for references) and `prev_indent` the trailing indent of
    /// the command preceding this one in the chunk.
    pub fn tangle(
        &self,
        web: &Web,
        chunk: &Chunk,
        prev_indent: usize,
        emitter: &mut dyn Emitter,
    ) -> Result<()> {
        match self {
            Command::Text(span) => emitter.write(&span.text),
            Command::Code(span) => emitter.code_block(&span.text),
            Command::Reference { name, line } => {
                let targets = web.get_chunks(name).map_err(|err| match err {
                    WeftError::UnknownName { name, .. } => WeftError::UnknownName {
                        name,
                        line: Some(*line),
                    },
                    other => other,
                })?;
                tracing::debug!(name, count = targets.len(), "tangling reference");
                match chunk.kind() {
                    ChunkKind::NamedNoIndent => emitter.set_indent(0),
                    _ => emitter.add_indent(prev_indent),
                }
                for id in targets {
                    web.chunk(id).tangle(web, emitter)?;
                }
                emitter.clr_indent();
                Ok(())
            }
            Command::FileXref { line }
            | Command::MacroXref { line }
            | Command::UserIdXref { line } => Err(WeftError::Structural(format!(
                "cannot tangle a cross-reference command (line {line})"
            ))),
        }
    }
}
