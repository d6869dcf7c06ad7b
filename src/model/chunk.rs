//! Chunks: ordered containers of content commands.

use regex::Regex;

use crate::emit::Emitter;
use crate::errors::{Result, WeftError};

use super::command::{Command, TextSpan};
use super::web::Web;

/// Handle to a chunk inside the web's arena.
pub type ChunkId = usize;

/// The closed set of chunk variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkKind {
    /// Prose with optional quoted text; weave-only.
    Anonymous,
    /// A definable chunk; substitution re-indents to the reference site.
    Named,
    /// A definable chunk whose substitution never re-indents.
    NamedNoIndent,
    /// A named chunk bound to a destination file. The chunk name is the
    /// destination; the comment delimiters decorate line-number comments
    /// in tangled output when requested.
    Output {
        comment_start: Option<String>,
        comment_end: Option<String>,
    },
}

/// An ordered sequence of commands, plus the bookkeeping the web needs:
/// the (resolved) name, the registration sequence number, declared
/// user-identifier references, and the referencing parents filled in by
/// the reference-closure pass.
#[derive(Debug, Clone)]
pub struct Chunk {
    kind: ChunkKind,
    /// Full name once registered; `None` for anonymous chunks.
    pub name: Option<String>,
    /// Assigned once, at registration, across all variants.
    pub seq: usize,
    /// True for the first definition under a name, false for continuations.
    pub initial: bool,
    commands: Vec<Command>,
    user_id_refs: Vec<String>,
    /// Chunks containing a reference to this one. Populated only by
    /// [`Web::create_used_by`].
    pub referenced_by: Vec<ChunkId>,
}

impl Chunk {
    fn with_kind(kind: ChunkKind, name: Option<String>) -> Self {
        Self {
            kind,
            name,
            seq: 0,
            initial: false,
            commands: Vec::new(),
            user_id_refs: Vec::new(),
            referenced_by: Vec::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::with_kind(ChunkKind::Anonymous, None)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::with_kind(ChunkKind::Named, Some(name.into()))
    }

    pub fn named_no_indent(name: impl Into<String>) -> Self {
        Self::with_kind(ChunkKind::NamedNoIndent, Some(name.into()))
    }

    pub fn output(
        filename: impl Into<String>,
        comment_start: Option<String>,
        comment_end: Option<String>,
    ) -> Self {
        Self::with_kind(
            ChunkKind::Output {
                comment_start,
                comment_end,
            },
            Some(filename.into()),
        )
    }

    pub fn kind(&self) -> &ChunkKind {
        &self.kind
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self.kind, ChunkKind::Anonymous)
    }

    pub fn is_output(&self) -> bool {
        matches!(self.kind, ChunkKind::Output { .. })
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Display name: the resolved full name, or a placeholder for
    /// anonymous chunks.
    pub fn full_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(anonymous)")
    }

    /// Appends a command, coalescing adjacent same-variant text.
    ///
    /// Two consecutive `Text` commands (or two consecutive `Code`
    /// commands) merge into one; a `Text` next to a `Code` stays
    /// separate so the quoting boundary survives.
    pub fn append(&mut self, command: Command) {
        match (self.commands.last_mut(), command) {
            (Some(Command::Text(last)), Command::Text(span)) => last.text.push_str(&span.text),
            (Some(Command::Code(last)), Command::Code(span)) => last.text.push_str(&span.text),
            (_, command) => self.commands.push(command),
        }
    }

    /// Appends literal content in the chunk's native form: prose for
    /// anonymous chunks, code for named and output chunks.
    pub fn append_text(&mut self, text: impl Into<String>, line: usize) {
        let span = TextSpan::new(text, line);
        let command = match self.kind {
            ChunkKind::Anonymous => Command::Text(span),
            _ => Command::Code(span),
        };
        self.append(command);
    }

    /// Appends quoted text, regardless of chunk variant.
    pub fn append_code(&mut self, text: impl Into<String>, line: usize) {
        self.append(Command::Code(TextSpan::new(text, line)));
    }

    /// Declares author identifiers, whitespace-separated.
    pub fn set_user_id_refs(&mut self, ids: &str) {
        self.user_id_refs = ids.split_whitespace().map(str::to_string).collect();
    }

    pub fn user_id_refs(&self) -> &[String] {
        &self.user_id_refs
    }

    /// Line of the first command, or `None` if the chunk is empty.
    pub fn line_number(&self) -> Option<usize> {
        self.commands.first().map(Command::line_number)
    }

    /// True only when the first command bears text starting with `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.commands
            .first()
            .is_some_and(|c| c.starts_with(prefix))
    }

    /// True when any command's text matches the pattern.
    pub fn matches(&self, pattern: &Regex) -> bool {
        self.commands.iter().any(|c| c.matches(pattern))
    }

    /// Renders this chunk through a weaving emitter: anonymous chunks are
    /// bracketed as documentation, named chunks as code, output chunks as
    /// files.
    pub fn weave(&self, web: &Web, emitter: &mut dyn Emitter) -> Result<()> {
        match self.kind {
            ChunkKind::Anonymous => {
                emitter.doc_begin(web, self)?;
                for command in &self.commands {
                    command.weave(web, emitter)?;
                }
                emitter.doc_end(web, self)
            }
            ChunkKind::Named | ChunkKind::NamedNoIndent => {
                emitter.code_begin(web, self)?;
                for command in &self.commands {
                    command.weave(web, emitter)?;
                }
                emitter.code_end(web, self)
            }
            ChunkKind::Output { .. } => {
                emitter.file_begin(web, self)?;
                for command in &self.commands {
                    command.weave(web, emitter)?;
                }
                emitter.file_end(web, self)
            }
        }
    }

    /// Emits this chunk as tangled source. Tangled output is
    /// byte-identical to the authored text; nothing is quoted.
    ///
    /// Tangling an anonymous chunk is an authoring error.
    pub fn tangle(&self, web: &Web, emitter: &mut dyn Emitter) -> Result<()> {
        if self.is_anonymous() {
            return Err(WeftError::Structural(
                "cannot tangle an anonymous chunk".to_string(),
            ));
        }
        emitter.code_begin(web, self)?;
        let mut prev_indent = 0;
        for command in &self.commands {
            command.tangle(web, self, prev_indent, emitter)?;
            prev_indent = command.trailing_indent();
        }
        emitter.code_end(web, self)
    }
}
