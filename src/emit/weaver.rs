//! The weaving emitter: reStructuredText documentation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, WeftError};
use crate::model::{Chunk, ReferenceStyle, Web};

use super::emitter::Emitter;
use super::indent::IndentTracker;

/// Weaves the document as reStructuredText.
///
/// Code chunks become labelled `parsed-literal` blocks; each carries a
/// rubric naming the chunk and a small-print trailer listing the chunks
/// that use it. Cross-reference commands render as field lists of
/// sequence-number hyperlinks.
#[derive(Debug)]
pub struct RstWeaver {
    output_dir: PathBuf,
    target: Option<PathBuf>,
    buffer: String,
    indent: IndentTracker,
    /// How much referenced-by ancestry the chunk trailers show.
    pub reference_style: ReferenceStyle,
}

impl RstWeaver {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            target: None,
            buffer: String::new(),
            indent: IndentTracker::new(),
            reference_style: ReferenceStyle::default(),
        }
    }

    pub fn with_reference_style(mut self, style: ReferenceStyle) -> Self {
        self.reference_style = style;
        self
    }

    fn begin_code(&mut self, chunk: &Chunk) {
        let assign = if chunk.initial { "=" } else { "+=" };
        self.buffer.push_str(&format!(
            "\n..  _`{seq}`:\n..  rubric:: {name} ({seq}) {assign}\n..  parsed-literal::\n    :class: code\n\n",
            seq = chunk.seq,
            name = chunk.full_name(),
        ));
        self.indent.set_indent(4);
    }

    fn end_code(&mut self, web: &Web, chunk: &Chunk) {
        self.indent.finish(&mut self.buffer);
        self.indent.clr_indent();
        let usage = self.used_by(web, chunk);
        self.buffer.push_str(&format!(
            "\n..\n\n    ..  class:: small\n\n        |loz| *{name} ({seq})*.{usage}\n",
            name = chunk.full_name(),
            seq = chunk.seq,
        ));
    }

    /// The referenced-by trailer, or an empty string for an unused chunk.
    fn used_by(&self, web: &Web, chunk: &Chunk) -> String {
        let parents = self.reference_style.chunk_referenced_by(web, chunk);
        if parents.is_empty() {
            return String::new();
        }
        let list: Vec<String> = parents
            .iter()
            .map(|&id| {
                let parent = web.chunk(id);
                format!("{} (`{}`_)", parent.full_name(), parent.seq)
            })
            .collect();
        format!(" Used by: {}.", list.join("; "))
    }
}

impl Emitter for RstWeaver {
    fn open(&mut self, target: &Path) -> Result<()> {
        let stem = target.file_name().map(PathBuf::from).unwrap_or_else(|| {
            PathBuf::from("web")
        });
        let destination = self.output_dir.join(stem).with_extension("rst");
        tracing::debug!(destination = %destination.display(), "opening weave target");
        self.target = Some(destination);
        self.buffer.clear();
        self.indent.reset();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let target = self.target.take().ok_or_else(|| {
            WeftError::Structural("weaver closed without an open destination".to_string())
        })?;
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&target, &self.buffer)?;
        tracing::info!(path = %target.display(), "woven");
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

    /// Escapes the characters reStructuredText treats as inline markup.
    fn quote(&self, text: &str) -> String {
        let mut quoted = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '|' | '`' | '*' | '_' => {
                    quoted.push('\\');
                    quoted.push(ch);
                }
                _ => quoted.push(ch),
            }
        }
        quoted
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
        self.begin_code(chunk);
        Ok(())
    }

    fn code_end(&mut self, web: &Web, chunk: &Chunk) -> Result<()> {
        self.end_code(web, chunk);
        Ok(())
    }

    fn file_begin(&mut self, _web: &Web, chunk: &Chunk) -> Result<()> {
        self.begin_code(chunk);
        Ok(())
    }

    fn file_end(&mut self, web: &Web, chunk: &Chunk) -> Result<()> {
        self.end_code(web, chunk);
        Ok(())
    }

    fn xref_head(&mut self) -> Result<()> {
        self.buffer.push('\n');
        Ok(())
    }

    fn xref_line(&mut self, name: &str, refs: &[usize]) -> Result<()> {
        let seqs: Vec<String> = refs.iter().map(|seq| format!("(`{seq}`_)")).collect();
        self.buffer.push_str(&format!(
            ":{name}:\n    |srarr|\\ {}\n",
            seqs.join(", ")
        ));
        Ok(())
    }

    /// Merges the defining sequence number, bracketed, into the sorted
    /// reference list.
    fn xref_def_line(&mut self, name: &str, def_seq: usize, refs: &[usize]) -> Result<()> {
        let mut entries: Vec<(usize, bool)> = refs
            .iter()
            .filter(|&&seq| seq != def_seq)
            .map(|&seq| (seq, false))
            .collect();
        entries.push((def_seq, true));
        entries.sort_unstable();
        let line: Vec<String> = entries
            .into_iter()
            .map(|(seq, is_def)| {
                if is_def {
                    format!("[`{seq}`_]")
                } else {
                    format!("`{seq}`_")
                }
            })
            .collect();
        self.buffer
            .push_str(&format!(":{name}:\n    {}\n", line.join(" ")));
        Ok(())
    }

    fn xref_foot(&mut self) -> Result<()> {
        self.buffer.push('\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Command;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn woven(web: &Web, style: ReferenceStyle) -> String {
        let dir = tempdir().unwrap();
        let mut weaver = RstWeaver::new(dir.path()).with_reference_style(style);
        web.weave(&mut weaver).unwrap();
        fs::read_to_string(dir.path().join("web.rst")).unwrap()
    }

    fn sample_web() -> Web {
        let mut web = Web::new();
        let mut prose = Chunk::anonymous();
        prose.append_text("some text with ", 1);
        web.add(prose).unwrap();

        let mut out = Chunk::output("index.html", None, None);
        out.append_text("<html>\n", 2);
        out.append(Command::Reference {
            name: "body".to_string(),
            line: 3,
        });
        out.append_text("\n</html>\n", 3);
        web.add(out).unwrap();

        let mut body = Chunk::named("body");
        body.append_text("a _special_ *page*\n", 6);
        web.add(body).unwrap();

        web.create_used_by().unwrap();
        web
    }

    #[test]
    fn test_quote_escapes_inline_markup() {
        let weaver = RstWeaver::new(".");
        assert_eq!(
            "a \\|pipe\\| and a \\`tick\\` and \\*stars\\* and \\_scores\\_",
            weaver.quote("a |pipe| and a `tick` and *stars* and _scores_")
        );
        assert_eq!("plain text", weaver.quote("plain text"));
    }

    #[test]
    fn test_code_rubric_marks_initial_and_continuation() {
        let mut web = Web::new();
        let mut first = Chunk::named("body");
        first.append_text("one\n", 1);
        web.add(first).unwrap();
        let mut more = Chunk::named("body");
        more.append_text("two\n", 5);
        web.add(more).unwrap();
        web.create_used_by().unwrap();

        let text = woven(&web, ReferenceStyle::Simple);
        assert!(text.contains("..  rubric:: body (1) ="));
        assert!(text.contains("..  rubric:: body (2) +="));
    }

    #[test]
    fn test_woven_chunk_framing() {
        let text = woven(&sample_web(), ReferenceStyle::Simple);
        assert!(text.contains("..  _`2`:"));
        assert!(text.contains("..  rubric:: index.html (2) ="));
        assert!(text.contains("..  parsed-literal::\n    :class: code\n"));
        assert!(text.contains("|loz| *index.html (2)*.\n"));
        assert!(text.contains("|loz| *body (3)*. Used by: index.html (`2`_).\n"));
    }

    #[test]
    fn test_code_lines_are_indented_and_quoted() {
        let text = woven(&sample_web(), ReferenceStyle::Simple);
        assert!(text.contains("    a \\_special\\_ \\*page\\*\n"));
        assert!(text.contains("    <html>\n"));
    }

    #[test]
    fn test_reference_woven_as_name() {
        let text = woven(&sample_web(), ReferenceStyle::Simple);
        assert!(text.contains("body"));
    }

    #[test]
    fn test_transitive_trailer_lists_ancestry() {
        let mut web = Web::new();
        let mut main = Chunk::output("main.code", None, None);
        main.append(Command::Reference {
            name: "Parent".to_string(),
            line: 1,
        });
        web.add(main).unwrap();
        let mut parent = Chunk::named("Parent");
        parent.append(Command::Reference {
            name: "Sub".to_string(),
            line: 2,
        });
        web.add(parent).unwrap();
        let mut sub = Chunk::named("Sub");
        sub.append_text("leaf\n", 3);
        web.add(sub).unwrap();
        web.create_used_by().unwrap();

        let text = woven(&web, ReferenceStyle::Transitive);
        assert!(text.contains("|loz| *Sub (3)*. Used by: Parent (`2`_); main.code (`1`_).\n"));
    }

    #[test]
    fn test_file_xref_report() {
        let mut web = sample_web();
        let mut report = Chunk::anonymous();
        report.append(Command::FileXref { line: 9 });
        web.add(report).unwrap();

        let text = woven(&web, ReferenceStyle::Simple);
        assert!(text.contains(":index.html:\n    |srarr|\\ (`2`_)\n"));
    }

    #[test]
    fn test_user_id_xref_brackets_definition() {
        let mut weaver = RstWeaver::new(".");
        weaver.open(Path::new("doc.w")).unwrap();
        weaver.xref_def_line("index", 314, &[123, 567]).unwrap();
        assert_eq!(":index:\n    `123`_ [`314`_] `567`_\n", weaver.buffer);
    }

    #[test]
    fn test_woven_destination_swaps_extension() {
        let dir = tempdir().unwrap();
        let mut web = sample_web();
        web.source_path = Some(PathBuf::from("docs/page.w"));
        let mut weaver = RstWeaver::new(dir.path());
        web.weave(&mut weaver).unwrap();
        assert!(dir.path().join("page.rst").exists());
    }
}
