//! The web: graph root of a literate document.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use regex::Regex;

use crate::emit::Emitter;
use crate::errors::{Result, WeftError};

use super::chunk::{Chunk, ChunkId};
use super::command::Command;

/// Marker suffix of an abbreviated chunk name.
const ELLIPSIS: &str = "...";

/// The in-memory graph of a literate document.
///
/// Owns every chunk in registration order, a name table mapping each
/// full chunk name to its (additive) list of definitions, and the list
/// of output chunks driving the tangle phase. Chunk relationships are
/// held as [`ChunkId`] handles into the arena rather than references.
///
/// Built once during load, then read many times; the only post-load
/// mutation is [`Web::create_used_by`], which must run before any
/// referenced-by query.
#[derive(Debug, Default)]
pub struct Web {
    chunks: Vec<Chunk>,
    named: IndexMap<String, Vec<ChunkId>>,
    output: Vec<ChunkId>,
    /// Source document path; names the woven destination.
    pub source_path: Option<PathBuf>,
}

impl Web {
    pub fn new() -> Self {
        Self::default()
    }

    /// All chunks, in registration (authored) order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id]
    }

    /// Registered full names, in first-registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    /// Output chunks, in registration order.
    pub fn output(&self) -> &[ChunkId] {
        &self.output
    }

    /// Registers a chunk, assigning the next sequence number.
    ///
    /// Anonymous chunks enter the chunk sequence only; named chunks also
    /// enter the name table (resolving an abbreviated definition name
    /// against already-registered full names); output chunks additionally
    /// join the output list.
    pub fn add(&mut self, mut chunk: Chunk) -> Result<ChunkId> {
        let id = self.chunks.len();
        chunk.seq = id + 1;

        if !chunk.is_anonymous() {
            let name = chunk.name.clone().ok_or_else(|| {
                WeftError::Structural("named chunk registered without a name".to_string())
            })?;
            let full = self
                .add_def_name(&name)?
                .ok_or(WeftError::UnresolvedAbbreviation(name))?;
            tracing::debug!(name = full, seq = chunk.seq, "registering chunk");
            chunk.name = Some(full.clone());
            let definitions = self.named.entry(full).or_default();
            chunk.initial = definitions.is_empty();
            definitions.push(id);
            if chunk.is_output() {
                self.output.push(id);
            }
        }

        self.chunks.push(chunk);
        Ok(id)
    }

    /// Registers a definition name, resolving abbreviations against the
    /// names registered so far.
    ///
    /// Returns `None` for an abbreviation with no registered match yet
    /// (an abbreviation cannot forward-reference an unregistered name at
    /// definition time); otherwise the full name, registered as a key in
    /// the name table. Repeat registration is a no-op.
    pub fn add_def_name(&mut self, name: &str) -> Result<Option<String>> {
        let full = self.full_name_for(name)?;
        if full.ends_with(ELLIPSIS) {
            return Ok(None);
        }
        self.named.entry(full.clone()).or_default();
        Ok(Some(full))
    }

    /// Resolves a possibly abbreviated name against all registered full
    /// names.
    ///
    /// An abbreviation matching exactly one registered name resolves to
    /// it; more than one match is fatal; no match passes the input
    /// through unchanged (a later [`Web::get_chunks`] will then fail,
    /// naming it).
    pub fn full_name_for(&self, name: &str) -> Result<String> {
        if self.named.contains_key(name) {
            return Ok(name.to_string());
        }
        if let Some(prefix) = name.strip_suffix(ELLIPSIS) {
            let mut matches: Vec<&str> = self
                .named
                .keys()
                .filter(|full| full.starts_with(prefix))
                .map(String::as_str)
                .collect();
            if matches.len() > 1 {
                matches.sort_unstable();
                return Err(WeftError::AmbiguousName {
                    name: name.to_string(),
                    matches: matches.into_iter().map(str::to_string).collect(),
                });
            }
            if let Some(full) = matches.first() {
                return Ok((*full).to_string());
            }
        }
        Ok(name.to_string())
    }

    /// The ordered definition list registered under a (possibly
    /// abbreviated) name. Fails, naming the input, when nothing is
    /// registered under it.
    pub fn get_chunks(&self, name: &str) -> Result<Vec<ChunkId>> {
        let full = self.full_name_for(name)?;
        match self.named.get(&full) {
            Some(ids) if !ids.is_empty() => Ok(ids.clone()),
            _ => Err(WeftError::UnknownName {
                name: name.to_string(),
                line: None,
            }),
        }
    }

    /// The single reference-closure pass: resolves every `Reference`
    /// command and records the referencing chunk on each target's
    /// `referenced_by` list.
    ///
    /// Existing lists are cleared first, so rerunning the pass recomputes
    /// rather than duplicates.
    pub fn create_used_by(&mut self) -> Result<()> {
        for chunk in &mut self.chunks {
            chunk.referenced_by.clear();
        }

        let mut edges: Vec<(ChunkId, ChunkId)> = Vec::new();
        for (referrer, chunk) in self.chunks.iter().enumerate() {
            for command in chunk.commands() {
                if let Command::Reference { name, line } = command {
                    let targets = self.get_chunks(name).map_err(|err| match err {
                        WeftError::UnknownName { name, .. } => WeftError::UnknownName {
                            name,
                            line: Some(*line),
                        },
                        other => other,
                    })?;
                    edges.extend(targets.into_iter().map(|target| (target, referrer)));
                }
            }
        }

        for (target, referrer) in edges {
            self.chunks[target].referenced_by.push(referrer);
        }
        Ok(())
    }

    /// File cross-reference: destination name to defining sequence
    /// numbers, in registration order.
    pub fn file_xref(&self) -> IndexMap<String, Vec<usize>> {
        let mut xref: IndexMap<String, Vec<usize>> = IndexMap::new();
        for &id in &self.output {
            let chunk = self.chunk(id);
            xref.entry(chunk.full_name().to_string())
                .or_default()
                .push(chunk.seq);
        }
        xref
    }

    /// Macro cross-reference: chunk name to defining sequence numbers,
    /// for non-output definitions.
    pub fn chunk_xref(&self) -> IndexMap<String, Vec<usize>> {
        let mut xref: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (name, ids) in &self.named {
            let seqs: Vec<usize> = ids
                .iter()
                .map(|&id| self.chunk(id))
                .filter(|c| !c.is_output())
                .map(|c| c.seq)
                .collect();
            if !seqs.is_empty() {
                xref.insert(name.clone(), seqs);
            }
        }
        xref
    }

    /// User-identifier cross-reference: identifier to its defining
    /// chunk's sequence number and the sequence numbers of chunks whose
    /// text mentions it. A declared but never-mentioned identifier maps
    /// to an empty reference list.
    pub fn user_names_xref(&self) -> Result<IndexMap<String, (usize, Vec<usize>)>> {
        let mut xref: IndexMap<String, (usize, Vec<usize>)> = IndexMap::new();
        for chunk in &self.chunks {
            for id_ref in chunk.user_id_refs() {
                xref.entry(id_ref.clone()).or_insert((chunk.seq, Vec::new()));
            }
        }
        for (name, (_, refs)) in xref.iter_mut() {
            let pattern = Regex::new(&format!(r"\W{}\W", regex::escape(name)))?;
            for chunk in &self.chunks {
                if chunk.matches(&pattern) {
                    refs.push(chunk.seq);
                }
            }
        }
        Ok(xref)
    }

    /// Tangles every output chunk, in registration order. Each
    /// destination is opened, written completely, and closed before the
    /// next is opened.
    pub fn tangle(&self, emitter: &mut dyn Emitter) -> Result<()> {
        for &id in &self.output {
            let chunk = self.chunk(id);
            tracing::info!(file = chunk.full_name(), "tangling");
            emitter.open(Path::new(chunk.full_name()))?;
            chunk.tangle(self, emitter)?;
            emitter.close()?;
        }
        Ok(())
    }

    /// Weaves every chunk in authored document order. This is the only
    /// traversal where the full chunk sequence, not the name table,
    /// governs output order.
    pub fn weave(&self, emitter: &mut dyn Emitter) -> Result<()> {
        let target = self
            .source_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("web"));
        emitter.open(&target)?;
        for chunk in &self.chunks {
            chunk.weave(self, emitter)?;
        }
        emitter.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextSpan;

    /// Recording emitter: captures the call stream, no filesystem.
    #[derive(Default)]
    struct Recorder {
        written: Vec<String>,
        code_blocks: Vec<String>,
    }

    impl Emitter for Recorder {
        fn open(&mut self, _target: &Path) -> Result<()> {
            Ok(())
        }
        fn close(&mut self) -> Result<()> {
            Ok(())
        }
        fn write(&mut self, text: &str) -> Result<()> {
            self.written.push(text.to_string());
            Ok(())
        }
        fn code_block(&mut self, text: &str) -> Result<()> {
            self.code_blocks.push(text.to_string());
            Ok(())
        }
    }

    // An anonymous chunk, an output file referencing "A Chunk", which
    // references "Another Chunk"; both named chunks declare user
    // identifiers.
    fn sample_web() -> Web {
        let mut web = Web::new();

        let mut prose = Chunk::anonymous();
        prose.append_text("some text", 1);
        web.add(prose).unwrap();

        let mut out = Chunk::output("A File", None, None);
        out.append_text("some code", 2);
        let nm = web.add_def_name("A Chunk").unwrap().unwrap();
        out.append(Command::Reference { name: nm, line: 2 });
        web.add(out).unwrap();

        let mut named = Chunk::named("A Chunk...");
        named.append_text("some user2a code", 3);
        named.set_user_id_refs("user1");
        let nm = web.add_def_name("Another Chunk").unwrap().unwrap();
        named.append(Command::Reference { name: nm, line: 3 });
        web.add(named).unwrap();

        let mut named2 = Chunk::named("Another Chunk...");
        named2.append_text("some user1 code", 4);
        named2.set_user_id_refs("user2a user2b");
        web.add(named2).unwrap();

        web
    }

    #[test]
    fn test_def_names_resolve_in_registration_order() {
        let mut web = Web::new();
        assert_eq!(None, web.add_def_name("A Chunk...").unwrap());
        assert_eq!(0, web.names().count());
        assert_eq!(
            Some("A Chunk Of Code".to_string()),
            web.add_def_name("A Chunk Of Code").unwrap()
        );
        assert_eq!(1, web.names().count());
        assert_eq!(
            Some("A Chunk Of Code".to_string()),
            web.add_def_name("A Chunk...").unwrap()
        );
        assert_eq!(1, web.names().count());
    }

    #[test]
    fn test_ambiguous_abbreviation_fails() {
        let mut web = Web::new();
        web.add_def_name("Alpha Beta").unwrap();
        assert_eq!("Alpha Beta", web.full_name_for("Alpha...").unwrap());
        web.add_def_name("Alpha Gamma").unwrap();
        let result = web.full_name_for("Alpha...");
        assert!(matches!(result, Err(WeftError::AmbiguousName { .. })));
    }

    #[test]
    fn test_add_assigns_global_sequence_and_indexes_by_kind() {
        let mut web = Web::new();

        let mut prose = Chunk::anonymous();
        prose.append_text("some text", 1);
        web.add(prose).unwrap();
        assert_eq!(1, web.chunks().len());
        assert_eq!(0, web.names().count());
        assert_eq!(0, web.output().len());

        let mut named = Chunk::named("A Chunk");
        named.append_text("some code", 2);
        web.add(named).unwrap();
        assert_eq!(2, web.chunks().len());
        assert_eq!(1, web.names().count());
        assert_eq!(0, web.output().len());

        let mut out = Chunk::output("A File", None, None);
        out.append_text("some code", 3);
        web.add(out).unwrap();
        assert_eq!(3, web.chunks().len());
        assert_eq!(2, web.names().count());
        assert_eq!(1, web.output().len());

        let seqs: Vec<usize> = web.chunks().iter().map(|c| c.seq).collect();
        assert_eq!(vec![1, 2, 3], seqs);
    }

    #[test]
    fn test_abbreviated_definition_without_match_is_fatal() {
        let mut web = Web::new();
        let chunk = Chunk::named("Nothing Like It...");
        let result = web.add(chunk);
        assert!(matches!(result, Err(WeftError::UnresolvedAbbreviation(_))));
    }

    #[test]
    fn test_name_queries_resolve() {
        let web = sample_web();
        assert_eq!("A Chunk", web.full_name_for("A C...").unwrap());
        assert_eq!("A Chunk", web.full_name_for("A Chunk").unwrap());

        let ids = web.get_chunks("A C...").unwrap();
        assert_eq!(Some("A Chunk"), web.chunk(ids[0]).name.as_deref());

        // Output chunks are named chunks too.
        let ids = web.get_chunks("A File").unwrap();
        assert!(web.chunk(ids[0]).is_output());

        let err = web.get_chunks("No Such Chunk").unwrap_err();
        assert!(err.to_string().contains("No Such Chunk"));
    }

    #[test]
    fn test_create_used_by_populates_and_recomputes() {
        let mut web = sample_web();
        web.create_used_by().unwrap();
        let a_chunk = web.get_chunks("A Chunk").unwrap()[0];
        assert_eq!(1, web.chunk(a_chunk).referenced_by.len());

        // Rerunning recomputes instead of duplicating.
        web.create_used_by().unwrap();
        assert_eq!(1, web.chunk(a_chunk).referenced_by.len());
    }

    #[test]
    fn test_create_used_by_fails_on_unresolved_reference() {
        let mut web = Web::new();
        let mut out = Chunk::output("f.code", None, None);
        out.append(Command::Reference {
            name: "ghost".to_string(),
            line: 9,
        });
        web.add(out).unwrap();
        let err = web.create_used_by().unwrap_err();
        assert!(matches!(
            err,
            WeftError::UnknownName { line: Some(9), .. }
        ));
    }

    #[test]
    fn test_file_xref() {
        let web = sample_web();
        let xref = web.file_xref();
        assert_eq!(1, xref.len());
        assert_eq!(Some(&vec![2]), xref.get("A File"));
    }

    #[test]
    fn test_chunk_xref() {
        let web = sample_web();
        let xref = web.chunk_xref();
        assert_eq!(2, xref.len());
        assert_eq!(1, xref["A Chunk"].len());
        assert_eq!(1, xref["Another Chunk"].len());
        assert!(!xref.contains_key("A File"));
    }

    #[test]
    fn test_user_names_xref() {
        let web = sample_web();
        let xref = web.user_names_xref().unwrap();
        assert_eq!(3, xref.len());
        let (_, refs) = &xref["user1"];
        assert_eq!(1, refs.len(), "did not find user1");
        let (_, refs) = &xref["user2a"];
        assert_eq!(1, refs.len(), "did not find user2a");
        let (_, refs) = &xref["user2b"];
        assert!(refs.is_empty());
        assert!(!xref.contains_key("Not A User Symbol"));
    }

    #[test]
    fn test_tangle_follows_references_in_order() {
        let web = sample_web();
        let mut recorder = Recorder::default();
        web.tangle(&mut recorder).unwrap();
        assert_eq!(
            vec!["some code", "some user2a code", "some user1 code"],
            recorder.code_blocks
        );
    }

    #[test]
    fn test_weave_follows_authored_order() {
        let web = sample_web();
        let mut recorder = Recorder::default();
        web.weave(&mut recorder).unwrap();
        // Prose written verbatim; references woven as display names.
        assert_eq!(
            vec!["some text", "A Chunk", "Another Chunk"],
            recorder.written
        );
        // Named content routed through quote (identity here) to codeBlock.
        assert_eq!(
            vec!["some code", "some user2a code", "some user1 code"],
            recorder.code_blocks
        );
    }

    #[test]
    fn test_tangle_reports_undefined_reference_line() {
        let mut web = Web::new();
        let mut out = Chunk::output("f.code", None, None);
        out.append(Command::Reference {
            name: "ghost".to_string(),
            line: 17,
        });
        web.add(out).unwrap();
        let mut recorder = Recorder::default();
        let err = web.tangle(&mut recorder).unwrap_err();
        assert!(matches!(err, WeftError::UnknownName { line: Some(17), .. }));
    }

    #[test]
    fn test_reference_command_text_span_shape() {
        // TextSpan is the payload both text variants share.
        let span = TextSpan::new("x", 3);
        assert_eq!("x", span.text);
        assert_eq!(3, span.line);
    }
}
