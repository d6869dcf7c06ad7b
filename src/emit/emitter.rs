//! The sink contract shared by tangling and weaving backends.

use std::path::Path;

use crate::errors::Result;
use crate::model::{Chunk, Web};

/// An output sink.
///
/// The traversal drivers in [`Web`](crate::model::Web) call these
/// methods as chunks and commands are visited; a destination is opened,
/// written completely, and closed before the next is opened. Bracketing
/// and cross-reference methods default to no-ops so backends implement
/// only what their format renders.
pub trait Emitter {
    /// Opens a destination. For weavers the target names the source
    /// document; the woven file derives from it.
    fn open(&mut self, target: &Path) -> Result<()>;

    /// Completes and releases the current destination.
    fn close(&mut self) -> Result<()>;

    /// Writes text verbatim.
    fn write(&mut self, text: &str) -> Result<()>;

    /// Writes a block of code, applying the current indentation context.
    fn code_block(&mut self, text: &str) -> Result<()>;

    /// The backend's quoting transform. Identity unless the output
    /// format assigns meaning to characters in code.
    fn quote(&self, text: &str) -> String {
        text.to_string()
    }

    /// Pushes an indentation level `spaces` beyond the current one.
    fn add_indent(&mut self, _spaces: usize) {}

    /// Pushes an absolute indentation level.
    fn set_indent(&mut self, _spaces: usize) {}

    /// Pops the innermost indentation level.
    fn clr_indent(&mut self) {}

    fn code_begin(&mut self, _web: &Web, _chunk: &Chunk) -> Result<()> {
        Ok(())
    }

    fn code_end(&mut self, _web: &Web, _chunk: &Chunk) -> Result<()> {
        Ok(())
    }

    fn doc_begin(&mut self, _web: &Web, _chunk: &Chunk) -> Result<()> {
        Ok(())
    }

    fn doc_end(&mut self, _web: &Web, _chunk: &Chunk) -> Result<()> {
        Ok(())
    }

    fn file_begin(&mut self, _web: &Web, _chunk: &Chunk) -> Result<()> {
        Ok(())
    }

    fn file_end(&mut self, _web: &Web, _chunk: &Chunk) -> Result<()> {
        Ok(())
    }

    fn xref_head(&mut self) -> Result<()> {
        Ok(())
    }

    /// One cross-reference line: a name and its defining sequence numbers.
    fn xref_line(&mut self, _name: &str, _refs: &[usize]) -> Result<()> {
        Ok(())
    }

    /// One user-identifier line: the identifier, its defining sequence
    /// number, and the sequence numbers referencing it.
    fn xref_def_line(&mut self, _name: &str, _def_seq: usize, _refs: &[usize]) -> Result<()> {
        Ok(())
    }

    fn xref_foot(&mut self) -> Result<()> {
        Ok(())
    }
}
