//! Core model types: commands, chunks, reference strategies, and the web.

mod chunk;
mod command;
mod reference;
mod web;

pub use chunk::{Chunk, ChunkId, ChunkKind};
pub use command::{Command, TextSpan};
pub use reference::ReferenceStyle;
pub use web::Web;
