//! Weft - Literate Programming Engine
//!
//! This library implements a web-based literate programming system. A
//! single source document interleaves prose with named chunks of code;
//! weft extracts the code into source files (tangling) and renders the
//! document with cross-references as reStructuredText (weaving).
//!
//! # Features
//!
//! - **Tangle**: Resolve named-chunk references recursively into source
//!   files, preserving the indentation of each reference site
//! - **Weave**: Render the document in authored order with labelled code
//!   blocks and file, macro, and user-identifier cross-references
//! - **Abbreviations**: Chunk names may be shortened with a `...` suffix
//!   anywhere an unambiguous prefix identifies them
//!
//! # Example
//!
//! ```no_run
//! use weft::emit::Tangler;
//! use weft::model::Web;
//! use weft::reader::WebReader;
//!
//! let mut web = Web::new();
//! WebReader::new().load(&mut web, "doc.w".as_ref()).unwrap();
//! web.create_used_by().unwrap();
//! web.tangle(&mut Tangler::new(".")).unwrap();
//! ```

pub mod emit;
pub mod errors;
pub mod model;
pub mod options;
pub mod reader;
pub mod tokenizer;

// Re-export commonly used types
pub use emit::{Emitter, RstWeaver, Tangler};
pub use errors::{Result, WeftError};
pub use model::{Chunk, Command, ReferenceStyle, Web};
pub use reader::WebReader;
