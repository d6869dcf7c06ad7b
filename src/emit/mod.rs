//! Output sinks for tangling and weaving.

mod emitter;
mod indent;
mod tangler;
mod weaver;

pub use emitter::Emitter;
pub use tangler::Tangler;
pub use weaver::RstWeaver;
