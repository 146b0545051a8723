//! I/O collaborators: the XML specification round-trip is the only
//! component in this crate that touches a stream. Everything here is
//! synchronous and blocking on its underlying `Read`/`Write`.

pub mod xml;

pub use xml::{read_specification, write_specification};
