//! OpenDSE: a design-space exploration framework for embedded systems.
//!
//! This crate compiles an application/architecture specification into a
//! pseudo-Boolean constraint system whose models correspond to valid
//! task-to-resource mappings and message routings. It does not itself
//! search that constraint system: decoding a model is left to an external
//! SAT/PBO solver behind the [`external::Decoder`] trait.

pub mod encoding;
pub mod error;
pub mod external;
pub mod graph;
pub mod io;
pub mod spec;

pub use encoding::{EncodedModel, Encoder, PbConstraint, Var, VarFactory};
pub use error::{EncodeError, SpecError, XmlError};
pub use io::{read_specification, write_specification};
pub use spec::{Application, Architecture, Mappings, Routings, Specification};
