//! The constraint-encoding compiler: turns a [`crate::Specification`] into
//! a pseudo-Boolean constraint system over a structurally-interned
//! variable algebra.

pub mod constraints;
pub mod encoder;
pub mod variables;

pub use constraints::{
    cycle_break, end_node_constraints, flows_for_communication, hierarchy, one_direction, proxy_of,
    CommunicationFlow, PbConstraint, PbOp, RoutingEncoder,
};
pub use encoder::{EncodedModel, Encoder};
pub use variables::{Var, VarFactory};
