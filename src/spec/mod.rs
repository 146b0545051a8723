//! The in-memory specification model: attributed elements, the four
//! aggregate sub-structures, and the operations over them.

pub mod element;
pub mod ops;
pub mod specification;

pub use element::{
    AttributeValue, Attributes, Dependency, Element, Id, Link, Mapping, Parameter, Resource, Task,
    TaskKind,
};
pub use specification::{Application, Architecture, Function, Mappings, Routing, RoutingLink, Routings, Specification};
