//! Attributed elements.
//!
//! Every entity in a [`super::Specification`] is identified and carries an
//! ordered attribute map. Polymorphic copy is not reflective: each concrete
//! kind implements `Clone`, and [`Mapping`] additionally exposes an explicit
//! `rebind` used by deep-copy to point at freshly constructed source/target
//! instances.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Non-empty string, unique within its containing collection.
pub type Id = String;

/// A typed, parameterized attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    /// A continuous parameter.
    Range {
        default: f64,
        lower: f64,
        upper: f64,
        granularity: f64,
    },
    /// A discrete choice, optionally cross-referenced to another element's
    /// parameter by identifier.
    SelectRefList {
        default: String,
        choices: Vec<String>,
        reference: Option<Id>,
    },
    /// A logically unique discrete value grouped by `identifier`.
    UniqueId { default: i64, identifier: String },
}

/// The finite kinds an attribute value may take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Blob(Vec<u8>),
    Parameter(Parameter),
    List(Vec<AttributeValue>),
}

/// An ordered mapping from attribute name to value.
///
/// Backed by a `Vec` rather than a hash map: attribute maps are small (a
/// handful of entries per element) and callers (notably the XML writer)
/// depend on stable, insertion-order iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes(Vec<(String, AttributeValue)>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        let idx = self.0.iter().position(|(k, _)| k == name)?;
        Some(self.0.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Render this attribute map as pretty-printed JSON, for debugging and
    /// tooling that wants a typed snapshot of an element's attributes
    /// rather than the XML wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Common capability of every identified, attributed entity.
pub trait Element {
    fn id(&self) -> &str;
    fn attributes(&self) -> &Attributes;
    fn attributes_mut(&mut self) -> &mut Attributes;
}

macro_rules! element_impl {
    ($ty:ident) => {
        impl Element for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn attributes(&self) -> &Attributes {
                &self.attributes
            }
            fn attributes_mut(&mut self) -> &mut Attributes {
                &mut self.attributes
            }
        }
    };
}

/// Whether a [`Task`] is a plain process or a message-passing communication.
///
/// `Communication` is a subtype of `Task` detectable at runtime: modeling it
/// as a tag on `Task` (rather than a separate struct hierarchy) means
/// application graphs can store one vertex kind and still answer "is this a
/// communication?" without downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Process,
    Communication,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: Id,
    pub kind: TaskKind,
    pub attributes: Attributes,
    /// The XML `class` attribute, when the source specified one. Not
    /// interpreted (this port has one concrete struct per element kind)
    /// but preserved so `read(write(s)) == s` holds bit-for-bit.
    pub class: Option<String>,
}

impl Task {
    pub fn process(id: impl Into<Id>) -> Self {
        Self { id: id.into(), kind: TaskKind::Process, attributes: Attributes::new(), class: None }
    }

    pub fn communication(id: impl Into<Id>) -> Self {
        Self { id: id.into(), kind: TaskKind::Communication, attributes: Attributes::new(), class: None }
    }

    pub fn is_communication(&self) -> bool {
        self.kind == TaskKind::Communication
    }

    /// Construct a copy of `self` under a (possibly different) identifier,
    /// preserving attributes. Used by deep-copy; identity is not shared.
    pub fn copy_with_id(&self, new_id: impl Into<Id>) -> Self {
        Self { id: new_id.into(), kind: self.kind, attributes: self.attributes.clone(), class: self.class.clone() }
    }
}
element_impl!(Task);

#[derive(Debug, Clone)]
pub struct Resource {
    pub id: Id,
    pub attributes: Attributes,
    pub class: Option<String>,
}

impl Resource {
    pub fn new(id: impl Into<Id>) -> Self {
        Self { id: id.into(), attributes: Attributes::new(), class: None }
    }

    pub fn copy_with_id(&self, new_id: impl Into<Id>) -> Self {
        Self { id: new_id.into(), attributes: self.attributes.clone(), class: self.class.clone() }
    }
}
element_impl!(Resource);

#[derive(Debug, Clone)]
pub struct Link {
    pub id: Id,
    pub attributes: Attributes,
    pub class: Option<String>,
}

impl Link {
    pub fn new(id: impl Into<Id>) -> Self {
        Self { id: id.into(), attributes: Attributes::new(), class: None }
    }

    pub fn copy_with_id(&self, new_id: impl Into<Id>) -> Self {
        Self { id: new_id.into(), attributes: self.attributes.clone(), class: self.class.clone() }
    }
}
element_impl!(Link);

#[derive(Debug, Clone)]
pub struct Dependency {
    pub id: Id,
    pub attributes: Attributes,
    pub class: Option<String>,
}

impl Dependency {
    pub fn new(id: impl Into<Id>) -> Self {
        Self { id: id.into(), attributes: Attributes::new(), class: None }
    }

    pub fn copy_with_id(&self, new_id: impl Into<Id>) -> Self {
        Self { id: new_id.into(), attributes: self.attributes.clone(), class: self.class.clone() }
    }
}
element_impl!(Dependency);

/// A candidate binding of a `Task` source to a `Resource` target. Multiple
/// mappings per task are allowed (they describe the search space, not a
/// commitment), but at most one mapping per `(task, resource)` pair is a
/// routing-encoder invariant.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub id: Id,
    pub source: Id,
    pub target: Id,
    pub attributes: Attributes,
    pub class: Option<String>,
}

impl Mapping {
    pub fn new(id: impl Into<Id>, source: impl Into<Id>, target: impl Into<Id>) -> Self {
        Self { id: id.into(), source: source.into(), target: target.into(), attributes: Attributes::new(), class: None }
    }

    /// Explicit rebinding-copy protocol: construct a copy of this mapping
    /// bound to a (typically freshly constructed) source and target.
    pub fn rebind(&self, source: impl Into<Id>, target: impl Into<Id>) -> Self {
        Self {
            id: self.id.clone(),
            source: source.into(),
            target: target.into(),
            attributes: self.attributes.clone(),
            class: self.class.clone(),
        }
    }
}
element_impl!(Mapping);

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Process => write!(f, "process"),
            TaskKind::Communication => write!(f, "communication"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_preserve_insertion_order() {
        let mut a = Attributes::new();
        a.set("b", AttributeValue::Integer(2));
        a.set("a", AttributeValue::Integer(1));
        a.set("b", AttributeValue::Integer(20));
        let names: Vec<&str> = a.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(a.get("b"), Some(&AttributeValue::Integer(20)));
    }

    #[test]
    fn task_communication_tag_is_runtime_detectable() {
        let t = Task::process("t1");
        let c = Task::communication("c1");
        assert!(!t.is_communication());
        assert!(c.is_communication());
    }

    #[test]
    fn mapping_rebind_preserves_attributes_and_id() {
        let mut m = Mapping::new("m1", "t1", "r1");
        m.attributes.set("note", AttributeValue::String("x".into()));
        let m2 = m.rebind("t1_copy", "r1_copy");
        assert_eq!(m2.id, "m1");
        assert_eq!(m2.source, "t1_copy");
        assert_eq!(m2.target, "r1_copy");
        assert_eq!(m2.attributes.get("note"), m.attributes.get("note"));
    }

    #[test]
    fn attributes_to_json_round_trips_through_serde() {
        let mut a = Attributes::new();
        a.set("rate", AttributeValue::Double(2.5));
        a.set(
            "deadline",
            AttributeValue::Parameter(Parameter::Range { default: 10.0, lower: 0.0, upper: 100.0, granularity: 1.0 }),
        );

        let json = a.to_json().unwrap();
        let back: Attributes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
