//! The encoder façade: walks a specification's communications, delegates
//! to [`RoutingEncoder`], and emits the global task-activity linkage that
//! ties a process task's activity to its candidate mappings.

use crate::error::EncodeError;
use crate::spec::{Specification, TaskKind};

use super::constraints::{flows_for_communication, CommunicationFlow, PbConstraint, PbOp, RoutingEncoder};
use super::variables::{Var, VarFactory};

/// The output of a full encode pass: every interned variable plus the
/// constraint set, ready to hand to an external solver via
/// [`crate::external::Decoder`].
pub struct EncodedModel {
    pub variables: VarFactory,
    pub constraints: Vec<PbConstraint>,
}

/// Orchestrates the constraint generators over a whole specification.
pub struct Encoder<'a> {
    additional: &'a [PbConstraint],
}

impl<'a> Default for Encoder<'a> {
    fn default() -> Self {
        Self { additional: &[] }
    }
}

impl<'a> Encoder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pluggable extra constraints passed through verbatim to every
    /// communication's routing encoder.
    pub fn with_additional(additional: &'a [PbConstraint]) -> Self {
        Self { additional }
    }

    pub fn encode(&self, spec: &Specification) -> Result<EncodedModel, EncodeError> {
        let mut factory = VarFactory::new();
        let mut constraints = Vec::new();
        let resources_by_id = spec.architecture.resource_lookup();
        let routing_encoder = RoutingEncoder::new(self.additional);

        for task in spec.application.tasks() {
            if !task.is_communication() {
                continue;
            }
            let Some(routing) = spec.routings.get(&task.id) else { continue };
            let flows: Vec<CommunicationFlow> = flows_for_communication(&spec.application, &task.id);
            constraints.extend(routing_encoder.encode(
                task,
                routing,
                &flows,
                &spec.mappings,
                &resources_by_id,
                &mut factory,
            )?);
        }

        constraints.extend(task_activity_linkage(spec, &mut factory));

        Ok(EncodedModel { variables: factory, constraints })
    }
}

/// `T(task) ⇔ OR(M(m) for m in mappings(task))`, for every process task.
/// See DESIGN.md for why this replaces a literal per-task mapping-count
/// `≤ 1` constraint, which would contradict the rule that multiple
/// mappings per task are allowed.
fn task_activity_linkage(spec: &Specification, factory: &mut VarFactory) -> Vec<PbConstraint> {
    let mut out = Vec::new();
    for task in spec.application.tasks() {
        if task.kind != TaskKind::Process {
            continue;
        }
        let mapping_vars: Vec<i64> =
            spec.mappings.for_task(&task.id).map(|m| factory.literal(Var::M { mapping: m.id.clone() })).collect();
        let task_var = factory.literal(Var::T { task: task.id.clone() });
        out.extend(tie_or(task_var, &mapping_vars));
    }
    out
}

fn tie_or(x: i64, ys: &[i64]) -> Vec<PbConstraint> {
    let mut out = Vec::with_capacity(ys.len() + 1);
    for &y in ys {
        out.push(PbConstraint::new(vec![(1, y), (-1, x)], PbOp::Le, 0));
    }
    if ys.is_empty() {
        out.push(PbConstraint::new(vec![(1, x)], PbOp::Eq, 0));
    } else {
        let mut terms = vec![(1, x)];
        terms.extend(ys.iter().map(|&y| (-1, y)));
        out.push(PbConstraint::new(terms, PbOp::Le, 0));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Dependency, Link, Mapping, Resource, Routing, RoutingLink, Task};

    fn can_bus_specification() -> Specification {
        let mut spec = Specification::new();
        spec.application.add_task(Task::process("t1"));
        spec.application.add_task(Task::communication("t2"));
        spec.application.add_task(Task::process("t3"));
        spec.application.add_dependency(Dependency::new("d1"), "t1", "t2").unwrap();
        spec.application.add_dependency(Dependency::new("d2"), "t2", "t3").unwrap();

        spec.architecture.add_resource(Resource::new("r1"));
        spec.architecture.add_resource(Resource::new("r2"));
        spec.architecture.add_resource(Resource::new("can"));
        spec.architecture.add_link(Link::new("l1"), "r1", "can", false).unwrap();
        spec.architecture.add_link(Link::new("l2"), "r2", "can", false).unwrap();

        spec.mappings.add(Mapping::new("m1", "t1", "r1"));
        spec.mappings.add(Mapping::new("m2", "t3", "r2"));

        let mut routing = Routing::new();
        routing.add_resource("r1");
        routing.add_resource("can");
        routing.add_resource("r2");
        routing.add_link(RoutingLink::new("rl1", "l1"), "r1", "can", true).unwrap();
        routing.add_link(RoutingLink::new("rl2", "l2"), "can", "r2", true).unwrap();
        spec.routings.set("t2", routing);

        spec
    }

    #[test]
    fn encode_succeeds_and_produces_nonempty_model() {
        let spec = can_bus_specification();
        let model = Encoder::new().encode(&spec).unwrap();
        assert!(!model.constraints.is_empty());
        assert!(!model.variables.is_empty());
    }

    #[test]
    fn encode_reports_invariant_violation_for_duplicate_mapping() {
        let mut spec = can_bus_specification();
        spec.mappings.add(Mapping::new("m1b", "t1", "r1"));
        let result = Encoder::new().encode(&spec);
        assert!(result.is_err());
    }

    #[test]
    fn process_task_activity_is_tied_to_its_mappings() {
        let spec = can_bus_specification();
        let model = Encoder::new().encode(&spec).unwrap();
        // T(t1) should appear as an interned variable once mapping m1 exists
        let has_task_var = model.constraints.iter().any(|c| c.terms.len() >= 2);
        assert!(has_task_var);
    }
}
