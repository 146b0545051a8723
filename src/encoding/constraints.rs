//! Per-communication routing constraint generators.
//!
//! All constraints are linear pseudo-Boolean: `Σ cᵢ·lᵢ OP k`. The routing
//! encoder composes six families (one-direction, cycle-break, hierarchy,
//! end-node placement, proxy, and additional pass-through) for a single
//! communication's sub-architecture.

use crate::error::EncodeError;
use crate::spec::{Application, Element, Id, Mappings, Resource, Routing, Task};

use super::variables::{Var, VarFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PbOp {
    Eq,
    Le,
    Ge,
}

/// A single linear pseudo-Boolean constraint `Σ cᵢ·lᵢ OP k`. Literals follow
/// the usual signed-literal convention: a positive id is the variable
/// itself, the negated id is its complement.
#[derive(Debug, Clone)]
pub struct PbConstraint {
    pub terms: Vec<(i64, i64)>,
    pub op: PbOp,
    pub k: i64,
}

impl PbConstraint {
    pub fn new(terms: Vec<(i64, i64)>, op: PbOp, k: i64) -> Self {
        Self { terms, op, k }
    }
}

/// A `(predecessor, communication, successor)` triple, expressed as the pair
/// of its two task-to-task endpoint variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommunicationFlow {
    pub communication: Id,
    pub predecessor: Id,
    pub successor: Id,
}

impl CommunicationFlow {
    pub fn source_dtt(&self) -> Var {
        Var::Dtt { src_task: self.predecessor.clone(), dst_task: self.communication.clone() }
    }

    pub fn destination_dtt(&self) -> Var {
        Var::Dtt { src_task: self.communication.clone(), dst_task: self.successor.clone() }
    }
}

/// Every flow induced by a communication: one per (predecessor, successor)
/// pair.
pub fn flows_for_communication(app: &Application, communication: &str) -> Vec<CommunicationFlow> {
    let predecessors = app.predecessors(communication);
    let successors = app.successors(communication);
    let mut flows = Vec::with_capacity(predecessors.len() * successors.len());
    for predecessor in &predecessors {
        for successor in &successors {
            flows.push(CommunicationFlow {
                communication: communication.to_string(),
                predecessor: predecessor.clone(),
                successor: successor.clone(),
            });
        }
    }
    flows
}

/// `proxyId` attribute resolution: a resource represented by a proxy for
/// routing-endpoint purposes resolves to that proxy's id; otherwise a
/// resource is its own endpoint identity.
pub fn proxy_of(resource: &Resource) -> Id {
    match resource.attributes().get("proxyId") {
        Some(crate::spec::AttributeValue::String(id)) => id.clone(),
        _ => resource.id.clone(),
    }
}

/// `x ⇔ OR(ys)`, linearized as `y ≤ x` for every `y`, plus `x ≤ Σy` (or
/// `x = 0` when `ys` is empty).
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

/// One-direction: for each undirected routing link, at most one of its two
/// directed incarnations is used.
pub fn one_direction(communication: &str, routing: &Routing, factory: &mut VarFactory) -> Vec<PbConstraint> {
    let mut out = Vec::new();
    for (link, src, dst, directed) in routing.links() {
        if directed {
            continue;
        }
        let fwd = factory.literal(Var::EdgeUsed {
            communication: communication.to_string(),
            link: link.id.clone(),
            from: src.clone(),
            to: dst.clone(),
        });
        let bwd = factory.literal(Var::EdgeUsed {
            communication: communication.to_string(),
            link: link.id.clone(),
            from: dst.clone(),
            to: src.clone(),
        });
        out.push(PbConstraint::new(vec![(1, fwd), (1, bwd)], PbOp::Le, 1));
    }
    out
}

/// Cycle-break: a standard order-encoding. Each resource carries `n`
/// thermometer bits `Level(r, k)` meaning "rank ≥ k"; a used directed edge
/// `u -> v` forces `v`'s rank strictly above `u`'s, which is unsatisfiable
/// along any cycle.
pub fn cycle_break(communication: &str, routing: &Routing, factory: &mut VarFactory) -> Vec<PbConstraint> {
    let bound = routing.resource_count().max(1);
    let mut out = Vec::new();

    for resource in routing.resources() {
        for level in 1..bound.saturating_sub(1) {
            let lower = factory.literal(Var::Level { communication: communication.to_string(), resource: resource.clone(), level });
            let upper = factory.literal(Var::Level { communication: communication.to_string(), resource: resource.clone(), level: level + 1 });
            // thermometer consistency: rank >= level+1 implies rank >= level
            out.push(PbConstraint::new(vec![(1, lower), (-1, upper)], PbOp::Ge, 0));
        }
    }

    for (link, src, dst, directed) in routing.links() {
        let directions: Vec<(Id, Id)> =
            if directed { vec![(src.clone(), dst.clone())] } else { vec![(src.clone(), dst.clone()), (dst.clone(), src.clone())] };
        for (u, v) in directions {
            let edge_used = factory.literal(Var::EdgeUsed {
                communication: communication.to_string(),
                link: link.id.clone(),
                from: u.clone(),
                to: v.clone(),
            });
            for level in 1..bound.saturating_sub(1) {
                let u_lvl = factory.literal(Var::Level { communication: communication.to_string(), resource: u.clone(), level });
                let v_next = factory.literal(Var::Level { communication: communication.to_string(), resource: v.clone(), level: level + 1 });
                // used(u->v) AND rank(u) >= level  ==>  rank(v) >= level+1
                out.push(PbConstraint::new(vec![(1, v_next), (-1, u_lvl), (-1, edge_used)], PbOp::Ge, -1));
            }
        }
    }

    out
}

/// Hierarchy: an edge is used iff some flow's end-node placement touches
/// it; a vertex is used iff incident to a used edge; the communication's
/// own task is active iff any routing vertex is used.
pub fn hierarchy(
    communication: &str,
    routing: &Routing,
    flows: &[CommunicationFlow],
    factory: &mut VarFactory,
) -> Vec<PbConstraint> {
    let mut out = Vec::new();

    let edges: Vec<(Id, Id, Id)> = routing
        .links()
        .flat_map(|(link, src, dst, directed)| {
            if directed {
                vec![(link.id.clone(), src.clone(), dst.clone())]
            } else {
                vec![(link.id.clone(), src.clone(), dst.clone()), (link.id.clone(), dst.clone(), src.clone())]
            }
        })
        .collect();

    for (link_id, u, v) in &edges {
        let edge_used = factory.literal(Var::EdgeUsed {
            communication: communication.to_string(),
            link: link_id.clone(),
            from: u.clone(),
            to: v.clone(),
        });
        let candidates: Vec<i64> = flows
            .iter()
            .flat_map(|f| {
                let src_end = factory.literal(Var::DdsR {
                    communication: f.communication.clone(),
                    predecessor: f.predecessor.clone(),
                    successor: f.successor.clone(),
                    resource: u.clone(),
                });
                let dst_end = factory.literal(Var::DddR {
                    communication: f.communication.clone(),
                    predecessor: f.predecessor.clone(),
                    successor: f.successor.clone(),
                    resource: v.clone(),
                });
                [src_end, dst_end]
            })
            .collect();
        out.extend(tie_or(edge_used, &candidates));
    }

    for resource in routing.resources() {
        let vertex_used = factory.literal(Var::VertexUsed { communication: communication.to_string(), resource: resource.clone() });
        let incident: Vec<i64> = edges
            .iter()
            .filter(|(_, u, v)| u == resource || v == resource)
            .map(|(link_id, u, v)| {
                factory.literal(Var::EdgeUsed {
                    communication: communication.to_string(),
                    link: link_id.clone(),
                    from: u.clone(),
                    to: v.clone(),
                })
            })
            .collect();
        out.extend(tie_or(vertex_used, &incident));
    }

    let task_active = factory.literal(Var::T { task: communication.to_string() });
    let vertices_used: Vec<i64> = routing
        .resources()
        .map(|r| factory.literal(Var::VertexUsed { communication: communication.to_string(), resource: r.clone() }))
        .collect();
    out.extend(tie_or(task_active, &vertices_used));

    out
}

/// End-node placement.
///
/// For each resource `r` in the routing and each flow `f = (predecessor,
/// communication, successor)`: collect the mappings whose target resolves
/// (via [`proxy_of`]) to `r`, split by whether the mapping's source task is
/// the flow's predecessor (candidate source end node) or successor
/// (candidate destination end node).
pub fn end_node_constraints(
    communication: &str,
    routing: &Routing,
    flows: &[CommunicationFlow],
    mappings: &Mappings,
    resources_by_id: &dyn Fn(&str) -> Option<Resource>,
    factory: &mut VarFactory,
) -> Result<Vec<PbConstraint>, EncodeError> {
    let mut out = Vec::new();

    for resource_id in routing.resources() {
        let Some(resource) = resources_by_id(resource_id) else { continue };
        for flow in flows {
            for (is_source, task) in [(true, &flow.predecessor), (false, &flow.successor)] {
                let candidates: Vec<_> = mappings
                    .iter()
                    .filter(|m| &m.source == task)
                    .filter(|m| proxy_of_by_id(&m.target, resources_by_id) == resource.id)
                    .collect();

                let end_node_var = if is_source {
                    Var::DdsR {
                        communication: flow.communication.clone(),
                        predecessor: flow.predecessor.clone(),
                        successor: flow.successor.clone(),
                        resource: resource.id.clone(),
                    }
                } else {
                    Var::DddR {
                        communication: flow.communication.clone(),
                        predecessor: flow.predecessor.clone(),
                        successor: flow.successor.clone(),
                        resource: resource.id.clone(),
                    }
                };
                let end_node = factory.literal(end_node_var);

                match candidates.len() {
                    0 => out.push(PbConstraint::new(vec![(1, end_node)], PbOp::Eq, 0)),
                    1 => {
                        let m = factory.literal(Var::M { mapping: candidates[0].id.clone() });
                        let src_dtt = factory.literal(flow.source_dtt());
                        let dst_dtt = factory.literal(flow.destination_dtt());
                        // AND-gate linearization: end_node ⇔ m ∧ src_dtt ∧ dst_dtt
                        out.push(PbConstraint::new(vec![(1, m), (-1, end_node)], PbOp::Ge, 0));
                        out.push(PbConstraint::new(vec![(1, src_dtt), (-1, end_node)], PbOp::Ge, 0));
                        out.push(PbConstraint::new(vec![(1, dst_dtt), (-1, end_node)], PbOp::Ge, 0));
                        out.push(PbConstraint::new(
                            vec![(1, end_node), (-1, m), (-1, src_dtt), (-1, dst_dtt)],
                            PbOp::Ge,
                            -2,
                        ));
                    }
                    _ => {
                        return Err(EncodeError::invariant_violation(format!(
                            "more than one mapping of task '{task}' onto resource '{}' (via proxy)",
                            resource.id
                        )))
                    }
                }
            }
        }
    }

    Ok(out)
}

fn proxy_of_by_id(resource_id: &str, resources_by_id: &dyn Fn(&str) -> Option<Resource>) -> Id {
    resources_by_id(resource_id).map(|r| proxy_of(&r)).unwrap_or_else(|| resource_id.to_string())
}

/// Composes the six constraint families for one communication.
pub struct RoutingEncoder<'a> {
    pub additional: &'a [PbConstraint],
}

impl<'a> RoutingEncoder<'a> {
    pub fn new(additional: &'a [PbConstraint]) -> Self {
        Self { additional }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &self,
        communication: &Task,
        routing: &Routing,
        flows: &[CommunicationFlow],
        mappings: &Mappings,
        resources_by_id: &dyn Fn(&str) -> Option<Resource>,
        factory: &mut VarFactory,
    ) -> Result<Vec<PbConstraint>, EncodeError> {
        let mut out = Vec::new();
        out.extend(one_direction(&communication.id, routing, factory));
        out.extend(cycle_break(&communication.id, routing, factory));
        out.extend(hierarchy(&communication.id, routing, flows, factory));
        out.extend(end_node_constraints(&communication.id, routing, flows, mappings, resources_by_id, factory)?);
        out.extend(self.additional.iter().cloned());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Dependency, Mapping, Specification};

    fn can_bus_specification() -> (Specification, CommunicationFlow) {
        let mut spec = Specification::new();
        spec.application.add_task(Task::process("t1"));
        spec.application.add_task(Task::communication("t2"));
        spec.application.add_task(Task::process("t3"));
        spec.application.add_dependency(Dependency::new("d1"), "t1", "t2").unwrap();
        spec.application.add_dependency(Dependency::new("d2"), "t2", "t3").unwrap();

        spec.architecture.add_resource(Resource::new("r1"));
        spec.architecture.add_resource(Resource::new("r2"));
        spec.architecture.add_resource(Resource::new("can"));
        spec.architecture.add_link(crate::spec::Link::new("l1"), "r1", "can", false).unwrap();
        spec.architecture.add_link(crate::spec::Link::new("l2"), "r2", "can", false).unwrap();

        spec.mappings.add(Mapping::new("m1", "t1", "r1"));
        spec.mappings.add(Mapping::new("m2", "t3", "r2"));

        let mut routing = Routing::new();
        routing.add_resource("r1");
        routing.add_resource("can");
        routing.add_resource("r2");
        routing
            .add_link(crate::spec::RoutingLink::new("rl1", "l1"), "r1", "can", true)
            .unwrap();
        routing
            .add_link(crate::spec::RoutingLink::new("rl2", "l2"), "can", "r2", true)
            .unwrap();
        spec.routings.set("t2", routing);

        let flow = CommunicationFlow { communication: "t2".into(), predecessor: "t1".into(), successor: "t3".into() };
        (spec, flow)
    }

    #[test]
    fn end_node_zero_for_resource_without_candidate_mapping() {
        let (spec, flow) = can_bus_specification();
        let routing = spec.routings.get("t2").unwrap();
        let mut factory = VarFactory::new();
        let resources = spec.architecture.resource_lookup();
        let constraints =
            end_node_constraints("t2", routing, &[flow], &spec.mappings, &resources, &mut factory).unwrap();
        // every resource without a candidate yields exactly one `= 0` constraint
        assert!(constraints.iter().any(|c| c.op == PbOp::Eq && c.k == 0));
    }

    #[test]
    fn duplicate_mapping_onto_same_resource_is_invariant_violation() {
        let (mut spec, flow) = can_bus_specification();
        spec.mappings.add(Mapping::new("m1b", "t1", "r1"));
        let routing = spec.routings.get("t2").unwrap();
        let mut factory = VarFactory::new();
        let resources = spec.architecture.resource_lookup();
        let result = end_node_constraints("t2", routing, &[flow], &spec.mappings, &resources, &mut factory);
        assert!(result.is_err());
    }
}
