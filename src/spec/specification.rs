//! The specification aggregate (application, architecture, mappings, and
//! routings) and its graph-backed sub-structures.

use std::collections::HashMap;

use crate::error::SpecError;
use crate::graph::{EdgeId, Graph, NodeId};

use super::element::{Attributes, Dependency, Element, Id, Link, Mapping, Resource, Task, TaskKind};

/// Directed acyclic multigraph over `Task ∪ Communication` vertices with
/// `Dependency` edges.
pub struct Application {
    graph: Graph<Id, Id>,
    tasks: HashMap<Id, Task>,
    dependencies: HashMap<Id, Dependency>,
    node_index: HashMap<Id, NodeId>,
    edge_index: HashMap<Id, EdgeId>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            tasks: HashMap::new(),
            dependencies: HashMap::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
        }
    }

    pub fn add_task(&mut self, task: Task) {
        let node = self.graph.add_vertex(task.id.clone());
        self.node_index.insert(task.id.clone(), node);
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        let node = self.node_index.remove(id)?;
        let incident: Vec<Id> = self
            .graph
            .out_edges(node)
            .chain(self.graph.in_edges(node))
            .filter_map(|e| self.graph.edge(e).cloned())
            .collect();
        self.graph.remove_vertex(node);
        for dep_id in incident {
            self.edge_index.remove(&dep_id);
            self.dependencies.remove(&dep_id);
        }
        self.tasks.remove(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains_task(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.graph.vertices().filter_map(move |n| {
            let id = self.graph.vertex(n)?;
            self.tasks.get(id)
        })
    }

    pub fn add_dependency(
        &mut self,
        dependency: Dependency,
        source: &str,
        destination: &str,
    ) -> Result<(), SpecError> {
        let src = *self.node_index.get(source).ok_or_else(|| {
            SpecError::dangling_reference(format!(
                "dependency '{}' source task '{}' not found in application",
                dependency.id, source
            ))
        })?;
        let dst = *self.node_index.get(destination).ok_or_else(|| {
            SpecError::dangling_reference(format!(
                "dependency '{}' destination task '{}' not found in application",
                dependency.id, destination
            ))
        })?;
        let edge = self.graph.add_edge(src, dst, true, dependency.id.clone());
        self.edge_index.insert(dependency.id.clone(), edge);
        self.dependencies.insert(dependency.id.clone(), dependency);
        Ok(())
    }

    pub fn dependency(&self, id: &str) -> Option<&Dependency> {
        self.dependencies.get(id)
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> + '_ {
        self.graph.edges().filter_map(move |e| {
            let id = self.graph.edge(e)?;
            self.dependencies.get(id)
        })
    }

    pub fn dependency_endpoints(&self, id: &str) -> Option<(Id, Id)> {
        let edge = *self.edge_index.get(id)?;
        let (s, d) = self.graph.endpoints(edge)?;
        Some((self.graph.vertex(s)?.clone(), self.graph.vertex(d)?.clone()))
    }

    /// Direct predecessor task ids of `task_id` (via incoming dependencies).
    pub fn predecessors(&self, task_id: &str) -> Vec<Id> {
        let Some(&node) = self.node_index.get(task_id) else { return Vec::new() };
        self.graph
            .in_edges(node)
            .filter_map(|e| self.graph.opposite(e, node))
            .filter_map(|n| self.graph.vertex(n).cloned())
            .collect()
    }

    /// Direct successor task ids of `task_id` (via outgoing dependencies).
    pub fn successors(&self, task_id: &str) -> Vec<Id> {
        let Some(&node) = self.node_index.get(task_id) else { return Vec::new() };
        self.graph
            .out_edges(node)
            .filter_map(|e| self.graph.opposite(e, node))
            .filter_map(|n| self.graph.vertex(n).cloned())
            .collect()
    }

    /// Undirected adjacency (ignoring dependency direction), used to compute
    /// weakly-connected components.
    pub fn neighbors_undirected(&self, task_id: &str) -> Vec<Id> {
        let mut all = self.predecessors(task_id);
        all.extend(self.successors(task_id));
        all
    }

    /// `filter_processes`: only non-communication tasks.
    pub fn filter_processes<'a>(&'a self, ids: &'a [Id]) -> impl Iterator<Item = &'a Id> + 'a {
        ids.iter().filter(move |id| {
            self.tasks.get(id.as_str()).map(|t| t.kind == TaskKind::Process).unwrap_or(false)
        })
    }

    /// `filter_communications`: only communication tasks.
    pub fn filter_communications<'a>(&'a self, ids: &'a [Id]) -> impl Iterator<Item = &'a Id> + 'a {
        ids.iter().filter(move |id| {
            self.tasks
                .get(id.as_str())
                .map(|t| t.kind == TaskKind::Communication)
                .unwrap_or(false)
        })
    }
}

/// Mixed multigraph over `Resource` vertices with `Link` edges; links may be
/// directed or undirected.
pub struct Architecture {
    graph: Graph<Id, Id>,
    resources: HashMap<Id, Resource>,
    links: HashMap<Id, Link>,
    node_index: HashMap<Id, NodeId>,
    edge_index: HashMap<Id, EdgeId>,
}

impl Default for Architecture {
    fn default() -> Self {
        Self::new()
    }
}

impl Architecture {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            resources: HashMap::new(),
            links: HashMap::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
        }
    }

    pub fn add_resource(&mut self, resource: Resource) {
        let node = self.graph.add_vertex(resource.id.clone());
        self.node_index.insert(resource.id.clone(), node);
        self.resources.insert(resource.id.clone(), resource);
    }

    pub fn remove_resource(&mut self, id: &str) -> Option<Resource> {
        let node = self.node_index.remove(id)?;
        let incident: Vec<Id> = self
            .graph
            .out_edges(node)
            .chain(self.graph.in_edges(node))
            .filter_map(|e| self.graph.edge(e).cloned())
            .collect();
        self.graph.remove_vertex(node);
        for link_id in incident {
            self.edge_index.remove(&link_id);
            self.links.remove(&link_id);
        }
        self.resources.remove(id)
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn contains_resource(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.graph.vertices().filter_map(move |n| {
            let id = self.graph.vertex(n)?;
            self.resources.get(id)
        })
    }

    pub fn add_link(
        &mut self,
        link: Link,
        source: &str,
        destination: &str,
        directed: bool,
    ) -> Result<(), SpecError> {
        let src = *self.node_index.get(source).ok_or_else(|| {
            SpecError::dangling_reference(format!(
                "link '{}' source resource '{}' not found in architecture",
                link.id, source
            ))
        })?;
        let dst = *self.node_index.get(destination).ok_or_else(|| {
            SpecError::dangling_reference(format!(
                "link '{}' destination resource '{}' not found in architecture",
                link.id, destination
            ))
        })?;
        let edge = self.graph.add_edge(src, dst, directed, link.id.clone());
        self.edge_index.insert(link.id.clone(), edge);
        self.links.insert(link.id.clone(), link);
        Ok(())
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.graph.edges().filter_map(move |e| {
            let id = self.graph.edge(e)?;
            self.links.get(id)
        })
    }

    /// A cheap-to-clone lookup closure handed to the constraint generators,
    /// which need owned `Resource`s (for `proxyId` attribute resolution)
    /// keyed by id without borrowing `self` for the whole encode pass.
    pub fn resource_lookup(&self) -> impl Fn(&str) -> Option<Resource> + '_ {
        move |id: &str| self.resource(id).cloned()
    }

    pub fn link_endpoints(&self, id: &str) -> Option<(Id, Id, bool)> {
        let edge = *self.edge_index.get(id)?;
        let (s, d) = self.graph.endpoints(edge)?;
        let directed = self.graph.is_directed(edge)?;
        Some((self.graph.vertex(s)?.clone(), self.graph.vertex(d)?.clone(), directed))
    }

    /// The directed-link view: for each undirected link emit both
    /// `(link, u, v)` and `(link, v, u)`; for directed links, emit once.
    pub fn directed_links(&self) -> Vec<(Id, Id, Id)> {
        let mut out = Vec::new();
        for e in self.graph.edges() {
            let Some(link_id) = self.graph.edge(e).cloned() else { continue };
            let Some((s, d)) = self.graph.endpoints(e) else { continue };
            let Some(directed) = self.graph.is_directed(e) else { continue };
            let (Some(s_id), Some(d_id)) = (self.graph.vertex(s), self.graph.vertex(d)) else {
                continue;
            };
            out.push((link_id.clone(), s_id.clone(), d_id.clone()));
            if !directed {
                out.push((link_id, d_id.clone(), s_id.clone()));
            }
        }
        out
    }
}

/// A link within a communication's sub-architecture; carries a `parent`
/// reference back into the full architecture's `Link` by id.
#[derive(Debug, Clone)]
pub struct RoutingLink {
    pub id: Id,
    pub parent: Id,
    pub attributes: Attributes,
}

impl RoutingLink {
    pub fn new(id: impl Into<Id>, parent: impl Into<Id>) -> Self {
        Self { id: id.into(), parent: parent.into(), attributes: Attributes::new() }
    }
}

/// The sub-architecture a single communication may be routed over. Vertices
/// reference full-architecture resources by id; no separate `Resource`
/// instances are owned here (elements are shared by reference, not
/// duplicated, across the specification's sub-structures).
pub struct Routing {
    graph: Graph<Id, RoutingLink>,
    node_index: HashMap<Id, NodeId>,
    edge_index: HashMap<Id, EdgeId>,
}

impl Default for Routing {
    fn default() -> Self {
        Self::new()
    }
}

impl Routing {
    pub fn new() -> Self {
        Self { graph: Graph::new(), node_index: HashMap::new(), edge_index: HashMap::new() }
    }

    pub fn add_resource(&mut self, resource_id: impl Into<Id>) -> NodeId {
        let resource_id = resource_id.into();
        if let Some(&n) = self.node_index.get(&resource_id) {
            return n;
        }
        let n = self.graph.add_vertex(resource_id.clone());
        self.node_index.insert(resource_id, n);
        n
    }

    pub fn contains_resource(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn remove_resource(&mut self, id: &str) {
        if let Some(n) = self.node_index.remove(id) {
            let incident: Vec<Id> = self
                .graph
                .out_edges(n)
                .chain(self.graph.in_edges(n))
                .filter_map(|e| self.graph.edge(e).map(|l| l.id.clone()))
                .collect();
            self.graph.remove_vertex(n);
            for link_id in incident {
                self.edge_index.remove(&link_id);
            }
        }
    }

    pub fn resources(&self) -> impl Iterator<Item = &Id> + '_ {
        self.graph.vertices().filter_map(move |n| self.graph.vertex(n))
    }

    pub fn resource_count(&self) -> usize {
        self.graph.vertex_count()
    }

    pub fn add_link(
        &mut self,
        link: RoutingLink,
        source: &str,
        destination: &str,
        directed: bool,
    ) -> Result<(), SpecError> {
        let src = *self.node_index.get(source).ok_or_else(|| {
            SpecError::dangling_reference(format!(
                "routing link '{}' source resource '{}' not present in routing",
                link.id, source
            ))
        })?;
        let dst = *self.node_index.get(destination).ok_or_else(|| {
            SpecError::dangling_reference(format!(
                "routing link '{}' destination resource '{}' not present in routing",
                link.id, destination
            ))
        })?;
        let edge = self.graph.add_edge(src, dst, directed, link.clone());
        self.edge_index.insert(link.id, edge);
        Ok(())
    }

    pub fn links(&self) -> impl Iterator<Item = (&RoutingLink, Id, Id, bool)> + '_ {
        self.graph.edges().filter_map(move |e| {
            let link = self.graph.edge(e)?;
            let (s, d) = self.graph.endpoints(e)?;
            let directed = self.graph.is_directed(e)?;
            let s_id = self.graph.vertex(s)?.clone();
            let d_id = self.graph.vertex(d)?.clone();
            Some((link, s_id, d_id, directed))
        })
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// A partial function from each `Communication` task to its sub-architecture.
#[derive(Default)]
pub struct Routings(HashMap<Id, Routing>);

impl Routings {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn get(&self, communication: &str) -> Option<&Routing> {
        self.0.get(communication)
    }

    pub fn get_mut(&mut self, communication: &str) -> Option<&mut Routing> {
        self.0.get_mut(communication)
    }

    pub fn set(&mut self, communication: impl Into<Id>, routing: Routing) {
        self.0.insert(communication.into(), routing);
    }

    pub fn remove(&mut self, communication: &str) -> Option<Routing> {
        self.0.remove(communication)
    }

    pub fn contains(&self, communication: &str) -> bool {
        self.0.contains_key(communication)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Id, &Routing)> + '_ {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Id, &mut Routing)> + '_ {
        self.0.iter_mut()
    }
}

/// A set of [`Mapping`]s, each binding a task source to a resource target.
/// Multiple mappings per task are allowed (they represent the search
/// space); at most one mapping per `(task, resource)` pair is enforced by
/// the routing encoder, not by this container.
#[derive(Default)]
pub struct Mappings {
    entries: Vec<Mapping>,
    index: HashMap<Id, usize>,
}

impl Mappings {
    pub fn new() -> Self {
        Self { entries: Vec::new(), index: HashMap::new() }
    }

    pub fn add(&mut self, mapping: Mapping) {
        if let Some(&i) = self.index.get(&mapping.id) {
            self.entries[i] = mapping;
        } else {
            self.index.insert(mapping.id.clone(), self.entries.len());
            self.entries.push(mapping);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Mapping> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn remove(&mut self, id: &str) -> Option<Mapping> {
        let i = self.index.remove(id)?;
        let removed = self.entries.remove(i);
        for (_, idx) in self.index.iter_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_task<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a Mapping> + 'a {
        self.entries.iter().filter(move |m| m.source == task_id)
    }

    pub fn for_resource<'a>(&'a self, resource_id: &'a str) -> impl Iterator<Item = &'a Mapping> + 'a {
        self.entries.iter().filter(move |m| m.target == resource_id)
    }
}

/// A weakly-connected component of the application.
pub struct Function {
    pub anchor: Id,
    pub members: Vec<Id>,
    pub attributes: Attributes,
}

/// Tuple `(Application, Architecture, Mappings, Routings)` plus its own
/// attribute map.
#[derive(Default)]
pub struct Specification {
    pub application: Application,
    pub architecture: Architecture,
    pub mappings: Mappings,
    pub routings: Routings,
    pub attributes: Attributes,
    /// Function-level attributes as last read/assigned, anchored by a member
    /// task id. Recomputed onto actual `Function`s by
    /// [`super::ops::functions`].
    pub function_attributes: Vec<(Id, Attributes)>,
}

impl Specification {
    pub fn new() -> Self {
        Self::default()
    }
}
