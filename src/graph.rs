//! Generic graph substrate.
//!
//! A small vertex/edge arena keyed by opaque indices, with insertion-order
//! iteration and explicit per-edge directedness. The one graph shape that
//! covers both the strictly-directed `Application` and the mixed
//! directed/undirected `Architecture` without forcing either into
//! `petgraph`'s single-directedness model.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(usize);

#[derive(Clone)]
struct Slot<T> {
    value: Option<T>,
}

#[derive(Clone)]
struct EdgeSlot<E> {
    value: Option<E>,
    src: NodeId,
    dst: NodeId,
    directed: bool,
}

/// A directed/undirected multigraph over opaque vertex and edge payloads.
///
/// Iteration order (`vertices()`, `edges()`) is insertion order, skipping
/// tombstoned (removed) slots. Tests in this crate depend on that order
/// being stable.
#[derive(Clone)]
pub struct Graph<V, E> {
    nodes: Vec<Slot<V>>,
    edges: Vec<EdgeSlot<E>>,
    out: HashMap<NodeId, Vec<EdgeId>>,
    inc: HashMap<NodeId, Vec<EdgeId>>,
}

impl<V, E> Default for Graph<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> Graph<V, E> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            out: HashMap::new(),
            inc: HashMap::new(),
        }
    }

    pub fn add_vertex(&mut self, value: V) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Slot { value: Some(value) });
        id
    }

    pub fn remove_vertex(&mut self, id: NodeId) -> Option<V> {
        let removed = self.nodes.get_mut(id.0)?.value.take();
        if removed.is_some() {
            let incident: Vec<EdgeId> = self
                .out
                .get(&id)
                .into_iter()
                .flatten()
                .chain(self.inc.get(&id).into_iter().flatten())
                .copied()
                .collect();
            for e in incident {
                self.remove_edge(e);
            }
            self.out.remove(&id);
            self.inc.remove(&id);
        }
        removed
    }

    pub fn vertex(&self, id: NodeId) -> Option<&V> {
        self.nodes.get(id.0).and_then(|s| s.value.as_ref())
    }

    pub fn vertex_mut(&mut self, id: NodeId) -> Option<&mut V> {
        self.nodes.get_mut(id.0).and_then(|s| s.value.as_mut())
    }

    pub fn add_edge(&mut self, src: NodeId, dst: NodeId, directed: bool, value: E) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(EdgeSlot { value: Some(value), src, dst, directed });
        self.out.entry(src).or_default().push(id);
        self.inc.entry(dst).or_default().push(id);
        if !directed {
            // An undirected edge is reachable as an in-edge/out-edge from
            // either endpoint; callers that need the "two directed
            // incarnations" view should use `directed_incarnations`.
            self.out.entry(dst).or_default().push(id);
            self.inc.entry(src).or_default().push(id);
        }
        id
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<E> {
        let slot = self.edges.get_mut(id.0)?;
        let removed = slot.value.take();
        if removed.is_some() {
            let (src, dst, directed) = (slot.src, slot.dst, slot.directed);
            remove_from(&mut self.out, src, id);
            remove_from(&mut self.inc, dst, id);
            if !directed {
                remove_from(&mut self.out, dst, id);
                remove_from(&mut self.inc, src, id);
            }
        }
        removed
    }

    pub fn edge(&self, id: EdgeId) -> Option<&E> {
        self.edges.get(id.0).and_then(|s| s.value.as_ref())
    }

    pub fn endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edges.get(id.0).and_then(|s| s.value.as_ref().map(|_| (s.src, s.dst)))
    }

    pub fn is_directed(&self, id: EdgeId) -> Option<bool> {
        self.edges.get(id.0).and_then(|s| s.value.as_ref().map(|_| s.directed))
    }

    pub fn opposite(&self, id: EdgeId, v: NodeId) -> Option<NodeId> {
        let (src, dst) = self.endpoints(id)?;
        if v == src {
            Some(dst)
        } else if v == dst {
            Some(src)
        } else {
            None
        }
    }

    pub fn out_edges(&self, v: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.out
            .get(&v)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |e| self.edges[e.0].value.is_some())
    }

    pub fn in_edges(&self, v: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.inc
            .get(&v)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |e| self.edges[e.0].value.is_some())
    }

    pub fn vertices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.value.is_some())
            .map(|(i, _)| NodeId(i))
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, s)| s.value.is_some())
            .map(|(i, _)| EdgeId(i))
    }

    pub fn vertex_count(&self) -> usize {
        self.nodes.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|s| s.value.is_some()).count()
    }
}

fn remove_from(map: &mut HashMap<NodeId, Vec<EdgeId>>, node: NodeId, edge: EdgeId) {
    if let Some(list) = map.get_mut(&node) {
        list.retain(|&e| e != edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_stable() {
        let mut g: Graph<&str, ()> = Graph::new();
        let a = g.add_vertex("a");
        let b = g.add_vertex("b");
        let c = g.add_vertex("c");
        g.remove_vertex(b);
        let d = g.add_vertex("d");
        let order: Vec<NodeId> = g.vertices().collect();
        assert_eq!(order, vec![a, c, d]);
    }

    #[test]
    fn undirected_edge_reachable_from_either_endpoint() {
        let mut g: Graph<(), &str> = Graph::new();
        let u = g.add_vertex(());
        let v = g.add_vertex(());
        let e = g.add_edge(u, v, false, "l");
        assert_eq!(g.out_edges(u).collect::<Vec<_>>(), vec![e]);
        assert_eq!(g.out_edges(v).collect::<Vec<_>>(), vec![e]);
        assert_eq!(g.opposite(e, u), Some(v));
        assert_eq!(g.opposite(e, v), Some(u));
    }

    #[test]
    fn directed_edge_only_outgoing_from_source() {
        let mut g: Graph<(), &str> = Graph::new();
        let u = g.add_vertex(());
        let v = g.add_vertex(());
        let e = g.add_edge(u, v, true, "d");
        assert_eq!(g.out_edges(u).collect::<Vec<_>>(), vec![e]);
        assert_eq!(g.out_edges(v).collect::<Vec<_>>(), vec![]);
        assert_eq!(g.in_edges(v).collect::<Vec<_>>(), vec![e]);
    }

    #[test]
    fn remove_vertex_cascades_to_incident_edges() {
        let mut g: Graph<(), &str> = Graph::new();
        let u = g.add_vertex(());
        let v = g.add_vertex(());
        g.add_edge(u, v, true, "d");
        g.remove_vertex(u);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.vertex_count(), 1);
    }
}
