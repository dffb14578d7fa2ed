//! Declaration order for component types.
//!
//! Component A depends on component B when B is reachable from A's inline
//! subtree without passing through another component. The order is a
//! depth-first post-order over those edges. Reference cycles are broken one
//! at a time: the smallest node id on a detected cycle is marked deferred,
//! edges into deferred nodes stop constraining the order, and the search
//! runs again until no cycle is left.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::graph::{NodeId, SchemaGraph, SchemaKind};

/// Linear declaration order plus the nodes declared lazily.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationOrder {
    /// Every component node, dependencies first
    pub order: Vec<NodeId>,
    /// Nodes chosen to break a cycle
    pub deferred: BTreeSet<NodeId>,
    /// The cycle each deferred node was chosen for, starting at that node
    pub cycles: BTreeMap<NodeId, Vec<NodeId>>,
}

impl DeclarationOrder {
    /// Whether `id` was chosen to break a cycle.
    pub fn is_deferred(&self, id: NodeId) -> bool {
        self.deferred.contains(&id)
    }

    /// Index of `id` in the declaration order.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|n| *n == id)
    }

    /// Cycle `id` was deferred for, closed at both ends.
    pub fn cycle(&self, id: NodeId) -> Option<&[NodeId]> {
        self.cycles.get(&id).map(Vec::as_slice)
    }
}

/// Components `id`'s declaration needs, found by walking its inline
/// subtree up to the first component on every branch.
pub fn dependencies(graph: &SchemaGraph, id: NodeId) -> BTreeSet<NodeId> {
    reachable_components(graph, id, SchemaKind::children)
}

/// Components named by `id`'s declaration outside any property type or
/// array item.
pub fn eager_dependencies(graph: &SchemaGraph, id: NodeId) -> BTreeSet<NodeId> {
    reachable_components(graph, id, SchemaKind::eager_children)
}

fn reachable_components(
    graph: &SchemaGraph,
    id: NodeId,
    children: fn(&SchemaKind) -> Vec<NodeId>,
) -> BTreeSet<NodeId> {
    let mut out = BTreeSet::new();
    let mut seen = BTreeSet::new();
    let mut stack = children(&graph.node(id).kind);
    while let Some(child) = stack.pop() {
        if graph.is_component(child) {
            out.insert(child);
        } else if seen.insert(child) {
            stack.extend(children(&graph.node(child).kind));
        }
    }
    out
}

/// A cycle made only of eager edges, starting and ending at its smallest
/// node. Such a cycle has no lazy TypeScript declaration.
pub fn eager_cycle(graph: &SchemaGraph) -> Option<Vec<NodeId>> {
    let edges: Edges = graph
        .components()
        .iter()
        .map(|(_, id)| (*id, eager_dependencies(graph, *id).into_iter().collect()))
        .collect();
    find_cycle(&edges, &BTreeSet::new()).map(|cycle| close_cycle(&cycle))
}

/// Rotate `cycle` to start at its smallest node and repeat that node at
/// the end.
fn close_cycle(cycle: &[NodeId]) -> Vec<NodeId> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, n)| **n)
        .map_or(0, |(i, _)| i);
    let mut closed: Vec<NodeId> = cycle[start..].iter().chain(&cycle[..start]).copied().collect();
    if let Some(&first) = closed.first() {
        closed.push(first);
    }
    closed
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

type Edges = BTreeMap<NodeId, Vec<NodeId>>;

fn live_edges<'e>(
    edges: &'e Edges,
    deferred: &'e BTreeSet<NodeId>,
    node: NodeId,
) -> impl Iterator<Item = NodeId> + 'e {
    edges
        .get(&node)
        .into_iter()
        .flatten()
        .copied()
        .filter(|d| !deferred.contains(d))
}

/// First cycle reachable in id order, as the path from its entry node.
fn find_cycle(edges: &Edges, deferred: &BTreeSet<NodeId>) -> Option<Vec<NodeId>> {
    let mut color: BTreeMap<NodeId, Color> = edges.keys().map(|k| (*k, Color::White)).collect();

    for &start in edges.keys() {
        if color.get(&start) != Some(&Color::White) {
            continue;
        }
        color.insert(start, Color::Gray);
        let mut stack: Vec<(NodeId, Vec<NodeId>)> =
            vec![(start, live_edges(edges, deferred, start).collect())];

        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            if pending.is_empty() {
                color.insert(node, Color::Black);
                stack.pop();
                continue;
            }
            let next = pending.remove(0);
            match color.get(&next).copied().unwrap_or(Color::Black) {
                Color::White => {
                    color.insert(next, Color::Gray);
                    stack.push((next, live_edges(edges, deferred, next).collect()));
                }
                Color::Gray => {
                    let from = stack.iter().position(|(n, _)| *n == next).unwrap_or(0);
                    return Some(stack[from..].iter().map(|(n, _)| *n).collect());
                }
                Color::Black => {}
            }
        }
    }
    None
}

/// Depth-first post-order over live edges, roots visited in id order.
fn post_order(edges: &Edges, deferred: &BTreeSet<NodeId>) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(edges.len());
    let mut visited = BTreeSet::new();

    for &start in edges.keys() {
        if !visited.insert(start) {
            continue;
        }
        let mut stack: Vec<(NodeId, Vec<NodeId>)> =
            vec![(start, live_edges(edges, deferred, start).collect())];
        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            if pending.is_empty() {
                order.push(node);
                stack.pop();
                continue;
            }
            let next = pending.remove(0);
            if visited.insert(next) {
                stack.push((next, live_edges(edges, deferred, next).collect()));
            }
        }
    }
    order
}

/// Compute the declaration order of every component in `graph`.
pub fn resolve(graph: &SchemaGraph) -> DeclarationOrder {
    let edges: Edges = graph
        .components()
        .iter()
        .map(|(_, id)| (*id, dependencies(graph, *id).into_iter().collect()))
        .collect();

    let mut deferred = BTreeSet::new();
    let mut cycles = BTreeMap::new();
    while let Some(cycle) = find_cycle(&edges, &deferred) {
        let Some(&smallest) = cycle.iter().min() else {
            break;
        };
        debug!(node = %smallest, length = cycle.len(), "Deferring node to break reference cycle");
        deferred.insert(smallest);
        cycles.insert(smallest, close_cycle(&cycle));
    }

    let order = post_order(&edges, &deferred);
    debug!(
        declarations = order.len(),
        deferred = deferred.len(),
        "Resolved declaration order"
    );

    DeclarationOrder {
        order,
        deferred,
        cycles,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::spec::ApiDescription;

    fn graph(json: &str) -> SchemaGraph {
        let desc = ApiDescription::from_json(json).unwrap();
        SchemaGraph::build(&desc, false).unwrap().0
    }

    fn id(graph: &SchemaGraph, name: &str) -> NodeId {
        graph
            .components()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
            .unwrap()
    }

    /// Every non-deferred dependency comes before its dependent.
    fn assert_acyclic_order(graph: &SchemaGraph, order: &DeclarationOrder) {
        assert_eq!(order.order.len(), graph.components().len());
        for (pos, node) in order.order.iter().enumerate() {
            for dep in dependencies(graph, *node) {
                if order.is_deferred(dep) {
                    continue;
                }
                let dep_pos = order.position(dep).unwrap();
                assert!(
                    dep_pos < pos || dep == *node,
                    "{dep} must precede {node}"
                );
            }
        }
    }

    #[test]
    fn test_dependencies_stop_at_components() {
        let g = graph(
            r##"{ "components": { "schemas": {
                "Guild": { "type": "object", "properties": {
                    "owner": { "$ref": "#/components/schemas/User" },
                    "roles": { "type": "array", "items": { "$ref": "#/components/schemas/Role" } }
                } },
                "Role": { "type": "object" },
                "User": { "type": "object", "properties": {
                    "flair": { "$ref": "#/components/schemas/Role" }
                } }
            } } }"##,
        );
        let deps: Vec<_> = dependencies(&g, id(&g, "Guild")).into_iter().collect();
        assert_eq!(deps, [id(&g, "Role"), id(&g, "User")]);
    }

    #[test]
    fn test_acyclic_order_places_dependencies_first() {
        let g = graph(
            r##"{ "components": { "schemas": {
                "A": { "type": "object", "properties": { "c": { "$ref": "#/components/schemas/C" } } },
                "B": { "type": "array", "items": { "$ref": "#/components/schemas/A" } },
                "C": { "type": "object", "properties": { "d": { "$ref": "#/components/schemas/D" } } },
                "D": { "type": "string" }
            } } }"##,
        );
        let order = resolve(&g);
        assert!(order.deferred.is_empty());
        assert_acyclic_order(&g, &order);
        let names: Vec<_> = order
            .order
            .iter()
            .map(|n| g.component_name(*n).unwrap())
            .collect();
        assert_eq!(names, ["D", "C", "A", "B"]);
    }

    #[test]
    fn test_two_node_cycle_defers_exactly_one() {
        let g = graph(
            r##"{ "components": { "schemas": {
                "A": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } },
                "B": { "type": "object", "properties": { "a": { "$ref": "#/components/schemas/A" } } }
            } } }"##,
        );
        let order = resolve(&g);
        let a = id(&g, "A");
        let b = id(&g, "B");
        assert_eq!(order.deferred.len(), 1);
        assert!(order.is_deferred(a));
        assert!(!order.is_deferred(b));
        assert_eq!(order.cycle(a), Some([a, b, a].as_slice()));
        assert_acyclic_order(&g, &order);
    }

    #[test]
    fn test_self_reference_is_deferred() {
        let g = graph(
            r##"{ "components": { "schemas": {
                "Node": { "type": "object", "properties": {
                    "children": { "type": "array", "items": { "$ref": "#/components/schemas/Node" } }
                } }
            } } }"##,
        );
        let order = resolve(&g);
        let node = id(&g, "Node");
        assert!(order.is_deferred(node));
        assert_eq!(order.cycle(node), Some([node, node].as_slice()));
        assert_eq!(order.order, [node]);
    }

    #[test]
    fn test_overlapping_cycles_all_broken() {
        // A -> B -> C -> A and B -> D -> B
        let g = graph(
            r##"{ "components": { "schemas": {
                "A": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } },
                "B": { "type": "object", "properties": {
                    "c": { "$ref": "#/components/schemas/C" },
                    "d": { "$ref": "#/components/schemas/D" }
                } },
                "C": { "type": "object", "properties": { "a": { "$ref": "#/components/schemas/A" } } },
                "D": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } }
            } } }"##,
        );
        let order = resolve(&g);
        assert!(order.is_deferred(id(&g, "A")));
        assert!(order.is_deferred(id(&g, "B")));
        assert_eq!(order.deferred.len(), 2);
        assert_acyclic_order(&g, &order);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let json = r##"{ "components": { "schemas": {
            "X": { "type": "object", "properties": { "y": { "$ref": "#/components/schemas/Y" } } },
            "Y": { "oneOf": [ { "$ref": "#/components/schemas/X" }, { "type": "string" } ] },
            "Z": { "type": "array", "items": { "$ref": "#/components/schemas/Y" } }
        } } }"##;
        let first = resolve(&graph(json));
        let second = resolve(&graph(json));
        assert_eq!(first, second);
    }

    #[test]
    fn test_eager_cycle_ignores_property_and_item_edges() {
        let g = graph(
            r##"{ "components": { "schemas": {
                "A": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } },
                "B": { "oneOf": [
                    { "$ref": "#/components/schemas/A" },
                    { "type": "array", "items": { "$ref": "#/components/schemas/B" } }
                ] }
            } } }"##,
        );
        let b = id(&g, "B");
        assert_eq!(eager_dependencies(&g, b).into_iter().collect::<Vec<_>>(), [id(&g, "A")]);
        assert_eq!(eager_cycle(&g), None);
    }

    #[test]
    fn test_eager_cycle_through_unions() {
        let g = graph(
            r##"{ "components": { "schemas": {
                "A": { "oneOf": [{ "$ref": "#/components/schemas/B" }, { "type": "string" }] },
                "B": { "anyOf": [{ "$ref": "#/components/schemas/A" }, { "type": "integer" }] }
            } } }"##,
        );
        let a = id(&g, "A");
        let b = id(&g, "B");
        assert_eq!(eager_cycle(&g), Some(vec![a, b, a]));
    }
}
