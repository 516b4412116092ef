use fxhash::FxHashMap;

use crate::{graph::*, lp::*};

/// Flow variables added by [`add_flow_formulation`]; `arcs[i]` carries flow along
/// `Edge(u, v)` in this direction
#[derive(Clone, Debug)]
pub struct FlowVariables {
    pub arcs: Vec<(Edge, VarId)>,
}

/// Adds a single-commodity flow formulation that forces every integral selection of the
/// `selection` variables (one per node) to be connected to `root`.
///
/// The root emits one unit of flow per selected non-root node, every other node consumes
/// one unit iff it is selected, and flow may only traverse an edge if both endpoints are
/// selected. `capacity` has to bound the flow over any edge; `n - k` suffices as at most
/// that many non-root nodes can join the segment of a master node.
pub fn add_flow_formulation<G, M>(
    model: &mut M,
    graph: &G,
    root: Node,
    selection: &[VarId],
    capacity: f64,
) -> FlowVariables
where
    G: AdjacencyList,
    M: LinearModel + ?Sized,
{
    assert_eq!(selection.len(), graph.len());

    let mut outgoing = vec![Vec::new(); graph.len()];
    let mut incoming = vec![Vec::new(); graph.len()];
    let mut arcs = Vec::new();

    for u in graph.vertices_range() {
        for &v in graph.neighbors_of(u) {
            let var = model.add_variable(VarKind::Continuous, 0.0, f64::INFINITY, 0.0);
            outgoing[u as usize].push(var);
            incoming[v as usize].push(var);
            arcs.push((Edge(u, v), var));
        }
    }

    // flow conservation
    for u in graph.vertices_range() {
        let out = outgoing[u as usize].iter().map(|&e| (e, 1.0));
        let inc = incoming[u as usize].iter().map(|&e| (e, -1.0));

        if u == root {
            let demand = graph
                .vertices_range()
                .filter(|&s| s != root)
                .map(|s| (selection[s as usize], -1.0));
            model.add_constraint(0.0, 0.0, &mut out.chain(inc).chain(demand));
        } else {
            let consume = std::iter::once((selection[u as usize], 1.0));
            model.add_constraint(0.0, 0.0, &mut out.chain(inc).chain(consume));
        }
    }

    // capacities: e(u,v) + e(v,u) <= capacity * x_u and <= capacity * x_v
    let arc_of: FxHashMap<Edge, VarId> = arcs.iter().copied().collect();
    for &(Edge(u, v), var) in arcs.iter().filter(|(e, _)| e.is_normalized()) {
        let back = arc_of[&Edge(v, u)];
        for endpoint in [u, v] {
            model.add_constraint(
                f64::NEG_INFINITY,
                0.0,
                &mut [
                    (var, 1.0),
                    (back, 1.0),
                    (selection[endpoint as usize], -capacity),
                ]
                .into_iter(),
            );
        }
    }

    FlowVariables { arcs }
}
