use std::collections::HashMap;

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Graph;
use regauto::{Automaton, State};

fn state_label(automaton: &Automaton, state: State) -> String {
    let mut label = format!("q{}", state);
    if state == automaton.start() {
        label.push_str(" start");
    }
    if automaton.is_final(state) {
        label.push_str(" final");
    }
    if automaton.sink() == Some(state) {
        label.push_str(" sink");
    }
    label
}

/// One node per state, one edge per move labelled with its symbol.
pub fn to_graph(automaton: &Automaton) -> Graph<String, String> {
    let mut graph: Graph<String, String> = DiGraph::new();
    let mut nodes: HashMap<State, NodeIndex> = HashMap::new();

    for state in automaton.states() {
        let node = graph.add_node(state_label(automaton, *state));
        nodes.insert(*state, node);
    }
    for m in automaton.moves() {
        graph.add_edge(nodes[&m.from], nodes[&m.to], m.symbol.to_string());
    }

    graph
}

pub fn to_dot(automaton: &Automaton) -> String {
    let graph = to_graph(automaton);
    format!("{}", Dot::new(&graph))
}
