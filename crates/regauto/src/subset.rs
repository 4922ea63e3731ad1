//! Subset construction: NFA to DFA.

use std::collections::{BTreeMap, HashMap};

use bit_set::BitSet;
use log::{debug, trace};
use regauto_util::Stack;

use crate::automaton::{Automaton, AutomatonBuilder};
use crate::state::{CompositeState, State, StateAllocator};

/// Adds a move to a sink state for every (state, symbol) pair that has none.
///
/// The sink is only created when there is at least one such gap, or when
/// `force` is set. It loops back to itself on every symbol and is never
/// final. Returns the sink if one was created.
pub fn complete(
    builder: &mut AutomatonBuilder,
    allocator: &mut StateAllocator,
    force: bool,
) -> Option<State> {
    let symbols: Vec<_> = builder.alphabet().iter().filter(|x| !x.is_epsilon()).collect();
    let gaps: Vec<_> = builder
        .states()
        .iter()
        .flat_map(|state| symbols.iter().map(move |symbol| (*state, *symbol)))
        .filter(|(state, symbol)| !builder.has_move(*state, *symbol))
        .collect();

    if gaps.is_empty() && !force {
        return None;
    }

    let sink = allocator.fresh();
    builder.set_sink(sink);
    for (state, symbol) in gaps {
        builder.add_move(state, symbol, sink);
    }
    for symbol in symbols {
        builder.add_move(sink, symbol, sink);
    }

    debug!("completed DFA with sink {}", sink);
    Some(sink)
}

/// Result of running the subset construction, with the origin set behind
/// every DFA state still attached.
#[derive(Debug, Clone)]
pub struct SubsetConstruction {
    automaton: Automaton,
    composites: BTreeMap<State, CompositeState>,
}

impl SubsetConstruction {
    pub fn run(nfa: &Automaton) -> SubsetConstruction {
        let index = nfa.index();
        let mut allocator = StateAllocator::new();

        // origin sets are kept as positions in `index` until the end
        let initial = nfa.epsilon_closure(&index.bits([&nfa.start()]));
        let initial_state = allocator.fresh();

        let mut builder = AutomatonBuilder::new(initial_state);

        if nfa.alphabet().is_empty() {
            // nothing to consume: the pattern denotes at most the empty string
            builder.add_final(initial_state);
            let mut composites = BTreeMap::new();
            composites.insert(initial_state, CompositeState::from_bits(index, &initial));
            return SubsetConstruction {
                automaton: builder.freeze(),
                composites,
            };
        }

        builder.add_alphabet(nfa.alphabet());

        // origin set -> assigned state, deduplicated by value
        let mut discovered: HashMap<BitSet, State> = HashMap::new();
        discovered.insert(initial.clone(), initial_state);

        let mut worklist: Stack<(BitSet, State)> = Stack::new();
        worklist.push((initial, initial_state));

        while let Some((from_set, from)) = worklist.pop() {
            for symbol in nfa.alphabet().iter() {
                let to_set = nfa.epsilon_closure(&nfa.step(&from_set, symbol));
                if to_set.is_empty() {
                    continue;
                }

                let to = match discovered.get(&to_set) {
                    Some(existing) => *existing,
                    None => {
                        let fresh = allocator.fresh();
                        trace!(
                            "subset {:?} -> state {}",
                            CompositeState::from_bits(index, &to_set),
                            fresh
                        );
                        discovered.insert(to_set.clone(), fresh);
                        worklist.push((to_set, fresh));
                        fresh
                    }
                };

                builder.add_move(from, symbol, to);
            }
        }

        let composites: BTreeMap<State, CompositeState> = discovered
            .into_iter()
            .map(|(bits, state)| (state, CompositeState::from_bits(index, &bits)))
            .collect();
        for (state, composite) in &composites {
            builder.add_state(*state);
            if composite.intersects(nfa.final_states()) {
                builder.add_final(*state);
            }
        }

        complete(&mut builder, &mut allocator, false);

        debug!(
            "subset construction: {} NFA states -> {} DFA states",
            index.len(),
            builder.states().len()
        );

        SubsetConstruction {
            automaton: builder.freeze(),
            composites,
        }
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// The NFA states `state` was built from. `None` for the sink.
    pub fn composite(&self, state: State) -> Option<&CompositeState> {
        self.composites.get(&state)
    }

    pub fn into_automaton(self) -> Automaton {
        self.automaton
    }
}

pub fn determinize(nfa: &Automaton) -> Automaton {
    SubsetConstruction::run(nfa).into_automaton()
}
