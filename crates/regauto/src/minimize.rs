//! DFA minimization by partition refinement.
//!
//! Starting from {final states, non-final states}, each pass splits any block
//! whose members disagree about which block some symbol leads to. Passes
//! repeat until one produces the same partition it started from.

use std::collections::BTreeSet;
use std::fmt::{self, Debug};

use bit_set::BitSet;
use log::{debug, trace};

use crate::automaton::{Automaton, AutomatonBuilder, InvariantViolation};
use crate::state::{State, StateAllocator};
use crate::subset::complete;
use crate::symbol::Symbol;

/// Whether a minimized DFA carries an explicit sink state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SinkPolicy {
    /// Keep a sink only if the input DFA had one.
    #[default]
    Preserve,
    /// Always end with an explicit sink, adding one when the input had none.
    Always,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinimizeOptions {
    pub sink: SinkPolicy,
}

// blocks hold positions in the DFA's state index. they are pairwise
// disjoint, non-empty and cover every position.
#[derive(Clone, PartialEq, Eq)]
struct Partition {
    blocks: Vec<BitSet>,
}

impl Partition {
    fn initial(dfa: &Automaton) -> Partition {
        let accept = dfa.index().bits(dfa.final_states());
        let mut nonaccept = dfa.index().bits(dfa.states());
        nonaccept.difference_with(&accept);

        let blocks = vec![accept, nonaccept]
            .into_iter()
            .filter(|x| !x.is_empty())
            .collect();
        Partition { blocks }
    }

    fn block_of(&self, position: usize) -> usize {
        self.blocks
            .iter()
            .position(|x| x.contains(position))
            .expect("partition should cover domain")
    }

    fn position(&self, block: &BitSet) -> Option<usize> {
        self.blocks.iter().position(|x| x == block)
    }

    // `included` takes the place of the old block, `excluded` goes right after it
    fn split(&mut self, index: usize, included: BitSet, excluded: BitSet) {
        self.blocks[index] = included;
        self.blocks.insert(index + 1, excluded);
    }
}

impl Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.blocks.iter().map(|x| x.iter().collect::<BTreeSet<usize>>()))
            .finish()
    }
}

fn delta(dfa: &Automaton, position: usize, symbol: Symbol) -> usize {
    let index = dfa.index();
    dfa.transition(index.state(position), symbol)
        .and_then(|x| index.position(x))
        .expect("complete DFA has a move on every symbol")
}

// one pass over every block of `previous`. target blocks are looked up in the
// partition being built, so a split made earlier in the pass is already seen.
fn refine_pass(dfa: &Automaton, previous: &Partition) -> Partition {
    let mut next = previous.clone();

    for block in &previous.blocks {
        if block.len() < 2 {
            continue;
        }

        'symbols: for symbol in dfa.alphabet().iter() {
            for state in block.iter() {
                let target = &next.blocks[next.block_of(delta(dfa, state, symbol))];
                let included: BitSet = block
                    .iter()
                    .filter(|x| target.contains(delta(dfa, *x, symbol)))
                    .collect();
                let mut excluded = block.clone();
                excluded.difference_with(&included);

                if !excluded.is_empty() {
                    trace!("split {:?} on '{}': {:?} / {:?}", block, symbol, included, excluded);
                    let index = next
                        .position(block)
                        .expect("block is split at most once per pass");
                    next.split(index, included, excluded);
                    break 'symbols;
                }
            }
        }
    }

    next
}

pub fn minimize(dfa: &Automaton) -> Result<Automaton, InvariantViolation> {
    minimize_with(dfa, MinimizeOptions::default())
}

/// Minimizes a complete DFA.
///
/// Fails if `dfa` is not deterministic and total over its alphabet. A
/// complete DFA of the empty language is returned unchanged.
pub fn minimize_with(
    dfa: &Automaton,
    options: MinimizeOptions,
) -> Result<Automaton, InvariantViolation> {
    dfa.check_complete_dfa()?;
    if dfa.final_states().is_empty() {
        return Ok(dfa.clone());
    }

    let mut partition = Partition::initial(dfa);
    loop {
        let next = refine_pass(dfa, &partition);
        if next == partition {
            break;
        }
        partition = next;
    }

    // number blocks by their least member
    partition
        .blocks
        .sort_by_key(|x| x.iter().next().expect("blocks are non-empty"));
    debug!(
        "minimized {} states into {} blocks: {:?}",
        dfa.states().len(),
        partition.blocks.len(),
        partition
    );

    let mut allocator = StateAllocator::new();
    let block_states: Vec<State> = partition.blocks.iter().map(|_| allocator.fresh()).collect();
    let to_block = |state: State| {
        let position = dfa.index().position(state).expect("DFA states are indexed");
        block_states[partition.block_of(position)]
    };

    let mut builder = AutomatonBuilder::new(to_block(dfa.start()));
    builder.add_alphabet(dfa.alphabet());
    for state in &block_states {
        builder.add_state(*state);
    }
    for state in dfa.final_states() {
        builder.add_final(to_block(*state));
    }
    for m in dfa.moves() {
        builder.add_move(to_block(m.from), m.symbol, to_block(m.to));
    }

    match (dfa.sink(), options.sink) {
        (Some(sink), _) => builder.set_sink(to_block(sink)),
        (None, SinkPolicy::Always) => {
            complete(&mut builder, &mut allocator, true);
        }
        (None, SinkPolicy::Preserve) => {}
    }

    Ok(builder.freeze())
}
