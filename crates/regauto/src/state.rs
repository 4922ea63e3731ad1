use std::collections::BTreeSet;
use std::fmt::{self, Debug, Display};

use bit_set::BitSet;
use serde::{Deserialize, Serialize};

/// A plain automaton state. Identity is the id alone.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(usize);

impl State {
    pub const MIN: State = State(0);
    pub const MAX: State = State(usize::MAX);

    pub fn new(id: usize) -> Self {
        State(id)
    }

    pub fn id(self) -> usize {
        self.0
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out fresh state ids for one independent build.
///
/// Every construction pass owns its allocator, so two builds over the same
/// input number their states identically.
#[derive(Debug, Clone, Default)]
pub struct StateAllocator {
    next: usize,
}

impl StateAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> State {
        let state = State(self.next);
        self.next += 1;
        state
    }
}

/// Dense positions `0..n` for the states of one automaton, in id order.
///
/// Bit sets over states are indexed by position, never by id, so their size
/// tracks the number of states however sparse the ids are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateIndex {
    states: Vec<State>,
}

impl StateIndex {
    pub fn new(states: &BTreeSet<State>) -> Self {
        StateIndex {
            states: states.iter().copied().collect(),
        }
    }

    pub fn position(&self, state: State) -> Option<usize> {
        self.states.binary_search(&state).ok()
    }

    pub fn state(&self, position: usize) -> State {
        self.states[position]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Positions of every member of `states`; non-members are skipped.
    pub fn bits<'a>(&self, states: impl IntoIterator<Item = &'a State>) -> BitSet {
        states.into_iter().filter_map(|x| self.position(*x)).collect()
    }
}

/// A state of the subset construction: a set of origin states.
///
/// Identity is the origin set; the determinizer assigns a plain [`State`]
/// only after the set has been deduplicated against the ones seen so far.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CompositeState {
    origins: BTreeSet<State>,
}

impl CompositeState {
    /// Reads a position set back into the states of `index`.
    pub fn from_bits(index: &StateIndex, bits: &BitSet) -> Self {
        bits.iter().map(|x| index.state(x)).collect()
    }

    pub fn origins(&self) -> &BTreeSet<State> {
        &self.origins
    }

    pub fn intersects(&self, other: &BTreeSet<State>) -> bool {
        !self.origins.is_disjoint(other)
    }
}

impl Debug for CompositeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.origins.iter().map(|x| x.0)).finish()
    }
}

impl FromIterator<State> for CompositeState {
    fn from_iter<I: IntoIterator<Item = State>>(iter: I) -> Self {
        CompositeState {
            origins: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocators_are_independent() {
        let mut first = StateAllocator::new();
        let mut second = StateAllocator::new();
        assert_eq!(first.fresh(), State::new(0));
        assert_eq!(first.fresh(), State::new(1));
        assert_eq!(second.fresh(), State::new(0));
    }

    #[test]
    fn index_is_dense_for_sparse_ids() {
        let huge = State::new(usize::MAX / 2);
        let states = BTreeSet::from([State::new(0), State::new(40), huge]);
        let index = StateIndex::new(&states);

        assert_eq!(index.len(), 3);
        assert_eq!(index.position(huge), Some(2));
        assert_eq!(index.position(State::new(1)), None);
        assert_eq!(index.state(1), State::new(40));

        let bits = index.bits(&[huge, State::new(0)]);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(
            CompositeState::from_bits(&index, &bits),
            [State::new(0), huge].into_iter().collect::<CompositeState>()
        );
    }

    #[test]
    fn composite_equality_ignores_insertion_order() {
        let a: CompositeState = [State::new(4), State::new(0), State::new(2)]
            .into_iter()
            .collect();
        let b: CompositeState = [State::new(0), State::new(2), State::new(4)]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert_eq!(format!("{:?}", a), "{0, 2, 4}");
    }

    #[test]
    fn composite_intersection() {
        let composite: CompositeState = [State::new(6), State::new(11)].into_iter().collect();
        let finals = BTreeSet::from([State::new(11)]);
        let others = BTreeSet::from([State::new(1), State::new(2)]);
        assert!(composite.intersects(&finals));
        assert!(!composite.intersects(&others));
    }
}
