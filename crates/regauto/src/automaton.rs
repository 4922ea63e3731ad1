//! The automaton value shared by every stage, and the builder stages use to
//! accumulate one.
//!
//! An [`Automaton`] is immutable once built. Stages mutate only an
//! [`AutomatonBuilder`] they own and freeze it when they are done.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use bit_set::BitSet;
use regauto_util::Stack;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{State, StateIndex};
use crate::symbol::{Alphabet, Symbol, EPSILON_CHAR};

/// A transition `(from, symbol, to)`. Ordered lexicographically by those
/// three fields in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: State,
    pub symbol: Symbol,
    pub to: State,
}

impl Move {
    pub fn new(from: State, symbol: Symbol, to: State) -> Self {
        Move { from, symbol, to }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.from, self.symbol, self.to)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("start state {0} is not in the state set")]
    StartNotInStates(State),
    #[error("final state {0} is not in the state set")]
    FinalNotInStates(State),
    #[error("move {0} references a state outside the state set")]
    MoveEndpointNotInStates(Move),
    #[error("move {0} uses a symbol missing from the alphabet")]
    SymbolNotInAlphabet(Move),
    #[error("the alphabet contains the empty-transition symbol")]
    EpsilonInAlphabet,
    #[error("the alphabet contains '{}' as an ordinary character", EPSILON_CHAR)]
    EpsilonCharInAlphabet,
    #[error("sink state {0} is not a non-final member of the state set")]
    InvalidSink(State),
    #[error("DFA contains the empty-transition move {0}")]
    EpsilonMove(Move),
    #[error("state {state} has more than one move on '{symbol}'")]
    Nondeterministic { state: State, symbol: Symbol },
    #[error("state {state} has no move on '{symbol}'")]
    Incomplete { state: State, symbol: Symbol },
}

fn moves_on(moves: &BTreeSet<Move>, from: State, symbol: Symbol) -> impl Iterator<Item = State> + '_ {
    moves
        .range(Move::new(from, symbol, State::MIN)..=Move::new(from, symbol, State::MAX))
        .map(|x| x.to)
}

/// Finite automaton value: NFA or DFA, depending on its moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    alphabet: Alphabet,
    states: BTreeSet<State>,
    start: State,
    final_states: BTreeSet<State>,
    moves: BTreeSet<Move>,
    sink: Option<State>,
    index: StateIndex,
}

impl Automaton {
    /// Assembles an automaton by hand, checking every structural invariant.
    pub fn new(
        alphabet: Alphabet,
        states: impl IntoIterator<Item = State>,
        start: State,
        final_states: impl IntoIterator<Item = State>,
        moves: impl IntoIterator<Item = Move>,
    ) -> Result<Automaton, InvariantViolation> {
        let states: BTreeSet<State> = states.into_iter().collect();
        let automaton = Automaton {
            alphabet,
            index: StateIndex::new(&states),
            states,
            start,
            final_states: final_states.into_iter().collect(),
            moves: moves.into_iter().collect(),
            sink: None,
        };
        automaton.validate()?;
        Ok(automaton)
    }

    /// Marks `sink` as the explicit sink state.
    pub fn with_sink(mut self, sink: State) -> Result<Automaton, InvariantViolation> {
        self.sink = Some(sink);
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), InvariantViolation> {
        if self.alphabet.contains(Symbol::Epsilon) {
            return Err(InvariantViolation::EpsilonInAlphabet);
        }
        if self.alphabet.contains(Symbol::Char(EPSILON_CHAR)) {
            return Err(InvariantViolation::EpsilonCharInAlphabet);
        }
        if !self.states.contains(&self.start) {
            return Err(InvariantViolation::StartNotInStates(self.start));
        }
        if let Some(state) = self.final_states.iter().find(|x| !self.states.contains(x)) {
            return Err(InvariantViolation::FinalNotInStates(*state));
        }
        for m in &self.moves {
            if !self.states.contains(&m.from) || !self.states.contains(&m.to) {
                return Err(InvariantViolation::MoveEndpointNotInStates(*m));
            }
            if !m.symbol.is_epsilon() && !self.alphabet.contains(m.symbol) {
                return Err(InvariantViolation::SymbolNotInAlphabet(*m));
            }
        }
        if let Some(sink) = self.sink {
            if !self.states.contains(&sink) || self.final_states.contains(&sink) {
                return Err(InvariantViolation::InvalidSink(sink));
            }
        }
        Ok(())
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn states(&self) -> &BTreeSet<State> {
        &self.states
    }

    pub fn start(&self) -> State {
        self.start
    }

    pub fn final_states(&self) -> &BTreeSet<State> {
        &self.final_states
    }

    pub fn moves(&self) -> &BTreeSet<Move> {
        &self.moves
    }

    pub fn sink(&self) -> Option<State> {
        self.sink
    }

    pub fn index(&self) -> &StateIndex {
        &self.index
    }

    fn position(&self, state: State) -> usize {
        self.index
            .position(state)
            .expect("moves only reach member states")
    }

    pub fn is_final(&self, state: State) -> bool {
        self.final_states.contains(&state)
    }

    /// Targets of every move leaving `from` on `symbol`, in id order.
    pub fn moves_on(&self, from: State, symbol: Symbol) -> impl Iterator<Item = State> + '_ {
        moves_on(&self.moves, from, symbol)
    }

    /// The unique target of `from` on `symbol`, if the automaton has one.
    pub fn transition(&self, from: State, symbol: Symbol) -> Option<State> {
        self.moves_on(from, symbol).next()
    }

    pub fn is_deterministic(&self) -> bool {
        self.check_deterministic().is_ok()
    }

    fn check_deterministic(&self) -> Result<(), InvariantViolation> {
        let mut previous: Option<&Move> = None;
        for m in &self.moves {
            if m.symbol.is_epsilon() {
                return Err(InvariantViolation::EpsilonMove(*m));
            }
            // moves are sorted, so a duplicate (from, symbol) pair is adjacent
            if previous.is_some_and(|p| p.from == m.from && p.symbol == m.symbol) {
                return Err(InvariantViolation::Nondeterministic {
                    state: m.from,
                    symbol: m.symbol,
                });
            }
            previous = Some(m);
        }
        Ok(())
    }

    /// Checks that exactly one move leaves every state on every symbol.
    pub fn check_complete_dfa(&self) -> Result<(), InvariantViolation> {
        self.check_deterministic()?;
        for state in &self.states {
            for symbol in self.alphabet.iter() {
                if self.transition(*state, symbol).is_none() {
                    return Err(InvariantViolation::Incomplete {
                        state: *state,
                        symbol,
                    });
                }
            }
        }
        Ok(())
    }

    /// States reachable from `states` through empty-transition moves alone,
    /// including `states` themselves. Both sets hold positions in
    /// [`Automaton::index`], not ids.
    pub fn epsilon_closure(&self, states: &BitSet) -> BitSet {
        let mut closure = states.clone();
        let mut worklist: Stack<usize> = states.iter().collect();

        while let Some(i) = worklist.pop() {
            for next in self.moves_on(self.index.state(i), Symbol::Epsilon) {
                let j = self.position(next);
                if closure.insert(j) {
                    worklist.push(j);
                }
            }
        }

        closure
    }

    /// Positions reached from the positions in `states` by exactly one move
    /// on `symbol`.
    pub fn step(&self, states: &BitSet, symbol: Symbol) -> BitSet {
        let mut result = BitSet::new();
        for i in states.iter() {
            for next in self.moves_on(self.index.state(i), symbol) {
                result.insert(self.position(next));
            }
        }
        result
    }

    /// Runs the automaton on `input` under subset semantics, so NFAs and DFAs
    /// answer the same way.
    pub fn accepts(&self, input: &str) -> bool {
        let mut current = self.epsilon_closure(&self.index.bits([&self.start]));

        for c in input.chars() {
            let symbol = Symbol::Char(c);
            if !self.alphabet.contains(symbol) {
                return false;
            }
            current = self.epsilon_closure(&self.step(&current, symbol));
            if current.is_empty() {
                return false;
            }
        }

        current.iter().any(|x| self.is_final(self.index.state(x)))
    }
}

/// Mutable accumulator for one construction pass.
///
/// The alphabet grows with every move added, the empty-transition symbol
/// included; freezing strips it again.
#[derive(Debug, Clone)]
pub struct AutomatonBuilder {
    alphabet: Alphabet,
    states: BTreeSet<State>,
    start: State,
    final_states: BTreeSet<State>,
    moves: BTreeSet<Move>,
    sink: Option<State>,
}

impl AutomatonBuilder {
    pub fn new(start: State) -> Self {
        AutomatonBuilder {
            alphabet: Alphabet::new(),
            states: BTreeSet::from([start]),
            start,
            final_states: BTreeSet::new(),
            moves: BTreeSet::new(),
            sink: None,
        }
    }

    pub fn add_state(&mut self, state: State) {
        self.states.insert(state);
    }

    pub fn add_symbol(&mut self, symbol: Symbol) {
        self.alphabet.add(symbol);
    }

    pub fn add_alphabet(&mut self, alphabet: &Alphabet) {
        self.alphabet.union_with(alphabet);
    }

    pub fn set_start(&mut self, state: State) {
        self.states.insert(state);
        self.start = state;
    }

    pub fn add_final(&mut self, state: State) {
        self.states.insert(state);
        self.final_states.insert(state);
    }

    /// Removes and returns the current final states.
    pub fn take_finals(&mut self) -> BTreeSet<State> {
        std::mem::take(&mut self.final_states)
    }

    pub fn set_sink(&mut self, state: State) {
        self.states.insert(state);
        self.sink = Some(state);
    }

    pub fn add_move(&mut self, from: State, symbol: Symbol, to: State) {
        self.states.insert(from);
        self.states.insert(to);
        self.alphabet.add(symbol);
        self.moves.insert(Move::new(from, symbol, to));
    }

    pub fn add_epsilon_move(&mut self, from: State, to: State) {
        self.add_move(from, Symbol::Epsilon, to);
    }

    /// Takes over every state, symbol and move of `other`. Start and final
    /// states of `other` are left to the caller.
    pub fn absorb(&mut self, other: AutomatonBuilder) {
        self.alphabet.union_with(&other.alphabet);
        self.states.extend(other.states);
        self.moves.extend(other.moves);
    }

    pub fn has_move(&self, from: State, symbol: Symbol) -> bool {
        moves_on(&self.moves, from, symbol).next().is_some()
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn states(&self) -> &BTreeSet<State> {
        &self.states
    }

    pub fn start(&self) -> State {
        self.start
    }

    pub fn final_states(&self) -> &BTreeSet<State> {
        &self.final_states
    }

    pub fn moves(&self) -> &BTreeSet<Move> {
        &self.moves
    }

    pub fn sink(&self) -> Option<State> {
        self.sink
    }

    /// Freezes the builder, checking every structural invariant.
    pub fn build(self) -> Result<Automaton, InvariantViolation> {
        let automaton = self.into_automaton();
        automaton.validate()?;
        Ok(automaton)
    }

    // the stages only ever add endpoints through add_move / add_state,
    // so their output cannot violate the structural invariants
    pub(crate) fn freeze(self) -> Automaton {
        let automaton = self.into_automaton();
        debug_assert_eq!(automaton.validate(), Ok(()));
        automaton
    }

    fn into_automaton(self) -> Automaton {
        let mut alphabet = self.alphabet;
        alphabet.strip_epsilon();
        Automaton {
            alphabet,
            index: StateIndex::new(&self.states),
            states: self.states,
            start: self.start,
            final_states: self.final_states,
            moves: self.moves,
            sink: self.sink,
        }
    }
}
