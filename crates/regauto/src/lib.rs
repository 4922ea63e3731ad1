//! Regular expressions to finite automata.
//!
//! [`compile`] builds an NFA with Thompson's construction, [`determinize`]
//! turns it into a complete DFA with the subset construction, and
//! [`minimize`] merges equivalent DFA states by partition refinement. Each
//! stage returns a new [`Automaton`]; nothing is shared between stages.

mod automaton;
mod minimize;
pub mod regex;
mod state;
mod subset;
mod symbol;
pub mod thompson;

pub use automaton::{Automaton, AutomatonBuilder, InvariantViolation, Move};
pub use minimize::{minimize, minimize_with, MinimizeOptions, SinkPolicy};
pub use regex::RegexError;
pub use state::{CompositeState, State, StateAllocator, StateIndex};
pub use subset::{complete, determinize, SubsetConstruction};
pub use symbol::{Alphabet, Symbol, EPSILON_CHAR};

/// Compiles `pattern` into an NFA.
///
/// State ids start at 0 and follow creation order, so compiling the same
/// pattern twice gives identical automata.
pub fn compile(pattern: &str) -> Result<Automaton, RegexError> {
    let pattern = regex::Pattern::parse(pattern)?;
    thompson::nfa_from_postfix(&mut StateAllocator::new(), pattern.postfix())
}
