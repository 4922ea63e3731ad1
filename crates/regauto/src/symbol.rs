use std::collections::BTreeSet;
use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};

/// Input symbol of an automaton.
///
/// `Epsilon` is the reserved empty-transition symbol. It sorts before every
/// user symbol and never appears in the alphabet of a finished automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

/// How the empty-transition symbol is written in patterns and when rendering.
pub const EPSILON_CHAR: char = 'ε';

impl Symbol {
    pub fn is_epsilon(self) -> bool {
        matches!(self, Symbol::Epsilon)
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        if c == EPSILON_CHAR {
            Symbol::Epsilon
        } else {
            Symbol::Char(c)
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "{}", EPSILON_CHAR),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Ordered set of symbols. Iteration follows the symbols' natural order.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Alphabet {
    symbols: BTreeSet<Symbol>,
}

impl Alphabet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol);
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.symbols.contains(&symbol)
    }

    pub fn union_with(&mut self, other: &Alphabet) {
        self.symbols.extend(other.symbols.iter().copied());
    }

    pub(crate) fn strip_epsilon(&mut self) {
        self.symbols.remove(&Symbol::Epsilon);
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.symbols.iter().map(|x| x.to_string()))
            .finish()
    }
}

impl FromIterator<Symbol> for Alphabet {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Alphabet {
            symbols: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<char> for Alphabet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        iter.into_iter().map(Symbol::from).collect()
    }
}
