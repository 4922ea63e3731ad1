//! Thompson's construction over a postfix token stream.
//!
//! Every fragment is an [`AutomatonBuilder`]; composing fragments consumes
//! them. State ids come from the [`StateAllocator`] threaded through each
//! call, in the order the states are created.

use log::trace;
use regauto_util::Stack;

use crate::automaton::{Automaton, AutomatonBuilder};
use crate::regex::{RegexError, Token};
use crate::state::StateAllocator;
use crate::symbol::Symbol;

/// `s0 -symbol-> s1`, with `s1` final.
pub fn symbol_fragment(allocator: &mut StateAllocator, symbol: Symbol) -> AutomatonBuilder {
    let start = allocator.fresh();
    let end = allocator.fresh();

    let mut fragment = AutomatonBuilder::new(start);
    fragment.add_move(start, symbol, end);
    fragment.add_final(end);
    fragment
}

/// `left` followed by `right`: every final state of `left` gets an empty
/// move to the start of `right`.
pub fn concatenate(mut left: AutomatonBuilder, right: AutomatonBuilder) -> AutomatonBuilder {
    let right_start = right.start();
    let right_finals = right.final_states().clone();

    for end in left.take_finals() {
        left.add_epsilon_move(end, right_start);
    }
    left.absorb(right);
    for end in right_finals {
        left.add_final(end);
    }
    left
}

/// `left | right` with a fresh start and a single fresh final state.
pub fn alternate(
    allocator: &mut StateAllocator,
    left: AutomatonBuilder,
    right: AutomatonBuilder,
) -> AutomatonBuilder {
    let start = allocator.fresh();
    let mut fragment = AutomatonBuilder::new(start);
    fragment.add_epsilon_move(start, left.start());
    fragment.add_epsilon_move(start, right.start());

    let old_finals: Vec<_> = left
        .final_states()
        .iter()
        .chain(right.final_states())
        .copied()
        .collect();
    fragment.absorb(left);
    fragment.absorb(right);

    let end = allocator.fresh();
    for old_end in old_finals {
        fragment.add_epsilon_move(old_end, end);
    }
    fragment.add_final(end);
    fragment
}

/// Zero or more repetitions of `inner`.
pub fn star(allocator: &mut StateAllocator, mut inner: AutomatonBuilder) -> AutomatonBuilder {
    let inner_start = inner.start();
    let old_finals = inner.take_finals();
    for old_end in &old_finals {
        inner.add_epsilon_move(*old_end, inner_start);
    }

    let start = allocator.fresh();
    let mut fragment = AutomatonBuilder::new(start);
    fragment.add_epsilon_move(start, inner_start);
    fragment.absorb(inner);

    let end = allocator.fresh();
    for old_end in old_finals {
        fragment.add_epsilon_move(old_end, end);
    }
    // zero repetitions
    fragment.add_epsilon_move(start, end);
    fragment.add_final(end);
    fragment
}

fn pop_operand(
    fragments: &mut Stack<AutomatonBuilder>,
    operator: Token,
) -> Result<AutomatonBuilder, RegexError> {
    fragments
        .pop()
        .ok_or(RegexError::MissingOperand { operator })
}

/// Builds an NFA from a postfix token stream. An empty stream denotes the
/// empty string.
pub fn nfa_from_postfix(
    allocator: &mut StateAllocator,
    postfix: &[Token],
) -> Result<Automaton, RegexError> {
    let mut fragments: Stack<AutomatonBuilder> = Stack::new();

    for token in postfix.iter().copied() {
        let fragment = match token {
            Token::Operand(symbol) => symbol_fragment(allocator, symbol),
            Token::Concatenation => {
                let right = pop_operand(&mut fragments, token)?;
                let left = pop_operand(&mut fragments, token)?;
                concatenate(left, right)
            }
            Token::Alternation => {
                let right = pop_operand(&mut fragments, token)?;
                let left = pop_operand(&mut fragments, token)?;
                alternate(allocator, left, right)
            }
            Token::Star => {
                let inner = pop_operand(&mut fragments, token)?;
                star(allocator, inner)
            }
            // to_postfix never emits parentheses
            Token::LeftParen | Token::RightParen => {
                return Err(RegexError::MissingOperand { operator: token })
            }
        };
        trace!(
            "'{}' -> fragment with {} states, start {}",
            token,
            fragment.states().len(),
            fragment.start()
        );
        fragments.push(fragment);
    }

    let nfa = match (fragments.pop(), fragments.len()) {
        (None, _) => symbol_fragment(allocator, Symbol::Epsilon),
        (Some(fragment), 0) => fragment,
        (Some(_), rest) => return Err(RegexError::DanglingOperands { count: rest + 1 }),
    };

    Ok(nfa.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Move;
    use crate::regex::Pattern;
    use crate::state::State;
    use crate::symbol::Alphabet;

    fn s(id: usize) -> State {
        State::new(id)
    }

    fn moves(nfa: &Automaton) -> Vec<String> {
        nfa.moves().iter().map(|x| x.to_string()).collect()
    }

    fn nfa(pattern: &str) -> Result<Automaton, RegexError> {
        let pattern = Pattern::parse(pattern)?;
        nfa_from_postfix(&mut StateAllocator::new(), pattern.postfix())
    }

    #[test]
    fn concatenation_links_left_finals_to_right_start() {
        let mut allocator = StateAllocator::new();
        let a = symbol_fragment(&mut allocator, Symbol::Char('a'));
        let b = symbol_fragment(&mut allocator, Symbol::Char('b'));
        let ab = concatenate(a, b).build().expect("valid automaton");

        assert_eq!(ab.states().iter().map(|x| x.id()).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(ab.start(), s(0));
        assert_eq!(ab.final_states().iter().copied().collect::<Vec<_>>(), vec![s(3)]);
        assert_eq!(ab.alphabet(), &"ab".chars().collect::<Alphabet>());
        assert_eq!(moves(&ab), vec!["(0, a, 1)", "(1, ε, 2)", "(2, b, 3)"]);
    }

    #[test]
    fn star_adds_loop_back_and_bypass() {
        let mut allocator = StateAllocator::new();
        let a = symbol_fragment(&mut allocator, Symbol::Char('a'));
        let a_star = star(&mut allocator, a).build().expect("valid automaton");

        assert_eq!(a_star.states().len(), 4);
        assert_eq!(a_star.start(), s(2));
        assert_eq!(a_star.final_states().iter().copied().collect::<Vec<_>>(), vec![s(3)]);
        assert_eq!(
            moves(&a_star),
            vec!["(0, a, 1)", "(1, ε, 0)", "(1, ε, 3)", "(2, ε, 0)", "(2, ε, 3)"]
        );
        assert!(a_star.accepts(""));
        assert!(a_star.accepts("aaa"));
    }

    #[test]
    fn alternation_allocates_start_before_final() {
        let mut allocator = StateAllocator::new();
        let a = symbol_fragment(&mut allocator, Symbol::Char('a'));
        let b = symbol_fragment(&mut allocator, Symbol::Char('b'));
        let a_or_b = alternate(&mut allocator, a, b).build().expect("valid automaton");

        assert_eq!(a_or_b.start(), s(4));
        assert_eq!(a_or_b.final_states().iter().copied().collect::<Vec<_>>(), vec![s(5)]);
        assert_eq!(
            moves(&a_or_b),
            vec![
                "(0, a, 1)",
                "(1, ε, 5)",
                "(2, b, 3)",
                "(3, ε, 5)",
                "(4, ε, 0)",
                "(4, ε, 2)"
            ]
        );
    }

    #[test]
    fn single_symbol() {
        let nfa = nfa("a").expect("pattern compiles");
        assert_eq!(nfa.states().len(), 2);
        assert_eq!(nfa.start(), s(0));
        assert_eq!(nfa.final_states().iter().copied().collect::<Vec<_>>(), vec![s(1)]);
        assert_eq!(nfa.alphabet(), &"a".chars().collect::<Alphabet>());
        assert_eq!(
            nfa.moves().iter().copied().collect::<Vec<_>>(),
            vec![Move::new(s(0), Symbol::Char('a'), s(1))]
        );
    }

    #[test]
    fn empty_pattern_strips_epsilon() {
        let nfa = nfa("").expect("empty pattern compiles");
        assert!(nfa.alphabet().is_empty());
        assert_eq!(nfa.states().len(), 2);
        assert_eq!(moves(&nfa), vec!["(0, ε, 1)"]);
        assert!(nfa.accepts(""));
        assert!(!nfa.accepts("a"));
    }

    #[test]
    fn thompson_numbering_for_reference_pattern() {
        let nfa = nfa("(a|b)a*b").expect("pattern compiles");
        assert_eq!(nfa.states().len(), 12);
        assert_eq!(nfa.start(), s(4));
        assert_eq!(nfa.final_states().iter().copied().collect::<Vec<_>>(), vec![s(11)]);
        assert_eq!(
            moves(&nfa),
            vec![
                "(0, a, 1)",
                "(1, ε, 5)",
                "(2, b, 3)",
                "(3, ε, 5)",
                "(4, ε, 0)",
                "(4, ε, 2)",
                "(5, ε, 8)",
                "(6, a, 7)",
                "(7, ε, 6)",
                "(7, ε, 9)",
                "(8, ε, 6)",
                "(8, ε, 9)",
                "(9, ε, 10)",
                "(10, b, 11)"
            ]
        );
    }

    #[test]
    fn missing_operands() {
        assert_eq!(
            nfa("*a"),
            Err(RegexError::MissingOperand {
                operator: Token::Star
            })
        );
        assert_eq!(
            nfa("|a"),
            Err(RegexError::MissingOperand {
                operator: Token::Alternation
            })
        );
        assert_eq!(
            nfa("a|"),
            Err(RegexError::MissingOperand {
                operator: Token::Alternation
            })
        );
    }
}
