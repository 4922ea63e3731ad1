// pattern grammar: symbols, '|' (alternation), '*' (kleene star) and
// parentheses. concatenation is implicit in the input, so the pattern is
// first marked with an explicit concatenation operator, then translated to
// postfix with shunting-yard:
//
//   (a|b)a*b  ->  (a|b).a*.b  ->  ab|a*.b.
//
// 'ε' denotes the empty string and is an ordinary operand.

use std::fmt::{self, Display};

use log::debug;
use regauto_util::{Queue, Stack};
use thiserror::Error;

use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Operand(Symbol),
    Concatenation,
    Alternation,
    Star,
    LeftParen,
    RightParen,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegexError {
    #[error("malformed pattern: ')' at position {position} of the marked pattern has no matching '('")]
    UnmatchedRightParen { position: usize },
    #[error("malformed pattern: '(' is never closed")]
    UnclosedLeftParen,
    #[error("malformed pattern: '{operator}' is missing an operand")]
    MissingOperand { operator: Token },
    #[error("malformed pattern: {count} fragments left without an operator joining them")]
    DanglingOperands { count: usize },
}

impl Token {
    fn from_char(c: char) -> Token {
        match c {
            '|' => Token::Alternation,
            '*' => Token::Star,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            x => Token::Operand(Symbol::from(x)),
        }
    }

    // pop rank for shunting-yard, operators only
    fn rank(self) -> u8 {
        match self {
            Token::Concatenation => 1,
            Token::Alternation => 2,
            Token::Star => 3,
            _ => 0,
        }
    }

    fn is_left_associative(self) -> bool {
        matches!(self, Token::Concatenation | Token::Star)
    }

    fn ends_operand(self) -> bool {
        matches!(self, Token::Operand(_) | Token::RightParen | Token::Star)
    }

    fn begins_operand(self) -> bool {
        matches!(self, Token::Operand(_) | Token::LeftParen)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Operand(symbol) => write!(f, "{}", symbol),
            Token::Concatenation => write!(f, "."),
            Token::Alternation => write!(f, "|"),
            Token::Star => write!(f, "*"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
        }
    }
}

pub fn tokenize(pattern: &str) -> Vec<Token> {
    pattern.chars().map(Token::from_char).collect()
}

/// Inserts an explicit concatenation operator wherever two operands meet.
pub fn mark_concatenation(tokens: &[Token]) -> Vec<Token> {
    let mut marked: Vec<Token> = Vec::with_capacity(tokens.len() * 2);
    for (i, token) in tokens.iter().copied().enumerate() {
        marked.push(token);
        if let Some(next) = tokens.get(i + 1) {
            if token.ends_operand() && next.begins_operand() {
                marked.push(Token::Concatenation);
            }
        }
    }
    marked
}

/// Shunting-yard over a marked token stream. The postfix tokens come out of
/// the queue in evaluation order.
pub fn to_postfix(marked: &[Token]) -> Result<Queue<Token>, RegexError> {
    let mut output: Queue<Token> = Queue::new();
    let mut operators: Stack<Token> = Stack::new();

    for (position, token) in marked.iter().copied().enumerate() {
        match token {
            Token::Operand(_) => output.enqueue(token),
            Token::LeftParen => operators.push(token),
            Token::RightParen => loop {
                match operators.pop() {
                    Some(Token::LeftParen) => break,
                    Some(operator) => output.enqueue(operator),
                    None => return Err(RegexError::UnmatchedRightParen { position }),
                }
            },
            Token::Concatenation | Token::Alternation | Token::Star => {
                while let Some(top) = operators.peek().copied() {
                    if top == Token::LeftParen {
                        break;
                    }
                    let outranks = top.rank() > token.rank()
                        || (top.rank() == token.rank() && token.is_left_associative());
                    if !outranks {
                        break;
                    }
                    output.enqueue(top);
                    operators.pop();
                }
                operators.push(token);
            }
        }
    }

    while let Some(operator) = operators.pop() {
        if operator == Token::LeftParen {
            return Err(RegexError::UnclosedLeftParen);
        }
        output.enqueue(operator);
    }

    Ok(output)
}

pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(|x| x.to_string()).collect()
}

/// A pattern after both translation steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    marked: Vec<Token>,
    postfix: Vec<Token>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Result<Pattern, RegexError> {
        let marked = mark_concatenation(&tokenize(pattern));
        let postfix: Vec<Token> = to_postfix(&marked)?.into_iter().collect();
        debug!(
            "pattern '{}': marked '{}', postfix '{}'",
            pattern,
            render(&marked),
            render(&postfix)
        );
        Ok(Pattern { marked, postfix })
    }

    pub fn marked(&self) -> &[Token] {
        &self.marked
    }

    pub fn postfix(&self) -> &[Token] {
        &self.postfix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(pattern: &str) -> String {
        render(&mark_concatenation(&tokenize(pattern)))
    }

    fn postfix(pattern: &str) -> String {
        let pattern = Pattern::parse(pattern).expect("pattern should parse");
        render(pattern.postfix())
    }

    #[test]
    fn marks_concatenation() {
        assert_eq!(marked("(a|b)a*b"), "(a|b).a*.b");
        assert_eq!(marked("ab"), "a.b");
        assert_eq!(marked("a(b)"), "a.(b)");
        assert_eq!(marked("(a)(b)"), "(a).(b)");
        assert_eq!(marked("a*b*"), "a*.b*");
        assert_eq!(marked("a|b"), "a|b");
        assert_eq!(marked(""), "");
    }

    #[test]
    fn postfix_follows_rank_table() {
        assert_eq!(postfix("(a|b)a*b"), "ab|a*.b.");
        assert_eq!(postfix("a"), "a");
        assert_eq!(postfix("abc"), "ab.c.");
        assert_eq!(postfix("a**"), "a**");
        assert_eq!(postfix("a(b|c)*"), "abc|*.");
        // alternation outranks concatenation when popping
        assert_eq!(postfix("a|bc"), "ab|c.");
        assert_eq!(postfix("a|b|c"), "abc||");
    }

    #[test]
    fn postfix_queue_drains_in_evaluation_order() {
        let mut queue = to_postfix(&mark_concatenation(&tokenize("a*b"))).expect("pattern parses");
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.dequeue(), Some(Token::Operand(Symbol::Char('a'))));
        assert_eq!(queue.dequeue(), Some(Token::Star));
        assert_eq!(queue.dequeue(), Some(Token::Operand(Symbol::Char('b'))));
        assert_eq!(queue.dequeue(), Some(Token::Concatenation));
        assert!(queue.is_empty());
    }

    #[test]
    fn epsilon_is_an_operand() {
        assert_eq!(
            tokenize("ε"),
            vec![Token::Operand(Symbol::Epsilon)]
        );
        assert_eq!(postfix("aε"), "aε.");
    }

    #[test]
    fn empty_pattern_has_empty_postfix() {
        let pattern = Pattern::parse("").expect("empty pattern parses");
        assert!(pattern.marked().is_empty());
        assert!(pattern.postfix().is_empty());
    }

    #[test]
    fn unbalanced_parentheses() {
        assert_eq!(
            Pattern::parse("a)"),
            Err(RegexError::UnmatchedRightParen { position: 1 })
        );
        assert_eq!(
            Pattern::parse("(a|b"),
            Err(RegexError::UnclosedLeftParen)
        );
        assert_eq!(
            Pattern::parse("(a))"),
            Err(RegexError::UnmatchedRightParen { position: 3 })
        );
    }

    #[test]
    fn error_messages() {
        let error = RegexError::MissingOperand {
            operator: Token::Alternation,
        };
        assert_eq!(error.to_string(), "malformed pattern: '|' is missing an operand");
    }
}
