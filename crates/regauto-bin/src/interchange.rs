// json interchange format. documents are built from the automaton's read
// accessors only, and read back through Automaton::new so every structural
// check applies to hand-edited files too.

use anyhow::Context;
use regauto::{Alphabet, Automaton, InvariantViolation, Move, State, Symbol};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonDocument {
    pub alphabet: Vec<Symbol>,
    pub states: Vec<State>,
    pub start: State,
    pub final_states: Vec<State>,
    pub moves: Vec<Move>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<State>,
}

impl From<&Automaton> for AutomatonDocument {
    fn from(automaton: &Automaton) -> Self {
        AutomatonDocument {
            alphabet: automaton.alphabet().iter().collect(),
            states: automaton.states().iter().copied().collect(),
            start: automaton.start(),
            final_states: automaton.final_states().iter().copied().collect(),
            moves: automaton.moves().iter().copied().collect(),
            sink: automaton.sink(),
        }
    }
}

impl TryFrom<AutomatonDocument> for Automaton {
    type Error = InvariantViolation;

    fn try_from(document: AutomatonDocument) -> Result<Self, Self::Error> {
        let automaton = Automaton::new(
            document.alphabet.into_iter().collect::<Alphabet>(),
            document.states,
            document.start,
            document.final_states,
            document.moves,
        )?;
        match document.sink {
            Some(sink) => automaton.with_sink(sink),
            None => Ok(automaton),
        }
    }
}

pub fn to_json(automaton: &Automaton) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&AutomatonDocument::from(automaton))
}

pub fn from_json(json: &str) -> Result<Automaton, anyhow::Error> {
    let document: AutomatonDocument =
        serde_json::from_str(json).with_context(|| "not an automaton document")?;
    let automaton = Automaton::try_from(document)?;
    Ok(automaton)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_keeps_structure() {
        let nfa = regauto::compile("(a|b)*c").expect("pattern compiles");
        let dfa = regauto::determinize(&nfa);

        for automaton in [nfa, dfa] {
            let json = to_json(&automaton).expect("serializable");
            let read_back = from_json(&json).expect("valid document");
            assert_eq!(read_back, automaton);
        }
    }

    #[test]
    fn document_lists_parts_in_order() {
        let nfa = regauto::compile("ab").expect("pattern compiles");
        let document = AutomatonDocument::from(&nfa);
        assert_eq!(
            document.alphabet,
            vec![Symbol::Char('a'), Symbol::Char('b')]
        );
        assert_eq!(document.start, State::new(0));
        assert_eq!(document.final_states, vec![State::new(3)]);
        assert_eq!(document.moves.len(), 3);
        assert_eq!(document.sink, None);
    }

    #[test]
    fn rejects_dangling_moves() {
        let document = AutomatonDocument {
            alphabet: vec![Symbol::Char('a')],
            states: vec![State::new(0)],
            start: State::new(0),
            final_states: vec![],
            moves: vec![Move::new(State::new(0), Symbol::Char('a'), State::new(7))],
            sink: None,
        };
        let json = serde_json::to_string(&document).expect("serializable");

        let error = from_json(&json).expect_err("move target is not a state");
        assert_eq!(
            error.downcast_ref::<InvariantViolation>(),
            Some(&InvariantViolation::MoveEndpointNotInStates(Move::new(
                State::new(0),
                Symbol::Char('a'),
                State::new(7)
            )))
        );
    }

    #[test]
    fn rejects_epsilon_char_as_symbol() {
        let json = r#"{
            "alphabet": [{ "Char": "ε" }],
            "states": [0],
            "start": 0,
            "final_states": [],
            "moves": [{ "from": 0, "symbol": { "Char": "ε" }, "to": 0 }]
        }"#;

        let error = from_json(json).expect_err("ε is reserved");
        assert_eq!(
            error.downcast_ref::<InvariantViolation>(),
            Some(&InvariantViolation::EpsilonCharInAlphabet)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(from_json("{ \"states\": 3 }").is_err());
    }
}
