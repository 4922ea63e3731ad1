use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use regauto::{Automaton, MinimizeOptions, SinkPolicy};
use regauto_bin::{interchange, render};

#[derive(Parser)]
#[command(name = "regauto", about = "Compile regular expressions into finite automata")]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Dot, global = true)]
    format: Format,

    /// Write to this file instead of stdout
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a pattern and print the automaton of the requested stage
    Compile {
        pattern: String,
        #[arg(long, value_enum, default_value_t = Stage::Min)]
        stage: Stage,
        /// Give the minimized DFA an explicit sink even if it is already total
        #[arg(long)]
        always_sink: bool,
    },
    /// Determinize an NFA read from a JSON document
    Determinize { input: PathBuf },
    /// Minimize a complete DFA read from a JSON document
    Minimize {
        input: PathBuf,
        #[arg(long)]
        always_sink: bool,
    },
    /// Report which inputs the pattern matches
    Check { pattern: String, inputs: Vec<String> },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Dot,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Stage {
    Nfa,
    Dfa,
    Min,
}

fn minimize_options(always_sink: bool) -> MinimizeOptions {
    let sink = if always_sink {
        SinkPolicy::Always
    } else {
        SinkPolicy::Preserve
    };
    MinimizeOptions { sink }
}

fn read_automaton(path: &PathBuf) -> Result<Automaton, anyhow::Error> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    interchange::from_json(&json).with_context(|| format!("invalid automaton in {}", path.display()))
}

fn format_automaton(automaton: &Automaton, format: Format) -> Result<String, anyhow::Error> {
    match format {
        Format::Dot => Ok(render::to_dot(automaton)),
        Format::Json => Ok(interchange::to_json(automaton)?),
    }
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let cli = Cli::parse();

    let text = match cli.command {
        Command::Compile {
            pattern,
            stage,
            always_sink,
        } => {
            let nfa = regauto::compile(&pattern)?;
            let automaton = match stage {
                Stage::Nfa => nfa,
                Stage::Dfa => regauto::determinize(&nfa),
                Stage::Min => {
                    let dfa = regauto::determinize(&nfa);
                    regauto::minimize_with(&dfa, minimize_options(always_sink))?
                }
            };
            format_automaton(&automaton, cli.format)?
        }
        Command::Determinize { input } => {
            let nfa = read_automaton(&input)?;
            format_automaton(&regauto::determinize(&nfa), cli.format)?
        }
        Command::Minimize { input, always_sink } => {
            let dfa = read_automaton(&input)?;
            let minimized = regauto::minimize_with(&dfa, minimize_options(always_sink))?;
            format_automaton(&minimized, cli.format)?
        }
        Command::Check { pattern, inputs } => {
            let dfa = regauto::minimize(&regauto::determinize(&regauto::compile(&pattern)?))?;
            inputs
                .iter()
                .map(|x| {
                    let verdict = if dfa.accepts(x) { "match" } else { "no match" };
                    format!("'{}': {}\n", x, verdict)
                })
                .collect()
        }
    };

    match cli.output {
        Some(path) => {
            fs::write(&path, &text).with_context(|| format!("unable to write {}", path.display()))?;
            info!("wrote {}, {} bytes", path.display(), text.len());
        }
        None => print!("{}", text),
    }

    Ok(())
}
