//! The command-line front end for the Grace interpreter: `execute` runs a
//! file to completion, `debug` steps through it interactively.
//!
//! Neither subcommand is part of the evaluator's embedding surface --
//! both are external collaborators built on top of it, per the core
//! crate's split between "evaluator + runtime" and "console/debugger".
//! The recursive-descent front end in [`syntax`] is likewise a minimal
//! stand-in for a real Grace parser, just enough surface syntax to drive
//! every AST node kind the evaluator understands.

mod syntax;

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use grace::{CodeLoc, EvalError, Evaluator, GraceObject, Node};

#[derive(Parser)]
#[command(name = "grace", about = "Run or step through a Grace source file")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a file to completion and print its final partial value.
    Execute { file: PathBuf },
    /// Step through a file's evaluation one node at a time.
    Debug { file: PathBuf },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Execute { file } => execute(&file),
        Command::Debug { file } => debug(&file),
    }
}

fn read_source(file: &PathBuf) -> Result<String, String> {
    log::debug!("reading {}", file.display());
    fs::read_to_string(file).map_err(|err| format!("error reading {}: {err}", file.display()))
}

fn parse_or_report(source: &str) -> Result<Vec<Node>, ExitCode> {
    syntax::parse(source).map_err(|err| {
        eprintln!("parse error: {err}");
        ExitCode::FAILURE
    })
}

fn execute(file: &PathBuf) -> ExitCode {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let ast = match parse_or_report(&source) {
        Ok(ast) => ast,
        Err(code) => return code,
    };

    let mut evaluator = Evaluator::new(None);
    match evaluator.evaluate_ast(&ast) {
        Ok(value) => {
            println!("{}", GraceObject::snapshot(&value, evaluator.heap()));
            ExitCode::SUCCESS
        }
        Err(exc) => {
            eprintln!("{exc}");
            ExitCode::FAILURE
        }
    }
}

/// The `debug` subcommand's own [`grace::DebugHook`]: a direct, synchronous
/// stepper that prompts on stdin/stdout from inside `on_before_node`.
///
/// This evaluator's value model holds its heap-resident data behind `Rc`
/// (see `crates/grace/src/value.rs`), so it is not `Send` and cannot be
/// handed to a background thread the way `grace::BlockingHook`'s
/// channel-based design expects a driver to do. A single-threaded hook
/// that blocks the evaluating thread directly on stdin is simplest to
/// drive from a terminal anyway -- there is only ever the one thread
/// here, so there is nothing for a channel handshake to buy.
struct ReplHook {
    breakpoints: HashSet<u32>,
    stepping: bool,
}

impl ReplHook {
    fn new() -> Self {
        Self {
            breakpoints: HashSet::new(),
            stepping: true,
        }
    }

    fn should_pause(&self, loc: Option<CodeLoc>) -> bool {
        self.stepping || loc.is_some_and(|loc| self.breakpoints.contains(&loc.line))
    }
}

impl grace::DebugHook for ReplHook {
    fn on_before_node(&mut self, node: &Node, evaluator: &mut Evaluator) -> Result<(), EvalError> {
        if !self.should_pause(node.loc) {
            return Ok(());
        }
        loop {
            print_prompt(node.loc);
            let Some(line) = read_command() else {
                return Err(EvalError::Halted);
            };
            let mut words = line.split_whitespace();
            match words.next() {
                Some("step") | Some("s") => {
                    self.stepping = true;
                    return Ok(());
                }
                Some("continue") | Some("c") => {
                    self.stepping = false;
                    return Ok(());
                }
                Some("break") | Some("b") => match words.next().and_then(|n| n.parse().ok()) {
                    Some(line) => {
                        self.breakpoints.insert(line);
                        println!("breakpoint set at line {line}");
                    }
                    None => println!("usage: break <line>"),
                },
                Some("inspect") | Some("i") => match words.next() {
                    Some(name) => inspect(evaluator, name),
                    None => println!("usage: inspect <name>"),
                },
                Some("quit") | Some("q") => return Err(EvalError::Halted),
                _ => println!("commands: step, continue, break <line>, inspect <name>, quit"),
            }
        }
    }
}

fn print_prompt(loc: Option<CodeLoc>) {
    match loc {
        Some(loc) => println!("stopped at {loc}"),
        None => println!("stopped"),
    }
    print!("(grace-debug) ");
    let _ = io::stdout().flush();
}

fn read_command() -> Option<String> {
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_owned()),
        Err(_) => None,
    }
}

fn inspect(evaluator: &Evaluator, name: &str) {
    let snapshot = GraceObject::snapshot(evaluator.current_scope(), evaluator.heap());
    match &snapshot {
        GraceObject::Scope { fields } | GraceObject::UserObject { fields } => match fields.get(name) {
            Some(value) => println!("{name} = {value}"),
            None => println!("no such field '{name}' in scope"),
        },
        other => println!("current scope is not inspectable: {other}"),
    }
}

fn debug(file: &PathBuf) -> ExitCode {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let ast = match parse_or_report(&source) {
        Ok(ast) => ast,
        Err(code) => return code,
    };

    let mut evaluator = Evaluator::new(Some(Box::new(ReplHook::new())));
    match evaluator.evaluate_ast(&ast) {
        Ok(value) => {
            println!("{}", GraceObject::snapshot(&value, evaluator.heap()));
            ExitCode::SUCCESS
        }
        Err(exc) => {
            eprintln!("{exc}");
            ExitCode::FAILURE
        }
    }
}
