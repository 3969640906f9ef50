//! REPL (Read-Eval-Print Loop) for constraint scripts
//!
//! [`ReplState`] replays script commands against one solving session. The
//! same state backs the interactive prompt and batch runs of a script
//! file, so both behave identically:
//!
//! - declarations go to the [`SortRegistry`]
//! - the session is built on the first `check-sat` / `get-model` over the
//!   Domain of every sort declared so far, and rebuilt if more sorts arrive
//! - the replay stops at the first `check-sat` answering `unsat` and at any
//!   solver failure

use std::fmt;
use std::path::PathBuf;

use crate::elaborate::{elaborate_command, Command, SortRegistry};
use crate::error::{format_elab_error, ElabResult, SolverError};
use crate::expr::Expr;
use crate::sat::Satisfiability;
use crate::solver::{Solver, SolverOptions, TacticKind};

/// Diagnostic printed when a model is requested from an unsat session
pub const MODEL_NOT_AVAILABLE: &str = "model is not available";

pub struct ReplState {
    pub registry: SortRegistry,
    pub options: SolverOptions,
    /// Every assertion so far, for rebuilding the session
    assertions: Vec<Expr>,
    /// Session over the current Domain, built on demand
    solver: Option<Solver>,

    /// Multi-line input buffer
    pub input_buffer: String,

    /// Paren depth for multi-line detection
    pub bracket_depth: i32,
}

impl Default for ReplState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplState {
    pub fn new() -> Self {
        Self::with_options(SolverOptions::default())
    }

    pub fn with_options(options: SolverOptions) -> Self {
        Self {
            registry: SortRegistry::new(),
            options,
            assertions: Vec::new(),
            solver: None,
            input_buffer: String::new(),
            bracket_depth: 0,
        }
    }

    /// Forget every declaration and assertion. Options are kept.
    pub fn reset(&mut self) {
        self.registry = SortRegistry::new();
        self.assertions.clear();
        self.solver = None;
        self.input_buffer.clear();
        self.bracket_depth = 0;
    }

    pub fn assertions(&self) -> &[Expr] {
        &self.assertions
    }

    /// The session, (re)built over the current Domain if needed.
    pub fn session(&mut self) -> &mut Solver {
        let registry = &self.registry;
        let options = &self.options;
        let assertions = &self.assertions;
        self.solver.get_or_insert_with(|| {
            let mut solver = Solver::with_options(registry.domain(), options.clone());
            for var in registry.variables() {
                solver.declare(var);
            }
            solver.assert_all(assertions.iter().cloned());
            solver
        })
    }

    pub fn set_tactic(&mut self, tactic: TacticKind) {
        self.options.tactic = tactic;
        if let Some(solver) = &mut self.solver {
            solver.set_tactic(tactic);
        }
    }

    /// Process a line of input, handling multi-line paren matching
    pub fn process_line(&mut self, line: &str) -> InputResult {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if self.input_buffer.is_empty() {
                return InputResult::Empty;
            }
            return InputResult::Incomplete;
        }

        // Meta-command (only at start, not in continuation)
        if trimmed.starts_with(':') && self.input_buffer.is_empty() {
            return InputResult::MetaCommand(MetaCommand::parse(trimmed));
        }

        if !self.input_buffer.is_empty() {
            self.input_buffer.push('\n');
        }
        self.input_buffer.push_str(line);
        self.bracket_depth += paren_delta(line);

        if self.bracket_depth <= 0 {
            let input = std::mem::take(&mut self.input_buffer);
            self.bracket_depth = 0;
            if input.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with(';')) {
                return InputResult::Empty;
            }
            InputResult::ScriptInput(input)
        } else {
            InputResult::Incomplete
        }
    }

    /// Force submit current buffer (for Ctrl-D)
    pub fn force_submit(&mut self) -> Option<String> {
        if self.input_buffer.is_empty() {
            None
        } else {
            self.bracket_depth = 0;
            Some(std::mem::take(&mut self.input_buffer))
        }
    }

    /// Run script text. A parse error rejects the whole text; an
    /// elaboration error stops the replay at the offending command.
    pub fn execute_script(&mut self, source: &str) -> ElabResult<Execution> {
        let script = crate::parse(source)?;
        let mut responses = Vec::new();

        for form in &script.forms {
            let commands = match elaborate_command(&mut self.registry, form) {
                Ok(cmds) => cmds,
                Err(e) => {
                    return Ok(Execution {
                        responses,
                        flow: Flow::Error(format_elab_error(source, &e)),
                    })
                }
            };
            for cmd in commands {
                let flow = self.execute_command(cmd, &mut responses);
                if flow != Flow::Continue {
                    return Ok(Execution { responses, flow });
                }
            }
        }

        Ok(Execution {
            responses,
            flow: Flow::Continue,
        })
    }

    fn execute_command(&mut self, cmd: Command, out: &mut Vec<Response>) -> Flow {
        match cmd {
            Command::DeclareSort(_) => {
                // The Domain grows: rebuild on next use
                self.solver = None;
            }
            Command::DeclareVar(var) => {
                if let Some(solver) = &mut self.solver {
                    solver.declare(&var);
                }
            }
            Command::Assert(expr) => {
                self.assertions.push(expr.clone());
                if let Some(solver) = &mut self.solver {
                    solver.assert(expr);
                }
            }
            Command::CheckSat => match self.session().check() {
                Ok(sat) => {
                    out.push(Response::CheckSat(sat));
                    if sat.is_unsat() {
                        out.push(Response::Error(MODEL_NOT_AVAILABLE.to_string()));
                        return Flow::Unsat;
                    }
                }
                Err(e) => return fatal(e, out),
            },
            Command::GetModel => match self.session().model() {
                Ok(model) if model.is_sat() => out.push(Response::Model(model.to_string())),
                Ok(_) => out.push(Response::Error(MODEL_NOT_AVAILABLE.to_string())),
                Err(e) => return fatal(e, out),
            },
            Command::Push(_) => {
                if let Err(e) = self.session().push() {
                    out.push(Response::Error(e.to_string()));
                }
            }
            Command::Pop(_) => {
                if let Err(e) = self.session().pop() {
                    out.push(Response::Error(e.to_string()));
                }
            }
            Command::Ignored(_) => {}
            Command::Exit => return Flow::Exit,
        }
        Flow::Continue
    }

    /// Current model in `get-model` form, checking first if needed.
    pub fn model_text(&mut self) -> Result<String, String> {
        let model = self.session().model().map_err(|e| e.to_string())?;
        if model.is_sat() {
            Ok(model.to_string())
        } else {
            Err(MODEL_NOT_AVAILABLE.to_string())
        }
    }

    /// Internal session state: constraints, deferred queue, aliases and
    /// candidate sets.
    pub fn dump(&mut self) -> String {
        let solver = self.session();
        let mut out = String::new();
        out.push_str("; constraints\n");
        out.push_str(&solver.dump_constraints());
        out.push_str("; deferred\n");
        out.push_str(&solver.dump_deferred());
        out.push_str("; aliases\n");
        out.push_str(&solver.dump_aliases());
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("; variables\n");
        out.push_str(&solver.dump_variables());
        out
    }

    /// A script that recreates the current session.
    pub fn script(&mut self) -> String {
        self.session().to_script()
    }

    pub fn stats(&mut self) -> String {
        self.session().stats().to_string()
    }
}

/// A solver failure during `check-sat` or `get-model` aborts the replay.
fn fatal(e: SolverError, out: &mut Vec<Response>) -> Flow {
    let msg = e.to_string();
    out.push(Response::Error(msg.clone()));
    Flow::Error(msg)
}

/// Net paren depth change of a line, skipping comments, strings and
/// quoted symbols.
fn paren_delta(line: &str) -> i32 {
    let mut depth = 0;
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ';' => break,
            '"' => {
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                }
            }
            '|' => {
                for c in chars.by_ref() {
                    if c == '|' {
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    depth
}

/// Result of processing a line of input
#[derive(Debug, PartialEq, Eq)]
pub enum InputResult {
    MetaCommand(MetaCommand),
    ScriptInput(String),
    Incomplete,
    Empty,
}

/// One line of solver output
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    CheckSat(Satisfiability),
    Model(String),
    Error(String),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::CheckSat(sat) => write!(f, "{}", sat),
            Response::Model(text) => f.write_str(text),
            Response::Error(msg) => write!(f, "(error \"{}\")", msg.replace('"', "\"\"")),
        }
    }
}

/// How a replay ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Every command ran
    Continue,
    /// `(exit)` was reached
    Exit,
    /// A `check-sat` answered `unsat`
    Unsat,
    /// Rendered elaboration diagnostic
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Execution {
    pub responses: Vec<Response>,
    pub flow: Flow,
}

/// Meta-commands supported by the REPL
#[derive(Debug, PartialEq, Eq)]
pub enum MetaCommand {
    Help,
    Quit,
    Model,
    Dump,
    Script,
    Stats,
    /// Show (None) or switch the deferred-phase tactic
    Tactic(Option<TacticKind>),
    Reset,
    Source(PathBuf),
    Unknown(String),
}

impl MetaCommand {
    pub fn parse(input: &str) -> Self {
        let input = input.trim_start_matches(':').trim();
        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let arg = parts.next();

        match cmd {
            "help" | "h" | "?" => MetaCommand::Help,
            "quit" | "q" | "exit" => MetaCommand::Quit,
            "model" | "m" => MetaCommand::Model,
            "dump" | "d" => MetaCommand::Dump,
            "script" => MetaCommand::Script,
            "stats" => MetaCommand::Stats,
            "tactic" | "t" => match arg.map(str::parse::<TacticKind>) {
                None => MetaCommand::Tactic(None),
                Some(Ok(kind)) => MetaCommand::Tactic(Some(kind)),
                Some(Err(msg)) => MetaCommand::Unknown(msg),
            },
            "reset" => MetaCommand::Reset,
            "source" | "load" => {
                if let Some(path) = arg {
                    MetaCommand::Source(PathBuf::from(path))
                } else {
                    MetaCommand::Unknown(":source requires a file path".to_string())
                }
            }
            other => MetaCommand::Unknown(format!("Unknown command: :{}", other)),
        }
    }
}
