//! finsat - all-sat solver for finite-domain equality constraints
//!
//! Usage: finsat [OPTIONS] [script]
//!
//! With a script (or `-in`), the script is replayed and its responses
//! printed. Without one, an interactive prompt starts.
//!
//! REPL commands:
//!   :help       - Show help
//!   :quit       - Exit REPL
//!   :model      - Show the current model
//!   :dump       - Show solver internals
//!   :tactic [T] - Show or switch the deferred-phase tactic
//!   :reset      - Forget all declarations and assertions

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use finsat::repl::{Execution, Flow, InputResult, MetaCommand, ReplState};
use finsat::{SolverOptions, TacticKind};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const PROMPT: &str = "finsat> ";
const CONTINUATION: &str = "......  ";

/// Where the script comes from
#[derive(Debug, PartialEq, Eq)]
enum Input {
    File(PathBuf),
    Stdin,
    None,
}

#[derive(Debug)]
struct Args {
    input: Input,
    tactic: TacticKind,
    verbosity: u8,
    interactive: bool,
}

/// Parse command line arguments.
///
/// Usage: finsat [OPTIONS] [script]
///
/// Options:
///   -in, --stdin          Read the script from standard input
///   -t, --tactic <name>   Deferred-phase tactic: simple, two-pass, reorder
///   -v                    More logging (repeatable)
///   -i, --interactive     Start the REPL after replaying the script
///   -h, --help            Show help and exit
///   -V, --version         Show version and exit
fn parse_args(args: &[String]) -> Args {
    let mut parsed = Args {
        input: Input::None,
        tactic: TacticKind::default(),
        verbosity: 0,
        interactive: false,
    };
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-in" | "--stdin" => {
                parsed.input = Input::Stdin;
                i += 1;
            }
            "-t" | "--tactic" => {
                let Some(name) = args.get(i + 1) else {
                    eprintln!("Error: {} requires a tactic name", arg);
                    std::process::exit(2);
                };
                match name.parse::<TacticKind>() {
                    Ok(kind) => parsed.tactic = kind,
                    Err(msg) => {
                        eprintln!("Error: {}", msg);
                        std::process::exit(2);
                    }
                }
                i += 2;
            }
            "-i" | "--interactive" => {
                parsed.interactive = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("finsat v{}", VERSION);
                std::process::exit(0);
            }
            _ if arg.starts_with("-v") && arg[1..].chars().all(|c| c == 'v') => {
                parsed.verbosity = parsed.verbosity.saturating_add((arg.len() - 1) as u8);
                i += 1;
            }
            _ if arg.starts_with('-') => {
                eprintln!("Error: Unknown option '{}'", arg);
                eprintln!("Try 'finsat --help' for usage information");
                std::process::exit(2);
            }
            _ => {
                parsed.input = Input::File(PathBuf::from(arg));
                i += 1;
            }
        }
    }

    parsed
}

fn print_usage() {
    println!("finsat v{} - all-sat solver for finite-domain equality constraints", VERSION);
    println!();
    println!("Usage: finsat [OPTIONS] [script]");
    println!();
    println!("Options:");
    println!("  -in, --stdin          Read the script from standard input");
    println!("  -t, --tactic <name>   Deferred-phase tactic: simple, two-pass, reorder (default)");
    println!("  -v                    More logging (-v debug, -vv trace; RUST_LOG overrides)");
    println!("  -i, --interactive     Start the REPL after replaying the script");
    println!("  -h, --help            Show this help message");
    println!("  -V, --version         Show version");
    println!();
    println!("Exit status is 1 when a check-sat answers unsat or the script is rejected.");
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: Failed to set tracing subscriber: {}", e);
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args);
    init_logging(args.verbosity);

    let options = SolverOptions::new()
        .with_tactic(args.tactic)
        .with_debug(args.verbosity > 0);
    let mut state = ReplState::with_options(options);

    let source = match &args.input {
        Input::File(path) => match fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                return ExitCode::from(2);
            }
        },
        Input::Stdin => {
            let mut text = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut text) {
                eprintln!("Error reading standard input: {}", e);
                return ExitCode::from(2);
            }
            Some(text)
        }
        Input::None => None,
    };

    let Some(source) = source else {
        run_repl(&mut state);
        return ExitCode::SUCCESS;
    };

    debug!(input = ?args.input, tactic = %args.tactic, "replaying script");
    let flow = handle_script(&mut state, &source);

    if args.interactive && flow != Flow::Exit {
        run_repl(&mut state);
        return ExitCode::SUCCESS;
    }

    match flow {
        Flow::Continue | Flow::Exit => ExitCode::SUCCESS,
        Flow::Unsat | Flow::Error(_) => ExitCode::from(1),
    }
}

/// Replay script text, printing responses. Returns how the replay ended.
fn handle_script(state: &mut ReplState, source: &str) -> Flow {
    match state.execute_script(source) {
        Ok(Execution { responses, flow }) => {
            for response in &responses {
                println!("{}", response);
            }
            if let Flow::Error(msg) = &flow {
                eprintln!("{}", msg);
            }
            flow
        }
        Err(e) => {
            eprintln!("{}", e);
            Flow::Error(e.to_string())
        }
    }
}

fn run_repl(state: &mut ReplState) {
    println!("finsat v{} - finite-domain all-sat solver", VERSION);
    println!("Type :help for help, :quit to exit\n");

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), DefaultHistory> = match Editor::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: Failed to create editor: {}", e);
            return;
        }
    };

    let history_path = dirs_history_path();
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = if state.input_buffer.is_empty() {
            PROMPT
        } else {
            CONTINUATION
        };

        match rl.readline(prompt) {
            Ok(line) => match state.process_line(&line) {
                InputResult::MetaCommand(cmd) => {
                    if !handle_command(state, cmd) {
                        break;
                    }
                }
                InputResult::ScriptInput(source) => {
                    if handle_script(state, &source) == Flow::Exit {
                        break;
                    }
                }
                InputResult::Incomplete | InputResult::Empty => {}
            },
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C clears the pending buffer
                if !state.input_buffer.is_empty() {
                    state.input_buffer.clear();
                    state.bracket_depth = 0;
                    println!("^C");
                } else {
                    println!("Use :quit or Ctrl-D to exit");
                }
            }
            Err(ReadlineError::Eof) => {
                if let Some(source) = state.force_submit() {
                    handle_script(state, &source);
                } else {
                    println!("\nGoodbye!");
                    break;
                }
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }
}

/// Handle a meta-command. Returns false if we should exit.
fn handle_command(state: &mut ReplState, cmd: MetaCommand) -> bool {
    match cmd {
        MetaCommand::Help => print_help(),
        MetaCommand::Quit => {
            println!("Goodbye!");
            return false;
        }
        MetaCommand::Model => match state.model_text() {
            Ok(text) => println!("{}", text),
            Err(msg) => eprintln!("Error: {}", msg),
        },
        MetaCommand::Dump => print!("{}", state.dump()),
        MetaCommand::Script => println!("{}", state.script()),
        MetaCommand::Stats => println!("{}", state.stats()),
        MetaCommand::Tactic(None) => println!("tactic: {}", state.options.tactic),
        MetaCommand::Tactic(Some(kind)) => {
            state.set_tactic(kind);
            println!("tactic: {}", kind);
        }
        MetaCommand::Reset => {
            state.reset();
            println!("State reset.");
        }
        MetaCommand::Source(path) => handle_source(state, &path),
        MetaCommand::Unknown(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("Type :help for available commands");
        }
    }
    true
}

fn handle_source(state: &mut ReplState, path: &Path) {
    match fs::read_to_string(path) {
        Ok(source) => {
            println!("Loading {}...", path.display());
            handle_script(state, &source);
        }
        Err(e) => eprintln!("Error reading {}: {}", path.display(), e),
    }
}

fn print_help() {
    println!("finsat REPL Commands:");
    println!();
    println!("  :help            Show this help");
    println!("  :quit            Exit the REPL");
    println!("  :model           Show the candidate values of every variable");
    println!("  :dump            Show constraints, deferred queue, aliases and candidate sets");
    println!("  :script          Print a script recreating the session");
    println!("  :stats           Show solver counters");
    println!("  :tactic [name]   Show or switch the tactic (simple, two-pass, reorder)");
    println!("  :source <file>   Load and replay a script file");
    println!("  :reset           Forget all declarations and assertions");
    println!();
    println!("Enter script commands directly, e.g.");
    println!("  (declare-datatypes () ((Kind Int Pointer)))");
    println!("  (declare-fun x () Kind)");
    println!("  (assert (not (= x Int)))");
    println!("  (check-sat)");
    println!("  (get-model)");
    println!();
    println!("Multi-line input is supported - parentheses are matched automatically.");
}

/// History file under the user's home directory
fn dirs_history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".finsat").join("history"))
}
