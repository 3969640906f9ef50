//! Tests for script replay, REPL input handling and the command line

use std::io::Write;
use std::process::Command;

use finsat::repl::{Execution, Flow, InputResult, MetaCommand, ReplState, Response, MODEL_NOT_AVAILABLE};
use finsat::{Satisfiability, TacticKind};

const HEADER: &str = "
(declare-datatypes () ((Kind Int Pointer PointerOffset)))
(declare-fun x () Kind)
(declare-fun y () Kind)
";

fn run(state: &mut ReplState, source: &str) -> Execution {
    state.execute_script(source).expect("script parses")
}

// ============================================================================
// Script replay
// ============================================================================

#[test]
fn test_check_sat_and_get_model() {
    let mut state = ReplState::new();
    let src = format!(
        "{}(assert (or (= x Pointer) (= x PointerOffset)))\n(assert (= y x))\n(check-sat)\n(get-model)\n",
        HEADER
    );
    let exec = run(&mut state, &src);
    assert_eq!(exec.flow, Flow::Continue);
    assert_eq!(
        exec.responses,
        vec![
            Response::CheckSat(Satisfiability::Sat),
            Response::Model("(\n  (x Pointer PointerOffset)\n  (y Pointer PointerOffset)\n)".to_string()),
        ]
    );
    assert_eq!(exec.responses[0].to_string(), "sat");
}

#[test]
fn test_unsat_stops_replay() {
    let mut state = ReplState::new();
    let src = format!(
        "{}(assert (= x Int))\n(assert (= x y))\n(assert (= y Pointer))\n(check-sat)\n(get-model)\n",
        HEADER
    );
    let exec = run(&mut state, &src);
    assert_eq!(exec.flow, Flow::Unsat);
    assert_eq!(
        exec.responses,
        vec![
            Response::CheckSat(Satisfiability::Unsat),
            Response::Error(MODEL_NOT_AVAILABLE.to_string()),
        ]
    );
    assert_eq!(exec.responses[0].to_string(), "unsat");
    assert_eq!(exec.responses[1].to_string(), "(error \"model is not available\")");
}

#[test]
fn test_incremental_replay() {
    let mut state = ReplState::new();
    assert!(run(&mut state, HEADER).responses.is_empty());

    let exec = run(&mut state, "(assert (not (= x Int)))\n(check-sat)");
    assert_eq!(exec.responses, vec![Response::CheckSat(Satisfiability::Sat)]);

    // Assertions after a check reach the live session
    run(&mut state, "(assert (not (= x Pointer)))");
    assert_eq!(
        state.model_text().unwrap(),
        "(\n  (x PointerOffset)\n  (y Int Pointer PointerOffset)\n)"
    );
}

#[test]
fn test_new_sort_rebuilds_session() {
    let mut state = ReplState::new();
    run(&mut state, &format!("{}(assert (= x y))\n(check-sat)", HEADER));

    let exec = run(
        &mut state,
        "(declare-datatypes () ((Extra Null)))\n(declare-fun e () Extra)\n(assert (= y Pointer))\n(get-model)",
    );
    assert_eq!(
        exec.responses,
        vec![Response::Model(
            "(\n  (x Pointer)\n  (y Pointer)\n  (e Null)\n)".to_string()
        )]
    );
    assert_eq!(state.assertions().len(), 2);
}

#[test]
fn test_exit_stops_replay() {
    let mut state = ReplState::new();
    let exec = run(&mut state, "(check-sat)\n(exit)\n(check-sat)");
    assert_eq!(exec.flow, Flow::Exit);
    assert_eq!(exec.responses, vec![Response::CheckSat(Satisfiability::Sat)]);
}

#[test]
fn test_push_pop_report_errors() {
    let mut state = ReplState::new();
    let exec = run(&mut state, "(push 1)\n(pop 1)\n(check-sat)");
    assert_eq!(exec.flow, Flow::Continue);
    assert_eq!(
        exec.responses,
        vec![
            Response::Error("unsupported operation: push".to_string()),
            Response::Error("unsupported operation: pop".to_string()),
            Response::CheckSat(Satisfiability::Sat),
        ]
    );
}

#[test]
fn test_ignored_commands() {
    let mut state = ReplState::new();
    let exec = run(
        &mut state,
        "(set-logic QF_DT)\n(set-option :produce-models true)\n(check-sat)",
    );
    assert_eq!(exec.responses, vec![Response::CheckSat(Satisfiability::Sat)]);
}

#[test]
fn test_elaboration_error_stops_replay() {
    let mut state = ReplState::new();
    let exec = run(&mut state, "(check-sat)\n(assert (= nobody Int))\n(check-sat)");
    assert_eq!(exec.responses, vec![Response::CheckSat(Satisfiability::Sat)]);
    match exec.flow {
        Flow::Error(msg) => assert!(msg.contains("unknown symbol"), "{}", msg),
        other => panic!("expected an error, got {:?}", other),
    }
}

#[test]
fn test_parse_error_rejects_whole_text() {
    let mut state = ReplState::new();
    assert!(state.execute_script("(check-sat").is_err());
    assert!(state.execute_script("(check-sat))").is_err());
}

#[test]
fn test_tactic_switch() {
    let mut state = ReplState::new();
    let src = format!(
        "{}(assert (ite (= x Int) (= y Int) (= y Pointer)))\n(check-sat)",
        HEADER
    );
    state.set_tactic(TacticKind::SimpleTwoPass);
    let exec = run(&mut state, &format!("{}\n(get-model)", src));
    assert_eq!(exec.responses.len(), 1);
    assert!(matches!(exec.responses[0], Response::Error(ref msg) if msg.starts_with("unhandled case")));
    assert!(matches!(exec.flow, Flow::Error(ref msg) if msg.starts_with("unhandled case")));

    state.set_tactic(TacticKind::WithReorder);
    let exec = run(&mut state, "(check-sat)");
    assert_eq!(exec.responses, vec![Response::CheckSat(Satisfiability::Sat)]);
}

#[test]
fn test_reset() {
    let mut state = ReplState::new();
    run(&mut state, &format!("{}(assert (= x Int))", HEADER));
    state.reset();
    assert!(state.assertions().is_empty());
    assert_eq!(state.registry.sort_count(), 0);
    assert_eq!(state.model_text().unwrap(), "(\n)");
}

#[test]
fn test_script_recreates_session() {
    let mut state = ReplState::new();
    run(&mut state, &format!("{}(assert (not (= x y)))", HEADER));
    let script = state.script();
    assert!(script.contains("(declare-fun x () Kind)"), "{}", script);
    assert!(script.contains("(assert (not (= x y)))"), "{}", script);

    let mut replay = ReplState::new();
    let exec = run(&mut replay, &format!("{}(check-sat)", script));
    assert_eq!(exec.responses, vec![Response::CheckSat(Satisfiability::Sat)]);
}

// ============================================================================
// Line handling
// ============================================================================

#[test]
fn test_multiline_input() {
    let mut state = ReplState::new();
    assert_eq!(state.process_line("(assert (or"), InputResult::Incomplete);
    assert_eq!(state.bracket_depth, 2);
    assert_eq!(state.process_line(""), InputResult::Incomplete);
    assert_eq!(
        state.process_line("  (= x Int) (= x Pointer)))"),
        InputResult::ScriptInput("(assert (or\n  (= x Int) (= x Pointer)))".to_string())
    );
    assert_eq!(state.bracket_depth, 0);
    assert!(state.input_buffer.is_empty());
}

#[test]
fn test_parens_in_comments_and_quotes_ignored() {
    let mut state = ReplState::new();
    assert_eq!(
        state.process_line("(check-sat) ; (("),
        InputResult::ScriptInput("(check-sat) ; ((".to_string())
    );
    assert_eq!(
        state.process_line("(set-info :source \"(\")"),
        InputResult::ScriptInput("(set-info :source \"(\")".to_string())
    );
    assert_eq!(state.process_line("(declare-fun |(| () Kind)"), InputResult::ScriptInput("(declare-fun |(| () Kind)".to_string()));
    assert_eq!(state.process_line("; just a comment"), InputResult::Empty);
    assert_eq!(state.process_line("   "), InputResult::Empty);
}

#[test]
fn test_force_submit() {
    let mut state = ReplState::new();
    assert_eq!(state.force_submit(), None);
    state.process_line("(check-sat");
    assert_eq!(state.force_submit(), Some("(check-sat".to_string()));
    assert_eq!(state.bracket_depth, 0);
}

#[test]
fn test_meta_commands() {
    let mut state = ReplState::new();
    assert_eq!(state.process_line(":help"), InputResult::MetaCommand(MetaCommand::Help));
    assert_eq!(MetaCommand::parse(":q"), MetaCommand::Quit);
    assert_eq!(MetaCommand::parse(":model"), MetaCommand::Model);
    assert_eq!(MetaCommand::parse(":dump"), MetaCommand::Dump);
    assert_eq!(MetaCommand::parse(":tactic"), MetaCommand::Tactic(None));
    assert_eq!(
        MetaCommand::parse(":tactic two-pass"),
        MetaCommand::Tactic(Some(TacticKind::SimpleTwoPass))
    );
    assert!(matches!(MetaCommand::parse(":tactic bogus"), MetaCommand::Unknown(_)));
    assert!(matches!(MetaCommand::parse(":source"), MetaCommand::Unknown(_)));
    assert!(matches!(MetaCommand::parse(":frobnicate"), MetaCommand::Unknown(_)));
}

#[test]
fn test_meta_command_only_at_start() {
    let mut state = ReplState::new();
    state.process_line("(assert");
    assert_eq!(state.process_line(":help"), InputResult::Incomplete);
}

#[test]
fn test_dump_sections() {
    let mut state = ReplState::new();
    run(
        &mut state,
        &format!("{}(assert (= x y))\n(assert (=> (= x Int) (= y Int)))", HEADER),
    );
    let dump = state.dump();
    for section in ["; constraints", "; deferred", "; aliases", "; variables"] {
        assert!(dump.contains(section), "{}", dump);
    }
    assert!(dump.contains("Eq(x, y)"), "{}", dump);
}

// ============================================================================
// Command line
// ============================================================================

fn finsat(args: &[&str], script: &str) -> std::process::Output {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(script.as_bytes()).unwrap();
    Command::new(env!("CARGO_BIN_EXE_finsat"))
        .args(args)
        .arg(file.path())
        .output()
        .unwrap()
}

#[test]
fn test_cli_sat_script() {
    let out = finsat(&[], &format!("{}(assert (= x Int))\n(check-sat)\n(get-model)\n", HEADER));
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(
        stdout,
        "sat\n(\n  (x Int)\n  (y Int Pointer PointerOffset)\n)\n"
    );
}

#[test]
fn test_cli_unsat_script_fails() {
    let out = finsat(
        &["--tactic", "simple"],
        &format!("{}(assert (= x Int))\n(assert (not (= x Int)))\n(check-sat)\n(get-model)\n", HEADER),
    );
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout, "unsat\n(error \"model is not available\")\n");
}

#[test]
fn test_cli_rejects_bad_script() {
    let out = finsat(&[], "(assert (= ghost Int))");
    assert_eq!(out.status.code(), Some(1));
    assert!(!out.stderr.is_empty());
}

#[test]
fn test_cli_solver_failure_fails() {
    let out = finsat(
        &["-t", "two-pass"],
        &format!("{}(assert (ite (= x Int) (= y Int) (= y Pointer)))\n(check-sat)\n(get-model)\n", HEADER),
    );
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("(error \"unhandled case"), "{}", stdout);
    assert_eq!(stdout.lines().count(), 1);
}
