//! Property tests for script roundtrip (session -> script -> load -> session)
//!
//! A session printed as a script and loaded back must hold the same
//! constraints and reach the same verdict and model. Comparing solved
//! models is stronger than comparing text: it also covers declaration
//! order and the sort restrictions of narrower variables.


use finsat::{load, parse, Solver, SolverOptions, TacticKind};
use generators::*;
use proptest::prelude::*;

fn arb_tactic() -> impl Strategy<Value = TacticKind> {
    prop_oneof![Just(TacticKind::Simple), Just(TacticKind::WithReorder)]
}

/// Print `solver` as a script, load it back and compare.
fn roundtrip_session(solver: &mut Solver, options: SolverOptions) -> Result<(), String> {
    let script = solver.to_script();
    let problem = load(&script).map_err(|e| format!("Reload failed: {}\nScript:\n{}", e, script))?;

    if problem.constraints != solver.constraints() {
        return Err(format!(
            "Constraint mismatch:\n  Original: {:?}\n  Reloaded: {:?}",
            solver.constraints(),
            problem.constraints
        ));
    }

    let mut reloaded = problem.solver(options);
    let original = solver.model().map_err(|e| format!("Original failed: {}", e))?;
    let again = reloaded.model().map_err(|e| format!("Reloaded failed: {}", e))?;
    if original != again {
        return Err(format!(
            "Model mismatch:\n  Original: {}\n  Reloaded: {}\nScript:\n{}",
            original, again, script
        ));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn roundtrip_generated_session(
        cs in arb_constraints(5, 6, false),
        tactic in arb_tactic(),
    ) {
        let fx = Fixture::with_ref();
        let options = SolverOptions::new().with_tactic(tactic);
        let mut solver = Solver::with_options(fx.domain.clone(), options.clone());
        solver.assert_all(build_all(&cs, &fx));
        if let Err(msg) = roundtrip_session(&mut solver, options) {
            prop_assert!(false, "{}", msg);
        }
    }

    /// Every serialized constraint is a single s-expression
    #[test]
    fn serialized_lines_parse(cs in arb_constraints(4, 6, true)) {
        let fx = Fixture::new();
        let mut solver = Solver::new(fx.domain.clone());
        solver.assert_all(build_all(&cs, &fx));
        let text = solver.serialize();
        let lines: Vec<&str> = if text.is_empty() { vec![] } else { text.split('\n').collect() };
        prop_assert_eq!(lines.len(), cs.len());
        for line in lines {
            let script = parse(line);
            prop_assert!(script.is_ok(), "failed to parse {}", line);
            prop_assert_eq!(script.unwrap().forms.len(), 1);
        }
    }

    /// The printed model is itself well-formed s-expression text
    #[test]
    fn model_text_parses(cs in arb_constraints(5, 6, true)) {
        let fx = Fixture::with_ref();
        let mut solver = Solver::new(fx.domain.clone());
        solver.assert_all(build_all(&cs, &fx));
        let model = solver.model().unwrap();
        let text = model.to_string();
        let script = parse(&text);
        prop_assert!(script.is_ok(), "failed to parse {}", text);
        let forms = script.unwrap().forms;
        prop_assert_eq!(forms.len(), 1);
        prop_assert_eq!(forms[0].node.as_list().map(|items| items.len()), Some(model.len()));
    }
}
