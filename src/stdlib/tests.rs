use super::*;
use crate::runtime::Runtime;

use std::sync::Arc;

// A runtime with three variable cells ($a, $b, $r) and no instructions, for
// invoking commands directly.
fn test_runtime() -> Runtime {
	let mut compiler = Compiler::new();
	install(&mut compiler).unwrap();

	let script = compiler.compile(["$a null", "$b null", "$r null"]).unwrap();
	Runtime::new(Arc::new(script))
}

fn run_script(lines: &[&str]) -> Runtime {
	let mut compiler = Compiler::new();
	install(&mut compiler).unwrap();

	let script = compiler.compile(lines.iter().copied()).unwrap();
	let mut runtime = Runtime::new(Arc::new(script));

	runtime.play(false, false);
	runtime.update(0.016, 1.0);
	runtime
}

fn result_of(runtime: &Runtime, name: &str) -> Value {
	runtime.variable_by_name(name).cloned().unwrap()
}


#[test]
fn arithmetic() {
	let runtime = run_script(&[
		"add 2 3 $add",
		"sub 2 3 $sub",
		"mul 2 3 $mul",
		"div 3 2 $div",
		"mod 7 4 $mod",
		"pow 2 10 $pow",
	]);

	assert_eq!(result_of(&runtime, "add"), Value::Float(5.0));
	assert_eq!(result_of(&runtime, "sub"), Value::Float(-1.0));
	assert_eq!(result_of(&runtime, "mul"), Value::Float(6.0));
	assert_eq!(result_of(&runtime, "div"), Value::Float(1.5));
	assert_eq!(result_of(&runtime, "mod"), Value::Float(3.0));
	assert_eq!(result_of(&runtime, "pow"), Value::Float(1024.0));
}

#[test]
fn arithmetic_reads_through_variables() {
	let runtime = run_script(&[
		"$a 10",
		"$b 4",
		"sub $a $b $r",
	]);

	assert_eq!(result_of(&runtime, "r"), Value::Float(6.0));
}

#[test]
fn arithmetic_parses_numeric_strings() {
	let runtime = run_script(&["add '2' '0.5' $r"]);
	assert_eq!(result_of(&runtime, "r"), Value::Float(2.5));
}

#[test]
fn division_by_zero_yields_infinity_string() {
	let runtime = run_script(&[
		"$b 0",
		"div 1 $b $r",
	]);

	assert_eq!(result_of(&runtime, "r"), Value::String("Infinity".to_owned()));
}

#[test]
fn comparisons() {
	let runtime = run_script(&[
		"greater 2 1 $gt",
		"greater 1 1 $gteq",
		"greater_eq 1 1 $ge",
		"less 1 2 $lt",
		"less_eq 2 1 $le",
	]);

	assert_eq!(result_of(&runtime, "gt"), Value::Bool(true));
	assert_eq!(result_of(&runtime, "gteq"), Value::Bool(false));
	assert_eq!(result_of(&runtime, "ge"), Value::Bool(true));
	assert_eq!(result_of(&runtime, "lt"), Value::Bool(true));
	assert_eq!(result_of(&runtime, "le"), Value::Bool(false));
}

#[test]
fn equal_compares_within_families() {
	let runtime = run_script(&[
		"equal 2 2.0 $numeric",
		"equal 'a' 'a' $text",
		"equal 2 'a' $mixed",
		"equal null null $null",
	]);

	assert_eq!(result_of(&runtime, "numeric"), Value::Bool(true));
	assert_eq!(result_of(&runtime, "text"), Value::Bool(true));
	assert_eq!(result_of(&runtime, "mixed"), Value::Bool(false));
	assert_eq!(result_of(&runtime, "null"), Value::Bool(true));
}

#[test]
fn equal_evaluates_templates() {
	let runtime = run_script(&[
		"$x 'hi'",
		"equal \"$x there\" 'hi there' $r",
	]);

	assert_eq!(result_of(&runtime, "r"), Value::Bool(true));
}

#[test]
fn boolean_logic() {
	let runtime = run_script(&[
		"and true 1 'x' $all",
		"and true false $some",
		"or false false $none",
		"or false true $one",
		"not false $not",
	]);

	assert_eq!(result_of(&runtime, "all"), Value::Bool(true));
	assert_eq!(result_of(&runtime, "some"), Value::Bool(false));
	assert_eq!(result_of(&runtime, "none"), Value::Bool(false));
	assert_eq!(result_of(&runtime, "one"), Value::Bool(true));
	assert_eq!(result_of(&runtime, "not"), Value::Bool(true));
}

#[test]
fn shape_mismatches_are_skipped() {
	let mut runtime = test_runtime();

	// Result parameter is not a variable.
	assert_eq!(
		add(Parameters::new(&[Value::Int(1), Value::Int(2), Value::Int(3)]), &mut runtime),
		Outcome::Skipped,
	);

	// Wrong arity.
	assert_eq!(
		add(Parameters::new(&[Value::Int(1), Value::Variable(2)]), &mut runtime),
		Outcome::Skipped,
	);

	// goto needs a label.
	assert_eq!(
		goto(Parameters::new(&[Value::Int(5)]), &mut runtime),
		Outcome::Skipped,
	);

	// and/or need at least one operand plus a variable result.
	assert_eq!(
		and(Parameters::new(&[Value::Variable(2)]), &mut runtime),
		Outcome::Skipped,
	);

	assert!(!runtime.is_playing());
	assert_eq!(runtime.variable(2), Some(&Value::Null));
}

#[test]
fn skipped_command_line_degrades_gracefully() {
	// A malformed invocation in a script is a silent no-op; playback continues.
	let runtime = run_script(&[
		"add 1 2",
		"$x 'after'",
	]);

	assert_eq!(result_of(&runtime, "x"), Value::String("after".to_owned()));
}

#[test]
fn goto_accepts_variable_held_labels() {
	let runtime = run_script(&[
		"$target @end",
		"goto $target",
		"$x 'skipped'",
		"@end",
	]);

	assert_eq!(result_of(&runtime, "x"), Value::Null);
}

#[test]
fn gotoif_accepts_variable_held_labels() {
	let runtime = run_script(&[
		"$target @end",
		"gotoif true $target",
		"$x 'skipped'",
		"@end",
	]);

	assert_eq!(result_of(&runtime, "x"), Value::Null);
}

#[test]
fn pause_without_argument_is_indefinite() {
	let mut runtime = run_script(&["pause", "$x 1"]);

	assert!(runtime.is_paused());
	assert!(runtime.wait_time() <= 0.0);

	runtime.update(100.0, 1.0);
	assert!(runtime.is_paused());
}
