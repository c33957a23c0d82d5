use super::*;

use crate::compiler::Compiler;
use crate::stdlib;

fn compile(lines: &[&str]) -> Arc<Script> {
	let mut compiler = Compiler::new();
	stdlib::install(&mut compiler).unwrap();

	Arc::new(compiler.compile(lines.iter().copied()).unwrap())
}

fn runtime(lines: &[&str]) -> Runtime {
	Runtime::new(compile(lines))
}

fn value_of(runtime: &Runtime, name: &str) -> Value {
	runtime.variable_by_name(name).cloned().unwrap()
}


#[test]
fn fresh_runtime_is_stopped_and_null() {
	let runtime = runtime(&["$x 1", "$y 2"]);

	assert!(!runtime.is_playing());
	assert_eq!(runtime.instruction_index(), 0);
	assert_eq!(value_of(&runtime, "x"), Value::Null);
	assert_eq!(value_of(&runtime, "y"), Value::Null);
}

#[test]
fn update_without_play_is_a_noop() {
	let mut runtime = runtime(&["$x 1"]);

	runtime.update(1.0, 1.0);
	assert_eq!(value_of(&runtime, "x"), Value::Null);
}

#[test]
fn runs_to_completion_in_one_update() {
	let mut runtime = runtime(&[
		"add 2 3 $x",
		"goto @done",
		"$x 0", // skipped by the jump
		"@done",
	]);

	runtime.play(false, false);
	runtime.update(0.016, 1.0);

	assert!(!runtime.is_playing());
	assert_eq!(value_of(&runtime, "x"), Value::Float(5.0));
}

#[test]
fn assignment_dereferences_the_source() {
	let mut runtime = runtime(&[
		"$x 'hello'",
		"$y $x",
		"$x 'changed'",
	]);

	runtime.play(false, false);
	runtime.update(0.016, 1.0);

	// $y captured the value, not a reference to $x.
	assert_eq!(value_of(&runtime, "y"), Value::String("hello".to_owned()));
	assert_eq!(value_of(&runtime, "x"), Value::String("changed".to_owned()));
}

#[test]
fn templates_evaluate_against_current_state() {
	let mut runtime = runtime(&[
		"$x 'hello'",
		"$y \"Value is $x\"",
	]);

	runtime.play(false, false);
	runtime.update(0.016, 1.0);

	assert_eq!(value_of(&runtime, "y").try_string(&runtime, ""), "Value is hello");

	// Never cached: the template re-reads $x at every evaluation.
	runtime.set_variable(0, Value::String("goodbye".to_owned()));
	assert_eq!(value_of(&runtime, "y").try_string(&runtime, ""), "Value is goodbye");
}

#[test]
fn step_mode_runs_one_instruction_per_update() {
	let mut runtime = runtime(&[
		"$x 1",
		"$x 2",
		"$x 3",
	]);

	runtime.play(false, true);

	runtime.update(0.016, 1.0);
	assert_eq!(value_of(&runtime, "x"), Value::Int(1));
	assert!(runtime.is_playing());

	runtime.update(0.016, 1.0);
	assert_eq!(value_of(&runtime, "x"), Value::Int(2));

	runtime.update(0.016, 1.0);
	assert_eq!(value_of(&runtime, "x"), Value::Int(3));
	assert!(runtime.is_playing());

	// The completion check runs at the top of the next update.
	runtime.update(0.016, 1.0);
	assert!(!runtime.is_playing());
}

#[test]
fn timed_pause_counts_down_scaled_time() {
	let mut runtime = runtime(&[
		"$x 1",
		"pause 2.0",
		"$x 2",
	]);

	runtime.play(false, false);

	runtime.update(0.5, 1.0);
	assert_eq!(value_of(&runtime, "x"), Value::Int(1));
	assert!(runtime.is_paused());

	runtime.update(0.5, 1.0);
	runtime.update(0.5, 1.0);
	runtime.update(0.5, 1.0);
	assert_eq!(value_of(&runtime, "x"), Value::Int(1), "resumed before 2.0 elapsed");

	// Cumulative elapsed time reaches exactly 2.0: resumes and finishes
	// within this same update.
	runtime.update(0.5, 1.0);
	assert_eq!(value_of(&runtime, "x"), Value::Int(2));
	assert!(!runtime.is_playing());
}

#[test]
fn time_scale_multiplies_elapsed_time() {
	let mut runtime = runtime(&[
		"pause 2.0",
		"$x 1",
	]);

	runtime.play(false, false);
	runtime.update(0.016, 1.0);

	runtime.update(0.5, 4.0);
	assert_eq!(value_of(&runtime, "x"), Value::Int(1));
}

#[test]
fn indefinite_pause_waits_for_the_host() {
	let mut runtime = runtime(&[
		"pause",
		"$x 1",
		"@resume",
		"$x 2",
	]);

	runtime.play(false, false);

	for _ in 0..10 {
		runtime.update(10.0, 1.0);
	}
	assert!(runtime.is_paused());
	assert_eq!(value_of(&runtime, "x"), Value::Null);

	assert!(runtime.play_from_label("resume", false, false));
	runtime.update(0.016, 1.0);

	assert_eq!(value_of(&runtime, "x"), Value::Int(2));
	assert!(!runtime.is_playing());
}

#[test]
fn play_from_unknown_label_is_rejected() {
	let mut runtime = runtime(&["$x 1"]);

	assert!(!runtime.play_from_label("missing", false, false));
	assert!(!runtime.is_playing());
}

#[test]
fn gotoif_jumps_only_on_true() {
	let lines = [
		"gotoif $cond @skip",
		"$x 'fell through'",
		"@skip",
		"$y 'reached'",
	];

	let mut runtime = runtime(&lines);
	runtime.set_variable(0, Value::Bool(true));
	runtime.play(false, false);
	runtime.update(0.016, 1.0);

	assert_eq!(value_of(&runtime, "x"), Value::Null);
	assert_eq!(value_of(&runtime, "y"), Value::String("reached".to_owned()));

	let mut runtime = self::runtime(&lines);
	runtime.set_variable(0, Value::Bool(false));
	runtime.play(false, false);
	runtime.update(0.016, 1.0);

	assert_eq!(value_of(&runtime, "x"), Value::String("fell through".to_owned()));
	assert_eq!(value_of(&runtime, "y"), Value::String("reached".to_owned()));
}

#[test]
fn exit_stops_mid_script() {
	let mut runtime = runtime(&[
		"$x 1",
		"exit",
		"$x 2",
	]);

	runtime.play(false, false);
	runtime.update(0.016, 1.0);

	assert!(!runtime.is_playing());
	assert_eq!(runtime.instruction_index(), 0);
	assert_eq!(value_of(&runtime, "x"), Value::Int(1));
}

#[test]
fn repeat_restarts_without_resetting_variables() {
	let mut runtime = runtime(&["add $x 1 $x"]);

	runtime.play(true, true);

	runtime.update(0.016, 1.0);
	runtime.update(0.016, 1.0); // completion check, restarts at 0
	runtime.update(0.016, 1.0);

	assert!(runtime.is_playing());
	assert_eq!(value_of(&runtime, "x"), Value::Float(2.0));
}

#[test]
fn replay_after_completion_retains_variables() {
	let mut runtime = runtime(&["add $x 1 $x"]);

	runtime.play(false, false);
	runtime.update(0.016, 1.0);
	assert!(!runtime.is_playing());
	assert_eq!(value_of(&runtime, "x"), Value::Float(1.0));

	runtime.play(false, false);
	runtime.update(0.016, 1.0);
	assert_eq!(value_of(&runtime, "x"), Value::Float(2.0));

	runtime.reset_runtime();
	assert_eq!(value_of(&runtime, "x"), Value::Null);
}

#[test]
fn reset_playback_stops_immediately() {
	let mut runtime = runtime(&[
		"$x 1",
		"pause 5.0",
		"$x 2",
	]);

	runtime.play(false, false);
	runtime.update(0.016, 1.0);
	assert!(runtime.is_paused());

	runtime.reset_playback();
	assert!(!runtime.is_playing());
	assert!(!runtime.is_paused());
	assert_eq!(runtime.instruction_index(), 0);

	// Variables survive a playback reset.
	assert_eq!(value_of(&runtime, "x"), Value::Int(1));
}

#[test]
fn backward_jump_loops_with_a_yield() {
	let mut runtime = runtime(&[
		"@loop",
		"add $n 1 $n",
		"pause 1.0",
		"less $n 3 $more",
		"gotoif $more @loop",
	]);

	runtime.play(false, false);

	for _ in 0..20 {
		runtime.update(1.0, 1.0);
	}

	assert!(!runtime.is_playing());
	assert_eq!(value_of(&runtime, "n"), Value::Float(3.0));
}

#[test]
fn self_jump_re_executes_the_same_instruction() {
	// A goto targeting its own index keeps executing; it never falls through.
	let mut runtime = runtime(&[
		"@loop",
		"goto @loop",
	]);

	runtime.play(false, true);

	for _ in 0..5 {
		runtime.update(0.016, 1.0);
		assert!(runtime.is_playing());
		assert_eq!(runtime.instruction_index(), 0);
	}
}

#[test]
fn shared_script_runtimes_are_independent() {
	let script = compile(&["add $x 1 $x"]);

	let mut first = Runtime::new(script.clone());
	let mut second = Runtime::new(script);

	first.play(false, false);
	first.update(0.016, 1.0);
	first.play(false, false);
	first.update(0.016, 1.0);

	second.play(false, false);
	second.update(0.016, 1.0);

	assert_eq!(value_of(&first, "x"), Value::Float(2.0));
	assert_eq!(value_of(&second, "x"), Value::Float(1.0));
}
