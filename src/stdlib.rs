//! The example command library: flow control, float arithmetic, boolean
//! logic, comparisons, and playback control, plus the `null`/`true`/`false`
//! constants. Hosts can register any subset of this alongside their own
//! commands, or ignore it entirely.

use crate::compiler::Compiler;
use crate::runtime::{Outcome, Parameters, Runtime};
use crate::value::{KindMask, Value, ValueKind};

#[cfg(test)]
mod tests;


/// Registers every command and constant below into the compiler.
pub fn install(compiler: &mut Compiler) -> anyhow::Result<()> {
	compiler.add_command("goto", goto)?;          // goto       @label
	compiler.add_command("gotoif", gotoif)?;      // gotoif     value    @label
	compiler.add_command("add", add)?;            // add        a        b        $result
	compiler.add_command("sub", sub)?;            // sub        a        b        $result
	compiler.add_command("mul", mul)?;            // mul        a        b        $result
	compiler.add_command("div", div)?;            // div        a        b        $result
	compiler.add_command("mod", modulo)?;         // mod        a        b        $result
	compiler.add_command("pow", pow)?;            // pow        a        b        $result
	compiler.add_command("and", and)?;            // and        a  ...   n        $result
	compiler.add_command("or", or)?;              // or         a  ...   n        $result
	compiler.add_command("not", not)?;            // not        a        $result
	compiler.add_command("equal", equal)?;        // equal      a        b        $result
	compiler.add_command("greater", greater)?;    // greater    a        b        $result
	compiler.add_command("greater_eq", greater_eq)?;
	compiler.add_command("less", less)?;          // less       a        b        $result
	compiler.add_command("less_eq", less_eq)?;
	compiler.add_command("pause", pause)?;        // pause      [seconds]
	compiler.add_command("exit", exit)?;          // exit

	compiler.add_constant("null", Value::Null)?;
	compiler.add_constant("true", Value::Bool(true))?;
	compiler.add_constant("false", Value::Bool(false))?;

	Ok(())
}


fn goto(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	if !parameters.is_valid(0, &[ValueKind::Variable.mask() | ValueKind::Label.mask()]) {
		return Outcome::Skipped;
	}

	let Some(target) = parameters[0].try_label(runtime) else {
		return Outcome::Skipped;
	};

	runtime.jump_to(target);
	Outcome::Ran
}

fn gotoif(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	if !parameters.is_valid(0, &[KindMask::ANY, ValueKind::Variable.mask() | ValueKind::Label.mask()]) {
		return Outcome::Skipped;
	}

	let Some(target) = parameters[1].try_label(runtime) else {
		return Outcome::Skipped;
	};

	// On false the command still ran; execution just falls through.
	if parameters[0].try_bool(runtime) {
		runtime.jump_to(target);
	}

	Outcome::Ran
}


// Arithmetic and comparison commands share the same shape: two operands of
// any kind, then a variable to receive the result.
fn binary(
	parameters: Parameters<'_>,
	runtime: &mut Runtime,
	apply: impl Fn(f64, f64) -> Value,
) -> Outcome {
	if !parameters.is_valid(2, &[ValueKind::Variable.mask()]) {
		return Outcome::Skipped;
	}

	let a = parameters[0].try_float(runtime, 0.0);
	let b = parameters[1].try_float(runtime, 0.0);

	let Some(slot) = parameters[2].variable_slot() else {
		return Outcome::Skipped;
	};

	runtime.set_variable(slot, apply(a, b));
	Outcome::Ran
}

fn add(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	binary(parameters, runtime, |a, b| Value::Float(a + b))
}

fn sub(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	binary(parameters, runtime, |a, b| Value::Float(a - b))
}

fn mul(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	binary(parameters, runtime, |a, b| Value::Float(a * b))
}

fn div(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	binary(parameters, runtime, |a, b| {
		if b != 0.0 {
			Value::Float(a / b)
		} else {
			Value::String("Infinity".to_owned())
		}
	})
}

fn modulo(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	binary(parameters, runtime, |a, b| Value::Float(a % b))
}

fn pow(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	binary(parameters, runtime, |a, b| Value::Float(a.powf(b)))
}

fn equal(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	if !parameters.is_valid(2, &[ValueKind::Variable.mask()]) {
		return Outcome::Skipped;
	}

	let result = Value::is_equal(&parameters[0], &parameters[1], runtime);

	let Some(slot) = parameters[2].variable_slot() else {
		return Outcome::Skipped;
	};

	runtime.set_variable(slot, Value::Bool(result));
	Outcome::Ran
}

fn greater(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	binary(parameters, runtime, |a, b| Value::Bool(a > b))
}

fn greater_eq(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	binary(parameters, runtime, |a, b| Value::Bool(a >= b))
}

fn less(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	binary(parameters, runtime, |a, b| Value::Bool(a < b))
}

fn less_eq(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	binary(parameters, runtime, |a, b| Value::Bool(a <= b))
}


// and/or take any number of operands followed by a variable result.
fn variadic_bool(
	parameters: Parameters<'_>,
	runtime: &mut Runtime,
	fold: impl Fn(&mut dyn Iterator<Item = bool>) -> bool,
) -> Outcome {
	let Some(result_index) = parameters.len().checked_sub(1).filter(|&index| index >= 1) else {
		return Outcome::Skipped;
	};

	let Some(slot) = parameters[result_index].variable_slot() else {
		return Outcome::Skipped;
	};

	let mut operands = (0..result_index).map(|index| parameters[index].try_bool(runtime));
	let result = fold(&mut operands);
	drop(operands);

	runtime.set_variable(slot, Value::Bool(result));
	Outcome::Ran
}

fn and(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	variadic_bool(parameters, runtime, |operands| {
		for value in operands {
			if !value {
				return false;
			}
		}
		true
	})
}

fn or(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	variadic_bool(parameters, runtime, |operands| {
		for value in operands {
			if value {
				return true;
			}
		}
		false
	})
}

fn not(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	if !parameters.is_valid(1, &[ValueKind::Variable.mask()]) {
		return Outcome::Skipped;
	}

	let result = !parameters[0].try_bool(runtime);

	let Some(slot) = parameters[1].variable_slot() else {
		return Outcome::Skipped;
	};

	runtime.set_variable(slot, Value::Bool(result));
	Outcome::Ran
}


fn pause(parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	let wait_time = match parameters.get(0) {
		Some(value) => value.try_float(runtime, -1.0),
		None => -1.0,
	};

	runtime.pause(wait_time);
	Outcome::Ran
}

fn exit(_parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
	runtime.reset_playback();
	Outcome::Ran
}
