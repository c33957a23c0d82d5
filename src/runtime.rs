use std::sync::Arc;

use smallvec::SmallVec;

use crate::compiler::Script;
use crate::value::{KindMask, Value};

#[cfg(test)]
mod tests;


/// A host-defined operation invoked by a command instruction. Implementations
/// validate their own parameter shape and return [`Outcome::Skipped`] on a
/// mismatch instead of raising an error, so a single malformed line degrades
/// to a no-op rather than halting playback.
pub trait Command {
	fn invoke(&self, parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome;
}

impl<F> Command for F
	where F: Fn(Parameters<'_>, &mut Runtime) -> Outcome
{
	fn invoke(&self, parameters: Parameters<'_>, runtime: &mut Runtime) -> Outcome {
		self(parameters, runtime)
	}
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
	Ran,
	Skipped,
}


/// The ordered parameter values of one command invocation.
#[derive(Copy, Clone)]
pub struct Parameters<'p> {
	values: &'p [Value],
}

impl<'p> Parameters<'p> {
	pub fn new(values: &'p [Value]) -> Parameters<'p> {
		Parameters { values }
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&'p Value> {
		self.values.get(index)
	}

	/// Shape check: exactly `leading_any` parameters of any kind followed by
	/// one parameter per mask, each accepted by its mask.
	pub fn is_valid(&self, leading_any: usize, masks: &[KindMask]) -> bool {
		if self.values.len() != leading_any + masks.len() {
			return false;
		}

		masks.iter()
			.zip(&self.values[leading_any..])
			.all(|(mask, value)| mask.accepts(value.kind()))
	}
}

impl std::ops::Index<usize> for Parameters<'_> {
	type Output = Value;

	fn index(&self, index: usize) -> &Value {
		&self.values[index]
	}
}


/// One executable step: a bound command with its evaluated parameters, or an
/// implicit assignment of a variable cell from a source value.
pub enum Instruction {
	Command {
		command: Arc<dyn Command>,
		parameters: SmallVec<[Value; 4]>,
	},
	Assign {
		target: usize,
		source: Value,
	},
}

impl Instruction {
	fn execute(&self, runtime: &mut Runtime) {
		match self {
			Instruction::Command { command, parameters } => {
				command.invoke(Parameters::new(parameters), runtime);
			}

			// The source is dereferenced before storing so cells never hold
			// variable references.
			Instruction::Assign { target, source } => {
				let value = source.resolved(runtime);
				runtime.set_variable(*target, value);
			}
		}
	}
}

impl std::fmt::Debug for Instruction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Instruction::Command { parameters, .. } => {
				f.debug_struct("Command").field("parameters", parameters).finish_non_exhaustive()
			}
			Instruction::Assign { target, source } => {
				f.debug_struct("Assign").field("target", target).field("source", source).finish()
			}
		}
	}
}

impl PartialEq for Instruction {
	fn eq(&self, other: &Instruction) -> bool {
		match (self, other) {
			(
				Instruction::Command { command: left_command, parameters: left },
				Instruction::Command { command: right_command, parameters: right },
			) => Arc::ptr_eq(left_command, right_command) && left == right,

			(
				Instruction::Assign { target: left_target, source: left },
				Instruction::Assign { target: right_target, source: right },
			) => left_target == right_target && left == right,

			_ => false,
		}
	}
}


/// Per-instance playback state for one compiled script: the variable cell
/// arena, the program counter, and the play/pause/step flags. Driven by the
/// host calling [`Runtime::update`] once per frame.
pub struct Runtime {
	script: Arc<Script>,
	variables: Vec<Value>,

	instruction_index: usize,
	wait_time: f64,

	playing: bool,
	paused: bool,
	repeat: bool,
	step_by_step: bool,
	jumped: bool,
}

impl Runtime {
	pub fn new(script: Arc<Script>) -> Runtime {
		let variables = vec![Value::Null; script.variables().len()];

		Runtime {
			script,
			variables,
			instruction_index: 0,
			wait_time: 0.0,
			playing: false,
			paused: false,
			repeat: false,
			step_by_step: false,
			jumped: false,
		}
	}

	pub fn script(&self) -> &Arc<Script> {
		&self.script
	}

	pub fn is_playing(&self) -> bool {
		self.playing
	}

	pub fn is_paused(&self) -> bool {
		self.paused
	}

	pub fn instruction_index(&self) -> usize {
		self.instruction_index
	}

	pub fn wait_time(&self) -> f64 {
		self.wait_time
	}

	pub fn variable(&self, slot: usize) -> Option<&Value> {
		self.variables.get(slot)
	}

	pub fn variable_by_name(&self, name: &str) -> Option<&Value> {
		let variable = self.script.variable(name)?;
		self.variables.get(variable.index)
	}

	/// Mutates the addressed cell in place. Out-of-range slots are ignored;
	/// compiled scripts never produce them.
	pub fn set_variable(&mut self, slot: usize, value: Value) {
		if let Some(cell) = self.variables.get_mut(slot) {
			*cell = value;
		}
	}

	/// Starts playback from the first instruction. Variable cells keep their
	/// current values; only [`Runtime::reset_runtime`] clears them.
	pub fn play(&mut self, repeat: bool, step_by_step: bool) {
		self.instruction_index = 0;
		self.playing = true;
		self.paused = false;
		self.wait_time = 0.0;
		self.repeat = repeat;
		self.step_by_step = step_by_step;
	}

	/// Starts playback from a named label. Returns false, leaving the state
	/// untouched, when the script has no such label.
	pub fn play_from_label(&mut self, name: &str, repeat: bool, step_by_step: bool) -> bool {
		let Some(label) = self.script.label(name) else {
			return false;
		};

		self.instruction_index = label.instruction_index;
		self.playing = true;
		self.paused = false;
		self.wait_time = 0.0;
		self.repeat = repeat;
		self.step_by_step = step_by_step;

		true
	}

	/// Moves the program counter to an instruction index and resumes, clearing
	/// any pause. Repeat and step flags are left as they are; this is the jump
	/// primitive behind `goto`/`gotoif`.
	pub fn jump_to(&mut self, instruction_index: usize) {
		self.instruction_index = instruction_index;
		self.playing = true;
		self.paused = false;
		self.wait_time = 0.0;
		self.jumped = true;
	}

	/// Suspends execution. A positive wait time counts down across updates;
	/// zero or negative means paused until resumed by a jump or play call.
	pub fn pause(&mut self, wait_time: f64) {
		self.wait_time = wait_time;
		self.paused = true;
	}

	pub fn reset_playback(&mut self) {
		self.playing = false;
		self.paused = false;
		self.wait_time = 0.0;
		self.instruction_index = 0;
	}

	/// Clears every variable cell back to Null.
	pub fn reset_runtime(&mut self) {
		self.variables.fill(Value::Null);
	}

	/// Advances playback by one host tick. A timed pause counts down by
	/// `delta_time * time_scale` and execution resumes within the same call
	/// once it reaches zero. Instructions then execute back to back until one
	/// of the yield points: the script stops, pauses, or runs in step mode.
	/// A script that never yields runs to completion inside this one call.
	pub fn update(&mut self, delta_time: f64, time_scale: f64) {
		if !self.playing {
			return;
		}

		if self.paused {
			if self.wait_time > 0.0 {
				self.wait_time -= delta_time * time_scale;

				if self.wait_time <= 0.0 {
					self.paused = false;
				}
			}

			if self.paused {
				return;
			}
		}

		let script = self.script.clone();
		let instructions = script.instructions();

		let mut completed = false;

		loop {
			if self.instruction_index >= instructions.len() {
				completed = true;
				break;
			}

			self.jumped = false;
			instructions[self.instruction_index].execute(self);

			if !self.playing {
				break;
			}

			// A jump set the counter already, even to the same index;
			// anything else advances by one.
			if !self.jumped {
				self.instruction_index += 1;
			}

			if self.step_by_step || self.paused {
				break;
			}
		}

		if completed {
			self.playing = self.repeat;

			if self.playing {
				self.instruction_index = 0;
			}
		}
	}
}
