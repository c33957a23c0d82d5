//! A small embeddable scripting language for driving timed, branching sequences
//! of host commands from data.
//!
//! The host registers commands and constants into a [`Compiler`], compiles
//! line-oriented source into an immutable [`Script`], then drives one
//! [`Runtime`] per script instance by calling [`Runtime::update`] every frame.
//! Execution is cooperative: a script yields back to the host at `pause`,
//! `exit`, or after every instruction in step mode, and otherwise runs
//! synchronously within a single update call.

mod lexer;

pub mod compiler;
pub mod runtime;
pub mod stdlib;
pub mod value;

pub use compiler::{CompileError, Compiler, Script};
pub use runtime::{Command, Instruction, Outcome, Parameters, Runtime};
pub use value::{KindMask, Label, StringTemplate, Value, ValueKind, Variable};


/// One source line as seen by the compiler: 1-based number plus trimmed text.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Line {
	pub number: usize,
	pub text: String,
}

impl Line {
	pub fn new(number: usize, text: &str) -> Line {
		Line {
			number,
			text: text.trim().to_owned(),
		}
	}
}

impl std::fmt::Display for Line {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "line {}: {}", self.number, self.text)
	}
}
