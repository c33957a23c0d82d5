use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::lexer::{self, Token, TokenKind};
use crate::runtime::{Command, Instruction};
use crate::value::{Label, StringTemplate, Value, Variable};
use crate::Line;



/// A structured compile failure: what went wrong, on which line, at which
/// byte offset within that line. Compilation is fail-fast; the first error
/// wins and no partial script is ever produced.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CompileError {
	pub message: String,
	pub line: Line,
	pub offset: usize,
}

impl std::fmt::Display for CompileError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} (line {}, offset {})", self.message, self.line.number, self.offset)
	}
}

impl std::error::Error for CompileError {}


/// An immutable compiled script: the instruction array indexed by the
/// runtime's program counter, plus the variable and label tables. Cheap to
/// share between many [`crate::Runtime`] instances via `Arc`.
#[derive(Debug)]
pub struct Script {
	instructions: Vec<Instruction>,
	variables: Vec<Variable>,
	labels: Vec<Label>,
}

impl Script {
	pub fn instructions(&self) -> &[Instruction] {
		&self.instructions
	}

	pub fn variables(&self) -> &[Variable] {
		&self.variables
	}

	pub fn labels(&self) -> &[Label] {
		&self.labels
	}

	pub fn variable(&self, name: &str) -> Option<&Variable> {
		self.variables.iter().find(|variable| variable.name == name)
	}

	pub fn label(&self, name: &str) -> Option<&Label> {
		self.labels.iter().find(|label| label.name == name)
	}
}


/// Holds the command and constant registries and turns source lines into a
/// [`Script`]. Registration happens before compilation; one compiler can
/// compile any number of scripts against the same registries.
#[derive(Default)]
pub struct Compiler {
	commands: HashMap<SmolStr, Arc<dyn Command>>,
	constants: HashMap<SmolStr, Value>,
}

impl Compiler {
	pub fn new() -> Compiler {
		Compiler::default()
	}

	pub fn add_command(&mut self, name: &str, command: impl Command + 'static) -> anyhow::Result<()> {
		anyhow::ensure!(!self.commands.contains_key(name), "Command '{name}' already registered");
		self.commands.insert(SmolStr::new(name), Arc::new(command));
		Ok(())
	}

	pub fn add_constant(&mut self, name: &str, value: Value) -> anyhow::Result<()> {
		anyhow::ensure!(!self.constants.contains_key(name), "Constant '{name}' already registered");
		self.constants.insert(SmolStr::new(name), value);
		Ok(())
	}

	pub fn compile<I, S>(&self, lines: I) -> Result<Script, CompileError>
		where I: IntoIterator<Item = S>, S: AsRef<str>
	{
		let lines: Vec<Line> = lines.into_iter()
			.enumerate()
			.map(|(index, text)| Line::new(index + 1, text.as_ref()))
			.collect();

		let tokens = lexer::tokenize(&lines)?;

		let mut resolver = Resolver {
			compiler: self,
			lines: &lines,
			variables: Vec::new(),
			labels: Vec::new(),
			pending: Vec::new(),
		};

		resolver.resolve(&tokens)?;
		resolver.build()
	}
}


// An instruction candidate from the first resolution pass. Parameter values
// that referenced a not-yet-declared label stay None and are patched during
// the build pass, once the full label table is known.
enum Pending {
	Command {
		command: Arc<dyn Command>,
		tokens: Vec<Token>,
		values: Vec<Option<Value>>,
	},
	Assign {
		target: usize,
		token: Token,
		value: Option<Value>,
	},
}

struct Resolver<'c> {
	compiler: &'c Compiler,
	lines: &'c [Line],
	variables: Vec<Variable>,
	labels: Vec<Label>,
	pending: Vec<Pending>,
}

impl Resolver<'_> {
	fn error(&self, message: String, token: &Token) -> CompileError {
		CompileError {
			message,
			line: self.lines[token.line].clone(),
			offset: token.offset,
		}
	}

	fn unexpected(&self, token: &Token) -> CompileError {
		self.error(format!("Unexpected {}", token.presentation()), token)
	}

	fn resolve(&mut self, tokens: &[Token]) -> Result<(), CompileError> {
		let mut line_tokens = Vec::new();

		for token in tokens {
			if token.kind != TokenKind::EndOfLine {
				line_tokens.push(token);
				continue;
			}

			let items = self.separate(line_tokens.drain(..))?;
			self.classify(&items)?;
		}

		Ok(())
	}

	// Drops whitespace tokens while demanding that adjacent non-whitespace
	// tokens have exactly one whitespace run between them.
	fn separate<'t>(&self, tokens: impl Iterator<Item = &'t Token>) -> Result<Vec<&'t Token>, CompileError> {
		let mut items = Vec::new();
		let mut expecting_whitespace = false;

		for token in tokens {
			if expecting_whitespace {
				if token.kind != TokenKind::Whitespace {
					return Err(self.unexpected(token));
				}
				expecting_whitespace = false;
			} else if token.kind != TokenKind::Whitespace {
				items.push(token);
				expecting_whitespace = true;
			}
		}

		Ok(items)
	}

	fn classify(&mut self, items: &[&Token]) -> Result<(), CompileError> {
		let Some(&first) = items.first() else {
			return Ok(());
		};

		match first.kind {
			TokenKind::Identifier => {
				let Some(command) = self.compiler.commands.get(first.text.as_str()) else {
					return Err(self.error(format!("Command '{}' not found", first.text), first));
				};
				let command = command.clone();

				let mut tokens = Vec::with_capacity(items.len() - 1);
				let mut values = Vec::with_capacity(items.len() - 1);

				for &token in &items[1..] {
					values.push(self.resolve_value(token)?);
					tokens.push(token.clone());
				}

				self.pending.push(Pending::Command { command, tokens, values });
			}

			TokenKind::Label => {
				if let Some(&next) = items.get(1) {
					return Err(self.unexpected(next));
				}

				self.labels.push(Label {
					name: first.text.clone(),
					instruction_index: self.pending.len(),
				});
			}

			TokenKind::Variable => match items.len() {
				2 => {
					let target = self.intern_variable(&first.text);
					let value = self.resolve_value(items[1])?;

					self.pending.push(Pending::Assign {
						target,
						token: items[1].clone(),
						value,
					});
				}

				// A bare variable line is an incomplete assignment and
				// produces no instruction. The variable is still interned.
				1 => {
					self.intern_variable(&first.text);
				}

				_ => return Err(self.unexpected(items[2])),
			},

			// Lines led by any other token produce no instruction.
			_ => {}
		}

		Ok(())
	}

	/// First-pass value resolution. Returns None only for a label reference
	/// that has not been declared yet; everything else resolves or errors.
	fn resolve_value(&mut self, token: &Token) -> Result<Option<Value>, CompileError> {
		let value = match token.kind {
			TokenKind::Int => match token.text.parse() {
				Ok(value) => Value::Int(value),
				Err(_) => return Err(self.error("Expecting number".to_owned(), token)),
			},

			TokenKind::Float => match token.text.parse() {
				Ok(value) => Value::Float(value),
				Err(_) => return Err(self.error("Expecting number".to_owned(), token)),
			},

			TokenKind::Str => Value::String(token.text.to_string()),

			TokenKind::Template => self.compile_template(&token.text),

			TokenKind::Identifier => match self.compiler.constants.get(token.text.as_str()) {
				Some(value) => value.clone(),
				None => return Err(self.error(format!("Unknown constant '{}'", token.text), token)),
			},

			TokenKind::Variable => Value::Variable(self.intern_variable(&token.text)),

			TokenKind::Label => match self.labels.iter().find(|label| label.name == token.text) {
				Some(label) => Value::Label(label.instruction_index),
				None => return Ok(None),
			},

			TokenKind::Whitespace | TokenKind::EndOfLine => unreachable!(),
		};

		Ok(Some(value))
	}

	/// Build-pass resolution of a deferred label reference, now demanding
	/// that the label exists.
	fn require_label(&self, token: &Token) -> Result<Value, CompileError> {
		match self.labels.iter().find(|label| label.name == token.text) {
			Some(label) => Ok(Value::Label(label.instruction_index)),
			None => Err(self.error(format!("Unknown label '{}'", token.text), token)),
		}
	}

	fn intern_variable(&mut self, name: &str) -> usize {
		if let Some(variable) = self.variables.iter().find(|variable| variable.name == name) {
			return variable.index;
		}

		let index = self.variables.len();
		self.variables.push(Variable {
			name: SmolStr::new(name),
			index,
		});

		index
	}

	// Scans a double-quoted literal for $name interpolations, sharing the
	// script-wide variable table and de-duplicating the template's own list.
	fn compile_template(&mut self, text: &str) -> Value {
		let mut template_variables: Vec<Variable> = Vec::new();

		let bytes = text.as_bytes();
		let mut index = 0;

		while index < bytes.len() {
			if bytes[index] != b'$' {
				index += 1;
				continue;
			}

			let end = bytes[index + 1..].iter()
				.position(|&c| !c.is_ascii_alphanumeric())
				.map_or(bytes.len(), |p| index + 1 + p);

			if end == index + 1 {
				index += 1;
				continue;
			}

			let name = &text[index + 1..end];
			let slot = self.intern_variable(name);

			if !template_variables.iter().any(|variable| variable.index == slot) {
				template_variables.push(Variable {
					name: SmolStr::new(name),
					index: slot,
				});
			}

			index = end;
		}

		Value::Template(Arc::new(StringTemplate::new(text.to_owned(), template_variables)))
	}

	fn build(mut self) -> Result<Script, CompileError> {
		let mut instructions = Vec::with_capacity(self.pending.len());

		for pending in std::mem::take(&mut self.pending) {
			match pending {
				Pending::Command { command, tokens, values } => {
					let mut parameters = SmallVec::new();

					for (token, value) in tokens.iter().zip(values) {
						let value = match value {
							Some(value) => value,
							None => self.require_label(token)?,
						};

						parameters.push(value);
					}

					instructions.push(Instruction::Command { command, parameters });
				}

				Pending::Assign { target, token, value } => {
					let source = match value {
						Some(value) => value,
						None => self.require_label(&token)?,
					};

					instructions.push(Instruction::Assign { target, source });
				}
			}
		}

		Ok(Script {
			instructions,
			variables: self.variables,
			labels: self.labels,
		})
	}
}
