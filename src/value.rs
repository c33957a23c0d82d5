use std::any::Any;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::runtime::Runtime;



/// A named variable slot. Indices are assigned in first-seen order across the
/// whole script and address cells in the runtime's storage directly.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Variable {
	pub name: SmolStr,
	pub index: usize,
}

/// A named jump target. The instruction index is the index of the instruction
/// emitted immediately after the label line.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Label {
	pub name: SmolStr,
	pub instruction_index: usize,
}


/// A dynamically tagged cell: the unit of parameter passing and variable
/// storage. Literal values are built by the compiler and never change;
/// the runtime's variable cells are the only mutable values.
#[derive(Clone, Default)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	Template(Arc<StringTemplate>),
	Object(Arc<dyn Any>),
	Variable(usize),
	Label(usize),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ValueKind {
	Null,
	Bool,
	Int,
	Float,
	String,
	Template,
	Object,
	Variable,
	Label,
}

impl ValueKind {
	pub const fn mask(self) -> KindMask {
		KindMask(1 << self as u16)
	}
}

/// A set of accepted [`ValueKind`]s for positional parameter validation.
/// The empty mask accepts any kind.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KindMask(pub u16);

impl KindMask {
	pub const ANY: KindMask = KindMask(0);

	pub fn accepts(self, kind: ValueKind) -> bool {
		self.0 == 0 || self.0 & kind.mask().0 != 0
	}
}

impl std::ops::BitOr for KindMask {
	type Output = KindMask;

	fn bitor(self, other: KindMask) -> KindMask {
		KindMask(self.0 | other.0)
	}
}


impl Value {
	pub fn kind(&self) -> ValueKind {
		match self {
			Value::Null => ValueKind::Null,
			Value::Bool(_) => ValueKind::Bool,
			Value::Int(_) => ValueKind::Int,
			Value::Float(_) => ValueKind::Float,
			Value::String(_) => ValueKind::String,
			Value::Template(_) => ValueKind::Template,
			Value::Object(_) => ValueKind::Object,
			Value::Variable(_) => ValueKind::Variable,
			Value::Label(_) => ValueKind::Label,
		}
	}

	/// Reads through a variable reference to the current cell value.
	/// Cells never hold variable references themselves (assignment stores the
	/// dereferenced value), so a single step is complete. A dangling slot
	/// yields Null.
	pub fn resolved(&self, runtime: &Runtime) -> Value {
		match self {
			Value::Variable(slot) => runtime.variable(*slot).cloned().unwrap_or(Value::Null),
			value => value.clone(),
		}
	}

	pub fn try_bool(&self, runtime: &Runtime) -> bool {
		match self.resolved(runtime) {
			Value::Null => false,
			Value::Bool(value) => value,
			Value::Int(value) => value != 0,
			Value::Float(value) => value != 0.0,
			Value::String(value) => !value.is_empty(),
			Value::Template(template) => !template.evaluate(runtime).is_empty(),
			Value::Object(_) | Value::Label(_) => true,
			Value::Variable(_) => false,
		}
	}

	pub fn try_int(&self, runtime: &Runtime, default: i64) -> i64 {
		match self.resolved(runtime) {
			Value::Int(value) => value,
			Value::Float(value) => value as i64,
			Value::String(value) => value.trim().parse().unwrap_or(default),
			Value::Template(template) => template.evaluate(runtime).trim().parse().unwrap_or(default),
			_ => default,
		}
	}

	pub fn try_float(&self, runtime: &Runtime, default: f64) -> f64 {
		match self.resolved(runtime) {
			Value::Float(value) => value,
			Value::Int(value) => value as f64,
			Value::String(value) => value.trim().parse().unwrap_or(default),
			Value::Template(template) => template.evaluate(runtime).trim().parse().unwrap_or(default),
			_ => default,
		}
	}

	/// Templates are evaluated against the runtime state at the moment of the
	/// call and never cached.
	pub fn try_string(&self, runtime: &Runtime, default: &str) -> String {
		match self.resolved(runtime) {
			Value::Bool(value) => value.to_string(),
			Value::Int(value) => value.to_string(),
			Value::Float(value) => value.to_string(),
			Value::String(value) => value,
			Value::Template(template) => template.evaluate(runtime),
			_ => default.to_owned(),
		}
	}

	pub fn try_label(&self, runtime: &Runtime) -> Option<usize> {
		match self.resolved(runtime) {
			Value::Label(index) => Some(index),
			_ => None,
		}
	}

	pub fn try_template(&self, runtime: &Runtime) -> Option<Arc<StringTemplate>> {
		match self.resolved(runtime) {
			Value::Template(template) => Some(template),
			_ => None,
		}
	}

	pub fn try_object(&self, runtime: &Runtime) -> Option<Arc<dyn Any>> {
		match self.resolved(runtime) {
			Value::Object(object) => Some(object),
			_ => None,
		}
	}

	/// The slot a variable reference names. Does not read through to the cell.
	pub fn variable_slot(&self) -> Option<usize> {
		match self {
			Value::Variable(slot) => Some(*slot),
			_ => None,
		}
	}

	/// Equality within compatible families only: numeric values compare
	/// numerically, strings and templates compare as evaluated text, objects
	/// by identity. Any other pairing is unequal.
	pub fn is_equal(left: &Value, right: &Value, runtime: &Runtime) -> bool {
		use Value::*;

		match (left.resolved(runtime), right.resolved(runtime)) {
			(Null, Null) => true,
			(Bool(left), Bool(right)) => left == right,

			(Int(left), Int(right)) => left == right,
			(Int(left), Float(right)) => left as f64 == right,
			(Float(left), Int(right)) => left == right as f64,
			(Float(left), Float(right)) => left == right,

			(left @ (String(_) | Template(_)), right @ (String(_) | Template(_))) => {
				left.try_string(runtime, "") == right.try_string(runtime, "")
			}

			(Label(left), Label(right)) => left == right,
			(Object(left), Object(right)) => Arc::ptr_eq(&left, &right),

			_ => false,
		}
	}
}

impl std::fmt::Debug for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Null => write!(f, "Null"),
			Value::Bool(value) => write!(f, "Bool({value})"),
			Value::Int(value) => write!(f, "Int({value})"),
			Value::Float(value) => write!(f, "Float({value})"),
			Value::String(value) => write!(f, "String({value:?})"),
			Value::Template(template) => write!(f, "Template({:?})", template.text()),
			Value::Object(_) => write!(f, "Object(..)"),
			Value::Variable(slot) => write!(f, "Variable({slot})"),
			Value::Label(index) => write!(f, "Label({index})"),
		}
	}
}

// Structural equality so compiled scripts can be compared in tests. Distinct
// from is_equal, which implements the language's coercing comparison.
impl PartialEq for Value {
	fn eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(left), Value::Bool(right)) => left == right,
			(Value::Int(left), Value::Int(right)) => left == right,
			(Value::Float(left), Value::Float(right)) => left == right,
			(Value::String(left), Value::String(right)) => left == right,
			(Value::Template(left), Value::Template(right)) => left == right,
			(Value::Object(left), Value::Object(right)) => Arc::ptr_eq(left, right),
			(Value::Variable(left), Value::Variable(right)) => left == right,
			(Value::Label(left), Value::Label(right)) => left == right,
			_ => false,
		}
	}
}


/// A precompiled interpolated string: raw text plus the variables referenced
/// by `$name` occurrences, de-duplicated in first-seen order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StringTemplate {
	text: String,
	variables: Vec<Variable>,
}

impl StringTemplate {
	pub fn new(text: String, variables: Vec<Variable>) -> StringTemplate {
		StringTemplate { text, variables }
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn variables(&self) -> &[Variable] {
		&self.variables
	}

	/// Substitutes every `$name` with the current stringified scalar value of
	/// the named cell. Non-scalar cells substitute the empty string.
	pub fn evaluate(&self, runtime: &Runtime) -> String {
		let mut result = self.text.clone();

		for variable in &self.variables {
			let substitution = match runtime.variable(variable.index) {
				Some(Value::Bool(value)) => value.to_string(),
				Some(Value::Int(value)) => value.to_string(),
				Some(Value::Float(value)) => value.to_string(),
				Some(Value::String(value)) => value.clone(),
				_ => String::new(),
			};

			result = result.replace(&format!("${}", variable.name), &substitution);
		}

		result
	}
}
