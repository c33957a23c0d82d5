use smol_str::SmolStr;

use crate::Line;
use crate::compiler::CompileError;



#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TokenKind {
	Identifier,
	Str,
	Template,
	Int,
	Float,
	Variable,
	Label,
	Whitespace,
	EndOfLine,
}

/// One token within a source line. `text` holds the content with quotes and
/// sigils already stripped; `len` is the number of source bytes consumed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Token {
	pub kind: TokenKind,
	pub text: SmolStr,
	pub line: usize,
	pub offset: usize,
	pub len: usize,
}

impl Token {
	/// How the token reads in an error message.
	pub fn presentation(&self) -> String {
		match self.kind {
			TokenKind::Identifier => format!("identifier '{}'", self.text),
			TokenKind::Str => format!("string '{}'", self.text),
			TokenKind::Template => format!("string template '{}'", self.text),
			TokenKind::Int => format!("integer '{}'", self.text),
			TokenKind::Float => format!("float '{}'", self.text),
			TokenKind::Variable => format!("variable '{}'", self.text),
			TokenKind::Label => format!("label '{}'", self.text),
			TokenKind::Whitespace => "whitespace".to_owned(),
			TokenKind::EndOfLine => "end of line".to_owned(),
		}
	}
}


/// Tokenizes the whole script. Lines are scanned independently except for the
/// block comment flag, which carries across lines so an unclosed `/*`
/// suppresses tokenization until its matching `*/`. Every line contributes an
/// explicit end-of-line token, keeping line boundaries visible to the resolver.
pub fn tokenize(lines: &[Line]) -> Result<Vec<Token>, CompileError> {
	let mut tokens = Vec::new();
	let mut in_block_comment = false;

	for (line_index, line) in lines.iter().enumerate() {
		let text = line.text.as_bytes();
		let mut index = 0;

		while index < text.len() {
			if in_block_comment {
				if text[index..].starts_with(b"*/") {
					in_block_comment = false;
					index += 2;
				} else {
					index += 1;
				}
				continue;
			}

			if text[index..].starts_with(b"/*") {
				in_block_comment = true;
				index += 2;
				continue;
			}

			if text[index..].starts_with(b"//") {
				break;
			}

			let token = scan_token(lines, line_index, index)?;
			index += token.len;
			tokens.push(token);
		}

		tokens.push(Token {
			kind: TokenKind::EndOfLine,
			text: SmolStr::new("\n"),
			line: line_index,
			offset: index,
			len: 0,
		});
	}

	Ok(tokens)
}

// Fixed priority order: the first rule that recognises the leading character
// wins, and anything it then rejects is a compile error rather than a fallthrough.
fn scan_token(lines: &[Line], line: usize, offset: usize) -> Result<Token, CompileError> {
	let scanner = Scanner { lines, line, offset };

	if let Some(token) = scanner.scan_identifier() {
		return Ok(token);
	}
	if let Some(token) = scanner.scan_quoted(b'\'', TokenKind::Str)? {
		return Ok(token);
	}
	if let Some(token) = scanner.scan_quoted(b'"', TokenKind::Template)? {
		return Ok(token);
	}
	if let Some(token) = scanner.scan_number()? {
		return Ok(token);
	}
	if let Some(token) = scanner.scan_sigiled(b'$', TokenKind::Variable, "Expecting variable identifier")? {
		return Ok(token);
	}
	if let Some(token) = scanner.scan_sigiled(b'@', TokenKind::Label, "Expecting label identifier")? {
		return Ok(token);
	}
	if let Some(token) = scanner.scan_whitespace() {
		return Ok(token);
	}

	let character = scanner.text()[offset..].chars().next().unwrap_or('\0');
	Err(scanner.error(format!("Unexpected character '{character}'")))
}


struct Scanner<'s> {
	lines: &'s [Line],
	line: usize,
	offset: usize,
}

impl Scanner<'_> {
	fn text(&self) -> &str {
		&self.lines[self.line].text
	}

	fn rest(&self) -> &[u8] {
		&self.text().as_bytes()[self.offset..]
	}

	fn error(&self, message: String) -> CompileError {
		CompileError {
			message,
			line: self.lines[self.line].clone(),
			offset: self.offset,
		}
	}

	fn token(&self, kind: TokenKind, text: &str, len: usize) -> Token {
		Token {
			kind,
			text: SmolStr::new(text),
			line: self.line,
			offset: self.offset,
			len,
		}
	}

	fn scan_identifier(&self) -> Option<Token> {
		let rest = self.rest();

		let first = *rest.first()?;
		if !first.is_ascii_alphabetic() && first != b'_' {
			return None;
		}

		let end = rest.iter()
			.position(|&c| !c.is_ascii_alphanumeric() && c != b'_')
			.unwrap_or(rest.len());

		Some(self.token(TokenKind::Identifier, std::str::from_utf8(&rest[..end]).ok()?, end))
	}

	fn scan_quoted(&self, quote: u8, kind: TokenKind) -> Result<Option<Token>, CompileError> {
		let rest = self.rest();

		if rest.first() != Some(&quote) {
			return Ok(None);
		}

		let Some(end) = rest[1..].iter().position(|&c| c == quote) else {
			return Err(self.error("Unexpected end of line".to_owned()));
		};

		let content = std::str::from_utf8(&rest[1..1 + end])
			.map_err(|_| self.error("Unexpected end of line".to_owned()))?;

		Ok(Some(self.token(kind, content, end + 2)))
	}

	fn scan_number(&self) -> Result<Option<Token>, CompileError> {
		let rest = self.rest();

		let mut has_digits = false;
		let mut is_float = false;
		let mut is_negative = false;
		let mut end = rest.len();

		for (index, &c) in rest.iter().enumerate() {
			match c {
				c if c.is_ascii_digit() => has_digits = true,

				b'-' if index == 0 => is_negative = true,
				b'-' => return Err(self.error("Unexpected '-'".to_owned())),

				b'.' if !is_float => is_float = true,
				b'.' => return Err(self.error("Unexpected '.'".to_owned())),

				c if c.is_ascii_whitespace() => {
					end = index;
					break;
				}

				c if has_digits || is_float || is_negative => {
					return Err(self.error(format!("Unexpected '{}'", c as char)));
				}

				_ => return Ok(None),
			}
		}

		if has_digits {
			let kind = if is_float { TokenKind::Float } else { TokenKind::Int };
			let text = std::str::from_utf8(&rest[..end]).unwrap_or_default();
			Ok(Some(self.token(kind, text, end)))
		} else if is_float || is_negative {
			Err(self.error("Expecting number".to_owned()))
		} else {
			Ok(None)
		}
	}

	fn scan_sigiled(&self, sigil: u8, kind: TokenKind, empty_message: &str) -> Result<Option<Token>, CompileError> {
		let rest = self.rest();

		if rest.first() != Some(&sigil) {
			return Ok(None);
		}

		let end = rest[1..].iter()
			.position(|&c| !c.is_ascii_alphanumeric())
			.map_or(rest.len(), |p| p + 1);

		if end == 1 {
			return Err(self.error(empty_message.to_owned()));
		}

		let name = std::str::from_utf8(&rest[1..end]).unwrap_or_default();
		Ok(Some(self.token(kind, name, end)))
	}

	fn scan_whitespace(&self) -> Option<Token> {
		let rest = self.rest();

		if !rest.first()?.is_ascii_whitespace() {
			return None;
		}

		let end = rest.iter()
			.position(|&c| !c.is_ascii_whitespace())
			.unwrap_or(rest.len());

		Some(self.token(TokenKind::Whitespace, " ", end))
	}
}
