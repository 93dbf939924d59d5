use std::fmt;

use crate::error::{ShellError, ShellResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	Word(String),
	Pipe,
	Input,
	Output,
	Append,
	Background,
	And,
	Or,
	Semi,
}

impl Token {
	pub fn word<S: Into<String>>(s: S) -> Token {
		Token::Word(s.into())
	}

	pub fn as_str(&self) -> &str {
		match *self {
			Token::Word(ref w) => w.as_str(),
			Token::Pipe => "|",
			Token::Input => "<",
			Token::Output => ">",
			Token::Append => ">>",
			Token::Background => "&",
			Token::And => "&&",
			Token::Or => "||",
			Token::Semi => ";",
		}
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

struct Lexer<'a> {
	line: &'a [u8],
	i: usize,
}

impl<'a> Lexer<'a> {
	fn peek(&self) -> Option<u8> {
		self.line.get(self.i).cloned()
	}

	fn peek_next(&self) -> Option<u8> {
		self.line.get(self.i + 1).cloned()
	}

	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(c) = self.peek() {
			if !f(c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		matches!(c, b' ' | b'\t' | b'\r' | b'\n')
	}

	fn is_operator(c: u8) -> bool {
		matches!(c, b'>' | b'<' | b'&' | b'|' | b';')
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Lexer::is_whitespace);
	}

	fn read_operator(&mut self) -> Token {
		let c = self.line[self.i];
		let doubled = self.peek_next() == Some(c);
		self.i += if doubled && c != b'<' && c != b';' { 2 } else { 1 };
		match (c, doubled) {
			(b'|', true) => Token::Or,
			(b'|', false) => Token::Pipe,
			(b'&', true) => Token::And,
			(b'&', false) => Token::Background,
			(b'>', true) => Token::Append,
			(b'>', false) => Token::Output,
			(b'<', _) => Token::Input,
			_ => Token::Semi,
		}
	}

	fn read_quoted(&mut self, quote: u8, buf: &mut Vec<u8>) -> ShellResult<()> {
		self.i += 1;
		loop {
			match self.peek() {
				None => return Err(ShellError::parse(format!("unterminated {} quote", quote as char))),
				Some(c) if c == quote => {
					self.i += 1;
					return Ok(());
				},
				Some(b'\\') if quote == b'"' && matches!(self.peek_next(), Some(b'"') | Some(b'\\')) => {
					buf.push(self.line[self.i + 1]);
					self.i += 2;
				},
				Some(c) => {
					buf.push(c);
					self.i += 1;
				},
			}
		}
	}

	fn read_word(&mut self) -> ShellResult<String> {
		let mut buf: Vec<u8> = vec![];
		while let Some(c) = self.peek() {
			if Lexer::is_whitespace(c) || Lexer::is_operator(c) { break; }
			match c {
				b'\'' | b'"' => self.read_quoted(c, &mut buf)?,
				b'\\' => {
					match self.peek_next() {
						Some(escaped) => buf.push(escaped),
						None => return Err(ShellError::parse("trailing backslash")),
					}
					self.i += 2;
				},
				_ => {
					buf.push(c);
					self.i += 1;
				},
			}
		}
		Ok(String::from_utf8_lossy(&buf).into_owned())
	}

	fn tokenize(&mut self) -> ShellResult<Vec<Token>> {
		let mut tokens = vec![];
		loop {
			self.skip_whitespaces();
			match self.peek() {
				None => break,
				Some(b'#') => break,
				Some(c) if Lexer::is_operator(c) => tokens.push(self.read_operator()),
				Some(_) => tokens.push(Token::Word(self.read_word()?)),
			}
		}
		Ok(tokens)
	}
}

/// Splits a raw input line into words and structural tokens.
pub fn tokenize(line: &str) -> ShellResult<Vec<Token>> {
	let mut lexer = Lexer { line: line.as_bytes(), i: 0 };
	lexer.tokenize()
}
