use std::path::PathBuf;
use std::slice;

use crate::error::{ShellError, ShellResult};
use crate::lexer::Token;
use crate::types::*;

/// A connective-delimited slice of tokens that has not been built yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unbuilt<'a> {
	pub tokens: &'a [Token],
	pub connective: Connective,
}

struct Builder<'a> {
	tokens: slice::Iter<'a, Token>,
	remaining: usize,
}

impl<'a> Builder<'a> {
	fn next(&mut self) -> Option<&'a Token> {
		let t = self.tokens.next();
		if t.is_some() {
			self.remaining -= 1;
		}
		t
	}

	fn read_target(&mut self, op: &Token) -> ShellResult<PathBuf> {
		match self.next() {
			Some(&Token::Word(ref target)) if !target.is_empty() => Ok(PathBuf::from(target)),
			_ => Err(ShellError::parse(format!("expected filename after '{}'", op))),
		}
	}

	fn finish_stage(stage: CommandStage) -> ShellResult<CommandStage> {
		if stage.args.is_empty() {
			Err(ShellError::parse("empty command"))
		} else {
			Ok(stage)
		}
	}

	fn build(&mut self) -> ShellResult<Pipeline> {
		let mut stages: Vec<CommandStage> = vec![];
		let mut stage = CommandStage::default();
		let mut is_background = false;

		while let Some(token) = self.next() {
			match *token {
				Token::Word(ref w) => stage.args.push(w.clone()),
				Token::Pipe => {
					let done = std::mem::take(&mut stage);
					stages.push(Builder::finish_stage(done)?);
				},
				Token::Input => {
					stage.infile = Some(self.read_target(token)?);
				},
				Token::Output | Token::Append => {
					let mode = if *token == Token::Append { OutputMode::Append } else { OutputMode::Truncate };
					let path = self.read_target(token)?;
					stage.outfile = Some(OutputFile { path: path, mode: mode });
				},
				Token::Background => {
					if self.remaining != 0 {
						return Err(ShellError::parse("'&' must be the final token"));
					}
					is_background = true;
				},
				Token::And | Token::Or | Token::Semi => {
					return Err(ShellError::parse(format!("unexpected '{}'", token)));
				},
			}
		}
		stages.push(Builder::finish_stage(stage)?);

		Ok(Pipeline { stages: stages, is_background: is_background })
	}
}

/// Builds one pipeline from tokens free of `&&`, `||` and `;`.
pub fn build(tokens: &[Token]) -> ShellResult<Pipeline> {
	let mut builder = Builder { tokens: tokens.iter(), remaining: tokens.len() };
	builder.build()
}

/// Splits a line at `;` into independent command lists. Empty lists are dropped.
pub fn split_lists(tokens: &[Token]) -> Vec<&[Token]> {
	tokens.split(|t| *t == Token::Semi).filter(|l| !l.is_empty()).collect()
}

/// Splits one command list at `&&`/`||`, pairing each piece with the
/// connective that follows it.
pub fn split_connectives(tokens: &[Token]) -> Vec<Unbuilt<'_>> {
	let mut segments = vec![];
	let mut start = 0;
	for (i, token) in tokens.iter().enumerate() {
		let connective = match *token {
			Token::And => Connective::And,
			Token::Or => Connective::Or,
			_ => continue,
		};
		segments.push(Unbuilt { tokens: &tokens[start .. i], connective: connective });
		start = i + 1;
	}
	segments.push(Unbuilt { tokens: &tokens[start ..], connective: Connective::Terminal });
	segments
}

/// Builds every segment of one command list up front.
pub fn parse_segments(tokens: &[Token]) -> ShellResult<Vec<Segment>> {
	split_connectives(tokens).into_iter()
		.map(|u| build(u.tokens).map(|p| Segment { pipeline: p, connective: u.connective }))
		.collect()
}
