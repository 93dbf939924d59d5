use std::io::{self, Write};

use log::debug;

use crate::builtin;
use crate::config::Config;
use crate::eval::Executor;
use crate::history::History;
use crate::lexer::{self, Token};
use crate::parser;
use crate::types::ExitStatus;

pub struct State {
	pub config: Config,
	pub history: History,
	pub executor: Executor<io::Stdout>,
	pub last_status: ExitStatus,
	pub exit_request: Option<ExitStatus>,
}

impl State {
	pub fn new(config: Config) -> State {
		let history = History::new(config.history_capacity);
		let executor = Executor::stdout().notify_background(config.notify_background);
		State {
			config: config,
			history: history,
			executor: executor,
			last_status: ExitStatus::SUCCESS,
			exit_request: None,
		}
	}

	fn report(&mut self, err: &dyn std::error::Error, status: ExitStatus) -> ExitStatus {
		let _ = writeln!(io::stderr(), "ish: {}", err);
		self.last_status = status;
		status
	}

	/// Runs one input line: history recall and recording, `;` lists,
	/// builtins, and everything else through the executor.
	pub fn run_line(&mut self, line: &str) -> ExitStatus {
		let mut line = line.trim().to_string();
		if line.is_empty() {
			return self.last_status;
		}
		match self.history.recall(&line) {
			Ok(Some(recalled)) => {
				println!("{}", recalled);
				line = recalled;
			},
			Ok(None) => {},
			Err(e) => return self.report(&e, e.status()),
		}
		if line != "history" {
			self.history.push(&line);
		}

		let tokens = match lexer::tokenize(&line) {
			Ok(tokens) => tokens,
			Err(e) => return self.report(&e, e.status()),
		};
		for list in parser::split_lists(&tokens) {
			self.last_status = self.run_list(list);
			if self.exit_request.is_some() {
				break;
			}
		}
		self.last_status
	}

	/// Runs the `&&`/`||` segments of one list. Builtins are recognised per
	/// segment so they can be chained like any pipeline.
	fn run_list(&mut self, tokens: &[Token]) -> ExitStatus {
		for segment in parser::split_connectives(tokens) {
			self.last_status = match State::as_builtin(segment.tokens) {
				Some((builtin, args)) => {
					debug!("builtin {:?}", args);
					builtin(self, &args)
				},
				None => self.executor.run_tokens(segment.tokens),
			};
			if self.exit_request.is_some() || !segment.connective.proceeds(self.last_status) {
				break;
			}
		}
		self.last_status
	}

	/// A segment consisting only of words whose first word names a builtin.
	fn as_builtin(tokens: &[Token]) -> Option<(builtin::Builtin, Vec<String>)> {
		let mut args = Vec::with_capacity(tokens.len());
		for token in tokens {
			match *token {
				Token::Word(ref w) => args.push(w.clone()),
				_ => return None,
			}
		}
		let builtin = builtin::match_builtin(args.first()?)?;
		Some((builtin, args))
	}

	/// Prints and forgets background jobs that have finished.
	pub fn report_finished_jobs(&mut self) {
		for finished in self.executor.reap() {
			println!("{}", finished);
		}
	}
}
