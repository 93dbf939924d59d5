use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::global;
use crate::types::ExitStatus;

pub type Builtin = fn(&mut global::State, &[String]) -> ExitStatus;

pub fn builtin_cd(_: &mut global::State, args: &[String]) -> ExitStatus {
	let target = match args.get(1) {
		Some(dir) => PathBuf::from(dir),
		None => match env::var_os("HOME") {
			Some(home) => PathBuf::from(home),
			None => {
				let _ = writeln!(io::stderr(), "cd: HOME not set");
				return ExitStatus::FAILURE;
			},
		},
	};
	match env::set_current_dir(&target) {
		Ok(()) => ExitStatus::SUCCESS,
		Err(e) => {
			let _ = writeln!(io::stderr(), "cd: {}: {}", target.display(), e);
			ExitStatus::FAILURE
		},
	}
}

pub fn builtin_history(state: &mut global::State, _: &[String]) -> ExitStatus {
	let stdout = io::stdout();
	let mut out = stdout.lock();
	for (i, line) in state.history.iter() {
		let _ = writeln!(out, "{} {}", i, line);
	}
	ExitStatus::SUCCESS
}

pub fn builtin_exit(state: &mut global::State, args: &[String]) -> ExitStatus {
	let status = match args.get(1) {
		None => state.last_status,
		Some(code) => match code.parse::<i32>() {
			Ok(n) => ExitStatus::new(n),
			Err(_) => {
				let _ = writeln!(io::stderr(), "exit: {}: numeric argument required", code);
				ExitStatus::SYNTAX
			},
		},
	};
	state.exit_request = Some(status);
	status
}

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"cd" => Some(builtin_cd),
		"history" => Some(builtin_history),
		"exit" => Some(builtin_exit),
		_ => None,
	}
}
