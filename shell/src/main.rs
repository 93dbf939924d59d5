use std::env;
use std::io;
use std::io::{BufRead, IsTerminal, Write};
use std::process;

use ish::config::Config;
use ish::global;

fn init_logging(config: &Config) {
	let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
	let _ = env_logger::Builder::from_env(env).try_init();
}

fn run_interactive(state: &mut global::State) {
	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let prompt = stdin.is_terminal();
	let mut stdin_locked = stdin.lock();
	loop {
		state.report_finished_jobs();
		if prompt {
			let _ = stdout.write_all(state.config.prompt.as_bytes());
			let _ = stdout.flush();
		}
		let mut line: Vec<u8> = vec![];
		match stdin_locked.read_until(b'\n', &mut line) {
			Ok(0) => break,
			Ok(_) => {},
			Err(e) => {
				let _ = writeln!(io::stderr(), "ish: {}", e);
				break;
			},
		}
		state.run_line(&String::from_utf8_lossy(&line));
		if state.exit_request.is_some() {
			break;
		}
	}
	state.report_finished_jobs();
}

fn main() {
	let config = Config::load();
	init_logging(&config);
	let mut state = global::State::new(config);

	let args: Vec<String> = env::args().skip(1).collect();
	match args.first().map(String::as_str) {
		Some("-c") => match args.get(1) {
			Some(line) => { state.run_line(line); },
			None => {
				let _ = writeln!(io::stderr(), "ish: -c: option requires an argument");
				process::exit(2);
			},
		},
		Some(other) => {
			let _ = writeln!(io::stderr(), "usage: ish [-c command] (got {:?})", other);
			process::exit(2);
		},
		None => run_interactive(&mut state),
	}

	let status = state.exit_request.unwrap_or(state.last_status);
	process::exit(status.code())
}
