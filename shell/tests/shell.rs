use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

struct ShellHandler {
	home: tempfile::TempDir,
}

impl ShellHandler {
	fn new() -> ShellHandler {
		ShellHandler { home: tempfile::tempdir().unwrap() }
	}

	fn command(&self) -> Command {
		let mut cmd = Command::new(env!("CARGO_BIN_EXE_ish"));
		cmd.env("HOME", self.home.path())
			.env("ISH_CONFIG", self.home.path().join("no-config.toml"))
			.env_remove("RUST_LOG");
		cmd
	}

	fn script(&self, input: &str) -> Output {
		let mut child = self.command()
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.unwrap();
		child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
		child.wait_with_output().unwrap()
	}

	fn line(&self, line: &str) -> Output {
		self.command().arg("-c").arg(line).output().unwrap()
	}

	fn path(&self) -> &Path {
		self.home.path()
	}
}

fn stdout(output: &Output) -> String {
	String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn pipes_through_cat() {
	let sh = ShellHandler::new();
	let out = sh.script("echo hello | cat\n");
	assert_eq!(stdout(&out), "hello\n");
	assert!(out.status.success());
}

#[test]
fn last_stage_is_exit_status() {
	let sh = ShellHandler::new();
	assert_eq!(sh.line("true | false").status.code(), Some(1));
	assert_eq!(sh.line("false | true").status.code(), Some(0));
	assert_eq!(sh.line("exit 3").status.code(), Some(3));
	assert_eq!(sh.line("ish-no-such-program").status.code(), Some(127));
}

#[test]
fn connectives_and_lists() {
	let sh = ShellHandler::new();
	let out = sh.script("false && echo no\ntrue && echo yes; false || echo fallback\n");
	assert_eq!(stdout(&out), "yes\nfallback\n");
}

#[test]
fn parse_error_keeps_shell_running() {
	let sh = ShellHandler::new();
	let out = sh.script("echo >\necho still here\n");
	assert_eq!(stdout(&out), "still here\n");
	assert!(String::from_utf8_lossy(&out.stderr).contains("expected filename after '>'"));
}

#[test]
fn errors_are_printed_once() {
	let sh = ShellHandler::new();
	let out = sh.line("echo >");
	let stderr = String::from_utf8_lossy(&out.stderr);
	assert_eq!(stderr.matches("expected filename after '>'").count(), 1, "{}", stderr);
	assert_eq!(out.status.code(), Some(2));
}

#[test]
fn pipe_exhaustion_starts_no_stage() {
	let sh = ShellHandler::new();
	// Three pipes need six descriptors on top of the standard three.
	let out = Command::new("sh")
		.arg("-c")
		.arg(format!("ulimit -n 6 && exec {} -c 'touch started | cat | cat | cat'", env!("CARGO_BIN_EXE_ish")))
		.current_dir(sh.path())
		.env("HOME", sh.path())
		.env("ISH_CONFIG", sh.path().join("no-config.toml"))
		.env_remove("RUST_LOG")
		.output()
		.unwrap();
	let stderr = String::from_utf8_lossy(&out.stderr);
	assert_eq!(out.status.code(), Some(1), "{}", stderr);
	assert_eq!(stderr.matches("ish: pipe:").count(), 1, "{}", stderr);
	assert!(!sh.path().join("started").exists());
}

#[test]
fn builtins_chain_with_connectives() {
	let sh = ShellHandler::new();
	let dir = sh.path().canonicalize().unwrap();
	let out = sh.line(&format!("cd {} && pwd", dir.display()));
	assert_eq!(stdout(&out), format!("{}\n", dir.display()));

	assert_eq!(sh.line("true && exit 3").status.code(), Some(3));
	assert_eq!(sh.line("false && exit 3").status.code(), Some(1));
}

#[test]
fn history_and_recall() {
	let sh = ShellHandler::new();
	let out = sh.script("echo a\necho b\nhistory\n!1\n");
	assert_eq!(stdout(&out), "a\nb\n1 echo a\n2 echo b\necho a\na\n");
}

#[test]
fn cd_changes_directory_for_later_commands() {
	let sh = ShellHandler::new();
	let dir = sh.path().canonicalize().unwrap();
	let out = sh.script(&format!("cd {}\npwd\ncd\npwd\n", dir.display()));
	let expected = format!("{}\n{}\n", dir.display(), dir.display());
	assert_eq!(stdout(&out), expected);
}

#[test]
fn background_launch_is_announced() {
	let sh = ShellHandler::new();
	let out = sh.script("sleep 0 &\n");
	assert!(stdout(&out).starts_with("Process running in background with PID "), "{}", stdout(&out));
	assert!(out.status.success());
}

#[test]
fn config_file_is_honoured() {
	let sh = ShellHandler::new();
	let config = sh.path().join("config.toml");
	std::fs::write(&config, "notify_background = false\n").unwrap();
	let out = sh.command()
		.env("ISH_CONFIG", &config)
		.arg("-c").arg("sleep 0 &")
		.output()
		.unwrap();
	assert_eq!(stdout(&out), "");
}
