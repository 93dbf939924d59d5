use std::convert::Infallible;
use std::ffi::CString;
use std::io;
use std::os::fd::RawFd;

use nix::sys::signal::{self, SigHandler, Signal};
use nix::unistd::{self, ForkResult, Pid};

use crate::error::{ShellError, ShellResult};
use crate::pipes::PipeSet;
use crate::redirect::{self, Streams};
use crate::types::CommandStage;

/// A stage whose argument vector has been converted for exec ahead of fork.
#[derive(Debug)]
pub struct Prepared<'a> {
	pub stage: &'a CommandStage,
	argv: Vec<CString>,
}

impl<'a> Prepared<'a> {
	pub fn new(stage: &'a CommandStage) -> ShellResult<Prepared<'a>> {
		if stage.args.is_empty() {
			return Err(ShellError::parse("empty command"));
		}
		let argv = stage.args.iter()
			.map(|a| CString::new(a.as_bytes()).map_err(|_| ShellError::InvalidArgument(a.clone())))
			.collect::<ShellResult<Vec<CString>>>()?;
		Ok(Prepared { stage: stage, argv: argv })
	}
}

/// Forks one process for `prepared`. The child reads from `stdin_src` and
/// writes to `stdout_dst` when given, otherwise it keeps the parent's streams.
/// Returns the child's pid in the parent; never returns in the child.
pub fn launch(prepared: &Prepared, stdin_src: Option<RawFd>, stdout_dst: Option<RawFd>,
              pipes: &PipeSet) -> ShellResult<Pid> {
	// SAFETY: between fork and exec the child only rewires descriptors, opens
	// redirection targets and reports failures before `_exit`.
	match unsafe { unistd::fork() }.map_err(ShellError::Spawn)? {
		ForkResult::Parent { child } => Ok(child),
		ForkResult::Child => run_child(prepared, stdin_src, stdout_dst, pipes),
	}
}

fn run_child(prepared: &Prepared, stdin_src: Option<RawFd>, stdout_dst: Option<RawFd>,
             pipes: &PipeSet) -> ! {
	let err = match exec_stage(prepared, stdin_src, stdout_dst, pipes) {
		Ok(never) => match never {},
		Err(e) => e,
	};
	let msg = format!("ish: {}\n", err);
	let _ = unistd::write(io::stderr(), msg.as_bytes());
	unsafe { libc::_exit(err.status().code()) }
}

fn exec_stage(prepared: &Prepared, stdin_src: Option<RawFd>, stdout_dst: Option<RawFd>,
              pipes: &PipeSet) -> ShellResult<Infallible> {
	let stdin = stdin_src.unwrap_or(libc::STDIN_FILENO);
	let stdout = stdout_dst.unwrap_or(libc::STDOUT_FILENO);
	Streams::inherited(stdin, stdout).install()?;
	pipes.close_in_child();

	redirect::resolve(prepared.stage, Streams::standard())?.install()?;

	// Rust ignores SIGPIPE at startup; exec'd programs expect the default.
	let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };

	unistd::execvp(&prepared.argv[0], &prepared.argv)
		.map_err(|e| ShellError::Exec { program: prepared.stage.program().to_string(), source: e })
}
