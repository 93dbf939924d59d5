use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use nix::unistd;

use crate::error::{ShellError, ShellResult};
use crate::types::{CommandStage, OutputMode};

const CREATE_MODE: u32 = 0o644;

/// Where one standard stream of a stage comes from or goes to.
#[derive(Debug)]
pub enum Endpoint {
	/// A descriptor the stage would otherwise inherit (its own slot or a pipe end).
	Inherited(RawFd),
	/// A file opened for this stage's redirection.
	File(File),
}

impl AsRawFd for Endpoint {
	fn as_raw_fd(&self) -> RawFd {
		match *self {
			Endpoint::Inherited(fd) => fd,
			Endpoint::File(ref file) => file.as_raw_fd(),
		}
	}
}

#[derive(Debug)]
pub struct Streams {
	pub stdin: Endpoint,
	pub stdout: Endpoint,
}

impl Streams {
	pub fn inherited(stdin: RawFd, stdout: RawFd) -> Streams {
		Streams { stdin: Endpoint::Inherited(stdin), stdout: Endpoint::Inherited(stdout) }
	}

	pub fn standard() -> Streams {
		Streams::inherited(libc::STDIN_FILENO, libc::STDOUT_FILENO)
	}

	/// Duplicates each endpoint onto its standard slot. Opened files are closed
	/// when `self` drops; the duplicates stay.
	pub fn install(self) -> ShellResult<()> {
		for (endpoint, slot) in [(&self.stdin, libc::STDIN_FILENO), (&self.stdout, libc::STDOUT_FILENO)] {
			let fd = endpoint.as_raw_fd();
			if fd != slot {
				unistd::dup2(fd, slot).map_err(ShellError::Descriptor)?;
			}
		}
		Ok(())
	}
}

fn open_input(path: &Path) -> io::Result<File> {
	OpenOptions::new().read(true).open(path)
}

fn open_output(path: &Path, mode: OutputMode) -> io::Result<File> {
	let mut oopt = OpenOptions::new();
	oopt.create(true).mode(CREATE_MODE);
	match mode {
		OutputMode::Truncate => oopt.write(true).truncate(true),
		OutputMode::Append => oopt.append(true),
	};
	oopt.open(path)
}

/// Applies the stage's own file redirections on top of `inherited`.
///
/// A file override always wins over whatever was inherited, including pipe
/// ends; streams without an override pass through untouched.
pub fn resolve(stage: &CommandStage, inherited: Streams) -> ShellResult<Streams> {
	let Streams { mut stdin, mut stdout } = inherited;
	if let Some(ref path) = stage.infile {
		let file = open_input(path)
			.map_err(|e| ShellError::Redirection { path: path.clone(), source: e })?;
		stdin = Endpoint::File(file);
	}
	if let Some(ref outfile) = stage.outfile {
		let file = open_output(&outfile.path, outfile.mode)
			.map_err(|e| ShellError::Redirection { path: outfile.path.clone(), source: e })?;
		stdout = Endpoint::File(file);
	}
	Ok(Streams { stdin: stdin, stdout: stdout })
}
