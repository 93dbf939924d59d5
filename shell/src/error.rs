use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use crate::types::ExitStatus;

pub type ShellResult<T> = Result<T, ShellError>;

#[derive(Debug, Error)]
pub enum ShellError {
	#[error("parse error: {0}")]
	Parse(String),

	#[error("pipe: {0}")]
	PipeCreation(#[source] Errno),

	#[error("fork: {0}")]
	Spawn(#[source] Errno),

	#[error("{}: {source}", .path.display())]
	Redirection {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("{program}: {}", exec_reason(.source))]
	Exec {
		program: String,
		#[source]
		source: Errno,
	},

	#[error("dup2: {0}")]
	Descriptor(#[source] Errno),

	#[error("argument contains a NUL byte: {0:?}")]
	InvalidArgument(String),

	#[error("No such command in history.")]
	HistoryIndex(String),

	#[error("config: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] io::Error),
}

fn exec_reason(errno: &Errno) -> String {
	match *errno {
		Errno::ENOENT => "command not found".to_string(),
		e => e.desc().to_string(),
	}
}

impl ShellError {
	pub fn parse<S: Into<String>>(msg: S) -> ShellError {
		ShellError::Parse(msg.into())
	}

	/// The status a failing pipeline (or child) reports for this error.
	pub fn status(&self) -> ExitStatus {
		match *self {
			ShellError::Parse(_) => ExitStatus::SYNTAX,
			ShellError::Exec { source: Errno::ENOENT, .. } => ExitStatus::NOT_FOUND,
			ShellError::Exec { .. } => ExitStatus::NOT_EXECUTABLE,
			_ => ExitStatus::FAILURE,
		}
	}
}
