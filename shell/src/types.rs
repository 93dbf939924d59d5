use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode { Truncate, Append }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
	pub path: PathBuf,
	pub mode: OutputMode,
}

/// One program invocation. `args[0]` is the program name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandStage {
	pub args: Vec<String>,
	pub infile: Option<PathBuf>,
	pub outfile: Option<OutputFile>,
}

impl CommandStage {
	pub fn new<I, S>(args: I) -> CommandStage where I: IntoIterator<Item = S>, S: Into<String> {
		CommandStage { args: args.into_iter().map(Into::into).collect(), infile: None, outfile: None }
	}

	pub fn with_infile<P: Into<PathBuf>>(mut self, path: P) -> CommandStage {
		self.infile = Some(path.into());
		self
	}

	pub fn with_outfile<P: Into<PathBuf>>(mut self, path: P, mode: OutputMode) -> CommandStage {
		self.outfile = Some(OutputFile { path: path.into(), mode: mode });
		self
	}

	pub fn program(&self) -> &str {
		self.args.first().map_or("", String::as_str)
	}
}

impl fmt::Display for CommandStage {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.args.join(" "))?;
		if let Some(ref infile) = self.infile {
			write!(f, " < {}", infile.display())?;
		}
		if let Some(ref outfile) = self.outfile {
			let op = match outfile.mode {
				OutputMode::Truncate => ">",
				OutputMode::Append => ">>",
			};
			write!(f, " {} {}", op, outfile.path.display())?;
		}
		Ok(())
	}
}

/// Stages in data-flow order: stage i's stdout feeds stage i+1's stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
	pub stages: Vec<CommandStage>,
	pub is_background: bool,
}

impl Pipeline {
	pub fn new(stages: Vec<CommandStage>) -> Pipeline {
		Pipeline { stages: stages, is_background: false }
	}

	pub fn background(mut self) -> Pipeline {
		self.is_background = true;
		self
	}
}

impl fmt::Display for Pipeline {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for (i, stage) in self.stages.iter().enumerate() {
			if i > 0 {
				f.write_str(" | ")?;
			}
			write!(f, "{}", stage)?;
		}
		if self.is_background {
			f.write_str(" &")?;
		}
		Ok(())
	}
}

/// Links a segment to the one after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective { And, Or, Terminal }

impl Connective {
	/// Whether evaluation continues past a segment that finished with `status`.
	pub fn proceeds(self, status: ExitStatus) -> bool {
		match self {
			Connective::And => status.success(),
			Connective::Or => !status.success(),
			Connective::Terminal => false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
	pub pipeline: Pipeline,
	pub connective: Connective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExitStatus(i32);

impl ExitStatus {
	pub const SUCCESS: ExitStatus = ExitStatus(0);
	pub const FAILURE: ExitStatus = ExitStatus(1);
	pub const SYNTAX: ExitStatus = ExitStatus(2);
	pub const NOT_EXECUTABLE: ExitStatus = ExitStatus(126);
	pub const NOT_FOUND: ExitStatus = ExitStatus(127);

	pub fn new(code: i32) -> ExitStatus {
		ExitStatus(code)
	}

	pub fn from_signal(signo: i32) -> ExitStatus {
		ExitStatus(128 + signo)
	}

	pub fn code(self) -> i32 {
		self.0
	}

	pub fn success(self) -> bool {
		self.0 == 0
	}
}

impl fmt::Display for ExitStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
