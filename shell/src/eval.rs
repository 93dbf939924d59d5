use std::io::{self, Write};
use std::os::fd::RawFd;

use log::{debug, info};
use nix::unistd::Pid;

use crate::error::{ShellError, ShellResult};
use crate::job::{Finished, Job, JobBuilder, JobTable};
use crate::launcher::{self, Prepared};
use crate::lexer::Token;
use crate::parser;
use crate::pipes::PipeSet;
use crate::types::*;

/// Runs pipelines as OS processes and sequences them through `&&`/`||`.
///
/// Background notifications are written to `notify`; errors go to stderr.
#[derive(Debug)]
pub struct Executor<W: Write> {
	notify: W,
	notify_background: bool,
	jobs: JobTable,
}

impl Executor<io::Stdout> {
	pub fn stdout() -> Executor<io::Stdout> {
		Executor::new(io::stdout())
	}
}

impl<W: Write> Executor<W> {
	pub fn new(notify: W) -> Executor<W> {
		Executor { notify: notify, notify_background: true, jobs: JobTable::new() }
	}

	pub fn notify_background(mut self, enabled: bool) -> Executor<W> {
		self.notify_background = enabled;
		self
	}

	pub fn notifications(&self) -> &W {
		&self.notify
	}

	pub fn jobs(&self) -> &JobTable {
		&self.jobs
	}

	/// Reaps finished background jobs without blocking.
	pub fn reap(&mut self) -> Vec<Finished> {
		self.jobs.reap()
	}

	fn report(&self, err: &ShellError) -> ExitStatus {
		debug!("reporting {:?}", err);
		let _ = writeln!(io::stderr(), "ish: {}", err);
		err.status()
	}

	/// Forks one process per stage, left to right, through `launch`. A fork
	/// failure stops further stages; the ones already running are returned
	/// with the error.
	fn spawn<L>(&mut self, pipeline: &Pipeline, mut launch: L) -> ShellResult<(Job, Option<ShellError>)>
		where L: FnMut(&Prepared, Option<RawFd>, Option<RawFd>, &PipeSet) -> ShellResult<Pid> {
		let prepared = pipeline.stages.iter().map(Prepared::new).collect::<ShellResult<Vec<_>>>()?;
		if prepared.is_empty() {
			return Err(ShellError::parse("empty pipeline"));
		}
		let mut pipes = PipeSet::allocate(prepared.len() - 1)?;

		let mut builder = JobBuilder::new(prepared.len());
		let mut spawn_error = None;
		for (i, stage) in prepared.iter().enumerate() {
			match launch(stage, pipes.stage_stdin(i), pipes.stage_stdout(i), &pipes) {
				Ok(pid) => {
					debug!("stage {} `{}` forked as {}", i, stage.stage, pid);
					builder.push(pid);
					pipes.release_after(i);
				},
				Err(e) => {
					debug!("stage {} `{}` not started: {}", i, stage.stage, e);
					spawn_error = Some(e);
					break;
				},
			}
		}
		pipes.release_all();
		debug_assert_eq!(pipes.open_descriptors(), 0);

		match spawn_error {
			Some(e) if builder.is_empty() => Err(e),
			spawn_error => Ok((builder.build(), spawn_error)),
		}
	}

	/// Runs one pipeline. In the foreground the result is the last stage's
	/// status; a background pipeline reports success as soon as it is started.
	pub fn execute(&mut self, pipeline: &Pipeline) -> ExitStatus {
		self.execute_with(pipeline, launcher::launch)
	}

	fn execute_with<L>(&mut self, pipeline: &Pipeline, launch: L) -> ExitStatus
		where L: FnMut(&Prepared, Option<RawFd>, Option<RawFd>, &PipeSet) -> ShellResult<Pid> {
		let (mut job, spawn_error) = match self.spawn(pipeline, launch) {
			Ok(r) => r,
			Err(e) => return self.report(&e),
		};
		let status = spawn_error.as_ref().map(|e| self.report(e));

		if pipeline.is_background {
			if self.notify_background {
				for pid in job.pids() {
					let _ = writeln!(self.notify, "Process running in background with PID {}", pid);
				}
				let _ = self.notify.flush();
			}
			let id = self.jobs.push(job);
			info!("`{}` running in background as job [{}]", pipeline, id);
			return status.unwrap_or(ExitStatus::SUCCESS);
		}

		job.wait();
		let status = status.unwrap_or_else(|| job.last_status());
		debug!("`{}` exited with {}", pipeline, status);
		status
	}

	fn chain<T, I, F>(&mut self, segments: I, mut run: F) -> ExitStatus
		where I: IntoIterator<Item = (T, Connective)>, F: FnMut(&mut Self, T) -> ExitStatus {
		let mut status = ExitStatus::SUCCESS;
		for (segment, connective) in segments {
			status = run(self, segment);
			if !connective.proceeds(status) {
				break;
			}
		}
		status
	}

	/// Evaluates segments left to right, short-circuiting on `&&`/`||`.
	/// Returns the status of the last pipeline actually executed.
	pub fn evaluate(&mut self, segments: &[Segment]) -> ExitStatus {
		self.chain(segments.iter().map(|s| (&s.pipeline, s.connective)),
			|ex, pipeline| ex.execute(pipeline))
	}

	/// Builds and runs one pipeline; a build error is reported and counts as
	/// a failed pipeline.
	pub fn run_tokens(&mut self, tokens: &[Token]) -> ExitStatus {
		match parser::build(tokens) {
			Ok(pipeline) => self.execute(&pipeline),
			Err(e) => self.report(&e),
		}
	}

	/// Like `evaluate`, but builds each pipeline only when it is reached.
	pub fn evaluate_tokens(&mut self, tokens: &[Token]) -> ExitStatus {
		self.chain(parser::split_connectives(tokens).into_iter().map(|u| (u.tokens, u.connective)),
			|ex, tokens| ex.run_tokens(tokens))
	}
}
