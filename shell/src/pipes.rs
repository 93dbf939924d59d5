use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use log::debug;
use nix::fcntl::OFlag;
use nix::unistd;

use crate::error::{ShellError, ShellResult};

#[derive(Debug)]
struct Pipe {
	read: Option<OwnedFd>,
	write: Option<OwnedFd>,
}

/// The N-1 pipes joining the stages of an N-stage pipeline.
///
/// Pipe `i` carries stage `i`'s stdout to stage `i+1`'s stdin. All pipes are
/// created close-on-exec; a child that needs an end dup2()s it onto 0 or 1.
#[derive(Debug)]
pub struct PipeSet {
	pipes: Vec<Pipe>,
}

impl PipeSet {
	/// Allocates `count` pipes up front. On failure every pipe created so far is closed.
	pub fn allocate(count: usize) -> ShellResult<PipeSet> {
		let mut pipes = Vec::with_capacity(count);
		for _ in 0 .. count {
			let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(ShellError::PipeCreation)?;
			pipes.push(Pipe { read: Some(read), write: Some(write) });
		}
		debug!("allocated {} pipe(s)", count);
		Ok(PipeSet { pipes: pipes })
	}

	pub fn len(&self) -> usize {
		self.pipes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pipes.is_empty()
	}

	fn raw(end: &Option<OwnedFd>) -> Option<RawFd> {
		end.as_ref().map(|fd| fd.as_raw_fd())
	}

	/// Read end of pipe `stage - 1`, or `None` for the first stage.
	pub fn stage_stdin(&self, stage: usize) -> Option<RawFd> {
		if stage == 0 {
			return None;
		}
		self.pipes.get(stage - 1).and_then(|p| PipeSet::raw(&p.read))
	}

	/// Write end of pipe `stage`, or `None` for the last stage.
	pub fn stage_stdout(&self, stage: usize) -> Option<RawFd> {
		self.pipes.get(stage).and_then(|p| PipeSet::raw(&p.write))
	}

	/// Parent side, right after stage `stage` was forked: pipe `stage - 1` now
	/// has both of its processes and the parent's copies are closed.
	pub fn release_after(&mut self, stage: usize) {
		if stage == 0 {
			return;
		}
		if let Some(pipe) = self.pipes.get_mut(stage - 1) {
			pipe.read = None;
			pipe.write = None;
		}
	}

	pub fn release_all(&mut self) {
		for pipe in &mut self.pipes {
			pipe.read = None;
			pipe.write = None;
		}
	}

	/// Number of pipe descriptors this process still holds.
	pub fn open_descriptors(&self) -> usize {
		self.pipes.iter()
			.map(|p| p.read.is_some() as usize + p.write.is_some() as usize)
			.sum()
	}

	/// Child side: close every pipe descriptor inherited across fork. Only
	/// valid in a child that will exec or `_exit` without dropping `self`.
	pub fn close_in_child(&self) {
		for pipe in &self.pipes {
			for fd in PipeSet::raw(&pipe.read).into_iter().chain(PipeSet::raw(&pipe.write)) {
				if fd > libc::STDERR_FILENO {
					let _ = unistd::close(fd);
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_stage_needs_no_pipes() {
		let pipes = PipeSet::allocate(0).unwrap();
		assert!(pipes.is_empty());
		assert_eq!(pipes.stage_stdin(0), None);
		assert_eq!(pipes.stage_stdout(0), None);
	}

	#[test]
	fn neighbours_share_a_pipe() {
		let pipes = PipeSet::allocate(2).unwrap();
		assert_eq!(pipes.len(), 2);
		assert_eq!(pipes.open_descriptors(), 4);

		assert_eq!(pipes.stage_stdin(0), None);
		assert!(pipes.stage_stdout(0).is_some());
		assert!(pipes.stage_stdin(1).is_some());
		assert!(pipes.stage_stdout(1).is_some());
		assert!(pipes.stage_stdin(2).is_some());
		assert_eq!(pipes.stage_stdout(2), None);
		assert_ne!(pipes.stage_stdout(0), pipes.stage_stdout(1));
	}

	#[test]
	fn release_follows_fork_order() {
		let stages = 4;
		let mut pipes = PipeSet::allocate(stages - 1).unwrap();
		assert_eq!(pipes.open_descriptors(), 2 * (stages - 1));

		pipes.release_after(0);
		assert_eq!(pipes.open_descriptors(), 6);
		pipes.release_after(1);
		assert_eq!(pipes.open_descriptors(), 4);
		assert_eq!(pipes.stage_stdout(0), None);
		assert!(pipes.stage_stdout(1).is_some());
		pipes.release_after(2);
		pipes.release_after(3);
		assert_eq!(pipes.open_descriptors(), 0);
	}

	#[test]
	fn written_data_reaches_reader() {
		use std::fs::File;
		use std::io::{Read, Write};
		use std::os::fd::BorrowedFd;

		let mut pipes = PipeSet::allocate(1).unwrap();
		let clone = |fd: RawFd| unsafe { BorrowedFd::borrow_raw(fd) }.try_clone_to_owned().unwrap();
		let mut writer = File::from(clone(pipes.stage_stdout(0).unwrap()));
		let mut reader = File::from(clone(pipes.stage_stdin(1).unwrap()));
		pipes.release_all();

		writer.write_all(b"hello").unwrap();
		drop(writer);
		let mut out = String::new();
		reader.read_to_string(&mut out).unwrap();
		assert_eq!(out, "hello");
	}
}
