use std::fmt;

use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::types::ExitStatus;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum State { Active, Stopped, Terminated }

pub trait WaitStatusExt {
	fn state(self) -> State;
	fn exit_status(self) -> Option<ExitStatus>;
}

impl WaitStatusExt for WaitStatus {
	fn state(self) -> State {
		match self {
			WaitStatus::Exited(..) => State::Terminated,
			WaitStatus::Signaled(..) => State::Terminated,
			WaitStatus::Stopped(..) => State::Stopped,
			#[cfg(any(target_os = "linux", target_os = "android"))]
			WaitStatus::PtraceEvent(..) => State::Stopped,
			#[cfg(any(target_os = "linux", target_os = "android"))]
			WaitStatus::PtraceSyscall(..) => State::Stopped,
			WaitStatus::Continued(..) => State::Active,
			WaitStatus::StillAlive => State::Active,
		}
	}

	fn exit_status(self) -> Option<ExitStatus> {
		match self {
			WaitStatus::Exited(_, code) => Some(ExitStatus::new(code)),
			WaitStatus::Signaled(_, sig, _) => Some(ExitStatus::from_signal(sig as i32)),
			_ => None,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Process {
	pub pid: Pid,
	pub status: WaitStatus,
}

impl Process {
	fn update(&mut self, flags: Option<WaitPidFlag>) {
		loop {
			match waitpid(self.pid, flags) {
				Ok(status) => {
					self.status = status;
					return;
				},
				Err(Errno::EINTR) => continue,
				Err(e) => {
					// Someone else reaped it; the real status is lost.
					warn!("waitpid({}): {}", self.pid, e);
					self.status = WaitStatus::Exited(self.pid, ExitStatus::FAILURE.code());
					return;
				},
			}
		}
	}
}

/// The processes of one pipeline, in stage order.
#[derive(Debug)]
pub struct Job {
	pub processes: Vec<Process>,
}

impl Job {
	pub fn state(&self) -> State {
		self.processes.iter().map(|pr| pr.status.state()).min().unwrap_or(State::Terminated)
	}

	pub fn pids(&self) -> Vec<Pid> {
		self.processes.iter().map(|pr| pr.pid).collect()
	}

	/// Status of the last stage, which stands for the whole pipeline.
	pub fn last_status(&self) -> ExitStatus {
		self.processes.last()
			.and_then(|pr| pr.status.exit_status())
			.unwrap_or(ExitStatus::FAILURE)
	}

	/// Blocks until every process has terminated.
	pub fn wait(&mut self) {
		for pr in self.processes.iter_mut() {
			while pr.status.state() != State::Terminated {
				pr.update(None);
			}
			debug!("reaped {}: {:?}", pr.pid, pr.status);
		}
	}

	/// Collects whatever has already terminated without blocking.
	pub fn poll(&mut self) -> State {
		for pr in self.processes.iter_mut() {
			if pr.status.state() != State::Terminated {
				pr.update(Some(WaitPidFlag::WNOHANG));
			}
		}
		self.state()
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder { imp: Job { processes: Vec::with_capacity(size_hint) } }
	}

	pub fn push(&mut self, pid: Pid) {
		self.imp.processes.push(Process { pid: pid, status: WaitStatus::StillAlive });
	}

	pub fn is_empty(&self) -> bool {
		self.imp.processes.is_empty()
	}

	pub fn build(self) -> Job {
		self.imp
	}
}

/// A background job that has finished and been reaped.
#[derive(Debug)]
pub struct Finished {
	pub id: usize,
	pub job: Job,
}

impl fmt::Display for Finished {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let pids: Vec<String> = self.job.pids().iter().map(|p| p.to_string()).collect();
		write!(f, "[{}] Done {} (status {})", self.id, pids.join(" "), self.job.last_status())
	}
}

/// Outstanding background jobs, polled non-blockingly between commands.
#[derive(Debug, Default)]
pub struct JobTable {
	jobs: Vec<Option<Job>>,
}

impl JobTable {
	pub fn new() -> JobTable {
		JobTable { jobs: vec![] }
	}

	/// Stores `job` in the first free slot and returns its 1-based id.
	pub fn push(&mut self, job: Job) -> usize {
		match self.jobs.iter().position(Option::is_none) {
			Some(i) => {
				self.jobs[i] = Some(job);
				i + 1
			},
			None => {
				self.jobs.push(Some(job));
				self.jobs.len()
			},
		}
	}

	pub fn len(&self) -> usize {
		self.jobs.iter().filter(|j| j.is_some()).count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Reaps every background job whose processes have all terminated.
	pub fn reap(&mut self) -> Vec<Finished> {
		let mut finished = vec![];
		for (i, slot) in self.jobs.iter_mut().enumerate() {
			let done = match *slot {
				Some(ref mut job) => job.poll() == State::Terminated,
				None => false,
			};
			if done {
				if let Some(job) = slot.take() {
					debug!("background job [{}] finished", i + 1);
					finished.push(Finished { id: i + 1, job: job });
				}
			}
		}
		let len = self.jobs.iter().rposition(|j| j.is_some()).map_or(0, |i| i + 1);
		self.jobs.truncate(len);
		finished
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use nix::sys::signal::Signal;

	fn job(pids: &[i32]) -> Job {
		let mut builder = JobBuilder::new(pids.len());
		for &p in pids {
			builder.push(Pid::from_raw(p));
		}
		builder.build()
	}

	#[test]
	fn wait_status_interpretation() {
		let pid = Pid::from_raw(100);
		assert_eq!(WaitStatus::Exited(pid, 0).exit_status(), Some(ExitStatus::SUCCESS));
		assert_eq!(WaitStatus::Signaled(pid, Signal::SIGKILL, false).exit_status(), Some(ExitStatus::new(137)));
		assert_eq!(WaitStatus::StillAlive.exit_status(), None);
		assert_eq!(WaitStatus::StillAlive.state(), State::Active);
		assert_eq!(WaitStatus::Exited(pid, 1).state(), State::Terminated);
	}

	#[test]
	fn job_state_is_least_advanced_process() {
		let mut j = job(&[100, 101]);
		assert_eq!(j.state(), State::Active);
		j.processes[0].status = WaitStatus::Exited(Pid::from_raw(100), 0);
		assert_eq!(j.state(), State::Active);
		j.processes[1].status = WaitStatus::Exited(Pid::from_raw(101), 4);
		assert_eq!(j.state(), State::Terminated);
		assert_eq!(j.last_status(), ExitStatus::new(4));
	}

	#[test]
	fn table_reuses_free_slots() {
		let mut table = JobTable::new();
		let mut done = job(&[1]);
		done.processes[0].status = WaitStatus::Exited(Pid::from_raw(1), 0);
		assert_eq!(table.push(done), 1);
		assert_eq!(table.len(), 1);

		let finished = table.reap();
		assert_eq!(finished.len(), 1);
		assert_eq!(finished[0].id, 1);
		assert_eq!(finished[0].to_string(), "[1] Done 1 (status 0)");
		assert!(table.is_empty());

		let mut again = job(&[2]);
		again.processes[0].status = WaitStatus::Exited(Pid::from_raw(2), 0);
		assert_eq!(table.push(again), 1);
	}
}
