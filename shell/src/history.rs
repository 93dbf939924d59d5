use std::collections::VecDeque;

use crate::error::{ShellError, ShellResult};

/// Command lines entered so far, oldest first, bounded by `capacity`.
#[derive(Debug, Clone)]
pub struct History {
	entries: VecDeque<String>,
	capacity: usize,
}

impl History {
	pub fn new(capacity: usize) -> History {
		History { entries: VecDeque::with_capacity(capacity), capacity: capacity }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Records `line`, evicting and returning the oldest entry when full.
	/// Blank lines are not recorded.
	pub fn push(&mut self, line: &str) -> Option<String> {
		let line = line.trim_end_matches(['\n', '\r']);
		if line.trim().is_empty() || self.capacity == 0 {
			return None;
		}
		let evicted = if self.entries.len() == self.capacity { self.evict() } else { None };
		self.entries.push_back(line.to_string());
		evicted
	}

	pub fn evict(&mut self) -> Option<String> {
		self.entries.pop_front()
	}

	/// 1-based lookup.
	pub fn get(&self, index: usize) -> Option<&str> {
		index.checked_sub(1).and_then(|i| self.entries.get(i)).map(String::as_str)
	}

	/// Entries paired with their 1-based index.
	pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
		self.entries.iter().enumerate().map(|(i, e)| (i + 1, e.as_str()))
	}

	/// Resolves a `!N` recall. Returns `None` when `line` is not a recall.
	pub fn recall(&self, line: &str) -> ShellResult<Option<String>> {
		let line = line.trim();
		let digits = match line.strip_prefix('!') {
			Some(d) if !d.is_empty() && d.bytes().all(|c| c.is_ascii_digit()) => d,
			_ => return Ok(None),
		};
		digits.parse::<usize>().ok()
			.and_then(|n| self.get(n))
			.map(|e| Some(e.to_string()))
			.ok_or_else(|| ShellError::HistoryIndex(line.to_string()))
	}
}
