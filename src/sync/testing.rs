//! Deterministic expiry scheduler for tests.

use std::collections::BTreeMap;
use std::time::Duration;

use super::overlay::ExpiryScheduler;
use super::store::EdgeId;

/// Records scheduled expiries against a virtual clock advanced by hand.
#[derive(Debug, Default)]
pub struct ManualTimers {
	now: Duration,
	pending: BTreeMap<EdgeId, Duration>,
	pub cancelled: Vec<EdgeId>,
}

impl ManualTimers {
	/// Move the clock forward and return the ids that fell due, earliest first.
	pub fn advance(&mut self, by: Duration) -> Vec<EdgeId> {
		self.now += by;
		let mut due: Vec<(Duration, EdgeId)> = self
			.pending
			.iter()
			.filter(|&(_, &deadline)| deadline <= self.now)
			.map(|(&id, &deadline)| (deadline, id))
			.collect();
		due.sort();
		for (_, id) in &due {
			self.pending.remove(id);
		}
		due.into_iter().map(|(_, id)| id).collect()
	}

	pub fn pending(&self) -> usize {
		self.pending.len()
	}

	pub fn deadline(&self, id: EdgeId) -> Option<Duration> {
		self.pending.get(&id).copied()
	}
}

impl ExpiryScheduler for ManualTimers {
	fn schedule(&mut self, id: EdgeId, after: Duration) {
		self.pending.insert(id, self.now + after);
	}

	fn cancel(&mut self, id: EdgeId) {
		if self.pending.remove(&id).is_some() {
			self.cancelled.push(id);
		}
	}
}
