use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// Set of keys with at most one live owner each.
///
/// [`ClaimSet::claim`] checks and inserts under one lock, so concurrent
/// callers racing on the same key see exactly one winner. The winner holds a
/// [`Claim`]; dropping it releases the key.
pub struct ClaimSet<K> {
	inner: Arc<Mutex<HashSet<K>>>,
}

impl<K> Clone for ClaimSet<K> {
	fn clone(&self) -> Self {
		Self { inner: Arc::clone(&self.inner) }
	}
}

impl<K> Default for ClaimSet<K> {
	fn default() -> Self {
		Self {
			inner: Arc::new(Mutex::new(HashSet::new())),
		}
	}
}

impl<K> fmt::Debug for ClaimSet<K>
where
	K: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
		f.debug_set().entries(guard.iter()).finish()
	}
}

impl<K> ClaimSet<K>
where
	K: Eq + Hash + Clone,
{
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Claims `key`, or returns `None` when it is already held.
	pub fn claim(&self, key: K) -> Option<Claim<K>> {
		let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
		if !guard.insert(key.clone()) {
			return None;
		}
		Some(Claim {
			key,
			set: Arc::clone(&self.inner),
		})
	}

	/// Returns whether `key` is currently held.
	pub fn contains(&self, key: &K) -> bool {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner).contains(key)
	}

	/// Number of keys currently held.
	pub fn len(&self) -> usize {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	/// Returns `true` when no key is held.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Ownership of one key in a [`ClaimSet`]; released on drop.
pub struct Claim<K>
where
	K: Eq + Hash,
{
	key: K,
	set: Arc<Mutex<HashSet<K>>>,
}

impl<K> fmt::Debug for Claim<K>
where
	K: Eq + Hash + fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Claim").field(&self.key).finish()
	}
}

impl<K> Drop for Claim<K>
where
	K: Eq + Hash,
{
	fn drop(&mut self) {
		self.set.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.key);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn second_claim_on_held_key_is_refused() {
		let set = ClaimSet::new();
		let first = set.claim(7u32);
		assert!(first.is_some());
		assert!(set.claim(7).is_none());
		assert!(set.claim(8).is_some(), "other keys are independent");
		assert!(set.contains(&7));
	}

	#[test]
	fn dropping_claim_releases_key() {
		let set = ClaimSet::new();
		let claim = set.claim("win-3".to_string());
		assert_eq!(set.len(), 1);
		drop(claim);
		assert!(set.is_empty());
		assert!(set.claim("win-3".to_string()).is_some());
	}

	#[test]
	fn concurrent_claims_have_one_winner() {
		let set = ClaimSet::new();
		let winners: usize = std::thread::scope(|s| {
			let handles: Vec<_> = (0..8)
				.map(|_| {
					let set = set.clone();
					s.spawn(move || set.claim(1u64).map(std::mem::forget).is_some())
				})
				.collect();
			handles.into_iter().filter_map(|h| h.join().ok()).filter(|won| *won).count()
		});
		assert_eq!(winners, 1);
	}
}
