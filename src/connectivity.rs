//! Platform connectivity signal used to disambiguate transport failures.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::_prelude::*;

/// Reports whether the platform currently believes it is online.
///
/// The adapter only consults the probe after a transport call has already failed; it never
/// performs connectivity detection of its own.
pub trait ConnectivityProbe
where
	Self: Send + Sync,
{
	/// Returns `true` when the platform reports itself online.
	fn is_online(&self) -> bool;
}
impl<F> ConnectivityProbe for F
where
	F: Fn() -> bool + Send + Sync,
{
	fn is_online(&self) -> bool {
		self()
	}
}

/// Probe for environments without an offline signal; every failure is a request failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysOnline;
impl ConnectivityProbe for AlwaysOnline {
	fn is_online(&self) -> bool {
		true
	}
}

/// Shared flag the embedding application flips when its network state changes.
///
/// Clones share the same underlying flag.
#[derive(Clone, Debug)]
pub struct ConnectivityFlag(Arc<AtomicBool>);
impl ConnectivityFlag {
	/// Creates a flag with the given initial state.
	pub fn new(online: bool) -> Self {
		Self(Arc::new(AtomicBool::new(online)))
	}

	/// Records the current network state.
	pub fn set_online(&self, online: bool) {
		self.0.store(online, Ordering::Release);
	}
}
impl Default for ConnectivityFlag {
	fn default() -> Self {
		Self::new(true)
	}
}
impl ConnectivityProbe for ConnectivityFlag {
	fn is_online(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}
