//! Correlation-vector sources for proxy-routed requests.
//!
//! A correlation vector (`ms-cv`) is a client-generated tracing identifier of the form
//! `{base}.{n}`. The adapter only asks for one when a proxy-routed POST arrives without a
//! caller-supplied vector.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use rand::Rng;

/// Fixed vector sent by [`PlaceholderCorrelationVector`].
pub const PLACEHOLDER_CORRELATION_VECTOR: &str = "DPlGFG6zXT2tUsVjaZVTnj.1";

const BASE_BYTES: usize = 16;

/// Produces correlation vectors on demand.
pub trait CorrelationVectorSource
where
	Self: Send + Sync,
{
	/// Returns the vector to attach to the next proxy-routed request.
	fn next_vector(&self) -> String;
}

/// Always returns [`PLACEHOLDER_CORRELATION_VECTOR`].
///
/// This is the adapter's default and matches the relay's expected wire value; it is not a real
/// per-request identifier. Use [`IncrementingCorrelationVector`] when the relay accepts
/// generated vectors.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaceholderCorrelationVector;
impl CorrelationVectorSource for PlaceholderCorrelationVector {
	fn next_vector(&self) -> String {
		PLACEHOLDER_CORRELATION_VECTOR.to_owned()
	}
}

/// Random 128-bit base with an atomically incremented suffix: `base.1`, `base.2`, ...
#[derive(Debug)]
pub struct IncrementingCorrelationVector {
	base: String,
	counter: AtomicU64,
}
impl IncrementingCorrelationVector {
	/// Generates a fresh random base.
	pub fn new() -> Self {
		let mut bytes = [0_u8; BASE_BYTES];

		rand::rng().fill(&mut bytes);

		Self::with_base(STANDARD_NO_PAD.encode(bytes))
	}

	/// Uses a caller-chosen base, e.g. one received from an upstream service.
	pub fn with_base(base: impl Into<String>) -> Self {
		Self { base: base.into(), counter: AtomicU64::new(0) }
	}

	/// Returns the vector base without a suffix.
	pub fn base(&self) -> &str {
		&self.base
	}
}
impl Default for IncrementingCorrelationVector {
	fn default() -> Self {
		Self::new()
	}
}
impl CorrelationVectorSource for IncrementingCorrelationVector {
	fn next_vector(&self) -> String {
		let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;

		format!("{}.{n}", self.base)
	}
}
