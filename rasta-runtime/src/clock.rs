//! The default `SystemAdapter`: wall-clock time, coarse timer granularity,
//! and randomness for seeding `SN_T`.

use std::time::Instant;

use log::error;
use rand::rngs::ThreadRng;
use rand::Rng;
use rasta_core::adapter::SystemAdapter;
use rasta_core::error::Fatal;

/// Milliseconds since `SystemClock::new()`, truncated to `u32` — enough
/// headroom for any connection's lifetime between process restarts.
pub struct SystemClock {
	start: Instant,
	granularity_ms: u32,
	rng: ThreadRng,
}

impl SystemClock {
	pub fn new(granularity_ms: u32) -> SystemClock {
		SystemClock { start: Instant::now(), granularity_ms, rng: rand::thread_rng() }
	}
}

impl SystemAdapter for SystemClock {
	fn now_ms(&self) -> u32 {
		self.start.elapsed().as_millis() as u32
	}

	fn timer_granularity_ms(&self) -> u32 {
		self.granularity_ms
	}

	fn random_u32(&mut self) -> u32 {
		self.rng.gen()
	}

	fn fatal_error(&self, err: &Fatal) {
		error!("fatal error in SR core: {err}");
	}
}
