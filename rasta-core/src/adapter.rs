//! External collaborators. The core only consumes these through traits; it
//! owns no socket, no clock, and no RNG of its own.

use crate::error::Fatal;
use crate::message::DisconnectReason;

/// The redundancy-channel adapter. `connection_id` doubles as the
/// `redundancy_channel_id` (RASW-367/RASW-381: 1:1 with the connection).
pub trait RedundancyChannel {
	fn open(&mut self, channel_id: u32) -> Result<(), Fatal>;
	fn close(&mut self, channel_id: u32) -> Result<(), Fatal>;
	fn send(&mut self, channel_id: u32, bytes: &[u8]) -> Result<(), Fatal>;
	/// Non-blocking read. `Ok(None)` is `kNoMessageReceived`; any other
	/// adapter failure is fatal and should be raised as `Err` rather than
	/// encoded in the return value.
	fn read(&mut self, channel_id: u32) -> Result<Option<Vec<u8>>, Fatal>;
}

/// Wall-clock timer, randomness, and the fatal-error sink.
pub trait SystemAdapter {
	/// Monotonic time in milliseconds.
	fn now_ms(&self) -> u32;
	/// The granularity of `now_ms`, used in the round-trip-delay calculation
	/// the engine runs while processing a received message.
	fn timer_granularity_ms(&self) -> u32;
	fn random_u32(&mut self) -> u32;
	/// Deliver a fatal condition to the configured sink. This is terminal;
	/// the engine still returns `Err(fatal)` to its own caller afterwards so
	/// a host can unwind instead of being forced to abort the process inside
	/// a library call.
	fn fatal_error(&self, err: &Fatal);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BufferUtilisation {
	pub send_used: u32,
	pub send_free: u32,
	pub receive_used: u32,
	pub receive_free: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticCounters {
	pub safety_code: u32,
	pub address: u32,
	pub message_type: u32,
	pub sequence_number: u32,
	pub confirmed_sequence_number: u32,
}

/// The user-facing notification sink (RASW-296). Split into the two payload
/// shapes a disconnect (RASW-294/RASW-295) and a sliding-window diagnostics
/// report actually produce; see DESIGN.md for why a single
/// `connection_state_notification` name is realized as two trait methods
/// here.
pub trait NotificationSink {
	fn connection_state_notification(
		&mut self,
		connection_id: u32,
		utilisation: BufferUtilisation,
		opposite_buffer_size: u32,
		disc_reason: DisconnectReason,
		detailed_disc_reason: u16,
	);

	fn diagnostic_notification(&mut self, connection_id: u32, counters: DiagnosticCounters, histogram: [u32; 4]);
}
