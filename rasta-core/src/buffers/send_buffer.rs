use rasta_collections::RingBuffer;

use crate::error::Fatal;
use crate::message::{restamp_for_retransmission, HeaderFields};
use crate::seqnum;

struct SendEntry {
	sequence_number: u32,
	msg: Vec<u8>,
	sent: bool,
}

/// Per-connection ring of up to `n_send_max` prepared PDUs, FIFO by
/// insertion order (srsend).
pub struct SendBuffer {
	entries: RingBuffer<SendEntry>,
}

impl SendBuffer {
	pub fn new(n_send_max: usize) -> SendBuffer {
		SendBuffer { entries: RingBuffer::new(n_send_max) }
	}

	/// Full buffer is a programming error: the engine must keep
	/// `used_entries` below capacity via flow control (the allow-send check
	/// in `send_pending_messages`).
	pub fn add(&mut self, sequence_number: u32, msg: Vec<u8>) -> Result<(), Fatal> {
		self.entries
			.push_back(SendEntry { sequence_number, msg, sent: false })
			.map_err(|_| Fatal::InternalError("send buffer overflow"))
	}

	/// The next unsent PDU, marked sent on return so a repeated call
	/// advances to the following entry.
	pub fn read_message_to_send(&mut self) -> Option<&mut [u8]> {
		let entry = self.entries.iter_mut().find(|entry| !entry.sent)?;
		entry.sent = true;
		Some(entry.msg.as_mut_slice())
	}

	/// Drop every entry whose sequence number the peer has confirmed.
	pub fn remove(&mut self, up_to_cs: u32) {
		self.entries.retain(|entry| seqnum::gt(entry.sequence_number, up_to_cs));
	}

	pub fn is_sequence_number_in_buffer(&self, sn: u32) -> bool {
		self.entries.iter().any(|entry| entry.sequence_number == sn)
	}

	/// Renumber every entry with `sequence_number > start_cs` to ascend from
	/// `header_template.sequence_number`, stamping in the template's
	/// sender/receiver/confirmed-time-stamp and re-marking each entry unsent.
	/// Writes the last renumbered sequence number to `last_sn`.
	pub fn prepare_buffer_for_retr(&mut self, start_cs: u32, header_template: HeaderFields, last_sn: &mut u32) {
		let mut next_sn = header_template.sequence_number;

		for entry in self.entries.iter_mut() {
			if !seqnum::gt(entry.sequence_number, start_cs) {
				continue;
			}

			restamp_for_retransmission(
				&mut entry.msg,
				next_sn,
				header_template.sender_id,
				header_template.receiver_id,
				header_template.confirmed_time_stamp,
			);
			entry.sequence_number = next_sn;
			entry.sent = false;

			*last_sn = next_sn;
			next_sn = next_sn.wrapping_add(1);
		}
	}

	pub fn number_of_messages_to_send(&self) -> usize {
		self.entries.iter().filter(|entry| !entry.sent).count()
	}

	pub fn used_entries(&self) -> usize {
		self.entries.len()
	}

	pub fn free_entries(&self) -> usize {
		self.entries.free()
	}
}
