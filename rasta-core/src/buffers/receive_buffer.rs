use rasta_collections::RingBuffer;

use crate::error::Fatal;

/// Per-connection FIFO of accepted payloads, decoded from Data/RetrData
/// (srrece). Delivery order to the application equals insertion order.
pub struct ReceiveBuffer {
	entries: RingBuffer<Vec<u8>>,
}

impl ReceiveBuffer {
	pub fn new(n_send_max: usize) -> ReceiveBuffer {
		ReceiveBuffer { entries: RingBuffer::new(n_send_max) }
	}

	pub fn add(&mut self, payload: Vec<u8>) -> Result<(), Fatal> {
		self.entries.push_back(payload).map_err(|_| Fatal::InternalError("receive buffer overflow"))
	}

	pub fn read(&mut self) -> Option<Vec<u8>> {
		self.entries.pop_front()
	}

	pub fn used_entries(&self) -> usize {
		self.entries.len()
	}

	pub fn free_entries(&self) -> usize {
		self.entries.free()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn delivers_in_insertion_order() {
		let mut buf = ReceiveBuffer::new(2);
		buf.add(vec![1]).unwrap();
		buf.add(vec![2]).unwrap();

		assert_eq!(buf.read(), Some(vec![1]));
		assert_eq!(buf.read(), Some(vec![2]));
		assert_eq!(buf.read(), None);
	}

	#[test]
	fn add_past_capacity_is_fatal() {
		let mut buf = ReceiveBuffer::new(1);
		buf.add(vec![1]).unwrap();
		assert!(buf.add(vec![2]).is_err());
	}

	#[test]
	fn free_entries_reflects_remaining_capacity() {
		let mut buf = ReceiveBuffer::new(3);
		buf.add(vec![1]).unwrap();
		assert_eq!(buf.free_entries(), 2);
		assert_eq!(buf.used_entries(), 1);
	}
}
