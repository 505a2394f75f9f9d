use rasta_utils::bytes::{get_u16, get_u32, put_u16, put_u32};

pub const HEADER_LEN: usize = 28;

const OFF_MESSAGE_LENGTH: usize = 0;
const OFF_MESSAGE_TYPE: usize = 2;
const OFF_RECEIVER_ID: usize = 4;
const OFF_SENDER_ID: usize = 8;
const OFF_SEQUENCE_NUMBER: usize = 12;
const OFF_CONFIRMED_SEQUENCE_NUMBER: usize = 16;
const OFF_TIME_STAMP: usize = 20;
const OFF_CONFIRMED_TIME_STAMP: usize = 24;
pub const OFF_BODY: usize = HEADER_LEN;

/// The 28-byte fixed header shared by every PDU (RASW-160).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
	pub message_length: u16,
	pub message_type: u16,
	pub receiver_id: u32,
	pub sender_id: u32,
	pub sequence_number: u32,
	pub confirmed_sequence_number: u32,
	pub time_stamp: u32,
	pub confirmed_time_stamp: u32,
}

impl Header {
	pub fn decode(buf: &[u8]) -> Header {
		Header {
			message_length: get_u16(buf, OFF_MESSAGE_LENGTH),
			message_type: get_u16(buf, OFF_MESSAGE_TYPE),
			receiver_id: get_u32(buf, OFF_RECEIVER_ID),
			sender_id: get_u32(buf, OFF_SENDER_ID),
			sequence_number: get_u32(buf, OFF_SEQUENCE_NUMBER),
			confirmed_sequence_number: get_u32(buf, OFF_CONFIRMED_SEQUENCE_NUMBER),
			time_stamp: get_u32(buf, OFF_TIME_STAMP),
			confirmed_time_stamp: get_u32(buf, OFF_CONFIRMED_TIME_STAMP),
		}
	}

	pub fn encode(&self, buf: &mut [u8]) {
		put_u16(buf, OFF_MESSAGE_LENGTH, self.message_length);
		put_u16(buf, OFF_MESSAGE_TYPE, self.message_type);
		put_u32(buf, OFF_RECEIVER_ID, self.receiver_id);
		put_u32(buf, OFF_SENDER_ID, self.sender_id);
		put_u32(buf, OFF_SEQUENCE_NUMBER, self.sequence_number);
		put_u32(buf, OFF_CONFIRMED_SEQUENCE_NUMBER, self.confirmed_sequence_number);
		put_u32(buf, OFF_TIME_STAMP, self.time_stamp);
		put_u32(buf, OFF_CONFIRMED_TIME_STAMP, self.confirmed_time_stamp);
	}
}

/// Rewrite just `time_stamp` and `confirmed_sequence_number` in place, the
/// fields `update_message_header` re-stamps before a send.
pub fn rewrite_time_and_cs(buf: &mut [u8], time_stamp: u32, confirmed_sequence_number: u32) {
	put_u32(buf, OFF_TIME_STAMP, time_stamp);
	put_u32(buf, OFF_CONFIRMED_SEQUENCE_NUMBER, confirmed_sequence_number);
}

/// Rewrite the fields `prepare_buffer_for_retr` renumbers a staged entry
/// with: the new sequence number and the sender/receiver/confirmed-time-stamp
/// taken from the retransmission header template.
/// `time_stamp`, `confirmed_sequence_number`, and the safety trailer are
/// left stale until the entry is actually sent via `update_message_header`.
pub fn rewrite_retransmission_fields(buf: &mut [u8], sequence_number: u32, sender_id: u32, receiver_id: u32, confirmed_time_stamp: u32) {
	put_u32(buf, OFF_SEQUENCE_NUMBER, sequence_number);
	put_u32(buf, OFF_SENDER_ID, sender_id);
	put_u32(buf, OFF_RECEIVER_ID, receiver_id);
	put_u32(buf, OFF_CONFIRMED_TIME_STAMP, confirmed_time_stamp);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encode_decode_round_trips() {
		let header = Header {
			message_length: 48,
			message_type: 6240,
			receiver_id: 0x62,
			sender_id: 0x61,
			sequence_number: 5,
			confirmed_sequence_number: 4,
			time_stamp: 1000,
			confirmed_time_stamp: 999,
		};

		let mut buf = [0u8; HEADER_LEN];
		header.encode(&mut buf);
		assert_eq!(Header::decode(&buf), header);
	}

	#[test]
	fn field_offsets_match_rasw160() {
		let mut buf = [0u8; HEADER_LEN];
		let header = Header {
			message_length: 1,
			message_type: 2,
			receiver_id: 3,
			sender_id: 4,
			sequence_number: 5,
			confirmed_sequence_number: 6,
			time_stamp: 7,
			confirmed_time_stamp: 8,
		};
		header.encode(&mut buf);

		assert_eq!(get_u16(&buf, 0), 1);
		assert_eq!(get_u16(&buf, 2), 2);
		assert_eq!(get_u32(&buf, 4), 3);
		assert_eq!(get_u32(&buf, 8), 4);
		assert_eq!(get_u32(&buf, 12), 5);
		assert_eq!(get_u32(&buf, 16), 6);
		assert_eq!(get_u32(&buf, 20), 7);
		assert_eq!(get_u32(&buf, 24), 8);
	}
}
