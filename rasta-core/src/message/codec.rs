use rasta_utils::bytes::get_u16;

use super::header::{Header, HEADER_LEN};
use super::{
	DisconnectReason, HeaderFields, MessageType, MESSAGE_LEN_MAX_FULL_MD4, MESSAGE_LEN_MAX_HALF_MD4, MESSAGE_LEN_MAX_NONE_MD4,
	MESSAGE_LEN_MIN_FULL_MD4, MESSAGE_LEN_MIN_HALF_MD4, MESSAGE_LEN_MIN_NONE_MD4, PAYLOAD_LEN_MAX, PAYLOAD_LEN_MIN,
};
use crate::config::{Md4InitialValue, SafetyCodeType};
use crate::error::Fatal;
use crate::md4::Md4;

const CONN_BODY_LEN: usize = 14;
const DISC_BODY_LEN: usize = 4;
const DATA_BODY_HEADER_LEN: usize = 2;

/// Protocol-version digit bytes are ASCII `'0'..='9'` (RASW-173); each byte
/// of the four-byte field must fall in this range or message creation is
/// fatal, not silently accepted.
const PROTOCOL_VERSION_DIGIT_MIN: u8 = 0x30;
const PROTOCOL_VERSION_DIGIT_MAX: u8 = 0x39;

/// Valid `n_send_max` range for a Conn message body (RASW-174).
const N_SEND_MAX_MIN: u16 = 2;
const N_SEND_MAX_MAX: u16 = 20;

fn validate_protocol_version(protocol_version: [u8; 4]) -> Result<(), Fatal> {
	if protocol_version.iter().any(|&b| !(PROTOCOL_VERSION_DIGIT_MIN..=PROTOCOL_VERSION_DIGIT_MAX).contains(&b)) {
		return Err(Fatal::InvalidParameter("protocol_version byte out of range 0x30..=0x39"));
	}
	Ok(())
}

fn validate_n_send_max(n_send_max: u16) -> Result<(), Fatal> {
	if !(N_SEND_MAX_MIN..=N_SEND_MAX_MAX).contains(&n_send_max) {
		return Err(Fatal::InvalidParameter("n_send_max out of range 2..=20"));
	}
	Ok(())
}

/// Outcome of `check_message`. Not an `Err` variant: a bad message is a
/// routine protocol event, not a failure of the call itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
	NoError,
	InvalidMessageSize,
	InvalidMessageType,
	InvalidMessageMd4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnMessageData {
	pub protocol_version: [u8; 4],
	pub n_send_max: u16,
}

fn size_bounds(safety: SafetyCodeType) -> (usize, usize) {
	match safety {
		SafetyCodeType::None => (MESSAGE_LEN_MIN_NONE_MD4, MESSAGE_LEN_MAX_NONE_MD4),
		SafetyCodeType::LowerMd4 => (MESSAGE_LEN_MIN_HALF_MD4, MESSAGE_LEN_MAX_HALF_MD4),
		SafetyCodeType::FullMd4 => (MESSAGE_LEN_MIN_FULL_MD4, MESSAGE_LEN_MAX_FULL_MD4),
	}
}

fn seal(buf: &mut [u8], safety: SafetyCodeType, md4_init: Md4InitialValue, md4: &dyn Md4) {
	let trailer_len = safety.trailer_len();
	if trailer_len == 0 {
		return;
	}

	let split = buf.len() - trailer_len;
	let digest = md4.calculate(md4_init, &buf[..split]);
	buf[split..].copy_from_slice(&digest[..trailer_len]);
}

fn build(
	h: HeaderFields,
	message_type: MessageType,
	confirmed_time_stamp: u32,
	body: &[u8],
	safety: SafetyCodeType,
	md4_init: Md4InitialValue,
	md4: &dyn Md4,
) -> Vec<u8> {
	let trailer_len = safety.trailer_len();
	let total_len = HEADER_LEN + body.len() + trailer_len;
	let mut buf = vec![0u8; total_len];

	let header = Header {
		message_length: total_len as u16,
		message_type: message_type.code(),
		receiver_id: h.receiver_id,
		sender_id: h.sender_id,
		sequence_number: h.sequence_number,
		// Placeholders: stamped later by `update_message_header` at actual
		// send time in `send_pending_messages`.
		confirmed_sequence_number: 0,
		time_stamp: 0,
		confirmed_time_stamp,
	};
	header.encode(&mut buf);
	buf[HEADER_LEN..HEADER_LEN + body.len()].copy_from_slice(body);

	seal(&mut buf, safety, md4_init, md4);
	buf
}

/// `h.confirmed_time_stamp` must be 0: a ConnReq never confirms a peer
/// timestamp, so a nonzero value is a caller error rather than something to
/// silently correct.
pub fn create_conn_req_message(
	h: HeaderFields,
	protocol_version: [u8; 4],
	n_send_max: u16,
	safety: SafetyCodeType,
	md4_init: Md4InitialValue,
	md4: &dyn Md4,
) -> Result<Vec<u8>, Fatal> {
	validate_protocol_version(protocol_version)?;
	validate_n_send_max(n_send_max)?;
	if h.confirmed_time_stamp != 0 {
		return Err(Fatal::InvalidParameter("confirmed_time_stamp must be 0 for ConnReq"));
	}

	let mut body = Vec::with_capacity(CONN_BODY_LEN);
	body.extend_from_slice(&protocol_version);
	body.extend_from_slice(&n_send_max.to_le_bytes());
	body.extend_from_slice(&[0u8; 8]);

	Ok(build(h, MessageType::ConnReq, 0, &body, safety, md4_init, md4))
}

pub fn create_conn_resp_message(
	h: HeaderFields,
	protocol_version: [u8; 4],
	n_send_max: u16,
	safety: SafetyCodeType,
	md4_init: Md4InitialValue,
	md4: &dyn Md4,
) -> Result<Vec<u8>, Fatal> {
	validate_protocol_version(protocol_version)?;
	validate_n_send_max(n_send_max)?;

	let mut body = Vec::with_capacity(CONN_BODY_LEN);
	body.extend_from_slice(&protocol_version);
	body.extend_from_slice(&n_send_max.to_le_bytes());
	body.extend_from_slice(&[0u8; 8]);

	Ok(build(h, MessageType::ConnResp, h.confirmed_time_stamp, &body, safety, md4_init, md4))
}

pub fn create_retr_req_message(h: HeaderFields, safety: SafetyCodeType, md4_init: Md4InitialValue, md4: &dyn Md4) -> Vec<u8> {
	build(h, MessageType::RetrReq, h.confirmed_time_stamp, &[], safety, md4_init, md4)
}

pub fn create_retr_resp_message(h: HeaderFields, safety: SafetyCodeType, md4_init: Md4InitialValue, md4: &dyn Md4) -> Vec<u8> {
	build(h, MessageType::RetrResp, h.confirmed_time_stamp, &[], safety, md4_init, md4)
}

pub fn create_heartbeat_message(h: HeaderFields, safety: SafetyCodeType, md4_init: Md4InitialValue, md4: &dyn Md4) -> Vec<u8> {
	build(h, MessageType::Heartbeat, h.confirmed_time_stamp, &[], safety, md4_init, md4)
}

pub fn create_disc_req_message(
	h: HeaderFields,
	detailed_reason: u16,
	reason: DisconnectReason,
	safety: SafetyCodeType,
	md4_init: Md4InitialValue,
	md4: &dyn Md4,
) -> Vec<u8> {
	let mut body = Vec::with_capacity(DISC_BODY_LEN);
	body.extend_from_slice(&detailed_reason.to_le_bytes());
	body.extend_from_slice(&(reason as u16).to_le_bytes());

	build(h, MessageType::DiscReq, h.confirmed_time_stamp, &body, safety, md4_init, md4)
}

pub fn create_data_message(
	h: HeaderFields,
	payload: &[u8],
	safety: SafetyCodeType,
	md4_init: Md4InitialValue,
	md4: &dyn Md4,
) -> Result<Vec<u8>, Fatal> {
	if !(PAYLOAD_LEN_MIN..=PAYLOAD_LEN_MAX).contains(&payload.len()) {
		return Err(Fatal::InvalidParameter("data payload length out of range 1..=1055"));
	}

	let mut body = Vec::with_capacity(DATA_BODY_HEADER_LEN + payload.len());
	body.extend_from_slice(&(payload.len() as u16).to_le_bytes());
	body.extend_from_slice(payload);

	Ok(build(h, MessageType::Data, h.confirmed_time_stamp, &body, safety, md4_init, md4))
}

pub fn create_retr_data_message(
	h: HeaderFields,
	payload: &[u8],
	safety: SafetyCodeType,
	md4_init: Md4InitialValue,
	md4: &dyn Md4,
) -> Result<Vec<u8>, Fatal> {
	if !(PAYLOAD_LEN_MIN..=PAYLOAD_LEN_MAX).contains(&payload.len()) {
		return Err(Fatal::InvalidParameter("data payload length out of range 1..=1055"));
	}

	let mut body = Vec::with_capacity(DATA_BODY_HEADER_LEN + payload.len());
	body.extend_from_slice(&(payload.len() as u16).to_le_bytes());
	body.extend_from_slice(payload);

	Ok(build(h, MessageType::RetrData, h.confirmed_time_stamp, &body, safety, md4_init, md4))
}

/// Rewrite `time_stamp` and `confirmed_sequence_number`, then recompute the
/// safety trailer. Precondition: `msg`'s `message_length` is already
/// consistent with `safety`.
pub fn update_message_header(msg: &mut [u8], time_stamp: u32, confirmed_sequence_number: u32, safety: SafetyCodeType, md4_init: Md4InitialValue, md4: &dyn Md4) {
	super::header::rewrite_time_and_cs(msg, time_stamp, confirmed_sequence_number);
	seal(msg, safety, md4_init, md4);
}

/// Renumber a staged entry during `prepare_buffer_for_retr`. The safety
/// trailer is left stale; it is recomputed by
/// `update_message_header` when the entry is actually (re)sent.
pub fn restamp_for_retransmission(msg: &mut [u8], sequence_number: u32, sender_id: u32, receiver_id: u32, confirmed_time_stamp: u32) {
	super::header::rewrite_retransmission_fields(msg, sequence_number, sender_id, receiver_id, confirmed_time_stamp);
}

/// Validate a received buffer: size checks first, then type, then MD4.
pub fn check_message(buf: &[u8], safety: SafetyCodeType, md4_init: Md4InitialValue, md4: &dyn Md4) -> CheckResult {
	if buf.len() < HEADER_LEN {
		return CheckResult::InvalidMessageSize;
	}

	let header = Header::decode(buf);
	let (min, max) = size_bounds(safety);

	if buf.len() != header.message_length as usize || buf.len() < min || buf.len() > max {
		return CheckResult::InvalidMessageSize;
	}

	let trailer_len = safety.trailer_len();
	let body_len = buf.len() - HEADER_LEN - trailer_len;

	if let Some(message_type) = MessageType::from_code(header.message_type) {
		let size_ok = match message_type {
			MessageType::ConnReq | MessageType::ConnResp => body_len == CONN_BODY_LEN,
			MessageType::RetrReq | MessageType::RetrResp | MessageType::Heartbeat => body_len == 0,
			MessageType::DiscReq => body_len == DISC_BODY_LEN,
			MessageType::Data | MessageType::RetrData => {
				body_len >= DATA_BODY_HEADER_LEN && {
					let payload_size = get_u16(buf, HEADER_LEN) as usize;
					(PAYLOAD_LEN_MIN..=PAYLOAD_LEN_MAX).contains(&payload_size) && body_len == DATA_BODY_HEADER_LEN + payload_size
				}
			}
		};

		if !size_ok {
			return CheckResult::InvalidMessageSize;
		}
	} else {
		return CheckResult::InvalidMessageType;
	}

	if trailer_len > 0 {
		let split = buf.len() - trailer_len;
		let expected = md4.calculate(md4_init, &buf[..split]);
		if expected[..trailer_len] != buf[split..] {
			return CheckResult::InvalidMessageMd4;
		}
	}

	CheckResult::NoError
}

pub fn get_message_header(buf: &[u8]) -> Header {
	Header::decode(buf)
}

pub fn get_message_type(buf: &[u8]) -> Option<MessageType> {
	MessageType::from_code(get_u16(buf, 2))
}

pub fn get_message_sequence_number(buf: &[u8]) -> u32 {
	get_message_header(buf).sequence_number
}

/// Pure decoder; never mismatches type by construction since Data and
/// RetrData share the same body layout.
pub fn get_data_message_payload(buf: &[u8]) -> &[u8] {
	let size = get_u16(buf, HEADER_LEN) as usize;
	&buf[HEADER_LEN + DATA_BODY_HEADER_LEN..HEADER_LEN + DATA_BODY_HEADER_LEN + size]
}

pub fn get_conn_message_data(buf: &[u8]) -> Result<ConnMessageData, Fatal> {
	match get_message_type(buf) {
		Some(MessageType::ConnReq) | Some(MessageType::ConnResp) => {
			let mut protocol_version = [0u8; 4];
			protocol_version.copy_from_slice(&buf[HEADER_LEN..HEADER_LEN + 4]);
			Ok(ConnMessageData { protocol_version, n_send_max: get_u16(buf, HEADER_LEN + 4) })
		}
		_ => Err(Fatal::InvalidParameter("get_conn_message_data called on a non-Conn message")),
	}
}

pub fn get_disc_message_data(buf: &[u8]) -> Result<(u16, DisconnectReason), Fatal> {
	match get_message_type(buf) {
		Some(MessageType::DiscReq) => {
			let detailed_reason = get_u16(buf, HEADER_LEN);
			let reason = DisconnectReason::from_code(get_u16(buf, HEADER_LEN + 2))
				.ok_or(Fatal::InvalidParameter("disc message carries an out-of-range reason code"))?;
			Ok((detailed_reason, reason))
		}
		_ => Err(Fatal::InvalidParameter("get_disc_message_data called on a non-Disc message")),
	}
}

/// Each protocol-version digit byte must be `>= '3'`. The original
/// implementation's own test suite accepts `04.03`/`99.99` and rejects
/// `03.02`, i.e. this is a per-digit floor, not a true ordering comparison.
pub fn is_protocol_version_accepted(version: [u8; 4]) -> bool {
	version.iter().all(|&b| b >= b'3')
}
