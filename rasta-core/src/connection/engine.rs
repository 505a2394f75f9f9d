//! The connection engine (`srcor`): per-connection state, the receive and
//! transmission pipelines, retransmission, and disconnection.
//! Single-threaded and cooperative — every method returns synchronously and
//! no internal timer fires on its own; the upper layer drives this in a
//! tick-like loop.

use super::state::{Connection, ScratchMessage};
use crate::adapter::{BufferUtilisation, NotificationSink, RedundancyChannel, SystemAdapter};
use crate::config::Config;
use crate::error::Fatal;
use crate::md4::Md4;
use crate::message::{
	check_message, create_conn_req_message, create_conn_resp_message, create_data_message, create_disc_req_message, create_heartbeat_message,
	create_retr_data_message, create_retr_req_message, get_conn_message_data, get_data_message_payload, get_message_header, get_message_type,
	is_protocol_version_accepted, update_message_header, CheckResult, DisconnectReason, HeaderFields, MessageType, PROTOCOL_VERSION,
};
use crate::seqnum;

/// One outcome of `receive_message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
	None,
	ConnReqReceived,
	ConnRespReceived,
	RetrReqReceived,
	RetrRespReceived,
	DiscReqReceived,
	HbReceived,
	DataReceived,
	RetrDataReceived,
}

/// The four external collaborators the engine is generic over.
/// Monomorphized per host rather than boxed, since a process wires up
/// exactly one adapter/system/sink/MD4 combination for its lifetime.
pub struct Engine<C, S, N, M> {
	config: Option<Config>,
	connections: Vec<Connection>,
	channel: C,
	system: S,
	sink: N,
	md4: M,
}

impl<C: RedundancyChannel, S: SystemAdapter, N: NotificationSink, M: Md4> Engine<C, S, N, M> {
	pub fn new(channel: C, system: S, sink: N, md4: M) -> Self {
		Engine { config: None, connections: Vec::new(), channel, system, sink, md4 }
	}

	/// Idempotent-hostile: a second call raises `AlreadyInitialized`.
	pub fn init(&mut self, config: Config) -> Result<(), Fatal> {
		if self.config.is_some() {
			return Err(Fatal::AlreadyInitialized);
		}

		config.validate()?;
		self.connections = config.connection_configurations.iter().map(|cc| Connection::new(cc, &config)).collect();
		self.config = Some(config);
		Ok(())
	}

	fn config(&self) -> Result<&Config, Fatal> {
		self.config.as_ref().ok_or(Fatal::NotInitialized)
	}

	fn connection(&self, conn_id: u32) -> Result<&Connection, Fatal> {
		self.connections.get(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))
	}

	pub fn connection_state(&self, conn_id: u32) -> Result<&Connection, Fatal> {
		self.connection(conn_id)
	}

	pub fn init_connection_data(&mut self, conn_id: u32) -> Result<(), Fatal> {
		let config = self.config.as_ref().ok_or(Fatal::NotInitialized)?;
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		self.channel.open(conn.connection_id)?;
		conn.sn_t = self.system.random_u32();
		conn.t_i = config.t_max;

		if !conn.is_conn_role_server() {
			conn.cs_t = 0;
			conn.cts_r = self.system.now_ms();
		}

		Ok(())
	}

	/// Returns the event raised by the message now sitting in the scratch
	/// slot, plus `sn_in_seq`/`cts_in_seq` from the SNC and CTSI checks.
	pub fn receive_message(&mut self, conn_id: u32) -> Result<(Event, bool, bool), Fatal> {
		let config = self.config.as_ref().ok_or(Fatal::NotInitialized)?;
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		let bytes = match self.channel.read(conn.connection_id)? {
			Some(bytes) => bytes,
			None => {
				conn.received_data_pending = false;
				return Ok((Event::None, false, false));
			}
		};

		match check_message(&bytes, config.safety_code_type, config.md4_initial_value, &self.md4) {
			CheckResult::InvalidMessageSize => {
				log::warn!("dropping message of invalid size on connection {}", conn.connection_id);
				return Ok((Event::None, false, false));
			}
			CheckResult::InvalidMessageType => {
				log::warn!("dropping message of unrecognized type on connection {}", conn.connection_id);
				conn.diagnostics.record_type_error();
				return Ok((Event::None, false, false));
			}
			CheckResult::InvalidMessageMd4 => {
				log::warn!("dropping message with invalid safety code on connection {}", conn.connection_id);
				conn.diagnostics.record_safety_code_error();
				return Ok((Event::None, false, false));
			}
			CheckResult::NoError => {}
		}

		let header = get_message_header(&bytes);
		let message_type = get_message_type(&bytes).expect("check_message already confirmed the type code is one of the eight");

		if header.sender_id != conn.receiver_id || header.receiver_id != conn.sender_id {
			log::warn!("dropping message with unexpected sender/receiver id on connection {}", conn.connection_id);
			conn.diagnostics.record_address_error();
			return Ok((Event::None, false, false));
		}

		if !message_type.bypasses_snrc() && seqnum::distance(conn.sn_r, header.sequence_number) > 10 * config.n_send_max as u32 {
			log::warn!("dropping message too far outside the receive window on connection {}", conn.connection_id);
			return Ok((Event::None, false, false));
		}

		let csi_ok = match message_type {
			MessageType::ConnReq => header.confirmed_sequence_number == 0,
			MessageType::ConnResp => header.confirmed_sequence_number == conn.sn_t.wrapping_sub(1),
			_ => seqnum::distance(conn.cs_r, header.confirmed_sequence_number) <= seqnum::distance(conn.cs_r, conn.sn_t.wrapping_sub(1)),
		};
		if !csi_ok {
			log::warn!("dropping message with out-of-range confirmed sequence number on connection {}", conn.connection_id);
			conn.diagnostics.record_confirmed_sequence_number_error();
			return Ok((Event::None, false, false));
		}

		let sn_in_seq = if message_type.always_in_sequence() {
			true
		} else {
			let in_seq = header.sequence_number == conn.sn_r;
			if !in_seq && message_type.is_data_bearing() {
				log::warn!("data-bearing message arrived out of sequence on connection {}", conn.connection_id);
				conn.diagnostics.record_sequence_number_error();
			}
			in_seq
		};

		let cts_in_seq = !message_type.is_time_relevant() || seqnum::distance(conn.cts_r, header.confirmed_time_stamp) < config.t_max;

		let event = event_for(message_type);
		conn.scratch = Some(ScratchMessage { header, message_type, bytes });

		Ok((event, sn_in_seq, cts_in_seq))
	}

	/// Consumes the scratch slot populated by `receive_message`.
	pub fn process_received_message(&mut self, conn_id: u32) -> Result<bool, Fatal> {
		let config = self.config.as_ref().ok_or(Fatal::NotInitialized)?;
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		let scratch = conn.scratch.take().ok_or(Fatal::InternalError("process_received_message called with an empty scratch slot"))?;
		let header = scratch.header;
		let message_type = scratch.message_type;

		let now = self.system.now_ms();
		let granularity = self.system.timer_granularity_ms();

		if message_type.is_time_relevant() {
			let t_rtd = now.wrapping_add(granularity).wrapping_sub(header.confirmed_time_stamp);
			if t_rtd > config.t_max {
				return Ok(false);
			}
		}

		conn.sn_r = header.sequence_number.wrapping_add(1);
		conn.cs_t = header.sequence_number;
		conn.ts_r = header.time_stamp;

		match message_type {
			MessageType::ConnReq => {
				conn.cts_r = now;
				conn.cs_r = conn.sn_t.wrapping_sub(1);
			}
			_ if message_type.is_time_relevant() => {
				let t_rtd = now.wrapping_add(granularity).wrapping_sub(header.confirmed_time_stamp);
				conn.cts_r = header.confirmed_time_stamp;
				conn.cs_r = header.confirmed_sequence_number;
				conn.t_i = config.t_max.saturating_sub(t_rtd);

				if conn.diagnostics.record_round_trip_delay(t_rtd) {
					let (counters, histogram) = conn.diagnostics.take_report();
					self.sink.diagnostic_notification(conn.connection_id, counters, histogram);
				}
			}
			_ => {
				if header.confirmed_sequence_number != conn.cs_r {
					conn.cs_r = header.confirmed_sequence_number;
					conn.send_buffer.remove(conn.cs_r);
				}
			}
		}

		if matches!(message_type, MessageType::Data | MessageType::RetrData) {
			conn.receive_buffer.add(get_data_message_payload(&scratch.bytes).to_vec())?;
			conn.set_received_message_pending_flag();
		}

		if matches!(message_type, MessageType::Heartbeat | MessageType::RetrResp | MessageType::Data | MessageType::RetrData) {
			let no_outgoing_queued = conn.send_buffer.number_of_messages_to_send() == 0;
			if seqnum::distance(conn.cs_t_last_sent, conn.cs_t) >= config.m_w_a as u32 && no_outgoing_queued {
				enqueue_heartbeat(config, conn, &self.md4)?;
			}
		}
		send_pending_messages(config, conn, &mut self.channel, &self.system, &self.md4)?;

		Ok(true)
	}

	pub fn send_data_message(&mut self, conn_id: u32, payload: &[u8]) -> Result<(), Fatal> {
		let config = self.config.as_ref().ok_or(Fatal::NotInitialized)?;
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		let h = header_fields(conn);
		let msg = create_data_message(h, payload, config.safety_code_type, config.md4_initial_value, &self.md4)?;
		conn.send_buffer.add(conn.sn_t, msg)?;
		conn.sn_t = conn.sn_t.wrapping_add(1);

		send_pending_messages(config, conn, &mut self.channel, &self.system, &self.md4)
	}

	pub fn send_retr_data_message(&mut self, conn_id: u32, payload: &[u8]) -> Result<(), Fatal> {
		let config = self.config.as_ref().ok_or(Fatal::NotInitialized)?;
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		let h = header_fields(conn);
		let msg = create_retr_data_message(h, payload, config.safety_code_type, config.md4_initial_value, &self.md4)?;
		conn.send_buffer.add(conn.sn_t, msg)?;
		conn.sn_t = conn.sn_t.wrapping_add(1);

		send_pending_messages(config, conn, &mut self.channel, &self.system, &self.md4)
	}

	pub fn send_conn_req_message(&mut self, conn_id: u32) -> Result<(), Fatal> {
		let config = self.config.as_ref().ok_or(Fatal::NotInitialized)?;
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		conn.cts_r = 0;
		let h = HeaderFields { sender_id: conn.sender_id, receiver_id: conn.receiver_id, sequence_number: conn.sn_t, confirmed_time_stamp: 0 };
		let msg = create_conn_req_message(h, PROTOCOL_VERSION, config.n_send_max as u16, config.safety_code_type, config.md4_initial_value, &self.md4)?;
		conn.send_buffer.add(conn.sn_t, msg)?;
		conn.sn_t = conn.sn_t.wrapping_add(1);

		send_pending_messages(config, conn, &mut self.channel, &self.system, &self.md4)
	}

	pub fn send_conn_resp_message(&mut self, conn_id: u32) -> Result<(), Fatal> {
		let config = self.config.as_ref().ok_or(Fatal::NotInitialized)?;
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		let h = header_fields(conn);
		let msg = create_conn_resp_message(h, PROTOCOL_VERSION, config.n_send_max as u16, config.safety_code_type, config.md4_initial_value, &self.md4)?;
		conn.send_buffer.add(conn.sn_t, msg)?;
		conn.sn_t = conn.sn_t.wrapping_add(1);

		send_pending_messages(config, conn, &mut self.channel, &self.system, &self.md4)
	}

	pub fn send_hb_message(&mut self, conn_id: u32) -> Result<(), Fatal> {
		let config = self.config.as_ref().ok_or(Fatal::NotInitialized)?;
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		enqueue_heartbeat(config, conn, &self.md4)?;
		send_pending_messages(config, conn, &mut self.channel, &self.system, &self.md4)
	}

	pub fn send_retr_req_message(&mut self, conn_id: u32) -> Result<(), Fatal> {
		let config = self.config.as_ref().ok_or(Fatal::NotInitialized)?;
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		let h = header_fields(conn);
		let msg = create_retr_req_message(h, config.safety_code_type, config.md4_initial_value, &self.md4);
		conn.send_buffer.add(conn.sn_t, msg)?;
		conn.sn_t = conn.sn_t.wrapping_add(1);

		send_pending_messages(config, conn, &mut self.channel, &self.system, &self.md4)
	}

	/// Sent synchronously, outside the pending-message queue.
	pub fn send_disc_req_message(&mut self, conn_id: u32, detailed_reason: u16, reason: DisconnectReason) -> Result<(), Fatal> {
		let config = self.config.as_ref().ok_or(Fatal::NotInitialized)?;
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		let h = header_fields(conn);
		let msg = create_disc_req_message(h, detailed_reason, reason, config.safety_code_type, config.md4_initial_value, &self.md4);
		conn.sn_t = conn.sn_t.wrapping_add(1);
		conn.detailed_disconnect_reason = detailed_reason;

		self.channel.send(conn.connection_id, &msg)?;
		conn.send_buffer = crate::buffers::SendBuffer::new(config.n_send_max as usize);
		self.channel.close(conn.connection_id)?;

		let (counters, histogram) = conn.diagnostics.take_report();
		self.sink.diagnostic_notification(conn.connection_id, counters, histogram);

		let utilisation = conn.buffer_utilisation();
		self.sink
			.connection_state_notification(conn.connection_id, utilisation, conn.opposite_receive_buffer_size, reason, detailed_reason);

		Ok(())
	}

	/// Renumbers the unconfirmed tail of the send buffer starting at
	/// `SN_T` and advances `SN_T` past it.
	pub fn handle_retr_req(&mut self, conn_id: u32) -> Result<(), Fatal> {
		let conn = self.connections.get_mut(conn_id as usize).ok_or(Fatal::InvalidParameter("connection_id out of range"))?;

		let header_template = HeaderFields {
			sender_id: conn.sender_id,
			receiver_id: conn.receiver_id,
			sequence_number: conn.sn_t,
			confirmed_time_stamp: conn.ts_r,
		};

		let mut last_sn = conn.sn_t.wrapping_sub(1);
		conn.send_buffer.prepare_buffer_for_retr(conn.cs_r, header_template, &mut last_sn);
		conn.sn_t = last_sn.wrapping_add(1);

		Ok(())
	}

	/// Only meaningful when the scratch slot holds a RetrReq.
	pub fn is_retr_req_sequence_number_available(&self, conn_id: u32) -> Result<bool, Fatal> {
		let conn = self.connection(conn_id)?;
		Ok(match &conn.scratch {
			Some(scratch) if scratch.message_type == MessageType::RetrReq => {
				conn.send_buffer.is_sequence_number_in_buffer(scratch.header.confirmed_sequence_number.wrapping_add(1))
			}
			_ => false,
		})
	}

	pub fn is_message_timeout(&self, conn_id: u32) -> Result<bool, Fatal> {
		let conn = self.connection(conn_id)?;
		Ok(seqnum::distance(conn.cts_r, self.system.now_ms()) > conn.t_i)
	}

	pub fn is_heartbeat_interval(&self, conn_id: u32) -> Result<bool, Fatal> {
		let config = self.config()?;
		let conn = self.connection(conn_id)?;
		Ok(seqnum::distance(conn.ts_t, self.system.now_ms()) >= config.t_h)
	}

	pub fn get_connection_id(&self, sender_id: u32, receiver_id: u32) -> Result<u32, Fatal> {
		let config = self.config()?;
		config
			.connection_configurations
			.iter()
			.find(|cc| cc.sender_id == sender_id && cc.receiver_id == receiver_id)
			.map(|cc| cc.connection_id)
			.ok_or(Fatal::InvalidParameter("no connection configured for that sender/receiver pair"))
	}

	pub fn is_conn_role_server(&self, conn_id: u32) -> Result<bool, Fatal> {
		Ok(self.connection(conn_id)?.is_conn_role_server())
	}

	/// Scratch slot's ConnReq/ConnResp protocol version: fatal if the
	/// scratch slot isn't holding one of those.
	pub fn is_protocol_version_accepted(&self, conn_id: u32) -> Result<bool, Fatal> {
		let conn = self.connection(conn_id)?;
		let scratch = conn.scratch.as_ref().ok_or(Fatal::InternalError("is_protocol_version_accepted called with an empty scratch slot"))?;
		let conn_data = get_conn_message_data(&scratch.bytes)?;
		Ok(is_protocol_version_accepted(conn_data.protocol_version))
	}

	pub fn get_buffer_size_and_utilisation(&self, conn_id: u32) -> Result<(BufferUtilisation, u32), Fatal> {
		let conn = self.connection(conn_id)?;
		Ok((conn.buffer_utilisation(), conn.opposite_receive_buffer_size))
	}
}

fn event_for(message_type: MessageType) -> Event {
	match message_type {
		MessageType::ConnReq => Event::ConnReqReceived,
		MessageType::ConnResp => Event::ConnRespReceived,
		MessageType::RetrReq => Event::RetrReqReceived,
		MessageType::RetrResp => Event::RetrRespReceived,
		MessageType::DiscReq => Event::DiscReqReceived,
		MessageType::Heartbeat => Event::HbReceived,
		MessageType::Data => Event::DataReceived,
		MessageType::RetrData => Event::RetrDataReceived,
	}
}

fn header_fields(conn: &Connection) -> HeaderFields {
	HeaderFields { sender_id: conn.sender_id, receiver_id: conn.receiver_id, sequence_number: conn.sn_t, confirmed_time_stamp: conn.ts_r }
}

fn enqueue_heartbeat<M: Md4>(config: &Config, conn: &mut Connection, md4: &M) -> Result<(), Fatal> {
	let h = header_fields(conn);
	let msg = create_heartbeat_message(h, config.safety_code_type, config.md4_initial_value, md4);
	conn.send_buffer.add(conn.sn_t, msg)?;
	conn.sn_t = conn.sn_t.wrapping_add(1);
	Ok(())
}

/// Spec §4.4 "Transmission pipeline": drain as many buffered PDUs as the
/// peer's announced receive-buffer headroom allows.
fn send_pending_messages<C: RedundancyChannel, S: SystemAdapter, M: Md4>(
	config: &Config,
	conn: &mut Connection,
	channel: &mut C,
	system: &S,
	md4: &M,
) -> Result<(), Fatal> {
	loop {
		let messages_to_send = conn.send_buffer.number_of_messages_to_send();
		let used = conn.send_buffer.used_entries();
		let allow_send = conn.opposite_receive_buffer_size as usize > used.saturating_sub(messages_to_send) && messages_to_send > 0;
		if !allow_send {
			break;
		}

		let now = system.now_ms();
		let cs_t = conn.cs_t;
		let confirmed_sequence_number;

		{
			let msg = conn
				.send_buffer
				.read_message_to_send()
				.ok_or(Fatal::InternalError("send buffer reported a message to send but produced none"))?;
			let message_type = get_message_type(msg).ok_or(Fatal::InternalError("send buffer entry has an unrecognized message type"))?;
			confirmed_sequence_number = if message_type == MessageType::ConnReq { 0 } else { cs_t };
			update_message_header(msg, now, confirmed_sequence_number, config.safety_code_type, config.md4_initial_value, md4);
			channel.send(conn.connection_id, msg)?;
		}

		conn.ts_t = now;
		conn.cs_t_last_sent = confirmed_sequence_number;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::adapter::DiagnosticCounters;
	use crate::config::{ConnectionConfig, Md4InitialValue, SafetyCodeType};
	use crate::md4::DefaultMd4;
	use std::collections::VecDeque;

	struct FakeChannel {
		outbound: Vec<Vec<u8>>,
		inbound: VecDeque<Vec<u8>>,
		opened: Vec<u32>,
		closed: Vec<u32>,
	}

	impl FakeChannel {
		fn new() -> FakeChannel {
			FakeChannel { outbound: Vec::new(), inbound: VecDeque::new(), opened: Vec::new(), closed: Vec::new() }
		}
	}

	impl RedundancyChannel for FakeChannel {
		fn open(&mut self, channel_id: u32) -> Result<(), Fatal> {
			self.opened.push(channel_id);
			Ok(())
		}
		fn close(&mut self, channel_id: u32) -> Result<(), Fatal> {
			self.closed.push(channel_id);
			Ok(())
		}
		fn send(&mut self, _channel_id: u32, bytes: &[u8]) -> Result<(), Fatal> {
			self.outbound.push(bytes.to_vec());
			Ok(())
		}
		fn read(&mut self, _channel_id: u32) -> Result<Option<Vec<u8>>, Fatal> {
			Ok(self.inbound.pop_front())
		}
	}

	struct FakeSystem {
		now: u32,
		granularity: u32,
		next_random: u32,
	}

	impl SystemAdapter for FakeSystem {
		fn now_ms(&self) -> u32 {
			self.now
		}
		fn timer_granularity_ms(&self) -> u32 {
			self.granularity
		}
		fn random_u32(&mut self) -> u32 {
			self.next_random
		}
		fn fatal_error(&self, _err: &Fatal) {}
	}

	#[derive(Default)]
	struct FakeSink {
		state_notifications: Vec<(u32, BufferUtilisation, u32, DisconnectReason, u16)>,
		diagnostic_notifications: Vec<(u32, DiagnosticCounters, [u32; 4])>,
	}

	impl NotificationSink for FakeSink {
		fn connection_state_notification(
			&mut self,
			connection_id: u32,
			utilisation: BufferUtilisation,
			opposite_buffer_size: u32,
			disc_reason: DisconnectReason,
			detailed_disc_reason: u16,
		) {
			self.state_notifications.push((connection_id, utilisation, opposite_buffer_size, disc_reason, detailed_disc_reason));
		}

		fn diagnostic_notification(&mut self, connection_id: u32, counters: DiagnosticCounters, histogram: [u32; 4]) {
			self.diagnostic_notifications.push((connection_id, counters, histogram));
		}
	}

	fn default_config() -> Config {
		Config {
			rasta_network_id: 1,
			t_max: 750,
			t_h: 300,
			safety_code_type: SafetyCodeType::LowerMd4,
			m_w_a: 10,
			n_send_max: 20,
			n_max_packet: 1,
			n_diag_window: 100,
			connection_configurations: vec![ConnectionConfig { connection_id: 0, sender_id: 0x61, receiver_id: 0x62 }],
			md4_initial_value: Md4InitialValue { a: 0x67452301, b: 0xEFCDAB89, c: 0x98BADCFE, d: 0x10325476 },
			diag_timing_distr_intervals: [100, 200, 400, 750],
		}
	}

	fn new_engine(now: u32, random: u32) -> Engine<FakeChannel, FakeSystem, FakeSink, DefaultMd4> {
		let mut engine = Engine::new(FakeChannel::new(), FakeSystem { now, granularity: 0, next_random: random }, FakeSink::default(), DefaultMd4);
		engine.init(default_config()).unwrap();
		engine
	}

	#[test]
	fn client_open_seeds_ledger_from_random_source() {
		let mut engine = new_engine(1000, 1234);
		engine.init_connection_data(0).unwrap();

		let conn = engine.connection_state(0).unwrap();
		assert_eq!(conn.sn_t, 1234);
		assert_eq!(conn.cs_t, 0);
		assert_eq!(conn.cts_r, 1000);
		assert_eq!(conn.t_i, 750);
		assert_eq!(engine.channel.opened, vec![0]);
	}

	#[test]
	fn second_init_is_fatal() {
		let mut engine = new_engine(1000, 1234);
		assert_eq!(engine.init(default_config()), Err(Fatal::AlreadyInitialized));
	}

	#[test]
	fn conn_req_zeros_confirmed_fields_and_advances_sn_t() {
		let mut engine = new_engine(1000, 1234);
		engine.init_connection_data(0).unwrap();
		engine.send_conn_req_message(0).unwrap();

		assert_eq!(engine.connection_state(0).unwrap().sn_t, 1235);
		assert_eq!(engine.connection_state(0).unwrap().cts_r, 0);
		assert_eq!(engine.channel.outbound.len(), 1);

		let header = get_message_header(&engine.channel.outbound[0]);
		assert_eq!(header.confirmed_sequence_number, 0);
		assert_eq!(header.confirmed_time_stamp, 0);
	}

	#[test]
	fn retransmission_renumbers_unconfirmed_tail() {
		let mut engine = new_engine(1000, 100);
		{
			let conn = &mut engine.connections[0];
			conn.sn_t = 103;
			conn.cs_r = 99;
			conn.send_buffer.add(100, vec![0u8; 36]).unwrap();
			conn.send_buffer.add(101, vec![0u8; 36]).unwrap();
			conn.send_buffer.add(102, vec![0u8; 36]).unwrap();
		}

		engine.handle_retr_req(0).unwrap();

		let conn = engine.connection_state(0).unwrap();
		assert!(conn.send_buffer.is_sequence_number_in_buffer(103));
		assert!(conn.send_buffer.is_sequence_number_in_buffer(104));
		assert!(conn.send_buffer.is_sequence_number_in_buffer(105));
		assert_eq!(conn.sn_t, 106);
	}

	#[test]
	fn data_message_payload_is_delivered_and_sets_pending_flag() {
		let mut engine = new_engine(0, 100);
		{
			let conn = &mut engine.connections[0];
			conn.sn_r = 5;
			conn.cs_r = 10;
			conn.sn_t = 50;
		}

		let h = HeaderFields { sender_id: 0x62, receiver_id: 0x61, sequence_number: 5, confirmed_time_stamp: 0 };
		let mut msg = create_data_message(h, &[0xAB, 0xCD], SafetyCodeType::LowerMd4, default_config().md4_initial_value, &DefaultMd4).unwrap();
		update_message_header(&mut msg, 0, 10, SafetyCodeType::LowerMd4, default_config().md4_initial_value, &DefaultMd4);
		engine.channel.inbound.push_back(msg);

		let (event, sn_in_seq, cts_in_seq) = engine.receive_message(0).unwrap();
		assert_eq!(event, Event::DataReceived);
		assert!(sn_in_seq);
		assert!(cts_in_seq);
		assert!(engine.process_received_message(0).unwrap());

		let conn = &mut engine.connections[0];
		assert!(conn.get_received_message_pending_flag());
		assert_eq!(conn.receive_buffer_mut().read(), Some(vec![0xAB, 0xCD]));
	}
}
