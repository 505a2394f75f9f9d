use crate::adapter::BufferUtilisation;
use crate::buffers::{ReceiveBuffer, SendBuffer};
use crate::config::{Config, ConnectionConfig};
use crate::diagnostics::Diagnostics;
use crate::message::{Header, MessageType};

pub(crate) struct ScratchMessage {
	pub header: Header,
	pub message_type: MessageType,
	pub bytes: Vec<u8>,
}

/// One configured connection's full ledger, buffers, and diagnostics.
pub struct Connection {
	pub(crate) connection_id: u32,
	pub(crate) sender_id: u32,
	pub(crate) receiver_id: u32,

	pub(crate) sn_t: u32,
	pub(crate) sn_r: u32,
	pub(crate) cs_t: u32,
	pub(crate) cs_r: u32,
	pub(crate) cs_t_last_sent: u32,

	pub(crate) ts_t: u32,
	pub(crate) ts_r: u32,
	pub(crate) cts_r: u32,
	pub(crate) t_i: u32,

	pub(crate) scratch: Option<ScratchMessage>,
	pub(crate) detailed_disconnect_reason: u16,
	pub(crate) opposite_receive_buffer_size: u32,
	pub(crate) received_data_pending: bool,

	pub(crate) send_buffer: SendBuffer,
	pub(crate) receive_buffer: ReceiveBuffer,
	pub(crate) diagnostics: Diagnostics,
}

impl Connection {
	pub(crate) fn new(cc: &ConnectionConfig, config: &Config) -> Connection {
		Connection {
			connection_id: cc.connection_id,
			sender_id: cc.sender_id,
			receiver_id: cc.receiver_id,

			sn_t: 0,
			sn_r: 0,
			cs_t: 0,
			cs_r: 0,
			cs_t_last_sent: 0,

			ts_t: 0,
			ts_r: 0,
			cts_r: 0,
			t_i: config.t_max,

			scratch: None,
			detailed_disconnect_reason: 0,
			opposite_receive_buffer_size: config.n_send_max as u32,
			received_data_pending: false,

			send_buffer: SendBuffer::new(config.n_send_max as usize),
			receive_buffer: ReceiveBuffer::new(config.n_send_max as usize),
			diagnostics: Diagnostics::new(config.n_diag_window, config.diag_timing_distr_intervals),
		}
	}

	pub fn connection_id(&self) -> u32 {
		self.connection_id
	}

	/// Server role iff `sender_id > receiver_id`.
	pub fn is_conn_role_server(&self) -> bool {
		self.sender_id > self.receiver_id
	}

	pub fn buffer_utilisation(&self) -> BufferUtilisation {
		BufferUtilisation {
			send_used: self.send_buffer.used_entries() as u32,
			send_free: self.send_buffer.free_entries() as u32,
			receive_used: self.receive_buffer.used_entries() as u32,
			receive_free: self.receive_buffer.free_entries() as u32,
		}
	}

	pub fn opposite_receive_buffer_size(&self) -> u32 {
		self.opposite_receive_buffer_size
	}

	pub fn get_received_message_pending_flag(&self) -> bool {
		self.received_data_pending
	}

	pub fn set_received_message_pending_flag(&mut self) {
		self.received_data_pending = true;
	}

	pub fn clear_input_buffer_message_pending_flag(&mut self) {
		self.received_data_pending = false;
	}

	/// Spec §4.4 Queries: pending flag set and both buffers have the
	/// configured minimum headroom.
	pub fn is_received_msg_pending_and_buffers_not_full(&self) -> bool {
		self.received_data_pending && self.receive_buffer.free_entries() >= 1 && self.send_buffer.free_entries() >= 3
	}

	pub fn detailed_disconnect_reason(&self) -> u16 {
		self.detailed_disconnect_reason
	}

	pub fn receive_buffer_mut(&mut self) -> &mut ReceiveBuffer {
		&mut self.receive_buffer
	}
}
