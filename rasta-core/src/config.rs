use crate::diagnostics::are_diagnostic_timing_intervals_valid;
use crate::error::Fatal;

/// Safety-code mode carried in the PDU trailer (RASW-168).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyCodeType {
	None,
	LowerMd4,
	FullMd4,
}

impl SafetyCodeType {
	/// Length in bytes of the trailer this mode appends.
	pub const fn trailer_len(self) -> usize {
		match self {
			SafetyCodeType::None => 0,
			SafetyCodeType::LowerMd4 => 8,
			SafetyCodeType::FullMd4 => 16,
		}
	}
}

/// The MD4 salt applied to every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Md4InitialValue {
	pub a: u32,
	pub b: u32,
	pub c: u32,
	pub d: u32,
}

/// Identity of one configured connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
	pub connection_id: u32,
	pub sender_id: u32,
	pub receiver_id: u32,
}

impl ConnectionConfig {
	/// Server role iff `sender_id > receiver_id`.
	pub fn is_server_role(&self) -> bool {
		self.sender_id > self.receiver_id
	}
}

/// Immutable configuration, validated once at construction.
#[derive(Debug, Clone)]
pub struct Config {
	pub rasta_network_id: u32,
	pub t_max: u32,
	pub t_h: u32,
	pub safety_code_type: SafetyCodeType,
	pub m_w_a: u8,
	pub n_send_max: u8,
	pub n_max_packet: u8,
	pub n_diag_window: u32,
	pub connection_configurations: Vec<ConnectionConfig>,
	pub md4_initial_value: Md4InitialValue,
	pub diag_timing_distr_intervals: [u32; 4],
}

impl Config {
	/// Build a `Config`, running every validation rule up front so that a
	/// returned value is always valid. Mirrors the fail-fast discipline
	/// `srcor_Init` applies before any of the other modules are touched.
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		rasta_network_id: u32,
		t_max: u32,
		t_h: u32,
		safety_code_type: SafetyCodeType,
		m_w_a: u8,
		n_send_max: u8,
		n_max_packet: u8,
		n_diag_window: u32,
		connection_configurations: Vec<ConnectionConfig>,
		md4_initial_value: Md4InitialValue,
		diag_timing_distr_intervals: [u32; 4],
	) -> Result<Config, Fatal> {
		let config = Config {
			rasta_network_id,
			t_max,
			t_h,
			safety_code_type,
			m_w_a,
			n_send_max,
			n_max_packet,
			n_diag_window,
			connection_configurations,
			md4_initial_value,
			diag_timing_distr_intervals,
		};
		config.validate()?;
		Ok(config)
	}

	/// Validate every field. Returns `Fatal::InvalidConfiguration` on the
	/// first rule violated. Exposed separately from `new` so a `Config`
	/// built by `..base()`-style test fixtures can still be checked.
	pub fn validate(&self) -> Result<(), Fatal> {
		if !(750..=2000).contains(&self.t_max) {
			return Err(Fatal::InvalidConfiguration("t_max out of range 750..=2000"));
		}
		if !(300..=750).contains(&self.t_h) {
			return Err(Fatal::InvalidConfiguration("t_h out of range 300..=750"));
		}
		if self.t_h > self.t_max {
			return Err(Fatal::InvalidConfiguration("t_h must not exceed t_max"));
		}
		if !(2..=20).contains(&self.n_send_max) {
			return Err(Fatal::InvalidConfiguration("n_send_max out of range 2..=20"));
		}
		if !(1..=19).contains(&self.m_w_a) {
			return Err(Fatal::InvalidConfiguration("m_w_a out of range 1..=19"));
		}
		if self.m_w_a as u32 >= self.n_send_max as u32 {
			return Err(Fatal::InvalidConfiguration("m_w_a must be less than n_send_max"));
		}
		if self.n_max_packet != 1 {
			return Err(Fatal::InvalidConfiguration("n_max_packet must be 1"));
		}
		if !(100..=10000).contains(&self.n_diag_window) {
			return Err(Fatal::InvalidConfiguration("n_diag_window out of range 100..=10000"));
		}
		if !(1..=2).contains(&self.connection_configurations.len()) {
			return Err(Fatal::InvalidConfiguration("number_of_connections out of range 1..=2"));
		}
		for (idx, conn) in self.connection_configurations.iter().enumerate() {
			if conn.connection_id as usize != idx {
				return Err(Fatal::InvalidConfiguration("connection_configurations must be ordered by connection_id"));
			}
			if conn.sender_id == conn.receiver_id {
				return Err(Fatal::InvalidConfiguration("sender_id must differ from receiver_id"));
			}
		}
		if !are_diagnostic_timing_intervals_valid(self.t_max, &self.diag_timing_distr_intervals) {
			return Err(Fatal::InvalidConfiguration("diag_timing_distr_intervals must be strictly ascending and bounded by t_max"));
		}

		Ok(())
	}

	pub fn number_of_connections(&self) -> usize {
		self.connection_configurations.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base() -> Config {
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

	#[test]
	fn accepts_default_config() {
		assert!(base().validate().is_ok());
	}

	#[test]
	fn rejects_heartbeat_period_above_t_max() {
		let mut cfg = base();
		cfg.t_max = 750;
		cfg.t_h = 751;
		assert!(cfg.validate().is_err());
	}

	#[test]
	fn rejects_m_w_a_not_below_n_send_max() {
		let mut cfg = base();
		cfg.n_send_max = 10;
		cfg.m_w_a = 10;
		assert!(cfg.validate().is_err());
	}

	#[test]
	fn rejects_equal_sender_and_receiver() {
		let mut cfg = base();
		cfg.connection_configurations[0].receiver_id = 0x61;
		assert!(cfg.validate().is_err());
	}

	#[test]
	fn new_accepts_a_valid_configuration() {
		let cfg = base();
		let built = Config::new(
			cfg.rasta_network_id,
			cfg.t_max,
			cfg.t_h,
			cfg.safety_code_type,
			cfg.m_w_a,
			cfg.n_send_max,
			cfg.n_max_packet,
			cfg.n_diag_window,
			cfg.connection_configurations.clone(),
			cfg.md4_initial_value,
			cfg.diag_timing_distr_intervals,
		);
		assert!(built.is_ok());
	}

	#[test]
	fn new_rejects_an_invalid_configuration() {
		let cfg = base();
		let built = Config::new(
			cfg.rasta_network_id,
			cfg.t_max,
			751,
			cfg.safety_code_type,
			cfg.m_w_a,
			cfg.n_send_max,
			cfg.n_max_packet,
			cfg.n_diag_window,
			cfg.connection_configurations.clone(),
			cfg.md4_initial_value,
			cfg.diag_timing_distr_intervals,
		);
		assert!(built.is_err());
	}
}
