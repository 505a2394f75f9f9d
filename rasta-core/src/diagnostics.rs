//! Per-connection diagnostics (srdia): error counters and a sliding window
//! of round-trip-delay observations bucketed into four intervals, reported
//! synchronously once the window fills or the connection closes.

use crate::adapter::DiagnosticCounters;

/// `diag_timing_distr_intervals` must be strictly ascending and the last
/// entry must not exceed `t_max`. Referenced from `Config::validate`.
pub fn are_diagnostic_timing_intervals_valid(t_max: u32, intervals: &[u32; 4]) -> bool {
	intervals.windows(2).all(|pair| pair[0] < pair[1]) && intervals[3] <= t_max
}

/// One connection's diagnostic state: error counters plus a round-trip-delay
/// histogram, both reset after every report.
#[derive(Debug, Clone)]
pub struct Diagnostics {
	window_size: u32,
	intervals: [u32; 4],
	counters: DiagnosticCounters,
	histogram: [u32; 4],
	observations: u32,
}

impl Diagnostics {
	pub fn new(window_size: u32, intervals: [u32; 4]) -> Diagnostics {
		Diagnostics {
			window_size,
			intervals,
			counters: DiagnosticCounters::default(),
			histogram: [0; 4],
			observations: 0,
		}
	}

	pub fn record_safety_code_error(&mut self) {
		self.counters.safety_code += 1;
	}

	pub fn record_address_error(&mut self) {
		self.counters.address += 1;
	}

	pub fn record_type_error(&mut self) {
		self.counters.message_type += 1;
	}

	pub fn record_sequence_number_error(&mut self) {
		self.counters.sequence_number += 1;
	}

	pub fn record_confirmed_sequence_number_error(&mut self) {
		self.counters.confirmed_sequence_number += 1;
	}

	/// Bucket one round-trip-delay observation (`t_rtd`, RASW-186)
	/// into the configured intervals and increment the window counter.
	/// Returns `true` once the window has filled, signalling the caller to
	/// fetch and reset the report.
	pub fn record_round_trip_delay(&mut self, t_rtd_ms: u32) -> bool {
		let bucket = self.intervals.iter().position(|&bound| t_rtd_ms <= bound).unwrap_or(3);
		self.histogram[bucket] += 1;
		self.observations += 1;
		self.observations >= self.window_size
	}

	/// Snapshot the current counters and histogram, then reset both: a
	/// report always starts a fresh window.
	pub fn take_report(&mut self) -> (DiagnosticCounters, [u32; 4]) {
		let report = (self.counters, self.histogram);
		self.counters = DiagnosticCounters::default();
		self.histogram = [0; 4];
		self.observations = 0;
		report
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn validates_strictly_ascending_intervals_bounded_by_t_max() {
		assert!(are_diagnostic_timing_intervals_valid(750, &[100, 200, 400, 750]));
		assert!(!are_diagnostic_timing_intervals_valid(750, &[100, 200, 400, 751]));
		assert!(!are_diagnostic_timing_intervals_valid(750, &[100, 200, 200, 750]));
	}

	#[test]
	fn buckets_round_trip_delay_into_configured_intervals() {
		let mut diag = Diagnostics::new(100, [100, 200, 400, 750]);
		diag.record_round_trip_delay(50);
		diag.record_round_trip_delay(150);
		diag.record_round_trip_delay(500);
		diag.record_round_trip_delay(900);

		let (_, histogram) = diag.take_report();
		assert_eq!(histogram, [1, 1, 1, 1]);
	}

	#[test]
	fn window_full_signal_fires_once_observations_reach_window_size() {
		let mut diag = Diagnostics::new(3, [100, 200, 400, 750]);
		assert!(!diag.record_round_trip_delay(10));
		assert!(!diag.record_round_trip_delay(10));
		assert!(diag.record_round_trip_delay(10));
	}

	#[test]
	fn take_report_resets_counters_and_histogram() {
		let mut diag = Diagnostics::new(10, [100, 200, 400, 750]);
		diag.record_sequence_number_error();
		diag.record_round_trip_delay(10);
		let (counters, histogram) = diag.take_report();
		assert_eq!(counters.sequence_number, 1);
		assert_eq!(histogram, [1, 0, 0, 0]);

		let (counters2, histogram2) = diag.take_report();
		assert_eq!(counters2.sequence_number, 0);
		assert_eq!(histogram2, [0; 4]);
	}
}
