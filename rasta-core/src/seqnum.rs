//! Modulo-2^32 sequence-number arithmetic shared by the send buffer
//! (`remove`/`prepare_buffer_for_retr`) and the connection engine
//! (SNRC/CSI).

/// Distance travelled going from `from` forward to `to`, wrapping at 2^32.
pub fn distance(from: u32, to: u32) -> u32 {
	to.wrapping_sub(from)
}

/// `a <= b` under wraparound, i.e. reaching `b` from `a` takes less than
/// half the number space.
pub fn le(a: u32, b: u32) -> bool {
	distance(a, b) <= u32::MAX / 2
}

/// `a > b` under wraparound.
pub fn gt(a: u32, b: u32) -> bool {
	!le(a, b)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn orders_nearby_values() {
		assert!(le(5, 5));
		assert!(le(5, 6));
		assert!(gt(6, 5));
	}

	#[test]
	fn handles_wraparound() {
		assert!(le(u32::MAX, 0));
		assert!(gt(0, u32::MAX));
	}
}
