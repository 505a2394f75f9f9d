//! MD4 safety code (RFC 1320), salted with a configured initial value.
//!
//! DIN VDE V 0831-200 treats the MD4 primitive as an external collaborator —
//! its contract (`calculate_md4(salt, size, &bytes, &mut out16)`) is what the
//! codec depends on, not a particular implementation (RASW-168). No
//! published `md4`-family crate exposes a hook to replace MD4's four
//! standard IV words with a configured salt (`md4_initial_value`), which is
//! required here, so `DefaultMd4` below implements the compression function
//! directly rather than reaching for `digest::Digest` the way the teacher's
//! `noise::hash::Hash` wraps `blake2::Blake2s256`.

use crate::config::Md4InitialValue;

/// Computes a 16-byte MD4 digest seeded with a configured initial state.
pub trait Md4 {
	fn calculate(&self, initial: Md4InitialValue, data: &[u8]) -> [u8; 16];
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMd4;

impl Md4 for DefaultMd4 {
	fn calculate(&self, initial: Md4InitialValue, data: &[u8]) -> [u8; 16] {
		md4_digest(initial, data)
	}
}

const S11: u32 = 3;
const S12: u32 = 7;
const S13: u32 = 11;
const S14: u32 = 19;
const S21: u32 = 3;
const S22: u32 = 5;
const S23: u32 = 9;
const S24: u32 = 13;
const S31: u32 = 3;
const S32: u32 = 9;
const S33: u32 = 11;
const S34: u32 = 15;

#[inline(always)]
fn f(x: u32, y: u32, z: u32) -> u32 {
	(x & y) | (!x & z)
}

#[inline(always)]
fn g(x: u32, y: u32, z: u32) -> u32 {
	(x & y) | (x & z) | (y & z)
}

#[inline(always)]
fn h(x: u32, y: u32, z: u32) -> u32 {
	x ^ y ^ z
}

#[inline(always)]
fn ff(a: u32, b: u32, c: u32, d: u32, x: u32, s: u32) -> u32 {
	a.wrapping_add(f(b, c, d)).wrapping_add(x).rotate_left(s)
}

#[inline(always)]
fn gg(a: u32, b: u32, c: u32, d: u32, x: u32, s: u32) -> u32 {
	a.wrapping_add(g(b, c, d)).wrapping_add(x).wrapping_add(0x5A82_7999).rotate_left(s)
}

#[inline(always)]
fn hh(a: u32, b: u32, c: u32, d: u32, x: u32, s: u32) -> u32 {
	a.wrapping_add(h(b, c, d)).wrapping_add(x).wrapping_add(0x6ED9_EBA1).rotate_left(s)
}

/// Pad `data` to a multiple of 64 bytes per RFC 1320 §3.1/§3.2.
fn pad(data: &[u8]) -> Vec<u8> {
	let bit_len = (data.len() as u64).wrapping_mul(8);

	let mut out = data.to_vec();
	out.push(0x80);

	while out.len() % 64 != 56 {
		out.push(0);
	}

	out.extend_from_slice(&bit_len.to_le_bytes());
	out
}

fn compress(state: &mut [u32; 4], block: &[u8]) {
	let mut x = [0u32; 16];
	for (i, word) in x.iter_mut().enumerate() {
		*word = u32::from_le_bytes(block[i * 4..i * 4 + 4].try_into().unwrap());
	}

	let [mut a, mut b, mut c, mut d] = *state;

	// Round 1
	for &i in &[0, 4, 8, 12] {
		a = ff(a, b, c, d, x[i], S11);
		d = ff(d, a, b, c, x[i + 1], S12);
		c = ff(c, d, a, b, x[i + 2], S13);
		b = ff(b, c, d, a, x[i + 3], S14);
	}

	// Round 2
	for i in 0..4 {
		a = gg(a, b, c, d, x[i], S21);
		d = gg(d, a, b, c, x[i + 4], S22);
		c = gg(c, d, a, b, x[i + 8], S23);
		b = gg(b, c, d, a, x[i + 12], S24);
	}

	// Round 3
	for &i in &[0, 2, 1, 3] {
		a = hh(a, b, c, d, x[i], S31);
		d = hh(d, a, b, c, x[i + 8], S32);
		c = hh(c, d, a, b, x[i + 4], S33);
		b = hh(b, c, d, a, x[i + 12], S34);
	}

	state[0] = state[0].wrapping_add(a);
	state[1] = state[1].wrapping_add(b);
	state[2] = state[2].wrapping_add(c);
	state[3] = state[3].wrapping_add(d);
}

pub fn md4_digest(initial: Md4InitialValue, data: &[u8]) -> [u8; 16] {
	let mut state = [initial.a, initial.b, initial.c, initial.d];

	let padded = pad(data);
	for block in padded.chunks_exact(64) {
		compress(&mut state, block);
	}

	let mut out = [0u8; 16];
	for (i, word) in state.iter().enumerate() {
		out[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
	}
	out
}
