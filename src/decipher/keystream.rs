use crate::{Error, Result};

use super::word32::Word32;

const GOLDEN: Word32 = Word32::from_bits(0x9E37_79B9);

/// The byte-stream recurrences known to be used for obfuscated urls.
///
/// The discriminant is the algorithm id carried in the first byte of
/// the obfuscated payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Algorithm {
  Lcg = 1,
  XorShift = 2,
  Murmur = 3,
  Rotate = 4,
  AddXorShift = 5,
  ShiftedLcg = 6,
  SplitMix = 7,
}

impl Algorithm {
  pub const ALL: [Algorithm; 7] = [
    Algorithm::Lcg,
    Algorithm::XorShift,
    Algorithm::Murmur,
    Algorithm::Rotate,
    Algorithm::AddXorShift,
    Algorithm::ShiftedLcg,
    Algorithm::SplitMix,
  ];

  pub fn id(self) -> u8 {
    self as u8
  }

  /// Advances `state` once and returns the word whose low byte is
  /// emitted.
  fn step(self, state: &mut Word32) -> Word32 {
    let s = *state;
    match self {
      Algorithm::Lcg => {
        *state = s * Word32::new(1_664_525) + Word32::new(1_013_904_223);
        *state
      }
      Algorithm::XorShift => {
        let s = s ^ (s << 13);
        let s = s ^ s.unsigned_shift_right(17);
        *state = s ^ (s << 5);
        *state
      }
      Algorithm::Murmur => {
        *state = s + GOLDEN;
        let e = *state ^ state.unsigned_shift_right(16);
        let e = e * Word32::from_bits(0x85EB_CA77);
        let e = e ^ e.unsigned_shift_right(13);
        let e = e * Word32::from_bits(0xC2B2_AE3D);
        e ^ e.unsigned_shift_right(16)
      }
      Algorithm::Rotate => {
        *state = s + Word32::from_bits(0x6D2B_79F5);
        let e = state.rotate_left(7) + GOLDEN;
        let e = e ^ e.unsigned_shift_right(11);
        e * Word32::from_bits(0x27D4_EB2D)
      }
      Algorithm::AddXorShift => {
        let s = s ^ (s << 7);
        let s = s ^ s.unsigned_shift_right(9);
        let s = s ^ (s << 8);
        *state = s + Word32::from_bits(0xA5A5_A5A5);
        *state
      }
      Algorithm::ShiftedLcg => {
        *state =
          s * Word32::from_bits(0x2C92_77B5) + Word32::from_bits(0xAC56_4B05);
        let mixed = *state ^ state.unsigned_shift_right(18);
        let shift = state.bits() >> 27;
        mixed.unsigned_shift_right(shift)
      }
      Algorithm::SplitMix => {
        *state = s + GOLDEN;
        let e = *state ^ (*state << 5);
        let e = e * Word32::from_bits(0x7FEB_352D);
        let e = e ^ e.unsigned_shift_right(15);
        e * Word32::from_bits(0x846C_A68B)
      }
    }
  }
}

impl TryFrom<u8> for Algorithm {
  type Error = Error;

  fn try_from(id: u8) -> Result<Self> {
    Algorithm::ALL
      .into_iter()
      .find(|algo| algo.id() == id)
      .ok_or(Error::UnknownAlgorithm(id))
  }
}

/// An endless, replayable keystream for one decode call.
#[derive(Clone, Debug)]
pub struct Keystream {
  algorithm: Algorithm,
  state: Word32,
}

impl Keystream {
  pub fn new(algorithm_id: u8, seed: i32) -> Result<Self> {
    let algorithm = Algorithm::try_from(algorithm_id)?;
    Ok(Self::with_state(algorithm, Word32::new(seed)))
  }

  pub fn with_state(algorithm: Algorithm, state: Word32) -> Self {
    Self { algorithm, state }
  }

  pub fn state(&self) -> Word32 {
    self.state
  }

  pub fn next_byte(&mut self) -> u8 {
    self.algorithm.step(&mut self.state).low_byte()
  }

  /// XORs `data` with the stream, consuming one byte per input byte.
  pub fn apply(&mut self, data: &[u8]) -> Vec<u8> {
    data.iter().map(|b| b ^ self.next_byte()).collect()
  }
}

impl Iterator for Keystream {
  type Item = u8;

  fn next(&mut self) -> Option<u8> {
    Some(self.next_byte())
  }
}
