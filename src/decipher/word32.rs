use std::fmt;
use std::ops::{Add, BitOr, BitXor, Mul, Shl};

/// A 32-bit signed register with JavaScript `ToInt32` semantics.
///
/// Every operation wraps, so the value observed after each step is
/// always the one a JS engine would hold in an int32 slot.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Word32(i32);

impl Word32 {
  pub const fn new(value: i32) -> Self {
    Self(value)
  }

  /// Reinterprets an unsigned bit pattern, e.g. a hex constant above
  /// `i32::MAX`.
  pub const fn from_bits(bits: u32) -> Self {
    Self(bits as i32)
  }

  /// Keeps the low 32 bits of `n` and reads them as signed.
  pub const fn normalize(n: i64) -> Self {
    Self(n as i32)
  }

  pub const fn get(self) -> i32 {
    self.0
  }

  pub const fn bits(self) -> u32 {
    self.0 as u32
  }

  pub const fn wrapping_add(self, rhs: Self) -> Self {
    Self(self.0.wrapping_add(rhs.0))
  }

  pub const fn wrapping_mul(self, rhs: Self) -> Self {
    Self(self.0.wrapping_mul(rhs.0))
  }

  pub const fn xor(self, rhs: Self) -> Self {
    Self(self.0 ^ rhs.0)
  }

  /// `<<` with the shift count masked to 5 bits, as in JS.
  pub const fn shift_left(self, n: u32) -> Self {
    Self(self.0.wrapping_shl(n))
  }

  /// `>>>`: shifts the unsigned bit pattern, then reads it back as signed.
  pub const fn unsigned_shift_right(self, n: u32) -> Self {
    Self::from_bits(self.bits().wrapping_shr(n))
  }

  pub const fn rotate_left(self, n: u32) -> Self {
    Self::from_bits(self.bits().rotate_left(n))
  }

  pub const fn low_byte(self) -> u8 {
    self.0 as u8
  }
}

impl From<i32> for Word32 {
  fn from(value: i32) -> Self {
    Self(value)
  }
}

impl Add for Word32 {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    self.wrapping_add(rhs)
  }
}

impl Mul for Word32 {
  type Output = Self;

  fn mul(self, rhs: Self) -> Self {
    self.wrapping_mul(rhs)
  }
}

impl BitXor for Word32 {
  type Output = Self;

  fn bitxor(self, rhs: Self) -> Self {
    self.xor(rhs)
  }
}

impl BitOr for Word32 {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self {
    Self(self.0 | rhs.0)
  }
}

impl Shl<u32> for Word32 {
  type Output = Self;

  fn shl(self, n: u32) -> Self {
    self.shift_left(n)
  }
}

impl fmt::Debug for Word32 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Word32({} / {:#010x})", self.0, self.bits())
  }
}
