//! Fixed point formats used by font rasterizers.

/// Signed 26.6 fixed point: 1/64 pixel units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct F26Dot6(pub i32);

impl F26Dot6 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(64);

    #[inline]
    pub const fn from_int(v: i32) -> Self {
        Self(v << 6)
    }

    #[inline]
    pub fn from_f32(v: f32) -> Self {
        Self((v * 64.0).round() as i32)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 64.0
    }
}

/// Signed 16.16 fixed point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct F16Dot16(pub i32);

impl F16Dot16 {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub fn from_f32(v: f32) -> Self {
        Self((v * 65536.0).round() as i32)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 65536.0
    }
}
