//! Sample buffers of four numeric kinds and their one-way promotion.
//!
//! A [`SampleBuffer`] is a homogeneous run of samples of one [`SampleKind`]:
//! real or complex, single or double precision. Promotion widens along two
//! independent axes (real → complex, single → double) and never narrows.
//! Widening is exact, so real data round-trips through a promoted buffer
//! without change.
//!
//! ```rust
//! use rivulet_core::{SampleBuffer, SampleKind};
//!
//! let mut buf = SampleBuffer::from(vec![1.0f32, 2.0, 3.0]);
//! buf.promote(SampleKind::ComplexF32);
//! buf.promote(SampleKind::F64);
//! assert_eq!(buf.kind(), SampleKind::ComplexF64);
//! assert_eq!(buf.get(1).re, 2.0);
//! ```

use core::ops::Range;

pub use num_complex::{Complex32, Complex64};

/// Numeric kind of a sample buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// Real, single precision.
    #[default]
    F32,
    /// Real, double precision.
    F64,
    /// Complex, single precision.
    ComplexF32,
    /// Complex, double precision.
    ComplexF64,
}

impl SampleKind {
    /// Builds a kind from its two promotion axes.
    pub fn from_parts(complex: bool, double: bool) -> Self {
        match (complex, double) {
            (false, false) => Self::F32,
            (false, true) => Self::F64,
            (true, false) => Self::ComplexF32,
            (true, true) => Self::ComplexF64,
        }
    }

    /// Returns true for the complex kinds.
    pub fn is_complex(self) -> bool {
        matches!(self, Self::ComplexF32 | Self::ComplexF64)
    }

    /// Returns true for the double-precision kinds.
    pub fn is_double(self) -> bool {
        matches!(self, Self::F64 | Self::ComplexF64)
    }

    /// Smallest kind that can hold values of both `self` and `other` exactly.
    pub fn join(self, other: Self) -> Self {
        Self::from_parts(
            self.is_complex() || other.is_complex(),
            self.is_double() || other.is_double(),
        )
    }

    /// Returns true if `self` already holds every value of `other` exactly.
    pub fn contains(self, other: Self) -> bool {
        self.join(other) == self
    }
}

impl core::fmt::Display for SampleKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::ComplexF32 => "complex f32",
            Self::ComplexF64 => "complex f64",
        };
        f.write_str(name)
    }
}

/// Element types that can live in a [`SampleBuffer`].
///
/// `to_c64` is exact for every implementor. `from_c64` drops the imaginary
/// part for real types and rounds for single-precision types; it is only used
/// after promotion has made the destination wide enough, or when building a
/// computed result in a chosen kind.
pub trait Sample: Copy + Default + PartialEq + core::fmt::Debug + 'static {
    /// The buffer kind that stores this element type.
    const KIND: SampleKind;

    /// Widens to a double-precision complex value.
    fn to_c64(self) -> Complex64;

    /// Narrows from a double-precision complex value.
    fn from_c64(value: Complex64) -> Self;
}

impl Sample for f32 {
    const KIND: SampleKind = SampleKind::F32;

    #[inline]
    fn to_c64(self) -> Complex64 {
        Complex64::new(f64::from(self), 0.0)
    }

    #[inline]
    fn from_c64(value: Complex64) -> Self {
        value.re as f32
    }
}

impl Sample for f64 {
    const KIND: SampleKind = SampleKind::F64;

    #[inline]
    fn to_c64(self) -> Complex64 {
        Complex64::new(self, 0.0)
    }

    #[inline]
    fn from_c64(value: Complex64) -> Self {
        value.re
    }
}

impl Sample for Complex32 {
    const KIND: SampleKind = SampleKind::ComplexF32;

    #[inline]
    fn to_c64(self) -> Complex64 {
        Complex64::new(f64::from(self.re), f64::from(self.im))
    }

    #[inline]
    fn from_c64(value: Complex64) -> Self {
        Complex32::new(value.re as f32, value.im as f32)
    }
}

impl Sample for Complex64 {
    const KIND: SampleKind = SampleKind::ComplexF64;

    #[inline]
    fn to_c64(self) -> Complex64 {
        self
    }

    #[inline]
    fn from_c64(value: Complex64) -> Self {
        value
    }
}

/// A single constant of any sample kind, used for gains and constant terms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    /// Real, single precision.
    F32(f32),
    /// Real, double precision.
    F64(f64),
    /// Complex, single precision.
    ComplexF32(Complex32),
    /// Complex, double precision.
    ComplexF64(Complex64),
}

impl Scalar {
    /// Kind of this constant.
    pub fn kind(self) -> SampleKind {
        match self {
            Self::F32(_) => SampleKind::F32,
            Self::F64(_) => SampleKind::F64,
            Self::ComplexF32(_) => SampleKind::ComplexF32,
            Self::ComplexF64(_) => SampleKind::ComplexF64,
        }
    }

    /// Value widened to double-precision complex.
    pub fn to_c64(self) -> Complex64 {
        match self {
            Self::F32(v) => v.to_c64(),
            Self::F64(v) => v.to_c64(),
            Self::ComplexF32(v) => v.to_c64(),
            Self::ComplexF64(v) => v,
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Self::F32(0.0)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<Complex32> for Scalar {
    fn from(v: Complex32) -> Self {
        Self::ComplexF32(v)
    }
}

impl From<Complex64> for Scalar {
    fn from(v: Complex64) -> Self {
        Self::ComplexF64(v)
    }
}

/// Runs `$body` with `$v` bound to the inner `Vec` of whichever variant
/// `$buf` holds. Each arm is monomorphized for its element type.
macro_rules! with_samples {
    ($buf:expr, $v:ident => $body:expr) => {
        match $buf {
            SampleBuffer::F32($v) => $body,
            SampleBuffer::F64($v) => $body,
            SampleBuffer::ComplexF32($v) => $body,
            SampleBuffer::ComplexF64($v) => $body,
        }
    };
}

/// A block of samples of one numeric kind.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleBuffer {
    /// Real, single precision.
    F32(Vec<f32>),
    /// Real, double precision.
    F64(Vec<f64>),
    /// Complex, single precision.
    ComplexF32(Vec<Complex32>),
    /// Complex, double precision.
    ComplexF64(Vec<Complex64>),
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::F32(Vec::new())
    }
}

impl SampleBuffer {
    /// Creates a zero-filled buffer.
    pub fn zeros(kind: SampleKind, len: usize) -> Self {
        match kind {
            SampleKind::F32 => Self::F32(vec![0.0; len]),
            SampleKind::F64 => Self::F64(vec![0.0; len]),
            SampleKind::ComplexF32 => Self::ComplexF32(vec![Complex32::default(); len]),
            SampleKind::ComplexF64 => Self::ComplexF64(vec![Complex64::default(); len]),
        }
    }

    /// Creates an empty buffer with room for `capacity` samples.
    pub fn with_capacity(kind: SampleKind, capacity: usize) -> Self {
        match kind {
            SampleKind::F32 => Self::F32(Vec::with_capacity(capacity)),
            SampleKind::F64 => Self::F64(Vec::with_capacity(capacity)),
            SampleKind::ComplexF32 => Self::ComplexF32(Vec::with_capacity(capacity)),
            SampleKind::ComplexF64 => Self::ComplexF64(Vec::with_capacity(capacity)),
        }
    }

    /// Creates a buffer of `kind` from double-precision complex values.
    ///
    /// Values are narrowed to `kind` (imaginary parts dropped for real kinds).
    pub fn from_c64_iter(kind: SampleKind, values: impl IntoIterator<Item = Complex64>) -> Self {
        fn collect<S: Sample>(values: impl IntoIterator<Item = Complex64>) -> Vec<S> {
            values.into_iter().map(S::from_c64).collect()
        }
        match kind {
            SampleKind::F32 => Self::F32(collect(values)),
            SampleKind::F64 => Self::F64(collect(values)),
            SampleKind::ComplexF32 => Self::ComplexF32(collect(values)),
            SampleKind::ComplexF64 => Self::ComplexF64(collect(values)),
        }
    }

    /// Numeric kind of the samples.
    pub fn kind(&self) -> SampleKind {
        match self {
            Self::F32(_) => SampleKind::F32,
            Self::F64(_) => SampleKind::F64,
            Self::ComplexF32(_) => SampleKind::ComplexF32,
            Self::ComplexF64(_) => SampleKind::ComplexF64,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        with_samples!(self, v => v.len())
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample `index` widened to double-precision complex.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn get(&self, index: usize) -> Complex64 {
        with_samples!(self, v => v[index].to_c64())
    }

    /// Iterates over all samples widened to double-precision complex.
    pub fn iter_c64(&self) -> Box<dyn Iterator<Item = Complex64> + '_> {
        with_samples!(self, v => Box::new(v.iter().map(|s| s.to_c64()))
            as Box<dyn Iterator<Item = Complex64> + '_>)
    }

    /// Collects all samples as double-precision complex values.
    pub fn to_c64_vec(&self) -> Vec<Complex64> {
        with_samples!(self, v => v.iter().map(|s| s.to_c64()).collect())
    }

    /// Real parts of all samples as `f64`.
    pub fn real_f64(&self) -> Vec<f64> {
        with_samples!(self, v => v.iter().map(|s| s.to_c64().re).collect())
    }

    /// Real samples as `f32`, if the buffer is `F32`.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Real samples as `f64`, if the buffer is `F64`.
    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            Self::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Complex samples, if the buffer is `ComplexF32`.
    pub fn as_complex_f32(&self) -> Option<&[Complex32]> {
        match self {
            Self::ComplexF32(v) => Some(v),
            _ => None,
        }
    }

    /// Complex samples, if the buffer is `ComplexF64`.
    pub fn as_complex_f64(&self) -> Option<&[Complex64]> {
        match self {
            Self::ComplexF64(v) => Some(v),
            _ => None,
        }
    }

    /// Widens the buffer in place so that it can hold values of `kind`.
    ///
    /// The resulting kind is the join of the current kind and `kind`, so a
    /// complex or double buffer is never converted back. Contents are
    /// preserved exactly.
    pub fn promote(&mut self, kind: SampleKind) {
        let target = self.kind().join(kind);
        if target == self.kind() {
            return;
        }
        let widened = {
            let old = core::mem::take(self);
            with_samples!(old, v => Self::from_c64_iter(target, v.into_iter().map(Sample::to_c64)))
        };
        *self = widened;
    }

    /// Consuming form of [`promote`](Self::promote).
    pub fn promoted(mut self, kind: SampleKind) -> Self {
        self.promote(kind);
        self
    }

    /// Resizes to `len`, keeping leading contents.
    ///
    /// Growing zero-fills the tail; shrinking truncates it.
    pub fn resize(&mut self, len: usize) {
        with_samples!(self, v => v.resize(len, Default::default()));
    }

    /// Shortens the buffer to `len` samples. No effect if already shorter.
    pub fn truncate(&mut self, len: usize) {
        with_samples!(self, v => v.truncate(len));
    }

    /// Copies `range` into a new buffer of the same kind.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Self {
        match self {
            Self::F32(v) => Self::F32(v[range].to_vec()),
            Self::F64(v) => Self::F64(v[range].to_vec()),
            Self::ComplexF32(v) => Self::ComplexF32(v[range].to_vec()),
            Self::ComplexF64(v) => Self::ComplexF64(v[range].to_vec()),
        }
    }

    /// Appends `other`, promoting `self` first if `other` is wider.
    pub fn extend_from(&mut self, other: &SampleBuffer) {
        self.promote(other.kind());
        let start = self.len();
        self.resize(start + other.len());
        self.copy_from(start, other, 0..other.len());
    }

    /// Copies `src[src_range]` into `self` starting at `dst_start`.
    ///
    /// `self` must already be at least as wide as `src` (see
    /// [`promote`](Self::promote)); the copy widens element by element.
    ///
    /// # Panics
    ///
    /// Panics if either range is out of bounds.
    pub(crate) fn copy_from(&mut self, dst_start: usize, src: &SampleBuffer, src_range: Range<usize>) {
        debug_assert!(
            self.kind().contains(src.kind()),
            "copy from {} into narrower {}",
            src.kind(),
            self.kind()
        );
        let len = src_range.len();
        with_samples!(self, dst => with_samples!(src, s => {
            convert_into(&s[src_range.clone()], &mut dst[dst_start..dst_start + len]);
        }));
    }
}

/// Element-wise widening copy between two sample slices of equal length.
#[inline]
fn convert_into<S: Sample, D: Sample>(src: &[S], dst: &mut [D]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = D::from_c64(s.to_c64());
    }
}

impl<S: Sample> FromIterator<S> for SampleBuffer
where
    SampleBuffer: From<Vec<S>>,
{
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<S>>())
    }
}

impl From<Vec<f32>> for SampleBuffer {
    fn from(v: Vec<f32>) -> Self {
        Self::F32(v)
    }
}

impl From<Vec<f64>> for SampleBuffer {
    fn from(v: Vec<f64>) -> Self {
        Self::F64(v)
    }
}

impl From<Vec<Complex32>> for SampleBuffer {
    fn from(v: Vec<Complex32>) -> Self {
        Self::ComplexF32(v)
    }
}

impl From<Vec<Complex64>> for SampleBuffer {
    fn from(v: Vec<Complex64>) -> Self {
        Self::ComplexF64(v)
    }
}

impl From<&[f32]> for SampleBuffer {
    fn from(v: &[f32]) -> Self {
        Self::F32(v.to_vec())
    }
}

impl From<&[f64]> for SampleBuffer {
    fn from(v: &[f64]) -> Self {
        Self::F64(v.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_componentwise() {
        assert_eq!(SampleKind::F32.join(SampleKind::F64), SampleKind::F64);
        assert_eq!(
            SampleKind::F64.join(SampleKind::ComplexF32),
            SampleKind::ComplexF64
        );
        assert_eq!(
            SampleKind::ComplexF32.join(SampleKind::F32),
            SampleKind::ComplexF32
        );
        assert!(SampleKind::ComplexF64.contains(SampleKind::F32));
        assert!(!SampleKind::F64.contains(SampleKind::ComplexF32));
    }

    #[test]
    fn promote_never_demotes() {
        let mut buf = SampleBuffer::from(vec![Complex64::new(1.0, 2.0)]);
        buf.promote(SampleKind::F32);
        assert_eq!(buf.kind(), SampleKind::ComplexF64);
        assert_eq!(buf.get(0), Complex64::new(1.0, 2.0));
    }

    #[test]
    fn promote_preserves_real_values_exactly() {
        let values = vec![0.1f32, -3.75, 1.0e-7, f32::MAX];
        let mut buf = SampleBuffer::from(values.clone());
        buf.promote(SampleKind::ComplexF64);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(buf.get(i).re as f32, v);
            assert_eq!(buf.get(i).im, 0.0);
        }
    }

    #[test]
    fn promote_axes_are_independent() {
        let mut buf = SampleBuffer::from(vec![1.0f32]);
        buf.promote(SampleKind::ComplexF32);
        assert_eq!(buf.kind(), SampleKind::ComplexF32);
        buf.promote(SampleKind::F64);
        assert_eq!(buf.kind(), SampleKind::ComplexF64);
    }

    #[test]
    fn resize_zero_fills_and_truncates() {
        let mut buf = SampleBuffer::from(vec![1.0f64, 2.0]);
        buf.resize(4);
        assert_eq!(buf.as_f64().unwrap(), &[1.0, 2.0, 0.0, 0.0]);
        buf.resize(1);
        assert_eq!(buf.as_f64().unwrap(), &[1.0]);
    }

    #[test]
    fn extend_promotes_destination() {
        let mut buf = SampleBuffer::from(vec![1.0f32, 2.0]);
        buf.extend_from(&SampleBuffer::from(vec![Complex32::new(0.0, 1.0)]));
        assert_eq!(buf.kind(), SampleKind::ComplexF32);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.get(0), Complex64::new(1.0, 0.0));
        assert_eq!(buf.get(2), Complex64::new(0.0, 1.0));
    }

    #[test]
    fn from_c64_iter_drops_imaginary_for_real_kinds() {
        let buf = SampleBuffer::from_c64_iter(
            SampleKind::F64,
            [Complex64::new(2.0, 5.0), Complex64::new(-1.0, 1.0)],
        );
        assert_eq!(buf.as_f64().unwrap(), &[2.0, -1.0]);
    }

    #[test]
    fn slice_keeps_kind() {
        let buf = SampleBuffer::from(vec![1.0f64, 2.0, 3.0, 4.0]);
        let part = buf.slice(1..3);
        assert_eq!(part.as_f64().unwrap(), &[2.0, 3.0]);
    }

    #[test]
    fn scalar_kinds() {
        assert_eq!(Scalar::from(1.0f32).kind(), SampleKind::F32);
        assert_eq!(Scalar::from(1.0f64).kind(), SampleKind::F64);
        assert_eq!(
            Scalar::from(Complex32::new(1.0, 1.0)).to_c64(),
            Complex64::new(1.0, 1.0)
        );
    }
}
