use core::fmt::{Display, Formatter};

/// Precondition violations reported by the fallible `try_*` methods of
/// [`ConcurrentBitmap`].
///
/// The panicking methods reject the same inputs before touching any segment.
///
/// [`ConcurrentBitmap`]: crate::ConcurrentBitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitmapError {
    /// The bit index lies outside `0..len`.
    OutOfRange {
        /// The rejected index.
        index: usize,
        /// The bitmap length at the time of the call.
        len: usize,
    },
    /// No segment storage can be allocated for the requested bit length.
    InvalidLength {
        /// The rejected bit length.
        bit_len: usize,
    },
}

impl Display for BitmapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "bit index {index} out of range for bitmap of length {len}")
            }
            Self::InvalidLength { bit_len } => {
                write!(f, "cannot allocate storage for {bit_len} bits")
            }
        }
    }
}

impl core::error::Error for BitmapError {}
