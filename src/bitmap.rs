use crate::BitmapError;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use core::sync::atomic::{AtomicU32, Ordering};

/// Number of bits held by one segment.
pub const SEGMENT_BITS: usize = u32::BITS as usize;

/// Computes the number of 32-bit segments needed to store `bit_len` bits.
///
/// # Examples
/// ```
/// use concurrent_bitmap::segment_count;
///
/// assert_eq!(segment_count(0), 0);
/// assert_eq!(segment_count(32), 1);
/// assert_eq!(segment_count(33), 2);
/// ```
pub const fn segment_count(bit_len: usize) -> usize {
    bit_len.div_ceil(SEGMENT_BITS)
}

/// Splits a bit index into its segment index and the mask of the bit inside
/// that segment. Bit `k` of a segment is `1 << k`.
#[inline]
pub(crate) const fn locate(index: usize) -> (usize, u32) {
    (index / SEGMENT_BITS, 1 << (index % SEGMENT_BITS) as u32)
}

fn alloc_segments(bit_len: usize) -> Result<Box<[AtomicU32]>, BitmapError> {
    let count = segment_count(bit_len);
    let mut segments = Vec::new();
    segments
        .try_reserve_exact(count)
        .map_err(|_| BitmapError::InvalidLength { bit_len })?;
    segments.resize_with(count, AtomicU32::default);
    Ok(segments.into_boxed_slice())
}

/// A bitmap of `len()` bits that any number of threads can set bits in
/// through a shared reference.
///
/// Internally stores bits in a boxed slice of [`AtomicU32`] segments.
/// Segment `i` holds bits `i * 32 ..= i * 32 + 31`. Bits past `len()` in the
/// last segment are never addressed and always stay zero.
///
/// A bit only ever goes from unset to set. Clearing happens in bulk through
/// [`reset`], which needs exclusive access:
/// ```compile_fail
/// use concurrent_bitmap::ConcurrentBitmap;
///
/// let bitmap = ConcurrentBitmap::new(8);
/// let shared = &bitmap;
/// shared.reset(4);
/// ```
///
/// [`reset`]: ConcurrentBitmap::reset
pub struct ConcurrentBitmap {
    pub(crate) segments: Box<[AtomicU32]>,
    bit_len: usize,
}

impl ConcurrentBitmap {
    /// Creates a bitmap of `bit_len` bits, all unset.
    ///
    /// # Panics
    /// Panics if the segment storage cannot be allocated. Use [`try_new`] to
    /// get a [`BitmapError::InvalidLength`] instead.
    ///
    /// # Examples
    /// ```
    /// use concurrent_bitmap::ConcurrentBitmap;
    ///
    /// let bitmap = ConcurrentBitmap::new(40);
    /// assert_eq!(bitmap.len(), 40);
    /// assert_eq!(bitmap.count_ones(), 0);
    /// ```
    ///
    /// [`try_new`]: ConcurrentBitmap::try_new
    pub fn new(bit_len: usize) -> Self {
        Self::try_new(bit_len).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Creates a bitmap of `bit_len` bits, all unset, or reports why the
    /// storage could not be allocated.
    ///
    /// # Examples
    /// ```
    /// use concurrent_bitmap::ConcurrentBitmap;
    ///
    /// let bitmap = ConcurrentBitmap::try_new(100).unwrap();
    /// assert_eq!(bitmap.len(), 100);
    /// ```
    pub fn try_new(bit_len: usize) -> Result<Self, BitmapError> {
        Ok(Self {
            segments: alloc_segments(bit_len)?,
            bit_len,
        })
    }

    /// Returns the number of addressable bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bit_len
    }

    /// Returns `true` if the bitmap has no addressable bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Sets the bit at `index` and returns `true` if this call performed the
    /// transition from unset to set.
    ///
    /// Among any number of concurrent calls on the same bit, exactly one
    /// returns `true`. Calls on bits in different segments never contend.
    ///
    /// A successful set releases the caller's prior writes; a call returning
    /// `false` acquires the writes of whoever set the bit.
    ///
    /// # Panics
    /// Panics if `index >= len()`. Nothing is written in that case.
    ///
    /// # Examples
    /// ```
    /// use concurrent_bitmap::ConcurrentBitmap;
    ///
    /// let bitmap = ConcurrentBitmap::new(8);
    /// assert!(bitmap.set(7));
    /// assert!(!bitmap.set(7));
    /// ```
    pub fn set(&self, index: usize) -> bool {
        assert!(index < self.bit_len, "Bit index {index} out of bounds");
        self.set_in_range(index)
    }

    /// Same as [`set`], but returns [`BitmapError::OutOfRange`] instead of
    /// panicking.
    ///
    /// # Examples
    /// ```
    /// use concurrent_bitmap::{BitmapError, ConcurrentBitmap};
    ///
    /// let bitmap = ConcurrentBitmap::new(8);
    /// assert_eq!(bitmap.try_set(2), Ok(true));
    /// assert_eq!(
    ///     bitmap.try_set(8),
    ///     Err(BitmapError::OutOfRange { index: 8, len: 8 })
    /// );
    /// ```
    ///
    /// [`set`]: ConcurrentBitmap::set
    pub fn try_set(&self, index: usize) -> Result<bool, BitmapError> {
        self.check_index(index)?;
        Ok(self.set_in_range(index))
    }

    fn set_in_range(&self, index: usize) -> bool {
        let (segment_idx, mask) = locate(index);
        let segment = &self.segments[segment_idx];
        let mut current = segment.load(Ordering::Acquire);
        loop {
            let desired = current | mask;
            if desired == current {
                return false;
            }
            match segment.compare_exchange_weak(
                current,
                desired,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Returns `true` if the bit at `index` is set, using a synchronized load.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    ///
    /// # Examples
    /// ```
    /// use concurrent_bitmap::ConcurrentBitmap;
    ///
    /// let bitmap = ConcurrentBitmap::new(8);
    /// bitmap.set(1);
    /// assert!(bitmap.is_set(1));
    /// assert!(!bitmap.is_set(2));
    /// ```
    pub fn is_set(&self, index: usize) -> bool {
        assert!(index < self.bit_len, "Bit index {index} out of bounds");
        let (segment_idx, mask) = locate(index);
        self.segments[segment_idx].load(Ordering::Acquire) & mask != 0
    }

    /// Returns `true` if the bit at `index` is set, using a plain read with no
    /// memory fence.
    ///
    /// # Safety
    /// No call to [`set`] or [`try_set`] may run on this bitmap concurrently
    /// with this read, and every earlier `set` must happen-before it (for
    /// instance because the setting threads were joined). Use [`is_set`] when
    /// that cannot be guaranteed.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    ///
    /// # Examples
    /// ```
    /// use concurrent_bitmap::ConcurrentBitmap;
    /// use std::thread;
    ///
    /// let bitmap = ConcurrentBitmap::new(64);
    /// thread::scope(|s| {
    ///     s.spawn(|| bitmap.set(40));
    /// });
    /// // SAFETY: the setting thread has been joined by the scope.
    /// assert!(unsafe { bitmap.unsafe_is_set(40) });
    /// ```
    ///
    /// [`set`]: ConcurrentBitmap::set
    /// [`try_set`]: ConcurrentBitmap::try_set
    /// [`is_set`]: ConcurrentBitmap::is_set
    pub unsafe fn unsafe_is_set(&self, index: usize) -> bool {
        assert!(index < self.bit_len, "Bit index {index} out of bounds");
        let (segment_idx, mask) = locate(index);
        // SAFETY: the caller guarantees no writer is active, so this
        // non-atomic read cannot race with a CAS on the same segment.
        let word = unsafe { self.segments[segment_idx].as_ptr().read() };
        word & mask != 0
    }

    /// Returns `true` if the bit at `index` is set, reading through exclusive
    /// access.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    ///
    /// # Examples
    /// ```
    /// use concurrent_bitmap::ConcurrentBitmap;
    ///
    /// let mut bitmap = ConcurrentBitmap::new(8);
    /// bitmap.set(4);
    /// assert!(bitmap.is_set_exclusive(4));
    /// ```
    pub fn is_set_exclusive(&mut self, index: usize) -> bool {
        assert!(index < self.bit_len, "Bit index {index} out of bounds");
        let (segment_idx, mask) = locate(index);
        *self.segments[segment_idx].get_mut() & mask != 0
    }

    /// Returns the number of set bits.
    ///
    /// Each segment is loaded separately, so with setters still running the
    /// result lies between the counts before and after those calls.
    ///
    /// # Examples
    /// ```
    /// use concurrent_bitmap::ConcurrentBitmap;
    ///
    /// let bitmap = ConcurrentBitmap::new(70);
    /// bitmap.set(0);
    /// bitmap.set(69);
    /// assert_eq!(bitmap.count_ones(), 2);
    /// ```
    pub fn count_ones(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| segment.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    /// Clears every bit and changes the length to `new_bit_len`.
    ///
    /// The current storage is zeroed in place when the segment count does not
    /// change, otherwise it is replaced.
    ///
    /// # Panics
    /// Panics if new segment storage cannot be allocated. Use [`try_reset`]
    /// to get a [`BitmapError::InvalidLength`] instead.
    ///
    /// # Examples
    /// ```
    /// use concurrent_bitmap::ConcurrentBitmap;
    ///
    /// let mut bitmap = ConcurrentBitmap::new(32);
    /// bitmap.set(3);
    /// bitmap.set(16);
    /// bitmap.reset(8);
    /// assert_eq!(bitmap.len(), 8);
    /// assert!(!bitmap.is_set(3));
    /// ```
    ///
    /// [`try_reset`]: ConcurrentBitmap::try_reset
    pub fn reset(&mut self, new_bit_len: usize) {
        self.try_reset(new_bit_len)
            .unwrap_or_else(|err| panic!("{err}"));
    }

    /// Same as [`reset`], but returns [`BitmapError::InvalidLength`] instead
    /// of panicking. The bitmap is left untouched on error.
    ///
    /// [`reset`]: ConcurrentBitmap::reset
    pub fn try_reset(&mut self, new_bit_len: usize) -> Result<(), BitmapError> {
        if segment_count(new_bit_len) == self.segments.len() {
            for segment in self.segments.iter_mut() {
                *segment.get_mut() = 0;
            }
        } else {
            self.segments = alloc_segments(new_bit_len)?;
        }
        self.bit_len = new_bit_len;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), BitmapError> {
        if index < self.bit_len {
            Ok(())
        } else {
            Err(BitmapError::OutOfRange {
                index,
                len: self.bit_len,
            })
        }
    }
}

impl Default for ConcurrentBitmap {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Debug for ConcurrentBitmap {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "LSB -> ")?;
        for i in 0..self.bit_len {
            let (segment_idx, mask) = locate(i);
            let bit = self.segments[segment_idx].load(Ordering::Relaxed) & mask != 0;
            if i % 8 == 0 {
                write!(f, "{i}: ")?;
            }
            write!(f, "{}", if bit { '1' } else { '0' })?;
            if i % 8 == 7 && i < self.bit_len - 1 {
                write!(f, " ")?;
            }
        }
        write!(f, " <- MSB")?;
        Ok(())
    }
}
