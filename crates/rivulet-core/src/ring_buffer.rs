//! Fixed-capacity circular sample storage with single- or multi-reader access.
//!
//! [`CircularBuffer`] sits under every block boundary in the graph: adapters
//! re-chunk through one, tees fan out through one, and the resampler queues
//! its output in one.
//!
//! # Reader Modes
//!
//! A buffer is used either with one implicit read cursor ([`read`]) or with
//! any number of independent [`ReaderHandle`]s ([`reader`] +
//! [`read_reader`]). The mode is fixed by the first call that needs it:
//!
//! - `write`, `read`, `length`, `available`, `is_empty` lock single-reader mode
//!   on a fresh buffer.
//! - `reader` locks multi-reader mode on a fresh buffer.
//!
//! Once locked, using the other mode's API returns [`Error::ReaderMode`].
//! [`CircularBuffer::new_multi`] starts out locked to multi-reader mode so
//! content can be written before the first reader is attached.
//!
//! Positions are monotonically increasing counters; the storage index is the
//! position modulo capacity. In multi-reader mode the writer may never pass the
//! slowest reader, so `length() + available() == capacity()` holds in both
//! modes.
//!
//! [`read`]: CircularBuffer::read
//! [`reader`]: CircularBuffer::reader
//! [`read_reader`]: CircularBuffer::read_reader

use core::cell::Cell;

use crate::error::{Error, Result};
use crate::sample::{SampleBuffer, SampleKind};

/// Access mode of a [`CircularBuffer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReaderMode {
    /// Not used yet.
    #[default]
    Unset,
    /// One implicit read cursor.
    Single,
    /// Independent cursors created with [`CircularBuffer::reader`].
    Multi,
}

impl core::fmt::Display for ReaderMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Unset => "unlocked",
            Self::Single => "single-reader",
            Self::Multi => "multi-reader",
        })
    }
}

/// An independent read cursor on a multi-reader [`CircularBuffer`].
///
/// Handles are only meaningful for the buffer that created them.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ReaderHandle {
    index: usize,
}

impl ReaderHandle {
    /// Index of this reader within its buffer.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Circular sample buffer.
///
/// # Example
///
/// ```rust
/// use rivulet_core::{CircularBuffer, SampleBuffer};
///
/// let mut ring = CircularBuffer::new(7).unwrap();
/// assert_eq!(ring.write(&SampleBuffer::from(vec![1.0f32, 2.0, 3.0])).unwrap(), 3);
/// assert_eq!(ring.write(&SampleBuffer::from(vec![4.0f32, 5.0])).unwrap(), 5);
/// assert_eq!(ring.available().unwrap(), 2);
///
/// let out = ring.read(4).unwrap();
/// assert_eq!(out.as_f32().unwrap(), &[1.0, 2.0, 3.0, 4.0]);
/// assert_eq!(ring.length().unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct CircularBuffer {
    storage: SampleBuffer,
    write_pos: usize,
    read_pos: usize,
    /// Oldest absolute position whose sample is still in `storage`.
    oldest: usize,
    readers: Vec<Option<usize>>,
    mode: Cell<ReaderMode>,
}

impl CircularBuffer {
    /// Creates an empty single-precision real buffer holding `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_kind(capacity, SampleKind::F32)
    }

    /// Creates an empty buffer whose storage starts out as `kind`.
    pub fn with_kind(capacity: usize, kind: SampleKind) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity {
                requested: 0,
                minimum: 1,
            });
        }
        Ok(Self {
            storage: SampleBuffer::zeros(kind, capacity),
            write_pos: 0,
            read_pos: 0,
            oldest: 0,
            readers: Vec::new(),
            mode: Cell::new(ReaderMode::Unset),
        })
    }

    /// Creates an empty buffer already locked to multi-reader mode.
    pub fn new_multi(capacity: usize) -> Result<Self> {
        let ring = Self::new(capacity)?;
        ring.mode.set(ReaderMode::Multi);
        Ok(ring)
    }

    /// Total number of samples the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Current storage kind.
    pub fn kind(&self) -> SampleKind {
        self.storage.kind()
    }

    /// The access mode, or [`ReaderMode::Unset`] before first use.
    pub fn mode(&self) -> ReaderMode {
        self.mode.get()
    }

    /// Total samples ever written.
    pub fn total_written(&self) -> usize {
        self.write_pos
    }

    /// Locks single-reader mode if unset; `multi_ok` also accepts multi mode.
    fn lock(&self, attempted: ReaderMode, multi_ok: bool) -> Result<ReaderMode> {
        match self.mode.get() {
            ReaderMode::Unset => {
                self.mode.set(attempted);
                Ok(attempted)
            }
            locked if locked == attempted => Ok(locked),
            ReaderMode::Multi if multi_ok => Ok(ReaderMode::Multi),
            locked => Err(Error::ReaderMode { locked, attempted }),
        }
    }

    /// Position of the slowest live reader, or the write position if none.
    fn tail(&self) -> usize {
        match self.mode.get() {
            ReaderMode::Multi => self
                .readers
                .iter()
                .flatten()
                .copied()
                .min()
                .unwrap_or(self.write_pos),
            _ => self.read_pos,
        }
    }

    /// Samples buffered and not yet consumed by the slowest reader.
    pub fn length(&self) -> Result<usize> {
        self.lock(ReaderMode::Single, true)?;
        Ok(self.write_pos - self.tail())
    }

    /// Samples that can be written without overwriting unread data.
    pub fn available(&self) -> Result<usize> {
        Ok(self.capacity() - self.length()?)
    }

    /// Returns true if no reader has anything left to read.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.length()? == 0)
    }

    /// Returns true if no more samples can be written.
    pub fn is_full(&self) -> Result<bool> {
        Ok(self.available()? == 0)
    }

    /// Appends all of `data`, promoting storage if `data` is wider.
    ///
    /// Returns the number of samples buffered after the write. Fails with
    /// [`Error::BufferOverflow`] if `data` does not fit in [`available`]
    /// (in multi-reader mode: if it would pass the slowest reader).
    ///
    /// [`available`]: Self::available
    pub fn write(&mut self, data: &SampleBuffer) -> Result<usize> {
        let available = self.available()?;
        let n = data.len();
        if n == 0 {
            return self.length();
        }
        if n > available {
            return Err(Error::BufferOverflow {
                requested: n,
                available,
            });
        }

        self.storage.promote(data.kind());
        let cap = self.capacity();
        let start = self.write_pos % cap;
        let first = n.min(cap - start);
        self.storage.copy_from(start, data, 0..first);
        self.storage.copy_from(0, data, first..n);
        self.write_pos += n;
        self.length()
    }

    /// Copies `n` samples starting at position `pos` out of storage.
    fn copy_out(&self, pos: usize, n: usize) -> SampleBuffer {
        let cap = self.capacity();
        let mut out = SampleBuffer::zeros(self.kind(), n);
        let start = pos % cap;
        let first = n.min(cap - start);
        out.copy_from(0, &self.storage, start..start + first);
        out.copy_from(first, &self.storage, 0..n - first);
        out
    }

    /// Removes and returns the `n` oldest samples (single-reader mode).
    pub fn read(&mut self, n: usize) -> Result<SampleBuffer> {
        self.lock(ReaderMode::Single, false)?;
        let buffered = self.write_pos - self.read_pos;
        if n > buffered {
            return Err(Error::BufferUnderflow {
                requested: n,
                available: buffered,
            });
        }
        let out = self.copy_out(self.read_pos, n);
        self.read_pos += n;
        Ok(out)
    }

    /// Returns the `n` oldest samples without consuming them (single-reader mode).
    pub fn peek(&self, n: usize) -> Result<SampleBuffer> {
        self.lock(ReaderMode::Single, false)?;
        let buffered = self.write_pos - self.read_pos;
        if n > buffered {
            return Err(Error::BufferUnderflow {
                requested: n,
                available: buffered,
            });
        }
        Ok(self.copy_out(self.read_pos, n))
    }

    /// Adds an independent reader starting `delay` samples before the write
    /// position.
    ///
    /// `delay` may not exceed the content that has been written and is still
    /// held by the buffer.
    pub fn reader(&mut self, delay: usize) -> Result<ReaderHandle> {
        self.lock(ReaderMode::Multi, false)?;
        let retained = (self.write_pos - self.oldest).min(self.capacity());
        if delay > retained {
            return Err(Error::ReaderDelay { delay, retained });
        }
        let index = self.readers.len();
        self.readers.push(Some(self.write_pos - delay));
        Ok(ReaderHandle { index })
    }

    fn reader_pos(&self, handle: &ReaderHandle) -> Result<usize> {
        self.readers
            .get(handle.index)
            .copied()
            .flatten()
            .ok_or(Error::UnknownReader(handle.index))
    }

    /// Samples that `handle` has not read yet.
    pub fn reader_length(&self, handle: &ReaderHandle) -> Result<usize> {
        self.lock(ReaderMode::Multi, false)?;
        Ok(self.write_pos - self.reader_pos(handle)?)
    }

    /// Reads `n` samples through `handle` (multi-reader mode).
    pub fn read_reader(&mut self, handle: &ReaderHandle, n: usize) -> Result<SampleBuffer> {
        let buffered = self.reader_length(handle)?;
        if n > buffered {
            return Err(Error::BufferUnderflow {
                requested: n,
                available: buffered,
            });
        }
        let pos = self.reader_pos(handle)?;
        let out = self.copy_out(pos, n);
        self.readers[handle.index] = Some(pos + n);
        Ok(out)
    }

    /// Detaches a reader so it no longer holds back the writer.
    pub fn release_reader(&mut self, handle: ReaderHandle) -> Result<()> {
        self.reader_pos(&handle)?;
        self.readers[handle.index] = None;
        Ok(())
    }

    /// Number of live readers.
    pub fn reader_count(&self) -> usize {
        self.readers.iter().flatten().count()
    }

    /// Grows storage to `new_capacity`, keeping all unread content in order.
    ///
    /// Already-read samples that still fit are kept too, so a reader added
    /// later with a delay sees the same history as before.
    ///
    /// Fails with [`Error::InvalidCapacity`] if `new_capacity` could not hold
    /// the samples currently buffered.
    pub fn grow(&mut self, new_capacity: usize) -> Result<()> {
        let buffered = self.write_pos - self.tail();
        if new_capacity == 0 || new_capacity < buffered {
            return Err(Error::InvalidCapacity {
                requested: new_capacity,
                minimum: buffered.max(1),
            });
        }
        let kept = (self.write_pos - self.oldest)
            .min(self.capacity())
            .min(new_capacity);
        let from = self.write_pos - kept;
        let live = self.copy_out(from, kept);
        let mut storage = SampleBuffer::zeros(self.kind(), new_capacity);
        let start = from % new_capacity;
        let first = kept.min(new_capacity - start);
        storage.copy_from(start, &live, 0..first);
        storage.copy_from(0, &live, first..kept);
        self.storage = storage;
        self.oldest = from;
        Ok(())
    }

    /// Discards all unread content for every reader. The mode stays locked.
    pub fn clear(&mut self) {
        self.read_pos = self.write_pos;
        for pos in self.readers.iter_mut().flatten() {
            *pos = self.write_pos;
        }
    }
}
