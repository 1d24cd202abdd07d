use core::{alloc::Layout, fmt};

/// The error type for `try_*` operations that may need to acquire storage.
///
/// A failed operation leaves the deque in a valid state. Blocks that were
/// acquired before the failure are either released or kept as spare capacity,
/// they are never counted as occupied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TryReserveError {
  /// The requested length, block count or handle buffer size overflowed.
  CapacityOverflow,
  /// The memory resource refused to hand out storage.
  #[non_exhaustive]
  AllocError {
    /// The layout of the failed request.
    layout: Layout,
  },
}

impl TryReserveError {
  /// Escalates the error the same way the standard collections do when an
  /// infallible operation runs out of memory.
  #[track_caller]
  pub(crate) fn escalate(self) -> ! {
    match self {
      Self::CapacityOverflow => panic!("capacity overflow"),
      Self::AllocError { layout } => alloc::alloc::handle_alloc_error(layout),
    }
  }
}

impl fmt::Display for TryReserveError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("memory allocation failed")?;

    let reason = match self {
      Self::CapacityOverflow => " because the computed capacity exceeded the collection's maximum",
      Self::AllocError { .. } => " because the memory resource returned an error",
    };

    f.write_str(reason)
  }
}

#[cfg(feature = "std")]
impl std::error::Error for TryReserveError {}

/// The error returned by [`BlockDeque::at`](crate::BlockDeque::at) and
/// [`BlockDeque::at_mut`](crate::BlockDeque::at_mut) for an index past the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutOfRangeError {
  index: usize,
  len: usize,
}

impl OutOfRangeError {
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) const fn new(index: usize, len: usize) -> Self {
    Self { index, len }
  }

  /// Returns the requested index.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn index(&self) -> usize {
    self.index
  }

  /// Returns the length of the deque at the time of the request.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn deque_len(&self) -> usize {
    self.len
  }
}

impl fmt::Display for OutOfRangeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "index {} out of range for deque of length {}",
      self.index, self.len
    )
  }
}

#[cfg(feature = "std")]
impl std::error::Error for OutOfRangeError {}
