use core::{fmt, iter::FusedIterator};

use super::{BlockDeque, MemoryResource};

/// An owning iterator over the elements of a [`BlockDeque`].
///
/// This `struct` is created by the [`into_iter`] method on [`BlockDeque`]
/// (provided by the [`IntoIterator`] trait). See its documentation for more.
///
/// Blocks are released as soon as the iterator has consumed their elements.
///
/// [`BlockDeque`]: crate::BlockDeque
/// [`into_iter`]: BlockDeque::into_iter
pub struct IntoIter<T, A: MemoryResource> {
  inner: BlockDeque<T, A>,
}

impl<T, A: MemoryResource> IntoIter<T, A> {
  pub(super) fn new(inner: BlockDeque<T, A>) -> Self {
    IntoIter { inner }
  }

  /// Returns the memory resource of the deque being consumed.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub fn allocator(&self) -> &A {
    self.inner.allocator()
  }
}

impl<T: Clone, A: MemoryResource> Clone for IntoIter<T, A> {
  fn clone(&self) -> Self {
    IntoIter {
      inner: self.inner.clone(),
    }
  }
}

impl<T: fmt::Debug, A: MemoryResource> fmt::Debug for IntoIter<T, A> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("IntoIter").field(&self.inner).finish()
  }
}

impl<T, A: MemoryResource> Iterator for IntoIter<T, A> {
  type Item = T;

  #[inline]
  fn next(&mut self) -> Option<T> {
    self.inner.pop_front()
  }

  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    let len = self.inner.len();
    (len, Some(len))
  }

  #[inline]
  fn count(self) -> usize {
    self.inner.len()
  }

  #[inline]
  fn last(mut self) -> Option<Self::Item> {
    self.inner.pop_back()
  }
}

impl<T, A: MemoryResource> DoubleEndedIterator for IntoIter<T, A> {
  #[inline]
  fn next_back(&mut self) -> Option<T> {
    self.inner.pop_back()
  }
}

impl<T, A: MemoryResource> ExactSizeIterator for IntoIter<T, A> {
  #[inline]
  fn len(&self) -> usize {
    self.inner.len()
  }
}

impl<T, A: MemoryResource> FusedIterator for IntoIter<T, A> {}

#[cfg(test)]
mod tests {
  use super::IntoIter;
  use crate::BlockDeque;

  #[test]
  fn iterator_behaves_like_queue() {
    let deque: BlockDeque<_> = (0..5).collect();

    let mut iter = IntoIter::new(deque.clone());
    assert_eq!(iter.size_hint(), (5, Some(5)));
    assert_eq!(iter.next(), Some(0));
    assert_eq!(iter.next_back(), Some(4));
    assert_eq!(iter.len(), 3);
    assert_eq!(iter.last(), Some(3));

    let count = deque.into_iter().count();
    assert_eq!(count, 5);
  }

  #[test]
  fn fold_and_last_cover_all_items() {
    let deque: BlockDeque<_> = (0..4).collect();
    let sum = IntoIter::new(deque.clone()).fold(0, |acc, value| acc + value);
    assert_eq!(sum, 6);

    let last = IntoIter::new(deque).last();
    assert_eq!(last, Some(3));
  }

  #[test]
  fn consuming_releases_blocks() {
    let deque: BlockDeque<u32> = (0..5_000).collect();
    assert_eq!(deque.block_count(), 5);

    let mut iter = deque.into_iter();
    for _ in 0..2_048 {
      iter.next();
    }
    assert_eq!(iter.inner.block_count(), 3);
    assert_eq!(iter.len(), 2_952);
    assert!(iter.rev().eq((2_048..5_000).rev()));
  }
}
