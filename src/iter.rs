use core::{fmt, iter::FusedIterator, marker::PhantomData, ptr::NonNull};

use super::map::slot_at;

/// An iterator over the elements of a [`BlockDeque`](crate::BlockDeque).
///
/// This `struct` is created by the [`iter`] and [`range`] methods on
/// [`BlockDeque`](crate::BlockDeque). See their documentation for more.
///
/// The iterator holds the address of the first block handle and two slot
/// positions, so stepping and skipping are *O*(1) at either end.
///
/// [`iter`]: crate::BlockDeque::iter
/// [`range`]: crate::BlockDeque::range
pub struct Iter<'a, T> {
  base: NonNull<NonNull<T>>,
  front: usize,
  back: usize,
  _marker: PhantomData<&'a T>,
}

// SAFETY: `Iter` only hands out shared references.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
// SAFETY: see above.
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<'a, T> Iter<'a, T> {
  pub(super) const fn new(base: NonNull<NonNull<T>>, front: usize, back: usize) -> Self {
    Self {
      base,
      front,
      back,
      _marker: PhantomData,
    }
  }
}

impl<T> Clone for Iter<'_, T> {
  fn clone(&self) -> Self {
    Self::new(self.base, self.front, self.back)
  }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    struct Remaining<'r, 'a, T>(&'r Iter<'a, T>);

    impl<T: fmt::Debug> fmt::Debug for Remaining<'_, '_, T> {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.clone()).finish()
      }
    }

    f.debug_tuple("Iter").field(&Remaining(self)).finish()
  }
}

impl<T> Default for Iter<'_, T> {
  /// Creates an empty `Iter`.
  ///
  /// ```
  /// let iter: block_deque::Iter<'_, u8> = Default::default();
  /// assert_eq!(iter.len(), 0);
  /// ```
  fn default() -> Self {
    Self::new(NonNull::dangling(), 0, 0)
  }
}

impl<'a, T> Iterator for Iter<'a, T> {
  type Item = &'a T;

  #[inline]
  fn next(&mut self) -> Option<&'a T> {
    if self.front == self.back {
      return None;
    }
    // SAFETY: positions in `front..back` hold live elements borrowed for `'a`.
    let item = unsafe { &*slot_at(self.base.as_ptr(), self.front) };
    self.front += 1;
    Some(item)
  }

  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    let len = self.len();
    (len, Some(len))
  }

  #[inline]
  fn nth(&mut self, n: usize) -> Option<&'a T> {
    if n >= self.len() {
      self.front = self.back;
      return None;
    }
    self.front += n;
    self.next()
  }

  #[inline]
  fn count(self) -> usize {
    self.len()
  }

  #[inline]
  fn last(mut self) -> Option<&'a T> {
    self.next_back()
  }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
  #[inline]
  fn next_back(&mut self) -> Option<&'a T> {
    if self.front == self.back {
      return None;
    }
    self.back -= 1;
    // SAFETY: positions in `front..back` hold live elements borrowed for `'a`.
    Some(unsafe { &*slot_at(self.base.as_ptr(), self.back) })
  }

  #[inline]
  fn nth_back(&mut self, n: usize) -> Option<&'a T> {
    if n >= self.len() {
      self.back = self.front;
      return None;
    }
    self.back -= n;
    self.next_back()
  }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
  #[inline]
  fn len(&self) -> usize {
    self.back - self.front
  }
}

impl<T> FusedIterator for Iter<'_, T> {}
