use core::{fmt, iter::FusedIterator, marker::PhantomData, ptr::NonNull};

use super::{iter::Iter, map::slot_at};

/// A mutable iterator over the elements of a [`BlockDeque`](crate::BlockDeque).
///
/// This `struct` is created by the [`iter_mut`] and [`range_mut`] methods on
/// [`BlockDeque`](crate::BlockDeque). See their documentation for more.
///
/// [`iter_mut`]: crate::BlockDeque::iter_mut
/// [`range_mut`]: crate::BlockDeque::range_mut
pub struct IterMut<'a, T> {
  base: NonNull<NonNull<T>>,
  front: usize,
  back: usize,
  _marker: PhantomData<&'a mut T>,
}

// SAFETY: `IterMut` hands out unique references to distinct elements.
unsafe impl<T: Send> Send for IterMut<'_, T> {}
// SAFETY: a shared `IterMut` only exposes shared views.
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<'a, T> IterMut<'a, T> {
  pub(super) fn new(base: NonNull<NonNull<T>>, front: usize, back: usize) -> Self {
    Self {
      base,
      front,
      back,
      _marker: PhantomData,
    }
  }

  /// Views the elements not yet yielded as a shared iterator.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut deque = block_deque![0, 1, 2, 3];
  /// let mut iter = deque.iter_mut();
  /// iter.next();
  /// iter.next_back();
  ///
  /// assert_eq!(iter.as_iter().copied().collect::<Vec<_>>(), [1, 2]);
  /// ```
  pub fn as_iter(&self) -> Iter<'_, T> {
    Iter::new(self.base, self.front, self.back)
  }
}

impl<T: fmt::Debug> fmt::Debug for IterMut<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("IterMut").field(&self.as_iter()).finish()
  }
}

impl<T> Default for IterMut<'_, T> {
  /// Creates an empty `IterMut`.
  ///
  /// ```
  /// let iter: block_deque::IterMut<'_, u8> = Default::default();
  /// assert_eq!(iter.len(), 0);
  /// ```
  fn default() -> Self {
    Self::new(NonNull::dangling(), 0, 0)
  }
}

impl<'a, T> Iterator for IterMut<'a, T> {
  type Item = &'a mut T;

  #[inline]
  fn next(&mut self) -> Option<&'a mut T> {
    if self.front == self.back {
      return None;
    }
    // SAFETY: every position in `front..back` is yielded at most once, so the
    // returned references never alias.
    let item = unsafe { &mut *slot_at(self.base.as_ptr(), self.front) };
    self.front += 1;
    Some(item)
  }

  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    let len = self.len();
    (len, Some(len))
  }

  #[inline]
  fn nth(&mut self, n: usize) -> Option<&'a mut T> {
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
  fn last(mut self) -> Option<&'a mut T> {
    self.next_back()
  }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
  #[inline]
  fn next_back(&mut self) -> Option<&'a mut T> {
    if self.front == self.back {
      return None;
    }
    self.back -= 1;
    // SAFETY: see `next`.
    Some(unsafe { &mut *slot_at(self.base.as_ptr(), self.back) })
  }

  #[inline]
  fn nth_back(&mut self, n: usize) -> Option<&'a mut T> {
    if n >= self.len() {
      self.back = self.front;
      return None;
    }
    self.back -= n;
    self.next_back()
  }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {
  #[inline]
  fn len(&self) -> usize {
    self.back - self.front
  }
}

impl<T> FusedIterator for IterMut<'_, T> {}
