use super::{BlockDeque, MemoryResource};

/// Removes every element of `deque` for which `pred` returns `true` and
/// returns how many were removed.
///
/// The survivors keep their relative order. Each element is visited once, in
/// order, and compaction happens in place.
///
/// ## Examples
///
/// ```
/// use block_deque::{block_deque, erase_if};
///
/// let mut deque = block_deque![1, 2, 2, 3];
/// assert_eq!(erase_if(&mut deque, |v| *v == 2), 2);
/// assert_eq!(deque, [1, 3]);
/// ```
pub fn erase_if<T, A, F>(deque: &mut BlockDeque<T, A>, mut pred: F) -> usize
where
  A: MemoryResource,
  F: FnMut(&T) -> bool,
{
  let before = deque.len();
  deque.retain(|e| !pred(e));
  before - deque.len()
}

/// Removes every element of `deque` equal to `value` and returns how many
/// were removed.
///
/// ## Examples
///
/// ```
/// use block_deque::{block_deque, erase};
///
/// let mut deque = block_deque![1, 2, 2, 3];
/// assert_eq!(erase(&mut deque, &2), 2);
/// assert_eq!(deque, [1, 3]);
/// ```
pub fn erase<T, U, A>(deque: &mut BlockDeque<T, A>, value: &U) -> usize
where
  T: PartialEq<U>,
  A: MemoryResource,
{
  erase_if(deque, |e| e == value)
}

impl<T, A: MemoryResource> BlockDeque<T, A> {
  /// Retains only the elements specified by the predicate.
  ///
  /// In other words, remove all elements `e` for which `f(&e)` returns false.
  /// This method operates in place, visiting each element exactly once in the
  /// original order, and preserves the order of the retained elements.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut buf: BlockDeque<_> = (1..5).collect();
  /// buf.retain(|&x| x % 2 == 0);
  /// assert_eq!(buf, [2, 4]);
  /// ```
  ///
  /// Because the elements are visited exactly once in the original order,
  /// external state may be used to decide which elements to keep.
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut buf: BlockDeque<_> = (1..6).collect();
  /// let keep = [false, true, true, false, true];
  /// let mut iter = keep.iter();
  /// buf.retain(|_| *iter.next().unwrap());
  /// assert_eq!(buf, [2, 3, 5]);
  /// ```
  pub fn retain<F>(&mut self, mut f: F)
  where
    F: FnMut(&T) -> bool,
  {
    self.retain_mut(|elem| f(elem));
  }

  /// Retains only the elements specified by the predicate.
  ///
  /// In other words, remove all elements `e` for which `f(&mut e)` returns false.
  /// This method operates in place, visiting each element exactly once in the
  /// original order, and preserves the order of the retained elements.
  ///
  /// If `f` panics, the deque stays valid and keeps every element, in an
  /// unspecified order.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut buf: BlockDeque<_> = (1..5).collect();
  /// buf.retain_mut(|x| if *x % 2 == 0 {
  ///   *x += 1;
  ///   true
  /// } else {
  ///   false
  /// });
  /// assert_eq!(buf, [3, 5]);
  /// ```
  pub fn retain_mut<F>(&mut self, mut f: F)
  where
    F: FnMut(&mut T) -> bool,
  {
    let len = self.len();
    let mut idx = 0;
    let mut cur = 0;

    // Stage 1: All values are retained.
    while cur < len {
      if !f(&mut self[cur]) {
        cur += 1;
        break;
      }
      cur += 1;
      idx += 1;
    }
    // Stage 2: Swap retained value into current idx.
    while cur < len {
      if !f(&mut self[cur]) {
        cur += 1;
        continue;
      }

      self.swap(idx, cur);
      cur += 1;
      idx += 1;
    }
    // Stage 3: Truncate all values after idx.
    if cur != idx {
      self.truncate(idx);
    }
  }
}
