#![doc = include_str!("../README.md")]
#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]
#![deny(missing_docs)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

use alloc::vec::Vec;
use core::{
  cmp::{self, Ordering},
  fmt,
  hash::{Hash, Hasher},
  iter::{once, repeat_with},
  marker::PhantomData,
  mem,
  ops::{self, Index, IndexMut, RangeBounds},
  ptr::{self, NonNull},
};

pub use affinity::{Affinity, MemoryResource};
pub use allocator_api2::alloc::{AllocError, Allocator, Global};
pub use erasure::{erase, erase_if};
pub use error::{OutOfRangeError, TryReserveError};
pub use into_iter::IntoIter;
pub use iter::Iter;
pub use iter_mut::IterMut;

use map::{slot_at, BlockMap};

mod affinity;
mod erasure;
mod error;
mod into_iter;
mod iter;
mod iter_mut;
mod macros;
mod map;
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde;

#[cfg(test)]
mod heap_tests;

/// A double-ended queue stored in fixed-size blocks drawn from a memory
/// resource.
///
/// `BlockDeque` keeps its elements in a sequence of equally sized blocks and a
/// small buffer of block handles. Pushing or popping at either end costs
/// amortised *O*(1) and never moves the other elements, so the address of an
/// element stays the same for as long as it is only the ends of the deque that
/// change. Random access costs *O*(1) through one division.
///
/// Elements smaller than 256 bytes get blocks of 4 KiB; bigger elements get
/// blocks of 16 slots. See [`block_len`](BlockDeque::block_len).
///
/// The memory resource `A` and the [`Affinity`] policy decide what happens to
/// the storage when a deque is copied, moved or swapped. See
/// [`move_assign`](BlockDeque::move_assign) and
/// [`swap_with`](BlockDeque::swap_with).
///
/// ## Examples
///
/// Basic usage:
///
/// ```rust
/// use block_deque::BlockDeque;
///
/// let mut deque = BlockDeque::new();
///
/// deque.push_back(1);
/// deque.push_back(2);
/// deque.push_front(0);
///
/// assert_eq!(deque.len(), 3);
/// assert_eq!(deque[0], 0);
/// assert_eq!(deque[1], 1);
/// assert_eq!(deque[2], 2);
///
/// assert_eq!(deque.pop_front(), Some(0));
/// assert_eq!(deque.pop_back(), Some(2));
/// assert_eq!(deque.len(), 1);
/// ```
///
/// Element addresses survive pushes and pops at the ends:
///
/// ```rust
/// use block_deque::BlockDeque;
///
/// let mut deque: BlockDeque<u64> = (0..10_000).collect();
/// let addr = &deque[5_000] as *const u64;
///
/// for i in 0..10_000 {
///   deque.push_front(i);
///   deque.push_back(i);
/// }
/// deque.pop_back();
/// deque.pop_front();
///
/// assert!(core::ptr::eq(&deque[14_999], addr));
/// ```
///
/// Iterating over elements:
///
/// ```rust
/// use block_deque::block_deque;
///
/// let mut deque = block_deque![1, 2, 3];
///
/// let sum: i32 = deque.iter().sum();
/// assert_eq!(sum, 6);
///
/// for item in deque.iter_mut() {
///   *item *= 2;
/// }
/// assert_eq!(deque.iter().sum::<i32>(), 12);
/// ```
pub struct BlockDeque<T, A: MemoryResource = Global> {
  map: BlockMap<T>,
  alloc: A,
  affinity: Affinity,
}

// SAFETY: the deque owns its elements and blocks exclusively, like a `Vec<T, A>`.
unsafe impl<T: Send, A: MemoryResource + Send> Send for BlockDeque<T, A> {}
// SAFETY: shared access never mutates through the block pointers.
unsafe impl<T: Sync, A: MemoryResource + Sync> Sync for BlockDeque<T, A> {}

impl<T: Clone, A: MemoryResource> Clone for BlockDeque<T, A> {
  /// Copies the deque into the resource returned by
  /// [`MemoryResource::select_on_copy`].
  fn clone(&self) -> Self {
    self.try_clone().unwrap_or_else(|e| e.escalate())
  }

  /// Assigns the elements of `source`, following the `propagate_on_copy` flag
  /// of `self`. See [`try_assign_from`](BlockDeque::try_assign_from).
  fn clone_from(&mut self, source: &Self) {
    if let Err(e) = self.try_assign_from(source) {
      e.escalate()
    }
  }
}

impl<T, A: MemoryResource + Default> Default for BlockDeque<T, A> {
  #[cfg_attr(not(tarpaulin), inline(always))]
  fn default() -> Self {
    Self::new_in(A::default())
  }
}

impl<T: fmt::Debug, A: MemoryResource> fmt::Debug for BlockDeque<T, A> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

impl<T, U, A1, A2> PartialEq<BlockDeque<U, A2>> for BlockDeque<T, A1>
where
  T: PartialEq<U>,
  A1: MemoryResource,
  A2: MemoryResource,
{
  fn eq(&self, other: &BlockDeque<U, A2>) -> bool {
    self.len() == other.len() && self.iter().eq(other.iter())
  }
}

impl<T: Eq, A: MemoryResource> Eq for BlockDeque<T, A> {}

macro_rules! __impl_slice_eq1 {
    ([$($vars:tt)*] $lhs:ty, $rhs:ty) => {
        impl<T, U, A: MemoryResource, $($vars)*> PartialEq<$rhs> for $lhs
        where
            T: PartialEq<U>,
        {
            fn eq(&self, other: &$rhs) -> bool {
                self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
            }
        }
    }
}
__impl_slice_eq1! { [] BlockDeque<T, A>, Vec<U> }
__impl_slice_eq1! { [] BlockDeque<T, A>, &[U] }
__impl_slice_eq1! { [] BlockDeque<T, A>, &mut [U] }
__impl_slice_eq1! { [const N: usize] BlockDeque<T, A>, [U; N] }
__impl_slice_eq1! { [const N: usize] BlockDeque<T, A>, &[U; N] }
__impl_slice_eq1! { [const N: usize] BlockDeque<T, A>, &mut [U; N] }

impl<T: PartialOrd, A1: MemoryResource, A2: MemoryResource> PartialOrd<BlockDeque<T, A2>>
  for BlockDeque<T, A1>
{
  fn partial_cmp(&self, other: &BlockDeque<T, A2>) -> Option<Ordering> {
    self.iter().partial_cmp(other.iter())
  }
}

impl<T: Ord, A: MemoryResource> Ord for BlockDeque<T, A> {
  #[inline]
  fn cmp(&self, other: &Self) -> Ordering {
    self.iter().cmp(other.iter())
  }
}

impl<T: Hash, A: MemoryResource> Hash for BlockDeque<T, A> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_usize(self.len());
    // Block boundaries depend on the front offset, so hash element by element
    // to keep equal deques hashing equally.
    self.iter().for_each(|elem| elem.hash(state));
  }
}

impl<T, A: MemoryResource> Index<usize> for BlockDeque<T, A> {
  type Output = T;

  #[inline]
  #[track_caller]
  fn index(&self, index: usize) -> &T {
    self.get(index).expect("Out of bounds access")
  }
}

impl<T, A: MemoryResource> IndexMut<usize> for BlockDeque<T, A> {
  #[inline]
  #[track_caller]
  fn index_mut(&mut self, index: usize) -> &mut T {
    self.get_mut(index).expect("Out of bounds access")
  }
}

impl<T, A: MemoryResource> IntoIterator for BlockDeque<T, A> {
  type Item = T;
  type IntoIter = IntoIter<T, A>;

  /// Consumes the deque into a front-to-back iterator yielding elements by
  /// value.
  fn into_iter(self) -> IntoIter<T, A> {
    IntoIter::new(self)
  }
}

impl<'a, T, A: MemoryResource> IntoIterator for &'a BlockDeque<T, A> {
  type Item = &'a T;
  type IntoIter = Iter<'a, T>;

  fn into_iter(self) -> Iter<'a, T> {
    self.iter()
  }
}

impl<'a, T, A: MemoryResource> IntoIterator for &'a mut BlockDeque<T, A> {
  type Item = &'a mut T;
  type IntoIter = IterMut<'a, T>;

  fn into_iter(self) -> IterMut<'a, T> {
    self.iter_mut()
  }
}

impl<T, A: MemoryResource + Default> FromIterator<T> for BlockDeque<T, A> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    Self::from_iter_in(iter, A::default())
  }
}

impl<T, A: MemoryResource> Extend<T> for BlockDeque<T, A> {
  fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
    let iter = iter.into_iter();
    let (lower, _) = iter.size_hint();
    if lower > 0 {
      self.reserve_back(lower);
    }
    for item in iter {
      self.push_back(item);
    }
  }
}

impl<'a, T: Copy + 'a, A: MemoryResource> Extend<&'a T> for BlockDeque<T, A> {
  fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
    self.extend(iter.into_iter().copied());
  }
}

impl<T, const N: usize> From<[T; N]> for BlockDeque<T> {
  /// Converts a `[T; N]` into a `BlockDeque<T>`.
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let deq1 = BlockDeque::from([1, 2, 3, 4]);
  /// let deq2: BlockDeque<_> = [1, 2, 3, 4].into();
  /// assert_eq!(deq1, deq2);
  /// ```
  fn from(arr: [T; N]) -> Self {
    arr.into_iter().collect()
  }
}

impl<T> From<Vec<T>> for BlockDeque<T> {
  fn from(vec: Vec<T>) -> Self {
    vec.into_iter().collect()
  }
}

impl<T: Clone> From<&[T]> for BlockDeque<T> {
  fn from(slice: &[T]) -> Self {
    slice.iter().cloned().collect()
  }
}

impl<T, A: MemoryResource> From<BlockDeque<T, A>> for Vec<T> {
  fn from(deq: BlockDeque<T, A>) -> Self {
    let mut vec = Vec::with_capacity(deq.len());
    vec.extend(deq);
    vec
  }
}

impl<T, A: MemoryResource> Drop for BlockDeque<T, A> {
  fn drop(&mut self) {
    /// Releases the storage even when an element destructor panics.
    struct Release<'a, T, A: MemoryResource>(&'a mut BlockDeque<T, A>);

    impl<T, A: MemoryResource> Drop for Release<'_, T, A> {
      fn drop(&mut self) {
        let deque = &mut *self.0;
        deque.map.release(&deque.alloc);
      }
    }

    let guard = Release(self);
    let map = &mut guard.0.map;
    let (start, len) = (map.start(), map.len());
    // SAFETY: the length is cleared before any destructor runs, so the
    // elements are dropped exactly once.
    unsafe {
      map.set_len(0);
      drop_positions(map.base().as_ptr(), start, start + len);
    }
  }
}

impl<T> BlockDeque<T> {
  /// Creates an empty deque in the global allocator.
  ///
  /// No storage is allocated until the first element is inserted. From then
  /// on the deque holds at least one block, even when emptied or moved from.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut deque: BlockDeque<u32> = BlockDeque::new();
  /// assert!(deque.is_empty());
  ///
  /// deque.push_back(1);
  /// assert_eq!(deque.pop_back(), Some(1));
  /// assert_eq!(deque.block_count(), 1);
  /// ```
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn new() -> Self {
    Self::with_affinity_in(<Global as MemoryResource>::AFFINITY, Global)
  }

  /// Creates a deque holding `count` clones of `value`.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let deque = BlockDeque::from_elem(3, "hi");
  /// assert_eq!(deque, ["hi", "hi", "hi"]);
  /// ```
  pub fn from_elem(count: usize, value: T) -> Self
  where
    T: Clone,
  {
    Self::from_elem_in(count, value, Global)
  }
}

impl<T, A: MemoryResource> BlockDeque<T, A> {
  /// Creates an empty deque drawing its blocks from `alloc`, with the
  /// resource's default [`Affinity`].
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::{BlockDeque, Global};
  ///
  /// let mut deque = BlockDeque::new_in(Global);
  /// deque.push_back('a');
  /// assert_eq!(deque.front(), Some(&'a'));
  /// ```
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn new_in(alloc: A) -> Self {
    Self::with_affinity_in(A::AFFINITY, alloc)
  }

  /// Creates an empty deque drawing its blocks from `alloc` and following the
  /// given copy/move/swap policy.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::{Affinity, BlockDeque, Global};
  ///
  /// let deque: BlockDeque<u8> = BlockDeque::with_affinity_in(Affinity::PROPAGATE_ALL, Global);
  /// assert!(deque.affinity().propagate_on_swap());
  /// ```
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn with_affinity_in(affinity: Affinity, alloc: A) -> Self {
    Self {
      map: BlockMap::new(),
      alloc,
      affinity,
    }
  }

  /// Creates a deque in `alloc` holding `count` clones of `value`.
  pub fn from_elem_in(count: usize, value: T, alloc: A) -> Self
  where
    T: Clone,
  {
    Self::try_from_elem_in(count, value, alloc).unwrap_or_else(|e| e.escalate())
  }

  /// Creates a deque in `alloc` holding `count` clones of `value`, or reports
  /// why the storage could not be obtained.
  ///
  /// Every block is acquired before the first clone is made.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::{BlockDeque, Global, TryReserveError};
  ///
  /// let deque = BlockDeque::try_from_elem_in(2_000, 7u8, Global).unwrap();
  /// assert_eq!(deque.len(), 2_000);
  ///
  /// let err = BlockDeque::try_from_elem_in(usize::MAX, 7u8, Global).unwrap_err();
  /// assert_eq!(err, TryReserveError::CapacityOverflow);
  /// ```
  pub fn try_from_elem_in(count: usize, value: T, alloc: A) -> Result<Self, TryReserveError>
  where
    T: Clone,
  {
    let mut deque = Self::new_in(alloc);
    deque.try_resize(count, value)?;
    Ok(deque)
  }

  /// Creates a deque in `alloc` from the items of `iter`, in order.
  pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: A) -> Self {
    Self::try_from_iter_in(iter, alloc).unwrap_or_else(|e| e.escalate())
  }

  /// Creates a deque in `alloc` from the items of `iter`, or reports why the
  /// storage could not be obtained.
  ///
  /// On failure the items taken from `iter` so far are dropped.
  pub fn try_from_iter_in<I: IntoIterator<Item = T>>(
    iter: I,
    alloc: A,
  ) -> Result<Self, TryReserveError> {
    let iter = iter.into_iter();
    let mut deque = Self::new_in(alloc);
    let (lower, _) = iter.size_hint();
    if lower > 0 {
      deque.try_reserve_back(lower)?;
    }
    for item in iter {
      deque.try_push_back(item)?;
    }
    Ok(deque)
  }

  /// Returns the memory resource the deque draws its blocks from.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn allocator(&self) -> &A {
    &self.alloc
  }

  /// Returns the copy/move/swap policy of the deque.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn affinity(&self) -> Affinity {
    self.affinity
  }

  /// Returns the number of elements in the deque.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut deque = BlockDeque::new();
  /// assert_eq!(deque.len(), 0);
  /// deque.push_back(1);
  /// assert_eq!(deque.len(), 1);
  /// ```
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn len(&self) -> usize {
    self.map.len()
  }

  /// Returns `true` if the deque is empty.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn is_empty(&self) -> bool {
    self.map.len() == 0
  }

  /// Returns the number of element slots in one block.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// assert_eq!(BlockDeque::<u32>::new().block_len(), 1024);
  /// assert_eq!(BlockDeque::<[u8; 300]>::new().block_len(), 16);
  /// ```
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn block_len(&self) -> usize {
    map::block_len::<T>()
  }

  /// Returns the number of blocks currently held, spare ones included.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn block_count(&self) -> usize {
    self.map.blocks()
  }

  /// Returns the number of elements that can be pushed to the back before
  /// another block is needed.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn back_capacity(&self) -> usize {
    self.map.back_room()
  }

  /// Returns the number of elements that can be pushed to the front before
  /// another block is needed.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn front_capacity(&self) -> usize {
    self.map.front_room()
  }

  /// Acquires enough blocks to push `additional` more elements to the back
  /// without allocating.
  ///
  /// ## Panics
  ///
  /// Panics if the slot count overflows `usize`; aborts through
  /// [`handle_alloc_error`](alloc::alloc::handle_alloc_error) if the resource
  /// fails.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut deque: BlockDeque<u32> = BlockDeque::new();
  /// deque.reserve_back(5_000);
  /// assert!(deque.back_capacity() >= 5_000);
  /// ```
  #[track_caller]
  pub fn reserve_back(&mut self, additional: usize) {
    if let Err(e) = self.try_reserve_back(additional) {
      e.escalate()
    }
  }

  /// Acquires enough blocks to push `additional` more elements to the front
  /// without allocating.
  ///
  /// ## Panics
  ///
  /// Same as [`reserve_back`](BlockDeque::reserve_back).
  #[track_caller]
  pub fn reserve_front(&mut self, additional: usize) {
    if let Err(e) = self.try_reserve_front(additional) {
      e.escalate()
    }
  }

  /// Fallible form of [`reserve_back`](BlockDeque::reserve_back).
  ///
  /// Blocks acquired before a failure are kept as spare capacity.
  #[inline]
  pub fn try_reserve_back(&mut self, additional: usize) -> Result<(), TryReserveError> {
    self.map.try_reserve_back(additional, &self.alloc)
  }

  /// Fallible form of [`reserve_front`](BlockDeque::reserve_front).
  ///
  /// Blocks acquired before a failure are kept as spare capacity.
  #[inline]
  pub fn try_reserve_front(&mut self, additional: usize) -> Result<(), TryReserveError> {
    self.map.try_reserve_front(additional, &self.alloc)
  }

  /// Releases every block that holds no element. An empty deque keeps one
  /// block.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut deque: BlockDeque<u32> = BlockDeque::new();
  /// deque.reserve_back(10_000);
  /// deque.push_back(1);
  /// deque.shrink_to_fit();
  /// assert_eq!(deque.block_count(), 1);
  /// ```
  pub fn shrink_to_fit(&mut self) {
    self.map.shrink_to_fit(&self.alloc);
  }

  /// Returns a front-to-back iterator.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let deque = block_deque![5, 3, 4];
  /// let b: &[_] = &[&5, &3, &4];
  /// let c: Vec<&i32> = deque.iter().collect();
  /// assert_eq!(&c[..], b);
  /// ```
  #[inline]
  pub fn iter(&self) -> Iter<'_, T> {
    let start = self.map.start();
    Iter::new(self.map.base(), start, start + self.len())
  }

  /// Returns a front-to-back iterator that returns mutable references.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut deque = block_deque![5, 3, 4];
  /// for num in deque.iter_mut() {
  ///   *num = *num - 2;
  /// }
  /// assert_eq!(deque, [3, 1, 2]);
  /// ```
  #[inline]
  pub fn iter_mut(&mut self) -> IterMut<'_, T> {
    let start = self.map.start();
    IterMut::new(self.map.base(), start, start + self.len())
  }

  /// Creates an iterator that covers the specified range in the deque.
  ///
  /// ## Panics
  ///
  /// Panics if the starting point is greater than the end point or if
  /// the end point is greater than the length of the deque.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let deque: BlockDeque<_> = [1, 2, 3].into();
  /// let range = deque.range(2..).copied().collect::<BlockDeque<_>>();
  /// assert_eq!(range, [3]);
  ///
  /// // A full range covers all contents
  /// let all = deque.range(..);
  /// assert_eq!(all.len(), 3);
  /// ```
  #[inline]
  #[track_caller]
  pub fn range<R>(&self, range: R) -> Iter<'_, T>
  where
    R: RangeBounds<usize>,
  {
    let ops::Range { start, end } = self::range(range, ..self.len());
    let front = self.map.start();
    Iter::new(self.map.base(), front + start, front + end)
  }

  /// Creates an iterator that covers the specified mutable range in the deque.
  ///
  /// ## Panics
  ///
  /// Panics if the starting point is greater than the end point or if
  /// the end point is greater than the length of the deque.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut deque: BlockDeque<_> = [1, 2, 3].into();
  /// for v in deque.range_mut(2..) {
  ///   *v *= 2;
  /// }
  /// assert_eq!(deque, [1, 2, 6]);
  /// ```
  #[inline]
  #[track_caller]
  pub fn range_mut<R>(&mut self, range: R) -> IterMut<'_, T>
  where
    R: RangeBounds<usize>,
  {
    let ops::Range { start, end } = self::range(range, ..self.len());
    let front = self.map.start();
    IterMut::new(self.map.base(), front + start, front + end)
  }

  /// Provides a reference to the front element, or `None` if the deque is
  /// empty.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut d = BlockDeque::new();
  /// assert_eq!(d.front(), None);
  ///
  /// d.push_back(1);
  /// d.push_back(2);
  /// assert_eq!(d.front(), Some(&1));
  /// ```
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub fn front(&self) -> Option<&T> {
    self.get(0)
  }

  /// Provides a mutable reference to the front element, or `None` if the
  /// deque is empty.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub fn front_mut(&mut self) -> Option<&mut T> {
    self.get_mut(0)
  }

  /// Provides a reference to the back element, or `None` if the deque is
  /// empty.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut d = BlockDeque::new();
  /// assert_eq!(d.back(), None);
  ///
  /// d.push_back(1);
  /// d.push_back(2);
  /// assert_eq!(d.back(), Some(&2));
  /// ```
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub fn back(&self) -> Option<&T> {
    self.len().checked_sub(1).and_then(|i| self.get(i))
  }

  /// Provides a mutable reference to the back element, or `None` if the
  /// deque is empty.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub fn back_mut(&mut self) -> Option<&mut T> {
    match self.len().checked_sub(1) {
      Some(i) => self.get_mut(i),
      None => None,
    }
  }

  /// Provides a reference to the element at the given index.
  ///
  /// Element at index 0 is the front of the queue.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let buf = block_deque![3, 4, 5];
  /// assert_eq!(buf.get(1), Some(&4));
  /// assert_eq!(buf.get(3), None);
  /// ```
  #[inline]
  pub fn get(&self, index: usize) -> Option<&T> {
    if index < self.len() {
      // SAFETY: `index` is in bounds.
      Some(unsafe { &*self.map.slot(index) })
    } else {
      None
    }
  }

  /// Provides a mutable reference to the element at the given index.
  #[inline]
  pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
    if index < self.len() {
      // SAFETY: `index` is in bounds and `self` is borrowed mutably.
      Some(unsafe { &mut *self.map.slot(index) })
    } else {
      None
    }
  }

  /// Bounds-checked access that reports the failed index.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let buf = block_deque![3, 4, 5];
  /// assert_eq!(buf.at(0), Ok(&3));
  ///
  /// let err = buf.at(7).unwrap_err();
  /// assert_eq!((err.index(), err.deque_len()), (7, 3));
  /// ```
  #[inline]
  pub fn at(&self, index: usize) -> Result<&T, OutOfRangeError> {
    let len = self.len();
    self.get(index).ok_or(OutOfRangeError::new(index, len))
  }

  /// Mutable form of [`at`](BlockDeque::at).
  #[inline]
  pub fn at_mut(&mut self, index: usize) -> Result<&mut T, OutOfRangeError> {
    let len = self.len();
    self.get_mut(index).ok_or(OutOfRangeError::new(index, len))
  }

  /// Returns `true` if the deque contains an element equal to the
  /// given value.
  ///
  /// This operation is *O*(*n*).
  #[inline]
  pub fn contains(&self, x: &T) -> bool
  where
    T: PartialEq<T>,
  {
    self.iter().any(|e| e == x)
  }

  /// Swaps elements at indices `i` and `j`.
  ///
  /// `i` and `j` may be equal.
  ///
  /// ## Panics
  ///
  /// Panics if either index is out of bounds.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut buf = block_deque![3, 4, 5];
  /// buf.swap(0, 2);
  /// assert_eq!(buf, [5, 4, 3]);
  /// ```
  #[inline]
  #[track_caller]
  pub fn swap(&mut self, i: usize, j: usize) {
    assert!(i < self.len());
    assert!(j < self.len());
    // SAFETY: both indices were checked above.
    unsafe { self.map.swap_slots(i, j) }
  }

  /// Appends an element to the back of the deque.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut buf = BlockDeque::new();
  /// buf.push_back(1);
  /// buf.push_back(3);
  /// assert_eq!(3, *buf.back().unwrap());
  /// ```
  #[inline]
  #[track_caller]
  pub fn push_back(&mut self, value: T) {
    if let Err(e) = self.try_push_back(value) {
      e.escalate()
    }
  }

  /// Prepends an element to the front of the deque.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut d = BlockDeque::new();
  /// d.push_front(1);
  /// d.push_front(2);
  /// assert_eq!(d.front(), Some(&2));
  /// ```
  #[inline]
  #[track_caller]
  pub fn push_front(&mut self, value: T) {
    if let Err(e) = self.try_push_front(value) {
      e.escalate()
    }
  }

  /// Appends an element to the back of the deque, or reports why no room
  /// could be made for it.
  ///
  /// The block is acquired before `value` is written. On failure the deque is
  /// unchanged and `value` is dropped.
  #[inline]
  pub fn try_push_back(&mut self, value: T) -> Result<(), TryReserveError> {
    self.map.try_reserve_back(1, &self.alloc)?;
    // SAFETY: one slot was reserved behind the back element.
    unsafe { self.map.write_back(value) };
    Ok(())
  }

  /// Prepends an element to the front of the deque, or reports why no room
  /// could be made for it.
  ///
  /// The block is acquired before `value` is written. On failure the deque is
  /// unchanged and `value` is dropped.
  #[inline]
  pub fn try_push_front(&mut self, value: T) -> Result<(), TryReserveError> {
    self.map.try_reserve_front(1, &self.alloc)?;
    // SAFETY: one slot was reserved in front of the front element.
    unsafe { self.map.write_front(value) };
    Ok(())
  }

  /// Removes the last element and returns it, or `None` if the deque is
  /// empty.
  ///
  /// A block left without elements is released, the last block is kept.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut buf = BlockDeque::new();
  /// assert_eq!(buf.pop_back(), None);
  /// buf.push_back(1);
  /// buf.push_back(3);
  /// assert_eq!(buf.pop_back(), Some(3));
  /// ```
  #[inline]
  pub fn pop_back(&mut self) -> Option<T> {
    if self.is_empty() {
      return None;
    }
    // SAFETY: the deque is not empty.
    let value = unsafe { self.map.read_back() };
    self.trim_back();
    Some(value)
  }

  /// Removes the first element and returns it, or `None` if the deque is
  /// empty.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::BlockDeque;
  ///
  /// let mut d = BlockDeque::new();
  /// d.push_back(1);
  /// d.push_back(2);
  ///
  /// assert_eq!(d.pop_front(), Some(1));
  /// assert_eq!(d.pop_front(), Some(2));
  /// assert_eq!(d.pop_front(), None);
  /// ```
  #[inline]
  pub fn pop_front(&mut self) -> Option<T> {
    if self.is_empty() {
      return None;
    }
    // SAFETY: the deque is not empty.
    let value = unsafe { self.map.read_front() };
    self.trim_front();
    Some(value)
  }

  /// Inserts an element at `index`, shifting whichever side of `index` is
  /// shorter. Returns `index`.
  ///
  /// ## Panics
  ///
  /// Panics if `index` is greater than the deque's length.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut deque = block_deque!['a', 'b', 'c'];
  /// assert_eq!(deque.insert(1, 'd'), 1);
  /// assert_eq!(deque, ['a', 'd', 'b', 'c']);
  /// ```
  #[track_caller]
  pub fn insert(&mut self, index: usize, value: T) -> usize {
    self
      .try_insert(index, value)
      .unwrap_or_else(|e| e.escalate())
  }

  /// Fallible form of [`insert`](BlockDeque::insert). On failure the deque is
  /// unchanged and `value` is dropped.
  #[track_caller]
  pub fn try_insert(&mut self, index: usize, value: T) -> Result<usize, TryReserveError> {
    self.try_insert_iter(index, once(value))
  }

  /// Inserts `count` clones of `value` at `index`. Returns `index`.
  ///
  /// All the needed blocks are acquired before the first clone is made.
  ///
  /// ## Panics
  ///
  /// Panics if `index` is greater than the deque's length.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut deque = block_deque![1, 5];
  /// deque.insert_n(1, 3, 0);
  /// assert_eq!(deque, [1, 0, 0, 0, 5]);
  /// ```
  #[track_caller]
  pub fn insert_n(&mut self, index: usize, count: usize, value: T) -> usize
  where
    T: Clone,
  {
    self
      .try_insert_n(index, count, value)
      .unwrap_or_else(|e| e.escalate())
  }

  /// Fallible form of [`insert_n`](BlockDeque::insert_n).
  #[track_caller]
  pub fn try_insert_n(
    &mut self,
    index: usize,
    count: usize,
    value: T,
  ) -> Result<usize, TryReserveError>
  where
    T: Clone,
  {
    self.try_insert_iter(index, repeat_n(value, count))
  }

  /// Inserts the items of `iter` at `index`, keeping their order. Returns
  /// `index`.
  ///
  /// The items enter at whichever end is closer to `index` and the elements
  /// between that end and `index` are shifted past them. Elements on the
  /// other side of `index` are not moved.
  ///
  /// ## Panics
  ///
  /// Panics if `index` is greater than the deque's length.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut deque = block_deque![1, 2, 6];
  /// deque.insert_iter(2, 3..6);
  /// assert_eq!(deque, [1, 2, 3, 4, 5, 6]);
  /// ```
  #[track_caller]
  pub fn insert_iter<I>(&mut self, index: usize, iter: I) -> usize
  where
    I: IntoIterator<Item = T>,
  {
    self
      .try_insert_iter(index, iter)
      .unwrap_or_else(|e| e.escalate())
  }

  /// Fallible form of [`insert_iter`](BlockDeque::insert_iter).
  ///
  /// On failure the items already taken from `iter` are dropped and the deque
  /// is left with its previous elements. The same happens when `iter`
  /// panics.
  #[track_caller]
  pub fn try_insert_iter<I>(&mut self, index: usize, iter: I) -> Result<usize, TryReserveError>
  where
    I: IntoIterator<Item = T>,
  {
    let len = self.len();
    assert!(
      index <= len,
      "insertion index (is {index}) should be <= len (is {len})"
    );

    if index < len - index {
      self.insert_at_front(index, iter.into_iter())
    } else {
      self.insert_at_back(index, iter.into_iter())
    }
  }

  /// Removes and returns the element at `index` from the deque.
  /// Whichever end is closer to the removal point will be moved to make
  /// room, and all the affected elements will be moved to new positions.
  /// Returns `None` if `index` is out of bounds.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut buf = block_deque![1, 2, 3];
  /// assert_eq!(buf.remove(1), Some(2));
  /// assert_eq!(buf, [1, 3]);
  /// assert_eq!(buf.remove(5), None);
  /// ```
  pub fn remove(&mut self, index: usize) -> Option<T> {
    let len = self.len();
    if index >= len {
      return None;
    }

    // SAFETY: every swapped index is below `len`.
    unsafe {
      if index < len - 1 - index {
        for i in (0..index).rev() {
          self.map.swap_slots(i, i + 1);
        }
        self.pop_front()
      } else {
        for i in index..len - 1 {
          self.map.swap_slots(i, i + 1);
        }
        self.pop_back()
      }
    }
  }

  /// Removes the elements in `range`, shifting whichever outer part is
  /// shorter inward. Returns the index of the first element after the
  /// removed ones, which is the start of the range.
  ///
  /// ## Panics
  ///
  /// Panics if the starting point is greater than the end point or if
  /// the end point is greater than the length of the deque.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut deque = block_deque![0, 1, 2, 3, 4, 5];
  /// assert_eq!(deque.erase(1..3), 1);
  /// assert_eq!(deque, [0, 3, 4, 5]);
  ///
  /// deque.erase(..);
  /// assert!(deque.is_empty());
  /// ```
  #[track_caller]
  pub fn erase<R>(&mut self, range: R) -> usize
  where
    R: RangeBounds<usize>,
  {
    let len = self.len();
    let ops::Range { start, end } = self::range(range, ..len);
    let count = end - start;
    if count == 0 {
      return start;
    }

    // SAFETY: every swapped index is below `len`.
    unsafe {
      if start < len - end {
        for i in (0..start).rev() {
          self.map.swap_slots(i, i + count);
        }
        self.truncate_front(count);
      } else {
        for i in end..len {
          self.map.swap_slots(i, i - count);
        }
        self.truncate(len - count);
      }
    }
    start
  }

  /// Shortens the deque, keeping the first `len` elements and dropping
  /// the rest.
  ///
  /// If `len` is greater or equal to the deque's current length, this has
  /// no effect.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut buf = block_deque![5, 10, 15];
  /// buf.truncate(1);
  /// assert_eq!(buf, [5]);
  /// ```
  pub fn truncate(&mut self, len: usize) {
    let old_len = self.len();
    if len >= old_len {
      return;
    }

    let start = self.map.start();
    // SAFETY: the length is shortened before any destructor runs, so a
    // panicking destructor cannot cause a double drop.
    unsafe {
      self.map.set_len(len);
      drop_positions(self.map.base().as_ptr(), start + len, start + old_len);
    }
    self.trim_back();
  }

  /// Removes the first `n` elements, or every element when `n` is greater
  /// than the length.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut buf = block_deque![5, 10, 15];
  /// buf.truncate_front(2);
  /// assert_eq!(buf, [15]);
  /// ```
  pub fn truncate_front(&mut self, n: usize) {
    let n = cmp::min(n, self.len());
    if n == 0 {
      return;
    }

    let start = self.map.start();
    // SAFETY: the front is advanced before any destructor runs.
    unsafe {
      self.map.advance_front(n);
      drop_positions(self.map.base().as_ptr(), start, start + n);
    }
    self.trim_front();
  }

  /// Clears the deque, removing all values. One block is kept.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut deque = block_deque![1];
  /// deque.clear();
  /// assert!(deque.is_empty());
  /// ```
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub fn clear(&mut self) {
    self.truncate(0);
  }

  /// Modifies the deque in-place so that `len()` is equal to `new_len`,
  /// either by removing excess elements from the back or by appending clones
  /// of `value` to the back.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut buf = block_deque![5, 10, 15];
  /// buf.resize(2, 0);
  /// assert_eq!(buf, [5, 10]);
  ///
  /// buf.resize(5, 20);
  /// assert_eq!(buf, [5, 10, 20, 20, 20]);
  /// ```
  #[track_caller]
  pub fn resize(&mut self, new_len: usize, value: T)
  where
    T: Clone,
  {
    if let Err(e) = self.try_resize(new_len, value) {
      e.escalate()
    }
  }

  /// Fallible form of [`resize`](BlockDeque::resize).
  ///
  /// Growth acquires every needed block before the first clone is made, so
  /// on failure no element has been added.
  pub fn try_resize(&mut self, new_len: usize, value: T) -> Result<(), TryReserveError>
  where
    T: Clone,
  {
    let len = self.len();
    if new_len <= len {
      self.truncate(new_len);
      return Ok(());
    }

    self.try_reserve_back(new_len - len)?;
    for v in repeat_n(value, new_len - len) {
      // SAFETY: the room was reserved above.
      unsafe { self.map.write_back(v) };
    }
    Ok(())
  }

  /// Modifies the deque in-place so that `len()` is equal to `new_len`,
  /// either by removing excess elements from the back or by appending
  /// elements generated by calling `generator` to the back.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut buf = block_deque![5, 10, 15];
  /// buf.resize_with(5, Default::default);
  /// assert_eq!(buf, [5, 10, 15, 0, 0]);
  ///
  /// let mut state = 100;
  /// buf.resize_with(6, || {
  ///   state += 1;
  ///   state
  /// });
  /// assert_eq!(buf, [5, 10, 15, 0, 0, 101]);
  /// ```
  #[track_caller]
  pub fn resize_with(&mut self, new_len: usize, generator: impl FnMut() -> T) {
    let len = self.len();
    if new_len <= len {
      self.truncate(new_len);
      return;
    }

    self.reserve_back(new_len - len);
    for v in repeat_with(generator).take(new_len - len) {
      // SAFETY: the room was reserved above.
      unsafe { self.map.write_back(v) };
    }
  }

  /// Copies the deque into `alloc`, keeping the affinity of `self`.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::{block_deque, Global};
  ///
  /// let deque = block_deque![1, 2, 3];
  /// let copy = deque.try_clone_in(Global).unwrap();
  /// assert_eq!(deque, copy);
  /// ```
  pub fn try_clone_in(&self, alloc: A) -> Result<Self, TryReserveError>
  where
    T: Clone,
  {
    let mut out = Self::with_affinity_in(self.affinity, alloc);
    out.try_extend_cloned(self.iter())?;
    Ok(out)
  }

  /// Fallible form of [`Clone::clone`].
  pub fn try_clone(&self) -> Result<Self, TryReserveError>
  where
    T: Clone,
  {
    self.try_clone_in(self.alloc.select_on_copy())
  }

  /// Replaces the elements of `self` with clones of the elements of `source`.
  ///
  /// When the affinity of `self` has `propagate_on_copy` set, `self` first
  /// adopts a copy of the resource of `source`, releasing its own storage if
  /// the two resources are not interchangeable. Otherwise `self` keeps its
  /// resource. Live elements are reused through [`Clone::clone_from`].
  ///
  /// On failure `self` holds a prefix of `source`.
  pub fn try_assign_from(&mut self, source: &Self) -> Result<(), TryReserveError>
  where
    T: Clone,
  {
    if self.affinity.propagate_on_copy() {
      if self.affinity.interchangeable(&self.alloc, &source.alloc) {
        self.alloc = source.alloc.clone();
      } else {
        self.clear();
        let allocated = self.map.blocks() > 0;
        self.map.release(&self.alloc);
        self.alloc = source.alloc.clone();
        if allocated {
          self.map.try_keep_one_block(&self.alloc)?;
        }
      }
    }
    self.try_assign_elements(source)
  }

  /// Builds a deque in `alloc` out of the elements of `source`.
  ///
  /// If `alloc` and the resource of `source` are interchangeable, the storage
  /// changes hands in *O*(1) and `source` is left empty. Otherwise the
  /// elements are cloned into storage from `alloc` and `source` keeps them.
  /// The new deque takes the affinity of `source`.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::{block_deque, BlockDeque, Global};
  ///
  /// let mut source = block_deque![1, 2, 3];
  /// let moved = BlockDeque::move_in(&mut source, Global);
  /// assert_eq!(moved, [1, 2, 3]);
  /// assert!(source.is_empty());
  /// ```
  pub fn move_in(source: &mut Self, alloc: A) -> Self
  where
    T: Clone,
  {
    let mut out = Self::with_affinity_in(source.affinity, alloc);
    if source.affinity.interchangeable(&out.alloc, &source.alloc) {
      out.take_storage(source);
    } else if let Err(e) = out.try_extend_cloned(source.iter()) {
      e.escalate()
    }
    out
  }

  /// Move-assigns the elements of `source` to `self`, following the affinity
  /// of `self`.
  ///
  /// - With `propagate_on_move`, `self` releases its storage and adopts both
  ///   the resource and the storage of `source`. `source` is left empty.
  /// - Otherwise, if the two resources are interchangeable, `self` is cleared
  ///   and the storages are exchanged. `source` is left empty.
  /// - Otherwise the elements are cloned into the storage of `self` and
  ///   `source` keeps its elements.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut source = block_deque![1, 2, 3];
  /// let mut target = block_deque![9];
  /// target.move_assign(&mut source);
  /// assert_eq!(target, [1, 2, 3]);
  /// assert!(source.is_empty());
  /// ```
  pub fn move_assign(&mut self, source: &mut Self)
  where
    T: Clone,
  {
    if self.affinity.propagate_on_move() {
      self.clear();
      if !self.affinity.interchangeable(&self.alloc, &source.alloc) {
        self.map.release(&self.alloc);
      }
      self.alloc = source.alloc.clone();
      self.take_storage(source);
    } else if self.affinity.interchangeable(&self.alloc, &source.alloc) {
      self.clear();
      self.take_storage(source);
    } else if let Err(e) = self.try_assign_elements(source) {
      e.escalate()
    }
  }

  /// Exchanges the contents of `self` and `other`, following the affinity of
  /// `self`.
  ///
  /// With `propagate_on_swap` the resources and policies are exchanged along
  /// with the elements. Otherwise only the storages are exchanged, which
  /// requires interchangeable resources.
  ///
  /// [`core::mem::swap`] on two deques always exchanges everything.
  ///
  /// ## Panics
  ///
  /// Panics if neither `propagate_on_swap` is set nor the resources are
  /// interchangeable, since neither resource could release the other's
  /// blocks.
  ///
  /// ## Examples
  ///
  /// ```
  /// use block_deque::block_deque;
  ///
  /// let mut a = block_deque![1, 2];
  /// let mut b = block_deque![3];
  /// a.swap_with(&mut b);
  /// assert_eq!(a, [3]);
  /// assert_eq!(b, [1, 2]);
  /// ```
  #[track_caller]
  pub fn swap_with(&mut self, other: &mut Self) {
    if self.affinity.propagate_on_swap() {
      mem::swap(self, other);
    } else if self.affinity.interchangeable(&self.alloc, &other.alloc) {
      mem::swap(&mut self.map, &mut other.map);
    } else {
      panic!("cannot swap deques whose memory resources are not interchangeable");
    }
  }

  /// Adopts the storage and elements of `source`, handing it the storage of
  /// `self` in exchange. `source` ends up empty, and keeps one block if it
  /// held any.
  ///
  /// `self` must be empty, and its storage must be releasable through the
  /// resource of `source`.
  fn take_storage(&mut self, source: &mut Self) {
    debug_assert!(self.is_empty());
    let allocated = source.map.blocks() > 0;
    mem::swap(&mut self.map, &mut source.map);
    if allocated {
      if let Err(e) = source.map.try_keep_one_block(&source.alloc) {
        e.escalate()
      }
    }
  }

  fn try_assign_elements(&mut self, source: &Self) -> Result<(), TryReserveError>
  where
    T: Clone,
  {
    let common = cmp::min(self.len(), source.len());
    for (dst, src) in self.iter_mut().zip(source.iter()) {
      dst.clone_from(src);
    }
    if source.len() <= self.len() {
      self.truncate(source.len());
      return Ok(());
    }
    self.try_extend_cloned(source.range(common..))
  }

  /// Appends clones of the items of `iter`, acquiring every block first.
  fn try_extend_cloned<'a>(&mut self, iter: Iter<'a, T>) -> Result<(), TryReserveError>
  where
    T: Clone + 'a,
  {
    if iter.len() == 0 {
      return Ok(());
    }
    self.try_reserve_back(iter.len())?;
    for item in iter {
      // SAFETY: the room was reserved above.
      unsafe { self.map.write_back(item.clone()) };
    }
    Ok(())
  }

  fn insert_at_back<I>(&mut self, index: usize, iter: I) -> Result<usize, TryReserveError>
  where
    I: Iterator<Item = T>,
  {
    /// Drops whatever was pushed behind `len` unless defused.
    struct Rollback<'a, T, A: MemoryResource> {
      deque: &'a mut BlockDeque<T, A>,
      len: usize,
    }

    impl<T, A: MemoryResource> Drop for Rollback<'_, T, A> {
      fn drop(&mut self) {
        self.deque.truncate(self.len);
      }
    }

    let old_len = self.len();
    let (lower, _) = iter.size_hint();
    if lower > 0 {
      self.try_reserve_back(lower)?;
    }

    let guard = Rollback {
      deque: &mut *self,
      len: old_len,
    };
    for item in iter {
      guard.deque.try_push_back(item)?;
    }
    mem::forget(guard);

    let new_len = self.len();
    // SAFETY: `index <= old_len <= new_len`.
    unsafe {
      self
        .map
        .rotate_slots_right(index..new_len, new_len - old_len);
    }
    Ok(index)
  }

  fn insert_at_front<I>(&mut self, index: usize, iter: I) -> Result<usize, TryReserveError>
  where
    I: Iterator<Item = T>,
  {
    /// Drops whatever was pushed in front of the last `len` elements unless
    /// defused.
    struct Rollback<'a, T, A: MemoryResource> {
      deque: &'a mut BlockDeque<T, A>,
      len: usize,
    }

    impl<T, A: MemoryResource> Drop for Rollback<'_, T, A> {
      fn drop(&mut self) {
        let extra = self.deque.len() - self.len;
        self.deque.truncate_front(extra);
      }
    }

    let old_len = self.len();
    let (lower, _) = iter.size_hint();
    if lower > 0 {
      self.try_reserve_front(lower)?;
    }

    let guard = Rollback {
      deque: &mut *self,
      len: old_len,
    };
    for item in iter {
      guard.deque.try_push_front(item)?;
    }
    mem::forget(guard);

    // The items now sit reversed in `0..count`, followed by the shifted
    // prefix in `count..count + index`.
    let count = self.len() - old_len;
    // SAFETY: `count + index <= len`.
    unsafe {
      self.map.reverse_slots(0..count);
      self.map.rotate_slots_left(0..count + index, count);
    }
    Ok(index)
  }

  #[inline]
  fn trim_back(&mut self) {
    if self.is_empty() {
      self.map.reset_empty(&self.alloc);
    } else {
      self.map.trim_back(&self.alloc);
    }
  }

  #[inline]
  fn trim_front(&mut self) {
    if self.is_empty() {
      self.map.reset_empty(&self.alloc);
    } else {
      self.map.trim_front(&self.alloc);
    }
  }
}

/// Drops the elements at positions `from..to`, counted from the first slot of
/// the block whose handle `base` points to. Keeps dropping after a
/// destructor panics.
///
/// # Safety
///
/// The slots hold live elements that nothing else will drop or read.
unsafe fn drop_positions<T>(base: *const NonNull<T>, mut from: usize, to: usize) {
  struct Rest<T> {
    base: *const NonNull<T>,
    from: usize,
    to: usize,
    _marker: PhantomData<T>,
  }

  impl<T> Drop for Rest<T> {
    fn drop(&mut self) {
      // SAFETY: forwarded from `drop_positions`.
      unsafe { drop_positions(self.base, self.from, self.to) }
    }
  }

  let block = map::block_len::<T>();
  while from < to {
    let stop = cmp::min(to, (from / block + 1) * block);
    let rest = Rest {
      base,
      from: stop,
      to,
      _marker: PhantomData,
    };
    ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
      slot_at(base, from),
      stop - from,
    ));
    mem::forget(rest);
    from = stop;
  }
}

#[track_caller]
fn range<R>(range: R, bounds: ops::RangeTo<usize>) -> ops::Range<usize>
where
  R: ops::RangeBounds<usize>,
{
  let len = bounds.end;

  let end = match range.end_bound() {
    ops::Bound::Included(&end) if end >= len => slice_index_fail(0, end, len),
    // Cannot overflow because `end < len` implies `end < usize::MAX`.
    ops::Bound::Included(&end) => end + 1,

    ops::Bound::Excluded(&end) if end > len => slice_index_fail(0, end, len),
    ops::Bound::Excluded(&end) => end,
    ops::Bound::Unbounded => len,
  };

  let start = match range.start_bound() {
    ops::Bound::Excluded(&start) if start >= end => slice_index_fail(start, end, len),
    // Cannot overflow because `start < end` implies `start < usize::MAX`.
    ops::Bound::Excluded(&start) => start + 1,

    ops::Bound::Included(&start) if start > end => slice_index_fail(start, end, len),
    ops::Bound::Included(&start) => start,

    ops::Bound::Unbounded => 0,
  };

  ops::Range { start, end }
}

#[track_caller]
fn slice_index_fail(start: usize, end: usize, len: usize) -> ! {
  if start > len {
    panic!("range start index {start} out of range for deque of length {len}")
  }

  if end > len {
    panic!("range end index {end} out of range for deque of length {len}")
  }

  if start > end {
    panic!("range starts at {start} but ends at {end}")
  }

  // Only reachable if the range was a `RangeInclusive` or a
  // `RangeToInclusive`, with `end == len`.
  panic!("range end index {end} out of range for deque of length {len}")
}

#[rustversion::since(1.82)]
#[inline]
fn repeat_n<T: Clone>(element: T, count: usize) -> impl Iterator<Item = T> {
  core::iter::repeat_n(element, count)
}

#[rustversion::before(1.82)]
#[inline]
fn repeat_n<T: Clone>(element: T, mut count: usize) -> impl Iterator<Item = T> {
  let mut element = Some(element);
  core::iter::from_fn(move || match count {
    0 => None,
    1 => {
      count = 0;
      element.take()
    }
    _ => {
      count -= 1;
      element.clone()
    }
  })
}
