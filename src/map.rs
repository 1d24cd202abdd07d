use core::{
  alloc::Layout,
  marker::PhantomData,
  mem,
  ops::Range,
  ptr::{self, NonNull},
};

use allocator_api2::alloc::Allocator;

use crate::TryReserveError;

/// Number of element slots in every block for element type `T`.
///
/// Elements smaller than 256 bytes get a 4 KiB block, larger ones get 16
/// slots. Zero-sized elements get 4096 slots and their blocks are never
/// allocated.
#[cfg_attr(not(tarpaulin), inline(always))]
pub(crate) const fn block_len<T>() -> usize {
  let size = mem::size_of::<T>();
  if size == 0 {
    4096
  } else if size < 256 {
    4096 / size
  } else {
    16
  }
}

/// The handle buffer of a deque together with its two frontiers.
///
/// Live handles sit at `handles[head..head + blocks]`. Slot positions are
/// counted from the first slot of block `head`: the front element lives at
/// position `start` and the back frontier is `start + len`.
///
/// The map never drops elements and never owns the memory resource. Every
/// method that touches storage takes the resource as an argument, and the
/// caller must pass the same resource every time.
pub(crate) struct BlockMap<T> {
  handles: NonNull<NonNull<T>>,
  cap: usize,
  head: usize,
  blocks: usize,
  start: usize,
  len: usize,
  _marker: PhantomData<T>,
}

impl<T> BlockMap<T> {
  const BLOCK: usize = block_len::<T>();
  const MIN_HANDLES: usize = 8;

  /// An unallocated map: no handle buffer and no block.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) const fn new() -> Self {
    Self {
      handles: NonNull::dangling(),
      cap: 0,
      head: 0,
      blocks: 0,
      start: 0,
      len: 0,
      _marker: PhantomData,
    }
  }

  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) const fn len(&self) -> usize {
    self.len
  }

  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) const fn blocks(&self) -> usize {
    self.blocks
  }

  /// Position of the front element, relative to the first slot of the first block.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) const fn start(&self) -> usize {
    self.start
  }

  /// Free slots in front of the front element.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) const fn front_room(&self) -> usize {
    self.start
  }

  /// Free slots behind the back element.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) const fn back_room(&self) -> usize {
    self.blocks * Self::BLOCK - self.start - self.len
  }

  /// Pointer to the handle of the first block. Iterators walk the blocks from
  /// here.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) fn base(&self) -> NonNull<NonNull<T>> {
    // SAFETY: `head <= cap`, so the offset stays within (or one past) the
    // handle buffer. An unallocated map has `head == 0`.
    unsafe { NonNull::new_unchecked(self.handles.as_ptr().add(self.head)) }
  }

  /// Translates a logical index into `(block, slot)`, with `block` counted from
  /// the first live block.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) const fn map_index(&self, index: usize) -> (usize, usize) {
    let pos = self.start + index;
    (pos / Self::BLOCK, pos % Self::BLOCK)
  }

  /// Address of the slot at position `pos`.
  ///
  /// # Safety
  ///
  /// `pos < blocks * BLOCK`.
  #[inline]
  pub(crate) unsafe fn slot_at(&self, pos: usize) -> *mut T {
    debug_assert!(pos < self.blocks * Self::BLOCK);
    slot_at(self.base().as_ptr(), pos)
  }

  /// Address of the element at logical `index`.
  ///
  /// # Safety
  ///
  /// `index < len`.
  #[inline]
  pub(crate) unsafe fn slot(&self, index: usize) -> *mut T {
    debug_assert!(index < self.len);
    let (block, offset) = self.map_index(index);
    (*self.base().as_ptr().add(block)).as_ptr().add(offset)
  }

  /// Writes `value` one past the back element.
  ///
  /// # Safety
  ///
  /// `back_room() > 0`.
  #[inline]
  pub(crate) unsafe fn write_back(&mut self, value: T) {
    debug_assert!(self.back_room() > 0);
    ptr::write(self.slot_at(self.start + self.len), value);
    self.len += 1;
  }

  /// Writes `value` in front of the front element.
  ///
  /// # Safety
  ///
  /// `front_room() > 0`.
  #[inline]
  pub(crate) unsafe fn write_front(&mut self, value: T) {
    debug_assert!(self.start > 0);
    ptr::write(self.slot_at(self.start - 1), value);
    self.start -= 1;
    self.len += 1;
  }

  /// Moves the back element out and retracts the back frontier.
  ///
  /// # Safety
  ///
  /// `len > 0`.
  #[inline]
  pub(crate) unsafe fn read_back(&mut self) -> T {
    debug_assert!(self.len > 0);
    self.len -= 1;
    ptr::read(self.slot_at(self.start + self.len))
  }

  /// Moves the front element out and advances the front frontier.
  ///
  /// # Safety
  ///
  /// `len > 0`.
  #[inline]
  pub(crate) unsafe fn read_front(&mut self) -> T {
    debug_assert!(self.len > 0);
    let value = ptr::read(self.slot_at(self.start));
    self.start += 1;
    self.len -= 1;
    value
  }

  /// Forgets the elements at positions `len..` without dropping them.
  ///
  /// # Safety
  ///
  /// `len <= self.len`, and the caller takes care of the forgotten elements.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) unsafe fn set_len(&mut self, len: usize) {
    debug_assert!(len <= self.len);
    self.len = len;
  }

  /// Forgets the first `n` elements without dropping them.
  ///
  /// # Safety
  ///
  /// `n <= len`, and the caller takes care of the forgotten elements.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub(crate) unsafe fn advance_front(&mut self, n: usize) {
    debug_assert!(n <= self.len);
    self.start += n;
    self.len -= n;
  }

  /// Swaps the elements at logical indices `i` and `j`.
  ///
  /// # Safety
  ///
  /// Both indices are `< len`.
  #[inline]
  pub(crate) unsafe fn swap_slots(&mut self, i: usize, j: usize) {
    ptr::swap(self.slot(i), self.slot(j));
  }

  /// Reverses the elements in `range` in place.
  ///
  /// # Safety
  ///
  /// `range.end <= len`.
  pub(crate) unsafe fn reverse_slots(&mut self, range: Range<usize>) {
    let Range { mut start, mut end } = range;
    while start + 1 < end {
      end -= 1;
      self.swap_slots(start, end);
      start += 1;
    }
  }

  /// Rotates the elements in `range` so that the element at `range.start + k`
  /// becomes the first one.
  ///
  /// # Safety
  ///
  /// `range.end <= len` and `k <= range.len()`.
  pub(crate) unsafe fn rotate_slots_left(&mut self, range: Range<usize>, k: usize) {
    debug_assert!(k <= range.len());
    if k == 0 || k == range.len() {
      return;
    }
    let mid = range.start + k;
    self.reverse_slots(range.start..mid);
    self.reverse_slots(mid..range.end);
    self.reverse_slots(range);
  }

  /// Rotates the elements in `range` so that the last `k` of them come first.
  ///
  /// # Safety
  ///
  /// `range.end <= len` and `k <= range.len()`.
  #[inline]
  pub(crate) unsafe fn rotate_slots_right(&mut self, range: Range<usize>, k: usize) {
    debug_assert!(k <= range.len());
    let n = range.len();
    self.rotate_slots_left(range, n - k);
  }

  /// Makes room for `additional` more elements behind the back element.
  ///
  /// Blocks that were acquired before a failure stay attached as spare
  /// capacity.
  pub(crate) fn try_reserve_back<A: Allocator>(
    &mut self,
    additional: usize,
    alloc: &A,
  ) -> Result<(), TryReserveError> {
    if additional <= self.back_room() && self.blocks > 0 {
      return Ok(());
    }

    let needed_end = self
      .start
      .checked_add(self.len)
      .and_then(|end| end.checked_add(additional))
      .ok_or(TryReserveError::CapacityOverflow)?;
    let have = self.blocks * Self::BLOCK;
    let missing = needed_end.saturating_sub(have).div_ceil(Self::BLOCK).max(1);
    self.check_slots(missing)?;
    self.try_reserve_handles(0, missing, alloc)?;

    for _ in 0..missing {
      let block = Self::alloc_block(alloc)?;
      // SAFETY: `try_reserve_handles` left at least `missing` free handles
      // behind the live ones.
      unsafe {
        ptr::write(self.handles.as_ptr().add(self.head + self.blocks), block);
      }
      self.blocks += 1;
    }
    Ok(())
  }

  /// Makes room for `additional` more elements in front of the front element.
  ///
  /// Blocks that were acquired before a failure stay attached as spare
  /// capacity.
  pub(crate) fn try_reserve_front<A: Allocator>(
    &mut self,
    additional: usize,
    alloc: &A,
  ) -> Result<(), TryReserveError> {
    if additional <= self.start && self.blocks > 0 {
      return Ok(());
    }

    let missing = (additional.saturating_sub(self.start))
      .div_ceil(Self::BLOCK)
      .max(1);
    self.check_slots(missing)?;
    self.try_reserve_handles(missing, 0, alloc)?;

    for _ in 0..missing {
      let block = Self::alloc_block(alloc)?;
      // SAFETY: `try_reserve_handles` left at least `missing` free handles in
      // front of the live ones.
      unsafe {
        self.head -= 1;
        ptr::write(self.handles.as_ptr().add(self.head), block);
      }
      self.blocks += 1;
      self.start += Self::BLOCK;
    }
    Ok(())
  }

  /// Releases the blocks that lie wholly in front of the front element,
  /// keeping at least one block.
  pub(crate) fn trim_front<A: Allocator>(&mut self, alloc: &A) {
    let vacant = (self.start / Self::BLOCK).min(self.blocks.saturating_sub(1));
    for _ in 0..vacant {
      // SAFETY: the handle at `head` is live and none of its slots is occupied.
      unsafe {
        let block = ptr::read(self.handles.as_ptr().add(self.head));
        Self::free_block(block, alloc);
      }
      self.head += 1;
      self.blocks -= 1;
      self.start -= Self::BLOCK;
    }
  }

  /// Releases the blocks that lie wholly behind the back element, keeping at
  /// least one block.
  pub(crate) fn trim_back<A: Allocator>(&mut self, alloc: &A) {
    let used = (self.start + self.len).div_ceil(Self::BLOCK).max(1);
    while self.blocks > used {
      self.blocks -= 1;
      // SAFETY: the handle is live and none of its slots is occupied.
      unsafe {
        let block = ptr::read(self.handles.as_ptr().add(self.head + self.blocks));
        Self::free_block(block, alloc);
      }
    }
  }

  /// Releases every block but one and parks the frontiers in the middle of it.
  pub(crate) fn reset_empty<A: Allocator>(&mut self, alloc: &A) {
    debug_assert_eq!(self.len, 0);
    if self.blocks == 0 {
      return;
    }
    while self.blocks > 1 {
      self.blocks -= 1;
      // SAFETY: the deque is empty, so no live handle has an occupied slot.
      unsafe {
        let block = ptr::read(self.handles.as_ptr().add(self.head + self.blocks));
        Self::free_block(block, alloc);
      }
    }
    self.start = Self::BLOCK / 2;
  }

  /// Leaves an empty map with exactly one block, parked like
  /// [`reset_empty`](Self::reset_empty) does, allocating it if the map holds
  /// none.
  pub(crate) fn try_keep_one_block<A: Allocator>(
    &mut self,
    alloc: &A,
  ) -> Result<(), TryReserveError> {
    debug_assert_eq!(self.len, 0);
    if self.blocks == 0 {
      self.try_reserve_back(0, alloc)?;
    }
    self.reset_empty(alloc);
    Ok(())
  }

  /// Releases every block and the handle buffer.
  ///
  /// The elements must have been dropped or moved out already. The map is
  /// unallocated afterwards.
  pub(crate) fn release<A: Allocator>(&mut self, alloc: &A) {
    debug_assert_eq!(self.len, 0);
    for i in 0..self.blocks {
      // SAFETY: every handle in `head..head + blocks` is live.
      unsafe {
        let block = ptr::read(self.handles.as_ptr().add(self.head + i));
        Self::free_block(block, alloc);
      }
    }
    if self.cap != 0 {
      // SAFETY: the buffer was allocated from `alloc` with this layout.
      unsafe {
        alloc.deallocate(self.handles.cast(), Self::handles_layout(self.cap));
      }
    }
    *self = Self::new();
  }

  /// Releases blocks that hold no element.
  pub(crate) fn shrink_to_fit<A: Allocator>(&mut self, alloc: &A) {
    if self.len == 0 {
      self.reset_empty(alloc);
    } else {
      self.trim_front(alloc);
      self.trim_back(alloc);
    }
  }

  /// Ensures the handle buffer has at least `front` free handles before the
  /// live ones and `back` free handles after them.
  ///
  /// The live handles are recentred in place when that leaves half of the
  /// buffer free, otherwise they move to a buffer of
  /// `max(2 * cap, needed, 8)` handles.
  fn try_reserve_handles<A: Allocator>(
    &mut self,
    front: usize,
    back: usize,
    alloc: &A,
  ) -> Result<(), TryReserveError> {
    let back_free = self.cap - self.head - self.blocks;
    if self.head >= front && back_free >= back {
      return Ok(());
    }

    let needed = self
      .blocks
      .checked_add(front)
      .and_then(|n| n.checked_add(back))
      .ok_or(TryReserveError::CapacityOverflow)?;

    if self.cap != 0 && needed <= self.cap / 2 {
      let new_head = front + (self.cap - needed) / 2;
      // SAFETY: both ranges lie within the buffer; `ptr::copy` allows overlap.
      unsafe {
        let base = self.handles.as_ptr();
        ptr::copy(base.add(self.head), base.add(new_head), self.blocks);
      }
      self.head = new_head;
      return Ok(());
    }

    let new_cap = self
      .cap
      .saturating_mul(2)
      .max(needed)
      .max(Self::MIN_HANDLES);
    let layout =
      Layout::array::<NonNull<T>>(new_cap).map_err(|_| TryReserveError::CapacityOverflow)?;
    let buf = alloc
      .allocate(layout)
      .map_err(|_| TryReserveError::AllocError { layout })?
      .cast::<NonNull<T>>();
    let new_head = front + (new_cap - needed) / 2;

    // SAFETY: the new buffer holds `new_cap >= new_head + blocks` handles and
    // does not overlap the old one.
    unsafe {
      ptr::copy_nonoverlapping(
        self.handles.as_ptr().add(self.head),
        buf.as_ptr().add(new_head),
        self.blocks,
      );
      if self.cap != 0 {
        alloc.deallocate(self.handles.cast(), Self::handles_layout(self.cap));
      }
    }

    self.handles = buf;
    self.cap = new_cap;
    self.head = new_head;
    Ok(())
  }

  /// Fails if `extra` more blocks would make the slot count overflow.
  fn check_slots(&self, extra: usize) -> Result<(), TryReserveError> {
    self
      .blocks
      .checked_add(extra)
      .and_then(|b| b.checked_mul(Self::BLOCK))
      .map(|_| ())
      .ok_or(TryReserveError::CapacityOverflow)
  }

  fn alloc_block<A: Allocator>(alloc: &A) -> Result<NonNull<T>, TryReserveError> {
    if mem::size_of::<T>() == 0 {
      return Ok(NonNull::dangling());
    }
    let layout =
      Layout::array::<T>(Self::BLOCK).map_err(|_| TryReserveError::CapacityOverflow)?;
    alloc
      .allocate(layout)
      .map(NonNull::cast)
      .map_err(|_| TryReserveError::AllocError { layout })
  }

  /// # Safety
  ///
  /// `block` came from `alloc_block` with the same resource.
  unsafe fn free_block<A: Allocator>(block: NonNull<T>, alloc: &A) {
    if mem::size_of::<T>() == 0 {
      return;
    }
    let layout = Layout::from_size_align_unchecked(
      mem::size_of::<T>() * Self::BLOCK,
      mem::align_of::<T>(),
    );
    alloc.deallocate(block.cast(), layout);
  }

  /// # Safety
  ///
  /// A buffer of `cap` handles was allocated before, so the layout is valid.
  unsafe fn handles_layout(cap: usize) -> Layout {
    Layout::from_size_align_unchecked(
      mem::size_of::<NonNull<T>>() * cap,
      mem::align_of::<NonNull<T>>(),
    )
  }
}

/// Address of the slot at position `pos` counted from the first slot of the
/// block whose handle `base` points to.
///
/// # Safety
///
/// The block holding `pos` is live.
#[cfg_attr(not(tarpaulin), inline(always))]
pub(crate) unsafe fn slot_at<T>(base: *const NonNull<T>, pos: usize) -> *mut T {
  let block = block_len::<T>();
  (*base.add(pos / block)).as_ptr().add(pos % block)
}
