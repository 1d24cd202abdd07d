use allocator_api2::alloc::{Allocator, Global};

/// How a deque treats its memory resource when it is copied, moved or
/// swapped.
///
/// Every [`BlockDeque`](crate::BlockDeque) carries one `Affinity` value,
/// chosen at construction. When two deques meet in a binary operation
/// (`clone_from`, `move_assign`, `swap_with`) the policy of the deque being
/// assigned to decides.
///
/// ## Examples
///
/// ```
/// use block_deque::Affinity;
///
/// let policy = Affinity::new().with_propagate_on_copy(true);
/// assert!(policy.propagate_on_copy());
/// assert!(!policy.propagate_on_move());
/// assert!(!policy.is_always_equal());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Affinity {
  always_equal: bool,
  propagate_on_copy: bool,
  propagate_on_move: bool,
  propagate_on_swap: bool,
}

impl Affinity {
  /// A policy that never propagates and compares resources by identity.
  pub const STICKY: Self = Self::new();

  /// A policy for stateless resources: every instance can free memory handed
  /// out by every other instance.
  pub const ALWAYS_EQUAL: Self = Self::new().with_always_equal(true);

  /// A policy where the resource follows the elements on copy, move and swap.
  pub const PROPAGATE_ALL: Self = Self::new()
    .with_propagate_on_copy(true)
    .with_propagate_on_move(true)
    .with_propagate_on_swap(true);

  /// Creates a policy with every flag cleared.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn new() -> Self {
    Self {
      always_equal: false,
      propagate_on_copy: false,
      propagate_on_move: false,
      propagate_on_swap: false,
    }
  }

  /// Sets whether all resources of this type are interchangeable.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn with_always_equal(mut self, value: bool) -> Self {
    self.always_equal = value;
    self
  }

  /// Sets whether copy assignment adopts the source's resource.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn with_propagate_on_copy(mut self, value: bool) -> Self {
    self.propagate_on_copy = value;
    self
  }

  /// Sets whether move assignment adopts the source's resource.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn with_propagate_on_move(mut self, value: bool) -> Self {
    self.propagate_on_move = value;
    self
  }

  /// Sets whether swapping two deques also swaps their resources.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn with_propagate_on_swap(mut self, value: bool) -> Self {
    self.propagate_on_swap = value;
    self
  }

  /// Returns `true` if all resources of this type are interchangeable.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn is_always_equal(&self) -> bool {
    self.always_equal
  }

  /// Returns `true` if copy assignment adopts the source's resource.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn propagate_on_copy(&self) -> bool {
    self.propagate_on_copy
  }

  /// Returns `true` if move assignment adopts the source's resource.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn propagate_on_move(&self) -> bool {
    self.propagate_on_move
  }

  /// Returns `true` if swapping also swaps the resources.
  #[cfg_attr(not(tarpaulin), inline(always))]
  pub const fn propagate_on_swap(&self) -> bool {
    self.propagate_on_swap
  }

  /// Returns `true` if storage obtained from `a` may be released through `b`.
  #[inline]
  pub fn interchangeable<A: MemoryResource>(&self, a: &A, b: &A) -> bool {
    self.always_equal || a.same_resource(b)
  }
}

/// A memory resource a [`BlockDeque`](crate::BlockDeque) can draw blocks from.
///
/// This adds identity to [`Allocator`]: two handles are the *same resource*
/// when memory allocated through one may be deallocated through the other.
///
/// ## Examples
///
/// ```
/// use core::{alloc::Layout, ptr::NonNull};
/// use block_deque::{AllocError, Affinity, Allocator, BlockDeque, Global, MemoryResource};
///
/// #[derive(Clone, Debug)]
/// struct Arena(u32);
///
/// unsafe impl Allocator for Arena {
///   fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
///     Global.allocate(layout)
///   }
///
///   unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
///     Global.deallocate(ptr, layout)
///   }
/// }
///
/// impl MemoryResource for Arena {
///   const AFFINITY: Affinity = Affinity::PROPAGATE_ALL;
///
///   fn same_resource(&self, other: &Self) -> bool {
///     self.0 == other.0
///   }
/// }
///
/// let mut deque = BlockDeque::new_in(Arena(7));
/// deque.push_back(1);
/// assert_eq!(deque.allocator().0, 7);
/// assert!(deque.affinity().propagate_on_move());
/// ```
pub trait MemoryResource: Allocator + Clone {
  /// The policy a deque adopts when none is given explicitly.
  const AFFINITY: Affinity = Affinity::STICKY;

  /// Returns `true` if memory allocated through `self` may be released
  /// through `other` and vice versa.
  fn same_resource(&self, other: &Self) -> bool;

  /// Returns the resource a copy of a deque using `self` should use.
  #[inline]
  fn select_on_copy(&self) -> Self {
    self.clone()
  }
}

impl MemoryResource for Global {
  const AFFINITY: Affinity = Affinity::ALWAYS_EQUAL;

  #[cfg_attr(not(tarpaulin), inline(always))]
  fn same_resource(&self, _other: &Self) -> bool {
    true
  }
}

impl<A: MemoryResource> MemoryResource for &A {
  const AFFINITY: Affinity = A::AFFINITY;

  #[inline]
  fn same_resource(&self, other: &Self) -> bool {
    core::ptr::eq(*self, *other) || (**self).same_resource(*other)
  }

  #[inline]
  fn select_on_copy(&self) -> Self {
    *self
  }
}
