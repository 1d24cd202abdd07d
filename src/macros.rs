/// Creates a [`BlockDeque`](crate::BlockDeque) containing the arguments.
///
/// `block_deque!` allows a deque to be defined with the same syntax as array
/// expressions. There are two forms of this macro:
///
/// - Create a deque containing a given list of elements:
///
/// ```
/// use block_deque::block_deque;
///
/// let d = block_deque![1, 2, 3];
/// assert_eq!(d[0], 1);
/// assert_eq!(d[1], 2);
/// assert_eq!(d[2], 3);
/// ```
///
/// - Create a deque from a given element and size:
///
/// ```
/// use block_deque::block_deque;
///
/// let d = block_deque![1; 3];
/// assert_eq!(d, [1, 1, 1]);
/// ```
///
/// The second form clones `elem`, so `elem` must implement [`Clone`].
#[macro_export]
macro_rules! block_deque {
  () => {
    $crate::BlockDeque::new()
  };
  ($elem:expr; $n:expr) => {
    $crate::BlockDeque::from_elem($n, $elem)
  };
  ($($x:expr),+ $(,)?) => {
    $crate::BlockDeque::from([$($x),+])
  };
}
