use super::*;
use crate::tests::TestResource;
use core::sync::atomic::{AtomicUsize, Ordering::SeqCst};
use std::{
  panic::{catch_unwind, AssertUnwindSafe},
  string::{String, ToString},
  vec::Vec,
};

fn s<T: ToString>(value: T) -> String {
  value.to_string()
}

macro_rules! sarr {
  ($($val:expr),+ $(,)?) => {
    [$(s($val)),+]
  };
}

/// A blueprint for crash test dummy instances that monitor particular events.
/// Some instances may be configured to panic at some point.
#[derive(Debug)]
struct CrashTestDummy {
  id: usize,
  cloned: AtomicUsize,
  dropped: AtomicUsize,
}

impl CrashTestDummy {
  fn new(id: usize) -> CrashTestDummy {
    CrashTestDummy {
      id,
      cloned: AtomicUsize::new(0),
      dropped: AtomicUsize::new(0),
    }
  }

  fn spawn(&self, panic: Panic) -> Instance<'_> {
    Instance {
      origin: self,
      panic,
    }
  }

  fn cloned(&self) -> usize {
    self.cloned.load(SeqCst)
  }

  fn dropped(&self) -> usize {
    self.dropped.load(SeqCst)
  }
}

#[derive(Debug)]
struct Instance<'a> {
  origin: &'a CrashTestDummy,
  panic: Panic,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Panic {
  Never,
  InClone,
  InDrop,
}

impl Instance<'_> {
  fn id(&self) -> usize {
    self.origin.id
  }
}

impl Clone for Instance<'_> {
  fn clone(&self) -> Self {
    self.origin.cloned.fetch_add(1, SeqCst);
    if self.panic == Panic::InClone {
      panic!("panic in `clone`");
    }
    Self {
      origin: self.origin,
      panic: Panic::Never,
    }
  }
}

impl Drop for Instance<'_> {
  fn drop(&mut self) {
    self.origin.dropped.fetch_add(1, SeqCst);
    if self.panic == Panic::InDrop {
      panic!("panic in `drop`");
    }
  }
}

impl PartialEq for Instance<'_> {
  fn eq(&self, other: &Self) -> bool {
    self.id().eq(&other.id())
  }
}

fn dummies(n: usize) -> Vec<CrashTestDummy> {
  (0..n).map(CrashTestDummy::new).collect()
}

#[test]
fn heap_test_push_pop() {
  let mut tester = BlockDeque::new();
  for i in 0..1000 {
    tester.push_back(s(i));
    tester.push_front(s(-i));
  }
  assert_eq!(tester.len(), 2000);
  assert_eq!(tester.front().map(String::as_str), Some("-999"));
  assert_eq!(tester.back().map(String::as_str), Some("999"));

  for i in (0..1000).rev() {
    assert_eq!(tester.pop_front(), Some(s(-i)));
    assert_eq!(tester.pop_back(), Some(s(i)));
  }
  assert!(tester.is_empty());
}

#[test]
fn heap_test_insert_remove() {
  let block = map::block_len::<String>();
  for len in [0, 1, block - 1, block, block + 1, 3 * block] {
    for pos in [0, 1, len / 2, len.saturating_sub(1), len] {
      if pos > len {
        continue;
      }
      let mut tester: BlockDeque<String> = (0..len).map(s).collect();
      let mut expected: Vec<String> = (0..len).map(s).collect();

      tester.insert(pos, s("x"));
      expected.insert(pos, s("x"));
      assert_eq!(tester, expected);

      tester.insert_n(pos, 3, s("y"));
      for _ in 0..3 {
        expected.insert(pos, s("y"));
      }
      assert_eq!(tester, expected);

      assert_eq!(tester.remove(pos), Some(expected.remove(pos)));
      assert_eq!(tester, expected);

      tester.erase(pos..pos + 2);
      expected.drain(pos..pos + 2).for_each(drop);
      assert_eq!(tester, expected);
    }
  }
}

#[test]
fn heap_test_retain() {
  let mut tester: BlockDeque<String> = (0..1000).map(s).collect();
  tester.retain(|v| v.ends_with('7'));
  assert_eq!(tester.len(), 100);
  assert!(tester.iter().all(|v| v.ends_with('7')));

  let mut small = BlockDeque::from(sarr![1, 2, 2, 3]);
  assert_eq!(erase(&mut small, &s(2)), 2);
  assert_eq!(small, sarr![1, 3]);
}

#[test]
fn heap_test_clone_and_assign() {
  let a = TestResource::new(1);
  let b = TestResource::new(2);
  let source = BlockDeque::from_iter_in((0..500).map(s), b.clone());

  let mut target = BlockDeque::from_iter_in((0..20).map(|_| s("old")), a.clone());
  target.clone_from(&source);
  assert_eq!(target, source);

  let mut moved_from = source.clone();
  target.move_assign(&mut moved_from);
  assert_eq!(target, source);
  assert_eq!(moved_from, source);

  drop(target);
  assert_eq!(a.live(), 0);
}

#[test]
fn heap_test_into_iter_partial() {
  let tester: BlockDeque<String> = (0..2000).map(s).collect();
  let mut iter = tester.into_iter();
  assert_eq!(iter.next(), Some(s(0)));
  assert_eq!(iter.next_back(), Some(s(1999)));
  drop(iter);
}

#[test]
#[cfg_attr(not(panic = "unwind"), ignore = "test requires unwinding support")]
fn heap_test_truncate_drop_panic() {
  let dummies = dummies(3000);
  let resource = TestResource::new(1);
  let mut q = BlockDeque::new_in(resource.clone());
  for d in &dummies {
    let panic = if d.id == 1500 {
      Panic::InDrop
    } else {
      Panic::Never
    };
    q.push_back(d.spawn(panic));
  }

  catch_unwind(AssertUnwindSafe(|| q.truncate(1000))).unwrap_err();

  assert_eq!(q.len(), 1000);
  assert!(dummies[..1000].iter().all(|d| d.dropped() == 0));
  assert!(dummies[1000..].iter().all(|d| d.dropped() == 1));

  q.push_back(dummies[0].spawn(Panic::Never));
  assert_eq!(q.len(), 1001);
  drop(q);
  assert_eq!(dummies[0].dropped(), 2);
  assert!(dummies[1..].iter().all(|d| d.dropped() == 1));
  assert_eq!(resource.live(), 0);
}

#[test]
#[cfg_attr(not(panic = "unwind"), ignore = "test requires unwinding support")]
fn heap_test_drop_panic_releases_storage() {
  let dummies = dummies(3000);
  let resource = TestResource::new(1);
  let mut q = BlockDeque::new_in(resource.clone());
  for d in &dummies {
    let panic = if d.id == 10 { Panic::InDrop } else { Panic::Never };
    q.push_front(d.spawn(panic));
  }
  assert!(q.block_count() > 1);

  catch_unwind(AssertUnwindSafe(|| drop(q))).unwrap_err();

  assert!(dummies.iter().all(|d| d.dropped() == 1));
  assert_eq!(resource.live(), 0);
}

#[test]
#[cfg_attr(not(panic = "unwind"), ignore = "test requires unwinding support")]
fn heap_test_insert_iter_panic_rolls_back() {
  let mut q: BlockDeque<String> = (0..2000).map(s).collect();
  let before = q.clone();

  for index in [0, 10, 1000, 1990, 2000] {
    let res = catch_unwind(AssertUnwindSafe(|| {
      q.insert_iter(
        index,
        (0..700).map(|i| {
          if i == 600 {
            panic!("iterator gave up");
          }
          s(i)
        }),
      );
    }));
    assert!(res.is_err());
    assert_eq!(q, before);
    assert!(q.block_count() <= before.block_count() + 1);
  }
}

#[test]
#[cfg_attr(not(panic = "unwind"), ignore = "test requires unwinding support")]
fn heap_test_insert_iter_panic_drops_taken() {
  let dummies = dummies(2);
  let mut q = BlockDeque::new();
  for _ in 0..300 {
    q.push_back(dummies[0].spawn(Panic::Never));
  }

  let source = &dummies[1];
  catch_unwind(AssertUnwindSafe(|| {
    q.insert_iter(
      20,
      (0..500).map(|i| {
        if i == 400 {
          panic!("iterator gave up");
        }
        source.spawn(Panic::Never)
      }),
    );
  }))
  .unwrap_err();

  assert_eq!(q.len(), 300);
  assert_eq!(source.dropped(), 400);
  assert_eq!(dummies[0].dropped(), 0);
  drop(q);
  assert_eq!(dummies[0].dropped(), 300);
}

#[test]
#[cfg_attr(not(panic = "unwind"), ignore = "test requires unwinding support")]
fn heap_test_insert_n_clone_panic() {
  let dummies = dummies(2);
  let mut q = BlockDeque::new();
  for _ in 0..10 {
    q.push_back(dummies[0].spawn(Panic::Never));
  }

  let value = dummies[1].spawn(Panic::InClone);
  catch_unwind(AssertUnwindSafe(|| {
    q.insert_n(5, 4, value);
  }))
  .unwrap_err();

  assert_eq!(q.len(), 10);
  assert_eq!(dummies[1].cloned(), 1);
  assert_eq!(dummies[1].dropped(), 1);
  assert_eq!(dummies[0].dropped(), 0);
}

#[test]
#[cfg_attr(not(panic = "unwind"), ignore = "test requires unwinding support")]
fn heap_test_retain_pred_panic() {
  let mut q: BlockDeque<String> = (0..3000).map(s).collect();

  catch_unwind(AssertUnwindSafe(|| {
    q.retain(|v| {
      if v == "2500" {
        panic!("predicate gave up");
      }
      v.len() % 2 == 0
    })
  }))
  .unwrap_err();

  assert_eq!(q.len(), 3000);
  let mut all: Vec<String> = q.into_iter().collect();
  all.sort();
  let mut expected: Vec<String> = (0..3000).map(s).collect();
  expected.sort();
  assert_eq!(all, expected);
}

#[test]
fn heap_test_insert_alloc_failure_rolls_back() {
  let resource = TestResource::new(1);
  let mut q = BlockDeque::new_in(resource.clone());
  q.extend((0..200).map(s));
  for i in 0..50 {
    q.push_front(s(-i));
  }
  let before: Vec<String> = q.iter().cloned().collect();

  resource.fail_after(0);
  let unsized_items = (0..1000).map(s).filter(|_| true);
  assert!(q.try_insert_iter(200, unsized_items.clone()).is_err());
  assert_eq!(q, before);
  assert!(q.try_insert_iter(10, unsized_items).is_err());
  assert_eq!(q, before);

  resource.never_fail();
  q.insert_iter(10, (0..1000).map(s));
  assert_eq!(q.len(), 1250);
  drop(q);
  assert_eq!(resource.live(), 0);
}

#[test]
fn heap_test_from_iter_failure_drops_items() {
  let dummies = dummies(1);
  let resource = TestResource::new(1);
  // Handle buffer and first block succeed, the second block fails.
  resource.fail_after(2);
  let block = map::block_len::<Instance<'_>>();

  let result = BlockDeque::try_from_iter_in(
    (0..block * 3)
      .map(|_| dummies[0].spawn(Panic::Never))
      .filter(|_| true),
    resource.clone(),
  );
  assert!(result.is_err());
  assert_eq!(dummies[0].dropped(), block + 1);
  assert_eq!(resource.live(), 0);
}
