use block_deque::{erase_if, BlockDeque};
use std::{cell::RefCell, rc::Rc};

#[derive(Debug)]
struct DropTracker {
  id: String,
  payload: String,
  log: Rc<RefCell<Vec<i32>>>,
}

impl DropTracker {
  fn new(log: &Rc<RefCell<Vec<i32>>>, id: i32) -> Self {
    Self {
      id: id.to_string(),
      payload: format!("payload-{id}"),
      log: Rc::clone(log),
    }
  }
}

impl Drop for DropTracker {
  fn drop(&mut self) {
    self
      .log
      .borrow_mut()
      .push(self.id.parse().unwrap_or_default());
  }
}

fn main() {
  const N: i32 = 3000;
  let drops = Rc::new(RefCell::new(Vec::new()));

  {
    let mut deque = BlockDeque::new();

    for id in 0..N / 2 {
      deque.push_back(DropTracker::new(&drops, id));
    }

    for id in N / 2..N - 100 {
      deque.push_front(DropTracker::new(&drops, id));
    }

    deque.insert_iter(
      deque.len() / 2,
      (N - 100..N).map(|id| DropTracker::new(&drops, id)),
    );
    assert_eq!(deque.len(), N as usize);
    assert!(deque.block_count() > 1);

    for (idx, elem) in deque.range_mut(200..600).enumerate() {
      elem.payload.push_str(&format!("-range-{idx}"));
    }

    deque.retain(|elem| elem.payload.len() % 2 == 0);
    let removed = erase_if(&mut deque, |elem| elem.id.ends_with('3'));
    assert!(removed > 0);

    let len = deque.len();
    assert_eq!(deque.erase(10..len / 2), 10);

    while deque.len() > 5 {
      deque.pop_front();
      deque.pop_back();
    }

    let moved: Vec<_> = deque.into_iter().collect();
    assert!(moved.len() <= 5);
  }

  let mut dropped = drops.borrow().clone();
  dropped.sort();
  assert_eq!(dropped, (0..N).collect::<Vec<_>>());
}
