use core::{fmt, marker::PhantomData};

use serde_core::{
  de::{Error, SeqAccess, Visitor},
  Deserialize, Deserializer, Serialize, Serializer,
};

use super::{BlockDeque, MemoryResource};

impl<T: Serialize, A: MemoryResource> Serialize for BlockDeque<T, A> {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.collect_seq(self)
  }
}

impl<'de, T, A> Deserialize<'de> for BlockDeque<T, A>
where
  T: Deserialize<'de>,
  A: MemoryResource + Default,
{
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    struct SeqVisitor<T, A> {
      marker: PhantomData<(T, A)>,
    }

    impl<'de, T, A> Visitor<'de> for SeqVisitor<T, A>
    where
      T: Deserialize<'de>,
      A: MemoryResource + Default,
    {
      type Value = BlockDeque<T, A>;

      fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence")
      }

      #[inline]
      fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
      where
        S: SeqAccess<'de>,
      {
        let mut values = BlockDeque::<T, A>::new_in(A::default());
        reserve_hint(&mut values, seq.size_hint())?;

        while let Some(value) = seq.next_element()? {
          values.try_push_back(value).map_err(Error::custom)?;
        }

        Ok(values)
      }
    }

    let visitor = SeqVisitor {
      marker: PhantomData,
    };
    deserializer.deserialize_seq(visitor)
  }

  fn deserialize_in_place<D>(deserializer: D, place: &mut Self) -> Result<(), D::Error>
  where
    D: Deserializer<'de>,
  {
    struct SeqInPlaceVisitor<'a, T, A: MemoryResource>(&'a mut BlockDeque<T, A>);

    impl<'de, T, A> Visitor<'de> for SeqInPlaceVisitor<'_, T, A>
    where
      T: Deserialize<'de>,
      A: MemoryResource,
    {
      type Value = ();

      fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence")
      }

      #[inline]
      fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
      where
        S: SeqAccess<'de>,
      {
        self.0.clear();
        reserve_hint(self.0, seq.size_hint())?;

        while let Some(value) = seq.next_element()? {
          self.0.try_push_back(value).map_err(Error::custom)?;
        }

        Ok(())
      }
    }

    deserializer.deserialize_seq(SeqInPlaceVisitor(place))
  }
}

/// Reserves room for the announced length, capped at 1 MiB of elements.
fn reserve_hint<T, A: MemoryResource, E: Error>(
  deque: &mut BlockDeque<T, A>,
  hint: Option<usize>,
) -> Result<(), E> {
  const MAX_PREALLOC_BYTES: usize = 1024 * 1024;

  let cap = match core::mem::size_of::<T>() {
    0 => 0,
    size => MAX_PREALLOC_BYTES / size,
  };
  match hint {
    Some(n) if n > 0 => deque
      .try_reserve_back(n.min(cap))
      .map_err(Error::custom),
    _ => Ok(()),
  }
}
