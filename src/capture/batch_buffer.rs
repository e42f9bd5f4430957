use std::mem;
use std::sync::Mutex;

/// Thread-safe accumulator of captured units of one kind.
///
/// Producers call [`add`] from whatever thread the capture library
/// delivers on; when the buffer reaches its capacity the internal
/// storage is swapped for an empty one under the same lock that guarded
/// the size check, and the just-sealed batch is returned to the caller
/// for forwarding. The swap-under-lock is the correctness guarantee: no
/// unit is ever included in two batches, and none is dropped between
/// the size check and the swap.
///
/// [`add`]: BatchBuffer::add
#[derive(Debug)]
pub struct BatchBuffer<T> {
    capacity: usize,
    units: Mutex<Vec<T>>,
}

impl<T> BatchBuffer<T> {
    /// Creates a buffer sealing batches at `capacity` units.
    ///
    /// `capacity` must be positive; the configuration layer owns the
    /// default-on-invalid policy and never passes zero here.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            capacity,
            units: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Appends a unit. Returns the sealed batch if this unit filled the
    /// buffer, leaving the buffer empty for the next batch.
    pub fn add(&self, unit: T) -> Option<Vec<T>> {
        let mut units = self.units.lock().unwrap();
        units.push(unit);
        if units.len() >= self.capacity {
            Some(mem::replace(&mut *units, Vec::with_capacity(self.capacity)))
        } else {
            None
        }
    }

    /// Seals and returns whatever is currently buffered, possibly a
    /// partial batch. Used at shutdown. Idempotent: a second call with
    /// no intervening adds returns an empty batch.
    pub fn drain_remainder(&self) -> Vec<T> {
        let mut units = self.units.lock().unwrap();
        mem::take(&mut *units)
    }

    /// Number of units currently buffered (not yet sealed).
    pub fn buffered(&self) -> usize {
        self.units.lock().unwrap().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn seals_exactly_at_capacity_in_call_order() {
        let buffer = BatchBuffer::new(3);

        assert!(buffer.add("a").is_none());
        assert!(buffer.add("b").is_none());
        let batch = buffer.add("c").expect("third add seals the batch");
        assert_eq!(batch, vec!["a", "b", "c"]);
        assert_eq!(buffer.buffered(), 0);

        assert!(buffer.add("d").is_none());
        assert_eq!(buffer.buffered(), 1);

        assert_eq!(buffer.drain_remainder(), vec!["d"]);
        assert_eq!(buffer.buffered(), 0);
    }

    #[test]
    fn drain_remainder_is_idempotent() {
        let buffer: BatchBuffer<u32> = BatchBuffer::new(5);
        buffer.add(1);
        buffer.add(2);

        assert_eq!(buffer.drain_remainder(), vec![1, 2]);
        assert!(buffer.drain_remainder().is_empty());
    }

    #[test]
    fn yields_floor_n_over_k_full_batches_plus_remainder() {
        let k = 7;
        let n = 46usize;
        let buffer = BatchBuffer::new(k);

        let mut batches = Vec::new();
        for i in 0..n {
            if let Some(batch) = buffer.add(i) {
                batches.push(batch);
            }
        }

        assert_eq!(batches.len(), n / k);
        assert!(batches.iter().all(|b| b.len() == k));

        let remainder = buffer.drain_remainder();
        assert_eq!(remainder.len(), n % k);

        // Every unit appears exactly once, in call order.
        let replayed: Vec<usize> = batches
            .into_iter()
            .flatten()
            .chain(remainder.into_iter())
            .collect();
        assert_eq!(replayed, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn concurrent_producers_lose_nothing_and_never_overfill() {
        let producers = 8;
        let buffer = Arc::new(BatchBuffer::new(13));
        let sealed = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        let mut total = 0usize;
        for p in 0..producers {
            // Uneven per-producer counts so batches straddle producers.
            let count = 211 + rand::random::<usize>() % 400;
            total += count;
            let buffer = Arc::clone(&buffer);
            let sealed = Arc::clone(&sealed);
            handles.push(thread::spawn(move || {
                for i in 0..count {
                    if let Some(batch) = buffer.add((p, i)) {
                        sealed.lock().unwrap().push(batch);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let batches = sealed.lock().unwrap();
        let remainder = buffer.drain_remainder();

        assert!(batches.iter().all(|b| b.len() == 13));
        let forwarded: usize = batches.iter().map(|b| b.len()).sum::<usize>() + remainder.len();
        assert_eq!(forwarded, total);

        // Per-producer order must be preserved across batch boundaries.
        let mut last_seen = vec![None; producers];
        for &(p, i) in batches.iter().flatten().chain(remainder.iter()) {
            if let Some(prev) = last_seen[p] {
                assert!(i > prev, "producer {} replayed out of order", p);
            }
            last_seen[p] = Some(i);
        }
    }
}
