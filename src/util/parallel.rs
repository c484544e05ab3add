//! Work-stealing-flavored parallel-for over a fixed slice, used for the one
//! CPU-bound task worth spreading across threads on the render path:
//! visibility sorting of transparent geometry. No ordering guarantees
//! between elements; callers that need a stable order sort afterwards.

/// Splits `items` into roughly `std::thread::available_parallelism()` chunks
/// and runs `f` over each chunk on its own scoped thread, joining before
/// returning. `f` receives a chunk's start index alongside its slice so
/// per-item diagnostics can report a global index.
///
/// Falls back to running on the calling thread for slices too small to be
/// worth splitting.
pub fn parallel_for<T, F>(items: &[T], f: F)
where
    T: Sync,
    F: Fn(usize, &T) + Sync,
{
    const MIN_CHUNK: usize = 64;

    if items.len() <= MIN_CHUNK {
        for (index, item) in items.iter().enumerate() {
            f(index, item);
        }
        return;
    }

    let workers = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get).max(1);
    let chunk_size = items.len().div_ceil(workers).max(MIN_CHUNK);

    std::thread::scope(|scope| {
        for (chunk_index, chunk) in items.chunks(chunk_size).enumerate() {
            let base = chunk_index * chunk_size;
            let f = &f;
            scope.spawn(move || {
                for (offset, item) in chunk.iter().enumerate() {
                    f(base + offset, item);
                }
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn visits_every_element_exactly_once() {
        let items: Vec<u32> = (0..500).collect();
        let visits = AtomicUsize::new(0);
        parallel_for(&items, |index, value| {
            assert_eq!(index as u32, *value);
            visits.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(visits.load(Ordering::Relaxed), items.len());
    }

    #[test]
    fn small_slices_run_inline_in_order() {
        let items = vec![1, 2, 3];
        let seen = std::sync::Mutex::new(Vec::new());
        parallel_for(&items, |_, value| {
            seen.lock().unwrap().push(*value);
        });
        assert_eq!(*seen.lock().unwrap(), items, "below MIN_CHUNK, the fallback path preserves order");
    }
}
