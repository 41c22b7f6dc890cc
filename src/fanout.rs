use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

/// Results come back in input order; every job runs to completion.
pub fn settle_all<T, R, F>(inputs: &[T], workers: usize, job: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if inputs.is_empty() {
        return Vec::new();
    }
    let workers = workers.clamp(1, inputs.len());
    if workers == 1 {
        return inputs.iter().map(&job).collect();
    }

    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();
    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next = &next;
            let job = &job;
            scope.spawn(move || {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(input) = inputs.get(index) else {
                        break;
                    };
                    if tx.send((index, job(input))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(tx);

    let mut slots: Vec<Option<R>> = (0..inputs.len()).map(|_| None).collect();
    for (index, result) in rx {
        slots[index] = Some(result);
    }
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn preserves_input_order() {
        let inputs: Vec<u64> = (0..20).collect();
        let results = settle_all(&inputs, 4, |value| {
            thread::sleep(Duration::from_millis((20 - value) % 5));
            value * 2
        });
        assert_eq!(results, inputs.iter().map(|v| v * 2).collect::<Vec<_>>());
    }

    #[test]
    fn failures_do_not_drop_siblings() {
        let inputs = vec![1, 2, 3, 4];
        let results = settle_all(&inputs, 3, |value| {
            if *value == 2 { Err("boom") } else { Ok(*value) }
        });
        assert_eq!(results.len(), 4);
        assert!(results[1].is_err());
        assert_eq!(results[3], Ok(4));
    }

    #[test]
    fn empty_input_spawns_nothing() {
        let inputs: Vec<u8> = Vec::new();
        let results: Vec<u8> = settle_all(&inputs, 8, |value| *value);
        assert!(results.is_empty());
    }
}
