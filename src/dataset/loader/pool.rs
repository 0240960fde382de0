use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc::channel};

/// Number of worker threads for `tasks` jobs when `requested` workers are asked for.
pub(crate) fn worker_count(requested: usize, tasks: usize) -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(requested)
        .min(tasks)
        .max(1)
}

/// Run `task` over `items` on up to `workers` threads, returning results in input order.
///
/// Every item is tagged with its position before it is queued and the
/// collected results are sorted back by that tag. After the first failure
/// no further items are started; the error of the earliest failed item is
/// returned and no partial result is kept.
pub(crate) fn run_ordered<T, R, E, F>(items: Vec<T>, workers: usize, task: F) -> Result<Vec<R>, E>
where
    T: Send,
    R: Send,
    E: Send,
    F: Fn(T) -> Result<R, E> + Sync,
{
    let total = items.len();
    let workers = worker_count(workers, total);
    if workers <= 1 {
        return items.into_iter().map(task).collect();
    }

    let queue = Arc::new(Mutex::new(items.into_iter().enumerate().collect::<VecDeque<_>>()));
    let failed = Arc::new(AtomicBool::new(false));
    let (tx, rx) = channel();
    let task = &task;

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let failed = Arc::clone(&failed);
            let tx = tx.clone();
            scope.spawn(move || {
                loop {
                    if failed.load(Ordering::Relaxed) {
                        break;
                    }
                    let next = match queue.lock() {
                        Ok(mut guard) => guard.pop_front(),
                        Err(_) => return,
                    };
                    let Some((index, item)) = next else {
                        break;
                    };
                    let result = task(item);
                    if result.is_err() {
                        failed.store(true, Ordering::Relaxed);
                    }
                    if tx.send((index, result)).is_err() {
                        return;
                    }
                }
            });
        }
    });
    drop(tx);

    let mut tagged: Vec<(usize, Result<R, E>)> = rx.into_iter().collect();
    tagged.sort_by_key(|(index, _)| *index);
    let mut results = Vec::with_capacity(total);
    for (_, result) in tagged {
        results.push(result?);
    }
    Ok(results)
}
