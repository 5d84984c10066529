use remap_kernel::{Scheduler, TaskError, TaskHandle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn many_more_tasks_than_workers() {
    let scheduler = Scheduler::new(2).unwrap();
    let ran = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..500usize)
        .map(|n| {
            let ran = Arc::clone(&ran);
            scheduler
                .submit(move || {
                    ran.fetch_add(1, Ordering::Relaxed);
                    Ok::<_, String>(n % 7)
                })
                .unwrap()
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.get().unwrap()).sum();
    assert_eq!(total, (0..500).map(|n| n % 7).sum::<usize>());
    assert_eq!(ran.load(Ordering::Relaxed), 500);
    assert!(scheduler.shutdown().is_empty());
}

#[test]
fn chained_tasks_across_pool() {
    // Each task waits on the one submitted before it.
    let scheduler = Arc::new(Scheduler::new(1).unwrap());
    let mut previous: Option<TaskHandle<u32, String>> = None;

    for n in 0..20u32 {
        let before = previous.take();
        let handle = scheduler
            .submit(move || match before {
                Some(handle) => handle
                    .get()
                    .map(|acc: u32| acc + n)
                    .map_err(|err: TaskError<String>| err.to_string()),
                None => Ok(n),
            })
            .unwrap();
        previous = Some(handle);
    }

    let last = previous.unwrap().get().unwrap();
    assert_eq!(last, (0..20).sum::<u32>());
}

#[test]
fn thread_names_use_prefix() {
    let scheduler = Scheduler::with_thread_name(1, "test-pool").unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    let handle = scheduler
        .submit(move || {
            tx.send(std::thread::current().name().map(str::to_string))
                .map_err(|err| err.to_string())
        })
        .unwrap();

    // Receive before get() so the worker, not this thread, runs the task.
    let name = rx.recv().unwrap();
    handle.get().unwrap();
    assert_eq!(name.as_deref(), Some("test-pool-0"));
}
