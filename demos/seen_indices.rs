use concurrent_bitmap::ConcurrentBitmap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

// Several workers walk overlapping slices of a node list; each node must be
// processed exactly once, by whichever worker marks it first.
fn main() {
    const NODES: usize = 100;
    const WORKERS: usize = 4;

    let seen = ConcurrentBitmap::new(NODES);
    let processed = AtomicUsize::new(0);

    thread::scope(|s| {
        for worker in 0..WORKERS {
            let seen = &seen;
            let processed = &processed;
            s.spawn(move || {
                let start = worker * NODES / (WORKERS + 1);
                for node in start..NODES {
                    if seen.set(node) {
                        processed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    println!("{seen:?}");
    println!("processed {} of {NODES} nodes", processed.into_inner());
}
