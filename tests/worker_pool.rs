use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use brotpool::{PoolError, WorkerPool};
use proptest::prelude::*;

fn collect_indices(workers: usize, jobs: usize) -> Vec<usize> {
    let seen = Arc::new(Mutex::new(Vec::with_capacity(jobs)));
    let mut pool = WorkerPool::new(workers).unwrap();
    let sink = Arc::clone(&seen);
    pool.configure(
        Arc::new(move |job: usize, _worker: usize| {
            sink.lock().unwrap().push(job);
        }),
        jobs,
    );
    pool.dispatch().unwrap();
    pool.shutdown();

    let mut out = seen.lock().unwrap().clone();
    out.sort_unstable();
    out
}

#[test]
fn zero_jobs_invoke_nothing() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut pool = WorkerPool::new(4).unwrap();
    let h = Arc::clone(&hits);
    pool.configure(
        Arc::new(move |_: usize, _: usize| {
            h.fetch_add(1, Ordering::Relaxed);
        }),
        0,
    );
    let stats = pool.dispatch().unwrap();
    assert_eq!(stats.jobs, 0);
    assert_eq!(hits.load(Ordering::Relaxed), 0);
}

#[test]
fn every_index_runs_exactly_once_for_any_worker_count() {
    for workers in [1usize, 2, 3, 8] {
        for jobs in [1usize, 7, 64, 1000] {
            assert_eq!(
                collect_indices(workers, jobs),
                (0..jobs).collect::<Vec<_>>(),
                "workers={workers} jobs={jobs}"
            );
        }
    }
}

#[test]
fn dispatch_blocks_until_the_last_job_finishes() {
    const JOBS: usize = 32;
    let done = Arc::new(AtomicBool::new(false));
    let mut pool = WorkerPool::new(4).unwrap();
    let flag = Arc::clone(&done);
    pool.configure(
        Arc::new(move |job: usize, _: usize| {
            if job == JOBS - 1 {
                std::thread::sleep(std::time::Duration::from_millis(50));
                flag.store(true, Ordering::Release);
            }
        }),
        JOBS,
    );
    pool.dispatch().unwrap();
    assert!(done.load(Ordering::Acquire));
}

#[test]
fn worker_ids_stay_in_range() {
    let max_id = Arc::new(AtomicUsize::new(0));
    let mut pool = WorkerPool::new(3).unwrap();
    let m = Arc::clone(&max_id);
    pool.configure(
        Arc::new(move |_: usize, worker: usize| {
            m.fetch_max(worker, Ordering::Relaxed);
        }),
        500,
    );
    pool.dispatch().unwrap();
    assert!(max_id.load(Ordering::Relaxed) < 3);
}

#[test]
fn shutdown_of_idle_pool_is_clean() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut pool = WorkerPool::new(4).unwrap();
    let h = Arc::clone(&hits);
    pool.configure(
        Arc::new(move |_: usize, _: usize| {
            h.fetch_add(1, Ordering::Relaxed);
        }),
        100,
    );
    pool.shutdown();
    assert!(!pool.is_alive());
    assert_eq!(hits.load(Ordering::Relaxed), 0);
    // The job closure is the only other owner of `hits`; dropping the pool releases it.
    drop(pool);
    assert_eq!(Arc::strong_count(&hits), 1);
}

#[test]
fn drop_without_dispatch_joins_workers() {
    let pool = WorkerPool::new(2).unwrap();
    assert_eq!(pool.worker_count(), 2);
    drop(pool);
}

#[test]
fn panicking_job_poisons_instead_of_hanging() {
    let mut pool = WorkerPool::new(2).unwrap();
    pool.configure(
        Arc::new(|job: usize, _: usize| {
            if job == 3 {
                panic!("job 3 failed");
            }
        }),
        16,
    );
    assert!(matches!(pool.dispatch(), Err(PoolError::WorkerPanicked)));
    assert!(matches!(pool.dispatch(), Err(PoolError::WorkerPanicked)));
    pool.shutdown();
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        .. ProptestConfig::default()
    })]

    #[test]
    fn claimed_indices_are_exactly_the_domain(workers in 1usize..6, jobs in 0usize..300) {
        prop_assert_eq!(collect_indices(workers, jobs), (0..jobs).collect::<Vec<_>>());
    }
}
