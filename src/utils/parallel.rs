/// Parallel processing utilities

pub fn configure_thread_pool(threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    let threads = if threads == 0 {
        num_cpus::get()
    } else {
        threads
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
}

/// Threads for `jobs` independent tasks, capped at `max_workers` (0 = all CPUs).
pub fn worker_count(max_workers: usize, jobs: usize) -> usize {
    let cap = if max_workers == 0 {
        num_cpus::get()
    } else {
        max_workers
    };
    cap.min(jobs).max(1)
}

/// A pool local to one run, so concurrent runs never share workers.
pub fn build_pool(threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|idx| format!("biorempp-worker-{}", idx))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(4, 2), 2);
        assert_eq!(worker_count(2, 4), 2);
        assert_eq!(worker_count(4, 0), 1);
        assert!(worker_count(0, 4) >= 1);
    }

    #[test]
    fn test_build_pool() {
        let pool = build_pool(2).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}
