//! Native Threads
//!
//! Fire-and-forget OS threads for engine work that must not run on a thread
//! created by the managed runtime. The closure is moved into the new thread
//! and dropped there after it ran; if the OS refuses to create the thread the
//! closure is dropped before the error is returned.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, panic_message};

/// Task function type
pub type TaskFn = Box<dyn FnOnce() + Send + 'static>;

/// Spawner for detached native threads
#[derive(Debug, Clone)]
pub struct NativeThread {
    name: String,
    stack_size: Option<usize>,
}

impl NativeThread {
    pub fn new() -> Self {
        Self::from_config(&BridgeConfig::default())
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            name: config.thread_name.clone(),
            stack_size: config.thread_stack_size,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Run `task` once on a new OS thread. Never joins.
    pub fn spawn<F>(&self, task: F) -> Result<(), BridgeError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.spawn_with(Box::new(task), |builder, task| builder.spawn(task).map(drop))
    }

    /// Spawn through an explicit creation primitive.
    ///
    /// `create` owns the task it is given: on success the new thread drops it
    /// after running it, on failure it is dropped when `create` returns.
    pub(crate) fn spawn_with<C>(&self, task: TaskFn, create: C) -> Result<(), BridgeError>
    where
        C: FnOnce(thread::Builder, TaskFn) -> io::Result<()>,
    {
        let mut builder = thread::Builder::new().name(self.name.clone());
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        let name = self.name.clone();
        let guarded: TaskFn = Box::new(move || {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                tracing::error!("Native thread {} panicked: {}", name, panic_message(&*payload));
            }
        });

        create(builder, guarded).map_err(|err| {
            tracing::error!("Failed to create native thread {}: {}", self.name, err);
            BridgeError::ThreadSpawn(err)
        })
    }
}

impl Default for NativeThread {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `task` once on a new OS thread with the default settings
pub fn spawn_native<F>(task: F) -> Result<(), BridgeError>
where
    F: FnOnce() + Send + 'static,
{
    NativeThread::new().spawn(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    /// Captured state counting how often it is created and dropped
    struct Tracked {
        drops: Arc<AtomicUsize>,
    }

    impl Tracked {
        fn new(allocs: &AtomicUsize, drops: &Arc<AtomicUsize>) -> Self {
            allocs.fetch_add(1, Ordering::SeqCst);
            Self { drops: drops.clone() }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn wait_for(counter: &AtomicUsize, expected: usize) {
        for _ in 0..200 {
            if counter.load(Ordering::SeqCst) == expected {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("counter stuck at {}", counter.load(Ordering::SeqCst));
    }

    #[test]
    fn test_runs_once_and_frees_once() {
        let allocs = AtomicUsize::new(0);
        let drops = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        let tracked = Tracked::new(&allocs, &drops);
        let run_counter = runs.clone();
        spawn_native(move || {
            let _keep = &tracked;
            run_counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        wait_for(&drops, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(allocs.load(Ordering::SeqCst), 1);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_runs_on_named_os_thread() {
        let (tx, rx) = mpsc::channel();
        NativeThread::new()
            .name("ulj-test-worker")
            .spawn(move || {
                let current = thread::current();
                tx.send((current.id(), current.name().map(str::to_string))).unwrap();
            })
            .unwrap();

        let (id, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_ne!(id, thread::current().id());
        assert_eq!(name.as_deref(), Some("ulj-test-worker"));
    }

    #[test]
    fn test_creation_failure_frees_task() {
        let allocs = AtomicUsize::new(0);
        let drops = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        let tracked = Tracked::new(&allocs, &drops);
        let run_counter = runs.clone();
        let task: TaskFn = Box::new(move || {
            let _keep = &tracked;
            run_counter.fetch_add(1, Ordering::SeqCst);
        });

        let result = NativeThread::new().spawn_with(task, |_builder, task| {
            drop(task);
            Err(io::Error::new(io::ErrorKind::OutOfMemory, "simulated thread creation failure"))
        });

        assert!(matches!(result, Err(BridgeError::ThreadSpawn(_))));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(allocs.load(Ordering::SeqCst), 1);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_task_is_contained() {
        let drops = Arc::new(AtomicUsize::new(0));
        let tracked = Tracked::new(&AtomicUsize::new(0), &drops);

        spawn_native(move || {
            let _keep = &tracked;
            panic!("task failed");
        })
        .unwrap();

        wait_for(&drops, 1);
    }

    #[test]
    fn test_many_threads() {
        let runs = Arc::new(AtomicUsize::new(0));
        for _ in 0..16 {
            let runs = runs.clone();
            spawn_native(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        wait_for(&runs, 16);
    }
}
