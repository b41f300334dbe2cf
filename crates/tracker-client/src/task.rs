//! Cancellable scheduled work.
//!
//! A [`TaskHandle`] owns a spawned task and aborts it when cancelled or
//! dropped. Retry delays are `sleep`s inside the task, so aborting the
//! handle also discards any pending retry timer.

use std::future::Future;

use tokio::task::JoinHandle;

/// Owning handle to a spawned task.
#[derive(Debug)]
pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `future` on the current runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Abort the task. A no-op if it already finished.
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_timer() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let handle = TaskHandle::spawn(async move {
            tokio::time::sleep(Duration::from_secs(15)).await;
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_task_reports_finished() {
        let handle = TaskHandle::spawn(async {});
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(handle.is_finished());
        handle.cancel();
    }
}
