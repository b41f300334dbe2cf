//! Debounce controller for free-text inputs.
//!
//! Each input gets its own [`Debouncer`], backed by a small driver task.
//! Every update restarts the quiet period; a value is propagated only after
//! the input has been quiet for the whole period and only if it differs from
//! the last settled value. Superseded values are dropped without output.
//!
//! Dropping the [`Debouncer`] aborts the driver, discarding any pending value.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// Handle feeding raw values into a debounce driver.
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    driver: JoinHandle<()>,
    delay: Duration,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Start a debouncer whose settled values arrive on the returned receiver.
    pub fn new(initial: T, delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::spawn_into(initial, delay, tx, |v| v), rx)
    }

    /// Start a debouncer that maps settled values into a shared sink.
    ///
    /// Lets several independent inputs report into one channel, tagged by
    /// `map`, without sharing timers.
    pub fn spawn_into<O, F>(
        initial: T,
        delay: Duration,
        sink: mpsc::UnboundedSender<O>,
        map: F,
    ) -> Self
    where
        O: Send + 'static,
        F: Fn(T) -> O + Send + 'static,
    {
        let (input, rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(drive(initial, delay, rx, sink, map));
        Self {
            input,
            driver,
            delay,
        }
    }

    /// Feed a raw value. Returns `false` if the driver has stopped.
    pub fn update(&self, value: T) -> bool {
        self.input.send(value).is_ok()
    }

    /// Quiet period of this debouncer.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

async fn drive<T, O, F>(
    mut settled: T,
    delay: Duration,
    mut input: mpsc::UnboundedReceiver<T>,
    sink: mpsc::UnboundedSender<O>,
    map: F,
) where
    T: Clone + PartialEq,
    F: Fn(T) -> O,
{
    let mut pending: Option<T> = None;
    loop {
        match pending.take() {
            None => match input.recv().await {
                Some(value) => pending = Some(value),
                None => return,
            },
            Some(value) => {
                tokio::select! {
                    next = input.recv() => match next {
                        // Superseded: the old value is dropped silently.
                        Some(newer) => pending = Some(newer),
                        None => return,
                    },
                    _ = sleep(delay) => {
                        if value != settled {
                            settled = value.clone();
                            debug!(delay_ms = delay.as_millis() as u64, "Debounced input settled");
                            if sink.send(map(value)).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn test_rapid_updates_collapse_to_last_value() {
        let (debouncer, mut settled) = Debouncer::new(String::new(), QUIET);

        for value in ["g", "ga", "gau", "gaus", "gauss"] {
            assert!(debouncer.update(value.to_string()));
            sleep(Duration::from_millis(50)).await;
        }
        sleep(Duration::from_millis(400)).await;

        assert_eq!(settled.recv().await.as_deref(), Some("gauss"));
        assert!(settled.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_updates_each_propagate() {
        let (debouncer, mut settled) = Debouncer::new(0u32, QUIET);

        for value in 1..=3u32 {
            debouncer.update(value);
            sleep(Duration::from_millis(350)).await;
        }

        assert_eq!(settled.recv().await, Some(1));
        assert_eq!(settled.recv().await, Some(2));
        assert_eq!(settled.recv().await, Some(3));
        assert!(settled.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_returning_to_settled_value_is_silent() {
        let (debouncer, mut settled) = Debouncer::new("nerf".to_string(), QUIET);

        debouncer.update("nerfs".to_string());
        sleep(Duration::from_millis(100)).await;
        debouncer.update("nerf".to_string());
        sleep(Duration::from_millis(500)).await;

        assert!(settled.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_inputs_do_not_reset_each_other() {
        let (sink, mut out) = mpsc::unbounded_channel();
        let search = Debouncer::spawn_into(String::new(), QUIET, sink.clone(), |v| ("search", v));
        let author = Debouncer::spawn_into(String::new(), QUIET, sink, |v| ("author", v));

        search.update("splat".to_string());
        sleep(Duration::from_millis(200)).await;
        // Typing into author must not push search's deadline back.
        author.update("kerbl".to_string());
        sleep(Duration::from_millis(150)).await;

        assert_eq!(out.try_recv().ok(), Some(("search", "splat".to_string())));
        assert!(out.try_recv().is_err());

        sleep(Duration::from_millis(200)).await;
        assert_eq!(out.try_recv().ok(), Some(("author", "kerbl".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_discards_pending_value() {
        let (debouncer, mut settled) = Debouncer::new(String::new(), QUIET);
        debouncer.update("pending".to_string());
        sleep(Duration::from_millis(10)).await;
        drop(debouncer);
        sleep(Duration::from_millis(500)).await;

        assert_eq!(settled.recv().await, None);
    }
}
