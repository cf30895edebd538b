//! Free-text search debouncing.
//!
//! [`SearchDebouncer`] runs on a caller-supplied clock (milliseconds) so hosts
//! can drive it from their own event loop; [`debounce_queries`] drives it from
//! a tokio channel.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Quiet interval before pending search input is evaluated.
pub const DEFAULT_QUIET_INTERVAL_MS: u64 = 400;

#[derive(Debug, Clone, PartialEq)]
struct PendingInput {
    value: String,
    received_ms: u64,
}

/// Holds the latest search input until no new input arrived for the quiet interval.
///
/// New input replaces the pending value and restarts the interval. A settled
/// value equal to the previously emitted one is swallowed.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    quiet_ms: u64,
    pending: Option<PendingInput>,
    last_emitted: Option<String>,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_QUIET_INTERVAL_MS))
    }
}

impl SearchDebouncer {
    pub fn new(quiet_interval: Duration) -> Self {
        Self {
            quiet_ms: u64::try_from(quiet_interval.as_millis()).unwrap_or(u64::MAX),
            pending: None,
            last_emitted: None,
        }
    }

    /// Record new input at `now_ms`, discarding any pending value.
    pub fn input(&mut self, value: impl Into<String>, now_ms: u64) {
        self.pending = Some(PendingInput {
            value: value.into(),
            received_ms: now_ms,
        });
    }

    /// When the pending value settles, if any.
    pub fn deadline(&self) -> Option<u64> {
        self.pending
            .as_ref()
            .map(|p| p.received_ms.saturating_add(self.quiet_ms))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Emit the pending value if its quiet interval has elapsed by `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Option<String> {
        let deadline = self.deadline()?;
        if now_ms < deadline {
            return None;
        }
        self.settle()
    }

    /// Emit the pending value immediately.
    pub fn flush(&mut self) -> Option<String> {
        self.settle()
    }

    /// Drop the pending value without emitting it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Drop the pending value and forget the last emitted one, so the next
    /// settled value is emitted even if it repeats an earlier search.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_emitted = None;
    }

    fn settle(&mut self) -> Option<String> {
        let pending = self.pending.take()?;
        if self.last_emitted.as_deref() == Some(pending.value.as_str()) {
            tracing::debug!("Search input unchanged, skipping evaluation");
            return None;
        }
        self.last_emitted = Some(pending.value.clone());
        Some(pending.value)
    }
}

/// Feed search input from `inputs` through `debouncer`, calling `on_settled`
/// for every value that survives the quiet interval.
///
/// When the channel closes, a still-pending value is emitted immediately.
pub async fn debounce_queries<F>(
    mut inputs: mpsc::Receiver<String>,
    mut debouncer: SearchDebouncer,
    mut on_settled: F,
) where
    F: FnMut(String),
{
    let origin = Instant::now();
    let elapsed_ms = || u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX);

    loop {
        let deadline = debouncer.deadline();
        let wake_at = origin + Duration::from_millis(deadline.unwrap_or(0));

        tokio::select! {
            received = inputs.recv() => match received {
                Some(value) => debouncer.input(value, elapsed_ms()),
                None => {
                    if let Some(value) = debouncer.flush() {
                        on_settled(value);
                    }
                    break;
                }
            },
            _ = sleep_until(wake_at), if deadline.is_some() => {
                if let Some(value) = debouncer.poll(elapsed_ms()) {
                    on_settled(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_only_last_keystroke_settles() {
        let mut debouncer = SearchDebouncer::default();
        debouncer.input("a", 0);
        debouncer.input("ab", 100);
        debouncer.input("abc", 200);

        assert_eq!(debouncer.deadline(), Some(600));
        assert_eq!(debouncer.poll(599), None);
        assert_eq!(debouncer.poll(600), Some("abc".to_string()));
        assert_eq!(debouncer.poll(10_000), None);
    }

    #[test]
    fn test_input_restarts_interval() {
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(400));
        debouncer.input("lag", 0);
        assert_eq!(debouncer.poll(300), None);
        debouncer.input("lagos", 350);
        assert_eq!(debouncer.poll(400), None);
        assert_eq!(debouncer.poll(750), Some("lagos".to_string()));
    }

    #[test]
    fn test_identical_consecutive_values_emit_once() {
        let mut debouncer = SearchDebouncer::default();
        debouncer.input("kano", 0);
        assert_eq!(debouncer.poll(400), Some("kano".to_string()));

        debouncer.input("kano", 500);
        assert_eq!(debouncer.poll(900), None);
        assert!(!debouncer.is_pending());

        debouncer.input("kan", 1000);
        assert_eq!(debouncer.poll(1400), Some("kan".to_string()));
    }

    #[test]
    fn test_flush_and_cancel() {
        let mut debouncer = SearchDebouncer::default();
        debouncer.input("abuja", 0);
        debouncer.cancel();
        assert_eq!(debouncer.flush(), None);

        debouncer.input("abuja", 0);
        assert_eq!(debouncer.flush(), Some("abuja".to_string()));
    }

    #[test]
    fn test_reset_allows_repeat_search() {
        let mut debouncer = SearchDebouncer::default();
        debouncer.input("enugu", 0);
        assert_eq!(debouncer.poll(400), Some("enugu".to_string()));

        debouncer.input("ibadan", 500);
        debouncer.reset();
        assert!(!debouncer.is_pending());

        debouncer.input("enugu", 1000);
        assert_eq!(debouncer.poll(1400), Some("enugu".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_emits_after_quiet_interval() {
        let (tx, rx) = mpsc::channel(8);
        let settled: Arc<Mutex<Vec<(String, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let start = Instant::now();

        let sink = settled.clone();
        let driver = tokio::spawn(debounce_queries(rx, SearchDebouncer::default(), move |value| {
            let at = start.elapsed().as_millis() as u64;
            sink.lock().unwrap().push((value, at));
        }));

        tx.send("a".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send("ab".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send("abc".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        drop(tx);
        driver.await.unwrap();

        assert_eq!(*settled.lock().unwrap(), vec![("abc".to_string(), 600)]);
    }
}
