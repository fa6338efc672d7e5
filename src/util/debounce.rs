use std::time::Duration;
use tokio::time::Instant;

/// Holds back rapidly changing input until it has been still for `delay`.
///
/// Every [`push`](Debouncer::push) of a new value re-arms the timer; the
/// latest value becomes [`stable`](Debouncer::stable) only once `delay`
/// has passed without another change. Driven either by polling from a
/// periodic tick or by awaiting [`settle`](Debouncer::settle).
///
/// Uses `tokio::time::Instant`, so paused-clock tests can advance it.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    stable: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            stable: initial,
            pending: None,
        }
    }

    /// Last value that survived the delay.
    pub fn stable(&self) -> &T {
        &self.stable
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value will be emitted, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.delay)
    }

    /// Record raw input.
    ///
    /// Going back to the stable value cancels the pending emission; repeating
    /// the pending value keeps its original deadline.
    pub fn push(&mut self, value: T) {
        if value == self.stable {
            self.pending = None;
            return;
        }
        if let Some((pending, _)) = &self.pending {
            if *pending == value {
                return;
            }
        }
        self.pending = Some((value, Instant::now()));
    }

    /// Emit the pending value if its delay has elapsed.
    pub fn poll(&mut self) -> Option<T> {
        let deadline = self.deadline()?;
        if Instant::now() < deadline {
            return None;
        }
        self.take_pending()
    }

    /// Emit the pending value now, skipping the rest of the delay.
    pub fn flush(&mut self) -> Option<T> {
        self.take_pending()
    }

    /// Wait for the pending value's deadline, then emit it.
    ///
    /// Returns `None` immediately when nothing is pending.
    pub async fn settle(&mut self) -> Option<T> {
        let deadline = self.deadline()?;
        tokio::time::sleep_until(deadline).await;
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<T> {
        let (value, _) = self.pending.take()?;
        self.stable = value.clone();
        Some(value)
    }
}
