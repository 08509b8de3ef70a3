//! Next-frame debouncing of pagination passes
//!
//! The host calls [`FrameScheduler::tick`] once per rendered frame. Scheduling
//! while a pass is pending replaces it, so a burst of edits between two frames
//! runs a single pass.

/// Handle of a scheduled pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleToken(pub u64);

/// Holds at most one pending value until the next frame
#[derive(Debug)]
pub struct FrameScheduler<T> {
    pending: Option<(ScheduleToken, T)>,
    next: u64,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self {
            pending: None,
            next: 1,
        }
    }
}

impl<T> FrameScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `value` for the next frame, dropping any pending one
    pub fn schedule(&mut self, value: T) -> ScheduleToken {
        let token = ScheduleToken(self.next);
        self.next += 1;
        if self.pending.replace((token, value)).is_some() {
            log::trace!("pending pass superseded by {:?}", token);
        }
        token
    }

    /// Cancel the pending value if `token` still refers to it
    pub fn cancel(&mut self, token: ScheduleToken) -> bool {
        match self.pending {
            Some((pending, _)) if pending == token => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Frame callback: hand out the pending value
    pub fn tick(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_value_wins() {
        let mut scheduler = FrameScheduler::new();
        scheduler.schedule(1);
        scheduler.schedule(2);
        assert!(scheduler.is_pending());
        assert_eq!(scheduler.tick(), Some(2));
        assert_eq!(scheduler.tick(), None);
    }

    #[test]
    fn test_cancel_only_current_token() {
        let mut scheduler = FrameScheduler::new();
        let stale = scheduler.schedule("a");
        let current = scheduler.schedule("b");
        assert!(!scheduler.cancel(stale));
        assert!(scheduler.cancel(current));
        assert!(!scheduler.is_pending());
    }
}
