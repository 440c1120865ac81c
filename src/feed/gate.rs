/// Page-boundary pacing.
///
/// When the loaded count lands on a multiple of the page size that was not
/// reached before, the visible count is held at the previous boundary until
/// a timer fires. At most one timer runs; a boundary reached while gated is
/// queued (latest wins) and gated in turn once the running timer expires.
/// Nothing is dropped, only delayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateState {
    page_size: usize,
    active: bool,
    /// Count the user is allowed to see while gated.
    last_boundary: usize,
    /// Boundary the running timer is holding back.
    current: Option<usize>,
    /// Boundary reached while the timer was running.
    pending: Option<usize>,
}

/// What the owner must do with the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    /// Nothing changed.
    Unchanged,
    /// Start the timer.
    Started,
    /// The gate opened; drop the timer.
    Released,
    /// A queued boundary took over; start the timer again.
    Restarted,
}

impl GateState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            active: false,
            last_boundary: 0,
            current: None,
            pending: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_boundary(&self) -> usize {
        self.last_boundary
    }

    /// Feed the latest accumulated item count.
    pub fn observe_count(&mut self, count: usize) -> GateTransition {
        if count == 0 || count % self.page_size != 0 || count <= self.highest_boundary() {
            return GateTransition::Unchanged;
        }

        if self.active {
            self.pending = Some(count);
            return GateTransition::Unchanged;
        }

        self.active = true;
        self.current = Some(count);
        GateTransition::Started
    }

    /// The timer fired.
    pub fn expire(&mut self) -> GateTransition {
        if !self.active {
            return GateTransition::Unchanged;
        }

        if let Some(boundary) = self.current.take() {
            self.last_boundary = boundary;
        }

        match self.pending.take() {
            Some(next) => {
                self.current = Some(next);
                GateTransition::Restarted
            }
            None => {
                self.active = false;
                GateTransition::Released
            }
        }
    }

    pub fn visible_count(&self, total: usize) -> usize {
        if self.active {
            self.last_boundary.min(total)
        } else {
            total
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }

    fn highest_boundary(&self) -> usize {
        self.pending
            .or(self.current)
            .unwrap_or(0)
            .max(self.last_boundary)
    }
}
