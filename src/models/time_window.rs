//! Service time windows.

/// An inclusive `[start, end]` window for the start of service at a stop.
///
/// Arriving early is allowed; service then starts at `start`.
///
/// # Examples
///
/// ```
/// use optload::models::TimeWindow;
///
/// let tw = TimeWindow::new(100.0, 200.0).unwrap();
/// assert!(tw.start() <= tw.end());
/// assert!(tw.contains(150.0));
/// assert!(!tw.contains(250.0));
/// assert_eq!(tw.service_start(40.0), 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// Returns `None` if `start > end` or either value is non-finite.
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if !start.is_finite() || !end.is_finite() || start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// Earliest service start.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Latest service start.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Centre of the window.
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.start + self.end)
    }

    /// Whether service may start at `time`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Idle time between `arrival` and the earliest service start.
    ///
    /// A vehicle that is already past `start` does not wait, even if it is
    /// too late to be served.
    pub fn waiting_time(&self, arrival: f64) -> f64 {
        (self.start - arrival).max(0.0)
    }

    /// Whether service starting at `arrival` misses the window. Early
    /// arrivals never violate it, they wait.
    pub fn is_violated(&self, arrival: f64) -> bool {
        arrival > self.end
    }

    /// Time at which service starts when arriving at `arrival`.
    pub fn service_start(&self, arrival: f64) -> f64 {
        arrival.max(self.start)
    }
}
