//! Directed, time-dependent edges.

use super::NodeId;

/// Arrival-time function of an edge: maps a departure time at the tail to the
/// arrival time at the head.
///
/// Every variant must be FIFO: departing later never arrives earlier. The
/// router relies on this when it propagates time along the best-distance
/// predecessor instead of searching for the earliest arrival.
///
/// # Examples
///
/// ```
/// use optload::graph::ArrivalFn;
///
/// assert_eq!(ArrivalFn::Instant.arrival(10.0), 10.0);
/// assert_eq!(ArrivalFn::Constant(4.0).arrival(10.0), 14.0);
///
/// // 5 minutes before 60, 15 minutes from 120 on (rush hour).
/// let f = ArrivalFn::piecewise(vec![(60.0, 5.0), (120.0, 15.0)]);
/// assert_eq!(f.arrival(0.0), 5.0);
/// assert_eq!(f.arrival(90.0), 100.0);
/// assert_eq!(f.arrival(200.0), 215.0);
/// assert!(f.is_fifo());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ArrivalFn {
    /// Traversal takes no time.
    Instant,
    /// Traversal takes a fixed duration.
    Constant(f64),
    /// Travel duration interpolated linearly between `(departure, duration)`
    /// breakpoints sorted by departure, clamped outside the first and last.
    Piecewise(Vec<(f64, f64)>),
}

impl ArrivalFn {
    /// Builds a piecewise profile, sorting the breakpoints by departure time.
    pub fn piecewise(mut breakpoints: Vec<(f64, f64)>) -> Self {
        breakpoints.sort_by(|a, b| a.0.total_cmp(&b.0));
        ArrivalFn::Piecewise(breakpoints)
    }

    /// Travel duration when departing at `departure`.
    pub fn duration(&self, departure: f64) -> f64 {
        match self {
            ArrivalFn::Instant => 0.0,
            ArrivalFn::Constant(d) => *d,
            ArrivalFn::Piecewise(points) => {
                let (Some(first), Some(last)) = (points.first(), points.last()) else {
                    return 0.0;
                };
                if departure <= first.0 {
                    return first.1;
                }
                if departure >= last.0 {
                    return last.1;
                }
                for w in points.windows(2) {
                    let (t0, d0) = w[0];
                    let (t1, d1) = w[1];
                    if departure <= t1 {
                        if t1 <= t0 {
                            return d1;
                        }
                        let alpha = (departure - t0) / (t1 - t0);
                        return d0 + alpha * (d1 - d0);
                    }
                }
                last.1
            }
        }
    }

    /// Arrival time when departing at `departure`.
    pub fn arrival(&self, departure: f64) -> f64 {
        departure + self.duration(departure)
    }

    /// Returns `true` if durations are finite and non-negative and arrival
    /// is non-decreasing in departure time.
    pub fn is_fifo(&self) -> bool {
        match self {
            ArrivalFn::Instant => true,
            ArrivalFn::Constant(d) => d.is_finite() && *d >= 0.0,
            ArrivalFn::Piecewise(points) => {
                if points
                    .iter()
                    .any(|&(t, d)| !t.is_finite() || !d.is_finite() || d < 0.0)
                {
                    return false;
                }
                points.windows(2).all(|w| {
                    let (t0, d0) = w[0];
                    let (t1, d1) = w[1];
                    // A later breakpoint may shorten travel by at most the
                    // time that passed in between.
                    t1 > t0 && d1 - d0 >= -(t1 - t0)
                })
            }
        }
    }
}

/// A directed edge with a static distance and a time-dependent arrival
/// function.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    from: NodeId,
    to: NodeId,
    distance: f64,
    arrival: ArrivalFn,
}

impl Edge {
    /// Creates a new edge. Validation happens in
    /// [`GraphBuilder::add_edge`](super::GraphBuilder::add_edge).
    pub fn new(from: NodeId, to: NodeId, distance: f64, arrival: ArrivalFn) -> Self {
        Self {
            from,
            to,
            distance,
            arrival,
        }
    }

    /// Tail node.
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// Head node.
    pub fn to(&self) -> NodeId {
        self.to
    }

    /// Static travel distance.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// The arrival function.
    pub fn arrival_fn(&self) -> &ArrivalFn {
        &self.arrival
    }

    /// Arrival time at the head when departing the tail at `departure`.
    pub fn arrival(&self, departure: f64) -> f64 {
        self.arrival.arrival(departure)
    }
}
