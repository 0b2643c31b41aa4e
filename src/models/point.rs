//! Visitable stops.

use std::fmt;

use super::{RequestId, TimeWindow};
use crate::graph::NodeId;

/// What happens at a [`Point`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind {
    /// Start and end of every tour.
    Depot,
    /// Loading of a request.
    Pickup(RequestId),
    /// Unloading of a request.
    Delivery(RequestId),
}

/// A stop of a tour: a kind, a graph node and a service time window.
///
/// Renders as `Depot:<node>`, `S<id>:<node>` or `D<id>:<node>`.
///
/// # Examples
///
/// ```
/// use optload::models::{Point, TimeWindow};
///
/// let tw = TimeWindow::new(0.0, 100.0).unwrap();
/// let p = Point::pickup(3, 17, tw);
/// assert_eq!(p.request(), Some(3));
/// assert_eq!(p.to_string(), "S3:17");
/// assert_eq!(Point::depot(0, tw).to_string(), "Depot:0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    kind: PointKind,
    node: NodeId,
    window: TimeWindow,
}

impl Point {
    /// Creates a depot point.
    pub fn depot(node: NodeId, window: TimeWindow) -> Self {
        Self {
            kind: PointKind::Depot,
            node,
            window,
        }
    }

    /// Creates the pickup point of a request.
    pub fn pickup(request: RequestId, node: NodeId, window: TimeWindow) -> Self {
        Self {
            kind: PointKind::Pickup(request),
            node,
            window,
        }
    }

    /// Creates the delivery point of a request.
    pub fn delivery(request: RequestId, node: NodeId, window: TimeWindow) -> Self {
        Self {
            kind: PointKind::Delivery(request),
            node,
            window,
        }
    }

    pub fn kind(&self) -> PointKind {
        self.kind
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Owning request, `None` for the depot.
    pub fn request(&self) -> Option<RequestId> {
        match self.kind {
            PointKind::Depot => None,
            PointKind::Pickup(r) | PointKind::Delivery(r) => Some(r),
        }
    }

    pub fn is_depot(&self) -> bool {
        matches!(self.kind, PointKind::Depot)
    }

    pub fn is_pickup(&self) -> bool {
        matches!(self.kind, PointKind::Pickup(_))
    }

    pub fn is_delivery(&self) -> bool {
        matches!(self.kind, PointKind::Delivery(_))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PointKind::Depot => write!(f, "Depot:{}", self.node),
            PointKind::Pickup(r) => write!(f, "S{}:{}", r, self.node),
            PointKind::Delivery(r) => write!(f, "D{}:{}", r, self.node),
        }
    }
}
