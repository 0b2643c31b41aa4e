//! Load compartment simulation and loading/unloading cost.
//!
//! A single compartment is loaded from the back, so freight comes out in
//! reverse loading order. A stop sequence is realisable without moving
//! freight out of the way exactly when the pickup/delivery intervals of any
//! two requests are nested or disjoint.

use crate::models::{Point, PointKind, RequestId};

/// LU cost of loading `quantity`.
pub fn pickup_lu(quantity: i32) -> i64 {
    i64::from(quantity)
}

/// LU cost of unloading `quantity` while `load_after` units stay on board.
///
/// The second term charges rehandling of the freight still in the vehicle.
pub fn delivery_lu(quantity: i32, load_after: i64) -> i64 {
    i64::from(quantity) + 2 * load_after.max(0)
}

/// Freight on board in loading order; the last entry is the most accessible.
///
/// # Examples
///
/// ```
/// use optload::evaluation::LoadStack;
///
/// let mut stack = LoadStack::new();
/// stack.push(1, 4);
/// stack.push(2, 3);
/// assert_eq!(stack.load(), 7);
/// assert!(stack.can_deliver(2));
/// assert!(!stack.can_deliver(1));
/// assert_eq!(stack.items_above(1), Some(1));
/// assert_eq!(stack.remove(1), Some((1, 4)));
/// assert_eq!(stack.load(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStack {
    items: Vec<(RequestId, i32)>,
}

impl LoadStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a request on top.
    pub fn push(&mut self, request: RequestId, quantity: i32) {
        self.items.push((request, quantity));
    }

    /// The most recently loaded request.
    pub fn top(&self) -> Option<RequestId> {
        self.items.last().map(|&(r, _)| r)
    }

    /// Returns `true` if `request` can be unloaded without rehandling.
    pub fn can_deliver(&self, request: RequestId) -> bool {
        self.top() == Some(request)
    }

    /// Unloads the top request.
    pub fn pop(&mut self) -> Option<(RequestId, i32)> {
        self.items.pop()
    }

    /// Number of requests loaded after `request`, `None` if not on board.
    pub fn items_above(&self, request: RequestId) -> Option<usize> {
        self.position(request).map(|i| self.items.len() - 1 - i)
    }

    /// Unloads `request` wherever it sits, keeping the order of the rest.
    ///
    /// Returns the number of items that were above it and its quantity.
    pub fn remove(&mut self, request: RequestId) -> Option<(usize, i32)> {
        let index = self.position(request)?;
        let above = self.items.len() - 1 - index;
        let (_, quantity) = self.items.remove(index);
        Some((above, quantity))
    }

    pub fn contains(&self, request: RequestId) -> bool {
        self.position(request).is_some()
    }

    /// Total quantity on board.
    pub fn load(&self) -> i64 {
        self.items.iter().map(|&(_, q)| i64::from(q)).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Requests on board, bottom first.
    pub fn requests(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.items.iter().map(|&(r, _)| r)
    }

    fn position(&self, request: RequestId) -> Option<usize> {
        self.items.iter().rposition(|&(r, _)| r == request)
    }
}

/// Finds the first pair of requests whose pickup/delivery intervals cross.
///
/// Returns `(delivered, blocking)`: the request being delivered and the one
/// loaded after it that is still on board. Requests never delivered are
/// treated as unloaded after the last stop, in reverse loading order, which
/// never crosses. Deliveries without a preceding pickup are ignored here.
///
/// ```
/// use optload::evaluation::find_crossing;
/// use optload::models::{Point, TimeWindow};
///
/// let tw = TimeWindow::new(0.0, 10.0).unwrap();
/// let nested = [
///     Point::pickup(1, 1, tw),
///     Point::pickup(2, 2, tw),
///     Point::delivery(2, 3, tw),
///     Point::delivery(1, 4, tw),
/// ];
/// assert_eq!(find_crossing(&nested), None);
///
/// let crossing = [
///     Point::pickup(1, 1, tw),
///     Point::pickup(2, 2, tw),
///     Point::delivery(1, 4, tw),
///     Point::delivery(2, 3, tw),
/// ];
/// assert_eq!(find_crossing(&crossing), Some((1, 2)));
/// ```
pub fn find_crossing(stops: &[Point]) -> Option<(RequestId, RequestId)> {
    let mut stack = LoadStack::new();
    for stop in stops {
        match stop.kind() {
            PointKind::Depot => {}
            PointKind::Pickup(r) => stack.push(r, 0),
            PointKind::Delivery(r) => {
                if !stack.contains(r) {
                    continue;
                }
                if let Some(top) = stack.top().filter(|&t| t != r) {
                    return Some((r, top));
                }
                stack.pop();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeWindow;

    fn tw() -> TimeWindow {
        TimeWindow::new(0.0, 10.0).expect("valid")
    }

    #[test]
    fn test_lu_costs() {
        assert_eq!(pickup_lu(5), 5);
        assert_eq!(delivery_lu(5, 0), 5);
        assert_eq!(delivery_lu(2, 3), 8);
    }

    #[test]
    fn test_stack_order() {
        let mut s = LoadStack::new();
        assert!(s.is_empty());
        s.push(1, 2);
        s.push(2, 1);
        s.push(3, 5);
        assert_eq!(s.len(), 3);
        assert_eq!(s.top(), Some(3));
        assert_eq!(s.items_above(1), Some(2));
        assert_eq!(s.items_above(3), Some(0));
        assert_eq!(s.items_above(9), None);
        assert_eq!(s.pop(), Some((3, 5)));
        assert_eq!(s.requests().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_load_of_huge_items() {
        let mut s = LoadStack::new();
        s.push(1, i32::MAX);
        s.push(2, i32::MAX);
        assert_eq!(s.load(), 2 * i64::from(i32::MAX));
        assert_eq!(delivery_lu(1, s.load()), 1 + 4 * i64::from(i32::MAX));
    }

    #[test]
    fn test_remove_middle() {
        let mut s = LoadStack::new();
        s.push(1, 2);
        s.push(2, 1);
        s.push(3, 5);
        assert_eq!(s.remove(2), Some((1, 1)));
        assert_eq!(s.requests().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(s.load(), 7);
        assert_eq!(s.remove(2), None);
    }

    #[test]
    fn test_disjoint_intervals() {
        let stops = [
            Point::pickup(1, 1, tw()),
            Point::delivery(1, 2, tw()),
            Point::pickup(2, 3, tw()),
            Point::delivery(2, 4, tw()),
        ];
        assert_eq!(find_crossing(&stops), None);
    }

    #[test]
    fn test_open_intervals_at_end() {
        // 2 is never delivered: it blocks 1 at the end of the route.
        let stops = [
            Point::pickup(1, 1, tw()),
            Point::pickup(2, 2, tw()),
            Point::delivery(1, 3, tw()),
        ];
        assert_eq!(find_crossing(&stops), Some((1, 2)));

        // 1 is never delivered and lies beneath 2: fine.
        let stops = [
            Point::pickup(1, 1, tw()),
            Point::pickup(2, 2, tw()),
            Point::delivery(2, 3, tw()),
        ];
        assert_eq!(find_crossing(&stops), None);
    }
}
