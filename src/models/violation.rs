//! Feasibility violation types.

use std::fmt;

use super::RequestId;
use crate::graph::NodeId;

/// A type of constraint violation in a stop sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationType {
    /// The sequence does not start or end at the depot.
    NotAnchoredAtDepot,
    /// No path between two consecutive stops.
    Unreachable {
        from: NodeId,
        to: NodeId,
    },
    /// Service would start after the stop's window closes.
    TimeWindowViolated {
        /// Service start after waiting.
        time: f64,
        /// Window end.
        end: f64,
    },
    /// Service would start after the query horizon ends.
    HorizonExceeded {
        time: f64,
        end: f64,
    },
    /// Load after a pickup exceeds the vehicle capacity.
    CapacityExceeded {
        load: i64,
        capacity: i32,
    },
    /// Load dropped below zero.
    NegativeLoad {
        load: i32,
    },
    /// Delivery of a request that is not on board.
    PrecedenceViolated {
        request: RequestId,
    },
    /// Delivery of `request` while `blocking`, loaded after it, is still on
    /// board: their pickup/delivery intervals cross.
    CrossingIntervals {
        request: RequestId,
        blocking: RequestId,
    },
    /// A pickup or delivery visited twice.
    DuplicateVisit {
        request: RequestId,
    },
    /// A stop references a request the query does not contain.
    UnknownRequest {
        request: RequestId,
    },
}

/// A constraint violation at a position of a stop sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Index of the offending stop.
    pub position: usize,
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(position: usize, kind: ViolationType) -> Self {
        Self { position, kind }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stop {}: ", self.position)?;
        match &self.kind {
            ViolationType::NotAnchoredAtDepot => write!(f, "route not anchored at depot"),
            ViolationType::Unreachable { from, to } => write!(f, "node {to} unreachable from {from}"),
            ViolationType::TimeWindowViolated { time, end } => {
                write!(f, "service at {time} after window end {end}")
            }
            ViolationType::HorizonExceeded { time, end } => {
                write!(f, "service at {time} after horizon end {end}")
            }
            ViolationType::CapacityExceeded { load, capacity } => {
                write!(f, "load {load} exceeds capacity {capacity}")
            }
            ViolationType::NegativeLoad { load } => write!(f, "negative load {load}"),
            ViolationType::PrecedenceViolated { request } => {
                write!(f, "request {request} delivered before pickup")
            }
            ViolationType::CrossingIntervals { request, blocking } => {
                write!(f, "request {request} blocked by request {blocking}")
            }
            ViolationType::DuplicateVisit { request } => write!(f, "request {request} visited twice"),
            ViolationType::UnknownRequest { request } => write!(f, "unknown request {request}"),
        }
    }
}
