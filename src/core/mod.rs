//! Core types describing particles, contacts, and the boundary topology.

pub mod boundary;
pub mod types;

pub use boundary::{BoundaryMode, Transport, TransportFn, TRANSPORT_TABLE};
pub use types::{CollisionRecord, ModelKind, Particle, StatsMap};
