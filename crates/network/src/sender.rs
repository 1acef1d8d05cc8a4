//! Seams between simulator components.

use crate::{Packet, SenderId};

/// Anything a packet can be handed to: a link, a delay line, a receiver.
pub trait NextHop {
    fn accept(&mut self, packet: Packet, tickno: f64);
}

/// A congestion-control policy under test.
///
/// The simulator drives a sender through these calls only, so any policy
/// that can react to acknowledgements and decide when to transmit can be
/// plugged into a [`Network`](crate::Network).
pub trait Sender {
    /// Start a new flow at `tickno`, discarding per-flow state.
    fn reset(&mut self, tickno: f64);

    /// Feed acknowledgements. Packets from earlier flows must be ignored.
    fn packets_received(&mut self, packets: &[Packet]);

    /// Transmit at most one packet into `next` if the policy allows it now.
    /// Returns whether a packet was sent.
    fn send<N: NextHop>(&mut self, id: SenderId, next: &mut N, tickno: f64) -> bool;

    /// Earliest time at which [`send`](Self::send) could transmit, or
    /// `f64::INFINITY` if the sender is waiting for acknowledgements.
    fn next_event_time(&self, tickno: f64) -> f64;

    /// Continuous state vector, free of absolute timestamps.
    fn state(&self) -> Vec<f64>;
}
