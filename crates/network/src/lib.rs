//! Event-driven bottleneck simulator.
//!
//! Models a dumbbell network: a gang of on/off senders feeding one
//! bottleneck link, a fixed propagation delay, and a receiver that hands
//! acknowledgements straight back to the senders.
//!
//! ```text
//!   SenderGang ──► Link (1/rate serialisation, FIFO buffer) ──► Delay ──► Receiver
//!       ▲                                                                  │
//!       └──────────────────────── acknowledgements ◄──────────────────────┘
//! ```
//!
//! Time is continuous (milliseconds) and the simulation is event driven:
//! each step jumps to the earliest pending event. Given the same seed and
//! configuration, a [`Network`] produces identical results every run.
//!
//! Senders are pluggable through the [`Sender`] trait. [`Rat`] is the sender
//! driven by a [`WhiskerTree`](whisker_types::WhiskerTree).

mod delay;
mod gang;
mod link;
mod network;
mod packet;
mod rat;
mod receiver;
mod sender;
mod switched;
mod utility;

pub use delay::Delay;
pub use gang::SenderGang;
pub use link::Link;
pub use network::Network;
pub use packet::{Packet, SenderId, FILLER_SOURCE};
pub use rat::{InitialState, Rat};
pub use receiver::Receiver;
pub use sender::{NextHop, Sender};
pub use switched::SwitchedSender;
pub use utility::{SenderMeasurement, Utility};
