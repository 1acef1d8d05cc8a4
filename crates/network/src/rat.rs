//! The whisker-driven sender.

use crate::{NextHop, Packet, Sender, SenderId};
use std::sync::Arc;
use tracing::{debug, trace};
use whisker_types::{Memory, UsageTally, Whisker, WhiskerTree};

/// EWMA weight given to each new acknowledgement.
const ALPHA: f64 = 1.0 / 8.0;

/// Memory a [`Rat`] starts every flow from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialState {
    /// Starting RTT ratio.
    pub imputed_delay: f64,
    /// Starting receive-gap EWMA.
    pub rewma: f64,
}

impl InitialState {
    fn memory(&self) -> Memory {
        Memory::new(0.0, self.rewma, self.imputed_delay)
    }
}

/// Folds acknowledgement timing into a [`Memory`].
#[derive(Debug, Clone, Default)]
struct MemoryTracker {
    memory: Memory,
    last_tick_sent: f64,
    last_tick_received: f64,
    min_rtt: f64,
    seen_ack: bool,
}

impl MemoryTracker {
    fn new(memory: Memory) -> Self {
        Self {
            memory,
            ..Self::default()
        }
    }

    fn packets_received(&mut self, packets: &[Packet], flow_id: u32) {
        for packet in packets.iter().filter(|p| p.flow_id == flow_id) {
            let rtt = packet.tick_received - packet.tick_sent;
            if self.seen_ack {
                let m = &mut self.memory;
                m.rec_send_ewma =
                    (1.0 - ALPHA) * m.rec_send_ewma + ALPHA * (packet.tick_sent - self.last_tick_sent);
                m.rec_rec_ewma = (1.0 - ALPHA) * m.rec_rec_ewma
                    + ALPHA * (packet.tick_received - self.last_tick_received);
                self.min_rtt = self.min_rtt.min(rtt);
                if self.min_rtt > 0.0 {
                    m.rtt_ratio = rtt / self.min_rtt;
                }
            } else {
                self.min_rtt = rtt;
                self.seen_ack = true;
            }
            self.last_tick_sent = packet.tick_sent;
            self.last_tick_received = packet.tick_received;
        }
    }
}

/// Sender whose window and pacing come from a [`WhiskerTree`].
///
/// After every batch of acknowledgements, and at the start of every flow, the
/// sender looks up the whisker covering its current [`Memory`] and applies
/// that whisker's action. Lookups are tallied in a private [`UsageTally`]
/// so the tree itself can be shared read-only between simulations.
#[derive(Debug, Clone)]
pub struct Rat {
    whiskers: Arc<WhiskerTree>,
    usage: UsageTally,
    trace: bool,
    initial_memory: Memory,
    tracker: MemoryTracker,
    packets_sent: u64,
    packets_acked: u64,
    window: u32,
    intersend_time: f64,
    last_send_time: f64,
    flow_id: u32,
}

impl Rat {
    pub fn new(whiskers: Arc<WhiskerTree>, trace: bool) -> Self {
        let usage = whiskers.new_tally();
        Self {
            whiskers,
            usage,
            trace,
            initial_memory: Memory::default(),
            tracker: MemoryTracker::default(),
            packets_sent: 0,
            packets_acked: 0,
            window: 0,
            intersend_time: 0.0,
            last_send_time: 0.0,
            flow_id: 0,
        }
    }

    /// Memory to restore at the start of every flow, effective immediately.
    pub fn set_initial_state(&mut self, state: InitialState) {
        self.initial_memory = state.memory();
        self.tracker = MemoryTracker::new(self.initial_memory);
    }

    pub fn memory(&self) -> &Memory {
        &self.tracker.memory
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    /// Whisker usage gathered so far.
    pub fn usage(&self) -> &UsageTally {
        &self.usage
    }

    fn in_flight(&self) -> u64 {
        self.packets_sent.saturating_sub(self.packets_acked)
    }

    fn window_open(&self) -> bool {
        self.in_flight() < u64::from(self.window)
    }

    fn apply_whisker(&mut self) {
        let memory = self.tracker.memory;
        let Some(id) = self.whiskers.lookup(&memory) else {
            trace!(%memory, "No whisker covers memory, keeping current action");
            return;
        };
        let Some(whisker) = self.whiskers.whisker(id).cloned() else {
            return;
        };
        self.usage.record(id);
        self.act(&whisker);
        if self.trace {
            debug!(
                whisker = id.0,
                %memory,
                window = self.window,
                intersend = self.intersend_time,
                "Whisker lookup"
            );
        }
    }

    fn act(&mut self, whisker: &Whisker) {
        self.window = whisker.window(self.window);
        self.intersend_time = whisker.intersend();
    }
}

impl Sender for Rat {
    fn reset(&mut self, _tickno: f64) {
        self.tracker = MemoryTracker::new(self.initial_memory);
        self.last_send_time = 0.0;
        self.window = 0;
        self.intersend_time = 0.0;
        self.flow_id += 1;
        // Everything from the previous flow counts as delivered.
        self.packets_acked = self.packets_sent;
        self.apply_whisker();
    }

    fn packets_received(&mut self, packets: &[Packet]) {
        let Some(last) = packets.last() else {
            return;
        };
        self.packets_acked = self.packets_acked.max(last.seq_num + 1);
        self.tracker.packets_received(packets, self.flow_id);
        self.apply_whisker();
    }

    fn send<N: NextHop>(&mut self, id: SenderId, next: &mut N, tickno: f64) -> bool {
        if !self.window_open() || self.last_send_time + self.intersend_time > tickno {
            return false;
        }
        let packet = Packet::new(id, self.flow_id, tickno, self.packets_sent);
        self.packets_sent += 1;
        next.accept(packet, tickno);
        self.last_send_time = tickno;
        true
    }

    fn next_event_time(&self, tickno: f64) -> f64 {
        if !self.window_open() {
            return f64::INFINITY;
        }
        let due = self.last_send_time + self.intersend_time;
        if due <= tickno {
            tickno
        } else {
            due
        }
    }

    fn state(&self) -> Vec<f64> {
        let memory = self.tracker.memory;
        vec![
            memory.rec_send_ewma,
            memory.rec_rec_ewma,
            memory.rtt_ratio,
            f64::from(self.window),
            self.in_flight() as f64,
        ]
    }
}
