/// Index of a sender within its gang.
pub type SenderId = u32;

/// Source id of packets used to pre-fill the bottleneck buffer.
/// The receiver discards them.
pub const FILLER_SOURCE: SenderId = SenderId::MAX;

/// A data packet, doubling as its own acknowledgement once received.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packet {
    pub src: SenderId,
    /// Distinguishes successive flows of the same sender.
    pub flow_id: u32,
    pub tick_sent: f64,
    /// Set by the receiver on delivery.
    pub tick_received: f64,
    pub seq_num: u64,
}

impl Packet {
    pub fn new(src: SenderId, flow_id: u32, tick_sent: f64, seq_num: u64) -> Self {
        Self {
            src,
            flow_id,
            tick_sent,
            tick_received: tick_sent,
            seq_num,
        }
    }

    pub fn filler(seq_num: u64) -> Self {
        Self::new(FILLER_SOURCE, 0, 0.0, seq_num)
    }

    pub fn is_filler(&self) -> bool {
        self.src == FILLER_SOURCE
    }
}
