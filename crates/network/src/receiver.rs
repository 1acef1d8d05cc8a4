use crate::{NextHop, Packet, SenderId};

/// Delivery point at the far end of the path.
///
/// Holds delivered packets per sender until that sender collects them as
/// acknowledgements.
#[derive(Debug, Clone)]
pub struct Receiver {
    collector: Vec<Vec<Packet>>,
}

impl Receiver {
    pub fn new(num_senders: u32) -> Self {
        Self {
            collector: vec![Vec::new(); num_senders as usize],
        }
    }

    /// Whether `src` has packets waiting.
    pub fn readable(&self, src: SenderId) -> bool {
        self.collector
            .get(src as usize)
            .is_some_and(|packets| !packets.is_empty())
    }

    /// Remove and return every packet waiting for `src`, in arrival order.
    pub fn take(&mut self, src: SenderId) -> Vec<Packet> {
        self.collector
            .get_mut(src as usize)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn next_event_time(&self, tickno: f64) -> f64 {
        if self.collector.iter().any(|packets| !packets.is_empty()) {
            tickno
        } else {
            f64::INFINITY
        }
    }
}

impl NextHop for Receiver {
    fn accept(&mut self, mut packet: Packet, tickno: f64) {
        if packet.is_filler() {
            return;
        }
        if let Some(packets) = self.collector.get_mut(packet.src as usize) {
            packet.tick_received = tickno;
            packets.push(packet);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamps_and_routes_by_source() {
        let mut receiver = Receiver::new(2);
        assert_eq!(receiver.next_event_time(3.0), f64::INFINITY);

        receiver.accept(Packet::new(1, 1, 0.0, 0), 42.0);
        receiver.accept(Packet::filler(7), 42.0);

        assert!(!receiver.readable(0));
        assert!(receiver.readable(1));
        assert_eq!(receiver.next_event_time(42.0), 42.0);

        let packets = receiver.take(1);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].tick_received, 42.0);
        assert!(!receiver.readable(1));
        assert_eq!(receiver.next_event_time(42.0), f64::INFINITY);
    }

    #[test]
    fn test_unknown_source_is_dropped() {
        let mut receiver = Receiver::new(1);
        receiver.accept(Packet::new(5, 1, 0.0, 0), 1.0);
        assert_eq!(receiver.next_event_time(1.0), f64::INFINITY);
        assert!(receiver.take(5).is_empty());
    }
}
