//! Per-sender throughput and delay accounting.

use crate::Packet;

/// Reference delay in milliseconds. A sender with this average delay pays no
/// delay penalty.
const DELAY_REFERENCE_MS: f64 = 100.0;

/// Throughput and delay one sender achieved over a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SenderMeasurement {
    /// Packets received per millisecond of (shared) sending time.
    pub throughput: f64,
    /// Mean one-way delay of received packets, in milliseconds.
    pub delay: f64,
}

/// Running totals from which a sender's utility is computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Utility {
    /// Sending time, each interval divided by the number of senders active
    /// during it.
    tick_share_sending: f64,
    packets_received: u64,
    total_delay: f64,
}

impl Utility {
    pub fn sending_duration(&mut self, duration: f64, num_sending: u32) {
        if num_sending > 0 {
            self.tick_share_sending += duration / f64::from(num_sending);
        }
    }

    pub fn packets_received(&mut self, packets: &[Packet]) {
        for packet in packets {
            self.packets_received += 1;
            self.total_delay += packet.tick_received - packet.tick_sent;
        }
    }

    pub fn average_throughput(&self) -> f64 {
        if self.tick_share_sending > 0.0 {
            self.packets_received as f64 / self.tick_share_sending
        } else {
            0.0
        }
    }

    pub fn average_delay(&self) -> f64 {
        if self.packets_received > 0 {
            self.total_delay / self.packets_received as f64
        } else {
            0.0
        }
    }

    /// `log2(throughput) - log2(delay / 100)`.
    ///
    /// Zero for a sender that never switched on. A sender that was on but
    /// received nothing scores `-i32::MAX`.
    pub fn utility(&self) -> f64 {
        if self.tick_share_sending == 0.0 {
            return 0.0;
        }
        if self.packets_received == 0 {
            return -f64::from(i32::MAX);
        }
        self.average_throughput().log2() - (self.average_delay() / DELAY_REFERENCE_MS).log2()
    }

    pub fn measurement(&self) -> SenderMeasurement {
        SenderMeasurement {
            throughput: self.average_throughput(),
            delay: self.average_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivered(sent: f64, received: f64) -> Packet {
        let mut packet = Packet::new(0, 1, sent, 0);
        packet.tick_received = received;
        packet
    }

    #[test]
    fn test_idle_and_starved_senders() {
        let mut utility = Utility::default();
        assert_eq!(utility.utility(), 0.0);

        utility.sending_duration(100.0, 1);
        assert_eq!(utility.utility(), -f64::from(i32::MAX));
    }

    #[test]
    fn test_utility_formula() {
        let mut utility = Utility::default();
        utility.sending_duration(400.0, 2);
        utility.packets_received(&[delivered(0.0, 200.0), delivered(10.0, 210.0)]);

        let m = utility.measurement();
        assert_eq!(m.throughput, 0.01);
        assert_eq!(m.delay, 200.0);
        // log2(0.01) - log2(2)
        let expected = 0.01f64.log2() - 1.0;
        assert!((utility.utility() - expected).abs() < 1e-12);
    }
}
