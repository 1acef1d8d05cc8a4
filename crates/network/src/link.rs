use crate::{Delay, NextHop, Packet};
use std::collections::VecDeque;

/// Bottleneck link: serialises one packet every `1 / rate` milliseconds.
///
/// Packets that arrive while another is being serialised wait in an
/// unbounded FIFO buffer.
#[derive(Debug, Clone)]
pub struct Link {
    buffer: VecDeque<Packet>,
    pending: Delay,
}

impl Link {
    /// `rate` is in packets per millisecond.
    pub fn new(rate: f64) -> Self {
        Self {
            buffer: VecDeque::new(),
            pending: Delay::new(1.0 / rate),
        }
    }

    /// Pre-fill the buffer with `packets` filler packets.
    pub fn with_start_buffer(mut self, packets: u32) -> Self {
        self.buffer
            .extend((0..u64::from(packets)).map(Packet::filler));
        self
    }

    pub fn tick<N: NextHop>(&mut self, next: &mut N, tickno: f64) {
        self.pending.tick(next, tickno);
        if self.pending.is_empty() {
            if let Some(packet) = self.buffer.pop_front() {
                self.pending.accept(packet, tickno);
            }
        }
    }

    pub fn next_event_time(&self, tickno: f64) -> f64 {
        if self.pending.is_empty() && !self.buffer.is_empty() {
            tickno
        } else {
            self.pending.next_event_time()
        }
    }

    /// Packets held by the link, including the one being serialised.
    pub fn occupancy(&self) -> usize {
        self.buffer.len() + self.pending.len()
    }
}

impl NextHop for Link {
    fn accept(&mut self, packet: Packet, tickno: f64) {
        if self.pending.is_empty() {
            self.pending.accept(packet, tickno);
        } else {
            self.buffer.push_back(packet);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialises_at_link_rate() {
        let mut link = Link::new(0.5);
        let mut out: Vec<(f64, Packet)> = Vec::new();
        for seq in 0..3 {
            link.accept(Packet::new(0, 1, 0.0, seq), 0.0);
        }
        assert_eq!(link.occupancy(), 3);

        let mut now = 0.0;
        while out.len() < 3 {
            now = link.next_event_time(now);
            link.tick(&mut out, now);
        }

        let times: Vec<f64> = out.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![2.0, 4.0, 6.0]);
        assert_eq!(link.occupancy(), 0);
    }

    #[test]
    fn test_start_buffer_drains_first() {
        let mut link = Link::new(1.0).with_start_buffer(2);
        assert_eq!(link.occupancy(), 2);
        assert_eq!(link.next_event_time(0.0), 0.0);

        link.accept(Packet::new(0, 1, 0.0, 0), 0.0);
        let mut out: Vec<(f64, Packet)> = Vec::new();
        let mut now = 0.0;
        while out.len() < 3 {
            now = link.next_event_time(now);
            link.tick(&mut out, now);
        }

        assert!(out[0].1.is_filler());
        assert!(out[1].1.is_filler());
        assert_eq!(out[2].1.src, 0);
    }
}
