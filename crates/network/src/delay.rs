use crate::{NextHop, Packet};
use std::collections::VecDeque;

/// Fixed-latency delay line.
///
/// Packets leave in arrival order, `delay` milliseconds after they entered.
#[derive(Debug, Clone)]
pub struct Delay {
    delay: f64,
    queue: VecDeque<(f64, Packet)>,
}

impl Delay {
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            queue: VecDeque::new(),
        }
    }

    /// Forward every packet due by `tickno` to `next`.
    pub fn tick<N: NextHop>(&mut self, next: &mut N, tickno: f64) {
        while let Some(&(due, packet)) = self.queue.front() {
            if due > tickno {
                break;
            }
            self.queue.pop_front();
            next.accept(packet, tickno);
        }
    }

    pub fn next_event_time(&self) -> f64 {
        self.queue.front().map_or(f64::INFINITY, |(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl NextHop for Delay {
    fn accept(&mut self, packet: Packet, tickno: f64) {
        self.queue.push_back((tickno + self.delay, packet));
    }
}

/// Collects forwarded packets with their forwarding time.
#[cfg(test)]
impl NextHop for Vec<(f64, Packet)> {
    fn accept(&mut self, packet: Packet, tickno: f64) {
        self.push((tickno, packet));
    }
}
