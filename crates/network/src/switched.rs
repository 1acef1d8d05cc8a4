use crate::{NextHop, Receiver, Sender, SenderId, Utility};
use rand::Rng;
use whisker_types::Prng;

/// Draw from an exponential distribution with the given mean.
pub(crate) fn exponential(prng: &mut Prng, mean: f64) -> f64 {
    let u: f64 = prng.gen();
    -mean * (1.0 - u).ln()
}

/// Wraps a [`Sender`] in an on/off process.
///
/// On and off periods are exponentially distributed. Every switch-on starts
/// a new flow on the wrapped sender. With a mean off duration of zero the
/// sender switches on at the first tick and stays on.
#[derive(Debug, Clone)]
pub struct SwitchedSender<S> {
    id: SenderId,
    sender: S,
    utility: Utility,
    sending: bool,
    next_switch_tick: f64,
    internal_tick: f64,
}

impl<S: Sender> SwitchedSender<S> {
    pub(crate) fn new(id: SenderId, sender: S, first_switch_tick: f64) -> Self {
        Self {
            id,
            sender,
            utility: Utility::default(),
            sending: false,
            next_switch_tick: first_switch_tick,
            internal_tick: 0.0,
        }
    }

    pub fn id(&self) -> SenderId {
        self.id
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn sender_mut(&mut self) -> &mut S {
        &mut self.sender
    }

    pub fn utility(&self) -> &Utility {
        &self.utility
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    fn accumulate_sending_time_until(&mut self, tickno: f64, num_sending: u32) {
        self.utility
            .sending_duration(tickno - self.internal_tick, num_sending);
        self.internal_tick = tickno;
    }

    /// Switch on or off if a switch is due. Returns whether it switched.
    pub(crate) fn switcher(
        &mut self,
        tickno: f64,
        num_sending: u32,
        prng: &mut Prng,
        mean_on_duration: f64,
        mean_off_duration: f64,
    ) -> bool {
        if self.next_switch_tick > tickno {
            return false;
        }
        if self.sending {
            self.accumulate_sending_time_until(tickno, num_sending);
            self.sending = false;
            self.next_switch_tick = tickno + exponential(prng, mean_off_duration);
        } else {
            self.sending = true;
            self.internal_tick = tickno;
            self.sender.reset(tickno);
            self.next_switch_tick = if mean_off_duration <= 0.0 {
                f64::INFINITY
            } else {
                tickno + exponential(prng, mean_on_duration)
            };
        }
        true
    }

    /// Collect acknowledgements, then send if on. Returns whether a packet
    /// was sent.
    pub(crate) fn exchange<N: NextHop>(
        &mut self,
        next: &mut N,
        receiver: &mut Receiver,
        tickno: f64,
        num_sending: u32,
    ) -> bool {
        if receiver.readable(self.id) {
            let packets = receiver.take(self.id);
            self.utility.packets_received(&packets);
            self.sender.packets_received(&packets);
        }
        if !self.sending {
            return false;
        }
        let sent = self.sender.send(self.id, next, tickno);
        self.accumulate_sending_time_until(tickno, num_sending);
        sent
    }

    pub fn next_event_time(&self, tickno: f64) -> f64 {
        let send_time = if self.sending {
            self.sender.next_event_time(tickno)
        } else {
            f64::INFINITY
        };
        self.next_switch_tick.min(send_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Packet, Rat};
    use std::sync::Arc;
    use whisker_types::{seeded_prng, WhiskerTree};

    #[test]
    fn test_exponential_mean() {
        let mut prng = seeded_prng(3);
        let n = 20_000;
        let mean = (0..n).map(|_| exponential(&mut prng, 10.0)).sum::<f64>() / n as f64;
        assert!((mean - 10.0).abs() < 0.5, "sample mean {mean}");
    }

    #[test]
    fn test_always_on_never_switches_off() {
        let mut prng = seeded_prng(1);
        let rat = Rat::new(Arc::new(WhiskerTree::default()), false);
        let mut switched = SwitchedSender::new(0, rat, 0.0);

        assert!(switched.switcher(0.0, 0, &mut prng, 1_000.0, 0.0));
        assert!(switched.is_sending());
        assert_eq!(switched.next_switch_tick, f64::INFINITY);

        assert!(!switched.switcher(1e12, 1, &mut prng, 1_000.0, 0.0));
        assert!(switched.is_sending());
    }

    #[test]
    fn test_switch_cycle_accounts_sending_time() {
        let mut prng = seeded_prng(2);
        let rat = Rat::new(Arc::new(WhiskerTree::default()), false);
        let mut switched = SwitchedSender::new(0, rat, 10.0);
        assert_eq!(switched.next_event_time(0.0), 10.0);

        switched.switcher(10.0, 0, &mut prng, 100.0, 100.0);
        assert!(switched.is_sending());
        let off_at = switched.next_switch_tick;
        assert!(off_at > 10.0);

        switched.switcher(off_at, 2, &mut prng, 100.0, 100.0);
        assert!(!switched.is_sending());
        assert!(switched.next_switch_tick > off_at);
        // On for a while but nothing came back.
        assert_eq!(switched.utility().utility(), -f64::from(i32::MAX));
    }

    #[test]
    fn test_exchange_delivers_acks_to_utility() {
        let mut prng = seeded_prng(4);
        let rat = Rat::new(Arc::new(WhiskerTree::default()), false);
        let mut switched = SwitchedSender::new(0, rat, 0.0);
        switched.switcher(0.0, 0, &mut prng, 1_000.0, 0.0);

        let mut receiver = Receiver::new(1);
        receiver.accept(Packet::new(0, 1, 0.0, 0), 50.0);
        let mut out: Vec<(f64, Packet)> = Vec::new();
        switched.exchange(&mut out, &mut receiver, 50.0, 1);

        assert!(!receiver.readable(0));
        let m = switched.utility().measurement();
        assert_eq!(m.delay, 50.0);
        assert_eq!(m.throughput, 1.0 / 50.0);
    }
}
