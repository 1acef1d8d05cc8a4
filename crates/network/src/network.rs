use crate::{Delay, Link, Receiver, Sender, SenderGang};
use whisker_types::{NetConfig, Prng};

/// A complete dumbbell simulation.
///
/// Owns its random stream, so two networks built from equal PRNG states and
/// configurations evolve identically.
#[derive(Debug, Clone)]
pub struct Network<S> {
    prng: Prng,
    senders: SenderGang<S>,
    link: Link,
    delay: Delay,
    receiver: Receiver,
    tickno: f64,
}

impl<S: Sender + Clone> Network<S> {
    pub fn new(example_sender: S, mut prng: Prng, config: &NetConfig) -> Self {
        let senders = SenderGang::new(&example_sender, config, &mut prng);
        Self {
            prng,
            senders,
            link: Link::new(config.link_ppt).with_start_buffer(config.start_buffer),
            delay: Delay::new(config.delay),
            receiver: Receiver::new(config.num_senders),
            tickno: 0.0,
        }
    }
}

impl<S: Sender> Network<S> {
    /// Returns whether any sender switched or transmitted.
    fn tick(&mut self) -> bool {
        let acted = self
            .senders
            .tick(&mut self.link, &mut self.receiver, &mut self.prng, self.tickno);
        self.link.tick(&mut self.delay, self.tickno);
        self.delay.tick(&mut self.receiver, self.tickno);
        acted
    }

    fn next_non_sender_event(&self) -> f64 {
        self.link
            .next_event_time(self.tickno)
            .min(self.delay.next_event_time())
            .min(self.receiver.next_event_time(self.tickno))
    }

    /// Time of the earliest pending event anywhere in the network.
    pub fn next_event_time(&self) -> f64 {
        self.senders
            .next_event_time(self.tickno)
            .min(self.next_non_sender_event())
    }

    /// Process events until the next one would fall after `duration`.
    pub fn run_simulation(&mut self, duration: f64) {
        while self.tickno < duration {
            let next = self.next_event_time();
            if next > duration || !next.is_finite() {
                break;
            }
            self.tickno = next;
            self.tick();
        }
    }

    /// Process events up to and including the next tick in which a sender
    /// switches or transmits.
    ///
    /// A window-limited sender reports no event time of its own; it sends
    /// in the tick that delivers its acknowledgement, and that tick counts.
    /// Returns `false` if the network has no pending events at all.
    pub fn run_until_sender_event(&mut self) -> bool {
        loop {
            let sender_time = self.senders.next_event_time(self.tickno);
            let next = sender_time.min(self.next_non_sender_event());
            if !next.is_finite() {
                return false;
            }
            self.tickno = next;
            if self.tick() || sender_time <= next {
                return true;
            }
        }
    }

    /// Current simulated time in milliseconds.
    pub fn tickno(&self) -> f64 {
        self.tickno
    }

    /// Every sender's state followed by the bottleneck occupancy.
    pub fn state(&self) -> Vec<f64> {
        let mut state = self.senders.state();
        state.push(self.link.occupancy() as f64);
        state
    }

    pub fn senders(&self) -> &SenderGang<S> {
        &self.senders
    }

    pub fn senders_mut(&mut self) -> &mut SenderGang<S> {
        &mut self.senders
    }

    /// Consume the network, returning its random stream where it left off.
    pub fn into_prng(self) -> Prng {
        self.prng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InitialState, Rat};
    use std::sync::Arc;
    use whisker_types::{seeded_prng, MemoryRange, Whisker, WhiskerTree};

    fn fixed_window_tree(window: i32) -> Arc<WhiskerTree> {
        let mut tree = WhiskerTree::default();
        assert!(tree.replace(Whisker::new(MemoryRange::default()).with_action(window, 0.0, 0.0)));
        Arc::new(tree)
    }

    fn single_sender(start_buffer: u32) -> NetConfig {
        NetConfig::default()
            .with_num_senders(1)
            .with_link_ppt(1.0)
            .with_delay(50.0)
            .with_on_duration(1e7)
            .with_off_duration(0.0)
            .with_start_buffer(start_buffer)
    }

    #[test]
    fn test_fixed_window_reaches_link_rate() {
        let rat = Rat::new(fixed_window_tree(200), false);
        let mut network = Network::new(rat, seeded_prng(1), &single_sender(0));
        network.run_simulation(20_000.0);

        let measurements = network.senders().throughputs_delays();
        assert_eq!(measurements.len(), 1);
        let m = measurements[0];
        assert!(m.throughput > 0.9 && m.throughput <= 1.0, "{m:?}");
        assert!(m.delay >= 50.0, "{m:?}");
        assert!(network.senders().utility().is_finite());
    }

    #[test]
    fn test_same_seed_same_result() {
        let config = NetConfig::default().with_num_senders(3);
        let run = |seed| {
            let rat = Rat::new(fixed_window_tree(20), false);
            let mut network = Network::new(rat, seeded_prng(seed), &config);
            network.run_simulation(50_000.0);
            (network.senders().utility().to_bits(), network.state())
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn test_into_prng_continues_stream() {
        use rand::Rng;
        let config = NetConfig::default().with_num_senders(2);
        let rat = Rat::new(fixed_window_tree(10), false);
        let mut network = Network::new(rat.clone(), seeded_prng(8), &config);
        network.run_simulation(30_000.0);
        let mut continued = network.into_prng();

        let mut fresh = seeded_prng(8);
        let first_continued: u64 = continued.gen();
        let first_fresh: u64 = fresh.gen();
        assert_ne!(first_continued, first_fresh);
    }

    #[test]
    fn test_window_limited_sender_events_keep_arriving() {
        let rat = Rat::new(fixed_window_tree(10), false);
        let mut network = Network::new(rat, seeded_prng(50), &single_sender(0));

        let mut last = network.tickno();
        for _ in 0..2_000 {
            assert!(network.run_until_sender_event());
            assert!(network.tickno() >= last);
            last = network.tickno();
        }
        // Ten packets per round trip of about 50 ms.
        assert!(last > 5_000.0, "stalled at {last}");
        assert_eq!(network.state()[3], 10.0);
    }

    #[test]
    fn test_run_until_sender_event_advances_time() {
        let mut rat = Rat::new(Arc::new(WhiskerTree::default()), false);
        rat.set_initial_state(InitialState {
            imputed_delay: 1.0,
            rewma: 0.3,
        });
        let mut network = Network::new(rat, seeded_prng(50), &single_sender(4));
        let state = network.state();
        assert_eq!(state.len(), 6);
        assert_eq!(state[5], 4.0);

        let mut last = network.tickno();
        for _ in 0..100 {
            assert!(network.run_until_sender_event());
            assert!(network.tickno() >= last);
            last = network.tickno();
        }
        assert!(last > 0.0);
    }
}
