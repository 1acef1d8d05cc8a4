use crate::switched::exponential;
use crate::{NextHop, Receiver, Sender, SenderMeasurement, SwitchedSender};
use whisker_types::{NetConfig, Prng};

/// Every sender sharing the bottleneck.
#[derive(Debug, Clone)]
pub struct SenderGang<S> {
    senders: Vec<SwitchedSender<S>>,
    mean_on_duration: f64,
    mean_off_duration: f64,
}

impl<S: Sender + Clone> SenderGang<S> {
    /// One clone of `example` per configured sender, each starting off and
    /// switching on after an exponentially distributed delay.
    pub fn new(example: &S, config: &NetConfig, prng: &mut Prng) -> Self {
        let senders = (0..config.num_senders)
            .map(|id| {
                let first_switch = if config.mean_off_duration <= 0.0 {
                    0.0
                } else {
                    exponential(prng, config.mean_off_duration)
                };
                SwitchedSender::new(id, example.clone(), first_switch)
            })
            .collect();
        Self {
            senders,
            mean_on_duration: config.mean_on_duration,
            mean_off_duration: config.mean_off_duration,
        }
    }
}

impl<S: Sender> SenderGang<S> {
    fn num_sending(&self) -> u32 {
        self.senders.iter().filter(|s| s.is_sending()).count() as u32
    }

    /// Switch senders on or off, then let each collect acknowledgements and
    /// send.
    ///
    /// Returns whether any sender switched or transmitted.
    pub fn tick<N: NextHop>(
        &mut self,
        next: &mut N,
        receiver: &mut Receiver,
        prng: &mut Prng,
        tickno: f64,
    ) -> bool {
        let mut acted = false;
        let num_sending = self.num_sending();
        for sender in &mut self.senders {
            acted |= sender.switcher(
                tickno,
                num_sending,
                prng,
                self.mean_on_duration,
                self.mean_off_duration,
            );
        }

        let num_sending = self.num_sending();
        for sender in &mut self.senders {
            acted |= sender.exchange(next, receiver, tickno, num_sending);
        }
        acted
    }

    pub fn next_event_time(&self, tickno: f64) -> f64 {
        self.senders
            .iter()
            .map(|s| s.next_event_time(tickno))
            .fold(f64::INFINITY, f64::min)
    }

    /// Sum of every sender's utility.
    pub fn utility(&self) -> f64 {
        self.senders.iter().map(|s| s.utility().utility()).sum()
    }

    pub fn throughputs_delays(&self) -> Vec<SenderMeasurement> {
        self.senders
            .iter()
            .map(|s| s.utility().measurement())
            .collect()
    }

    /// Concatenated state of every sender, in id order.
    pub fn state(&self) -> Vec<f64> {
        self.senders
            .iter()
            .flat_map(|s| s.sender().state())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SwitchedSender<S>> {
        self.senders.iter()
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    pub fn sender(&self, index: usize) -> Option<&SwitchedSender<S>> {
        self.senders.get(index)
    }

    pub fn sender_mut(&mut self, index: usize) -> Option<&mut SwitchedSender<S>> {
        self.senders.get_mut(index)
    }
}
