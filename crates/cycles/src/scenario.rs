use std::sync::Arc;
use whisker_network::{InitialState, Network, Rat};
use whisker_types::{seeded_prng, NetConfig, WhiskerTree};

/// The network a grid point is simulated in: one always-on sender on a
/// fixed link, started from a chosen receive EWMA and buffer occupancy.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleScenario {
    pub link_ppt: f64,
    pub delay: f64,
    pub num_senders: u32,
    pub mean_on_duration: f64,
    pub mean_off_duration: f64,
    /// RTT ratio every sender starts from.
    pub imputed_delay: f64,
    pub seed: u64,
}

impl Default for CycleScenario {
    fn default() -> Self {
        Self {
            link_ppt: 1.0,
            delay: 50.0,
            num_senders: 1,
            mean_on_duration: 10_000_000.0,
            mean_off_duration: 0.0,
            imputed_delay: 1.0,
            seed: 50,
        }
    }
}

impl CycleScenario {
    pub fn with_link_ppt(mut self, link_ppt: f64) -> Self {
        self.link_ppt = link_ppt;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_num_senders(mut self, num_senders: u32) -> Self {
        self.num_senders = num_senders;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn net_config(&self, initial_buffer: u32) -> NetConfig {
        NetConfig::default()
            .with_link_ppt(self.link_ppt)
            .with_delay(self.delay)
            .with_num_senders(self.num_senders)
            .with_on_duration(self.mean_on_duration)
            .with_off_duration(self.mean_off_duration)
            .with_start_buffer(initial_buffer)
    }

    /// A fresh network for one grid point. Equal arguments always build
    /// networks that evolve identically.
    pub fn build(&self, whiskers: &Arc<WhiskerTree>, rewma: f64, initial_buffer: u32) -> Network<Rat> {
        let rat = Rat::new(Arc::clone(whiskers), false);
        let mut network = Network::new(
            rat,
            seeded_prng(self.seed),
            &self.net_config(initial_buffer),
        );

        let initial = InitialState {
            imputed_delay: self.imputed_delay,
            rewma,
        };
        let senders = network.senders_mut();
        for index in 0..senders.len() {
            if let Some(switched) = senders.sender_mut(index) {
                switched.sender_mut().set_initial_state(initial);
            }
        }
        network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_applies_initial_state() {
        let scenario = CycleScenario::default();
        let tree = Arc::new(WhiskerTree::default());
        let network = scenario.build(&tree, 0.7, 3);

        let state = network.state();
        assert_eq!(state.len(), 6);
        assert_eq!(state[1], 0.7);
        assert_eq!(state[2], 1.0);
        assert_eq!(state[5], 3.0);
    }

    #[test]
    fn test_net_config_is_always_on() {
        let config = CycleScenario::default().net_config(8);
        assert_eq!(config.mean_off_duration, 0.0);
        assert_eq!(config.num_senders, 1);
        assert_eq!(config.start_buffer, 8);
        assert_eq!(config.delay, 50.0);
    }
}
