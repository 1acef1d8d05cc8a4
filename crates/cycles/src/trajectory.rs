use whisker_network::{Network, Sender};

/// A deterministic dynamical system observed one event at a time.
pub trait Trajectory {
    /// Move to the next observation point. Returns `false` once the system
    /// has nothing left to do.
    fn advance(&mut self) -> bool;

    /// Time of the current observation.
    fn time(&self) -> f64;

    /// Continuous state at the current observation.
    fn state(&self) -> Vec<f64>;
}

impl<S: Sender> Trajectory for Network<S> {
    fn advance(&mut self) -> bool {
        self.run_until_sender_event()
    }

    fn time(&self) -> f64 {
        self.tickno()
    }

    fn state(&self) -> Vec<f64> {
        Network::state(self)
    }
}
