//! Network scenarios.

/// One concrete simulation scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetConfig {
    /// Mean length of a sender's on period, in milliseconds.
    pub mean_on_duration: f64,
    /// Mean length of a sender's off period, in milliseconds. Zero means the
    /// senders never switch off.
    pub mean_off_duration: f64,
    /// Number of senders sharing the bottleneck.
    pub num_senders: u32,
    /// Bottleneck rate in packets per millisecond.
    pub link_ppt: f64,
    /// One-way propagation delay in milliseconds.
    pub delay: f64,
    /// Packets already queued at the bottleneck when the simulation starts.
    pub start_buffer: u32,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            mean_on_duration: 5000.0,
            mean_off_duration: 5000.0,
            num_senders: 8,
            link_ppt: 1.0,
            delay: 150.0,
            start_buffer: 0,
        }
    }
}

impl NetConfig {
    pub fn with_on_duration(mut self, duration: f64) -> Self {
        self.mean_on_duration = duration;
        self
    }

    pub fn with_off_duration(mut self, duration: f64) -> Self {
        self.mean_off_duration = duration;
        self
    }

    pub fn with_num_senders(mut self, num_senders: u32) -> Self {
        self.num_senders = num_senders;
        self
    }

    pub fn with_link_ppt(mut self, link_ppt: f64) -> Self {
        self.link_ppt = link_ppt;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_start_buffer(mut self, start_buffer: u32) -> Self {
        self.start_buffer = start_buffer;
        self
    }
}

/// A sweep of scenarios to evaluate a rule tree against.
///
/// Ranges are inclusive `(min, max)` pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigRange {
    pub link_packets_per_ms: (f64, f64),
    pub rtt_ms: (f64, f64),
    pub max_senders: u32,
    pub mean_on_duration: f64,
    pub mean_off_duration: f64,
}

impl Default for ConfigRange {
    fn default() -> Self {
        Self {
            link_packets_per_ms: (1.0, 2.0),
            rtt_ms: (150.0, 150.0),
            max_senders: 2,
            mean_on_duration: 5000.0,
            mean_off_duration: 5000.0,
        }
    }
}

impl ConfigRange {
    pub fn with_link_packets_per_ms(mut self, min: f64, max: f64) -> Self {
        self.link_packets_per_ms = (min, max);
        self
    }

    pub fn with_rtt_ms(mut self, min: f64, max: f64) -> Self {
        self.rtt_ms = (min, max);
        self
    }

    pub fn with_max_senders(mut self, max_senders: u32) -> Self {
        self.max_senders = max_senders;
        self
    }

    pub fn with_on_duration(mut self, duration: f64) -> Self {
        self.mean_on_duration = duration;
        self
    }

    pub fn with_off_duration(mut self, duration: f64) -> Self {
        self.mean_off_duration = duration;
        self
    }

    /// Scenario at `link_ppt` with every other setting taken from this range.
    ///
    /// Uses the lower end of the RTT range.
    pub fn config_at(&self, link_ppt: f64) -> NetConfig {
        NetConfig::default()
            .with_link_ppt(link_ppt)
            .with_delay(self.rtt_ms.0)
            .with_num_senders(self.max_senders)
            .with_on_duration(self.mean_on_duration)
            .with_off_duration(self.mean_off_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_at_copies_range_settings() {
        let range = ConfigRange::default()
            .with_rtt_ms(100.0, 100.0)
            .with_max_senders(3)
            .with_on_duration(4000.0)
            .with_off_duration(1000.0);
        let config = range.config_at(1.5);

        assert_eq!(config.link_ppt, 1.5);
        assert_eq!(config.delay, 100.0);
        assert_eq!(config.num_senders, 3);
        assert_eq!(config.mean_on_duration, 4000.0);
        assert_eq!(config.mean_off_duration, 1000.0);
        assert_eq!(config.start_buffer, 0);
    }
}
