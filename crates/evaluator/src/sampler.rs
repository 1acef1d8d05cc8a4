use crate::EvaluatorError;
use whisker_types::{ConfigRange, NetConfig};

/// Expand `range` into a geometric sweep of link speeds.
///
/// Speeds start at the range minimum and grow by `(max / min)^(1 / steps)`
/// until they pass `max` by more than half a step, so the top of the range
/// is always represented. A range with `min == max` yields one
/// configuration. Every configuration carries the range's RTT, sender count
/// and on/off durations.
pub fn sample_configs(range: &ConfigRange, steps: u32) -> Result<Vec<NetConfig>, EvaluatorError> {
    let (rtt_min, rtt_max) = range.rtt_ms;
    if rtt_min != rtt_max {
        return Err(EvaluatorError::RttNotFixed {
            min: rtt_min,
            max: rtt_max,
        });
    }

    let (min, max) = range.link_packets_per_ms;
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max >= min) {
        return Err(EvaluatorError::InvalidLinkRange { min, max });
    }
    if steps == 0 {
        return Err(EvaluatorError::ZeroSteps);
    }

    if min == max {
        return Ok(vec![range.config_at(min)]);
    }

    let multiplier = (max / min).powf(1.0 / f64::from(steps));
    let bound = max * (1.0 + (multiplier - 1.0) / 2.0);

    let mut configs = Vec::with_capacity(steps as usize + 1);
    let mut link_speed = min;
    while link_speed <= bound {
        configs.push(range.config_at(link_speed));
        link_speed *= multiplier;
    }
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn range(min: f64, max: f64) -> ConfigRange {
        ConfigRange::default()
            .with_link_packets_per_ms(min, max)
            .with_rtt_ms(100.0, 100.0)
            .with_max_senders(2)
            .with_on_duration(5000.0)
            .with_off_duration(1000.0)
    }

    #[test]
    fn test_sweep_covers_range() {
        let configs = sample_configs(&range(1.0, 2.0), 64).unwrap();

        assert_eq!(configs.len(), 65);
        assert_eq!(configs[0].link_ppt, 1.0);
        let last = configs[configs.len() - 1].link_ppt;
        assert!((last - 2.0).abs() < 1e-9, "last speed {last}");
        assert!(configs.windows(2).all(|w| w[0].link_ppt < w[1].link_ppt));

        for config in &configs {
            assert_eq!(config.delay, 100.0);
            assert_eq!(config.num_senders, 2);
            assert_eq!(config.mean_on_duration, 5000.0);
            assert_eq!(config.mean_off_duration, 1000.0);
        }
    }

    #[test]
    fn test_point_range_yields_one_config() {
        let configs = sample_configs(&range(3.0, 3.0), 64).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].link_ppt, 3.0);
    }

    #[test]
    fn test_rejects_rtt_range() {
        let r = range(1.0, 2.0).with_rtt_ms(100.0, 200.0);
        assert_eq!(
            sample_configs(&r, 64),
            Err(EvaluatorError::RttNotFixed {
                min: 100.0,
                max: 200.0
            })
        );
    }

    #[test]
    fn test_rejects_bad_link_ranges() {
        for (min, max) in [(0.0, 1.0), (2.0, 1.0), (-1.0, 1.0), (1.0, f64::INFINITY)] {
            assert_eq!(
                sample_configs(&range(min, max), 64),
                Err(EvaluatorError::InvalidLinkRange { min, max })
            );
        }
        assert!(sample_configs(&range(f64::NAN, 1.0), 64).is_err());
        assert_eq!(sample_configs(&range(1.0, 2.0), 0), Err(EvaluatorError::ZeroSteps));
    }

    proptest! {
        #[test]
        fn sweep_stays_within_half_step_margin(
            min in 0.01f64..10.0,
            ratio in 1.01f64..100.0,
            steps in 1u32..128,
        ) {
            let max = min * ratio;
            let configs = sample_configs(&range(min, max), steps).unwrap();
            let multiplier = ratio.powf(1.0 / f64::from(steps));
            let bound = max * (1.0 + (multiplier - 1.0) / 2.0);

            prop_assert!(configs.len() as u32 >= steps);
            prop_assert!(configs.len() as u32 <= steps + 1);
            prop_assert_eq!(configs[0].link_ppt, min);
            for config in &configs {
                prop_assert!(config.link_ppt >= min && config.link_ppt <= bound);
            }
        }
    }
}
