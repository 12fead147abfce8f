use serde::{Deserialize, Serialize};

use super::{AdaptiveFilter, FilterError, FilterInitError, FilterProvider};

/// Tuning for [`NoiseRemover`]. All smoothing coefficients are per-sample
/// and assume the 8 kHz working rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseRemoverParams {
    /// Pole of the DC-blocking high-pass.
    pub dc_pole: f32,
    /// Smoothing of the short-term signal power.
    pub signal_smoothing: f32,
    /// Noise floor adaptation while the signal sits below it.
    pub noise_fall: f32,
    /// Noise floor adaptation while the signal sits above it.
    pub noise_rise: f32,
    pub gain_smoothing: f32,
    /// Gain applied to input judged to be pure noise.
    pub min_gain: f32,
    /// Noise power assumed before anything has been observed.
    pub initial_noise_power: f32,
}

impl Default for NoiseRemoverParams {
    fn default() -> Self {
        Self {
            dc_pole: 0.995,
            signal_smoothing: 0.05,
            noise_fall: 0.01,
            noise_rise: 0.0005,
            gain_smoothing: 0.01,
            min_gain: 0.1,
            initial_noise_power: 16.0,
        }
    }
}

impl NoiseRemoverParams {
    fn validate(&self) -> Result<(), FilterInitError> {
        let in_range = |name: &'static str, value: f32, low: f32, high: f32, low_inclusive: bool| {
            let above_low = if low_inclusive { value >= low } else { value > low };
            if value.is_finite() && above_low && value <= high {
                Ok(())
            } else {
                let open = if low_inclusive { '[' } else { '(' };
                Err(FilterInitError::InvalidParameter {
                    name,
                    reason: format!("{} is outside {}{}, {}]", value, open, low, high),
                })
            }
        };

        if !(0.0..1.0).contains(&self.dc_pole) {
            return Err(FilterInitError::InvalidParameter {
                name: "dc_pole",
                reason: format!("{} is outside [0, 1)", self.dc_pole),
            });
        }
        in_range("signal_smoothing", self.signal_smoothing, 0.0, 1.0, false)?;
        in_range("noise_fall", self.noise_fall, 0.0, 1.0, false)?;
        in_range("noise_rise", self.noise_rise, 0.0, 1.0, false)?;
        in_range("gain_smoothing", self.gain_smoothing, 0.0, 1.0, false)?;
        in_range("min_gain", self.min_gain, 0.0, 1.0, true)?;
        in_range(
            "initial_noise_power",
            self.initial_noise_power,
            0.0,
            f32::MAX,
            true,
        )?;
        Ok(())
    }
}

/// Single-channel adaptive noise suppressor.
///
/// The input is DC-blocked, then scaled by a smoothed Wiener-style gain
/// `1 - noise / signal` (floored at `min_gain`). The noise estimate follows
/// the signal power quickly downwards and slowly upwards, so it settles near
/// the quiet floor between words. It only moves in training mode.
#[derive(Debug, Clone)]
pub struct NoiseRemover {
    params: NoiseRemoverParams,
    prev_input: f32,
    prev_output: f32,
    signal_power: f32,
    noise_power: f32,
    gain: f32,
}

impl NoiseRemover {
    pub fn new(params: NoiseRemoverParams) -> Result<Self, FilterInitError> {
        params.validate()?;
        Ok(Self {
            prev_input: 0.0,
            prev_output: 0.0,
            signal_power: 0.0,
            noise_power: params.initial_noise_power,
            gain: 1.0,
            params,
        })
    }

    pub fn noise_power(&self) -> f32 {
        self.noise_power
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl AdaptiveFilter for NoiseRemover {
    fn apply(&mut self, sample: i16, training: bool) -> Result<i16, FilterError> {
        let p = &self.params;
        let x = sample as f32;

        let high_passed = x - self.prev_input + p.dc_pole * self.prev_output;
        self.prev_input = x;
        self.prev_output = high_passed;

        let power = high_passed * high_passed;
        self.signal_power += p.signal_smoothing * (power - self.signal_power);

        if training {
            let rate = if self.signal_power < self.noise_power {
                p.noise_fall
            } else {
                p.noise_rise
            };
            self.noise_power += rate * (self.signal_power - self.noise_power);
        }

        let target_gain = if self.signal_power > 0.0 {
            (1.0 - self.noise_power / self.signal_power).max(p.min_gain)
        } else {
            p.min_gain
        };
        self.gain += p.gain_smoothing * (target_gain - self.gain);

        let y = (high_passed * self.gain).round();
        Ok(y.clamp(i16::MIN as f32, i16::MAX as f32) as i16)
    }
}

/// Hands out a fresh [`NoiseRemover`] per run.
#[derive(Debug, Clone, Default)]
pub struct NoiseRemoverProvider {
    pub params: NoiseRemoverParams,
}

impl NoiseRemoverProvider {
    pub fn new(params: NoiseRemoverParams) -> Self {
        Self { params }
    }
}

impl FilterProvider for NoiseRemoverProvider {
    type Filter = NoiseRemover;

    fn init(&self) -> Result<NoiseRemover, FilterInitError> {
        NoiseRemover::new(self.params.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic uniform noise in `[-amplitude, amplitude]`.
    fn noise(len: usize, amplitude: i32, seed: u32) -> Vec<i16> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let unit = (state >> 8) as f32 / (1u32 << 24) as f32;
                ((unit * 2.0 - 1.0) * amplitude as f32) as i16
            })
            .collect()
    }

    fn energy(samples: &[i16]) -> f64 {
        samples.iter().map(|&s| (s as f64) * (s as f64)).sum()
    }

    fn run(filter: &mut NoiseRemover, input: &[i16], training: bool) -> Vec<i16> {
        input
            .iter()
            .map(|&s| filter.apply(s, training).unwrap())
            .collect()
    }

    #[test]
    fn test_silence_stays_silent() {
        let mut filter = NoiseRemover::new(NoiseRemoverParams::default()).unwrap();
        let output = run(&mut filter, &[0; 1000], true);
        assert!(output.iter().all(|&s| s == 0));
        assert!(filter.gain() < 0.11);
    }

    #[test]
    fn test_stationary_noise_is_attenuated() {
        let mut filter = NoiseRemover::new(NoiseRemoverParams::default()).unwrap();
        let input = noise(8000, 200, 7);
        let output = run(&mut filter, &input, true);

        let tail = 6000..8000;
        let ratio = energy(&output[tail.clone()]) / energy(&input[tail]);
        assert!(ratio < 0.25, "noise energy ratio {ratio}");
        assert!(filter.noise_power() > NoiseRemoverParams::default().initial_noise_power);
    }

    #[test]
    fn test_loud_burst_passes_after_training() {
        let mut filter = NoiseRemover::new(NoiseRemoverParams::default()).unwrap();
        run(&mut filter, &noise(8000, 200, 11), true);

        let burst: Vec<i16> = (0..500)
            .map(|i| {
                let phase = i as f32 * std::f32::consts::TAU / 16.0;
                (phase.sin() * 4000.0) as i16
            })
            .collect();
        let output = run(&mut filter, &burst, true);

        let ratio = energy(&output[100..]) / energy(&burst[100..]);
        assert!(ratio > 0.3, "burst energy ratio {ratio}");
    }

    #[test]
    fn test_noise_model_frozen_without_training() {
        let params = NoiseRemoverParams::default();
        let mut filter = NoiseRemover::new(params.clone()).unwrap();
        run(&mut filter, &noise(2000, 500, 3), false);
        assert_eq!(filter.noise_power(), params.initial_noise_power);
    }

    #[test]
    fn test_extreme_input_stays_in_range() {
        let mut filter = NoiseRemover::new(NoiseRemoverParams::default()).unwrap();
        let input: Vec<i16> = (0..1000)
            .map(|i| if i % 2 == 0 { i16::MAX } else { i16::MIN })
            .collect();
        // Alternating extremes overshoot the high-pass and must clamp.
        let output = run(&mut filter, &input, true);
        assert!(output.iter().any(|&s| s == i16::MAX || s == i16::MIN));
    }

    #[test]
    fn test_fresh_instances_are_independent() {
        let provider = NoiseRemoverProvider::default();
        let input = noise(3000, 300, 5);

        let mut first = provider.init().unwrap();
        let a = run(&mut first, &input, true);
        let mut second = provider.init().unwrap();
        let b = run(&mut second, &input, true);

        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_params_fail_init() {
        let cases = [
            NoiseRemoverParams {
                dc_pole: 1.0,
                ..Default::default()
            },
            NoiseRemoverParams {
                noise_rise: 0.0,
                ..Default::default()
            },
            NoiseRemoverParams {
                min_gain: 1.5,
                ..Default::default()
            },
            NoiseRemoverParams {
                signal_smoothing: f32::NAN,
                ..Default::default()
            },
            NoiseRemoverParams {
                initial_noise_power: -1.0,
                ..Default::default()
            },
        ];
        for params in cases {
            let provider = NoiseRemoverProvider::new(params);
            assert!(matches!(
                provider.init(),
                Err(FilterInitError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: NoiseRemoverParams = serde_json::from_str(r#"{"min_gain": 0.25}"#).unwrap();
        assert_eq!(params.min_gain, 0.25);
        assert_eq!(params.dc_pole, NoiseRemoverParams::default().dc_pole);
    }
}
