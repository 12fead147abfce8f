use super::{AdaptiveFilter, FilterError};

/// Shift applied before filtering: `x >> 2`.
const PRE_SHIFT: u32 = 2;
/// Shift applied after filtering: `y << 2`.
const POST_SHIFT: u32 = 2;
/// Filter outputs beyond this magnitude saturate to the `i16` extremes.
pub const CLIP_THRESHOLD: i16 = 8192;

/// Runs `filter` over `buffer` in place, one sample at a time in index order.
///
/// Each sample is scaled down by two bits (arithmetic shift, sign preserved),
/// filtered, then either saturated to `i16::MIN`/`i16::MAX` when the filter
/// output leaves `[-8192, 8192]`, or scaled back up by two bits. Returns the
/// number of samples processed, which equals `buffer.len()` on success.
pub fn process<F: AdaptiveFilter + ?Sized>(
    buffer: &mut [i16],
    filter: &mut F,
    training: bool,
) -> Result<usize, FilterError> {
    let mut processed = 0;
    for sample in buffer.iter_mut() {
        let scaled = *sample >> PRE_SHIFT;
        let filtered = filter.apply(scaled, training)?;
        *sample = post_scale(filtered);
        processed += 1;
    }
    Ok(processed)
}

fn post_scale(y: i16) -> i16 {
    if y > CLIP_THRESHOLD {
        i16::MAX
    } else if y < -CLIP_THRESHOLD {
        i16::MIN
    } else {
        // 8192 << 2 is one past i16::MAX
        ((y as i32) << POST_SHIFT).clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes its input and records every call.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<(i16, bool)>,
    }

    impl AdaptiveFilter for Recorder {
        fn apply(&mut self, sample: i16, training: bool) -> Result<i16, FilterError> {
            self.seen.push((sample, training));
            Ok(sample)
        }
    }

    /// Ignores its input and replays fixed outputs.
    struct Scripted(std::vec::IntoIter<i16>);

    impl AdaptiveFilter for Scripted {
        fn apply(&mut self, _sample: i16, _training: bool) -> Result<i16, FilterError> {
            Ok(self.0.next().unwrap_or(0))
        }
    }

    /// Fails after a fixed number of samples.
    struct Flaky {
        remaining: usize,
    }

    impl AdaptiveFilter for Flaky {
        fn apply(&mut self, sample: i16, _training: bool) -> Result<i16, FilterError> {
            if self.remaining == 0 {
                return Err(FilterError::Disconnected { processed: 0 });
            }
            self.remaining -= 1;
            Ok(sample)
        }
    }

    #[test]
    fn test_prescale_is_arithmetic_and_in_order() {
        let mut buffer = vec![400, -400, -1, 3, i16::MIN, i16::MAX];
        let mut filter = Recorder::default();

        let processed = process(&mut buffer, &mut filter, true).unwrap();

        assert_eq!(processed, 6);
        let inputs: Vec<i16> = filter.seen.iter().map(|(s, _)| *s).collect();
        assert_eq!(inputs, vec![100, -100, -1, 0, -8192, 8191]);
        assert!(filter.seen.iter().all(|(_, training)| *training));
    }

    #[test]
    fn test_passthrough_filter_restores_scale() {
        let mut buffer = vec![400, -400, 1000, -1000];
        process(&mut buffer, &mut Recorder::default(), true).unwrap();
        assert_eq!(buffer, vec![400, -400, 1000, -1000]);
    }

    #[test]
    fn test_clipping_law() {
        let outputs = vec![8193, -8193, 8192, -8192, i16::MAX, i16::MIN, 100, -100];
        let mut buffer = vec![0; outputs.len()];
        let mut filter = Scripted(outputs.into_iter());

        process(&mut buffer, &mut filter, true).unwrap();

        assert_eq!(
            buffer,
            vec![
                i16::MAX,
                i16::MIN,
                i16::MAX,
                i16::MIN,
                i16::MAX,
                i16::MIN,
                400,
                -400
            ]
        );
    }

    #[test]
    fn test_training_flag_is_forwarded() {
        let mut buffer = vec![4, 8];
        let mut filter = Recorder::default();
        process(&mut buffer, &mut filter, false).unwrap();
        assert_eq!(filter.seen, vec![(1, false), (2, false)]);
    }

    #[test]
    fn test_empty_buffer() {
        let mut buffer: Vec<i16> = Vec::new();
        assert_eq!(process(&mut buffer, &mut Recorder::default(), true).unwrap(), 0);
    }

    #[test]
    fn test_filter_error_stops_processing() {
        let mut buffer = vec![40, 40, 40, 40];
        let mut filter = Flaky { remaining: 2 };
        assert!(process(&mut buffer, &mut filter, true).is_err());
        assert_eq!(buffer, vec![40, 40, 40, 40]);
    }

    #[test]
    fn test_works_through_trait_object() {
        let mut buffer = vec![8, 16];
        let mut recorder = Recorder::default();
        let filter: &mut dyn AdaptiveFilter = &mut recorder;
        assert_eq!(process(&mut buffer, filter, true).unwrap(), 2);
    }
}
