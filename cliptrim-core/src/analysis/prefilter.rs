//! Perceptual weighting prefilter.
//!
//! A fixed-coefficient 4th-order IIR high-shelf that approximates the
//! frequency response of the head before power measurement. State is four
//! samples of input history and four of output history, carried across
//! buffer boundaries so sub-blocks can straddle input buffers freely.

const B: [f64; 5] = [
    1.535_124_859_586_97,
    -5.761_945_908_580_32,
    8.116_910_049_252_58,
    -5.088_481_811_112_08,
    1.198_392_810_852_85,
];

const A: [f64; 4] = [
    -3.680_706_748_016_390,
    5.087_045_247_971_131,
    -3.131_546_351_446_730,
    0.725_208_888_477_870,
];

#[derive(Debug, Clone, Default)]
pub(crate) struct WeightingFilter {
    x: [f32; 4],
    y: [f32; 4],
}

impl WeightingFilter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed one sample through the difference equation.
    #[inline]
    pub(crate) fn process(&mut self, x0: f32) -> f32 {
        let y0 = (B[0] * x0 as f64
            + B[1] * self.x[0] as f64
            + B[2] * self.x[1] as f64
            + B[3] * self.x[2] as f64
            + B[4] * self.x[3] as f64
            - A[0] * self.y[0] as f64
            - A[1] * self.y[1] as f64
            - A[2] * self.y[2] as f64
            - A[3] * self.y[3] as f64) as f32;
        self.y = [y0, self.y[0], self.y[1], self.y[2]];
        self.x = [x0, self.x[0], self.x[1], self.x[2]];
        y0
    }

    pub(crate) fn reset(&mut self) {
        self.x = [0.0; 4];
        self.y = [0.0; 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn impulse_response_starts_with_b0() {
        let mut f = WeightingFilter::new();
        let y0 = f.process(1.0);
        assert_relative_eq!(y0, 1.535_124_9, epsilon = 1e-6);
    }

    #[test]
    fn state_carries_across_chunk_boundaries() {
        let signal: Vec<f32> = (0..256)
            .map(|i| ((i as f32) * 0.37).sin() * 0.5)
            .collect();

        let mut whole = WeightingFilter::new();
        let expected: Vec<f32> = signal.iter().map(|&s| whole.process(s)).collect();

        let mut chunked = WeightingFilter::new();
        let mut got = Vec::new();
        for chunk in signal.chunks(7) {
            for &s in chunk {
                got.push(chunked.process(s));
            }
        }
        assert_eq!(expected, got);
    }

    #[test]
    fn reset_clears_history() {
        let mut f = WeightingFilter::new();
        for _ in 0..16 {
            f.process(0.8);
        }
        f.reset();
        let y = f.process(1.0);
        assert_relative_eq!(y, 1.535_124_9, epsilon = 1e-6);
    }

    #[test]
    fn silence_stays_silent() {
        let mut f = WeightingFilter::new();
        for _ in 0..64 {
            assert_eq!(f.process(0.0), 0.0);
        }
    }
}
