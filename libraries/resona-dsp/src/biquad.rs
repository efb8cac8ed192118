//! Second-order IIR filter section (biquad) for parametric EQ bands
//!
//! Implements the RBJ cookbook peaking (bell) response with the bandwidth
//! expressed in octaves. Runs in transposed direct form II, so each channel
//! carries exactly two delay elements.

/// Smoothing coefficient for exponential coefficient interpolation.
/// Value of 0.002 at 44.1kHz gives a ~3ms time constant: fast enough to
/// track a dragged slider, slow enough to avoid zipper noise.
const SMOOTH_COEFF: f32 = 0.002;

/// Denormal cutoff for the feedback path. Values below this are flushed to
/// zero to keep the filter out of denormal arithmetic on x86.
const DENORMAL_FLUSH: f32 = 1e-15;

/// One normalized set of biquad coefficients (a0 divided out).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Coefficients {
    /// Pass-through (unity) coefficients.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Compute peaking-EQ coefficients.
    ///
    /// `bandwidth_octaves` is the bell width between the -3dB-relative
    /// points. The center frequency is clamped to 45% of the sample rate to
    /// keep the section away from Nyquist instability, and the whole
    /// computation degrades to `IDENTITY` when the sample rate is not usable.
    pub fn peaking(
        sample_rate_hz: f32,
        frequency_hz: f32,
        bandwidth_octaves: f32,
        gain_db: f32,
    ) -> Self {
        if sample_rate_hz < 1.0 {
            return Self::IDENTITY;
        }

        let a = 10.0_f32.powf(gain_db / 40.0);
        let clamped_freq = frequency_hz.clamp(1.0, sample_rate_hz * 0.45);
        let omega = 2.0 * std::f32::consts::PI * clamped_freq / sample_rate_hz;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();

        // RBJ: alpha = sin(w0) * sinh(ln(2)/2 * BW * w0/sin(w0))
        let ln2_half = std::f32::consts::LN_2 / 2.0;
        let alpha = sin_omega * (ln2_half * bandwidth_octaves * omega / sin_omega).sinh();

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_omega;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha / a;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Single biquad section with click-free coefficient updates.
///
/// The section keeps a target and an active coefficient set. The active set
/// is pulled toward the target with one-pole smoothing on every sample, so a
/// parameter change never produces more than a short, inaudible transient.
/// Filter state is two delay elements (transposed direct form II).
#[derive(Debug, Clone, Copy)]
pub struct BiquadFilter {
    target: Coefficients,
    active: Coefficients,
    z1: f32,
    z2: f32,
}

impl BiquadFilter {
    /// Create a section in pass-through state.
    pub fn new() -> Self {
        Self {
            target: Coefficients::IDENTITY,
            active: Coefficients::IDENTITY,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Set target coefficients. The active set transitions smoothly.
    pub fn set_target(&mut self, coeffs: Coefficients) {
        self.target = coeffs;
    }

    /// Target coefficients currently being smoothed toward.
    pub fn target(&self) -> Coefficients {
        self.target
    }

    /// Reset delay state and snap active coefficients to the target.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
        self.active = self.target;
    }

    /// Force the section back to pass-through, target and active alike.
    /// Delay state is preserved so the transition is free of transients.
    pub fn set_to_identity(&mut self) {
        self.target = Coefficients::IDENTITY;
        self.active = Coefficients::IDENTITY;
    }

    #[inline]
    fn smooth_coefficients(&mut self) {
        self.active.b0 += SMOOTH_COEFF * (self.target.b0 - self.active.b0);
        self.active.b1 += SMOOTH_COEFF * (self.target.b1 - self.active.b1);
        self.active.b2 += SMOOTH_COEFF * (self.target.b2 - self.active.b2);
        self.active.a1 += SMOOTH_COEFF * (self.target.a1 - self.active.a1);
        self.active.a2 += SMOOTH_COEFF * (self.target.a2 - self.active.a2);
    }

    /// Process one sample through the section.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        self.smooth_coefficients();

        let c = self.active;
        let mut out = c.b0 * sample + self.z1;
        if out.abs() < DENORMAL_FLUSH {
            out = 0.0;
        }
        self.z1 = c.b1 * sample - c.a1 * out + self.z2;
        self.z2 = c.b2 * sample - c.a2 * out;

        out
    }
}

impl Default for BiquadFilter {
    fn default() -> Self {
        Self::new()
    }
}
