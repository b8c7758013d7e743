//! Damped harmonic oscillator interpolation.
//!
//! The spring integrates until displacement and velocity both fall under
//! their rest thresholds, so the frame count depends on the data rather
//! than on a configured duration. Closed-form solutions are used for the
//! underdamped, critically damped and overdamped regimes.

use super::{Behavior, BehaviorKind, FPS, Frame, FrameOptions, Frames, delay_frames};

/// Upper bound on generated frames; a guard against springs configured
/// so loosely they never settle.
const MAX_SPRING_FRAMES: usize = 10_000;

/// Physical parameters of the spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringOptions {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    /// Snap to the target the moment the value crosses it.
    pub overshoot_clamping: bool,
    /// Keep damping ratios above 1 instead of clamping to critical.
    pub allows_overdamping: bool,
    pub rest_velocity_threshold: f64,
    pub rest_displacement_threshold: f64,
}

impl Default for SpringOptions {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 10.0,
            mass: 1.0,
            overshoot_clamping: false,
            allows_overdamping: false,
            rest_velocity_threshold: 0.001,
            rest_displacement_threshold: 0.001,
        }
    }
}

/// Spring interpolation behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringBehavior {
    options: SpringOptions,
}

impl Default for SpringBehavior {
    fn default() -> Self {
        Self::new(SpringOptions::default())
    }
}

impl SpringBehavior {
    /// # Panics
    /// Panics if mass, stiffness or damping are not greater than zero.
    pub fn new(options: SpringOptions) -> Self {
        assert!(options.mass > 0.0, "Mass value must be greater than 0");
        assert!(
            options.stiffness > 0.0,
            "Stiffness value must be greater than 0"
        );
        assert!(
            options.damping > 0.0,
            "Damping value must be greater than 0"
        );
        Self { options }
    }

    pub fn options(&self) -> &SpringOptions {
        &self.options
    }
}

impl Behavior for SpringBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Spring
    }

    fn get_frames(&self, options: &FrameOptions) -> Frames {
        // No movement and no momentum, nothing to integrate. A bare delay
        // produces no frames either.
        if options.from == options.to && options.velocity == 0.0 {
            return Box::new(std::iter::empty());
        }
        assert!(
            options.from.is_finite() && options.to.is_finite(),
            "Cannot calculate spring for non-finite values: {} -> {}",
            options.from,
            options.to
        );

        let integrator =
            SpringFrames::new(self.options, options.from, options.to, options.velocity);
        Box::new(delay_frames(options).chain(integrator))
    }
}

/// Step state of one spring integration.
struct SpringFrames {
    options: SpringOptions,
    from: f64,
    to: f64,
    /// Damping ratio (dimensionless).
    zeta: f64,
    /// Undamped angular frequency, rad/ms.
    omega0: f64,
    /// Exponential decay frequency for the underdamped regime.
    omega1: f64,
    /// Frequency of the damped oscillation for the overdamped regime.
    omega2: f64,
    /// Initial displacement at t = 0.
    x0: f64,
    /// Initial velocity.
    v0: f64,
    time_ms: f64,
    value: f64,
    velocity: f64,
    emitted: usize,
}

impl SpringFrames {
    fn new(options: SpringOptions, from: f64, to: f64, velocity: f64) -> Self {
        let SpringOptions {
            stiffness: k,
            damping: c,
            mass: m,
            ..
        } = options;

        let mut zeta = c / (2.0 * (k * m).sqrt());
        if zeta > 1.0 && !options.allows_overdamping {
            zeta = 1.0;
        }
        let omega0 = (k / m).sqrt() / 1000.0;
        let omega1 = omega0 * (1.0 - zeta * zeta).max(0.0).sqrt();
        let omega2 = omega0 * (zeta * zeta - 1.0).max(0.0).sqrt();

        Self {
            options,
            from,
            to,
            zeta,
            omega0,
            omega1,
            omega2,
            x0: to - from,
            v0: velocity,
            time_ms: 0.0,
            value: from,
            velocity,
            emitted: 0,
        }
    }

    fn is_overshooting(&self, value: f64) -> bool {
        if !self.options.overshoot_clamping {
            return false;
        }
        if self.from < self.to {
            value > self.to
        } else {
            value < self.to
        }
    }

    fn is_at_rest(&self, value: f64, velocity: f64) -> bool {
        let no_velocity = velocity.abs() <= self.options.rest_velocity_threshold;
        let no_displacement = (self.to - value).abs() <= self.options.rest_displacement_threshold;
        no_velocity && no_displacement
    }

    /// Evaluate the oscillator at time `t` (ms), snapping to the target
    /// when the spring overshoots or settles.
    fn sample(&self, t: f64) -> (f64, f64) {
        let (zeta, omega0, omega1, omega2) = (self.zeta, self.omega0, self.omega1, self.omega2);
        let (x0, v0, to) = (self.x0, self.v0, self.to);

        let (value, velocity) = if zeta < 1.0 {
            // Underdamped
            let envelope = (-zeta * omega0 * t).exp();
            let value = to
                - envelope
                    * (((v0 + zeta * omega0 * x0) / omega1) * (omega1 * t).sin()
                        + x0 * (omega1 * t).cos());
            let velocity = zeta
                * omega0
                * envelope
                * (((omega1 * t).sin() * (v0 + zeta * omega0 * x0)) / omega1
                    + x0 * (omega1 * t).cos())
                - envelope
                    * ((omega1 * t).cos() * (v0 + zeta * omega0 * x0)
                        - omega1 * x0 * (omega1 * t).sin());
            (value, velocity)
        } else if zeta == 1.0 {
            // Critically damped
            let envelope = (-omega0 * t).exp();
            let value = to - envelope * (x0 + (v0 + omega0 * x0) * t);
            let velocity = envelope * (v0 * (t * omega0 - 1.0) + t * x0 * (omega0 * omega0));
            (value, velocity)
        } else {
            // Overdamped
            let envelope = (-zeta * omega0 * t).exp();
            let value = to
                - (envelope
                    * ((v0 + zeta * omega0 * x0) * (omega2 * t).sinh()
                        + omega2 * x0 * (omega2 * t).cosh()))
                    / omega2;
            let velocity = (envelope
                * zeta
                * omega0
                * ((omega2 * t).sinh() * (v0 + zeta * omega0 * x0)
                    + x0 * omega2 * (omega2 * t).cosh()))
                / omega2
                - (envelope
                    * (omega2 * (omega2 * t).cosh() * (v0 + zeta * omega0 * x0)
                        + omega2 * omega2 * x0 * (omega2 * t).sinh()))
                    / omega2;
            (value, velocity)
        };

        if self.is_overshooting(value) || self.is_at_rest(value, velocity) {
            (to, 0.0)
        } else {
            (value, velocity)
        }
    }
}

impl Iterator for SpringFrames {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.is_at_rest(self.value, self.velocity) || self.emitted >= MAX_SPRING_FRAMES {
            return None;
        }
        let (value, velocity) = self.sample(self.time_ms);
        self.time_ms += 1.0 / FPS;
        self.value = value;
        self.velocity = velocity;
        self.emitted += 1;
        Some(Frame::new(value, velocity))
    }
}
