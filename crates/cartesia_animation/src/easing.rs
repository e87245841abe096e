//! Easing functions for animations

use cartesia_core::Ease;

/// Overshoot of the default back easing
pub const BACK_OVERSHOOT: f32 = 1.70158;

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInOutSine,
    /// Settles past the target and springs back. Larger overshoot, bigger swing.
    EaseOutBack { overshoot: f32 },
}

impl Easing {
    /// Back easing with the standard overshoot
    pub const EASE_OUT_BACK: Easing = Easing::EaseOutBack {
        overshoot: BACK_OVERSHOOT,
    };

    /// Gentle overshoot used for arrows growing into place
    pub const SOFT_BACK: Easing = Easing::EaseOutBack { overshoot: 0.6 };

    /// Punchy overshoot used for labels popping in
    pub const POP_BACK: Easing = Easing::EaseOutBack { overshoot: 1.5 };

    pub const fn out_back(overshoot: f32) -> Self {
        Easing::EaseOutBack { overshoot }
    }

    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInOutSine => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
            Easing::EaseOutBack { overshoot } => {
                let s = *overshoot;
                let u = t - 1.0;
                1.0 + (s + 1.0) * u * u * u + s * u * u
            }
        }
    }
}

impl Ease for Easing {
    fn ease(&self, t: f32) -> f32 {
        self.apply(t)
    }
}
