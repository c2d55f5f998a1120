//! Volume and mute handling

/// Volume restored on unmute when nothing audible was remembered
pub const DEFAULT_UNMUTE_VOLUME: f64 = 0.75;

/// Volume level with mute memory
///
/// Muting zeroes the level and remembers the previous one; unmuting
/// restores it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    level: f64,
    muted: bool,
    pre_mute: f64,
}

impl Volume {
    /// Create with an initial level (clamped to [0, 1])
    pub fn new(level: f64) -> Self {
        let level = clamp_level(level);
        Self {
            level,
            muted: level == 0.0,
            pre_mute: level,
        }
    }

    /// Current level in [0, 1]
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Whether the level is zero
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level restored by the next unmute
    pub fn pre_mute_level(&self) -> f64 {
        self.pre_mute
    }

    /// Set the level (clamped to [0, 1])
    pub fn set(&mut self, level: f64) {
        self.level = clamp_level(level);
        self.muted = self.level == 0.0;
        if !self.muted {
            self.pre_mute = self.level;
        }
    }

    /// Toggle between silent and the remembered level
    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.level = if self.pre_mute > 0.0 {
                self.pre_mute
            } else {
                DEFAULT_UNMUTE_VOLUME
            };
            self.muted = false;
        } else {
            self.pre_mute = self.level;
            self.level = 0.0;
            self.muted = true;
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(DEFAULT_UNMUTE_VOLUME)
    }
}

fn clamp_level(level: f64) -> f64 {
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps() {
        let mut volume = Volume::default();
        volume.set(1.5);
        assert_eq!(volume.level(), 1.0);
        volume.set(-0.2);
        assert_eq!(volume.level(), 0.0);
        assert!(volume.is_muted());
        volume.set(f64::NAN);
        assert_eq!(volume.level(), 0.0);
    }

    #[test]
    fn mute_round_trip() {
        let mut volume = Volume::default();
        volume.set(0.6);

        volume.toggle_mute();
        assert_eq!(volume.level(), 0.0);
        assert!(volume.is_muted());

        volume.toggle_mute();
        assert_eq!(volume.level(), 0.6);
        assert!(!volume.is_muted());
    }

    #[test]
    fn unmute_from_zero_uses_default() {
        let mut volume = Volume::new(0.0);
        assert!(volume.is_muted());

        volume.toggle_mute();
        assert_eq!(volume.level(), DEFAULT_UNMUTE_VOLUME);
    }

    #[test]
    fn dragging_to_zero_then_unmute_restores_last_audible() {
        let mut volume = Volume::new(0.4);
        volume.set(0.0);
        volume.toggle_mute();
        assert_eq!(volume.level(), 0.4);
    }
}
