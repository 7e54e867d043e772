//! # Environment Clock
//!
//! Pure day/night model: wall-clock time → day progress → sky color, ambient
//! intensity, sun/moon positions, starfield opacity and the HUD clock.
//! Nothing here touches the ECS; `CelestialPlugin` applies the results.
//!
//! ## Table of Contents
//! 1. Sky keyframes
//! 2. EnvironmentClock — Cycle timing
//! 3. EnvironmentState — Derived quantities
//! 4. ClockReading — HH:MM display

use bevy::prelude::*;
use core::f32::consts::{FRAC_PI_2, PI};
use std::time::Duration;

/// Orbit radius of the sun and moon
pub const CELESTIAL_ORBIT_RADIUS: f32 = 300.0;
/// Vertical offset of the orbit center
pub const CELESTIAL_ORBIT_LIFT: f32 = 100.0;

/// Largest f32 strictly below 1.0
const MAX_PROGRESS: f32 = 1.0 - f32::EPSILON / 2.0;

// ============================================================================
// 1. Sky keyframes
// ============================================================================

/// Sky color at a point of the day, as HSL with every channel in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyKeyframe {
    pub time: f32,
    pub hsl: [f32; 3],
}

const fn key(time: f32, h: f32, s: f32, l: f32) -> SkyKeyframe {
    SkyKeyframe { time, hsl: [h, s, l] }
}

/// Sky keyframes, ascending by time, covering [0, 1]
pub const SKY_KEYFRAMES: [SkyKeyframe; 12] = [
    key(0.0, 0.6, 0.3, 0.05),  // midnight
    key(0.25, 0.6, 0.3, 0.05), // 06:00
    key(0.3, 0.05, 0.9, 0.35), // orange dawn
    key(0.35, 0.05, 0.7, 0.5), // yellow dawn
    key(0.45, 0.6, 0.7, 0.7),  // morning
    key(0.5, 0.6, 0.7, 0.75),  // noon
    key(0.6, 0.6, 0.7, 0.8),
    key(0.7, 0.6, 0.7, 0.7),   // afternoon
    key(0.75, 0.05, 0.8, 0.45), // orange dusk
    key(0.8, 0.05, 0.5, 0.25),  // red dusk
    key(0.9, 0.6, 0.4, 0.1),
    key(1.0, 0.6, 0.3, 0.05),
];

/// Interpolated sky HSL at day progress `p`.
///
/// Uses the first keyframe pair bracketing `p`; a zero-length pair yields its
/// earlier color.
pub fn sky_hsl(p: f32) -> [f32; 3] {
    for pair in SKY_KEYFRAMES.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if p < a.time || p > b.time {
            continue;
        }
        let span = b.time - a.time;
        if span <= 0.0 {
            return a.hsl;
        }
        let t = (p - a.time) / span;
        // a·(1−t) + b·t hits both endpoints exactly
        return [0, 1, 2].map(|i| a.hsl[i] * (1.0 - t) + b.hsl[i] * t);
    }
    SKY_KEYFRAMES[SKY_KEYFRAMES.len() - 1].hsl
}

// ============================================================================
// 2. EnvironmentClock — Cycle timing
// ============================================================================

/// Maps wall-clock time onto a repeating day
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentClock {
    cycle: Duration,
}

impl Default for EnvironmentClock {
    fn default() -> Self {
        Self::new(Duration::from_secs(3 * 60))
    }
}

impl EnvironmentClock {
    /// A zero cycle is treated as one second
    pub fn new(cycle: Duration) -> Self {
        let cycle = if cycle.is_zero() { Duration::from_secs(1) } else { cycle };
        Self { cycle }
    }

    pub fn cycle(&self) -> Duration {
        self.cycle
    }

    /// Fraction of the current day elapsed, in [0, 1).
    ///
    /// The modulo runs on integer nanoseconds, so `elapsed` and
    /// `elapsed + cycle` always agree.
    pub fn day_progress(&self, elapsed: Duration) -> f32 {
        let cycle = self.cycle.as_nanos();
        let into_day = elapsed.as_nanos() % cycle;
        let p = (into_day as f64 / cycle as f64) as f32;
        p.min(MAX_PROGRESS)
    }

    /// Everything derived from the time of day
    pub fn state_at(&self, elapsed: Duration) -> EnvironmentState {
        EnvironmentState::at(self.day_progress(elapsed))
    }
}

// ============================================================================
// 3. EnvironmentState — Derived quantities
// ============================================================================

/// Snapshot of the environment at one day progress
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentState {
    pub day_progress: f32,
    pub sky_hsl: [f32; 3],
    /// Ambient light intensity in [0.2, 0.8]
    pub ambient_intensity: f32,
    pub sun_position: Vec3,
    pub moon_position: Vec3,
    /// `None` while the starfield is hidden
    pub star_opacity: Option<f32>,
    pub clock: ClockReading,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self::at(0.0)
    }
}

impl EnvironmentState {
    pub fn at(p: f32) -> Self {
        let (sun_position, moon_position) = celestial_positions(p);
        Self {
            day_progress: p,
            sky_hsl: sky_hsl(p),
            ambient_intensity: ambient_intensity(p),
            sun_position,
            moon_position,
            star_opacity: star_opacity(p),
            clock: ClockReading::at(p),
        }
    }

    /// Sky (and fog) color
    pub fn sky_color(&self) -> Color {
        let [h, s, l] = self.sky_hsl;
        Color::hsl(h * 360.0, s, l)
    }

    pub fn stars_visible(&self) -> bool {
        self.star_opacity.is_some()
    }
}

/// Sun angle for day progress `p`: half a turn per day
fn sun_angle(p: f32) -> f32 {
    p * PI
}

fn orbit_point(angle: f32) -> Vec3 {
    Vec3::new(
        (angle - FRAC_PI_2).cos() * CELESTIAL_ORBIT_RADIUS,
        (angle - FRAC_PI_2).sin() * CELESTIAL_ORBIT_RADIUS + CELESTIAL_ORBIT_LIFT,
        0.0,
    )
}

/// Sun and moon positions; the moon sits opposite the sun
pub fn celestial_positions(p: f32) -> (Vec3, Vec3) {
    let angle = sun_angle(p);
    (orbit_point(angle), orbit_point(angle + PI))
}

pub fn ambient_intensity(p: f32) -> f32 {
    0.2 + sun_angle(p).sin().max(0.0) * 0.6
}

/// Starfield opacity, or `None` between 06:00 and 18:00 inclusive
pub fn star_opacity(p: f32) -> Option<f32> {
    if p < 0.25 {
        Some(((p / 0.25) * PI + PI).sin() * 0.5 + 0.5)
    } else if p > 0.75 {
        Some((((p - 0.75) / 0.25) * PI).sin() * 0.5 + 0.5)
    } else {
        None
    }
}

// ============================================================================
// 4. ClockReading — HH:MM display
// ============================================================================

/// In-world time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    pub hour: u32,
    pub minute: u32,
}

impl ClockReading {
    pub fn at(p: f32) -> Self {
        let hours = p * 24.0;
        let hour = (hours.floor() as u32).min(23);
        let minute = (((hours - hour as f32) * 60.0).floor() as u32).min(59);
        Self { hour, minute }
    }

    /// Daytime is 06:00 up to (not including) 18:00
    pub fn is_day(&self) -> bool {
        (6..18).contains(&self.hour)
    }

    pub fn period_label(&self) -> &'static str {
        if self.is_day() { "Día" } else { "Noche" }
    }
}

impl core::fmt::Display for ClockReading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}:{:02} ({})", self.hour, self.minute, self.period_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noon() {
        let state = EnvironmentState::at(0.5);
        assert!((state.ambient_intensity - 0.8).abs() < 1e-6);
        assert_eq!(state.sky_hsl, [0.6, 0.7, 0.75]);
        assert!(!state.stars_visible());
        assert_eq!(state.clock.to_string(), "12:00 (Día)");
        assert!((state.sun_position - Vec3::new(300.0, 100.0, 0.0)).length() < 1e-3);
        assert!((state.moon_position - Vec3::new(-300.0, 100.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_midnight() {
        let state = EnvironmentState::at(0.0);
        assert!((state.ambient_intensity - 0.2).abs() < 1e-6);
        assert_eq!(state.sky_hsl, [0.6, 0.3, 0.05]);
        assert!((state.star_opacity.unwrap() - 0.5).abs() < 1e-6);
        assert_eq!(state.clock.to_string(), "00:00 (Noche)");
        assert!((state.sun_position - Vec3::new(0.0, -200.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_keyframes_are_hit_exactly() {
        for key in SKY_KEYFRAMES.iter().skip(1) {
            assert_eq!(sky_hsl(key.time), key.hsl, "keyframe at {}", key.time);
        }
    }

    #[test]
    fn test_sky_interpolates_between_keyframes() {
        let [h, s, l] = sky_hsl(0.55);
        assert!((h - 0.6).abs() < 1e-6);
        assert!((s - 0.7).abs() < 1e-6);
        assert!((l - 0.775).abs() < 1e-5);
    }

    #[test]
    fn test_progress_repeats_every_cycle() {
        let clock = EnvironmentClock::new(Duration::from_secs(180));
        let t = Duration::from_millis(123_456);
        assert_eq!(clock.day_progress(t), clock.day_progress(t + clock.cycle()));
        assert_eq!(clock.day_progress(Duration::from_secs(90)), 0.5);
        assert_eq!(clock.day_progress(Duration::from_secs(180)), 0.0);
    }

    #[test]
    fn test_progress_stays_below_one() {
        let clock = EnvironmentClock::new(Duration::from_secs(180));
        let p = clock.day_progress(Duration::from_secs(180) - Duration::from_nanos(1));
        assert!(p < 1.0);
        assert_eq!(ClockReading::at(p).to_string(), "23:59 (Noche)");
    }

    #[test]
    fn test_zero_cycle_does_not_divide_by_zero() {
        let clock = EnvironmentClock::new(Duration::ZERO);
        assert_eq!(clock.cycle(), Duration::from_secs(1));
        assert!((clock.day_progress(Duration::from_millis(2500)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_stars_hidden_through_the_day() {
        assert!(star_opacity(0.25).is_none());
        assert!(star_opacity(0.75).is_none());
        assert!(star_opacity(0.6).is_none());
        let dusk = star_opacity(0.875).unwrap();
        assert!((dusk - 1.0).abs() < 1e-6);
        for p in [0.01, 0.1, 0.2, 0.8, 0.9, 0.99] {
            let o = star_opacity(p).unwrap();
            assert!((0.0..=1.0).contains(&o));
        }
    }

    #[test]
    fn test_day_boundaries() {
        assert_eq!(ClockReading::at(0.25).to_string(), "06:00 (Día)");
        assert_eq!(ClockReading::at(0.75).to_string(), "18:00 (Noche)");
        assert!(!ClockReading { hour: 5, minute: 59 }.is_day());
        assert!(ClockReading { hour: 17, minute: 59 }.is_day());
    }

    #[test]
    fn test_ambient_range() {
        for i in 0..100 {
            let a = ambient_intensity(i as f32 / 100.0);
            assert!((0.2..=0.8 + 1e-6).contains(&a));
        }
    }
}
