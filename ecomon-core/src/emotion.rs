//! Emotion Model — five bounded channels (trust, joy, curiosity, worry, pride).
//!
//! Every channel is an integer in `[0, 100]`. There is no setter: the only
//! way to change a state is [`EmotionalState::apply_delta`], which adds the
//! signed deltas and clamps, so no channel can ever be observed out of range.
//! Deserialized states are clamped on the way in for the same reason.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of every channel.
pub const CHANNEL_MIN: u8 = 0;
/// Upper bound of every channel.
pub const CHANNEL_MAX: u8 = 100;
/// Value every channel starts at when a companion is created.
pub const CHANNEL_MIDPOINT: u8 = 50;

/// One named emotion channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Confidence in the guardian.
    Trust,
    /// Happiness.
    Joy,
    /// Appetite for new things.
    Curiosity,
    /// Anxiety — the only channel where high is bad.
    Worry,
    /// Sense of accomplishment.
    Pride,
}

impl Channel {
    /// All channels in canonical order.
    pub const ALL: [Self; 5] = [Self::Trust, Self::Joy, Self::Curiosity, Self::Worry, Self::Pride];
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trust => "trust",
            Self::Joy => "joy",
            Self::Curiosity => "curiosity",
            Self::Worry => "worry",
            Self::Pride => "pride",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// EmotionDelta
// ---------------------------------------------------------------------------

/// A signed change per channel. A zero entry leaves the channel untouched,
/// which makes this the "partial map" form of a delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionDelta {
    /// Trust change.
    pub trust: i32,
    /// Joy change.
    pub joy: i32,
    /// Curiosity change.
    pub curiosity: i32,
    /// Worry change.
    pub worry: i32,
    /// Pride change.
    pub pride: i32,
}

impl EmotionDelta {
    /// The empty delta.
    pub const ZERO: Self = Self {
        trust: 0,
        joy: 0,
        curiosity: 0,
        worry: 0,
        pride: 0,
    };

    /// Start building a delta from zero.
    #[must_use]
    pub const fn new() -> Self {
        Self::ZERO
    }

    /// Set the trust change.
    #[must_use]
    pub const fn trust(mut self, v: i32) -> Self {
        self.trust = v;
        self
    }

    /// Set the joy change.
    #[must_use]
    pub const fn joy(mut self, v: i32) -> Self {
        self.joy = v;
        self
    }

    /// Set the curiosity change.
    #[must_use]
    pub const fn curiosity(mut self, v: i32) -> Self {
        self.curiosity = v;
        self
    }

    /// Set the worry change.
    #[must_use]
    pub const fn worry(mut self, v: i32) -> Self {
        self.worry = v;
        self
    }

    /// Set the pride change.
    #[must_use]
    pub const fn pride(mut self, v: i32) -> Self {
        self.pride = v;
        self
    }

    /// The change for one channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> i32 {
        match channel {
            Channel::Trust => self.trust,
            Channel::Joy => self.joy,
            Channel::Curiosity => self.curiosity,
            Channel::Worry => self.worry,
            Channel::Pride => self.pride,
        }
    }

    /// Whether every channel is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Multiply every channel by `factor`, rounding to the nearest integer.
    ///
    /// Used to scale verified-action reactions by classifier confidence.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn scaled(&self, factor: f64) -> Self {
        let s = |v: i32| (f64::from(v) * factor).round() as i32;
        Self {
            trust: s(self.trust),
            joy: s(self.joy),
            curiosity: s(self.curiosity),
            worry: s(self.worry),
            pride: s(self.pride),
        }
    }

    /// Multiply every channel by a whole count (e.g. days elapsed), saturating.
    #[must_use]
    pub fn times(&self, count: u32) -> Self {
        let n = i32::try_from(count).unwrap_or(i32::MAX);
        Self {
            trust: self.trust.saturating_mul(n),
            joy: self.joy.saturating_mul(n),
            curiosity: self.curiosity.saturating_mul(n),
            worry: self.worry.saturating_mul(n),
            pride: self.pride.saturating_mul(n),
        }
    }
}

// ---------------------------------------------------------------------------
// EmotionalState
// ---------------------------------------------------------------------------

/// The companion's emotional state. All channels stay within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "EmotionRecord")]
pub struct EmotionalState {
    trust: u8,
    joy: u8,
    curiosity: u8,
    worry: u8,
    pride: u8,
}

/// Unchecked wire form; clamped into an [`EmotionalState`] on deserialize.
#[derive(Deserialize)]
struct EmotionRecord {
    trust: i64,
    joy: i64,
    curiosity: i64,
    worry: i64,
    pride: i64,
}

impl From<EmotionRecord> for EmotionalState {
    fn from(r: EmotionRecord) -> Self {
        Self {
            trust: clamp_i64(r.trust),
            joy: clamp_i64(r.joy),
            curiosity: clamp_i64(r.curiosity),
            worry: clamp_i64(r.worry),
            pride: clamp_i64(r.pride),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_i64(v: i64) -> u8 {
    v.clamp(i64::from(CHANNEL_MIN), i64::from(CHANNEL_MAX)) as u8
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn shift(value: u8, delta: i32) -> u8 {
    i32::from(value)
        .saturating_add(delta)
        .clamp(i32::from(CHANNEL_MIN), i32::from(CHANNEL_MAX)) as u8
}

impl EmotionalState {
    /// Every channel at the midpoint (50).
    pub const NEUTRAL: Self = Self {
        trust: CHANNEL_MIDPOINT,
        joy: CHANNEL_MIDPOINT,
        curiosity: CHANNEL_MIDPOINT,
        worry: CHANNEL_MIDPOINT,
        pride: CHANNEL_MIDPOINT,
    };

    /// Build a state from raw values, clamping each into range.
    #[must_use]
    pub fn new(trust: i32, joy: i32, curiosity: i32, worry: i32, pride: i32) -> Self {
        Self::NEUTRAL.apply_delta(&EmotionDelta {
            trust: trust.saturating_sub(i32::from(CHANNEL_MIDPOINT)),
            joy: joy.saturating_sub(i32::from(CHANNEL_MIDPOINT)),
            curiosity: curiosity.saturating_sub(i32::from(CHANNEL_MIDPOINT)),
            worry: worry.saturating_sub(i32::from(CHANNEL_MIDPOINT)),
            pride: pride.saturating_sub(i32::from(CHANNEL_MIDPOINT)),
        })
    }

    /// Trust channel.
    #[must_use]
    pub fn trust(&self) -> u8 {
        self.trust
    }

    /// Joy channel.
    #[must_use]
    pub fn joy(&self) -> u8 {
        self.joy
    }

    /// Curiosity channel.
    #[must_use]
    pub fn curiosity(&self) -> u8 {
        self.curiosity
    }

    /// Worry channel.
    #[must_use]
    pub fn worry(&self) -> u8 {
        self.worry
    }

    /// Pride channel.
    #[must_use]
    pub fn pride(&self) -> u8 {
        self.pride
    }

    /// Read one channel by name.
    #[must_use]
    pub fn get(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Trust => self.trust,
            Channel::Joy => self.joy,
            Channel::Curiosity => self.curiosity,
            Channel::Worry => self.worry,
            Channel::Pride => self.pride,
        }
    }

    /// Add each channel's delta to the *pre-call* value, then clamp.
    ///
    /// Channels are independent: no channel's result depends on another's
    /// post-clamp value.
    #[must_use]
    pub fn apply_delta(&self, delta: &EmotionDelta) -> Self {
        Self {
            trust: shift(self.trust, delta.trust),
            joy: shift(self.joy, delta.joy),
            curiosity: shift(self.curiosity, delta.curiosity),
            worry: shift(self.worry, delta.worry),
            pride: shift(self.pride, delta.pride),
        }
    }

    /// In-place form of [`apply_delta`](Self::apply_delta).
    pub fn apply(&mut self, delta: &EmotionDelta) {
        *self = self.apply_delta(delta);
    }

    /// Blend two states with a weight (0.0 = self, 1.0 = other), rounding
    /// each channel to the nearest integer.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn blend(&self, other: &Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| {
            let a = f64::from(a);
            (a + (f64::from(b) - a) * t).round() as i32
        };
        Self::new(
            mix(self.trust, other.trust),
            mix(self.joy, other.joy),
            mix(self.curiosity, other.curiosity),
            mix(self.worry, other.worry),
            mix(self.pride, other.pride),
        )
    }

    /// Sum used by the mood classifier's fallback rule: worry is inverted so
    /// that every term reads "higher is better".
    #[must_use]
    pub fn wellbeing_sum(&self) -> u32 {
        u32::from(self.trust)
            + u32::from(self.joy)
            + u32::from(self.curiosity)
            + u32::from(CHANNEL_MAX - self.worry)
            + u32::from(self.pride)
    }
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trust {} / joy {} / curiosity {} / worry {} / pride {}",
            self.trust, self.joy, self.curiosity, self.worry, self.pride
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_midpoint() {
        let s = EmotionalState::default();
        for ch in Channel::ALL {
            assert_eq!(s.get(ch), 50);
        }
    }

    #[test]
    fn delta_adds_and_clamps() {
        let s = EmotionalState::NEUTRAL.apply_delta(&EmotionDelta::new().joy(70).worry(-80));
        assert_eq!(s.joy(), 100);
        assert_eq!(s.worry(), 0);
        assert_eq!(s.trust(), 50);
    }

    #[test]
    fn omitted_channels_unchanged() {
        let s = EmotionalState::new(10, 20, 30, 40, 60);
        let out = s.apply_delta(&EmotionDelta::new().pride(5));
        assert_eq!(out.trust(), 10);
        assert_eq!(out.joy(), 20);
        assert_eq!(out.curiosity(), 30);
        assert_eq!(out.worry(), 40);
        assert_eq!(out.pride(), 65);
    }

    #[test]
    fn extreme_deltas_do_not_overflow() {
        let s = EmotionalState::NEUTRAL
            .apply_delta(&EmotionDelta::new().trust(i32::MAX).joy(i32::MIN));
        assert_eq!(s.trust(), 100);
        assert_eq!(s.joy(), 0);
    }

    #[test]
    fn scaled_rounds_to_nearest() {
        let d = EmotionDelta::new().joy(10).pride(15).trust(5).scaled(0.5);
        assert_eq!(d.joy, 5);
        assert_eq!(d.pride, 8);
        assert_eq!(d.trust, 3);
    }

    #[test]
    fn times_multiplies_every_channel() {
        let d = EmotionDelta::new().worry(5).trust(-2).times(3);
        assert_eq!(d.worry, 15);
        assert_eq!(d.trust, -6);
    }

    #[test]
    fn blend_interpolates() {
        let a = EmotionalState::new(0, 0, 0, 0, 0);
        let b = EmotionalState::new(100, 100, 100, 100, 100);
        let mid = a.blend(&b, 0.5);
        assert_eq!(mid.joy(), 50);
        assert_eq!(a.blend(&b, 2.0), b);
        assert_eq!(a.blend(&b, f64::NAN), a);
    }

    #[test]
    fn deserialize_clamps_out_of_range() {
        let s: EmotionalState = serde_json::from_str(
            r#"{"trust":150,"joy":-3,"curiosity":50,"worry":50,"pride":50}"#,
        )
        .expect("valid json");
        assert_eq!(s.trust(), 100);
        assert_eq!(s.joy(), 0);
    }

    #[test]
    fn wellbeing_inverts_worry() {
        let s = EmotionalState::new(50, 50, 50, 100, 50);
        assert_eq!(s.wellbeing_sum(), 200);
    }
}
