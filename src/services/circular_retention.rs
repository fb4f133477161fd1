// Circular Retention
// Keeps the most recent N clips of a circular recording
//
// A circular recording is split into clips of `period` length. Once a clip
// reaches the period the recorder starts a new one, and clips beyond the
// configured count are dropped oldest first.

use std::collections::VecDeque;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::models::RecorderPreferences;

/// Retention window state for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircularRetentionState {
    pub period_secs: u64,
    pub max_clips: usize,
    pub clips: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CircularRetention {
    period: Duration,
    max_clips: usize,
    clips: VecDeque<String>,
}

impl CircularRetention {
    pub fn new(period_secs: i64, max_clips: i64) -> Self {
        let period_secs = period_secs.max(1) as u64;
        let max_clips = usize::try_from(max_clips.max(1)).unwrap_or(usize::MAX);
        Self {
            period: Duration::from_secs(period_secs),
            max_clips,
            clips: VecDeque::new(),
        }
    }

    pub fn from_preferences(prefs: &RecorderPreferences) -> Self {
        Self::new(prefs.circular_period_secs, prefs.circular_clip_count)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn max_clips(&self) -> usize {
        self.max_clips
    }

    /// Whether the clip being recorded has reached its period
    pub fn should_rotate(&self, elapsed: Duration) -> bool {
        elapsed >= self.period
    }

    /// Add a finished clip. Returns the clips that fell out of the window, oldest first.
    pub fn push_clip(&mut self, uri: impl Into<String>) -> Vec<String> {
        self.clips.push_back(uri.into());

        let mut dropped = Vec::new();
        while self.clips.len() > self.max_clips {
            if let Some(old) = self.clips.pop_front() {
                log::debug!("Dropping circular clip {}", old);
                dropped.push(old);
            }
        }
        dropped
    }

    /// Retained clips, oldest first
    pub fn clips(&self) -> impl Iterator<Item = &str> {
        self.clips.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn reset(&mut self) {
        self.clips.clear();
    }

    pub fn state(&self) -> CircularRetentionState {
        CircularRetentionState {
            period_secs: self.period.as_secs(),
            max_clips: self.max_clips,
            clips: self.clips.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_keeps_newest_clips() {
        let mut window = CircularRetention::new(60, 2);
        assert!(window.push_clip("a").is_empty());
        assert!(window.push_clip("b").is_empty());
        assert_eq!(window.push_clip("c"), vec!["a".to_string()]);

        let clips: Vec<&str> = window.clips().collect();
        assert_eq!(clips, vec!["b", "c"]);
    }

    #[test]
    fn test_should_rotate_at_period() {
        let window = CircularRetention::new(90, 3);
        assert!(!window.should_rotate(Duration::from_secs(89)));
        assert!(window.should_rotate(Duration::from_secs(90)));
    }

    #[test]
    fn test_from_preferences_clamps_invalid_values() {
        let prefs = RecorderPreferences {
            circular_period_secs: 0,
            circular_clip_count: -4,
            ..RecorderPreferences::default()
        };
        let window = CircularRetention::from_preferences(&prefs);
        assert_eq!(window.period(), Duration::from_secs(1));
        assert_eq!(window.max_clips(), 1);
    }

    #[test]
    fn test_defaults_and_reset() {
        let mut window = CircularRetention::from_preferences(&RecorderPreferences::default());
        assert_eq!(window.period(), Duration::from_secs(3600));
        assert_eq!(window.max_clips(), 3);

        window.push_clip("x");
        assert_eq!(window.state().clips, vec!["x".to_string()]);
        window.reset();
        assert!(window.is_empty());
    }
}
