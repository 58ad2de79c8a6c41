use std::time::Duration;

use tokio::time::Instant;

use super::Freshness;

/// One cached value and the moment it was stored.
///
/// Timestamps are monotonic tokio instants, so tests can move time with a paused clock.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub cached_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.cached_at.elapsed()
    }

    pub fn is_fresh(&self, freshness: &Freshness) -> bool {
        freshness.admits(self.age())
    }

    pub fn age_display(&self) -> String {
        age_display(self.age())
    }
}

/// Human-readable age: "just now", "5m ago", "2h ago", "3d ago".
pub fn age_display(age: Duration) -> String {
    let minutes = age.as_secs() / 60;
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            // Round up: 1h 30m+ becomes 2h
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}
