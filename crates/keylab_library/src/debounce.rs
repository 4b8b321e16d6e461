use std::time::{Duration, Instant};

pub const DEFAULT_SETTLE: Duration = Duration::from_millis(50);

/// A debounced level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Accepts a level change only once the raw level has stayed put for the
/// settle interval. Press and release are filtered the same way.
#[derive(Debug, Clone)]
pub struct Debouncer {
    settle: Duration,
    stable: bool,
    candidate: bool,
    candidate_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            stable: false,
            candidate: false,
            candidate_since: None,
        }
    }

    /// Starts from an already known level, e.g. a button held during boot,
    /// without reporting it as an edge.
    pub fn with_level(settle: Duration, level: bool) -> Self {
        Self {
            stable: level,
            candidate: level,
            ..Self::new(settle)
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.stable
    }

    pub fn update(&mut self, level: bool, now: Instant) -> Option<Edge> {
        if level != self.candidate || self.candidate_since.is_none() {
            self.candidate = level;
            self.candidate_since = Some(now);
        }
        if self.candidate == self.stable {
            return None;
        }

        let since = self.candidate_since?;
        if now.saturating_duration_since(since) < self.settle {
            return None;
        }
        self.stable = self.candidate;
        Some(if self.stable {
            Edge::Pressed
        } else {
            Edge::Released
        })
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn bouncing_level_produces_nothing() {
        let t0 = Instant::now();
        let mut d = Debouncer::default();
        let mut edges = 0;
        for i in 0..100u64 {
            if d.update(i % 2 == 0, t0 + ms(i * 10)).is_some() {
                edges += 1;
            }
        }
        assert_eq!(edges, 0);
        assert!(!d.is_pressed());
    }

    #[test]
    fn stable_level_produces_one_edge() {
        let t0 = Instant::now();
        let mut d = Debouncer::default();
        let edges: Vec<_> = (0..20u64)
            .filter_map(|i| d.update(true, t0 + ms(i * 10)))
            .collect();
        assert_eq!(edges, vec![Edge::Pressed]);
        assert!(d.is_pressed());
    }

    #[test]
    fn release_is_debounced_too() {
        let t0 = Instant::now();
        let mut d = Debouncer::with_level(DEFAULT_SETTLE, true);
        assert_eq!(d.update(false, t0), None);
        assert_eq!(d.update(true, t0 + ms(20)), None);
        assert_eq!(d.update(false, t0 + ms(30)), None);
        assert_eq!(d.update(false, t0 + ms(60)), None);
        assert_eq!(d.update(false, t0 + ms(80)), Some(Edge::Released));
        assert_eq!(d.update(false, t0 + ms(200)), None);
    }

    #[test]
    fn initial_level_is_not_an_edge() {
        let t0 = Instant::now();
        let mut d = Debouncer::with_level(DEFAULT_SETTLE, true);
        assert_eq!(d.update(true, t0), None);
        assert_eq!(d.update(true, t0 + ms(500)), None);
    }
}
