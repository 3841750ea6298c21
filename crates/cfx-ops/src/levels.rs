//! Level buckets for `lock-channels-to-levels`.
//!
//! A sorted list of target levels splits `0..=255` into buckets whose
//! boundaries sit halfway between neighbouring levels. The first bucket
//! starts at 0 and the last ends at 255. A value on a shared boundary
//! belongs to the lower bucket.

use cfx_core::clamp_channel;

/// Precomputed `(start, end, level)` buckets for one channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelBuckets {
    buckets: Vec<(u8, u8, u8)>,
}

impl LevelBuckets {
    /// Builds buckets from unsorted levels. Non-finite entries are dropped.
    ///
    /// ```rust
    /// use cfx_ops::levels::LevelBuckets;
    ///
    /// let b = LevelBuckets::new(&[200.0, 0.0, 100.0]);
    /// assert_eq!(b.map(49), 0);
    /// assert_eq!(b.map(50), 0);
    /// assert_eq!(b.map(51), 100);
    /// assert_eq!(b.map(255), 200);
    /// ```
    pub fn new(levels: &[f64]) -> Self {
        let mut v: Vec<f64> = levels
            .iter()
            .copied()
            .filter(|l| l.is_finite())
            .map(|l| l.clamp(0.0, 255.0).floor())
            .collect();
        v.sort_by(f64::total_cmp);

        let n = v.len();
        let buckets = (0..n)
            .map(|i| {
                let start = if i == 0 { 0.0 } else { (v[i - 1] + (v[i] - v[i - 1]) / 2.0).ceil() };
                let end = if i == n - 1 { 255.0 } else { (v[i] + (v[i + 1] - v[i]) / 2.0).floor() };
                (clamp_channel(start), clamp_channel(end), clamp_channel(v[i]))
            })
            .collect();
        Self { buckets }
    }

    /// True when no levels were given, so [`map`](Self::map) is the identity.
    pub fn is_identity(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Maps `v` onto its bucket's level.
    pub fn map(&self, v: u8) -> u8 {
        self.buckets
            .iter()
            .find(|(start, end, _)| v >= *start && v <= *end)
            .map_or(v, |(_, _, level)| *level)
    }
}
