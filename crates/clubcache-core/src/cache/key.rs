//! Cache keys composed from ordered dimensions.
//!
//! A key is the tuple of its dimension values rather than a joined string,
//! so a value can never collide with another through the separator. Trailing
//! absent dimensions are dropped: `compose([Some(7)])` and
//! `compose([Some(7), None])` are the same partition ("all seasons" and
//! "season unspecified" share one cache slot).

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    parts: Vec<Option<i64>>,
}

impl CacheKey {
    /// The key with no dimensions: a whole unpartitioned resource, or every key as a prefix.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn compose<I>(dimensions: I) -> Self
    where
        I: IntoIterator<Item = Option<i64>>,
    {
        let mut parts: Vec<Option<i64>> = dimensions.into_iter().collect();
        while let Some(None) = parts.last() {
            parts.pop();
        }
        Self { parts }
    }

    pub fn is_root(&self) -> bool {
        self.parts.is_empty()
    }

    /// Dimension `index`, or None when absent or beyond the key's length.
    pub fn dimension(&self, index: usize) -> Option<i64> {
        self.parts.get(index).copied().flatten()
    }

    /// True if `prefix` names this key or a partial key this one was derived from.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.parts.starts_with(&prefix.parts)
    }
}

impl From<i64> for CacheKey {
    fn from(value: i64) -> Self {
        Self::compose([Some(value)])
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "all");
        }
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, "-")?;
            }
            match part {
                Some(value) => write!(f, "{}", value)?,
                None => write!(f, "*")?,
            }
        }
        Ok(())
    }
}
