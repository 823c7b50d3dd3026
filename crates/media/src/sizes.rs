//! The closed set of thumbnail size classes.

/// Thumbnail size classes produced by the pipeline, named by pixel edge.
///
/// The set is closed: a payload key outside it is skipped, never stored.
/// Discriminants double as the `thumbnails.size_type` column value.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThumbnailSize {
    S48 = 48,
    S100 = 100,
    S144 = 144,
    S205 = 205,
    S320 = 320,
    S610 = 610,
    S960 = 960,
}

impl ThumbnailSize {
    /// Every size class, ascending.
    pub const ALL: [ThumbnailSize; 7] = [
        ThumbnailSize::S48,
        ThumbnailSize::S100,
        ThumbnailSize::S144,
        ThumbnailSize::S205,
        ThumbnailSize::S320,
        ThumbnailSize::S610,
        ThumbnailSize::S960,
    ];

    /// The `size_type` column value.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Look up a size class by column value.
    pub fn from_id(id: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Parse a payload key like `"205"`.
    pub fn from_key(key: &str) -> Option<Self> {
        key.parse::<i16>().ok().and_then(Self::from_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_has_seven_ascending_sizes() {
        assert_eq!(ThumbnailSize::ALL.len(), 7);
        let ids: Vec<i16> = ThumbnailSize::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![48, 100, 144, 205, 320, 610, 960]);
    }

    #[test]
    fn keys_parse_only_inside_the_set() {
        assert_eq!(ThumbnailSize::from_key("48"), Some(ThumbnailSize::S48));
        assert_eq!(ThumbnailSize::from_key("960"), Some(ThumbnailSize::S960));
        assert_eq!(ThumbnailSize::from_key("49"), None);
        assert_eq!(ThumbnailSize::from_key(""), None);
        assert_eq!(ThumbnailSize::from_key("large"), None);
    }
}
