//! Display assets per mood category

use crate::models::MoodCategory;

const TWEMOJI_BASE: &str = "https://twemoji.maxcdn.com/v/latest/72x72";

/// Candidate images and the text fallback for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodAssets {
    pub category: MoodCategory,
    /// Twemoji codepoints, tried in order
    codepoints: [&'static str; 3],
    pub glyph: &'static str,
    pub description: &'static str,
}

impl MoodAssets {
    /// Candidate image URLs in preference order
    pub fn urls(&self) -> Vec<String> {
        self.codepoints
            .iter()
            .map(|cp| format!("{}/{}.png", TWEMOJI_BASE, cp))
            .collect()
    }
}

pub fn assets_for(category: MoodCategory) -> MoodAssets {
    let (codepoints, glyph, description) = match category {
        MoodCategory::Ecstatic => (["1f929", "1f60d", "1f973"], "🤩", "Perfect code quality"),
        MoodCategory::Happy => (["1f60a", "1f604", "1f642"], "😊", "Good code quality"),
        MoodCategory::Neutral => (["1f610", "1f914", "1f611"], "😐", "Average code quality"),
        MoodCategory::Concerned => (["1f61f", "1f615", "1f928"], "😟", "Some issues detected"),
        MoodCategory::Sad => (["1f622", "1f61e", "1f614"], "😢", "Many issues detected"),
        MoodCategory::Devastated => (["1f62d", "1f631", "1f480"], "😭", "Critical issues detected"),
    };

    MoodAssets {
        category,
        codepoints,
        glyph,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_assets() {
        for category in MoodCategory::ALL {
            let assets = assets_for(category);
            assert_eq!(assets.category, category);
            assert_eq!(assets.urls().len(), 3);
            assert!(!assets.glyph.is_empty());
            assert!(!assets.description.is_empty());
        }
    }

    #[test]
    fn test_url_shape() {
        let urls = assets_for(MoodCategory::Devastated).urls();
        assert_eq!(urls[2], "https://twemoji.maxcdn.com/v/latest/72x72/1f480.png");
    }

    #[test]
    fn test_urls_are_distinct_across_categories() {
        let mut all: Vec<String> = MoodCategory::ALL
            .into_iter()
            .flat_map(|c| assets_for(c).urls())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
