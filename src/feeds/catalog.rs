//! Built-in sample trends, used when running without live feeds.

use super::{merge_unique, FeedItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Animals,
    Memes,
    Toys,
    Viral,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Animals => "animals",
            Category::Memes => "memes",
            Category::Toys => "toys",
            Category::Viral => "trends",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct CatalogEntry {
    pub emoji: &'static str,
    pub title: &'static str,
    pub category: Category,
    pub description: &'static str,
    /// 0..=100
    pub heat: u8,
    pub views: &'static str,
    pub likes: &'static str,
    pub shares: &'static str,
    pub tags: &'static [&'static str],
    pub rising: bool,
}

impl FeedItem for CatalogEntry {
    fn title(&self) -> &str {
        self.title
    }

    fn popularity(&self) -> i64 {
        i64::from(self.heat)
    }

    /// Title, description, tags and category all count.
    fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.title.to_lowercase().contains(&keyword)
            || self.description.to_lowercase().contains(&keyword)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&keyword))
            || self.category.as_str().contains(&keyword)
    }
}

pub static CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        emoji: "🐱",
        title: "Cat Yoga Challenge",
        category: Category::Animals,
        description: "Cats photobombing their owners doing yoga. Peak chaos energy.",
        heat: 98,
        views: "847M",
        likes: "52M",
        shares: "8.2M",
        tags: &["#catyoga", "#petsoftiktok", "#catlife", "#funnycats"],
        rising: true,
    },
    CatalogEntry {
        emoji: "😭",
        title: "This Is Fine Dog",
        category: Category::Memes,
        description: "New wave of 'everything is fine' memes with absurdist twists.",
        heat: 94,
        views: "612M",
        likes: "38M",
        shares: "11M",
        tags: &["#thisisfine", "#memegen", "#relateable", "#xyzbca"],
        rising: false,
    },
    CatalogEntry {
        emoji: "🪄",
        title: "Magnetic Sand ASMR",
        category: Category::Toys,
        description: "Kinetic magnetic sand sculptures going absolutely viral.",
        heat: 91,
        views: "503M",
        likes: "29M",
        shares: "6.7M",
        tags: &["#magneticsand", "#asmr", "#satisfying", "#oddlysatisfying"],
        rising: false,
    },
    CatalogEntry {
        emoji: "💃",
        title: "Slow Mo Mirror Dance",
        category: Category::Viral,
        description: "Unexpected slow-motion mirror transitions with dramatic music.",
        heat: 99,
        views: "1.2B",
        likes: "79M",
        shares: "14M",
        tags: &["#mirrordance", "#slowmo", "#fyp", "#dancechallenge"],
        rising: true,
    },
    CatalogEntry {
        emoji: "🐶",
        title: "Dog Outfit Reviews",
        category: Category::Animals,
        description: "Dogs reviewing their own Halloween outfits. The side-eye is everything.",
        heat: 86,
        views: "389M",
        likes: "24M",
        shares: "4.1M",
        tags: &["#dogoutfit", "#dogmom", "#dogsoftiktok", "#petfashion"],
        rising: false,
    },
    CatalogEntry {
        emoji: "🤌",
        title: "Italian Hand Gestures",
        category: Category::Memes,
        description: "Teaching random words using only Italian hand gestures.",
        heat: 88,
        views: "445M",
        likes: "31M",
        shares: "9.8M",
        tags: &["#italian", "#handgestures", "#language", "#culturetok"],
        rising: true,
    },
    CatalogEntry {
        emoji: "🎮",
        title: "Rubik's Speed Solve",
        category: Category::Toys,
        description: "Teens solving Rubik's cubes with increasingly dramatic setups.",
        heat: 82,
        views: "298M",
        likes: "19M",
        shares: "3.4M",
        tags: &["#speedcubing", "#rubikscube", "#satisfying", "#skills"],
        rising: false,
    },
    CatalogEntry {
        emoji: "🌊",
        title: "Ocean Cleanup POV",
        category: Category::Viral,
        description: "Satisfying ocean cleanup videos with before/after reveals.",
        heat: 90,
        views: "567M",
        likes: "45M",
        shares: "12M",
        tags: &["#oceancleanup", "#satisfying", "#earthtok", "#fyp"],
        rising: true,
    },
    CatalogEntry {
        emoji: "🐦",
        title: "Parrot Cooking Reviews",
        category: Category::Animals,
        description: "Parrots critiquing their owners' cooking with surprisingly accurate commentary.",
        heat: 84,
        views: "321M",
        likes: "22M",
        shares: "5.3M",
        tags: &["#parrot", "#birdtok", "#cooking", "#funnypets"],
        rising: false,
    },
    CatalogEntry {
        emoji: "🎭",
        title: "Silent Disco In Public",
        category: Category::Viral,
        description: "Spontaneous silent disco flash mobs in shopping malls.",
        heat: 93,
        views: "678M",
        likes: "51M",
        shares: "13M",
        tags: &["#silentdisco", "#flashmob", "#publicprank", "#viral"],
        rising: true,
    },
];

/// Hottest entries, optionally restricted to one category.
pub fn top(category: Option<Category>, cap: usize) -> Vec<&'static CatalogEntry> {
    let entries: Vec<_> = CATALOG
        .iter()
        .filter(|e| category.map_or(true, |c| e.category == c))
        .collect();
    merge_unique([entries], cap)
}

pub fn rising() -> Vec<&'static CatalogEntry> {
    CATALOG.iter().filter(|e| e.rising).collect()
}

/// Every entry matching `keyword` anywhere in its text.
pub fn search(keyword: &str) -> Vec<&'static CatalogEntry> {
    CATALOG.iter().filter(|e| e.matches(keyword)).collect()
}
