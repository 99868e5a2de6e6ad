use serde::{Deserialize, Serialize};

/// Category label shown next to a blockable app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppCategory {
    Social,
    Video,
    Games,
    Other,
}

impl AppCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Social => "social",
            Self::Video => "video",
            Self::Games => "games",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for AppCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "social" => Ok(Self::Social),
            "video" => Ok(Self::Video),
            "games" => Ok(Self::Games),
            "other" => Ok(Self::Other),
            _ => anyhow::bail!("Unknown app category: {s}"),
        }
    }
}

/// Keywords matched against the package id and the display name respectively
struct CategoryRule {
    category: AppCategory,
    package_keywords: &'static [&'static str],
    name_keywords: &'static [&'static str],
}

const SOCIAL_KEYWORDS: &[&str] = &[
    "instagram",
    "facebook",
    "twitter",
    "tiktok",
    "snapchat",
    "linkedin",
    "reddit",
    "pinterest",
];

// Checked in order: the first matching rule wins.
const RULES: &[CategoryRule] = &[
    CategoryRule {
        category: AppCategory::Social,
        package_keywords: SOCIAL_KEYWORDS,
        name_keywords: SOCIAL_KEYWORDS,
    },
    CategoryRule {
        category: AppCategory::Video,
        package_keywords: &[
            "youtube",
            "netflix",
            "twitch",
            "hulu",
            "disney",
            "video",
            "primevideo",
            "hbo",
        ],
        name_keywords: &[
            "youtube",
            "netflix",
            "twitch",
            "hulu",
            "disney",
            "video",
            "prime video",
            "hbo",
        ],
    },
    CategoryRule {
        category: AppCategory::Games,
        package_keywords: &[
            "game",
            "supercell",
            "king.",
            "ubisoft",
            "ea.",
            "roblox",
            "minecraft",
        ],
        name_keywords: &[
            "game",
            "clash",
            "candy crush",
            "brawl",
            "roblox",
            "minecraft",
        ],
    },
];

/// Classify an app by case-insensitive keyword match on its package id and display name
#[must_use]
pub fn categorize(package: &str, app_name: &str) -> AppCategory {
    let package = package.to_lowercase();
    let name = app_name.to_lowercase();

    for rule in RULES {
        let matches = rule.package_keywords.iter().any(|k| package.contains(k))
            || rule.name_keywords.iter().any(|k| name.contains(k));
        if matches {
            log::debug!("Classified '{package}' as '{}'", rule.category);
            return rule.category;
        }
    }

    AppCategory::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_package_is_video_regardless_of_name() {
        assert_eq!(
            categorize("com.google.android.youtube", "Totally Unrelated"),
            AppCategory::Video
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(categorize("COM.INSTAGRAM.ANDROID", ""), AppCategory::Social);
        assert_eq!(categorize("x.y", "NETFLIX"), AppCategory::Video);
    }

    #[test]
    fn test_display_name_is_checked_too() {
        assert_eq!(categorize("com.acme.client", "Candy Crush Saga"), AppCategory::Games);
        assert_eq!(categorize("com.acme.stream", "Prime Video"), AppCategory::Video);
    }

    #[test]
    fn test_social_wins_over_video() {
        // "facebook" and "video" both match; social is checked first
        assert_eq!(categorize("com.facebook.video", ""), AppCategory::Social);
    }

    #[test]
    fn test_package_only_game_keywords() {
        assert_eq!(categorize("com.king.candycrush", "Sweets"), AppCategory::Games);
        assert_eq!(categorize("com.ea.fifa", "Football"), AppCategory::Games);
        assert_eq!(categorize("com.supercell.clashroyale", ""), AppCategory::Games);
    }

    #[test]
    fn test_name_only_game_keywords_do_not_apply_to_package() {
        // "clash" is a display-name keyword only
        assert_eq!(categorize("com.clash.app", "Chat"), AppCategory::Other);
    }

    #[test]
    fn test_unknown_app_is_other() {
        assert_eq!(categorize("org.mozilla.firefox", "Firefox"), AppCategory::Other);
    }

    #[test]
    fn test_category_labels_roundtrip() {
        for category in [
            AppCategory::Social,
            AppCategory::Video,
            AppCategory::Games,
            AppCategory::Other,
        ] {
            assert_eq!(category.as_str().parse::<AppCategory>().unwrap(), category);
        }
        assert!("music".parse::<AppCategory>().is_err());
    }
}
