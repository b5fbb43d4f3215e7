use serde::{Deserialize, Serialize};

/// Number of posts kept in a [`SocialSnapshot`].
pub const MAX_TOP_POSTS: usize = 3;

/// Minimum number of matching posts for [`ActivityLevel::High`].
pub const HIGH_ACTIVITY_THRESHOLD: usize = 3;

/// Spot price summary from the price API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSnapshot {
    pub symbol: String,
    #[serde(rename = "current")]
    pub current_price_usd: f64,
    /// `None` when the price API has no 24h figure for the coin.
    #[serde(rename = "change_24h")]
    pub change_24h_percent: Option<f64>,
}

/// 24h ticker summary from the exchange API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSnapshot {
    pub volume: f64,
    #[serde(rename = "price_change")]
    pub price_change_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialPost {
    pub title: String,
    pub score: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityLevel {
    High,
    Low,
}

impl ActivityLevel {
    pub fn from_match_count(count: usize) -> Self {
        if count >= HIGH_ACTIVITY_THRESHOLD {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// Forum activity around a coin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialSnapshot {
    #[serde(rename = "posts")]
    pub top_posts: Vec<SocialPost>,
    #[serde(rename = "activity")]
    pub activity_level: ActivityLevel,
}

impl SocialSnapshot {
    /// Builds a snapshot from every post the search returned.
    ///
    /// Activity is judged on the full result set; only the first
    /// [`MAX_TOP_POSTS`] posts are kept.
    pub fn from_matches(mut posts: Vec<SocialPost>) -> Self {
        let activity_level = ActivityLevel::from_match_count(posts.len());
        posts.truncate(MAX_TOP_POSTS);
        Self {
            top_posts: posts,
            activity_level,
        }
    }
}

/// Merged per-coin snapshot handed to the analyst and returned as `raw_data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketData {
    pub price: PriceSnapshot,
    pub market: MarketSnapshot,
    pub social: SocialSnapshot,
}
