use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

pub const BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
pub const NEW_SUFFIX: &str = "newstories.json";
pub const TOP_SUFFIX: &str = "topstories.json";
pub const BEST_SUFFIX: &str = "beststories.json";
pub const ASK_SUFFIX: &str = "askstories.json";
pub const SINGLE_SUFFIX: &str = "item/{id}.json";

/// A story, comment, job or poll as served by the API.
///
/// Every field tolerates an explicit `null`, which decodes to the field's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HackerNewsItem {
    #[serde(deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub parent: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub kids: Vec<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub descendants: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub parts: Vec<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub score: i64,
    #[serde(rename = "time", deserialize_with = "null_as_default")]
    pub timestamp: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub by: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub dead: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub deleted: bool,
    // Owned by the presentation layer; never touched by the fetch path.
    #[serde(skip)]
    pub visited: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl HackerNewsItem {
    /// Stand-in for an item that could not be fetched.
    pub fn placeholder(reason: impl fmt::Display) -> Self {
        Self {
            title: format!("Could not get item ({})", reason),
            ..Default::default()
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.timestamp, 0)
            .single()
            .unwrap_or_default()
    }

    pub fn display_title(&self) -> String {
        if self.url.is_empty() {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, self.url)
        }
    }

    pub fn description(&self) -> String {
        self.description_at(Utc::now())
    }

    pub fn description_at(&self, now: DateTime<Utc>) -> String {
        format!(
            "{} points by {} {} ago {} comments",
            self.score,
            self.by,
            format_age(now.signed_duration_since(self.time()).num_seconds()),
            self.descendants,
        )
    }

    pub fn filter_value(&self) -> &str {
        &self.title
    }

    /// `text` with paragraphs turned into blank lines, tags stripped and entities decoded.
    pub fn plain_text(&self) -> String {
        static TAG: OnceLock<Regex> = OnceLock::new();
        let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

        let text = self.text.replace("<p>", "\n\n");
        let text = tag.replace_all(&text, "");
        html_escape::decode_html_entities(&text).trim().to_string()
    }
}

fn format_age(secs: i64) -> String {
    let secs = secs.max(0);
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h{}m", s / 3600, (s % 3600) / 60),
        s => format!("{}d{}h", s / 86_400, (s % 86_400) / 3600),
    }
}

/// Which list of IDs to fetch. `Item` is the single-item endpoint and is not a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    New,
    Top,
    Best,
    Ask,
    Item,
}

impl ItemType {
    pub const TABS: [ItemType; 4] = [ItemType::Top, ItemType::New, ItemType::Best, ItemType::Ask];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::New => "new",
            ItemType::Top => "top",
            ItemType::Best => "best",
            ItemType::Ask => "ask",
            ItemType::Item => "item",
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            ItemType::New => NEW_SUFFIX,
            ItemType::Top => TOP_SUFFIX,
            ItemType::Best => BEST_SUFFIX,
            ItemType::Ask => ASK_SUFFIX,
            ItemType::Item => SINGLE_SUFFIX,
        }
    }

    pub fn title(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ItemType::New),
            "top" => Ok(ItemType::Top),
            "best" => Ok(ItemType::Best),
            "ask" => Ok(ItemType::Ask),
            "item" => Ok(ItemType::Item),
            other => Err(Error::InvalidItemType(other.to_string())),
        }
    }
}

pub fn single_item_suffix(id: u64) -> String {
    SINGLE_SUFFIX.replace("{id}", &id.to_string())
}
