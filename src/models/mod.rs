use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::hash::{Hash, Hasher};

/// A normalized search result, whichever source it came from.
///
/// Equality and hashing only look at `id`, the identifier assigned by the
/// video platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    #[serde(deserialize_with = "deserialize_string_from_any")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    pub channel: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_option_string_from_any"
    )]
    pub duration: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_option_u64_from_any"
    )]
    pub views: Option<u64>,
}

impl Song {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        thumbnail: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail: thumbnail.into(),
            channel: channel.into(),
            duration: None,
            views: None,
        }
    }

    /// Copy without the optional metadata, as stored in the recents list.
    pub fn core(&self) -> Self {
        Self::new(
            self.id.clone(),
            self.title.clone(),
            self.thumbnail.clone(),
            self.channel.clone(),
        )
    }

    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.title.trim().is_empty()
    }
}

impl PartialEq for Song {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Song {}

impl Hash for Song {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Deserialize every entry of an `items` array on its own, dropping the ones
/// that don't fit the `Song` shape instead of failing the whole response.
pub fn songs_from_items(items: &[Value]) -> Vec<Song> {
    items
        .iter()
        .filter_map(|raw| match serde_json::from_value::<Song>(raw.clone()) {
            Ok(song) if song.is_valid() => Some(song),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Dropping malformed song entry: {}", e);
                None
            }
        })
        .collect()
}

fn deserialize_string_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AnyValue {
        String(String),
        Number(i64),
    }

    match AnyValue::deserialize(deserializer)? {
        AnyValue::String(s) => Ok(s),
        AnyValue::Number(n) => Ok(n.to_string()),
    }
}

fn deserialize_option_string_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // Optional metadata: anything unusable becomes None instead of an error
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn deserialize_option_u64_from_any<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    })
}
