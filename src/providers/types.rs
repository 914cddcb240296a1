use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Native,
    Proxy,
    YouTube,
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Native => write!(f, "native"),
            SourceId::Proxy => write!(f, "proxy"),
            SourceId::YouTube => write!(f, "youtube"),
        }
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(SourceId::Native),
            "proxy" => Ok(SourceId::Proxy),
            "youtube" => Ok(SourceId::YouTube),
            _ => Err(format!(
                "Invalid source: '{}'. Valid: native, proxy, youtube",
                s
            )),
        }
    }
}

impl SourceId {
    /// Tiers that go over the network rather than through the local host.
    pub fn is_remote(&self) -> bool {
        matches!(self, SourceId::Proxy | SourceId::YouTube)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_round_trip() {
        for id in [SourceId::Native, SourceId::Proxy, SourceId::YouTube] {
            assert_eq!(id.to_string().parse::<SourceId>().unwrap(), id);
        }
        assert!("invidious".parse::<SourceId>().is_err());
        assert!(!SourceId::Native.is_remote());
        assert!(SourceId::YouTube.is_remote());
    }
}
