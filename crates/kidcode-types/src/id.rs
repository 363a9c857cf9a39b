use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a block instance within one program graph.
///
/// Displayed and serialized as `b<N>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

impl FromStr for BlockId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('b')
            .and_then(|n| n.parse::<u32>().ok())
            .map(BlockId)
            .ok_or_else(|| format!("invalid block id '{s}'"))
    }
}

impl From<BlockId> for String {
    fn from(id: BlockId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for BlockId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let id: BlockId = "b17".parse().unwrap();
        assert_eq!(id, BlockId(17));
        assert_eq!(id.to_string(), "b17");
        assert!("17".parse::<BlockId>().is_err());
        assert!("bx".parse::<BlockId>().is_err());
    }
}
