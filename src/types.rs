use std::fmt;
use std::str::FromStr;

/// Which half of the data file a chunk sequence belongs to.
///
/// - `Outbound`: `out-<i>` chunks counted by `meta.out-max`. Written by the
///   external application, read by us.
/// - `Inbound`: `in-<i>` chunks counted by `meta.in-max`. Written by us, read
///   by the external application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    Inbound,
    #[default]
    Outbound,
}

impl Direction {
    /// Key prefix of the chunk lines, e.g. `"out-"`.
    pub fn chunk_prefix(self) -> &'static str {
        match self {
            Direction::Inbound => "in-",
            Direction::Outbound => "out-",
        }
    }

    /// Meta field holding the chunk count, e.g. `"out-max"`.
    pub fn max_field(self) -> &'static str {
        match self {
            Direction::Inbound => "in-max",
            Direction::Outbound => "out-max",
        }
    }

    /// Logical key name of chunk `index`.
    pub fn chunk_key(self, index: usize) -> String {
        format!("{}{}", self.chunk_prefix(), index)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("in"),
            Direction::Outbound => f.write_str("out"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in" | "inbound" => Ok(Direction::Inbound),
            "out" | "outbound" => Ok(Direction::Outbound),
            other => Err(format!(
                "invalid direction: {other} (expected \"in\" or \"out\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_keys_follow_namespace() {
        assert_eq!(Direction::Outbound.chunk_key(0), "out-0");
        assert_eq!(Direction::Inbound.chunk_key(12), "in-12");
        assert_eq!(Direction::Inbound.max_field(), "in-max");
    }

    #[test]
    fn parses_short_and_long_names() {
        assert_eq!("IN".parse::<Direction>().unwrap(), Direction::Inbound);
        assert_eq!(" outbound ".parse::<Direction>().unwrap(), Direction::Outbound);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn defaults_to_outbound() {
        assert_eq!(Direction::default(), Direction::Outbound);
        assert_eq!(Direction::default().to_string(), "out");
    }
}
