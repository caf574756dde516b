use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, convert::Infallible, fmt, str::FromStr};

/// How far a source's change stream has progressed.
///
/// Positions are produced by the capture layer and are only compared and
/// acknowledged here, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// No real progress yet (e.g. before the first event is captured).
    Placeholder,

    /// MySQL binlog coordinate.
    Binlog {
        file_name: String,
        position: u64,
        server_id: u32,
    },

    /// PostgreSQL / openGauss write-ahead-log sequence number.
    Wal { lsn: u64 },

    /// Dialect-specific position the core cannot order.
    Custom(String),

    /// The source will not produce further changes.
    Finished,
}

impl Position {
    pub fn binlog(file_name: impl Into<String>, position: u64) -> Self {
        Position::Binlog {
            file_name: file_name.into(),
            position,
            server_id: 0,
        }
    }

    pub fn wal(lsn: u64) -> Self {
        Position::Wal { lsn }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use Position::*;
        match (self, other) {
            (Placeholder, Placeholder) | (Finished, Finished) => Some(Ordering::Equal),
            (Placeholder, _) | (_, Finished) => Some(Ordering::Less),
            (_, Placeholder) | (Finished, _) => Some(Ordering::Greater),
            (
                Binlog {
                    file_name: f1,
                    position: p1,
                    server_id: s1,
                },
                Binlog {
                    file_name: f2,
                    position: p2,
                    server_id: s2,
                },
            ) => Some((f1, p1, s1).cmp(&(f2, p2, s2))),
            (Wal { lsn: a }, Wal { lsn: b }) => Some(a.cmp(b)),
            (Custom(a), Custom(b)) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Placeholder => f.write_str("placeholder"),
            Position::Binlog {
                file_name,
                position,
                ..
            } => write!(f, "{file_name}:{position}"),
            Position::Wal { lsn } => write!(f, "{:X}/{:X}", lsn >> 32, lsn & 0xFFFF_FFFF),
            Position::Custom(raw) => f.write_str(raw),
            Position::Finished => f.write_str("finished"),
        }
    }
}

impl FromStr for Position {
    type Err = Infallible;

    /// Parses the checkpoint formats produced by `Display`:
    /// - `mysql-bin.000003:12345` (binlog)
    /// - `0/1234ABCD` (LSN)
    ///
    /// Anything unrecognized is kept verbatim as `Custom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "placeholder" => return Ok(Position::Placeholder),
            "finished" => return Ok(Position::Finished),
            _ => {}
        }

        if let Some((hi, lo)) = trimmed.split_once('/')
            && let (Ok(hi), Ok(lo)) = (u64::from_str_radix(hi, 16), u64::from_str_radix(lo, 16))
            && hi <= u32::MAX as u64
            && lo <= u32::MAX as u64
        {
            return Ok(Position::wal((hi << 32) | lo));
        }

        if let Some((file_name, offset)) = trimmed.rsplit_once(':')
            && !file_name.is_empty()
            && let Ok(position) = offset.parse::<u64>()
        {
            return Ok(Position::binlog(file_name, position));
        }

        Ok(Position::Custom(trimmed.to_string()))
    }
}
