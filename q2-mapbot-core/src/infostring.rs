//! Quake 2 info-string codec.
//!
//! A status reply looks like
//!
//! ```text
//! \xff\xff\xff\xffprint
//! \hostname\My Server\mapname\q2dm1\maxclients\8
//! 3 120 "Alice"
//! 0 48 "Bob the Builder"
//! ```
//!
//! Line 0 is a header, line 1 the backslash-delimited key/value info string and every
//! following line one connected player.

use std::collections::BTreeMap;

use crate::error::MalformedReplyError;

/// Server metadata keyed by lower-cased info-string key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoMap(BTreeMap<String, String>);

impl InfoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from a flat `key, value, key, value, ...` token sequence.
    pub fn from_tokens<'a, I>(tokens: I) -> Result<Self, MalformedReplyError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut map = InfoMap::new();
        let mut tokens = tokens.into_iter();
        while let Some(key) = tokens.next() {
            let Some(value) = tokens.next() else {
                return Err(MalformedReplyError::DanglingKey {
                    key: key.to_string(),
                });
            };
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Inserts with the key lower-cased; a repeated key overwrites the earlier value.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Lookup that treats a missing key as the empty string, matching how the game renders it.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the map in wire form, `\key\value\key\value`.
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .fold(String::new(), |mut out, (k, v)| {
                out.push('\\');
                out.push_str(k);
                out.push('\\');
                out.push_str(v);
                out
            })
    }
}

/// One line of the player section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub score: i32,
    pub ping: i32,
    pub name: String,
}

impl PlayerRecord {
    /// Parses `score ping name`. Fields are separated by any run of whitespace. The name is
    /// everything after the second field and may contain spaces; one pair of surrounding
    /// double quotes is removed.
    pub fn parse(line: &str) -> Result<Self, MalformedReplyError> {
        let bad = || MalformedReplyError::BadPlayerLine {
            line: line.to_string(),
        };
        let (score, rest) = next_field(line).ok_or_else(bad)?;
        let (ping, rest) = next_field(rest).ok_or_else(bad)?;
        let score = score.parse().map_err(|_| bad())?;
        let ping = ping.parse().map_err(|_| bad())?;
        let raw_name = rest.trim();
        if raw_name.is_empty() {
            return Err(bad());
        }
        let name = raw_name
            .strip_prefix('"')
            .and_then(|n| n.strip_suffix('"'))
            .unwrap_or(raw_name);
        Ok(Self {
            score,
            ping,
            name: name.to_string(),
        })
    }
}

/// Splits off the first whitespace-delimited field, returning it and the remainder.
fn next_field(text: &str) -> Option<(&str, &str)> {
    text.trim_start().split_once(char::is_whitespace)
}

/// A decoded status reply, before the player count is folded into the info map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedReply {
    pub info: InfoMap,
    pub players: Vec<PlayerRecord>,
}

fn is_padding(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\0')
}

/// Decodes a raw status datagram.
pub fn decode(raw: &[u8]) -> Result<DecodedReply, MalformedReplyError> {
    let text = String::from_utf8_lossy(raw);
    // Trimming removes the trailing empty line the server always sends.
    let lines: Vec<&str> = text.trim_matches(is_padding).split('\n').collect();
    if lines.len() < 2 {
        return Err(MalformedReplyError::MissingInfoLine { lines: lines.len() });
    }

    let info_line = lines[1].trim_end_matches('\r');
    let mut chars = info_line.chars();
    chars.next();
    let info = InfoMap::from_tokens(chars.as_str().split('\\'))?;

    let players = lines[2..]
        .iter()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .map(PlayerRecord::parse)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedReply { info, players })
}
