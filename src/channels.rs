//! Channel allow-lists.
//!
//! A rule string is a comma-separated list evaluated left to right. Every token that
//! matches overwrites the verdict, so the last match wins:
//!
//! | token  | effect                         |
//! |--------|--------------------------------|
//! | `none` | deny every channel             |
//! | `all`  | allow every channel            |
//! | `-id`  | deny channel `id`              |
//! | `+id`  | allow channel `id`             |
//! | `id`   | allow channel `id`             |
//!
//! `"all,-123"` allows everything but 123; `"123,-123"` denies 123; `"-123,123"` allows it.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    None,
    All,
    Deny(String),
    Allow(String),
    Exact(String),
}

impl Rule {
    fn parse(token: &str) -> Self {
        match token {
            "none" => Rule::None,
            "all" => Rule::All,
            _ => {
                if let Some(id) = token.strip_prefix('-') {
                    Rule::Deny(id.to_string())
                } else if let Some(id) = token.strip_prefix('+') {
                    Rule::Allow(id.to_string())
                } else {
                    Rule::Exact(token.to_string())
                }
            }
        }
    }
}

/// YAML form: a rule string, or a bare numeric channel id.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawRules {
    Text(String),
    Id(u64),
}

/// An ordered rule list. The empty list allows nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawRules")]
pub struct ChannelRules {
    rules: Vec<Rule>,
}

impl ChannelRules {
    pub fn parse(text: &str) -> Self {
        let rules = text
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Rule::parse)
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn allows(&self, channel: &str) -> bool {
        let mut allowed = false;
        for rule in &self.rules {
            match rule {
                Rule::None => allowed = false,
                Rule::All => allowed = true,
                Rule::Deny(id) if id == channel => allowed = false,
                Rule::Allow(id) | Rule::Exact(id) if id == channel => allowed = true,
                _ => {}
            }
        }
        allowed
    }
}

impl From<RawRules> for ChannelRules {
    fn from(raw: RawRules) -> Self {
        match raw {
            RawRules::Text(text) => Self::parse(&text),
            RawRules::Id(id) => Self::parse(&id.to_string()),
        }
    }
}
