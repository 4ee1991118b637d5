use serde::Serialize;
use thiserror::Error;

use crate::domain::Zone;

pub const DEFAULT_PREFIX: &str = "flows_";
pub const DEFAULT_SUFFIX: &str = ".csv";

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum FilenameError {
    #[error("{name}: expected <{prefix}A_B{suffix}>")]
    NotAFlowFile {
        name: String,
        prefix: String,
        suffix: String,
    },

    #[error("{name}: empty zone token")]
    EmptyToken { name: String },

    #[error("{name}: cannot split {tokens} tokens into sender and recipient")]
    Unmatched { name: String, tokens: usize },

    #[error("{name}: {candidates} different sender/recipient splits match")]
    Ambiguous { name: String, candidates: usize },
}

/// Ordered zone pair encoded in a flow file name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FlowPair {
    pub sender: Zone,
    pub recipient: Zone,
}

/// Decodes `flows_<A>_<B>.csv` into a sender/recipient pair.
///
/// Each side is either one underscore-delimited token or the full token
/// sequence of a known compound code. Exactly one way of splitting the
/// tokens must satisfy that rule.
#[derive(Debug, Clone)]
pub struct FilenameParser {
    prefix: String,
    suffix: String,
    compounds: Vec<Vec<String>>,
}

impl Default for FilenameParser {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_SUFFIX, [Zone::from("DE_LU")])
    }
}

impl FilenameParser {
    pub fn new<I>(prefix: &str, suffix: &str, compound_codes: I) -> Self
    where
        I: IntoIterator<Item = Zone>,
    {
        let compounds: Vec<Vec<String>> = compound_codes
            .into_iter()
            .filter(|z| z.is_compound())
            .map(|z| z.tokens().map(str::to_string).collect::<Vec<_>>())
            .collect();
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            compounds,
        }
    }

    pub fn parse(&self, name: &str) -> Result<FlowPair, FilenameError> {
        let stem = name
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_suffix(self.suffix.as_str()))
            .ok_or_else(|| FilenameError::NotAFlowFile {
                name: name.to_string(),
                prefix: self.prefix.clone(),
                suffix: self.suffix.clone(),
            })?;

        let tokens: Vec<&str> = stem.split('_').collect();
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(FilenameError::EmptyToken {
                name: name.to_string(),
            });
        }

        let mut splits = (1..tokens.len())
            .filter(|&k| self.is_zone(&tokens[..k]) && self.is_zone(&tokens[k..]));

        match (splits.next(), splits.count()) {
            (Some(k), 0) => Ok(FlowPair {
                sender: Zone::from(tokens[..k].join("_")),
                recipient: Zone::from(tokens[k..].join("_")),
            }),
            (Some(_), more) => Err(FilenameError::Ambiguous {
                name: name.to_string(),
                candidates: more + 1,
            }),
            (None, _) => Err(FilenameError::Unmatched {
                name: name.to_string(),
                tokens: tokens.len(),
            }),
        }
    }

    fn is_zone(&self, tokens: &[&str]) -> bool {
        match tokens.len() {
            0 => false,
            1 => true,
            _ => self.compounds.iter().any(|c| {
                c.len() == tokens.len() && c.iter().zip(tokens).all(|(a, b)| a.as_str() == *b)
            }),
        }
    }
}
