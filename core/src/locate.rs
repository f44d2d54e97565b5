//! Locating the schema payload among a container's entries.

use crate::config::ExtractConfig;
use crate::extract::ExtractError;

/// How a candidate entry matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Primary,
    Alias,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadCandidate {
    pub name: String,
    pub kind: MatchKind,
}

/// Entry-name matcher: exact primary name, then exact aliases in order, then a
/// case-insensitive substring match against any of those names.
#[derive(Debug, Clone, Copy)]
pub struct PayloadLocator<'a> {
    primary: &'a str,
    aliases: &'a [String],
}

const MAX_LISTED_ENTRIES: usize = 10;

impl<'a> PayloadLocator<'a> {
    pub fn new(primary: &'a str, aliases: &'a [String]) -> Self {
        Self { primary, aliases }
    }

    pub fn from_config(config: &'a ExtractConfig) -> Self {
        Self::new(&config.payload_entry, &config.payload_aliases)
    }

    /// Every matching entry, best match first, without duplicates.
    pub fn candidates(&self, names: &[String]) -> Vec<PayloadCandidate> {
        let mut out: Vec<PayloadCandidate> = Vec::new();
        let push = |name: &str, kind: MatchKind, out: &mut Vec<PayloadCandidate>| {
            if !out.iter().any(|c| c.name == name) {
                out.push(PayloadCandidate {
                    name: name.to_string(),
                    kind,
                });
            }
        };

        if let Some(name) = names.iter().find(|n| n.as_str() == self.primary) {
            push(name, MatchKind::Primary, &mut out);
        }

        for alias in self.aliases {
            if let Some(name) = names.iter().find(|n| *n == alias) {
                push(name, MatchKind::Alias, &mut out);
            }
        }

        let needles: Vec<String> = std::iter::once(self.primary)
            .chain(self.aliases.iter().map(String::as_str))
            .map(str::to_lowercase)
            .collect();
        for name in names {
            let lowered = name.to_lowercase();
            if needles.iter().any(|needle| lowered.contains(needle.as_str())) {
                push(name, MatchKind::Substring, &mut out);
            }
        }

        out
    }

    pub fn locate(&self, names: &[String]) -> Result<PayloadCandidate, ExtractError> {
        self.candidates(names)
            .into_iter()
            .next()
            .ok_or_else(|| payload_not_found(names))
    }
}

pub(crate) fn payload_not_found(names: &[String]) -> ExtractError {
    let available = names
        .iter()
        .filter(|name| !name.starts_with('_'))
        .take(MAX_LISTED_ENTRIES)
        .cloned()
        .collect();
    ExtractError::PayloadNotFound { available }
}
