//! Search queries: turn the text typed into the search bar into a node
//! predicate.

use std::fmt;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use regex::{Regex, RegexBuilder};

use crate::error::Result;
use crate::tree::TreeNode;

/// How search text is matched against node names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Plain substring, case-insensitive unless asked otherwise.
    #[default]
    Substring,
    Regex,
    /// Skim-style fuzzy subsequence match.
    Fuzzy,
}

impl SearchMode {
    /// Parse a search mode from a config string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "regex" => SearchMode::Regex,
            "fuzzy" => SearchMode::Fuzzy,
            _ => SearchMode::Substring,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchMode::Substring => "Substring",
            SearchMode::Regex => "Regex",
            SearchMode::Fuzzy => "Fuzzy",
        }
    }

    /// Cycle to the next search mode.
    pub fn next(&self) -> Self {
        match self {
            SearchMode::Substring => SearchMode::Regex,
            SearchMode::Regex => SearchMode::Fuzzy,
            SearchMode::Fuzzy => SearchMode::Substring,
        }
    }
}

enum Matcher {
    Substring { needle: String },
    Regex(Regex),
    Fuzzy(SkimMatcherV2),
}

/// A compiled search over node names.
pub struct SearchQuery {
    text: String,
    mode: SearchMode,
    case_sensitive: bool,
    matcher: Matcher,
}

impl fmt::Debug for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchQuery")
            .field("text", &self.text)
            .field("mode", &self.mode)
            .field("case_sensitive", &self.case_sensitive)
            .finish()
    }
}

impl SearchQuery {
    /// Compile `text` for `mode`. Empty text means "no filter" and yields
    /// `None`; a regex that does not compile is an error.
    pub fn new(text: &str, mode: SearchMode, case_sensitive: bool) -> Result<Option<Self>> {
        if text.is_empty() {
            return Ok(None);
        }

        let matcher = match mode {
            SearchMode::Substring => Matcher::Substring {
                needle: if case_sensitive {
                    text.to_string()
                } else {
                    text.to_lowercase()
                },
            },
            SearchMode::Regex => Matcher::Regex(
                RegexBuilder::new(text)
                    .case_insensitive(!case_sensitive)
                    .build()?,
            ),
            SearchMode::Fuzzy => {
                let matcher = SkimMatcherV2::default();
                Matcher::Fuzzy(if case_sensitive {
                    matcher.respect_case()
                } else {
                    matcher.ignore_case()
                })
            }
        };

        Ok(Some(Self {
            text: text.to_string(),
            mode,
            case_sensitive,
            matcher,
        }))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn matches(&self, node: &TreeNode) -> bool {
        self.matches_name(&node.name)
    }

    pub fn matches_name(&self, name: &str) -> bool {
        match &self.matcher {
            Matcher::Substring { needle } => {
                if self.case_sensitive {
                    name.contains(needle.as_str())
                } else {
                    name.to_lowercase().contains(needle.as_str())
                }
            }
            Matcher::Regex(regex) => regex.is_match(name),
            Matcher::Fuzzy(matcher) => matcher.fuzzy_match(name, &self.text).is_some(),
        }
    }

    /// Char indices of `name` covered by the first match, for highlighting.
    pub fn match_indices(&self, name: &str) -> Vec<usize> {
        match &self.matcher {
            Matcher::Substring { needle } => {
                let haystack = if self.case_sensitive {
                    name.to_string()
                } else {
                    name.to_lowercase()
                };
                haystack
                    .find(needle.as_str())
                    .map(|byte_start| {
                        let start = haystack[..byte_start].chars().count();
                        (start..start + needle.chars().count()).collect()
                    })
                    .unwrap_or_default()
            }
            Matcher::Regex(regex) => regex
                .find(name)
                .map(|m| {
                    let start = name[..m.start()].chars().count();
                    (start..start + m.as_str().chars().count()).collect()
                })
                .unwrap_or_default(),
            Matcher::Fuzzy(matcher) => matcher
                .fuzzy_indices(name, &self.text)
                .map(|(_, indices)| indices)
                .unwrap_or_default(),
        }
    }
}
