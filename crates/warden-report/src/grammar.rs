//! Section grammars keyed by prompt version.
//!
//! A grammar names the header token of each reply section. Headers are
//! recognized line by line, tolerating the decoration models like to add:
//!
//! ```text
//! [VULNERABILITY_SCAN]
//! ## [VULNERABILITY_SCAN]
//! **VULNERABILITY SCAN:**
//! Security Score: 85/100        <- header plus inline body "85/100"
//! ```
//!
//! A bare (unbracketed) name is only a header when it is followed by nothing
//! but decoration or a colon, so prose like "security score impact: high"
//! inside a section does not start a new one.

use std::fmt;

use serde::Serialize;
use warden_core::enums::PromptVersion;

/// A reply section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Scan,
    Optimization,
    Score,
}

impl Section {
    pub const ALL: [Self; 3] = [Self::Scan, Self::Optimization, Self::Score];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Scan => 0,
            Self::Optimization => 1,
            Self::Score => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Optimization => "optimization",
            Self::Score => "score",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header tokens for one prompt version.
#[derive(Debug, PartialEq, Eq)]
pub struct Grammar {
    pub version: PromptVersion,
    /// Bare header names, indexed by [`Section::index`].
    headers: [&'static str; 3],
}

static V1: Grammar = Grammar {
    version: PromptVersion::V1,
    headers: [
        "VULNERABILITY_SCAN",
        "OPTIMIZATION_ANALYSIS",
        "SECURITY_SCORE",
    ],
};

impl Grammar {
    /// The grammar matching a prompt version.
    #[must_use]
    pub fn for_version(version: PromptVersion) -> &'static Self {
        match version {
            PromptVersion::V1 => &V1,
        }
    }

    /// Bare header name of a section, e.g. `VULNERABILITY_SCAN`.
    #[must_use]
    pub const fn header(&self, section: Section) -> &'static str {
        self.headers[section.index()]
    }

    /// Header as rendered into prompts, e.g. `[VULNERABILITY_SCAN]`.
    #[must_use]
    pub fn tag(&self, section: Section) -> String {
        format!("[{}]", self.header(section))
    }

    /// Recognize a header line. Returns the section and any text that follows
    /// the header on the same line.
    #[must_use]
    pub fn match_header<'a>(&self, line: &'a str) -> Option<(Section, &'a str)> {
        let stripped = line
            .trim()
            .trim_start_matches(|c: char| c == '#' || c == '*' || c == '>' || c.is_whitespace());

        for section in Section::ALL {
            let token = self.header(section);
            let rest = if let Some(inner) = stripped.strip_prefix('[') {
                strip_token(inner.trim_start(), token)
                    .and_then(|rest| rest.trim_start().strip_prefix(']'))
            } else {
                // Bare names only count when nothing but decoration or a colon follows.
                strip_token(stripped, token).filter(|rest| {
                    let after = rest.trim_start_matches('*').trim_start();
                    after.is_empty() || after.starts_with(':')
                })
            };

            if let Some(rest) = rest {
                let rest = rest.trim_start_matches(|c: char| {
                    c == ':' || c == '*' || c == '#' || c == ']' || c.is_whitespace()
                });
                return Some((section, rest.trim_end()));
            }
        }
        None
    }
}

/// Strip `token` from the front of `s`, ASCII case-insensitively, letting `_`
/// in the token match `_`, space, or `-`. The token must end at a word boundary.
fn strip_token<'a>(s: &'a str, token: &str) -> Option<&'a str> {
    let bytes = s.as_bytes();
    if bytes.len() < token.len() {
        return None;
    }
    let matches = token.bytes().zip(bytes).all(|(t, b)| {
        if t == b'_' {
            matches!(b, b'_' | b' ' | b'-')
        } else {
            b.to_ascii_uppercase() == t
        }
    });
    if !matches {
        return None;
    }
    // Every compared byte was ASCII, so this is a char boundary.
    let rest = &s[token.len()..];
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => None,
        _ => Some(rest),
    }
}
