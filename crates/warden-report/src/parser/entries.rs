//! Finding and optimization extraction from a section body.
//!
//! A body is first grouped into raw entries. When the body contains list
//! markers, each top-level item starts an entry and everything else (indented
//! sub-bullets, continuation lines, `Key: value` lines) attaches to it as
//! detail. Numbered items take precedence over symbol bullets, so the common
//!
//! ```text
//! 1. **Reentrancy** (HIGH)
//!    - Location: withdraw()
//!    - Description: external call before balance update
//! ```
//!
//! layout yields one entry. A body with no list markers is read one entry per
//! line.

use std::sync::LazyLock;

use regex::Regex;
use warden_core::enums::Severity;
use warden_core::report::{GasOptimization, Vulnerability};

use super::ParseWarning;

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(?:([-*•+])|(\d{1,3})[.)])\s+(.*)$").expect("bullet regex")
});

static LEADING_SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\[(]\s*([^\])]+?)\s*[\])]\s*(.*)$").expect("slot regex"));

static SEVERITY_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bseverity\s*(?:level)?\s*[:=]\s*([A-Za-z][\w-]*)").expect("severity regex")
});

static LEADING_SEVERITY_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(high|medium|low|critical|severe|moderate|minor|informational|info)",
        r"\s*[:|\-–]\s*(.*)$",
    ))
    .expect("leading severity regex")
});

/// A bracketed or parenthesised severity anywhere in a line, e.g. `(HIGH)`.
static SEVERITY_SLOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)[\[(]\s*(?:severity(?:\s+level)?\s*[:=]\s*)?",
        r"((?:high|medium|low|critical|severe|moderate|minor|informational|info)(?:-[\w-]+)?)",
        r"\s*[\])]",
    ))
    .expect("severity slot regex")
});

static SEVERITY_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(high|medium|low)\b").expect("severity word regex"));

static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z ]{0,24}?)\s*[:=]\s*(.+)$").expect("key line regex")
});

static CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z_$][\w$]*\s*\([^()]*\)").expect("call regex"));

static LINES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\blines?\s*:?\s*\d+(?:\s*[-–]\s*\d+)?").expect("lines regex")
});

const UNKNOWN_LOCATION: &str = "unknown";
const UNSPECIFIED_TYPE: &str = "unspecified";
const GENERAL_TYPE: &str = "general";

// ---------------------------------------------------------------------------
// Raw entries
// ---------------------------------------------------------------------------

/// `Key: value` detail keys the extractors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Type,
    Location,
    Severity,
    Description,
    Suggestion,
}

impl Key {
    fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "type" | "category" | "issue type" => Some(Self::Type),
            "location" | "function" | "line" | "lines" | "where" => Some(Self::Location),
            "severity" | "severity level" | "risk" => Some(Self::Severity),
            "description" | "details" | "impact" => Some(Self::Description),
            "suggestion" | "recommendation" | "fix" => Some(Self::Suggestion),
            _ => None,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RawEntry {
    head: String,
    keyed: Vec<(Key, String)>,
    details: Vec<String>,
}

impl RawEntry {
    fn new(head: String) -> Self {
        Self {
            head,
            ..Self::default()
        }
    }

    fn key(&self, key: Key) -> Option<&str> {
        self.keyed
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    fn attach(&mut self, text: String) {
        match split_key(&text) {
            Some((key, value)) => self.keyed.push((key, value)),
            None => self.details.push(text),
        }
    }

    /// Head followed by free-text details.
    fn text(&self) -> String {
        let details = self.details.iter().map(String::as_str);
        join_nonempty(std::iter::once(self.head.as_str()).chain(details))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Symbol,
    Number,
}

struct Bullet<'a> {
    indent: usize,
    marker: Marker,
    body: &'a str,
}

fn bullet(line: &str) -> Option<Bullet<'_>> {
    let caps = BULLET.captures(line)?;
    let indent = caps.get(1).map_or(0, |m| {
        m.as_str()
            .chars()
            .map(|c| if c == '\t' { 4 } else { 1 })
            .sum()
    });
    let marker = if caps.get(2).is_some() {
        Marker::Symbol
    } else {
        Marker::Number
    };
    Some(Bullet {
        indent,
        marker,
        body: caps.get(4).map_or("", |m| m.as_str()),
    })
}

/// Drop markdown emphasis and code ticks.
fn clean(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '*' && *c != '`')
        .collect::<String>()
        .trim()
        .to_string()
}

fn indent_of(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// A short heading such as `Findings` that names no severity.
fn is_label(text: &str) -> bool {
    text.split_whitespace().count() <= 4
        && !SEVERITY_WORD.is_match(text)
        && !SEVERITY_SLOT.is_match(text)
}

/// Whether the next non-blank line is a list item nested under `indent`.
fn has_children(
    lines: &[&str],
    bullets: &[Option<Bullet<'_>>],
    at: usize,
    indent: usize,
) -> bool {
    lines
        .iter()
        .zip(bullets)
        .skip(at + 1)
        .find(|(line, _)| !line.trim().is_empty())
        .and_then(|(_, bullet)| bullet.as_ref())
        .is_some_and(|b| b.indent > indent)
}

fn is_placeholder(text: &str) -> bool {
    let lower = text.trim_end_matches('.').trim().to_ascii_lowercase();
    matches!(lower.as_str(), "none" | "n/a" | "na" | "nothing" | "none found" | "-")
        || [
            "no vulnerabilities",
            "no issues",
            "no optimizations",
            "no gas optimizations",
            "no significant",
            "no known",
        ]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

fn split_key(text: &str) -> Option<(Key, String)> {
    let caps = KEY_LINE.captures(text)?;
    let key = Key::parse(caps.get(1)?.as_str())?;
    Some((key, caps.get(2)?.as_str().trim().to_string()))
}

fn collect(lines: &[&str]) -> Vec<RawEntry> {
    let bullets: Vec<Option<Bullet<'_>>> = lines.iter().map(|line| bullet(line)).collect();
    let has_bullets = bullets.iter().any(Option::is_some);
    let top_marker = if bullets
        .iter()
        .flatten()
        .any(|b| b.marker == Marker::Number && b.indent < 2)
    {
        Marker::Number
    } else {
        Marker::Symbol
    };

    let mut entries: Vec<RawEntry> = Vec::new();
    for (at, (line, bullet)) in lines.iter().zip(&bullets).enumerate() {
        let (is_top, indent, mut text) = match bullet {
            Some(b) => (b.indent < 2 && b.marker == top_marker, b.indent, clean(b.body)),
            None => (!has_bullets, indent_of(line), clean(line)),
        };
        if text.is_empty() {
            continue;
        }
        // `Findings:` over sibling items is a heading; `Reentrancy (HIGH):`
        // over nested detail bullets is an entry.
        if let Some(stripped) = text.strip_suffix(':') {
            if is_label(stripped) && !has_children(lines, &bullets, at, indent) {
                continue;
            }
            text = stripped.trim_end().to_string();
        }

        // A top-level `Key: value` line belongs to the entry above it unless
        // that entry already carries the key.
        let key = split_key(&text).map(|(key, _)| key);
        match entries.last_mut() {
            Some(current) if !is_top || key.is_some_and(|k| current.key(k).is_none()) => {
                current.attach(text);
            }
            // Prose before the first item is an introduction.
            None if !is_top => {}
            _ if key.is_some() => {
                let mut entry = RawEntry::default();
                entry.attach(text);
                entries.push(entry);
            }
            _ => entries.push(RawEntry::new(text)),
        }
    }

    entries.retain(|entry| !is_placeholder(&entry.head));
    entries
}

// ---------------------------------------------------------------------------
// Vulnerabilities
// ---------------------------------------------------------------------------

/// Outcome of reading a severity marker.
enum Marked {
    Known(Severity),
    Unknown(String),
}

impl Marked {
    fn read(token: &str) -> Self {
        // `[Severity: High]` carries its own key.
        let token = token.rsplit(':').next().unwrap_or(token).trim();
        Severity::from_token(token).map_or_else(|| Self::Unknown(token.to_string()), Self::Known)
    }
}

/// Locate a severity marker. Returns the marker, if any, and the head with a
/// leading severity slot removed.
fn severity_of(entry: &RawEntry) -> (Option<Marked>, String) {
    let head = entry.head.as_str();

    if let Some(caps) = LEADING_SLOT.captures(head) {
        let rest = caps.get(2).map_or("", |m| m.as_str()).to_string();
        return (Some(Marked::read(&caps[1])), rest);
    }

    if let Some(caps) = SEVERITY_KEY.captures(head) {
        return (Some(Marked::read(&caps[1])), head.to_string());
    }
    if let Some(value) = entry.key(Key::Severity) {
        let token = value.split_whitespace().next().unwrap_or(value);
        return (Some(Marked::read(token)), head.to_string());
    }

    // An explicit slot outranks severity words in the prose; the last one wins.
    if let Some(caps) = SEVERITY_SLOT.captures_iter(head).last() {
        let slot = caps.get(0).map_or(0..0, |m| m.range());
        let rest = format!("{} {}", &head[..slot.start], &head[slot.end..]);
        return (Some(Marked::read(&caps[1])), rest.trim().to_string());
    }

    if let Some(caps) = LEADING_SEVERITY_WORD.captures(head) {
        let rest = caps.get(2).map_or("", |m| m.as_str()).to_string();
        return (Some(Marked::read(&caps[1])), rest);
    }

    let standalone = SEVERITY_WORD.captures_iter(head).find_map(|caps| {
        let m = caps.get(1)?;
        // "low-level" and friends are not severities.
        let hyphenated = head[m.end()..].starts_with('-') || head[..m.start()].ends_with('-');
        (!hyphenated).then(|| Marked::read(m.as_str()))
    });
    (standalone, head.to_string())
}

/// Earliest separator between a finding's name and the rest of its head.
fn name_split(head: &str, include_prepositions: bool) -> Option<(usize, usize)> {
    let lower = head.to_ascii_lowercase();
    let mut separators = vec![":", " - ", " – ", " — "];
    if include_prepositions {
        separators.extend([" in ", " at ", " ("]);
    }
    separators
        .into_iter()
        .filter_map(|sep| lower.find(sep).map(|at| (at, at + sep.len())))
        .min_by_key(|(at, _)| *at)
}

fn normalize_kind(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_');
    if out.is_empty() {
        UNSPECIFIED_TYPE.to_string()
    } else {
        out.to_string()
    }
}

fn kind_from_head(head: &str) -> String {
    let name = name_split(head, true).map_or(head, |(at, _)| &head[..at]);
    if name.split_whitespace().count() <= 6 {
        name.to_string()
    } else {
        head.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
    }
}

fn find_location<'a>(texts: impl Iterator<Item = &'a str> + Clone) -> Option<String> {
    texts
        .clone()
        .find_map(|t| CALL.find(t))
        .or_else(|| texts.clone().find_map(|t| LINES.find(t)))
        .map(|m| m.as_str().to_string())
}

fn location_of(entry: &RawEntry, head: &str) -> String {
    if let Some(value) = entry.key(Key::Location) {
        return CALL
            .find(value)
            .map_or_else(|| value.to_string(), |m| m.as_str().to_string());
    }
    let texts = std::iter::once(head).chain(entry.details.iter().map(String::as_str));
    find_location(texts).unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

fn join_nonempty<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn vulnerability(entry: &RawEntry, head: &str, severity: Severity) -> Vulnerability {
    let fields: Vec<&str> = head.split('|').map(str::trim).collect();
    let details = entry.details.iter().map(String::as_str);

    if fields.len() >= 3 {
        let rest = fields[2..].join(" | ");
        let description = join_nonempty(std::iter::once(rest.as_str()).chain(details));
        return Vulnerability {
            kind: normalize_kind(fields[0]),
            severity,
            location: if fields[1].is_empty() {
                UNKNOWN_LOCATION.to_string()
            } else {
                fields[1].to_string()
            },
            description,
        };
    }
    if fields.len() == 2 {
        let location = entry.key(Key::Location).map_or_else(
            || {
                find_location(std::iter::once(fields[1]))
                    .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
            },
            str::to_string,
        );
        return Vulnerability {
            kind: normalize_kind(fields[0]),
            severity,
            location,
            description: join_nonempty(std::iter::once(fields[1]).chain(details)),
        };
    }

    let kind = entry
        .key(Key::Type)
        .map_or_else(|| kind_from_head(head), str::to_string);
    let description = entry.key(Key::Description).map_or_else(
        || {
            name_split(head, false)
                .map(|(_, after)| head[after..].trim())
                .filter(|rest| !rest.is_empty())
                .unwrap_or(head)
                .to_string()
        },
        str::to_string,
    );

    Vulnerability {
        kind: normalize_kind(&kind),
        severity,
        location: location_of(entry, head),
        description: join_nonempty(std::iter::once(description.as_str()).chain(details)),
    }
}

/// Extract vulnerabilities, recording severity coercions in `warnings`.
pub(super) fn vulnerabilities(
    lines: &[&str],
    warnings: &mut Vec<ParseWarning>,
) -> Vec<Vulnerability> {
    collect(lines)
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let index = i + 1;
            let (marked, head) = severity_of(entry);
            let severity = match marked {
                Some(Marked::Known(severity)) => severity,
                Some(Marked::Unknown(token)) => {
                    warnings.push(ParseWarning::UnknownSeverity {
                        entry: index,
                        token,
                    });
                    Severity::Medium
                }
                None => {
                    warnings.push(ParseWarning::MissingSeverity { entry: index });
                    Severity::Medium
                }
            };
            vulnerability(entry, head.trim(), severity)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Optimizations
// ---------------------------------------------------------------------------

fn optimization(entry: &RawEntry) -> GasOptimization {
    let text = entry.text();

    let (kind, suggestion) = if let Some((kind, rest)) = text.split_once('|') {
        (kind.trim().to_string(), rest.replace('|', " ").trim().to_string())
    } else if let Some(caps) = LEADING_SLOT.captures(&text) {
        (caps[1].to_string(), caps[2].trim().to_string())
    } else if let Some((at, after)) = name_split(&text, false)
        .filter(|(at, _)| text[..*at].split_whitespace().count() <= 4)
    {
        (text[..at].to_string(), text[after..].trim().to_string())
    } else {
        (GENERAL_TYPE.to_string(), text.clone())
    };

    let keyed_suggestion = entry
        .key(Key::Suggestion)
        .or_else(|| entry.key(Key::Description));
    let kind = match (entry.key(Key::Type), keyed_suggestion) {
        (Some(kind), _) => kind.to_string(),
        // `1. Storage` followed by `- Suggestion: ...` names the type in the head.
        (None, Some(_)) if kind == GENERAL_TYPE && !entry.head.is_empty() => entry.head.clone(),
        _ => kind,
    };
    let suggestion = keyed_suggestion.map_or(suggestion, str::to_string);

    GasOptimization {
        kind: normalize_kind(&kind),
        suggestion: if suggestion.is_empty() { text } else { suggestion },
    }
}

/// Extract gas optimization suggestions.
pub(super) fn optimizations(lines: &[&str]) -> Vec<GasOptimization> {
    collect(lines).iter().map(optimization).collect()
}
