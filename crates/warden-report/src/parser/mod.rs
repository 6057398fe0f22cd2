//! Model reply parser.
//!
//! Parsing runs in two passes. The reply is first segmented into sections by
//! the grammar's headers; each section body is then read by its own tolerant
//! extractor ([`entries`] for findings and optimizations, [`score`] for the
//! score). Anything the extractors have to guess at is reported as a
//! [`ParseWarning`]. Only a reply with no recognizable header at all fails.

mod entries;
mod score;

use std::fmt;

use serde::Serialize;
use warden_core::enums::PromptVersion;
use warden_core::report::{AnalysisReport, SecurityScore};

use crate::error::ParseError;
use crate::grammar::{Grammar, Section};

/// A non-fatal anomaly met while coercing the reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// A severity slot held something other than high/medium/low.
    UnknownSeverity { entry: usize, token: String },
    /// A finding carried no severity marker at all.
    MissingSeverity { entry: usize },
    /// A section header never appeared.
    MissingSection { section: Section },
    /// No integer in `0..=100` was found in the score section.
    Unscored,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSeverity { entry, token } => write!(
                f,
                "vulnerability #{entry}: unrecognized severity '{token}', coerced to medium"
            ),
            Self::MissingSeverity { entry } => {
                write!(f, "vulnerability #{entry}: no severity given, coerced to medium")
            }
            Self::MissingSection { section } => write!(f, "{section} section missing from reply"),
            Self::Unscored => {
                f.write_str("no valid 0-100 security score found, recorded as unscored")
            }
        }
    }
}

/// A successfully parsed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReport {
    pub report: AnalysisReport,
    pub warnings: Vec<ParseWarning>,
}

/// Section bodies in reply order, `None` for sections whose header never appeared.
#[derive(Debug, Default)]
struct Segments<'a> {
    bodies: [Option<Vec<&'a str>>; 3],
}

impl<'a> Segments<'a> {
    fn get(&self, section: Section) -> Option<&[&'a str]> {
        self.bodies[section.index()].as_deref()
    }

    fn is_empty(&self) -> bool {
        self.bodies.iter().all(Option::is_none)
    }
}

fn segment<'a>(raw: &'a str, grammar: &Grammar) -> Segments<'a> {
    let mut segments = Segments::default();
    let mut current: Option<Section> = None;

    for line in raw.lines() {
        if let Some((section, inline)) = grammar.match_header(line) {
            // A repeated header appends to the existing body.
            let body = segments.bodies[section.index()].get_or_insert_with(Vec::new);
            if !inline.is_empty() {
                body.push(inline);
            }
            current = Some(section);
        } else if let Some(section) = current {
            if let Some(body) = segments.bodies[section.index()].as_mut() {
                body.push(line);
            }
        }
        // Text before the first header is preamble and is dropped.
    }
    segments
}

/// Parse a raw model reply with the grammar for `version`.
///
/// # Errors
///
/// Returns `ParseError::Unparseable` when the reply contains none of the
/// grammar's section headers.
pub fn parse(raw: &str, version: PromptVersion) -> Result<ParsedReport, ParseError> {
    let grammar = Grammar::for_version(version);
    let segments = segment(raw, grammar);
    if segments.is_empty() {
        return Err(ParseError::Unparseable {
            reason: format!("no {version} section headers found"),
        });
    }

    let mut warnings = Vec::new();

    let vulnerabilities = match segments.get(Section::Scan) {
        Some(lines) => entries::vulnerabilities(lines, &mut warnings),
        None => {
            warnings.push(ParseWarning::MissingSection {
                section: Section::Scan,
            });
            Vec::new()
        }
    };

    let gas_optimizations = match segments.get(Section::Optimization) {
        Some(lines) => entries::optimizations(lines),
        None => {
            warnings.push(ParseWarning::MissingSection {
                section: Section::Optimization,
            });
            Vec::new()
        }
    };

    let score = match segments.get(Section::Score) {
        Some(lines) => score::extract(lines),
        None => {
            warnings.push(ParseWarning::MissingSection {
                section: Section::Score,
            });
            None
        }
    };
    let security_score = score.unwrap_or_else(|| {
        warnings.push(ParseWarning::Unscored);
        SecurityScore::UNSCORED
    });

    Ok(ParsedReport {
        report: AnalysisReport {
            vulnerabilities,
            gas_optimizations,
            security_score,
        },
        warnings,
    })
}
