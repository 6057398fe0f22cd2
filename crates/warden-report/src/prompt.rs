//! Deterministic analysis prompt rendering.

use warden_core::enums::PromptVersion;
use warden_core::request::AnalysisRequest;

use crate::error::PromptError;
use crate::grammar::{Grammar, Section};

/// Marker prepended to the contract in the user message.
const CONTRACT_MARKER: &str = "[ANALYZING_CONTRACT]";

/// Renders analysis requests for one prompt version and size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBuilder {
    version: PromptVersion,
    max_source_bytes: usize,
}

impl PromptBuilder {
    /// Builder for the current prompt version.
    #[must_use]
    pub const fn new(max_source_bytes: usize) -> Self {
        Self {
            version: PromptVersion::CURRENT,
            max_source_bytes,
        }
    }

    #[must_use]
    pub const fn with_version(mut self, version: PromptVersion) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub const fn version(&self) -> PromptVersion {
        self.version
    }

    #[must_use]
    pub const fn max_source_bytes(&self) -> usize {
        self.max_source_bytes
    }

    /// Check a contract source without rendering anything.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::EmptySource` for empty or whitespace-only input and
    /// `PromptError::SourceTooLarge` above the configured byte limit.
    pub fn validate(&self, contract_source: &str) -> Result<(), PromptError> {
        if contract_source.trim().is_empty() {
            return Err(PromptError::EmptySource);
        }
        if contract_source.len() > self.max_source_bytes {
            return Err(PromptError::SourceTooLarge {
                len: contract_source.len(),
                max: self.max_source_bytes,
            });
        }
        Ok(())
    }

    /// Render the request for `contract_source`. The source is embedded verbatim.
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate`].
    pub fn build(&self, contract_source: &str) -> Result<AnalysisRequest, PromptError> {
        self.validate(contract_source)?;
        let grammar = Grammar::for_version(self.version);
        Ok(AnalysisRequest {
            version: self.version,
            system_prompt: system_prompt(grammar),
            user_prompt: format!("{CONTRACT_MARKER}\n{contract_source}"),
        })
    }
}

fn system_prompt(grammar: &Grammar) -> String {
    match grammar.version {
        PromptVersion::V1 => format!(
            "[SYSTEM: INITIALIZING SMART CONTRACT ANALYSIS]
You are an advanced AI security expert. Analyze smart contracts following this format:

{scan}
- List critical vulnerabilities with severity levels (HIGH/MEDIUM/LOW)
- Write one finding per line as: - [SEVERITY] type | location | description
- Include line numbers for each issue
- Explain potential exploit scenarios

{optimization}
- Identify gas optimization opportunities
- Write one suggestion per line as: - [type] suggestion
- Calculate potential gas savings

{score}
- Rate overall security (0-100), written as N/100
- List key security strengths
- Highlight areas needing immediate attention",
            scan = grammar.tag(Section::Scan),
            optimization = grammar.tag(Section::Optimization),
            score = grammar.tag(Section::Score),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str =
        "pragma solidity ^0.8.0;\ncontract Vault { function withdraw() public {} }";

    #[test]
    fn renders_all_section_headers() {
        let request = PromptBuilder::new(1024).build(SOURCE).unwrap();
        assert_eq!(request.version, PromptVersion::V1);
        assert!(request.system_prompt.contains("[VULNERABILITY_SCAN]"));
        assert!(request.system_prompt.contains("[OPTIMIZATION_ANALYSIS]"));
        assert!(request.system_prompt.contains("[SECURITY_SCORE]"));
    }

    #[test]
    fn embeds_source_verbatim() {
        let source = "  contract A {}\n\n";
        let request = PromptBuilder::new(1024).build(source).unwrap();
        assert_eq!(request.user_prompt, format!("[ANALYZING_CONTRACT]\n{source}"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let builder = PromptBuilder::new(1024);
        assert_eq!(builder.build(SOURCE).unwrap(), builder.build(SOURCE).unwrap());
    }

    #[test]
    fn rejects_empty_and_blank_source() {
        let builder = PromptBuilder::new(1024);
        assert_eq!(builder.build(""), Err(PromptError::EmptySource));
        assert_eq!(builder.build(" \n\t "), Err(PromptError::EmptySource));
    }

    #[test]
    fn rejects_oversized_source() {
        let builder = PromptBuilder::new(10);
        assert_eq!(
            builder.build("contract Big {}"),
            Err(PromptError::SourceTooLarge { len: 15, max: 10 })
        );
    }

    #[test]
    fn limit_is_inclusive() {
        let builder = PromptBuilder::new(15);
        assert!(builder.build("contract Big {}").is_ok());
    }

    #[test]
    fn system_prompt_headers_come_from_grammar() {
        let grammar = Grammar::for_version(PromptVersion::V1);
        let prompt = system_prompt(grammar);
        for section in Section::ALL {
            let line = prompt
                .lines()
                .find(|line| grammar.match_header(line).is_some_and(|(s, _)| s == section));
            assert!(line.is_some(), "prompt should contain a {section} header line");
        }
    }
}
