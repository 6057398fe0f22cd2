//! The rendered request handed from the prompt builder to the model client.

use serde::{Deserialize, Serialize};

use crate::enums::PromptVersion;

/// A model request: system instructions plus the contract under review.
///
/// The `version` travels with the request so the reply is parsed with the
/// grammar the prompt asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub version: PromptVersion,
    pub system_prompt: String,
    pub user_prompt: String,
}
