//! Session configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "share_base_url": "https://example.org/kidcode/", "max_steps": 100000 }
//! ```

use kidcode_codegen::{EmptyInputPolicy, GenerateOptions};
use kidcode_eval::RunLimits;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Key the saved program is stored under.
    pub storage_key: String,

    /// Key recording that the tutorial has been shown.
    pub tutorial_key: String,

    /// Prefix of share links; the payload follows as `#code=...`.
    pub share_base_url: String,

    pub empty_input_policy: EmptyInputPolicy,

    /// Step bound for runs. `None` runs to completion.
    pub max_steps: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: "kidsProgramBlocks".to_string(),
            tutorial_key: "tutorialShown".to_string(),
            share_base_url: String::new(),
            empty_input_policy: EmptyInputPolicy::default(),
            max_steps: None,
        }
    }
}

impl SessionConfig {
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        serde_json::from_str(text).map_err(|e| SessionError::Config(e.to_string()))
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            empty_input: self.empty_input_policy,
        }
    }

    pub fn run_limits(&self) -> RunLimits {
        RunLimits {
            max_steps: self.max_steps,
        }
    }
}
