//! Retrieval mode and system prompt selection.
//!
//! The backend answers with one of several retrieval-augmented generation
//! pipelines. The active pipeline is written as `"<type>/<mode>"`, e.g.
//! `lightrag/hybrid` or `rag/openai/gpt-4.1`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModeParseError;

/// Mode used when nothing else is configured.
pub const DEFAULT_MODE: &str = "lightrag/naive";

/// A parsed `"<type>/<mode>"` selector.
///
/// Only the first `/` separates type from mode, so model paths such as
/// `openai/gpt-4.1` survive intact as the mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RetrievalMode {
    pub retrieval_type: String,
    pub retrieval_mode: String,
}

impl RetrievalMode {
    pub fn new(retrieval_type: impl Into<String>, retrieval_mode: impl Into<String>) -> Self {
        Self {
            retrieval_type: retrieval_type.into(),
            retrieval_mode: retrieval_mode.into(),
        }
    }
}

impl Default for RetrievalMode {
    fn default() -> Self {
        Self::new("lightrag", "naive")
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.retrieval_type, self.retrieval_mode)
    }
}

impl FromStr for RetrievalMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (retrieval_type, retrieval_mode) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| ModeParseError::MissingSeparator(s.to_string()))?;
        if retrieval_type.is_empty() || retrieval_mode.is_empty() {
            return Err(ModeParseError::EmptySegment(s.to_string()));
        }
        Ok(Self::new(retrieval_type, retrieval_mode))
    }
}

impl Serialize for RetrievalMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RetrievalMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Group a catalogue entry is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModeGroup {
    LightRag,
    Rag,
}

impl fmt::Display for ModeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeGroup::LightRag => write!(f, "LightRag"),
            ModeGroup::Rag => write!(f, "Rag"),
        }
    }
}

/// A selectable entry of the mode catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeOption {
    pub label: &'static str,
    pub value: &'static str,
    pub group: ModeGroup,
}

/// Modes offered by the selector, in display order.
pub const MODE_CATALOGUE: &[ModeOption] = &[
    ModeOption {
        label: "Naive",
        value: "lightrag/naive",
        group: ModeGroup::LightRag,
    },
    ModeOption {
        label: "Local",
        value: "lightrag/local",
        group: ModeGroup::LightRag,
    },
    ModeOption {
        label: "Global",
        value: "lightrag/global",
        group: ModeGroup::LightRag,
    },
    ModeOption {
        label: "Hybrid",
        value: "lightrag/hybrid",
        group: ModeGroup::LightRag,
    },
    ModeOption {
        label: "GPT-4.1 Mini",
        value: "rag/openai/gpt-4.1-mini",
        group: ModeGroup::Rag,
    },
    ModeOption {
        label: "GPT-4.1",
        value: "rag/openai/gpt-4.1",
        group: ModeGroup::Rag,
    },
    ModeOption {
        label: "Gemini 2.5 Flash",
        value: "rag/google/gemini-2.5-flash-preview-05-20",
        group: ModeGroup::Rag,
    },
    ModeOption {
        label: "Grok 3 Mini",
        value: "rag/x-ai/grok-3-mini-beta",
        group: ModeGroup::Rag,
    },
];

/// Look up a catalogue entry by its `"<type>/<mode>"` value.
pub fn find_mode(value: &str) -> Option<&'static ModeOption> {
    MODE_CATALOGUE.iter().find(|option| option.value == value)
}

/// Which system prompt the backend should use for a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemPromptType {
    /// Plain assistant, no system prompt.
    Chat,
    /// Backend-provided compliance checking prompt.
    Compliance,
    /// The user's own prompt, sent as `custom_prompt`.
    Custom,
}

impl fmt::Display for SystemPromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemPromptType::Chat => write!(f, "chat"),
            SystemPromptType::Compliance => write!(f, "compliance"),
            SystemPromptType::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for SystemPromptType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(SystemPromptType::Chat),
            "compliance" => Ok(SystemPromptType::Compliance),
            "custom" => Ok(SystemPromptType::Custom),
            other => Err(format!("invalid system prompt type: '{other}'")),
        }
    }
}

impl Default for SystemPromptType {
    fn default() -> Self {
        SystemPromptType::Chat
    }
}

/// System prompt configuration sent with every thread message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub system_prompt_type: SystemPromptType,
    /// Only meaningful when `system_prompt_type` is `Custom`.
    #[serde(default)]
    pub custom_prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_slash() {
        let mode: RetrievalMode = "rag/openai/gpt-4.1".parse().unwrap();
        assert_eq!(mode.retrieval_type, "rag");
        assert_eq!(mode.retrieval_mode, "openai/gpt-4.1");
        assert_eq!(mode.to_string(), "rag/openai/gpt-4.1");
    }

    #[test]
    fn test_parse_lightrag() {
        let mode: RetrievalMode = "lightrag/hybrid".parse().unwrap();
        assert_eq!(mode, RetrievalMode::new("lightrag", "hybrid"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            "lightrag".parse::<RetrievalMode>(),
            Err(ModeParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "/naive".parse::<RetrievalMode>(),
            Err(ModeParseError::EmptySegment(_))
        ));
        assert!(matches!(
            "rag/".parse::<RetrievalMode>(),
            Err(ModeParseError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_default_mode_matches_constant() {
        assert_eq!(RetrievalMode::default().to_string(), DEFAULT_MODE);
    }

    #[test]
    fn test_catalogue_values_all_parse() {
        for option in MODE_CATALOGUE {
            assert!(option.value.parse::<RetrievalMode>().is_ok(), "{}", option.value);
        }
        assert_eq!(find_mode("lightrag/global").map(|o| o.label), Some("Global"));
        assert!(find_mode("rag/unknown").is_none());
    }

    #[test]
    fn test_retrieval_mode_serde_as_string() {
        let json = serde_json::to_string(&RetrievalMode::new("rag", "openai/gpt-4.1")).unwrap();
        assert_eq!(json, "\"rag/openai/gpt-4.1\"");
        let parsed: RetrievalMode = serde_json::from_str("\"lightrag/local\"").unwrap();
        assert_eq!(parsed.retrieval_mode, "local");
        assert!(serde_json::from_str::<RetrievalMode>("\"nope\"").is_err());
    }

    #[test]
    fn test_prompt_config_default() {
        let config = PromptConfig::default();
        assert_eq!(config.system_prompt_type, SystemPromptType::Chat);
        assert!(config.custom_prompt.is_empty());
    }
}
