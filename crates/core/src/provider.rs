use crate::error::{Result, ShortreelError};

/// Language model vendor used for script and search-query generation.
/// All three speak the OpenAI chat-completions dialect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Grok,
    Openai,
    Gemini,
}

/// Endpoint, model, and credential source for one provider.
pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-3-pro",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Grok => "Grok",
            Provider::Openai => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        let config = self.config();
        std::env::var(config.env_var).map_err(|_| ShortreelError::MissingApiKey {
            env_var: config.env_var.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_provider_reads_its_own_key() {
        assert_eq!(Provider::Grok.config().env_var, "XAI_API_KEY");
        assert_eq!(Provider::Openai.config().env_var, "OPENAI_API_KEY");
        assert_eq!(Provider::Gemini.config().env_var, "GEMINI_API_KEY");
    }

    #[test]
    fn endpoints_speak_the_chat_completions_dialect() {
        for provider in [Provider::Grok, Provider::Openai, Provider::Gemini] {
            assert!(provider.config().api_url.ends_with("/chat/completions"));
            assert!(!provider.config().model.is_empty());
        }
    }

    #[test]
    fn grok_is_the_default() {
        assert_eq!(Provider::default(), Provider::Grok);
    }
}
