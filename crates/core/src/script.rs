use std::path::Path;

use reqwest::Client;
use tokio::fs;

use crate::{
    error::{Result, ShortreelError},
    provider::Provider,
};

const SCRIPT_SYSTEM_PROMPT: &str = r#"You are a scriptwriter for short-form vertical videos (YouTube Shorts, Reels).
Viewers scroll fast: hook them in the first sentence, keep every sentence concrete and surprising, and end with a line that lands.

When a topic is requested, write a tight spoken-word script of about 140 words (roughly 50 seconds read aloud). Plain sentences only: no stage directions, no emoji, no hashtags, no headings.

You MUST output ONLY valid JSON in this exact structure (no markdown, no explanation):
{"script": "Here is the script ..."}"#;

const QUERY_SYSTEM_PROMPT: &str = r#"You pick background footage for short-form videos.
Given one scene of narration, reply with exactly three search queries for stock video or image generation. Each query must be 1-4 words, visually concrete (things a camera can see), and ordered best match first. Never reference people by name; describe what is on screen instead.

You MUST output ONLY valid JSON in this exact structure (no markdown, no explanation):
{"queries": ["first query", "second query", "third query"]}"#;

const TOPIC_SYSTEM_PROMPT: &str = r#"You are a content strategist for short-form video channels.
Suggest 5 topics that make strong 50-second videos: each one specific, curiosity-driven, and explainable without visuals of any particular person. Plain phrases of at most 8 words, no numbering, no emoji.

You MUST output ONLY valid JSON in this exact structure (no markdown, no explanation):
{"topics": ["topic one", "topic two", "topic three", "topic four", "topic five"]}"#;

/// LLM-backed text generation: narration scripts, per-scene visual search
/// queries, and topic brainstorming.
pub struct ScriptGenerator {
    provider: Provider,
    api_key: String,
    client: Client,
}

impl ScriptGenerator {
    /// Build a generator for the given provider, validating its API key.
    pub fn new(provider: Provider) -> Result<Self> {
        let api_key = provider.validate_api_key()?;
        Ok(Self {
            provider,
            api_key,
            client: Client::new(),
        })
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Generate a ~140-word narration script for a topic.
    pub async fn generate_script(&self, topic: &str) -> Result<String> {
        let user_prompt = format!("Write the script for a short video about: {}", topic);
        let content = self.chat(SCRIPT_SYSTEM_PROMPT, &user_prompt).await?;
        parse_script_reply(&content)
    }

    /// Three short, visually concrete search queries for one scene.
    pub async fn search_queries(&self, scene_text: &str) -> Result<Vec<String>> {
        let user_prompt = format!("Scene narration:\n{}", scene_text);
        let content = self.chat(QUERY_SYSTEM_PROMPT, &user_prompt).await?;
        let queries = parse_string_array(&content, "queries")?;
        if queries.is_empty() {
            return Err(ShortreelError::CompletionFailed {
                reason: format!("no usable queries in reply: {}", content),
            });
        }
        Ok(queries)
    }

    /// Brainstorm five short-video topic ideas.
    pub async fn suggest_topics(&self) -> Result<Vec<String>> {
        let content = self
            .chat(TOPIC_SYSTEM_PROMPT, "Suggest topics for my next videos.")
            .await?;
        let topics = parse_string_array(&content, "topics")?;
        if topics.is_empty() {
            return Err(ShortreelError::CompletionFailed {
                reason: format!("no usable topics in reply: {}", content),
            });
        }
        Ok(topics)
    }

    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let config = self.provider.config();
        let response = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": system_prompt,
                    },
                    {
                        "role": "user",
                        "content": user_prompt,
                    },
                ],
                "temperature": 0.7,
            }))
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ShortreelError::CompletionFailed {
                reason: format!("Invalid API response: {:?}", response),
            })?;

        Ok(content.to_string())
    }
}

/// Load a script from a cached file
pub async fn load_script(path: &Path) -> Result<String> {
    let script = fs::read_to_string(path).await?;
    Ok(script)
}

/// Save a script to a file
pub async fn save_script(script: &str, path: &Path) -> Result<()> {
    fs::write(path, script).await?;
    Ok(())
}

/// Strip a ```json fence if the model wrapped its reply in one.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}

fn parse_script_reply(content: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fences(content))?;
    value["script"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| ShortreelError::CompletionFailed {
            reason: format!("reply had no script field: {}", content),
        })
}

fn parse_string_array(content: &str, key: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fences(content))?;
    let items = value[key]
        .as_array()
        .ok_or_else(|| ShortreelError::CompletionFailed {
            reason: format!("reply had no {} array: {}", key, content),
        })?;
    Ok(items
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn parses_a_script_reply() {
        let script = parse_script_reply(r#"{"script": "Rome fell in a day."}"#).unwrap();
        assert_eq!(script, "Rome fell in a day.");
    }

    #[test]
    fn parses_a_fenced_script_reply() {
        let content = "```json\n{\"script\": \"Deep sea fish glow.\"}\n```";
        assert_eq!(parse_script_reply(content).unwrap(), "Deep sea fish glow.");
    }

    #[test]
    fn rejects_a_reply_without_a_script() {
        let err = parse_script_reply(r#"{"text": "nope"}"#).unwrap_err();
        assert!(matches!(err, ShortreelError::CompletionFailed { .. }));
    }

    #[test]
    fn parses_query_arrays_and_drops_blanks() {
        let content = r#"{"queries": ["lava flow", "  ", "volcano aerial", "ash cloud"]}"#;
        let queries = parse_string_array(content, "queries").unwrap();
        assert_eq!(queries, vec!["lava flow", "volcano aerial", "ash cloud"]);
    }

    #[test]
    fn rejects_a_reply_without_the_expected_array() {
        let err = parse_string_array(r#"{"queries": "lava flow"}"#, "queries").unwrap_err();
        assert!(matches!(err, ShortreelError::CompletionFailed { .. }));
    }
}
