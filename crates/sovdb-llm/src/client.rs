//! HTTP client for the completion API.
//!
//! Wraps `reqwest` with API-key auth, typed error handling, and the
//! onboarding/narrative helpers built on top of raw completions.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::parse::parse_prompt_list;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.completions.dev/";

/// Client for the generative-AI completion API.
///
/// Use [`CompletionClient::new`] for production or
/// [`CompletionClient::with_base_url`] to point at a mock server in tests.
pub struct CompletionClient {
    client: Client,
    api_key: String,
    completions_url: Url,
    model: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Structured output of the website-analysis step.
#[derive(Debug, Clone, Deserialize)]
pub struct WebsiteAnalysis {
    pub description: String,
    pub keywords: Vec<String>,
}

impl CompletionClient {
    /// Creates a client pointed at the production completion API.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, LlmError> {
        Self::with_base_url(
            api_key,
            model,
            timeout_secs,
            max_retries,
            backoff_base_ms,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`LlmError::Api`] if `base_url` is not a
    /// valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("sovdb/0.1 (visibility-analytics)")
            .build()?;

        // Normalise the trailing slash so join() appends rather than
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let completions_url = Url::parse(&normalised)
            .and_then(|base| base.join("v1/completions"))
            .map_err(|e| LlmError::Api {
                status: 0,
                message: format!("invalid base URL '{base_url}': {e}"),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            completions_url,
            model: model.to_owned(),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Requests a raw completion, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`LlmError::Api`] on non-2xx responses, after retries for 5xx.
    /// - [`LlmError::Http`] on network failure, after retries.
    /// - [`LlmError::Deserialize`] if the response is not the expected shape.
    pub async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.complete_once(prompt, max_tokens)
        })
        .await
    }

    async fn complete_once(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.completions_url.clone())
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest {
                model: &self.model,
                prompt,
                max_tokens,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_owned(),
            };
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
                context: "completion response".to_owned(),
                source: e,
            })?;

        Ok(parsed.text)
    }

    /// Summarizes a brand's website into a description and topical keywords.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::complete`] errors, plus [`LlmError::Deserialize`]
    /// if the model does not return the requested JSON shape.
    pub async fn analyze_website(
        &self,
        brand_name: &str,
        website: &str,
    ) -> Result<WebsiteAnalysis, LlmError> {
        let prompt = format!(
            "Analyze the company website {website} for the brand \"{brand_name}\". \
             Respond with JSON only, no prose: \
             {{\"description\": \"<one-paragraph summary>\", \
               \"keywords\": [\"<5 to 8 short topical keywords>\"]}}"
        );
        let text = self.complete(&prompt, 512).await?;
        serde_json::from_str(strip_code_fence(&text)).map_err(|e| LlmError::Deserialize {
            context: format!("analyze_website({website})"),
            source: e,
        })
    }

    /// Drafts search-style prompts a buyer might ask about the brand's space.
    ///
    /// Returns at most `count` prompts, in the model's order.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::complete`] errors.
    pub async fn generate_prompts(
        &self,
        brand_name: &str,
        description: &str,
        count: usize,
    ) -> Result<Vec<String>, LlmError> {
        let prompt = format!(
            "Brand: {brand_name}. What it does: {description}. \
             Write {count} distinct questions a potential customer might ask an \
             AI assistant where this brand could plausibly be recommended. \
             Do not name the brand itself. Return a numbered list, one question \
             per line, nothing else."
        );
        let text = self.complete(&prompt, 1_024).await?;
        let mut prompts = parse_prompt_list(&text);
        prompts.truncate(count);
        Ok(prompts)
    }

    /// Rewrites draft prompts to be more specific and less brand-biased.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::complete`] errors.
    pub async fn improve_prompts(
        &self,
        brand_name: &str,
        drafts: &[String],
    ) -> Result<Vec<String>, LlmError> {
        let numbered: String = drafts
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}. {d}\n", i + 1))
            .collect();
        let prompt = format!(
            "These prompts track AI visibility for the brand {brand_name}:\n{numbered}\n\
             Rewrite each to be specific, neutral, and phrased the way a real \
             person asks an assistant. Return the same number of prompts as a \
             numbered list, one per line, nothing else."
        );
        let text = self.complete(&prompt, 1_024).await?;
        Ok(parse_prompt_list(&text))
    }

    /// Produces a short narrative summary of a share-of-voice breakdown.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::complete`] errors.
    pub async fn summarize_visibility(
        &self,
        brand_name: &str,
        slice_lines: &[String],
    ) -> Result<String, LlmError> {
        let breakdown = slice_lines.join("\n");
        let prompt = format!(
            "Share of voice for {brand_name} across AI assistant answers:\n{breakdown}\n\
             Summarize the competitive picture in two or three plain sentences \
             for a marketing dashboard. No bullet points."
        );
        let text = self.complete(&prompt, 256).await?;
        Ok(text.trim().to_owned())
    }
}

/// Drops a wrapping markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the fence line.
    let inner = inner.split_once('\n').map_or(inner, |(_, rest)| rest);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_fence_passes_plain_text_through() {
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn strip_code_fence_removes_fence_and_language_tag() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }
}
