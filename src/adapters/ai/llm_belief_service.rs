//! LLM-backed belief AI service.
//!
//! Builds prompts that ask the model for a JSON object, parses the reply, and
//! drops anything that does not hold up against the user's own text.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AiConfig;
use crate::domain::entry::{
    AnalyzeBeliefRequest, AnalyzeBeliefResult, DisputeBeliefRequest, DisputeBeliefResult,
};
use crate::ports::{
    AIProvider, AiServiceError, BeliefAiService, CompletionRequest, MessageRole, Operation,
    RequestMetadata,
};

const ANALYZE_SYSTEM_PROMPT: &str = "You are a supportive cognitive behavioural therapy \
assistant. You help people notice thinking patterns in their beliefs. You never diagnose. \
Reply with a single JSON object and nothing else.";

const DISPUTE_SYSTEM_PROMPT: &str = "You are a supportive cognitive behavioural therapy \
assistant. You help people dispute unhelpful beliefs with gentle, evidence-based \
counterpoints. Reply with a single JSON object and nothing else.";

/// Belief AI service on top of a completion provider.
pub struct LlmBeliefService {
    ai_provider: Arc<dyn AIProvider>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl LlmBeliefService {
    pub fn new(ai_provider: Arc<dyn AIProvider>, config: &AiConfig) -> Self {
        Self {
            ai_provider,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
        }
    }

    /// One provider call, bounded by the configured timeout.
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiServiceError> {
        match tokio::time::timeout(self.timeout, self.ai_provider.complete(request)).await {
            Ok(response) => Ok(response?.content),
            Err(_) => Err(AiServiceError::Timeout),
        }
    }

    fn request(&self, operation: Operation, system: &str, prompt: String) -> CompletionRequest {
        let trace_id = format!("{:?}-{}", operation, uuid::Uuid::new_v4());
        CompletionRequest::new(RequestMetadata::new(operation, trace_id))
            .with_system_prompt(system)
            .with_message(MessageRole::User, prompt)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }

    fn create_analyze_prompt(request: &AnalyzeBeliefRequest) -> String {
        format!(
            r#"Analyze the belief in this journal entry.

Adversity (what happened): {}
Belief (what I told myself): {}
Consequence (how I felt and acted): {}

Provide a JSON response with:
{{
  "restatedBelief": "the belief restated in neutral, non-judgemental words",
  "thinkingPatterns": [
    {{
      "label": "name of the thinking pattern, e.g. Catastrophizing",
      "quote": "an exact excerpt copied from the Belief text",
      "rationale": "one sentence on why the excerpt fits the pattern"
    }}
  ],
  "summary": "two or three sentences that teach the patterns found"
}}

Only report patterns you can quote word for word from the Belief."#,
            request.adversity,
            request.belief,
            request.consequence.as_deref().unwrap_or("(not provided)"),
        )
    }

    fn create_dispute_prompt(request: &DisputeBeliefRequest) -> String {
        let mut context = String::new();
        if let Some(restated) = &request.restated_belief {
            context.push_str(&format!("Restated belief: {}\n", restated));
        }
        if !request.thinking_patterns.is_empty() {
            context.push_str(&format!(
                "Thinking patterns noticed: {}\n",
                request.thinking_patterns.join(", ")
            ));
        }
        if !request.previous_alternatives.is_empty() {
            context.push_str("Alternatives already offered (suggest something different):\n");
            for alternative in &request.previous_alternatives {
                context.push_str(&format!("- {}\n", alternative));
            }
        }

        format!(
            r#"Help me dispute the belief in this journal entry.

Adversity (what happened): {}
Belief (what I told myself): {}
Consequence (how I felt and acted): {}
{}
Provide a JSON response with:
{{
  "acknowledgement": "one or two sentences validating how I feel",
  "counterpoints": ["evidence or perspective that challenges the belief"],
  "alternativeBelief": "one balanced belief I could hold instead",
  "encouragement": "a short closing encouragement"
}}"#,
            request.inputs.adversity,
            request.inputs.belief,
            request.inputs.consequence.as_deref().unwrap_or("(not provided)"),
            context,
        )
    }

    fn parse_analysis(content: &str, belief: &str) -> Result<AnalyzeBeliefResult, AiServiceError> {
        let mut result: AnalyzeBeliefResult = parse_json_object(content)?;
        if result.restated_belief.trim().is_empty() {
            return Err(AiServiceError::invalid_response("restatedBelief is empty"));
        }

        for finding in result.retain_verbatim_findings(belief) {
            tracing::warn!(
                label = %finding.label,
                quote = %finding.quote,
                "Dropping thinking pattern whose quote is not in the belief"
            );
        }
        Ok(result)
    }

    fn parse_dispute(content: &str) -> Result<DisputeBeliefResult, AiServiceError> {
        let mut result: DisputeBeliefResult = parse_json_object(content)?;
        result.counterpoints.retain(|point| !point.trim().is_empty());

        if result.counterpoints.is_empty() {
            return Err(AiServiceError::invalid_response("no counterpoints"));
        }
        if result.alternative_belief.trim().is_empty() {
            return Err(AiServiceError::invalid_response("alternativeBelief is empty"));
        }
        Ok(result)
    }
}

/// Strips an optional Markdown code fence around the reply.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_json_object<T: DeserializeOwned>(content: &str) -> Result<T, AiServiceError> {
    serde_json::from_str(strip_code_fence(content))
        .map_err(|e| AiServiceError::invalid_response(format!("Failed to parse AI response: {}", e)))
}

#[async_trait]
impl BeliefAiService for LlmBeliefService {
    async fn analyze_belief(
        &self,
        request: AnalyzeBeliefRequest,
    ) -> Result<AnalyzeBeliefResult, AiServiceError> {
        let completion = self.request(
            Operation::AnalyzeBelief,
            ANALYZE_SYSTEM_PROMPT,
            Self::create_analyze_prompt(&request),
        );
        let content = self.complete(completion).await?;
        Self::parse_analysis(&content, &request.belief)
    }

    async fn dispute_belief(
        &self,
        request: DisputeBeliefRequest,
    ) -> Result<DisputeBeliefResult, AiServiceError> {
        let completion = self.request(
            Operation::DisputeBelief,
            DISPUTE_SYSTEM_PROMPT,
            Self::create_dispute_prompt(&request),
        );
        let content = self.complete(completion).await?;
        Self::parse_dispute(&content)
    }
}
