//! Scripted belief AI service for tests and offline demos.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::entry::{
    AnalyzeBeliefRequest, AnalyzeBeliefResult, DisputeBeliefRequest, DisputeBeliefResult,
};
use crate::ports::{AiServiceError, BeliefAiService};

type Script<T> = Arc<Mutex<VecDeque<Result<T, AiServiceError>>>>;

/// Belief service that replays scripted results.
///
/// Once a script runs out the service either fails with `Unavailable`
/// (the default) or, after `answering_by_default()`, synthesises a plain
/// result from the request.
#[derive(Debug, Clone, Default)]
pub struct MockBeliefService {
    analyses: Script<AnalyzeBeliefResult>,
    disputes: Script<DisputeBeliefResult>,
    answer_by_default: bool,
    delay: Duration,
    analyze_calls: Arc<Mutex<Vec<AnalyzeBeliefRequest>>>,
    dispute_calls: Arc<Mutex<Vec<DisputeBeliefRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockBeliefService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering_by_default(mut self) -> Self {
        self.answer_by_default = true;
        self
    }

    pub fn with_analysis(self, result: AnalyzeBeliefResult) -> Self {
        lock(&self.analyses).push_back(Ok(result));
        self
    }

    pub fn with_analysis_error(self, error: AiServiceError) -> Self {
        lock(&self.analyses).push_back(Err(error));
        self
    }

    pub fn with_dispute(self, result: DisputeBeliefResult) -> Self {
        lock(&self.disputes).push_back(Ok(result));
        self
    }

    pub fn with_dispute_error(self, error: AiServiceError) -> Self {
        lock(&self.disputes).push_back(Err(error));
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn analyze_call_count(&self) -> usize {
        lock(&self.analyze_calls).len()
    }

    pub fn dispute_call_count(&self) -> usize {
        lock(&self.dispute_calls).len()
    }

    pub fn dispute_calls(&self) -> Vec<DisputeBeliefRequest> {
        lock(&self.dispute_calls).clone()
    }

    fn default_analysis(request: &AnalyzeBeliefRequest) -> AnalyzeBeliefResult {
        AnalyzeBeliefResult {
            restated_belief: request.belief.clone(),
            thinking_patterns: Vec::new(),
            summary: "No thinking patterns detected.".to_string(),
        }
    }

    fn default_dispute(request: &DisputeBeliefRequest) -> DisputeBeliefResult {
        DisputeBeliefResult {
            acknowledgement: "That sounds difficult.".to_string(),
            counterpoints: vec![format!("\"{}\" is one reading of events.", request.inputs.belief)],
            alternative_belief: format!(
                "Alternative {}",
                request.previous_alternatives.len() + 1
            ),
            encouragement: "Keep going.".to_string(),
        }
    }

    fn exhausted() -> AiServiceError {
        AiServiceError::Unavailable("no scripted response".to_string())
    }
}

#[async_trait]
impl BeliefAiService for MockBeliefService {
    async fn analyze_belief(
        &self,
        request: AnalyzeBeliefRequest,
    ) -> Result<AnalyzeBeliefResult, AiServiceError> {
        lock(&self.analyze_calls).push(request.clone());
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let scripted = lock(&self.analyses).pop_front();
        match scripted {
            Some(result) => result,
            None if self.answer_by_default => Ok(Self::default_analysis(&request)),
            None => Err(Self::exhausted()),
        }
    }

    async fn dispute_belief(
        &self,
        request: DisputeBeliefRequest,
    ) -> Result<DisputeBeliefResult, AiServiceError> {
        lock(&self.dispute_calls).push(request.clone());
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let scripted = lock(&self.disputes).pop_front();
        match scripted {
            Some(result) => result,
            None if self.answer_by_default => Ok(Self::default_dispute(&request)),
            None => Err(Self::exhausted()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalyzeBeliefRequest {
        AnalyzeBeliefRequest {
            adversity: "Rain on my day off".to_string(),
            belief: "Everything goes wrong for me".to_string(),
            consequence: None,
        }
    }

    #[tokio::test]
    async fn replays_script_then_fails() {
        let service = MockBeliefService::new()
            .with_analysis_error(AiServiceError::Timeout)
            .with_analysis(MockBeliefService::default_analysis(&request()));

        assert_eq!(
            service.analyze_belief(request()).await.unwrap_err(),
            AiServiceError::Timeout
        );
        assert!(service.analyze_belief(request()).await.is_ok());
        assert!(matches!(
            service.analyze_belief(request()).await,
            Err(AiServiceError::Unavailable(_))
        ));
        assert_eq!(service.analyze_call_count(), 3);
    }

    #[tokio::test]
    async fn answers_by_default_when_asked_to() {
        let service = MockBeliefService::new().answering_by_default();

        let result = service.analyze_belief(request()).await.unwrap();
        assert_eq!(result.restated_belief, "Everything goes wrong for me");
    }
}
