use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::application::errors::PipelineError;

/// A caller-supplied bound on the blocking stages of one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
    budget: Duration,
}

impl Deadline {
    /// A budget too large to represent as an instant never expires.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(budget),
            budget,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            at: None,
            budget: Duration::MAX,
        }
    }

    pub fn from_option(budget: Option<Duration>) -> Self {
        budget.map(Self::after).unwrap_or_else(Self::unbounded)
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Runs `fut` to completion or fails with `PipelineError::Timeout` once
    /// the deadline passes. An already expired deadline never polls `fut`.
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, E>>,
        PipelineError: From<E>,
    {
        if self.is_expired() {
            return Err(PipelineError::Timeout(self.budget));
        }
        match self.at {
            None => fut.await.map_err(PipelineError::from),
            Some(at) => match tokio::time::timeout_at(at, fut).await {
                Ok(result) => result.map_err(PipelineError::from),
                Err(_) => Err(PipelineError::Timeout(self.budget)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::embedding_provider::EmbeddingProviderError;

    #[tokio::test(start_paused = true)]
    async fn test_slow_stage_times_out() {
        let deadline = Deadline::after(Duration::from_secs(1));
        let result = deadline
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, EmbeddingProviderError>(())
            })
            .await;
        assert!(matches!(result, Err(PipelineError::Timeout(d)) if d == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_huge_budget_is_unbounded() {
        let deadline = Deadline::after(Duration::from_secs(u64::MAX));
        assert!(!deadline.is_expired());
        let result = deadline.run(async { Ok::<_, EmbeddingProviderError>(7) }).await;
        assert!(matches!(result, Ok(7)));
    }

    #[tokio::test]
    async fn test_unbounded_passes_errors_through() {
        let result = Deadline::unbounded()
            .run(async { Err::<(), _>(EmbeddingProviderError::EmptyInput) })
            .await;
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }
}
