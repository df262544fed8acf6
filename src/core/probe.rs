use crate::core::error::{WorkbenchError, WorkbenchResult};
use crate::core::executor::Executor;
use crate::core::request::ResourceExpression;
use owo_colors::OwoColorize;
use std::io::Write;

/// Token index of the start time in `srun --test-only` diagnostics:
///
/// `srun: Job 4242 to start at 2024-05-01T10:12:00 using 5 processors on nodes ...`
pub const START_TIME_TOKEN: usize = 6;

/// Pulls a start-time estimate out of the scheduler's dry-run diagnostics.
pub trait StartTimeScraper {
    fn scrape(&self, diagnostics: &str) -> WorkbenchResult<String>;
}

/// Takes the n-th whitespace separated token, as the scheduler phrases it today.
#[derive(Debug, Clone, Copy)]
pub struct FixedTokenScraper {
    index: usize,
}

impl Default for FixedTokenScraper {
    fn default() -> Self {
        Self {
            index: START_TIME_TOKEN,
        }
    }
}

impl FixedTokenScraper {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

impl StartTimeScraper for FixedTokenScraper {
    fn scrape(&self, diagnostics: &str) -> WorkbenchResult<String> {
        diagnostics
            .split_whitespace()
            .nth(self.index)
            .map(str::to_string)
            .ok_or_else(|| WorkbenchError::ProbeParse {
                diagnostics: diagnostics.trim().to_string(),
            })
    }
}

/// Asks the scheduler when a job with this expression would start.
pub struct AvailabilityProbe<S = FixedTokenScraper> {
    scraper: S,
    dashboard: String,
}

impl AvailabilityProbe {
    pub fn new(dashboard: impl Into<String>) -> Self {
        Self::with_scraper(FixedTokenScraper::default(), dashboard)
    }
}

impl<S: StartTimeScraper> AvailabilityProbe<S> {
    pub fn with_scraper(scraper: S, dashboard: impl Into<String>) -> Self {
        Self {
            scraper,
            dashboard: dashboard.into(),
        }
    }

    /// Run the dry-run, report the estimate and the advisory text to `out`.
    pub async fn estimate_start_time<E: Executor>(
        &self,
        executor: &E,
        expression: &ResourceExpression,
        out: &mut impl Write,
    ) -> anyhow::Result<String> {
        let diagnostics = executor.test_only(expression).await?;
        tracing::debug!(%diagnostics, "Dry-run diagnostics");

        let estimate = self.scraper.scrape(&diagnostics)?;
        tracing::info!(%estimate, "Estimated start time");

        writeln!(out, "\nEstimated Start Time: {}", estimate.red())?;
        writeln!(out, "{}", self.advisory())?;
        Ok(estimate)
    }

    pub fn advisory(&self) -> String {
        format!(
            "If the job takes longer than 1-2 minutes to start, check {} and\n{} for resource availability. If utilization is at capacity, the\ninteractive option may be unavailable.\n",
            self.dashboard.bright_cyan(),
            "squeue".bright_cyan()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::tests::FakeExecutor;
    use crate::core::request::{RequestBuilder, ResourceRequest};
    use proptest::prelude::*;

    const SRUN_ESTIMATE: &str =
        "srun: Job 4242 to start at 2024-05-01T10:12:00 using 5 processors on nodes gpu01 in partition batch\n";

    #[test]
    fn test_scrape_real_diagnostics() {
        let estimate = FixedTokenScraper::default().scrape(SRUN_ESTIMATE).unwrap();
        assert_eq!(estimate, "2024-05-01T10:12:00");
    }

    #[test]
    fn test_scrape_seventh_token() {
        let text = "token0 token1 token2 token3 token4 token5 START trailing";
        assert_eq!(FixedTokenScraper::default().scrape(text).unwrap(), "START");
    }

    #[test]
    fn test_scrape_too_few_tokens() {
        let err = FixedTokenScraper::default()
            .scrape("srun: error: Invalid account\n")
            .unwrap_err();
        match err {
            WorkbenchError::ProbeParse { diagnostics } => {
                assert_eq!(diagnostics, "srun: error: Invalid account")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_scrape_empty() {
        assert!(FixedTokenScraper::default().scrape("").is_err());
    }

    #[test]
    fn test_custom_token_index() {
        assert_eq!(FixedTokenScraper::new(1).scrape("a b c").unwrap(), "b");
    }

    #[tokio::test]
    async fn test_estimate_reports_to_output() {
        let executor = FakeExecutor::with_diagnostics(SRUN_ESTIMATE);
        let expression = RequestBuilder::default().build(&ResourceRequest::builder().build());
        let probe = AvailabilityProbe::new("dashboard.example.org");

        let mut out = Vec::new();
        let estimate = probe
            .estimate_start_time(&executor, &expression, &mut out)
            .await
            .unwrap();

        assert_eq!(estimate, "2024-05-01T10:12:00");
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Estimated Start Time:"));
        assert!(printed.contains("2024-05-01T10:12:00"));
        assert!(printed.contains("dashboard.example.org"));
        assert!(printed.contains("squeue"));
        assert_eq!(executor.probed(), vec![expression.args().to_vec()]);
    }

    #[tokio::test]
    async fn test_estimate_fails_on_short_diagnostics() {
        let executor = FakeExecutor::with_diagnostics("srun: error");
        let expression = RequestBuilder::default().build(&ResourceRequest::builder().build());
        let probe = AvailabilityProbe::new("dashboard.example.org");

        let mut out = Vec::new();
        let err = probe
            .estimate_start_time(&executor, &expression, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkbenchError>(),
            Some(WorkbenchError::ProbeParse { .. })
        ));
        assert!(out.is_empty());
    }

    proptest! {
        #[test]
        fn prop_scrape_matches_token_count(tokens in proptest::collection::vec("[A-Za-z0-9:-]{1,10}", 0..12)) {
            let text = tokens.join(" ");
            let result = FixedTokenScraper::default().scrape(&text);
            if tokens.len() > START_TIME_TOKEN {
                prop_assert_eq!(result.unwrap(), tokens[START_TIME_TOKEN].clone());
            } else {
                prop_assert!(result.is_err());
            }
        }
    }
}
