//! Per-contract outcomes and the aggregate run report.

use std::time::Duration;

use crate::error::{ContractError, ErrorKind};

/// How one contract ended.
#[derive(Debug)]
pub enum Verdict {
    /// Every declared check passed.
    Success,
    /// The contract's task ended abnormally (panic or abort).
    Failure(String),
    /// A check failed or the contract could not be executed.
    Error(ContractError),
}

/// Result of executing one contract. Exactly one per identifier per run.
#[derive(Debug)]
pub struct Outcome {
    /// Identifier the contract was loaded under.
    pub identifier: String,
    /// Declared `contractId`, when the document could be read far enough.
    pub contract_id: Option<String>,
    /// How the contract ended.
    pub verdict: Verdict,
    /// Wall time spent on this contract.
    pub elapsed: Duration,
}

impl Outcome {
    /// Outcome of a contract whose checks all passed.
    pub fn success(identifier: impl Into<String>, contract_id: Option<String>, elapsed: Duration) -> Self {
        Self {
            identifier: identifier.into(),
            contract_id,
            verdict: Verdict::Success,
            elapsed,
        }
    }

    /// Outcome of a contract that was rejected or failed a check.
    pub fn error(
        identifier: impl Into<String>,
        contract_id: Option<String>,
        error: ContractError,
        elapsed: Duration,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            contract_id,
            verdict: Verdict::Error(error),
            elapsed,
        }
    }

    /// Outcome of a contract whose task ended abnormally. No contract id
    /// or timing is known.
    pub fn failure(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            contract_id: None,
            verdict: Verdict::Failure(reason.into()),
            elapsed: Duration::ZERO,
        }
    }

    /// Returns true if every declared check passed.
    pub fn is_success(&self) -> bool {
        matches!(self.verdict, Verdict::Success)
    }

    /// The error, when the verdict is [`Verdict::Error`].
    pub fn error_ref(&self) -> Option<&ContractError> {
        match &self.verdict {
            Verdict::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Error classification, when the verdict is [`Verdict::Error`].
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_ref().map(ContractError::kind)
    }

    /// Name to show for this contract: its `contractId` when declared,
    /// otherwise the identifier it was loaded under.
    pub fn display_name(&self) -> &str {
        self.contract_id.as_deref().unwrap_or(&self.identifier)
    }

    /// Human-readable reason the contract did not pass.
    pub fn detail(&self) -> Option<String> {
        match &self.verdict {
            Verdict::Success => None,
            Verdict::Failure(reason) => Some(reason.clone()),
            Verdict::Error(e) => Some(e.detail()),
        }
    }
}

/// All outcomes of one run, in completion order.
#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: Vec<Outcome>,
}

impl RunReport {
    /// Wrap outcomes as collected.
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes }
    }

    /// Outcomes in their current order.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Consume the report, returning its outcomes.
    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
    }

    /// Outcome for `identifier`, if it was part of the run.
    pub fn get(&self, identifier: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.identifier == identifier)
    }

    /// Number of contracts that reported.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of contracts whose verdict is [`Verdict::Success`].
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of contracts that did not pass, for any reason.
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// Returns true if every contract passed. An empty run passes.
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_success)
    }

    /// Sort outcomes by identifier for stable output.
    pub fn sort_by_identifier(&mut self) {
        self.outcomes.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts() {
        let mut report = RunReport::new(vec![
            Outcome::success("b.yaml", Some("b".to_string()), Duration::from_millis(3)),
            Outcome::error(
                "a.yaml",
                None,
                ContractError::StatusMismatch {
                    expected: 200,
                    actual: 404,
                },
                Duration::from_millis(5),
            ),
            Outcome::failure("c.yaml", "task panicked"),
        ]);
        assert_eq!(report.total(), 3);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 2);
        assert!(!report.all_passed());

        report.sort_by_identifier();
        let ids: Vec<&str> = report.outcomes().iter().map(|o| o.identifier.as_str()).collect();
        assert_eq!(ids, ["a.yaml", "b.yaml", "c.yaml"]);

        let a = report.get("a.yaml").unwrap();
        assert_eq!(a.error_kind(), Some(ErrorKind::StatusMismatch));
        assert_eq!(a.detail().as_deref(), Some("expected status 200, got 404"));

        let c = report.get("c.yaml").unwrap();
        assert_eq!(c.error_kind(), None);
        assert_eq!(c.detail().as_deref(), Some("task panicked"));
    }

    #[test]
    fn display_name_falls_back_to_identifier() {
        let named = Outcome::success("a.yaml", Some("users".to_string()), Duration::ZERO);
        assert_eq!(named.display_name(), "users");
        let unnamed = Outcome::failure("contracts/b.yaml", "task panicked");
        assert_eq!(unnamed.display_name(), "contracts/b.yaml");
    }

    #[test]
    fn empty_report_passes() {
        let report = RunReport::default();
        assert_eq!(report.total(), 0);
        assert!(report.all_passed());
    }
}
