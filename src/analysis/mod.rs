//! Threat analysis layer.
//!
//! The HTTP layer never looks inside an analysis result. It hands a CSV path
//! to a [`ThreatAnalyzer`] and serializes whatever JSON comes back.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ csv path
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          ThreatAnalyzer Trait           │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │HeuristicAnalyzer│    │  CommandAnalyzer    │
//! │ (built-in CSV)  │    │ (external program)  │
//! └─────────────────┘    └─────────────────────┘
//! ```

mod command;
mod heuristic;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AnalysisError;

pub use command::CommandAnalyzer;
pub use heuristic::{
    HeuristicAnalyzer, ACCURACY_GOAL, HIGH_RISK_USER_LIMIT, THREAT_SUBCLASSES, TOP_SUBCLASS_LIMIT,
};

/// A function that inspects a CSV file and returns threat data as JSON.
///
/// The only obligation callers have is supplying a path to a readable file.
/// Implementations must be cheap to share across requests.
#[async_trait]
pub trait ThreatAnalyzer: Send + Sync + 'static {
    /// Analyze the CSV file at `csv_path`.
    async fn analyze(&self, csv_path: &Path) -> Result<Value, AnalysisError>;

    /// Short identifier reported by the health endpoint and logs.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<A: ThreatAnalyzer + ?Sized> ThreatAnalyzer for Arc<A> {
    async fn analyze(&self, csv_path: &Path) -> Result<Value, AnalysisError> {
        (**self).analyze(csv_path).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[async_trait]
impl<A: ThreatAnalyzer + ?Sized> ThreatAnalyzer for Box<A> {
    async fn analyze(&self, csv_path: &Path) -> Result<Value, AnalysisError> {
        (**self).analyze(csv_path).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
