//! Built-in CSV threat heuristic.
//!
//! Reads an activity log, flags rows that look like threats, and summarizes
//! them in the shape the dashboard consumes:
//!
//! ```text
//! {
//!   "model_performance":     { accuracy, status, rows_analyzed, labeled_rows },
//!   "threat_analytics":      { total_threat_count, top_threat_subclasses },
//!   "user_activity_monitor": [ { user_id, threat_events, last_active }, ... ]
//! }
//! ```
//!
//! Columns are located by header aliases, so `user`, `username` and
//! `user_id` all work. Only the user and event columns are mandatory.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::ThreatAnalyzer;
use crate::error::AnalysisError;

// =============================================================================
// Constants
// =============================================================================

/// Event names (normalized) that count as threats on their own.
pub const THREAT_SUBCLASSES: &[&str] = &[
    "failed_login",
    "brute_force",
    "privilege_escalation",
    "data_exfiltration",
    "malware",
    "port_scan",
    "unauthorized_access",
    "suspicious_download",
];

/// Accuracy (percent) at or above which the model status reads "Goal Met".
pub const ACCURACY_GOAL: f64 = 95.0;

/// Number of subclasses reported in `top_threat_subclasses`.
pub const TOP_SUBCLASS_LIMIT: usize = 5;

/// Number of users reported in `user_activity_monitor`.
pub const HIGH_RISK_USER_LIMIT: usize = 5;

const USER_COLUMNS: &[&str] = &[
    "user_id",
    "user",
    "username",
    "user_name",
    "account",
    "account_id",
];
const EVENT_COLUMNS: &[&str] = &["event_type", "event", "activity", "activity_type", "action"];
const STATUS_COLUMNS: &[&str] = &["status", "outcome", "result"];
const TIMESTAMP_COLUMNS: &[&str] = &["timestamp", "time", "datetime", "date", "event_time"];
const LABEL_COLUMNS: &[&str] = &[
    "label",
    "is_threat",
    "threat",
    "is_anomaly",
    "anomaly",
    "is_malicious",
];

const FAILURE_STATUSES: &[&str] = &["fail", "failed", "failure", "denied", "error", "rejected"];
const LOGIN_MARKERS: &[&str] = &["login", "logon", "signin", "sign_in"];
const POSITIVE_LABELS: &[&str] = &[
    "1",
    "true",
    "yes",
    "y",
    "threat",
    "malicious",
    "anomaly",
    "attack",
];
const NEGATIVE_LABELS: &[&str] = &["0", "false", "no", "n", "normal", "benign", "clean"];

// =============================================================================
// Report Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ThreatReport {
    model_performance: ModelPerformance,
    threat_analytics: ThreatAnalytics,
    user_activity_monitor: Vec<UserActivity>,
}

#[derive(Debug, Serialize)]
struct ModelPerformance {
    accuracy: String,
    status: String,
    rows_analyzed: usize,
    labeled_rows: usize,
}

#[derive(Debug, Serialize)]
struct ThreatAnalytics {
    total_threat_count: usize,
    top_threat_subclasses: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct UserActivity {
    user_id: String,
    threat_events: usize,
    last_active: Option<String>,
}

// =============================================================================
// Column Layout
// =============================================================================

/// Indices of the recognized columns in a CSV header.
#[derive(Debug)]
struct ColumnLayout {
    user: usize,
    event: usize,
    status: Option<usize>,
    timestamp: Option<usize>,
    label: Option<usize>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self, AnalysisError> {
        let normalized: Vec<String> = headers.iter().map(normalize).collect();
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias))
        };

        Ok(Self {
            user: find(USER_COLUMNS).ok_or(AnalysisError::MissingColumn("user_id"))?,
            event: find(EVENT_COLUMNS).ok_or(AnalysisError::MissingColumn("event_type"))?,
            status: find(STATUS_COLUMNS),
            timestamp: find(TIMESTAMP_COLUMNS),
            label: find(LABEL_COLUMNS),
        })
    }
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

fn field<'r>(record: &'r StringRecord, index: Option<usize>) -> &'r str {
    index.and_then(|i| record.get(i)).unwrap_or("").trim()
}

/// Decide which threat subclass, if any, a row belongs to.
fn classify(event: &str, status: &str) -> Option<&'static str> {
    let event = normalize(event);
    if let Some(subclass) = THREAT_SUBCLASSES.iter().find(|s| **s == event) {
        return Some(*subclass);
    }

    let is_login = LOGIN_MARKERS.iter().any(|marker| event.contains(marker));
    let failed = FAILURE_STATUSES.contains(&normalize(status).as_str());
    if is_login && failed {
        return Some("failed_login");
    }

    None
}

/// Parse a ground-truth label. `None` means the row is unlabeled.
fn parse_label(raw: &str) -> Option<bool> {
    let label = normalize(raw);
    if POSITIVE_LABELS.contains(&label.as_str()) {
        Some(true)
    } else if NEGATIVE_LABELS.contains(&label.as_str()) {
        Some(false)
    } else {
        None
    }
}

// =============================================================================
// Aggregation
// =============================================================================

#[derive(Default)]
struct UserStats {
    threat_events: usize,
    last_active: Option<String>,
}

fn analyze_reader<R: Read>(reader: R) -> Result<ThreatReport, AnalysisError> {
    let mut csv = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv
        .headers()
        .map_err(|e| AnalysisError::Csv(e.to_string()))?
        .clone();
    let layout = ColumnLayout::from_headers(&headers)?;
    debug!(?layout, "Resolved CSV columns");

    let mut rows = 0usize;
    let mut labeled = 0usize;
    let mut correct = 0usize;
    let mut subclass_counts: HashMap<&'static str, usize> = HashMap::new();
    let mut users: HashMap<String, UserStats> = HashMap::new();

    for (index, result) in csv.records().enumerate() {
        let record =
            result.map_err(|e| AnalysisError::Csv(format!("row {}: {}", index + 1, e)))?;
        rows += 1;

        let subclass = classify(
            field(&record, Some(layout.event)),
            field(&record, layout.status),
        );

        if let Some(actual) = parse_label(field(&record, layout.label)) {
            labeled += 1;
            if actual == subclass.is_some() {
                correct += 1;
            }
        }

        if let Some(subclass) = subclass {
            *subclass_counts.entry(subclass).or_insert(0) += 1;
        }

        let user_id = field(&record, Some(layout.user));
        if user_id.is_empty() {
            continue;
        }

        let stats = users.entry(user_id.to_string()).or_default();
        if subclass.is_some() {
            stats.threat_events += 1;
        }
        let timestamp = field(&record, layout.timestamp);
        if !timestamp.is_empty()
            && stats
                .last_active
                .as_deref()
                .map_or(true, |current| timestamp > current)
        {
            stats.last_active = Some(timestamp.to_string());
        }
    }

    let total_threat_count = subclass_counts.values().sum();

    let mut subclasses: Vec<(&'static str, usize)> = subclass_counts.into_iter().collect();
    subclasses.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top_threat_subclasses = subclasses
        .into_iter()
        .take(TOP_SUBCLASS_LIMIT)
        .map(|(name, count)| (name.to_string(), Value::from(count)))
        .collect();

    let mut flagged: Vec<UserActivity> = users
        .into_iter()
        .filter(|(_, stats)| stats.threat_events > 0)
        .map(|(user_id, stats)| UserActivity {
            user_id,
            threat_events: stats.threat_events,
            last_active: stats.last_active,
        })
        .collect();
    flagged.sort_by(|a, b| {
        b.threat_events
            .cmp(&a.threat_events)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    flagged.truncate(HIGH_RISK_USER_LIMIT);

    let (accuracy, status) = if labeled > 0 {
        let percent = correct as f64 * 100.0 / labeled as f64;
        let status = if percent >= ACCURACY_GOAL {
            "Goal Met"
        } else {
            "Below Goal"
        };
        (format!("{:.2}%", percent), status.to_string())
    } else {
        ("N/A".to_string(), "Unlabeled".to_string())
    };

    Ok(ThreatReport {
        model_performance: ModelPerformance {
            accuracy,
            status,
            rows_analyzed: rows,
            labeled_rows: labeled,
        },
        threat_analytics: ThreatAnalytics {
            total_threat_count,
            top_threat_subclasses,
        },
        user_activity_monitor: flagged,
    })
}

fn analyze_file(path: PathBuf) -> Result<Value, AnalysisError> {
    let file = File::open(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AnalysisError::DatasetNotFound(path.clone()),
        _ => AnalysisError::Read {
            path: path.clone(),
            message: e.to_string(),
        },
    })?;

    let report = analyze_reader(file)?;
    serde_json::to_value(report).map_err(|e| AnalysisError::InvalidOutput(e.to_string()))
}

// =============================================================================
// Analyzer
// =============================================================================

/// Column-heuristic analyzer bundled with the service.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ThreatAnalyzer for HeuristicAnalyzer {
    async fn analyze(&self, csv_path: &Path) -> Result<Value, AnalysisError> {
        let path = csv_path.to_path_buf();
        tokio::task::spawn_blocking(move || analyze_file(path))
            .await
            .map_err(|e| AnalysisError::Task(e.to_string()))?
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

// =============================================================================
// Tests
// =============================================================================
