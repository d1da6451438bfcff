// crates/core/src/types.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::period::Period;

/// The fixed, closed set of cognitive domains under measurement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    DepthPerception,
    PeripheralVision,
    ProcessingSpeed,
    VisualTracking,
}

impl Domain {
    /// Every domain, in response order.
    pub const ALL: [Domain; 4] = [
        Domain::DepthPerception,
        Domain::PeripheralVision,
        Domain::ProcessingSpeed,
        Domain::VisualTracking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::DepthPerception => "depth-perception",
            Domain::PeripheralVision => "peripheral-vision",
            Domain::ProcessingSpeed => "processing-speed",
            Domain::VisualTracking => "visual-tracking",
        }
    }

    pub fn parse_str(s: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownDomain(s.to_string()))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// One completed game round. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct GameSession {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "game_type")]
    pub domain: Domain,
    pub game_name: Option<String>,
    #[ts(type = "number")]
    pub score: i64,
    /// Percentage in `[0, 100]`.
    pub accuracy: Option<f64>,
    /// Milliseconds.
    pub reaction_time: Option<f64>,
    /// Seconds.
    #[ts(type = "number | null")]
    pub duration: Option<i64>,
    #[ts(type = "number | null")]
    pub level: Option<i64>,
    /// Game-specific key/value data; always a JSON object when present.
    pub metadata: Option<serde_json::Value>,
    #[ts(type = "string")]
    pub played_at: DateTime<Utc>,
}

/// A validated, not-yet-stored game round.
///
/// Only constructible through [`NewGameSession::new`] plus the builder
/// methods, each of which enforces its field's range.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGameSession {
    pub user_id: String,
    pub domain: Domain,
    pub game_name: Option<String>,
    pub score: i64,
    pub accuracy: Option<f64>,
    pub reaction_time: Option<f64>,
    pub duration: Option<i64>,
    pub level: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    /// Server-assigned at insert time when `None`.
    pub played_at: Option<DateTime<Utc>>,
}

impl NewGameSession {
    pub fn new(
        user_id: impl Into<String>,
        domain: Domain,
        score: i64,
    ) -> Result<Self, ValidationError> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("user_id"));
        }
        if score < 0 {
            return Err(ValidationError::out_of_range("score", "must be >= 0"));
        }
        Ok(Self {
            user_id,
            domain,
            game_name: None,
            score,
            accuracy: None,
            reaction_time: None,
            duration: None,
            level: None,
            metadata: None,
            played_at: None,
        })
    }

    pub fn game_name(mut self, name: Option<String>) -> Self {
        self.game_name = name.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn accuracy(mut self, accuracy: Option<f64>) -> Result<Self, ValidationError> {
        if let Some(a) = accuracy {
            if !a.is_finite() || !(0.0..=100.0).contains(&a) {
                return Err(ValidationError::out_of_range(
                    "accuracy",
                    "must be between 0 and 100",
                ));
            }
        }
        self.accuracy = accuracy;
        Ok(self)
    }

    pub fn reaction_time(mut self, millis: Option<f64>) -> Result<Self, ValidationError> {
        if let Some(rt) = millis {
            if !rt.is_finite() || rt < 0.0 {
                return Err(ValidationError::out_of_range(
                    "reaction_time",
                    "must be a non-negative number of milliseconds",
                ));
            }
        }
        self.reaction_time = millis;
        Ok(self)
    }

    pub fn duration(mut self, seconds: Option<i64>) -> Result<Self, ValidationError> {
        if matches!(seconds, Some(s) if s < 0) {
            return Err(ValidationError::out_of_range("duration", "must be >= 0"));
        }
        self.duration = seconds;
        Ok(self)
    }

    pub fn level(mut self, level: Option<i64>) -> Result<Self, ValidationError> {
        if matches!(level, Some(l) if l < 0) {
            return Err(ValidationError::out_of_range("level", "must be >= 0"));
        }
        self.level = level;
        Ok(self)
    }

    pub fn metadata(mut self, metadata: Option<serde_json::Value>) -> Result<Self, ValidationError> {
        match metadata {
            None | Some(serde_json::Value::Null) => self.metadata = None,
            Some(v @ serde_json::Value::Object(_)) => self.metadata = Some(v),
            Some(_) => {
                return Err(ValidationError::InvalidFieldType {
                    field: "metadata",
                    expected: "a JSON object",
                })
            }
        }
        Ok(self)
    }

    pub fn played_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.played_at = at;
        self
    }
}

/// Natural key of a summary row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryKey {
    pub user_id: String,
    pub domain: Domain,
    pub period: Period,
}

impl SummaryKey {
    pub fn new(user_id: impl Into<String>, domain: Domain, period: Period) -> Self {
        Self {
            user_id: user_id.into(),
            domain,
            period,
        }
    }
}

/// Reduced statistics for one user, one domain, one window.
///
/// A row with `total_sessions == 0` means "computed and confirmed empty";
/// it is distinct from the row being absent (never computed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct DomainPerformance {
    pub user_id: String,
    pub domain: Domain,
    #[serde(flatten)]
    pub period: Period,
    #[ts(type = "number")]
    pub total_sessions: i64,
    pub average_score: f64,
    pub median_score: f64,
    #[ts(type = "number")]
    pub best_score: i64,
    pub score_stddev: f64,
    pub average_accuracy: Option<f64>,
    #[ts(type = "number")]
    pub total_playtime_seconds: i64,
    #[ts(type = "string | null")]
    pub last_played: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub last_updated: DateTime<Utc>,
}

impl DomainPerformance {
    pub fn key(&self) -> SummaryKey {
        SummaryKey::new(self.user_id.clone(), self.domain, self.period)
    }

    /// True when two summaries agree on everything except `last_updated`.
    pub fn same_statistics(&self, other: &DomainPerformance) -> bool {
        Self {
            last_updated: other.last_updated,
            ..self.clone()
        } == *other
    }
}
