// crates/core/src/tables.rs
//! Closed registry of tables reachable through the generic records API.
//!
//! Every permitted table is a [`Table`] variant with a static schema. Caller
//! supplied table and field names are resolved against this registry before
//! anything reaches the datastore, so SQL identifiers only ever come from the
//! `&'static str`s below.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Real,
    Boolean,
    /// JSON document stored as text.
    Json,
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Integer => "an integer",
            FieldKind::Real => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Json => "a JSON object",
        }
    }
}

/// Extra constraint applied after the type check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRule {
    None,
    OneOf(&'static [&'static str]),
    IntRange(i64, i64),
    MaxLen(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub writable: bool,
    pub nullable: bool,
    pub rule: FieldRule,
}

const fn system(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        writable: false,
        nullable: false,
        rule: FieldRule::None,
    }
}

const fn system_nullable(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        writable: false,
        nullable: true,
        rule: FieldRule::None,
    }
}

const fn writable(name: &'static str, kind: FieldKind, nullable: bool, rule: FieldRule) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        writable: true,
        nullable,
        rule,
    }
}

pub const DIFFICULTIES: &[&str] = &["easy", "normal", "hard"];

const USER_PROFILES: &[FieldSpec] = &[
    system("id", FieldKind::Text),
    system("user_id", FieldKind::Text),
    writable("display_name", FieldKind::Text, false, FieldRule::MaxLen(80)),
    writable("avatar_url", FieldKind::Text, true, FieldRule::MaxLen(2048)),
    system("created_at", FieldKind::Integer),
    system("updated_at", FieldKind::Integer),
];

const USER_SETTINGS: &[FieldSpec] = &[
    system("id", FieldKind::Text),
    system("user_id", FieldKind::Text),
    writable("sound_enabled", FieldKind::Boolean, false, FieldRule::None),
    writable("difficulty", FieldKind::Text, false, FieldRule::OneOf(DIFFICULTIES)),
    writable("daily_goal_minutes", FieldKind::Integer, false, FieldRule::IntRange(0, 600)),
    system("updated_at", FieldKind::Integer),
];

const GAME_SESSIONS: &[FieldSpec] = &[
    system("id", FieldKind::Text),
    system("user_id", FieldKind::Text),
    system("game_type", FieldKind::Text),
    system_nullable("game_name", FieldKind::Text),
    system("score", FieldKind::Integer),
    system_nullable("accuracy", FieldKind::Real),
    system_nullable("reaction_time", FieldKind::Real),
    system_nullable("duration", FieldKind::Integer),
    system_nullable("level", FieldKind::Integer),
    system_nullable("metadata", FieldKind::Json),
    system("played_at", FieldKind::Integer),
];

/// Tables reachable through the records API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    UserProfiles,
    UserSettings,
    GameSessions,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::UserProfiles, Table::UserSettings, Table::GameSessions];

    pub fn name(self) -> &'static str {
        match self {
            Table::UserProfiles => "user_profiles",
            Table::UserSettings => "user_settings",
            Table::GameSessions => "game_sessions",
        }
    }

    pub fn parse_str(s: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ValidationError::UnknownTable(s.to_string()))
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Table::UserProfiles => USER_PROFILES,
            Table::UserSettings => USER_SETTINGS,
            Table::GameSessions => GAME_SESSIONS,
        }
    }

    pub fn field(self, name: &str) -> Result<&'static FieldSpec, ValidationError> {
        self.fields()
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ValidationError::UnknownField {
                table: self.name(),
                field: name.to_string(),
            })
    }

    /// Whether rows may be created through the records API.
    pub fn insertable(self) -> bool {
        matches!(self, Table::UserProfiles | Table::UserSettings)
    }

    pub fn has_column(self, name: &str) -> bool {
        self.fields().iter().any(|f| f.name == name)
    }

    /// Column used for newest-first listing.
    pub fn order_column(self) -> &'static str {
        match self {
            Table::UserProfiles => "created_at",
            Table::UserSettings => "updated_at",
            Table::GameSessions => "played_at",
        }
    }

    /// Validate a JSON object of field updates against the schema.
    pub fn validate_patch(
        self,
        body: &Map<String, Value>,
    ) -> Result<Vec<(&'static FieldSpec, FieldValue)>, ValidationError> {
        if !self.insertable() {
            return Err(ValidationError::TableNotWritable(self.name()));
        }
        if body.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        body.iter()
            .map(|(name, value)| {
                let spec = self.field(name)?;
                if !spec.writable {
                    return Err(ValidationError::ReadOnlyField {
                        table: self.name(),
                        field: name.clone(),
                    });
                }
                Ok((spec, FieldValue::from_json(spec, value)?))
            })
            .collect()
    }

    /// Validate a JSON object for a new row: every non-nullable writable
    /// field must be present.
    pub fn validate_insert(
        self,
        body: &Map<String, Value>,
    ) -> Result<Vec<(&'static FieldSpec, FieldValue)>, ValidationError> {
        let values = self.validate_patch(body)?;
        for spec in self.fields().iter().filter(|f| f.writable && !f.nullable) {
            if !values.iter().any(|(s, _)| s.name == spec.name) {
                return Err(ValidationError::MissingField(spec.name));
            }
        }
        Ok(values)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed value ready to bind against a column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Json(String),
}

impl FieldValue {
    pub fn from_json(spec: &'static FieldSpec, value: &Value) -> Result<Self, ValidationError> {
        let mismatch = || ValidationError::InvalidFieldType {
            field: spec.name,
            expected: spec.kind.expected(),
        };

        let parsed = match (spec.kind, value) {
            (_, Value::Null) if spec.nullable => return Ok(FieldValue::Null),
            (_, Value::Null) => {
                return Err(ValidationError::out_of_range(spec.name, "must not be null"))
            }
            (FieldKind::Text, Value::String(s)) => FieldValue::Text(s.clone()),
            (FieldKind::Integer, Value::Number(n)) => {
                FieldValue::Integer(n.as_i64().ok_or_else(mismatch)?)
            }
            (FieldKind::Real, Value::Number(n)) => {
                FieldValue::Real(n.as_f64().ok_or_else(mismatch)?)
            }
            (FieldKind::Boolean, Value::Bool(b)) => FieldValue::Boolean(*b),
            (FieldKind::Json, v @ Value::Object(_)) => FieldValue::Json(v.to_string()),
            _ => return Err(mismatch()),
        };

        parsed.check_rule(spec)?;
        Ok(parsed)
    }

    fn check_rule(&self, spec: &'static FieldSpec) -> Result<(), ValidationError> {
        match (spec.rule, self) {
            (FieldRule::OneOf(allowed), FieldValue::Text(s)) if !allowed.contains(&s.as_str()) => {
                Err(ValidationError::out_of_range(
                    spec.name,
                    format!("must be one of {}", allowed.join(", ")),
                ))
            }
            (FieldRule::IntRange(lo, hi), FieldValue::Integer(n)) if !(lo..=hi).contains(n) => {
                Err(ValidationError::out_of_range(
                    spec.name,
                    format!("must be between {lo} and {hi}"),
                ))
            }
            (FieldRule::MaxLen(max), FieldValue::Text(s)) if s.chars().count() > max => Err(
                ValidationError::out_of_range(spec.name, format!("must be at most {max} characters")),
            ),
            _ => Ok(()),
        }
    }
}
