//! Domain model for homekeep
//!
//! Places, tasks and the single persisted document (`AppState`).
//!
//! Reading is deliberately forgiving: documents written by older versions or
//! edited by hand are coerced field by field into safe defaults instead of
//! being rejected. Writing always produces the canonical shape.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use ulid::Ulid;

/// Schema version written into every document
pub const STATE_VERSION: u32 = 1;

/// Category used when a task has none
pub const DEFAULT_CATEGORY: &str = "General";

/// Default recurrence interval in days
pub const DEFAULT_EVERY_DAYS: u16 = 30;
pub const MIN_EVERY_DAYS: u16 = 1;
pub const MAX_EVERY_DAYS: u16 = 365;

const TASK_ID_PREFIX: &str = "t_";

const DEFAULT_PLACES: [(&str, &str); 4] = [
    ("musicala", "Musicala"),
    ("nuestro", "Nuestro espacio (Alek y Cata)"),
    ("casa_alek", "Casa Alek"),
    ("casa_cata", "Casa Cata"),
];

const DEFAULT_CATEGORIES: [&str; 14] = [
    "General",
    "Baño",
    "Cocina",
    "Sala",
    "Cuartos",
    "Estudio",
    "Mascotas",
    "Herramientas",
    "Electrodomésticos",
    "Limpieza",
    "Musicala: Salones",
    "Musicala: Recepción",
    "Musicala: Baños",
    "Musicala: Bodega",
];

pub fn default_places() -> Vec<Place> {
    DEFAULT_PLACES
        .iter()
        .map(|(id, name)| Place::new(*id, *name))
        .collect()
}

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Generate a fresh opaque task id
pub fn new_task_id() -> String {
    format!(
        "{TASK_ID_PREFIX}{}",
        Ulid::new().to_string().to_ascii_lowercase()
    )
}

/// A physical location tasks are scoped to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
}

impl Place {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =========================================================================
// Enumerations
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "todo")]
    Pending,
    #[serde(rename = "doing")]
    InProgress,
    #[serde(rename = "done")]
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Done,
    ];

    /// Sort bucket: actionable work first, finished work last
    pub fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "todo" => Ok(TaskStatus::Pending),
            "in-progress" | "in_progress" | "doing" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!(
                "unknown status '{other}' (expected pending|in-progress|done)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TaskType {
    #[serde(rename = "reparar")]
    Repair,
    #[serde(rename = "comprar")]
    Buy,
    #[default]
    #[serde(rename = "reponer")]
    Restock,
    #[serde(rename = "mejorar")]
    Improve,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Repair,
        TaskType::Buy,
        TaskType::Restock,
        TaskType::Improve,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Repair => "repair",
            TaskType::Buy => "buy",
            TaskType::Restock => "restock",
            TaskType::Improve => "improve",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "repair" | "reparar" => Ok(TaskType::Repair),
            "buy" | "comprar" => Ok(TaskType::Buy),
            "restock" | "reponer" => Ok(TaskType::Restock),
            "improve" | "mejorar" => Ok(TaskType::Improve),
            other => Err(format!(
                "unknown type '{other}' (expected repair|buy|restock|improve)"
            )),
        }
    }
}

/// Urgency, stored on the wire as the integer 1, 2 or 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Priority {
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
}

impl Priority {
    /// Clamp any integer into the 1..=3 range
    pub fn clamped(level: i64) -> Self {
        match level {
            i64::MIN..=1 => Priority::Low,
            2 => Priority::Medium,
            _ => Priority::High,
        }
    }

    /// Coerce free-form input, falling back to medium when it is not a number
    pub fn coerce(input: &str) -> Self {
        parse_leading_int(input)
            .map(Priority::clamped)
            .unwrap_or_default()
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "low" => Ok(Priority::Low),
            "2" | "medium" => Ok(Priority::Medium),
            "3" | "high" => Ok(Priority::High),
            other => Err(format!(
                "unknown priority '{other}' (expected 1|2|3 or low|medium|high)"
            )),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

/// Recurrence settings; `every_days` stays within 1..=365
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub enabled: bool,
    pub every_days: u16,
}

impl Default for Recurrence {
    fn default() -> Self {
        Self {
            enabled: false,
            every_days: DEFAULT_EVERY_DAYS,
        }
    }
}

impl Recurrence {
    pub fn every(days: i64) -> Self {
        Self {
            enabled: true,
            every_days: clamp_every_days(days),
        }
    }

    pub fn disabled(days: i64) -> Self {
        Self {
            enabled: false,
            every_days: clamp_every_days(days),
        }
    }

    fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let enabled = map.get("enabled").map(truthy).unwrap_or(false);
        let every_days = map
            .get("everyDays")
            .and_then(int_from_value)
            .map(clamp_every_days)
            .unwrap_or(DEFAULT_EVERY_DAYS);
        Self {
            enabled,
            every_days,
        }
    }
}

pub fn clamp_every_days(days: i64) -> u16 {
    days.clamp(i64::from(MIN_EVERY_DAYS), i64::from(MAX_EVERY_DAYS)) as u16
}

// =========================================================================
// Task
// =========================================================================

/// A unit of household work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawTask")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    pub place_id: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub category: String,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<u64>,
    pub recurring: Recurrence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A pending task with default fields, stamped at `now`
    pub fn new(title: impl Into<String>, place_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: new_task_id(),
            title: title.into(),
            notes: String::new(),
            place_id: place_id.into(),
            task_type: TaskType::default(),
            category: DEFAULT_CATEGORY.to_string(),
            priority: Priority::default(),
            status: TaskStatus::default(),
            due_date: None,
            cost: None,
            recurring: Recurrence::default(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Category used for filtering; blank categories count as "General"
    pub fn effective_category(&self) -> &str {
        let trimmed = self.category.trim();
        if trimmed.is_empty() {
            DEFAULT_CATEGORY
        } else {
            &self.category
        }
    }

    /// Last time the task was touched, falling back to creation, then the epoch
    pub fn touched_at(&self) -> DateTime<Utc> {
        self.updated_at
            .or(self.created_at)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

/// Loose view of a stored task; every field is coerced on conversion
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTask {
    id: Value,
    title: Value,
    notes: Value,
    place_id: Value,
    #[serde(rename = "type")]
    task_type: Value,
    category: Value,
    priority: Value,
    status: Value,
    due_date: Value,
    cost: Value,
    recurring: Value,
    created_at: Value,
    updated_at: Value,
}

impl From<RawTask> for Task {
    fn from(raw: RawTask) -> Self {
        Task {
            id: text(&raw.id)
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(new_task_id),
            title: text(&raw.title).unwrap_or_default(),
            notes: text(&raw.notes).unwrap_or_default(),
            place_id: text(&raw.place_id).unwrap_or_default(),
            task_type: text(&raw.task_type)
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
            category: text(&raw.category)
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            priority: int_from_value(&raw.priority)
                .map(Priority::clamped)
                .unwrap_or_default(),
            status: text(&raw.status)
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
            due_date: raw.due_date.as_str().and_then(parse_date),
            cost: cost_from_value(&raw.cost),
            recurring: Recurrence::from_value(&raw.recurring),
            created_at: timestamp_from_value(&raw.created_at),
            updated_at: timestamp_from_value(&raw.updated_at),
        }
    }
}

// =========================================================================
// AppState
// =========================================================================

/// The complete persisted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppState {
    pub version: u32,
    pub places: Vec<Place>,
    pub categories: Vec<String>,
    pub tasks: Vec<Task>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            places: default_places(),
            categories: default_categories(),
            tasks: Vec::new(),
        }
    }
}

impl AppState {
    /// Display name for a place; unknown ids echo back unchanged
    pub fn place_name<'a>(&'a self, place_id: &'a str) -> &'a str {
        self.places
            .iter()
            .find(|place| place.id == place_id)
            .map(|place| place.name.as_str())
            .unwrap_or(place_id)
    }

    pub fn has_place(&self, place_id: &str) -> bool {
        self.places.iter().any(|place| place.id == place_id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }
}

/// The usable parts of a parsed document, before backfilling
#[derive(Debug, Default)]
pub(crate) struct DocumentParts {
    pub places: Option<Vec<Place>>,
    pub categories: Option<Vec<String>>,
    pub tasks: Option<Vec<Task>>,
    /// Tasks whose id was missing or repeated and had to be minted
    pub reassigned_ids: usize,
}

impl DocumentParts {
    /// Extract places, categories and tasks from a top-level object.
    ///
    /// Empty or unusable `places`/`categories` count as missing; `tasks` only
    /// counts as missing when it is not an array.
    pub fn from_object(map: &Map<String, Value>) -> Self {
        let places = map
            .get("places")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value::<Place>(entry.clone()).ok())
                    .collect::<Vec<_>>()
            })
            .filter(|places| !places.is_empty());

        let categories = map
            .get("categories")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.as_str().map(str::to_string))
                    .collect::<Vec<_>>()
            })
            .filter(|categories| !categories.is_empty());

        let mut reassigned_ids = 0;
        let tasks = map
            .get("tasks")
            .and_then(Value::as_array)
            .map(|entries| unique_tasks(entries, &mut reassigned_ids));

        Self {
            places,
            categories,
            tasks,
            reassigned_ids,
        }
    }

    pub fn into_state(
        self,
        places: impl FnOnce() -> Vec<Place>,
        categories: impl FnOnce() -> Vec<String>,
    ) -> AppState {
        AppState {
            version: STATE_VERSION,
            places: self.places.unwrap_or_else(places),
            categories: self.categories.unwrap_or_else(categories),
            tasks: self.tasks.unwrap_or_default(),
        }
    }
}

/// Decode task entries, giving a fresh id to any entry without one and to
/// every repeat of an id already seen.
fn unique_tasks(entries: &[Value], reassigned: &mut usize) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(entries.len());
    for entry in entries.iter().filter(|entry| entry.is_object()) {
        let Ok(mut task) = serde_json::from_value::<Task>(entry.clone()) else {
            continue;
        };
        let minted = entry
            .get("id")
            .and_then(text)
            .filter(|id| !id.trim().is_empty())
            .is_none();
        if !seen.insert(task.id.clone()) {
            tracing::debug!(id = %task.id, "repeated task id; assigning a new one");
            task.id = new_task_id();
            seen.insert(task.id.clone());
            *reassigned += 1;
        } else if minted {
            *reassigned += 1;
        }
        tasks.push(task);
    }
    tasks
}

// =========================================================================
// Coercion helpers
// =========================================================================

/// Parse the leading integer of a string the way form inputs are read:
/// surrounding whitespace is ignored and trailing garbage is dropped.
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: String = rest.chars().take_while(|ch| ch.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Normalize a cost entry to a positive whole amount.
///
/// Thousands separators and currency symbols are stripped; zero, negative
/// and non-numeric input collapse to `None`.
pub fn sanitize_cost(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return None;
    }
    let digits: String = trimmed.chars().filter(|ch| ch.is_ascii_digit()).collect();
    digits.parse::<u64>().ok().filter(|cost| *cost > 0)
}

/// Parse a calendar date, accepting `YYYY-MM-DD` or a full RFC 3339 timestamp
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|parsed| parsed.with_timezone(&Utc).date_naive())
        })
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}

fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64)
        }),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn cost_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|v| v.is_finite() && *v >= 1.0)
                    .map(|v| v.trunc() as u64)
            })
            .filter(|cost| *cost > 0),
        Value::String(s) => sanitize_cost(s),
        _ => None,
    }
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}
