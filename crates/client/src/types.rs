//! Wire types of the Ecowiser API.
//!
//! These mirror the JSON the server sends inside the envelope's `data` field
//! and the bodies the client posts. They are WASM-compatible and carry no
//! behaviour beyond (de)serialization, a few display helpers and the CSV
//! table projection.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use ecowiser_auth::Role;
use ecowiser_core::{Pagination, ProjectId, ResourceId, TenantId, UserId};

/// One page of a listing plus the server's pagination block.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as midnight UTC).
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()));
    }
    Err(serde::de::Error::custom(format!("unrecognised timestamp '{raw}'")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 3] = [
        SubscriptionTier::Free,
        SubscriptionTier::Pro,
        SubscriptionTier::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free",
            SubscriptionTier::Pro => "Pro",
            SubscriptionTier::Enterprise => "Enterprise",
        }
    }
}

impl core::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for SubscriptionTier {
    type Err = ecowiser_core::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ecowiser_core::CoreError::validation(format!("unknown subscription tier '{s}'"))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub subscription_tier: Option<SubscriptionTier>,
    /// URL of the uploaded logo.
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
}

impl Member {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        match name.trim() {
            "" if self.username.is_empty() => self.email.clone(),
            "" => self.username.clone(),
            name => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "Private",
            Visibility::Public => "Public",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Visibility::Private => Visibility::Public,
            Visibility::Public => Visibility::Private,
        }
    }
}

impl core::fmt::Display for Visibility {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uploader {
    pub id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaResource {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Size in bytes.
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub uploaded_by: Option<Uploader>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl MediaResource {
    pub fn uploader_id(&self) -> Option<UserId> {
        self.uploaded_by.as_ref().map(|u| u.id)
    }
}

/// Why a CSV file cannot be shown as a table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CsvTableError {
    #[error("CSV file not found")]
    NotFound,
    #[error("No data available for this CSV file - it may still be processing")]
    Processing,
    #[error("CSV file has invalid data format")]
    InvalidFormat,
}

/// Parsed CSV content: column order plus one JSON object per row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CsvTable {
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
}

impl CsvTable {
    /// Read a `JSONData` block. Both `columns` and `rows` must be arrays.
    pub fn from_json(data: &Value) -> Result<Self, CsvTableError> {
        let columns = data.get("columns").and_then(Value::as_array);
        let rows = data.get("rows").and_then(Value::as_array);
        let (Some(columns), Some(rows)) = (columns, rows) else {
            return Err(CsvTableError::InvalidFormat);
        };
        Ok(Self {
            columns: columns.iter().map(cell_text).collect(),
            rows: rows.clone(),
        })
    }

    /// Rows projected onto `columns` as text. Missing cells are empty.
    pub fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| row.get(column).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvResource {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Parsed contents; absent while the server is still processing the file.
    #[serde(rename = "JSONData", default)]
    pub json_data: Option<Value>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl CsvResource {
    pub fn table(&self) -> Result<CsvTable, CsvTableError> {
        match &self.json_data {
            Some(data) => CsvTable::from_json(data),
            None => Err(CsvTableError::Processing),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub id: Option<i64>,
    pub subscription_tier: SubscriptionTier,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub current_cycle_start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub current_cycle_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_subscription_tier: Option<SubscriptionTier>,
    #[serde(default)]
    pub auto_renew: bool,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tenant: Option<TenantId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: Value,
    /// Amount as the server formats it (decimal string or number).
    pub amount: Value,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub billing_end_date: Option<DateTime<Utc>>,
}

// --- request bodies ---

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Token payload of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
}

/// Partial profile update; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange<'a> {
    pub current_password: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRole<'a> {
    pub user_email: &'a str,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRef<'a> {
    pub user_email: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibilityChange {
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierChange {
    pub subscription_tier: SubscriptionTier,
}

/// Fields of a new tenant. The logo, if any, travels as a file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantDraft {
    pub name: String,
    pub contact_email: String,
    pub subscription_tier: SubscriptionTier,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn media_resource_decodes_server_shape() {
        let res: MediaResource = serde_json::from_value(json!({
            "id": 12,
            "name": "photo.png",
            "description": null,
            "visibility": "Public",
            "file_size": 2048,
            "uploaded_by": { "id": 3, "first_name": "Ada", "last_name": "L" },
            "created_at": "2024-05-01T09:30:00Z",
        }))
        .unwrap();

        assert_eq!(res.visibility, Visibility::Public);
        assert_eq!(res.uploader_id(), Some(UserId::new(3)));
        assert_eq!(res.created_at.unwrap().to_rfc3339(), "2024-05-01T09:30:00+00:00");
    }

    #[test]
    fn csv_resource_reads_json_data() {
        let csv: CsvResource = serde_json::from_value(json!({
            "id": 1,
            "name": "readings",
            "JSONData": { "columns": ["a", "b"], "rows": [{ "a": 1, "b": 2 }] },
        }))
        .unwrap();
        let table = csv.table().unwrap();
        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn csv_cells_follow_column_order() {
        let table = CsvTable::from_json(&json!({
            "columns": ["site", "kwh", "note"],
            "rows": [
                { "kwh": 12.5, "site": "North", "note": "ok" },
                { "site": "South", "kwh": null },
                "not an object",
            ],
        }))
        .unwrap();

        assert_eq!(
            table.cells(),
            vec![
                vec!["North".to_string(), "12.5".to_string(), "ok".to_string()],
                vec!["South".to_string(), "null".to_string(), String::new()],
                vec![String::new(), String::new(), String::new()],
            ]
        );
    }

    #[test]
    fn csv_without_data_is_still_processing() {
        for body in [
            json!({ "id": 2, "name": "pending" }),
            json!({ "id": 2, "name": "pending", "JSONData": null }),
        ] {
            let csv: CsvResource = serde_json::from_value(body).unwrap();
            assert_eq!(csv.table(), Err(CsvTableError::Processing));
        }
    }

    #[test]
    fn csv_needs_column_and_row_arrays() {
        for data in [
            json!({ "columns": "a,b", "rows": [] }),
            json!({ "columns": ["a"], "rows": { "a": 1 } }),
            json!({ "rows": [] }),
            json!("a,b\n1,2"),
        ] {
            assert_eq!(CsvTable::from_json(&data), Err(CsvTableError::InvalidFormat));
        }
    }

    #[test]
    fn subscription_accepts_plain_dates() {
        let sub: Subscription = serde_json::from_value(json!({
            "id": 1,
            "subscription_tier": "Pro",
            "current_cycle_start_date": "2024-06-01",
            "current_cycle_end_date": "2024-07-01T00:00:00+02:00",
            "next_subscription_tier": "Free",
            "auto_renew": true,
            "tenant": 4,
        }))
        .unwrap();
        assert_eq!(sub.subscription_tier, SubscriptionTier::Pro);
        assert_eq!(
            sub.current_cycle_start_date.unwrap().to_rfc3339(),
            "2024-06-01T00:00:00+00:00"
        );
        assert_eq!(
            sub.current_cycle_end_date.unwrap().to_rfc3339(),
            "2024-06-30T22:00:00+00:00"
        );
    }

    #[test]
    fn garbage_timestamps_are_rejected() {
        let res = serde_json::from_value::<Project>(json!({
            "id": 1, "name": "p", "created_at": "yesterday",
        }));
        assert!(res.is_err());
    }

    #[test]
    fn profile_update_sends_only_set_fields() {
        let update = ProfileUpdate {
            first_name: Some("Ada".into()),
            ..ProfileUpdate::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "first_name": "Ada" }));
    }

    #[test]
    fn member_display_name_falls_back() {
        let member: Member =
            serde_json::from_value(json!({ "email": "x@y.z", "role": "Admin" })).unwrap();
        assert_eq!(member.display_name(), "x@y.z");
        assert_eq!(member.role, Role::Admin);
    }

    #[test]
    fn tiers_parse_case_insensitively() {
        assert_eq!("pro".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Pro);
        assert!("gold".parse::<SubscriptionTier>().is_err());
        assert_eq!(Visibility::Private.toggled(), Visibility::Public);
    }
}
