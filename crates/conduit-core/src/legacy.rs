// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Legacy data source and query model.
//!
//! Hosts still speak in terms of a stored data source row and a batch of
//! query models with a textual time range. Core plugins translate this into
//! a [`QueryDataRequest`](crate::types::QueryDataRequest) before handing it
//! to their query handler.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PluginError;
use crate::types::{DataFrame, DataSourceInstanceSettings, SignedInUser, TimeRange};

/// A stored data source, as the host knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: i64,
    pub org_id: i64,
    pub uid: String,
    pub name: String,
    /// Id of the plugin serving this data source.
    #[serde(rename = "type")]
    pub plugin_type: String,
    pub url: String,
    pub user: String,
    pub database: String,
    pub basic_auth: bool,
    pub basic_auth_user: String,
    pub json_data: serde_json::Value,
    /// Secure fields, already decrypted by the host.
    pub secure_json_data: HashMap<String, String>,
    pub updated: DateTime<Utc>,
}

impl DataSource {
    /// The settings a plugin handler sees for this data source.
    pub fn instance_settings(&self) -> DataSourceInstanceSettings {
        DataSourceInstanceSettings {
            id: self.id,
            uid: self.uid.clone(),
            name: self.name.clone(),
            url: self.url.clone(),
            user: self.user.clone(),
            database: self.database.clone(),
            basic_auth_enabled: self.basic_auth,
            basic_auth_user: self.basic_auth_user.clone(),
            json_data: self.json_data.clone(),
            decrypted_secure_json_data: self.secure_json_data.clone(),
            updated: self.updated,
        }
    }
}

/// Textual time range, e.g. `from = "now-6h"`, `to = "now"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTimeRange {
    pub from: String,
    pub to: String,
    /// Reference point for relative expressions.
    pub now: DateTime<Utc>,
}

impl DataTimeRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            now: Utc::now(),
        }
    }

    pub fn from_time(&self) -> Result<DateTime<Utc>, PluginError> {
        parse_time(&self.from, self.now)
    }

    pub fn to_time(&self) -> Result<DateTime<Utc>, PluginError> {
        parse_time(&self.to, self.now)
    }

    /// Resolve both ends into an absolute [`TimeRange`].
    pub fn resolve(&self) -> Result<TimeRange, PluginError> {
        Ok(TimeRange {
            from: self.from_time()?,
            to: self.to_time()?,
        })
    }
}

/// Parse `now`, `now-<n><unit>`, epoch milliseconds, or RFC 3339.
///
/// Units: `s`, `m`, `h`, `d`, `w`, `M` (30 days), `y` (365 days).
pub fn parse_time(expr: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, PluginError> {
    let expr = expr.trim();
    let invalid = || PluginError::InvalidRequest(format!("invalid time expression `{expr}`"));

    if expr == "now" {
        return Ok(now);
    }

    if let Some(relative) = expr.strip_prefix("now-") {
        let unit_at = relative
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (amount, unit) = relative.split_at(unit_at);
        let amount: i64 = amount.parse().map_err(|_| invalid())?;
        let unit_secs = match unit {
            "s" => 1,
            "m" => 60,
            "h" => 3_600,
            "d" => 86_400,
            "w" => 604_800,
            "M" => 2_592_000,
            "y" => 31_536_000,
            _ => return Err(invalid()),
        };
        let delta = amount
            .checked_mul(unit_secs)
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(invalid)?;
        return now.checked_sub_signed(delta).ok_or_else(invalid);
    }

    if !expr.is_empty() && expr.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = expr.parse().map_err(|_| invalid())?;
        return DateTime::from_timestamp_millis(millis).ok_or_else(invalid);
    }

    DateTime::parse_from_rfc3339(expr)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| invalid())
}

/// One query of a [`LegacyDataQuery`] batch.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyQuery {
    pub ref_id: String,
    pub query_type: String,
    pub max_data_points: i64,
    pub interval_ms: i64,
    pub model: serde_json::Value,
}

impl LegacyQuery {
    pub fn new(ref_id: impl Into<String>, model: serde_json::Value) -> Self {
        Self {
            ref_id: ref_id.into(),
            query_type: String::new(),
            max_data_points: 100,
            interval_ms: 1_000,
            model,
        }
    }
}

/// A batch of queries against one data source.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyDataQuery {
    pub time_range: Option<DataTimeRange>,
    pub queries: Vec<LegacyQuery>,
    pub headers: HashMap<String, String>,
    pub user: Option<SignedInUser>,
}

/// Result for one ref id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataQueryResult {
    pub ref_id: String,
    pub dataframes: Vec<DataFrame>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyDataResponse {
    pub results: BTreeMap<String, DataQueryResult>,
}
