//! Domain DTOs for the dashboard API.
//!
//! # Design
//! These types mirror the mock-server's JSON schema but are defined
//! independently; the live integration tests catch any drift between the two
//! crates. Optional request fields are skipped when absent so the server
//! applies its own defaults.

use serde::{Deserialize, Serialize};

use crate::session::Identity;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Response of login/register. OAuth2-style servers name the token
/// `access_token`; both spellings are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub user: Option<Identity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Completed,
    Generating,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub report_type: String,
    pub created_at: String,
    pub status: ReportStatus,
    pub format: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportList {
    pub reports: Vec<Report>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Report generation request. Omitted fields fall back to server defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateReport {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub text: String,
    pub sentiment: String,
    pub confidence: f64,
    pub details: SentimentBreakdown,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSentimentQuery {
    pub data_source: String,
    pub query: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Acknowledgement of an asynchronous analysis job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TrendQuery {
    pub data_source: String,
    pub timeframe: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub topic: String,
    pub trend: String,
    pub change_percent: f64,
    pub sentiment_shift: f64,
    #[serde(default)]
    pub related_terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub timeframe: String,
    pub data_source: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub trends: Vec<Trend>,
}

#[derive(Debug, Clone, Default)]
pub struct EntityQuery {
    pub data_source: String,
    pub entity_types: Vec<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub count: u64,
    pub sentiment: String,
    #[serde(default)]
    pub related_entities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReport {
    pub data_source: String,
    pub entity_types: Vec<String>,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebScrapeJob {
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selectors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SocialMediaJob {
    pub platform: String,
    pub query: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct NewsJob {
    pub query: String,
    pub sources: Vec<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Acknowledgement of an ingestion job submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionJob {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_reports: u64,
    pub active_competitors: u64,
    pub data_collection_sources: u64,
    pub insights_generated: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    pub action: String,
    pub item: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub stats: DashboardStats,
    pub recent_activity: Vec<Activity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_accepts_access_token_alias() {
        let parsed: AuthResponse =
            serde_json::from_str(r#"{"access_token":"abc","token_type":"bearer"}"#).unwrap();
        assert_eq!(parsed.token, "abc");
        assert!(parsed.user.is_none());
    }

    #[test]
    fn generate_report_skips_unset_fields() {
        let body = serde_json::to_value(GenerateReport {
            title: "Q3".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"title": "Q3"}));
    }

    #[test]
    fn report_status_is_lowercase() {
        let status: ReportStatus = serde_json::from_str(r#""generating""#).unwrap();
        assert_eq!(status, ReportStatus::Generating);
        assert_eq!(serde_json::to_string(&ReportStatus::Completed).unwrap(), r#""completed""#);
    }

    #[test]
    fn entity_type_field_is_renamed() {
        let entity: Entity = serde_json::from_str(
            r#"{"text":"Product X","type":"PRODUCT","count":3,"sentiment":"positive"}"#,
        )
        .unwrap();
        assert_eq!(entity.entity_type, "PRODUCT");
        assert!(entity.related_entities.is_empty());
    }

    #[test]
    fn dashboard_summary_uses_camel_case() {
        let summary: DashboardSummary = serde_json::from_str(
            r#"{
                "stats": {
                    "totalReports": 1,
                    "activeCompetitors": 2,
                    "dataCollectionSources": 3,
                    "insightsGenerated": 4
                },
                "recentActivity": []
            }"#,
        )
        .unwrap();
        assert_eq!(summary.stats.insights_generated, 4);
    }
}
