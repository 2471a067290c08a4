//! Fixture registry: deterministic stand-in responses for simulated mode.
//!
//! # Design
//! A fixture is a pure function from a `RequestDescriptor` to an
//! `HttpResponse`, keyed by method and path prefix. Lookup walks the
//! registration order and the first prefix that matches wins, so more
//! specific prefixes must be registered before broader ones. Every response
//! for a given fixture has the same fields and types; only values such as a
//! generated id or timestamp may differ between calls.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::endpoints;
use crate::http::{HttpMethod, HttpResponse, RequestDescriptor};

/// Token returned by the simulated login and register endpoints.
pub const MOCK_TOKEN: &str = "mock-jwt-token";

type Respond = dyn Fn(&RequestDescriptor) -> HttpResponse + Send + Sync;

#[derive(Clone)]
pub struct Fixture {
    method: HttpMethod,
    prefix: String,
    respond: Arc<Respond>,
}

impl Fixture {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn respond(&self, descriptor: &RequestDescriptor) -> HttpResponse {
        (self.respond)(descriptor)
    }

    fn matches(&self, descriptor: &RequestDescriptor) -> bool {
        self.method == descriptor.method() && descriptor.path().starts_with(&self.prefix)
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("method", &self.method)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixtureRegistry {
    fixtures: Vec<Fixture>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, method: HttpMethod, prefix: &str, respond: F) -> &mut Self
    where
        F: Fn(&RequestDescriptor) -> HttpResponse + Send + Sync + 'static,
    {
        self.fixtures.push(Fixture {
            method,
            prefix: prefix.to_string(),
            respond: Arc::new(respond),
        });
        self
    }

    /// First registered fixture whose method matches and whose prefix starts
    /// the descriptor's path.
    pub fn lookup(&self, descriptor: &RequestDescriptor) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.matches(descriptor))
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// The default dashboard fixture set.
    ///
    /// Coverage is partial: analysis and data collection calls are not
    /// covered and fall through to the live transport. The report list prefix
    /// also answers `GET /v1/reports/{id}/download`.
    pub fn dashboard() -> Self {
        let mut registry = Self::new();
        registry
            .register(HttpMethod::Get, endpoints::reports::REPORTS, |_| {
                HttpResponse::json(200, &sample_reports())
            })
            .register(HttpMethod::Get, endpoints::dashboard::SUMMARY, |_| {
                HttpResponse::json(200, &sample_dashboard())
            })
            .register(HttpMethod::Post, endpoints::reports::GENERATE, |d| {
                HttpResponse::json(200, &generated_report(d))
            })
            .register(HttpMethod::Post, endpoints::auth::LOGIN, |d| {
                let email = d.body_str("email").unwrap_or("test@example.com");
                HttpResponse::json(200, &auth_payload("Test User", email))
            })
            .register(HttpMethod::Post, endpoints::auth::REGISTER, |d| {
                let name = d.body_str("name").unwrap_or("Test User");
                let email = d.body_str("email").unwrap_or("test@example.com");
                HttpResponse::json(200, &auth_payload(name, email))
            })
            .register(HttpMethod::Delete, "/v1", |_| {
                HttpResponse::json(200, &json!({ "success": true }))
            });
        registry
    }
}

fn auth_payload(name: &str, email: &str) -> Value {
    json!({
        "token": MOCK_TOKEN,
        "user": {
            "id": "1",
            "name": name,
            "email": email,
            "role": "admin",
        }
    })
}

fn sample_reports() -> Value {
    json!({
        "reports": [
            {
                "id": "1",
                "title": "Market Overview Q2 2023",
                "description": "Comprehensive analysis of market trends in Q2 2023",
                "report_type": "market_overview",
                "created_at": "2023-06-15T10:30:00Z",
                "status": "completed",
                "format": "pdf",
                "download_url": "#",
            },
            {
                "id": "2",
                "title": "Competitor Analysis",
                "description": "Detailed analysis of key competitors",
                "report_type": "competitor_analysis",
                "created_at": "2023-05-20T14:45:00Z",
                "status": "completed",
                "format": "docx",
                "download_url": "#",
            },
            {
                "id": "3",
                "title": "Consumer Trends 2023",
                "description": "Analysis of emerging consumer trends",
                "report_type": "trend_report",
                "created_at": "2023-04-10T09:15:00Z",
                "status": "generating",
                "format": "pdf",
                "download_url": "#",
            },
        ]
    })
}

fn sample_dashboard() -> Value {
    json!({
        "stats": {
            "totalReports": 24,
            "activeCompetitors": 8,
            "dataCollectionSources": 12,
            "insightsGenerated": 156,
        },
        "recentActivity": [
            {
                "id": 1,
                "action": "Report Generated",
                "item": "Q2 Market Analysis",
                "timestamp": "2023-06-15T10:30:00Z",
            },
            {
                "id": 2,
                "action": "Competitor Added",
                "item": "TechCorp Inc.",
                "timestamp": "2023-06-14T14:45:00Z",
            },
            {
                "id": 3,
                "action": "Data Collection",
                "item": "Social Media Trends",
                "timestamp": "2023-06-13T09:15:00Z",
            },
        ]
    })
}

fn generated_report(descriptor: &RequestDescriptor) -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "title": descriptor.body_str("title").unwrap_or("New Report"),
        "description": descriptor.body_str("description").unwrap_or("Generated report"),
        "report_type": descriptor.body_str("report_type").unwrap_or("market_overview"),
        "created_at": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        "status": "completed",
        "format": descriptor.body_str("format").unwrap_or("pdf"),
        "download_url": "#",
        "summary": concat!(
            "This is a mock report generated for development purposes. ",
            "It contains sample data and insights."
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Report, ReportList, ReportStatus};

    #[test]
    fn first_registered_prefix_wins() {
        let mut registry = FixtureRegistry::new();
        registry
            .register(HttpMethod::Get, "/v1/reports", |_| {
                HttpResponse::json(200, &json!("broad"))
            })
            .register(HttpMethod::Get, "/v1/reports/1", |_| {
                HttpResponse::json(200, &json!("narrow"))
            });

        let fixture = registry
            .lookup(&RequestDescriptor::get("/v1/reports/1/download"))
            .unwrap();
        assert_eq!(fixture.prefix(), "/v1/reports");
    }

    #[test]
    fn method_must_match() {
        let registry = FixtureRegistry::dashboard();
        assert!(registry.lookup(&RequestDescriptor::put("/v1/reports")).is_none());
        assert!(registry.lookup(&RequestDescriptor::get("/v1/analysis/trends")).is_none());
    }

    #[test]
    fn report_list_has_three_entries_one_generating() {
        let registry = FixtureRegistry::dashboard();
        let d = RequestDescriptor::get("/v1/reports");
        let response = registry.lookup(&d).unwrap().respond(&d);
        let list: ReportList = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(list.reports.len(), 3);
        let generating: Vec<&Report> = list
            .reports
            .iter()
            .filter(|r| r.status == ReportStatus::Generating)
            .collect();
        assert_eq!(generating.len(), 1);
        assert_eq!(generating[0].id, "3");
    }

    #[test]
    fn login_echoes_submitted_email() {
        let registry = FixtureRegistry::dashboard();
        let d = RequestDescriptor::post("/v1/auth/login")
            .with_body(json!({"email": "someone@example.com", "password": "pw"}));
        let response = registry.lookup(&d).unwrap().respond(&d);
        let body: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["token"], MOCK_TOKEN);
        assert_eq!(body["user"]["email"], "someone@example.com");
        assert_eq!(body["user"]["role"], "admin");
    }

    #[test]
    fn generated_reports_keep_their_shape() {
        let registry = FixtureRegistry::dashboard();
        let d = RequestDescriptor::post("/v1/reports/generate").with_body(json!({"title": "Q3"}));
        let fixture = registry.lookup(&d).unwrap();

        let first: Value = serde_json::from_slice(&fixture.respond(&d).body).unwrap();
        let second: Value = serde_json::from_slice(&fixture.respond(&d).body).unwrap();
        let keys = |v: &Value| v.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(first["title"], "Q3");
        assert_eq!(first["format"], "pdf");
        let report: Report = serde_json::from_value(first).unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
    }

    #[test]
    fn any_delete_is_acknowledged() {
        let registry = FixtureRegistry::dashboard();
        let d = RequestDescriptor::delete("/v1/reports/7");
        let response = registry.lookup(&d).unwrap().respond(&d);
        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"success":true}"#.to_vec());
    }
}
