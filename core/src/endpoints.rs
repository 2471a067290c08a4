//! Request descriptors for every dashboard endpoint.
//!
//! Paths are relative to the API base and versioned under `/v1`. Each
//! function only describes the call; dispatch it through
//! [`Client::dispatch`](crate::Client::dispatch) and decode the envelope with
//! [`ResponseEnvelope::json`](crate::ResponseEnvelope::json).

pub mod auth {
    use crate::error::ApiError;
    use crate::http::RequestDescriptor;
    use crate::types::{Credentials, Registration};

    pub const LOGIN: &str = "/v1/auth/login";
    pub const REGISTER: &str = "/v1/auth/register";
    pub const LOGOUT: &str = "/v1/auth/logout";

    pub fn login(credentials: &Credentials) -> Result<RequestDescriptor, ApiError> {
        RequestDescriptor::post(LOGIN)
            .as_session_exchange()
            .with_json(credentials)
    }

    pub fn register(registration: &Registration) -> Result<RequestDescriptor, ApiError> {
        RequestDescriptor::post(REGISTER)
            .as_session_exchange()
            .with_json(registration)
    }

    /// Server-side token revocation. Local session state is untouched.
    pub fn logout() -> RequestDescriptor {
        RequestDescriptor::post(LOGOUT)
    }
}

pub mod reports {
    use crate::error::ApiError;
    use crate::http::RequestDescriptor;
    use crate::types::GenerateReport;

    pub const REPORTS: &str = "/v1/reports";
    pub const GENERATE: &str = "/v1/reports/generate";

    pub fn list(limit: u32, skip: u32) -> RequestDescriptor {
        RequestDescriptor::get(REPORTS)
            .with_query("limit", limit)
            .with_query("skip", skip)
    }

    pub fn generate(request: &GenerateReport) -> Result<RequestDescriptor, ApiError> {
        RequestDescriptor::post(GENERATE).with_json(request)
    }

    pub fn download(id: &str) -> RequestDescriptor {
        RequestDescriptor::get(format!("{REPORTS}/{id}/download"))
    }

    pub fn delete(id: &str) -> RequestDescriptor {
        RequestDescriptor::delete(format!("{REPORTS}/{id}"))
    }
}

pub mod analysis {
    use crate::http::RequestDescriptor;
    use crate::types::{BatchSentimentQuery, EntityQuery, TrendQuery};

    pub const SENTIMENT: &str = "/v1/analysis/sentiment";
    pub const BATCH_SENTIMENT: &str = "/v1/analysis/batch-sentiment";
    pub const TRENDS: &str = "/v1/analysis/trends";
    pub const ENTITIES: &str = "/v1/analysis/entities";

    pub fn sentiment(text: &str) -> RequestDescriptor {
        RequestDescriptor::post(SENTIMENT).with_query("text", text)
    }

    pub fn batch_sentiment(query: &BatchSentimentQuery) -> RequestDescriptor {
        RequestDescriptor::post(BATCH_SENTIMENT)
            .with_query("data_source", &query.data_source)
            .with_optional_query("query", query.query.as_ref())
            .with_optional_query("date_from", query.date_from.as_ref())
            .with_optional_query("date_to", query.date_to.as_ref())
    }

    pub fn trends(query: &TrendQuery) -> RequestDescriptor {
        RequestDescriptor::get(TRENDS)
            .with_query("data_source", &query.data_source)
            .with_optional_query("timeframe", query.timeframe.as_ref())
            .with_optional_query("topic", query.topic.as_ref())
    }

    /// Entity types repeat the `entity_types` key once per value.
    pub fn entities(query: &EntityQuery) -> RequestDescriptor {
        let descriptor = query.entity_types.iter().fold(
            RequestDescriptor::get(ENTITIES).with_query("data_source", &query.data_source),
            |d, kind| d.with_query("entity_types", kind),
        );
        descriptor.with_optional_query("limit", query.limit)
    }
}

pub mod data {
    use crate::error::ApiError;
    use crate::http::RequestDescriptor;
    use crate::types::{NewsJob, SocialMediaJob, WebScrapeJob};

    pub const WEB_SCRAPE: &str = "/v1/data/web-scrape";
    pub const SOCIAL_MEDIA: &str = "/v1/data/social-media";
    pub const NEWS: &str = "/v1/data/news";

    pub fn web_scrape(job: &WebScrapeJob) -> Result<RequestDescriptor, ApiError> {
        RequestDescriptor::post(WEB_SCRAPE).with_json(job)
    }

    pub fn social_media(job: &SocialMediaJob) -> RequestDescriptor {
        RequestDescriptor::post(SOCIAL_MEDIA)
            .with_query("platform", &job.platform)
            .with_query("query", &job.query)
            .with_optional_query("limit", job.limit)
    }

    pub fn news(job: &NewsJob) -> RequestDescriptor {
        let descriptor = job.sources.iter().fold(
            RequestDescriptor::post(NEWS).with_query("query", &job.query),
            |d, source| d.with_query("sources", source),
        );
        descriptor
            .with_optional_query("date_from", job.date_from.as_ref())
            .with_optional_query("date_to", job.date_to.as_ref())
    }
}

pub mod dashboard {
    use crate::http::RequestDescriptor;

    pub const SUMMARY: &str = "/v1/dashboard";

    pub fn summary() -> RequestDescriptor {
        RequestDescriptor::get(SUMMARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::types::{Credentials, EntityQuery, GenerateReport, NewsJob, TrendQuery};

    #[test]
    fn login_is_an_unauthenticated_session_exchange() {
        let d = auth::login(&Credentials {
            email: "test@example.com".into(),
            password: "pw".into(),
        })
        .unwrap();
        assert_eq!(d.method(), HttpMethod::Post);
        assert_eq!(d.path(), "/v1/auth/login");
        assert!(d.is_session_exchange());
        assert!(!d.requires_auth());
        assert_eq!(d.body_str("email"), Some("test@example.com"));
    }

    #[test]
    fn report_list_carries_pagination() {
        let d = reports::list(100, 20);
        assert_eq!(d.query_value("limit"), Some("100"));
        assert_eq!(d.query_value("skip"), Some("20"));
        assert!(d.requires_auth());
    }

    #[test]
    fn report_paths_embed_id() {
        assert_eq!(reports::download("42").path(), "/v1/reports/42/download");
        let d = reports::delete("42");
        assert_eq!(d.method(), HttpMethod::Delete);
        assert_eq!(d.path(), "/v1/reports/42");
    }

    #[test]
    fn generate_posts_json_body() {
        let d = reports::generate(&GenerateReport {
            title: "Q3".into(),
            format: Some("pdf".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(d.path(), "/v1/reports/generate");
        assert_eq!(d.body_str("format"), Some("pdf"));
    }

    #[test]
    fn trends_skip_absent_filters() {
        let d = analysis::trends(&TrendQuery {
            data_source: "news".into(),
            timeframe: Some("month".into()),
            topic: None,
        });
        assert_eq!(d.method(), HttpMethod::Get);
        assert_eq!(d.query().len(), 2);
        assert_eq!(d.query_value("timeframe"), Some("month"));
    }

    #[test]
    fn entity_types_repeat_the_key() {
        let d = analysis::entities(&EntityQuery {
            data_source: "web".into(),
            entity_types: vec!["ORG".into(), "PRODUCT".into()],
            limit: Some(10),
        });
        let kinds: Vec<&str> = d
            .query()
            .iter()
            .filter(|(k, _)| k == "entity_types")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(kinds, vec!["ORG", "PRODUCT"]);
        assert_eq!(d.query_value("limit"), Some("10"));
    }

    #[test]
    fn news_job_uses_query_parameters() {
        let d = data::news(&NewsJob {
            query: "acme".into(),
            sources: vec!["reuters".into()],
            date_from: Some("2023-01-01".into()),
            date_to: None,
        });
        assert_eq!(d.path(), "/v1/data/news");
        assert!(d.body().is_none());
        assert_eq!(d.query_value("sources"), Some("reuters"));
        assert_eq!(d.query_value("date_to"), None);
    }
}
