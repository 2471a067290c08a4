use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// Seeded account, always present on a fresh server.
pub const TEST_EMAIL: &str = "test@example.com";
pub const TEST_PASSWORD: &str = "password";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub description: String,
    pub report_type: String,
    pub created_at: String,
    pub status: String,
    pub format: String,
    pub download_url: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct GenerateReport {
    pub title: String,
    pub description: Option<String>,
    pub report_type: Option<String>,
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct Pagination {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

#[derive(Deserialize)]
pub struct WebScrapeRequest {
    pub url: String,
    #[serde(default)]
    pub selectors: Vec<String>,
}

struct Account {
    user: User,
    password: String,
}

pub struct Store {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    reports: Vec<Report>,
}

impl Store {
    fn seeded() -> Self {
        let user = User {
            id: "1".to_string(),
            email: TEST_EMAIL.to_string(),
            name: "Test User".to_string(),
            role: "admin".to_string(),
        };
        let mut accounts = HashMap::new();
        accounts.insert(
            user.email.clone(),
            Account {
                user,
                password: TEST_PASSWORD.to_string(),
            },
        );
        Self {
            accounts,
            tokens: HashMap::new(),
            reports: seed_reports(),
        }
    }

    fn issue_token(&mut self, email: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), email.to_string());
        token
    }
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, detail: &str) -> Failure {
    (status, Json(json!({ "detail": detail })))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    let v1 = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/reports", get(list_reports))
        .route("/reports/generate", post(generate_report))
        .route("/reports/{id}/download", get(download_report))
        .route("/reports/{id}", delete(delete_report))
        .route("/analysis/sentiment", post(sentiment))
        .route("/analysis/batch-sentiment", post(batch_sentiment))
        .route("/analysis/trends", get(trends))
        .route("/analysis/entities", get(entities))
        .route("/data/web-scrape", post(web_scrape))
        .route("/data/social-media", post(social_media))
        .route("/data/news", post(news))
        .with_state(db);
    Router::new().nest("/api/v1", v1)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Resolve the bearer token to an account email, or 401.
fn authorize(headers: &HeaderMap, store: &Store) -> Result<String, Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
    store
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
}

fn pair_values<'a>(pairs: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

fn pair_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pair_values(pairs, key).into_iter().next()
}

fn required<'a>(pairs: &'a [(String, String)], key: &str) -> Result<&'a str, Failure> {
    pair_value(pairs, key).ok_or_else(|| {
        failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("missing query parameter `{key}`"),
        )
    })
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let user = match store.accounts.get(&input.email) {
        Some(account) if account.password == input.password => account.user.clone(),
        _ => {
            return Err(failure(
                StatusCode::UNAUTHORIZED,
                "Incorrect username or password",
            ))
        }
    };
    let token = store.issue_token(&user.email);
    info!(email = %user.email, "login");
    Ok(Json(json!({ "token": token, "user": user })))
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterRequest>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    if store.accounts.contains_key(&input.email) {
        return Err(failure(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: input.email.clone(),
        name: input.name,
        role: "user".to_string(),
    };
    store.accounts.insert(
        input.email,
        Account {
            user: user.clone(),
            password: input.password,
        },
    );
    let token = store.issue_token(&user.email);
    info!(email = %user.email, "registered");
    Ok(Json(json!({ "token": token, "user": user })))
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        store.tokens.remove(token);
    }
    Ok(Json(json!({ "message": "Successfully logged out" })))
}

async fn list_reports(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let reports: Vec<&Report> = store
        .reports
        .iter()
        .skip(page.skip.unwrap_or(0))
        .take(page.limit.unwrap_or(100))
        .collect();
    Ok(Json(json!({ "reports": reports, "total": store.reports.len() })))
}

async fn generate_report(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<GenerateReport>,
) -> Result<Json<Report>, Failure> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let id = Uuid::new_v4().to_string();
    let report = Report {
        download_url: Some(format!("/api/v1/reports/{id}/download")),
        id,
        title: input.title,
        description: input.description.unwrap_or_else(|| "Generated report".to_string()),
        report_type: input
            .report_type
            .unwrap_or_else(|| "market_overview".to_string()),
        created_at: "2023-06-15T10:30:00Z".to_string(),
        status: "completed".to_string(),
        format: input.format.unwrap_or_else(|| "pdf".to_string()),
    };
    store.reports.push(report.clone());
    Ok(Json(report))
}

async fn download_report(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let report = store
        .reports
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Report not found"))?;
    if report.status != "completed" {
        return Err(failure(StatusCode::CONFLICT, "Report is still generating"));
    }
    let body = format!("%PDF-1.4\n% {}\n", report.title).into_bytes();
    Ok(([(header::CONTENT_TYPE, "application/pdf")], body).into_response())
}

async fn delete_report(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let before = store.reports.len();
    store.reports.retain(|r| r.id != id);
    if store.reports.len() == before {
        return Err(failure(StatusCode::NOT_FOUND, "Report not found"));
    }
    Ok(Json(json!({ "success": true })))
}

async fn sentiment(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &*db.read().await)?;
    let text = required(&pairs, "text")?;
    Ok(Json(json!({
        "text": text,
        "sentiment": "positive",
        "confidence": 0.85,
        "details": { "positive": 0.85, "neutral": 0.10, "negative": 0.05 },
    })))
}

async fn batch_sentiment(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &*db.read().await)?;
    let data_source = required(&pairs, "data_source")?;
    Ok(Json(json!({
        "status": "success",
        "message": "Batch sentiment analysis job initiated",
        "job_id": Uuid::new_v4().to_string(),
        "data_source": data_source,
        "filters": {
            "query": pair_value(&pairs, "query"),
            "date_range": format!(
                "{} to {}",
                pair_value(&pairs, "date_from").unwrap_or("any"),
                pair_value(&pairs, "date_to").unwrap_or("present"),
            ),
        },
    })))
}

async fn trends(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &*db.read().await)?;
    let data_source = required(&pairs, "data_source")?;
    Ok(Json(json!({
        "timeframe": pair_value(&pairs, "timeframe").unwrap_or("week"),
        "data_source": data_source,
        "topic": pair_value(&pairs, "topic"),
        "trends": [
            {
                "topic": "Product Feature X",
                "trend": "rising",
                "change_percent": 15.5,
                "sentiment_shift": 0.2,
                "related_terms": ["innovation", "improvement", "design"],
            },
            {
                "topic": "Competitor Y",
                "trend": "falling",
                "change_percent": -8.3,
                "sentiment_shift": -0.15,
                "related_terms": ["issue", "problem", "alternative"],
            },
        ],
    })))
}

async fn entities(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &*db.read().await)?;
    let data_source = required(&pairs, "data_source")?;
    let mut kinds = pair_values(&pairs, "entity_types");
    if kinds.is_empty() {
        kinds = vec!["PERSON", "ORG", "PRODUCT"];
    }
    let limit = match pair_value(&pairs, "limit") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| failure(StatusCode::UNPROCESSABLE_ENTITY, "limit must be an integer"))?,
        None => 100,
    };
    let all = [
        json!({
            "text": "Product X",
            "type": "PRODUCT",
            "count": 156,
            "sentiment": "positive",
            "related_entities": ["Company Y", "Feature Z"],
        }),
        json!({
            "text": "Company Y",
            "type": "ORG",
            "count": 89,
            "sentiment": "neutral",
            "related_entities": ["Product X", "CEO Name"],
        }),
    ];
    let entities: Vec<&Value> = all
        .iter()
        .filter(|e| kinds.iter().any(|k| e["type"] == *k))
        .take(limit)
        .collect();
    Ok(Json(json!({
        "data_source": data_source,
        "entity_types": kinds,
        "entities": entities,
    })))
}

async fn web_scrape(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<WebScrapeRequest>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &*db.read().await)?;
    let selectors = if input.selectors.is_empty() {
        vec!["default selectors".to_string()]
    } else {
        input.selectors
    };
    Ok(Json(json!({
        "status": "success",
        "message": "Web scraping task initiated",
        "url": input.url,
        "selectors": selectors,
    })))
}

async fn social_media(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &*db.read().await)?;
    let platform = required(&pairs, "platform")?;
    let query = required(&pairs, "query")?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Social media data collection from {platform} initiated"),
        "query": query,
        "limit": pair_value(&pairs, "limit").unwrap_or("100"),
    })))
}

async fn news(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &*db.read().await)?;
    let query = required(&pairs, "query")?;
    Ok(Json(json!({
        "status": "success",
        "message": "News data collection initiated",
        "query": query,
        "sources": pair_values(&pairs, "sources"),
        "date_range": format!(
            "{} to {}",
            pair_value(&pairs, "date_from").unwrap_or("any"),
            pair_value(&pairs, "date_to").unwrap_or("present"),
        ),
    })))
}

fn seed_reports() -> Vec<Report> {
    let report = |id: &str,
                  title: &str,
                  description: &str,
                  kind: &str,
                  created: &str,
                  status: &str,
                  format: &str| Report {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        report_type: kind.to_string(),
        created_at: created.to_string(),
        status: status.to_string(),
        format: format.to_string(),
        download_url: Some(format!("/api/v1/reports/{id}/download")),
    };
    vec![
        report(
            "1",
            "Market Overview Q2 2023",
            "Comprehensive analysis of market trends in Q2 2023",
            "market_overview",
            "2023-06-15T10:30:00Z",
            "completed",
            "pdf",
        ),
        report(
            "2",
            "Competitor Analysis",
            "Detailed analysis of key competitors",
            "competitor_analysis",
            "2023-05-20T14:45:00Z",
            "completed",
            "docx",
        ),
        report(
            "3",
            "Consumer Trends 2023",
            "Analysis of emerging consumer trends",
            "trend_report",
            "2023-04-10T09:15:00Z",
            "generating",
            "pdf",
        ),
    ]
}
