//! REST client for the analysis service.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CatalogApi, MentionsApi, RuleExecutor, RulesApi};
use crate::config::ExplorerConfig;
use crate::entities::{
    AuthorStat, DailyCount, FilterSelection, KeywordStat, Mention, Page, Row, Rule, RuleDraft,
    RuleId, RuleOutput, RuleResult, SentimentBreakdown,
};
use crate::errors::{ExplorerError, ExplorerResult};

/// Mentions page as returned by the service
#[derive(Debug, Deserialize)]
struct MentionsResponse {
    #[serde(default)]
    mentions: Vec<Mention>,
    #[serde(default)]
    total: Option<usize>,
}

/// Authors page; older services return a bare list of the top authors
/// and ignore the offset
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorsResponse {
    Paged {
        authors: Vec<AuthorStat>,
        #[serde(default)]
        total: Option<usize>,
    },
    Bare(Vec<AuthorStat>),
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// Rule execution request body
#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    keywords: Vec<&'a str>,
    sources: Vec<&'a str>,
    start_date: Option<String>,
    end_date: Option<String>,
    context: Option<&'a RuleResult>,
}

/// Rule execution response; `status` is "success" or "error"
#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<Vec<Row>>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    sql: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

impl From<ExecuteResponse> for RuleResult {
    fn from(response: ExecuteResponse) -> Self {
        if response.status.as_deref() == Some("error") {
            return RuleResult::error(
                response
                    .message
                    .unwrap_or_else(|| "Rule execution failed".to_string()),
            );
        }
        RuleResult::Ok(RuleOutput {
            data: response.data,
            message: response.message,
            explanation: response.explanation,
            sql: response.sql,
        })
    }
}

/// Infer a total for services that omit it.
///
/// A full page suggests at least one more item; a short page is the end.
fn infer_total(total: Option<usize>, offset: usize, limit: usize, len: usize) -> usize {
    total.unwrap_or_else(|| {
        if len >= limit && limit > 0 {
            offset + len + 1
        } else {
            offset + len
        }
    })
}

/// HTTP implementation of every collaborator contract
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from configuration, applying the request timeout
    pub fn from_config(config: &ExplorerConfig) -> ExplorerResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ExplorerError::ConfigError {
            reason: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Query parameters shared by every filtered endpoint
    fn filter_query(filter: &FilterSelection) -> Vec<(&'static str, String)> {
        let mut query: Vec<(&'static str, String)> = filter
            .keyword_constraint()
            .into_iter()
            .map(|k| ("keyword", k.to_string()))
            .collect();
        query.extend(filter.sources.iter().map(|s| ("source", s.clone())));
        if let Some(range) = filter.date_range {
            if let Some(start) = range.start {
                query.push(("start", start.to_string()));
            }
            if let Some(end) = range.end {
                query.push(("end", end.to_string()));
            }
        }
        query
    }

    fn paged_query(
        filter: &FilterSelection,
        offset: usize,
        limit: usize,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![("offset", offset.to_string()), ("limit", limit.to_string())];
        query.extend(Self::filter_query(filter));
        query
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> ExplorerResult<T> {
        let request = self.client.get(self.url(path)).query(query);
        Self::send_json(request, path).await
    }

    /// Send a request, mapping non-2xx to `Http`
    async fn send(request: RequestBuilder, endpoint: &str) -> ExplorerResult<Response> {
        debug!(endpoint, "Sending request");
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, status = %status, "Service request failed");
            return Err(ExplorerError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Send a request and decode a JSON body
    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
        endpoint: &str,
    ) -> ExplorerResult<T> {
        let bytes = Self::send(request, endpoint).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ExplorerError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogApi for HttpApi {
    async fn list_keywords(&self) -> ExplorerResult<Vec<KeywordStat>> {
        self.get_json("/api/keywords", &[]).await
    }
}

#[async_trait]
impl MentionsApi for HttpApi {
    async fn query_mentions(
        &self,
        filter: &FilterSelection,
        offset: usize,
        limit: usize,
    ) -> ExplorerResult<Page<Mention>> {
        let response: MentionsResponse = self
            .get_json("/api/mentions", &Self::paged_query(filter, offset, limit))
            .await?;
        let total = infer_total(response.total, offset, limit, response.mentions.len());
        Ok(Page::new(response.mentions, total))
    }

    async fn query_authors(
        &self,
        filter: &FilterSelection,
        offset: usize,
        limit: usize,
    ) -> ExplorerResult<Page<AuthorStat>> {
        let response: AuthorsResponse = self
            .get_json("/api/stats/authors", &Self::paged_query(filter, offset, limit))
            .await?;
        let page = match response {
            AuthorsResponse::Paged { authors, total } => {
                let total = infer_total(total, offset, limit, authors.len());
                Page::new(authors, total)
            }
            // a bare list is the whole result; later windows would repeat it
            AuthorsResponse::Bare(authors) => {
                let total = offset + authors.len();
                Page::new(authors, total)
            }
        };
        Ok(page)
    }

    async fn count_unique_authors(&self, filter: &FilterSelection) -> ExplorerResult<u64> {
        let response: CountResponse = self
            .get_json("/api/stats/unique-authors", &Self::filter_query(filter))
            .await?;
        Ok(response.count)
    }

    async fn counts_by_day(&self, filter: &FilterSelection) -> ExplorerResult<Vec<DailyCount>> {
        self.get_json("/api/stats/counts-by-day", &Self::filter_query(filter))
            .await
    }

    async fn sentiment_breakdown(
        &self,
        filter: &FilterSelection,
    ) -> ExplorerResult<SentimentBreakdown> {
        self.get_json("/api/stats/sentiment", &Self::filter_query(filter))
            .await
    }
}

#[async_trait]
impl RulesApi for HttpApi {
    async fn list_rules(&self) -> ExplorerResult<Vec<Rule>> {
        self.get_json("/api/rules", &[]).await
    }

    async fn create_or_update_rule(
        &self,
        draft: &RuleDraft,
        id: Option<RuleId>,
    ) -> ExplorerResult<Rule> {
        let mut request = self.client.post(self.url("/api/rules")).json(draft);
        if let Some(id) = id {
            request = request.query(&[("id", id)]);
        }
        Self::send_json(request, "/api/rules").await
    }

    async fn delete_rule(&self, id: RuleId) -> ExplorerResult<()> {
        let path = format!("/api/rules/{id}");
        let request = self.client.delete(self.url(&path));
        Self::send(request, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl RuleExecutor for HttpApi {
    async fn execute_rule(
        &self,
        rule_id: RuleId,
        filter: &FilterSelection,
        context: Option<&RuleResult>,
    ) -> ExplorerResult<RuleResult> {
        let path = format!("/api/rules/{rule_id}/execute");
        let body = ExecuteRequest {
            keywords: filter.keywords.iter().map(String::as_str).collect(),
            sources: filter.sources.iter().map(String::as_str).collect(),
            start_date: filter
                .date_range
                .and_then(|r| r.start)
                .map(|d| d.to_string()),
            end_date: filter.date_range.and_then(|r| r.end).map(|d| d.to_string()),
            context,
        };
        let request = self.client.post(self.url(&path)).json(&body);
        let response: ExecuteResponse = Self::send_json(request, &path).await?;
        Ok(response.into())
    }
}
