//! GitHub API client.
//!
//! Every request goes through the [`HttpTransport`] seam, so unit tests run
//! against an in-memory mock. Responses outside 2xx/304 are classified into
//! the [`HostError`] taxonomy; callers never see raw status codes.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::error::{HostError, classify_response};
use super::pagination::parse_link_header;
use super::rate_limit::{ApiRateLimiter, RateLimitSnapshot};
use super::types::{
    CollectionFetch, CollectionPage, DetailFetch, GitHubAuthUser, GitHubCheckRun,
    GitHubCheckRunList, GitHubComment, GitHubCommit, GitHubHook, GitHubIssue, GitHubLabel,
    GitHubPullRequest, GitHubRepo, GitHubReview, GitHubTree, HostApi, MergeOutcome, MergeRequest,
    ReviewSubmission, ReviewVerdict,
};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::sync::DEFAULT_PAGE_SIZE;

/// Default GitHub API base URL. Overridable for GitHub Enterprise.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Events subscribed when creating a repository webhook.
pub const WEBHOOK_EVENTS: &[&str] = &[
    "pull_request",
    "pull_request_review",
    "pull_request_review_comment",
    "issue_comment",
    "issues",
    "check_run",
];

const REQUEST_TIMEOUT_SECS: u64 = 30;
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "forgemirror";

/// Lock reasons the host accepts.
const LOCK_REASONS: &[&str] = &["off-topic", "too heated", "resolved", "spam"];

/// GitHub REST client.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    token: String,
    page_size: u32,
    rate_limiter: Option<ApiRateLimiter>,
    last_rate_limit: Arc<Mutex<Option<RateLimitSnapshot>>>,
}

impl GitHubClient {
    /// Create a client against the public GitHub API.
    pub fn new(token: &str, rate_limiter: Option<ApiRateLimiter>) -> Result<Self, HostError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(
            REQUEST_TIMEOUT_SECS,
        ))
        .map_err(|e| HostError::transient(e.to_string()))?;

        Ok(Self::new_with_transport(
            GITHUB_API_BASE,
            token,
            rate_limiter,
            Arc::new(transport),
        ))
    }

    /// Create a client with an explicit API base and transport. Tests inject
    /// a mock transport here; GitHub Enterprise deployments inject their API
    /// root.
    pub fn new_with_transport(
        api_base: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            rate_limiter,
            last_rate_limit: Arc::new(Mutex::new(None)),
        }
    }

    /// Override the records requested per collection page. GitHub caps
    /// `per_page` at 100.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, 100);
        self
    }

    /// The API base URL this client talks to.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Last quota snapshot observed on any response.
    #[must_use]
    pub fn last_rate_limit(&self) -> Option<RateLimitSnapshot> {
        *self
            .last_rate_limit
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
    }

    fn record_rate_limit(&self, headers: &HttpHeaders) {
        if let Some(snapshot) = RateLimitSnapshot::from_headers(headers) {
            *self
                .last_rate_limit
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = Some(snapshot);
        }
    }

    fn base_headers(&self) -> HttpHeaders {
        vec![
            ("Accept".to_string(), "application/vnd.github+json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            ("X-GitHub-Api-Version".to_string(), API_VERSION.to_string()),
            ("Authorization".to_string(), format!("Bearer {}", self.token)),
        ]
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: String,
        extra_headers: HttpHeaders,
        body: Vec<u8>,
    ) -> Result<HttpResponse, HostError> {
        self.wait_for_rate_limit().await;

        let mut headers = self.base_headers();
        headers.extend(extra_headers);

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| HostError::transient(e.to_string()))?;

        self.record_rate_limit(&response.headers);
        Ok(response)
    }

    fn ensure_success(response: &HttpResponse) -> Result<(), HostError> {
        if (200..300).contains(&response.status) {
            return Ok(());
        }
        Err(classify_response(
            response.status,
            &response.headers,
            &response.body,
        ))
    }

    fn decode_body<T: DeserializeOwned>(
        response: &HttpResponse,
        context: &str,
    ) -> Result<T, HostError> {
        serde_json::from_slice(&response.body).map_err(|e| HostError::decode(context, e))
    }

    /// Authenticated GET returning decoded JSON.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        context: &str,
    ) -> Result<T, HostError> {
        let response = self
            .send(HttpMethod::Get, url, HttpHeaders::new(), Vec::new())
            .await?;
        Self::ensure_success(&response)?;
        Self::decode_body(&response, context)
    }

    /// Conditional GET. `Ok(None)` means 304, the stored validator still
    /// matches.
    async fn get_conditional(
        &self,
        url: String,
        etag: Option<&str>,
    ) -> Result<Option<HttpResponse>, HostError> {
        let mut extra = HttpHeaders::new();
        if let Some(etag) = etag {
            extra.push(("If-None-Match".to_string(), etag.to_string()));
        }

        let response = self.send(HttpMethod::Get, url, extra, Vec::new()).await?;
        match response.status {
            304 => Ok(None),
            s if (200..300).contains(&s) => Ok(Some(response)),
            _ => Err(classify_response(
                response.status,
                &response.headers,
                &response.body,
            )),
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: String,
        body: &serde_json::Value,
        context: &str,
    ) -> Result<T, HostError> {
        let bytes = serde_json::to_vec(body).map_err(|e| HostError::decode(context, e))?;
        let response = self
            .send(HttpMethod::Post, url, content_type_json(), bytes)
            .await?;
        Self::ensure_success(&response)?;
        Self::decode_body(&response, context)
    }

    async fn put_json<T: DeserializeOwned>(
        &self,
        url: String,
        body: &serde_json::Value,
        context: &str,
    ) -> Result<T, HostError> {
        let bytes = serde_json::to_vec(body).map_err(|e| HostError::decode(context, e))?;
        let response = self
            .send(HttpMethod::Put, url, content_type_json(), bytes)
            .await?;
        Self::ensure_success(&response)?;
        Self::decode_body(&response, context)
    }

    /// PUT where only the status matters (lock, reviewer requests).
    async fn put_unit(
        &self,
        url: String,
        body: Option<&serde_json::Value>,
    ) -> Result<(), HostError> {
        let (headers, bytes) = match body {
            Some(value) => (
                content_type_json(),
                serde_json::to_vec(value).map_err(|e| HostError::decode("request body", e))?,
            ),
            None => (HttpHeaders::new(), Vec::new()),
        };
        let response = self.send(HttpMethod::Put, url, headers, bytes).await?;
        Self::ensure_success(&response)
    }

    async fn delete_unit(&self, url: String) -> Result<(), HostError> {
        let response = self
            .send(HttpMethod::Delete, url, HttpHeaders::new(), Vec::new())
            .await?;
        Self::ensure_success(&response)
    }

    async fn delete_json<T: DeserializeOwned>(
        &self,
        url: String,
        context: &str,
    ) -> Result<T, HostError> {
        let response = self
            .send(HttpMethod::Delete, url, HttpHeaders::new(), Vec::new())
            .await?;
        Self::ensure_success(&response)?;
        Self::decode_body(&response, context)
    }

    /// Fetch one page of a collection endpoint whose body is a JSON array.
    async fn fetch_array_page<T: DeserializeOwned>(
        &self,
        url: String,
        etag: Option<&str>,
        context: &str,
    ) -> Result<CollectionFetch<T>, HostError> {
        match self.get_conditional(url, etag).await? {
            None => Ok(CollectionFetch::NotModified),
            Some(response) => {
                let records: Vec<T> = Self::decode_body(&response, context)?;
                Ok(CollectionFetch::Page(Self::assemble_page(
                    &response, records,
                )))
            }
        }
    }

    /// Conditionally fetch a single object along with its validator.
    async fn fetch_detail<T: DeserializeOwned>(
        &self,
        url: String,
        etag: Option<&str>,
        context: &str,
    ) -> Result<DetailFetch<T>, HostError> {
        match self.get_conditional(url, etag).await? {
            None => Ok(DetailFetch::NotModified),
            Some(response) => {
                let value = Self::decode_body(&response, context)?;
                Ok(DetailFetch::Fetched {
                    value,
                    etag: response.header("etag").map(str::to_string),
                })
            }
        }
    }

    fn assemble_page<T>(response: &HttpResponse, records: Vec<T>) -> CollectionPage<T> {
        let next_cursor = response
            .header("link")
            .map(parse_link_header)
            .and_then(|p| p.next_page)
            .map(|p| p.to_string());
        let etag = response.header("etag").map(str::to_string);
        let rate_limit = RateLimitSnapshot::from_headers(&response.headers);

        CollectionPage {
            records,
            next_cursor,
            etag,
            rate_limit,
        }
    }

    /// Interpret a stored cursor as a page number. An unparseable cursor
    /// restarts the collection rather than failing the unit.
    fn page_number(cursor: Option<&str>) -> u32 {
        match cursor {
            None => 1,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("stored cursor {raw:?} is not a page number, restarting at page 1");
                1
            }),
        }
    }
}

/// Headers for a JSON request body.
fn content_type_json() -> HttpHeaders {
    vec![("Content-Type".to_string(), "application/json".to_string())]
}

/// Percent-encode one path segment. Labels and branch names may carry
/// spaces or slashes that would otherwise break the request path.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[async_trait]
impl HostApi for GitHubClient {
    async fn fetch_authenticated_user(&self) -> Result<GitHubAuthUser, HostError> {
        self.get_json(format!("{}/user", self.api_base), "authenticated user")
            .await
    }

    async fn list_repositories(
        &self,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubRepo>, HostError> {
        let url = format!(
            "{}/user/repos?per_page={}&page={}",
            self.api_base,
            self.page_size,
            Self::page_number(cursor)
        );
        self.fetch_array_page(url, etag, "repository list").await
    }

    async fn fetch_repository(&self, owner: &str, name: &str) -> Result<GitHubRepo, HostError> {
        let url = format!("{}/repos/{owner}/{name}", self.api_base);
        self.get_json(url, "repository").await
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubPullRequest>, HostError> {
        let url = format!(
            "{}/repos/{owner}/{name}/pulls?state=all&per_page={}&page={}",
            self.api_base,
            self.page_size,
            Self::page_number(cursor)
        );
        self.fetch_array_page(url, etag, "pull request list").await
    }

    async fn fetch_pull_request(
        &self,
        owner: &str,
        name: &str,
        number: i32,
    ) -> Result<GitHubPullRequest, HostError> {
        let url = format!("{}/repos/{owner}/{name}/pulls/{number}", self.api_base);
        self.get_json(url, "pull request").await
    }

    async fn list_reviews(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubReview>, HostError> {
        let url = format!(
            "{}/repos/{owner}/{name}/pulls/{number}/reviews?per_page={}&page={}",
            self.api_base,
            self.page_size,
            Self::page_number(cursor)
        );
        self.fetch_array_page(url, etag, "review list").await
    }

    async fn list_review_comments(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubComment>, HostError> {
        let url = format!(
            "{}/repos/{owner}/{name}/pulls/{number}/comments?per_page={}&page={}",
            self.api_base,
            self.page_size,
            Self::page_number(cursor)
        );
        self.fetch_array_page(url, etag, "review comment list").await
    }

    async fn list_issue_comments(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubComment>, HostError> {
        let url = format!(
            "{}/repos/{owner}/{name}/issues/{number}/comments?per_page={}&page={}",
            self.api_base,
            self.page_size,
            Self::page_number(cursor)
        );
        self.fetch_array_page(url, etag, "issue comment list").await
    }

    async fn list_issues(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubIssue>, HostError> {
        let url = format!(
            "{}/repos/{owner}/{name}/issues?state=all&per_page={}&page={}",
            self.api_base,
            self.page_size,
            Self::page_number(cursor)
        );
        self.fetch_array_page(url, etag, "issue list").await
    }

    async fn list_check_runs(
        &self,
        owner: &str,
        name: &str,
        git_ref: &str,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubCheckRun>, HostError> {
        let url = format!(
            "{}/repos/{owner}/{name}/commits/{}/check-runs?per_page={}&page={}",
            self.api_base,
            encode_segment(git_ref),
            self.page_size,
            Self::page_number(cursor)
        );

        // Check runs arrive wrapped in an envelope, not a bare array.
        match self.get_conditional(url, etag).await? {
            None => Ok(CollectionFetch::NotModified),
            Some(response) => {
                let list: GitHubCheckRunList = Self::decode_body(&response, "check run list")?;
                Ok(CollectionFetch::Page(Self::assemble_page(
                    &response,
                    list.check_runs,
                )))
            }
        }
    }

    async fn fetch_tree(
        &self,
        owner: &str,
        name: &str,
        git_ref: &str,
        recursive: bool,
        etag: Option<&str>,
    ) -> Result<DetailFetch<GitHubTree>, HostError> {
        let mut url = format!(
            "{}/repos/{owner}/{name}/git/trees/{}",
            self.api_base,
            encode_segment(git_ref)
        );
        if recursive {
            url.push_str("?recursive=1");
        }
        self.fetch_detail(url, etag, "tree").await
    }

    async fn fetch_commit(
        &self,
        owner: &str,
        name: &str,
        git_ref: &str,
        etag: Option<&str>,
    ) -> Result<DetailFetch<GitHubCommit>, HostError> {
        let url = format!(
            "{}/repos/{owner}/{name}/commits/{}",
            self.api_base,
            encode_segment(git_ref)
        );
        self.fetch_detail(url, etag, "commit").await
    }

    async fn merge_pull_request(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        request: &MergeRequest,
    ) -> Result<MergeOutcome, HostError> {
        let url = format!("{}/repos/{owner}/{name}/pulls/{number}/merge", self.api_base);

        let mut body = json!({ "merge_method": request.method.as_str() });
        if let Some(ref title) = request.commit_title {
            body["commit_title"] = json!(title);
        }
        if let Some(ref message) = request.commit_message {
            body["commit_message"] = json!(message);
        }
        if let Some(ref sha) = request.expected_head_sha {
            body["sha"] = json!(sha);
        }

        self.put_json(url, &body, "merge result").await
    }

    async fn add_labels(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        labels: &[String],
    ) -> Result<Vec<GitHubLabel>, HostError> {
        let url = format!(
            "{}/repos/{owner}/{name}/issues/{number}/labels",
            self.api_base
        );
        self.post_json(url, &json!({ "labels": labels }), "label list")
            .await
    }

    async fn remove_label(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        label: &str,
    ) -> Result<Vec<GitHubLabel>, HostError> {
        let url = format!(
            "{}/repos/{owner}/{name}/issues/{number}/labels/{}",
            self.api_base,
            encode_segment(label)
        );
        self.delete_json(url, "label list").await
    }

    async fn submit_review(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        submission: &ReviewSubmission,
    ) -> Result<GitHubReview, HostError> {
        // The host rejects a bodyless REQUEST_CHANGES anyway; fail before
        // spending a request on it.
        if submission.verdict == ReviewVerdict::RequestChanges
            && submission
                .body
                .as_deref()
                .is_none_or(|body| body.trim().is_empty())
        {
            return Err(HostError::Unprocessable {
                message: "a changes-requested review requires a body".to_string(),
            });
        }

        let url = format!(
            "{}/repos/{owner}/{name}/pulls/{number}/reviews",
            self.api_base
        );

        let mut body = json!({ "event": submission.verdict.as_str() });
        if let Some(ref text) = submission.body {
            body["body"] = json!(text);
        }
        if let Some(ref commit_id) = submission.commit_id {
            body["commit_id"] = json!(commit_id);
        }

        self.post_json(url, &body, "review").await
    }

    async fn request_reviewers(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        reviewers: &[String],
    ) -> Result<(), HostError> {
        let url = format!(
            "{}/repos/{owner}/{name}/pulls/{number}/requested_reviewers",
            self.api_base
        );
        let body = json!({ "reviewers": reviewers });

        // The host echoes the PR back; only the status matters here.
        let bytes = serde_json::to_vec(&body).map_err(|e| HostError::decode("request body", e))?;
        let response = self
            .send(HttpMethod::Post, url, content_type_json(), bytes)
            .await?;
        Self::ensure_success(&response)
    }

    async fn set_locked(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        locked: bool,
        reason: Option<&str>,
    ) -> Result<(), HostError> {
        if let Some(reason) = reason
            && !LOCK_REASONS.contains(&reason)
        {
            return Err(HostError::Unprocessable {
                message: format!("unsupported lock reason {reason:?}"),
            });
        }

        let url = format!(
            "{}/repos/{owner}/{name}/issues/{number}/lock",
            self.api_base
        );
        if locked {
            let body = reason.map(|r| json!({ "lock_reason": r }));
            self.put_unit(url, body.as_ref()).await
        } else {
            self.delete_unit(url).await
        }
    }

    async fn ensure_webhook(
        &self,
        owner: &str,
        name: &str,
        callback_url: &str,
        secret: &str,
    ) -> Result<bool, HostError> {
        let list_url = format!(
            "{}/repos/{owner}/{name}/hooks?per_page={}",
            self.api_base, self.page_size
        );
        let hooks: Vec<GitHubHook> = self.get_json(list_url, "hook list").await?;

        let exists = hooks
            .iter()
            .any(|hook| hook.config.url.as_deref() == Some(callback_url));
        if exists {
            return Ok(false);
        }

        let create_url = format!("{}/repos/{owner}/{name}/hooks", self.api_base);
        let body = json!({
            "name": "web",
            "active": true,
            "events": WEBHOOK_EVENTS,
            "config": {
                "url": callback_url,
                "content_type": "json",
                "secret": secret,
            },
        });

        let _created: GitHubHook = self.post_json(create_url, &body, "hook").await?;
        Ok(true)
    }

    fn rate_limit_snapshot(&self) -> Option<RateLimitSnapshot> {
        self.last_rate_limit()
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::MergeMethod;
    use super::*;
    use crate::http::MockTransport;

    const HOST: &str = "https://api.forge.test";

    fn to_headers(pairs: Vec<(&str, &str)>) -> HttpHeaders {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn response(status: u16, headers: Vec<(&str, &str)>, body: impl AsRef<[u8]>) -> HttpResponse {
        HttpResponse {
            status,
            headers: to_headers(headers),
            body: body.as_ref().to_vec(),
        }
    }

    fn client(transport: &MockTransport) -> GitHubClient {
        GitHubClient::new_with_transport(HOST, "token-1", None, Arc::new(transport.clone()))
    }

    fn pull_json(number: i32) -> serde_json::Value {
        serde_json::json!({
            "id": 1000 + i64::from(number),
            "number": number,
            "title": format!("PR {number}"),
            "body": null,
            "state": "open",
            "draft": false,
            "locked": false,
            "user": {"id": 7, "login": "octocat"},
            "base": {"ref": "main", "sha": "aaa"},
            "head": {"ref": format!("feature-{number}"), "sha": "bbb"},
            "labels": [],
            "requested_reviewers": [],
            "created_at": "2026-01-10T12:00:00Z",
            "updated_at": "2026-01-11T08:30:00Z",
            "closed_at": null,
            "merged_at": null
        })
    }

    #[test]
    fn new_with_transport_normalizes_api_base() {
        let transport = MockTransport::new();
        let client = GitHubClient::new_with_transport(
            "https://api.forge.test/",
            "t",
            None,
            Arc::new(transport),
        );
        assert_eq!(client.api_base(), "https://api.forge.test");
    }

    #[test]
    fn encode_segment_escapes_spaces_and_slashes() {
        assert_eq!(encode_segment("help wanted"), "help%20wanted");
        assert_eq!(encode_segment("feature/widgets"), "feature%2Fwidgets");
        assert_eq!(encode_segment("v1.2-rc_3~x"), "v1.2-rc_3~x");
    }

    #[tokio::test]
    async fn page_size_override_shapes_urls() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/user/repos?per_page=25&page=1");
        transport.push_response(HttpMethod::Get, url.clone(), response(200, vec![], "[]"));

        let client = client(&transport).with_page_size(25);
        client
            .list_repositories(None, None)
            .await
            .expect("fetch should succeed");

        assert_eq!(transport.requests()[0].url, url);
    }

    #[tokio::test]
    async fn page_size_is_clamped_to_host_maximum() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/user/repos?per_page=100&page=1");
        transport.push_response(HttpMethod::Get, url.clone(), response(200, vec![], "[]"));

        let client = client(&transport).with_page_size(500);
        client
            .list_repositories(None, None)
            .await
            .expect("fetch should succeed");

        assert_eq!(transport.requests()[0].url, url);
    }

    #[test]
    fn page_number_falls_back_to_first_page() {
        assert_eq!(GitHubClient::page_number(None), 1);
        assert_eq!(GitHubClient::page_number(Some("7")), 7);
        assert_eq!(GitHubClient::page_number(Some("not-a-page")), 1);
    }

    #[tokio::test]
    async fn list_pull_requests_sends_auth_headers_and_parses_page() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/repos/acme/api/pulls?state=all&per_page=100&page=1");
        let body = serde_json::to_string(&vec![pull_json(1), pull_json(2)]).unwrap();
        transport.push_response(
            HttpMethod::Get,
            url.clone(),
            response(
                200,
                vec![
                    ("ETag", "W/\"pr-etag\""),
                    (
                        "Link",
                        "<https://api.forge.test/repos/acme/api/pulls?state=all&per_page=100&page=2>; rel=\"next\"",
                    ),
                    ("x-ratelimit-limit", "5000"),
                    ("x-ratelimit-remaining", "4999"),
                    ("x-ratelimit-reset", "1700000000"),
                ],
                body,
            ),
        );

        let client = client(&transport);
        let page = client
            .list_pull_requests("acme", "api", None, None)
            .await
            .expect("fetch should succeed")
            .into_page()
            .expect("expected a page");

        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].number, 1);
        assert_eq!(page.next_cursor.as_deref(), Some("2"));
        assert_eq!(page.etag.as_deref(), Some("W/\"pr-etag\""));
        assert_eq!(page.rate_limit.expect("snapshot").remaining, 4999);

        // Snapshot is retained on the client as well.
        assert_eq!(client.last_rate_limit().expect("snapshot").remaining, 4999);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let headers = &requests[0].headers;
        assert!(
            headers
                .iter()
                .any(|(k, v)| k == "Authorization" && v == "Bearer token-1")
        );
        assert!(
            headers
                .iter()
                .any(|(k, v)| k == "Accept" && v == "application/vnd.github+json")
        );
        assert!(
            !headers
                .iter()
                .any(|(k, _)| k.eq_ignore_ascii_case("if-none-match"))
        );
    }

    #[tokio::test]
    async fn list_repositories_not_modified_on_matching_etag() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/user/repos?per_page=100&page=1");
        transport.push_response(HttpMethod::Get, url, response(304, vec![], ""));

        let client = client(&transport);
        let fetch = client
            .list_repositories(None, Some("W/\"repo-etag\""))
            .await
            .expect("fetch should succeed");

        assert!(matches!(fetch, CollectionFetch::NotModified));

        let requests = transport.requests();
        assert!(
            requests[0]
                .headers
                .iter()
                .any(|(k, v)| k.eq_ignore_ascii_case("if-none-match") && v == "W/\"repo-etag\"")
        );
    }

    #[tokio::test]
    async fn list_repositories_resumes_from_cursor() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/user/repos?per_page=100&page=4");
        transport.push_response(HttpMethod::Get, url.clone(), response(200, vec![], "[]"));

        let client = client(&transport);
        let fetch = client
            .list_repositories(Some("4"), None)
            .await
            .expect("fetch should succeed");

        let page = fetch.into_page().expect("expected a page");
        assert!(page.records.is_empty());
        assert_eq!(page.next_cursor, None);
        assert_eq!(transport.requests()[0].url, url);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/user/repos?per_page=100&page=1");
        transport.push_response(
            HttpMethod::Get,
            url,
            response(401, vec![], "{\"message\":\"Bad credentials\"}"),
        );

        let client = client(&transport);
        let err = client
            .list_repositories(None, None)
            .await
            .expect_err("401 should be an error");

        assert!(matches!(err, HostError::Auth));
    }

    #[tokio::test]
    async fn check_runs_unwrap_the_envelope() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/repos/acme/api/commits/bbb222/check-runs?per_page=100&page=1");
        let body = serde_json::json!({
            "total_count": 1,
            "check_runs": [{
                "id": 5,
                "name": "build",
                "head_sha": "bbb222",
                "status": "completed",
                "conclusion": "success"
            }]
        })
        .to_string();
        transport.push_response(HttpMethod::Get, url, response(200, vec![], body));

        let client = client(&transport);
        let page = client
            .list_check_runs("acme", "api", "bbb222", None, None)
            .await
            .expect("fetch should succeed")
            .into_page()
            .expect("expected a page");

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].name, "build");
    }

    #[tokio::test]
    async fn merge_sends_method_and_parses_outcome() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/repos/acme/api/pulls/42/merge");
        transport.push_response(
            HttpMethod::Put,
            url.clone(),
            response(
                200,
                vec![],
                "{\"sha\":\"m3rge\",\"merged\":true,\"message\":\"Pull Request successfully merged\"}",
            ),
        );

        let client = client(&transport);
        let request = MergeRequest {
            method: MergeMethod::Squash,
            commit_title: Some("Squash it".to_string()),
            commit_message: None,
            expected_head_sha: Some("bbb".to_string()),
        };
        let outcome = client
            .merge_pull_request("acme", "api", 42, &request)
            .await
            .expect("merge should succeed");

        assert!(outcome.merged);
        assert_eq!(outcome.sha.as_deref(), Some("m3rge"));

        let sent = transport.requests();
        assert_eq!(sent[0].url, url);
        let body: serde_json::Value = serde_json::from_slice(&sent[0].body).unwrap();
        assert_eq!(body["merge_method"], "squash");
        assert_eq!(body["commit_title"], "Squash it");
        assert_eq!(body["sha"], "bbb");
        assert!(body.get("commit_message").is_none());
    }

    #[tokio::test]
    async fn merge_conflict_is_unprocessable() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/repos/acme/api/pulls/42/merge");
        transport.push_response(
            HttpMethod::Put,
            url,
            response(405, vec![], "{\"message\":\"Pull Request is not mergeable\"}"),
        );

        let client = client(&transport);
        let err = client
            .merge_pull_request("acme", "api", 42, &MergeRequest::default())
            .await
            .expect_err("405 should be an error");

        assert!(matches!(err, HostError::Unprocessable { .. }));
    }

    #[tokio::test]
    async fn remove_label_encodes_the_label_segment() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/repos/acme/api/issues/7/labels/help%20wanted");
        transport.push_response(
            HttpMethod::Delete,
            url.clone(),
            response(200, vec![], "[{\"name\":\"bug\"}]"),
        );

        let client = client(&transport);
        let remaining = client
            .remove_label("acme", "api", 7, "help wanted")
            .await
            .expect("remove should succeed");

        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "bug");
        assert_eq!(transport.requests()[0].url, url);
    }

    #[tokio::test]
    async fn lock_and_unlock_use_put_and_delete() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/repos/acme/api/issues/7/lock");
        transport.push_response(HttpMethod::Put, url.clone(), response(204, vec![], ""));
        transport.push_response(HttpMethod::Delete, url.clone(), response(204, vec![], ""));

        let client = client(&transport);
        client
            .set_locked("acme", "api", 7, true, Some("resolved"))
            .await
            .expect("lock should succeed");
        client
            .set_locked("acme", "api", 7, false, None)
            .await
            .expect("unlock should succeed");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, HttpMethod::Put);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["lock_reason"], "resolved");
        assert_eq!(requests[1].method, HttpMethod::Delete);
        assert!(requests[1].body.is_empty());
    }

    #[tokio::test]
    async fn ensure_webhook_skips_creation_when_hook_exists() {
        let transport = MockTransport::new();
        let list_url = format!("{HOST}/repos/acme/api/hooks?per_page=100");
        transport.push_response(
            HttpMethod::Get,
            list_url,
            response(
                200,
                vec![],
                "[{\"id\":1,\"active\":true,\"events\":[\"pull_request\"],\
                 \"config\":{\"url\":\"https://mirror.test/webhooks/github/user-1\",\"content_type\":\"json\"}}]",
            ),
        );

        let client = client(&transport);
        let created = client
            .ensure_webhook(
                "acme",
                "api",
                "https://mirror.test/webhooks/github/user-1",
                "s3cret",
            )
            .await
            .expect("ensure should succeed");

        assert!(!created);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn ensure_webhook_creates_hook_with_secret() {
        let transport = MockTransport::new();
        let list_url = format!("{HOST}/repos/acme/api/hooks?per_page=100");
        let create_url = format!("{HOST}/repos/acme/api/hooks");
        transport.push_response(HttpMethod::Get, list_url, response(200, vec![], "[]"));
        transport.push_response(
            HttpMethod::Post,
            create_url.clone(),
            response(
                201,
                vec![],
                "{\"id\":9,\"active\":true,\"events\":[],\"config\":{\"url\":\"https://mirror.test/cb\"}}",
            ),
        );

        let client = client(&transport);
        let created = client
            .ensure_webhook("acme", "api", "https://mirror.test/cb", "s3cret")
            .await
            .expect("ensure should succeed");

        assert!(created);

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].url, create_url);
        let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(body["config"]["url"], "https://mirror.test/cb");
        assert_eq!(body["config"]["secret"], "s3cret");
        assert!(
            body["events"]
                .as_array()
                .unwrap()
                .iter()
                .any(|e| e == "check_run")
        );
    }

    #[tokio::test]
    async fn fetch_tree_replays_etag_and_reports_not_modified() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/repos/acme/api/git/trees/main?recursive=1");
        transport.push_response(HttpMethod::Get, url, response(304, vec![], ""));

        let client = client(&transport);
        let fetch = client
            .fetch_tree("acme", "api", "main", true, Some("W/\"tree-etag\""))
            .await
            .expect("fetch should succeed");

        assert!(matches!(fetch, DetailFetch::NotModified));
        assert!(
            transport.requests()[0]
                .headers
                .iter()
                .any(|(k, v)| k.eq_ignore_ascii_case("if-none-match") && v == "W/\"tree-etag\"")
        );
    }

    #[tokio::test]
    async fn fetch_commit_captures_validator() {
        let transport = MockTransport::new();
        let url = format!("{HOST}/repos/acme/api/commits/bbb222");
        transport.push_response(
            HttpMethod::Get,
            url,
            response(
                200,
                vec![("ETag", "\"commit-etag\"")],
                "{\"sha\":\"bbb222\",\"commit\":{\"message\":\"Fix the build\"}}",
            ),
        );

        let client = client(&transport);
        let fetch = client
            .fetch_commit("acme", "api", "bbb222", None)
            .await
            .expect("fetch should succeed");

        match fetch {
            DetailFetch::Fetched { value, etag } => {
                assert_eq!(value.sha, "bbb222");
                assert_eq!(value.commit.message, "Fix the build");
                assert_eq!(etag.as_deref(), Some("\"commit-etag\""));
            }
            DetailFetch::NotModified => panic!("expected a payload"),
        }
    }

    #[tokio::test]
    async fn changes_requested_review_requires_a_body() {
        let transport = MockTransport::new();
        let client = client(&transport);

        let submission = ReviewSubmission {
            verdict: ReviewVerdict::RequestChanges,
            body: Some("   ".to_string()),
            commit_id: None,
        };
        let err = client
            .submit_review("acme", "api", 42, &submission)
            .await
            .expect_err("blank body should be rejected");

        assert!(matches!(err, HostError::Unprocessable { .. }));
        assert!(transport.requests().is_empty(), "nothing should be sent");
    }

    #[tokio::test]
    async fn unknown_lock_reason_is_rejected_locally() {
        let transport = MockTransport::new();
        let client = client(&transport);

        let err = client
            .set_locked("acme", "api", 7, true, Some("grumpy"))
            .await
            .expect_err("unknown reason should be rejected");

        assert!(matches!(err, HostError::Unprocessable { .. }));
        assert!(transport.requests().is_empty(), "nothing should be sent");
    }

    #[tokio::test]
    async fn transport_failures_are_transient() {
        let transport = MockTransport::new();
        // No response registered: the mock reports a transport-level error.
        let client = client(&transport);

        let err = client
            .fetch_repository("acme", "api")
            .await
            .expect_err("missing mock should error");

        assert!(matches!(err, HostError::Transient { .. }));
    }
}
