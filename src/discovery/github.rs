//! GitHub REST client
//!
//! Implements [`RepositorySource`] against api.github.com or a GitHub
//! Enterprise instance (`<enterprise-url>/api/v3/`). Pages are requested with
//! `per_page`/`page` and the `Link: rel="next"` header decides whether another
//! page exists.

use crate::discovery::error::{DiscoveryError, DiscoveryResult};
use crate::discovery::source::{OwnRepoFilter, Page, RepositorySource};
use crate::discovery::types::{Account, RemoteGist, RemoteRepo, Team};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

const DEFAULT_API_BASE: &str = "https://api.github.com/";
const PAGE_SIZE: u32 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Authenticated client for the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    per_page: u32,
}

impl GitHubClient {
    /// Build a client for the default host or an enterprise base URL
    pub fn new(token: &str, enterprise_url: Option<&str>) -> DiscoveryResult<Self> {
        let api_base = api_base_for(enterprise_url);
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DiscoveryError::Transport {
                endpoint: api_base.clone(),
                cause: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            api_base,
            token: token.to_string(),
            per_page: PAGE_SIZE,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
        page: u32,
    ) -> DiscoveryResult<Page<T>> {
        let url = format!("{}{}", self.api_base, endpoint);
        let per_page = self.per_page.to_string();
        let page_param = page.to_string();

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("secretsweep/", env!("CARGO_PKG_VERSION")))
            .query(query)
            .query(&[("per_page", per_page.as_str()), ("page", page_param.as_str())])
            .send()
            .await
            .map_err(|e| DiscoveryError::Transport {
                endpoint: endpoint.to_string(),
                cause: e.to_string(),
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| DiscoveryError::Transport {
            endpoint: endpoint.to_string(),
            cause: format!("Failed to read response body: {}", e),
        })?;

        if let Some(err) = classify_status(endpoint, status, &headers, &body) {
            return Err(err);
        }

        let items: Vec<T> = serde_json::from_str(&body).map_err(|e| DiscoveryError::Decode {
            endpoint: endpoint.to_string(),
            cause: e.to_string(),
        })?;

        let next_page = headers
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_from_link);

        Ok(Page { items, next_page })
    }
}

/// API base URL for the default host or an enterprise instance
pub fn api_base_for(enterprise_url: Option<&str>) -> String {
    match enterprise_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(base) => {
            let base = base.trim_end_matches('/');
            if base.ends_with("/api/v3") {
                format!("{}/", base)
            } else {
                format!("{}/api/v3/", base)
            }
        }
        None => DEFAULT_API_BASE.to_string(),
    }
}

/// Map a non-success response onto a discovery error
fn classify_status(
    endpoint: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> Option<DiscoveryError> {
    if status == StatusCode::ACCEPTED {
        return Some(DiscoveryError::Accepted {
            endpoint: endpoint.to_string(),
        });
    }
    if status.is_success() {
        return None;
    }

    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && headers
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0"));
    if rate_limited {
        return Some(DiscoveryError::RateLimited {
            endpoint: endpoint.to_string(),
        });
    }

    let message = api_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Some(DiscoveryError::Unauthorized {
            endpoint: endpoint.to_string(),
            message: format!("GitHub rejected the token for {}: {}", endpoint, message),
        }),
        _ => Some(DiscoveryError::Api {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        }),
    }
}

/// Extract the `message` field GitHub puts in error bodies
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Page number of the `rel="next"` entry in a Link header
pub fn next_page_from_link(link: &str) -> Option<u32> {
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        if !params.split(';').any(|p| p.trim() == "rel=\"next\"") {
            return None;
        }
        let target = target.trim().trim_start_matches('<').trim_end_matches('>');
        let (_, query) = target.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn org_repos(
        &self,
        org: &str,
        private_only: bool,
        page: u32,
    ) -> DiscoveryResult<Page<RemoteRepo>> {
        let endpoint = format!("orgs/{}/repos", org);
        if private_only {
            self.get_page(&endpoint, &[("type", "private")], page).await
        } else {
            self.get_page(&endpoint, &[], page).await
        }
    }

    async fn user_repos(&self, user: &str, page: u32) -> DiscoveryResult<Page<RemoteRepo>> {
        self.get_page(&format!("users/{}/repos", user), &[], page)
            .await
    }

    async fn own_repos(
        &self,
        filter: OwnRepoFilter,
        page: u32,
    ) -> DiscoveryResult<Page<RemoteRepo>> {
        let query: &[(&str, &str)] = match filter {
            OwnRepoFilter::Private => &[("visibility", "private")],
            OwnRepoFilter::Owned => &[("affiliation", "owner")],
        };
        self.get_page("user/repos", query, page).await
    }

    async fn user_gists(&self, user: &str, page: u32) -> DiscoveryResult<Page<RemoteGist>> {
        self.get_page(&format!("users/{}/gists", user), &[], page)
            .await
    }

    async fn org_members(&self, org: &str, page: u32) -> DiscoveryResult<Page<Account>> {
        self.get_page(&format!("orgs/{}/members", org), &[], page)
            .await
    }

    async fn org_teams(&self, org: &str, page: u32) -> DiscoveryResult<Page<Team>> {
        self.get_page(&format!("orgs/{}/teams", org), &[], page)
            .await
    }

    async fn team_repos(&self, team_id: u64, page: u32) -> DiscoveryResult<Page<RemoteRepo>> {
        self.get_page(&format!("teams/{}/repos", team_id), &[], page)
            .await
    }
}
