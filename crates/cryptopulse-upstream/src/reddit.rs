use async_trait::async_trait;
use cryptopulse_models::{CoinSymbol, SocialApiConfig, SocialPost, SocialSnapshot};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::error::UpstreamError;
use crate::http::{ApiClient, ClientOptions};
use crate::retry::{with_retry, RetryPolicy};
use crate::source::SocialSource;

const SERVICE: &str = "social API";
const AUTH_SERVICE: &str = "social auth";

/// Application-only credentials for the Reddit API.
#[derive(Clone)]
pub struct RedditAuth {
    pub client_id: String,
    pub client_secret: String,
}

/// Subreddit search over the Reddit OAuth API.
///
/// The bearer token is requested lazily on first search and reused for the
/// lifetime of this session.
pub struct RedditSource {
    auth_api: ApiClient,
    api: ApiClient,
    auth: Option<RedditAuth>,
    subreddit: String,
    search_limit: u32,
    retry: RetryPolicy,
    token: OnceCell<String>,
}

impl RedditSource {
    pub fn new(
        config: &SocialApiConfig,
        auth: Option<RedditAuth>,
        user_agent: &str,
        options: ClientOptions,
        retry: RetryPolicy,
    ) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(user_agent).map_err(|_| {
            UpstreamError::Setup("social API user agent is not a valid header".into())
        })?;
        headers.insert(USER_AGENT, agent);

        Ok(Self {
            auth_api: ApiClient::new(AUTH_SERVICE, &config.auth_url, headers.clone(), options)?,
            api: ApiClient::new(SERVICE, &config.api_url, headers, options)?,
            auth,
            subreddit: config.subreddit.clone(),
            search_limit: config.search_limit,
            retry,
            token: OnceCell::new(),
        })
    }

    async fn access_token(&self) -> Result<&str, UpstreamError> {
        let auth = self
            .auth
            .as_ref()
            .ok_or(UpstreamError::MissingCredential("REDDIT_CLIENT_ID/REDDIT_CLIENT_SECRET"))?;

        let token = self
            .token
            .get_or_try_init(|| async {
                let body = with_retry(&self.retry, AUTH_SERVICE, || {
                    self.auth_api.post_form_basic_auth(
                        "/api/v1/access_token",
                        &[("grant_type", "client_credentials")],
                        &auth.client_id,
                        &auth.client_secret,
                    )
                })
                .await?;

                let token: TokenResponse = serde_json::from_value(body).map_err(|e| {
                    UpstreamError::malformed(AUTH_SERVICE, format!("token response: {e}"))
                })?;
                debug!("Obtained social API token");
                Ok::<_, UpstreamError>(token.access_token)
            })
            .await?;
        Ok(token.as_str())
    }
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize, Debug)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize, Debug)]
struct ListingData {
    children: Vec<Thing>,
}

#[derive(Deserialize, Debug)]
struct Thing {
    data: Submission,
}

#[derive(Deserialize, Debug)]
struct Submission {
    title: String,
    score: i64,
}

#[async_trait]
impl SocialSource for RedditSource {
    #[instrument(
        name = "SocialSearch",
        skip(self),
        fields(coin = %coin, subreddit = %self.subreddit)
    )]
    async fn social(&self, coin: &CoinSymbol) -> Result<SocialSnapshot, UpstreamError> {
        let token = self.access_token().await?;
        let endpoint = format!("/r/{}/search", self.subreddit);
        let limit = self.search_limit.to_string();

        let body = self
            .api
            .fetch(
                &endpoint,
                &[
                    ("q", coin.as_upper()),
                    ("limit", limit.as_str()),
                    ("restrict_sr", "true"),
                    ("sort", "new"),
                ],
                Some(token),
                &self.retry,
            )
            .await?;

        let listing: Listing = serde_json::from_value(body)
            .map_err(|e| UpstreamError::malformed(SERVICE, format!("search listing: {e}")))?;

        let posts: Vec<SocialPost> = listing
            .data
            .children
            .into_iter()
            .take(self.search_limit as usize)
            .map(|thing| SocialPost {
                title: thing.data.title,
                score: thing.data.score,
            })
            .collect();
        debug!(matches = posts.len(), "Social search complete");

        Ok(SocialSnapshot::from_matches(posts))
    }

    async fn close(&self) {
        debug!(service = self.api.service(), "Closing session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptopulse_models::ActivityLevel;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer, auth: Option<RedditAuth>) -> RedditSource {
        let config = SocialApiConfig {
            auth_url: server.uri(),
            api_url: server.uri(),
            ..SocialApiConfig::default()
        };
        RedditSource::new(
            &config,
            auth,
            "pulse-test/0.1",
            ClientOptions::default(),
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
        .unwrap()
    }

    fn auth() -> RedditAuth {
        RedditAuth {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    fn listing(titles: &[&str]) -> String {
        let children: Vec<serde_json::Value> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                serde_json::json!({
                    "kind": "t3",
                    "data": {"title": title, "score": (100 - i as i64), "id": format!("p{i}")}
                })
            })
            .collect();
        serde_json::json!({"kind": "Listing", "data": {"children": children}}).to_string()
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(header("user-agent", "pulse-test/0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"access_token": "tok-1", "token_type": "bearer", "expires_in": 86400}"#,
            ))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn four_matches_is_high_activity() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/r/cryptocurrency/search"))
            .and(query_param("q", "BTC"))
            .and(query_param("limit", "5"))
            .and(query_param("restrict_sr", "true"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
                "BTC breaks out",
                "Is BTC done?",
                "BTC ETF flows",
                "Daily BTC thread",
            ])))
            .mount(&server)
            .await;

        let snapshot = source(&server, Some(auth()))
            .social(&CoinSymbol::parse("btc").unwrap())
            .await
            .unwrap();

        assert_eq!(snapshot.activity_level, ActivityLevel::High);
        assert_eq!(snapshot.top_posts.len(), 3);
        assert_eq!(snapshot.top_posts[0].title, "BTC breaks out");
        assert_eq!(snapshot.top_posts[0].score, 100);
    }

    #[tokio::test]
    async fn few_matches_is_low_activity() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/r/cryptocurrency/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&["One", "Two"])))
            .mount(&server)
            .await;

        let snapshot = source(&server, Some(auth()))
            .social(&CoinSymbol::parse("xyz").unwrap())
            .await
            .unwrap();

        assert_eq!(snapshot.activity_level, ActivityLevel::Low);
        assert_eq!(snapshot.top_posts.len(), 2);
    }

    #[tokio::test]
    async fn token_is_reused_across_searches() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/r/cryptocurrency/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[])))
            .expect(2)
            .mount(&server)
            .await;

        let reddit = source(&server, Some(auth()));
        let coin = CoinSymbol::parse("eth").unwrap();
        reddit.social(&coin).await.unwrap();
        reddit.social(&coin).await.unwrap();
    }

    #[tokio::test]
    async fn missing_credentials() {
        let server = MockServer::start().await;
        let err = source(&server, None)
            .social(&CoinSymbol::parse("eth").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::MissingCredential(_)));
    }
}
