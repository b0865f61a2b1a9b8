// Relay-routed Canvas API client.
// Handles authentication headers, Link-header pagination, and response
// status mapping. All calls go through the proxy relay, never straight
// to the upstream host.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;

use crate::error::{HomeroomError, Result};

/// Header carrying the LMS token to the relay.
pub const TOKEN_HEADER: &str = "X-Canvas-Token";

/// Hard cap on pages followed per aggregate fetch. Reaching it is not an
/// error; it bounds the call count against an unbounded upstream.
pub const PAGE_CAP: usize = 8;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>;\s*rel="([^"]+)""#).expect("link regex"));

/// One decoded page plus the relay path of the next page, if any.
#[derive(Debug)]
pub struct Page {
    pub value: serde_json::Value,
    pub next: Option<String>,
}

/// Canvas API client bound to one relay, one upstream host, and one token.
pub struct CanvasClient {
    http: Client,
    relay_url: String,
    base_url: String,
}

impl CanvasClient {
    /// Create a client that routes calls for `base_url` through the relay
    /// at `relay_url`, authenticating with `token`.
    pub fn new(relay_url: &str, base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            TOKEN_HEADER,
            HeaderValue::from_str(token)
                .map_err(|_| HomeroomError::Validation("token contains invalid characters".into()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(HomeroomError::Transport)?;

        Ok(Self {
            http: client,
            relay_url: relay_url.trim_end_matches('/').to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a single page through the relay.
    pub async fn fetch_page(&self, path: &str) -> Result<Page> {
        let response = self
            .http
            .get(&self.relay_url)
            .query(&[("base", self.base_url.as_str()), ("path", path)])
            .send()
            .await?;

        let status = response.status();
        let link = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 => HomeroomError::Unauthorized,
                code => HomeroomError::Upstream { status: code, body },
            });
        }

        let value = serde_json::from_str(&body)?;
        let next = link
            .as_deref()
            .map(parse_link_header)
            .and_then(|mut rels| rels.remove("next"))
            .and_then(|url| relay_path_of(&url));

        Ok(Page { value, next })
    }

    /// Fetch every page of a collection, following `next` links up to
    /// [`PAGE_CAP`], and flatten the results. Array pages are concatenated;
    /// a non-array page is appended whole. Any page error aborts the whole
    /// aggregate.
    pub async fn fetch_all_pages<T: DeserializeOwned>(
        &self,
        path_with_query: &str,
    ) -> Result<Vec<T>> {
        let mut values = Vec::new();
        let mut path = path_with_query.to_string();

        for _ in 0..PAGE_CAP {
            let page = self.fetch_page(&path).await?;
            match page.value {
                serde_json::Value::Array(items) => values.extend(items),
                other => values.push(other),
            }
            match page.next {
                Some(next) => path = next,
                None => break,
            }
        }

        values
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(HomeroomError::Json))
            .collect()
    }
}

/// Parse a `Link` header into a rel -> URL map.
pub fn parse_link_header(header: &str) -> HashMap<String, String> {
    let mut rels = HashMap::new();
    for part in header.split(',') {
        if let Some(caps) = LINK_RE.captures(part.trim()) {
            rels.insert(caps[2].to_string(), caps[1].to_string());
        }
    }
    rels
}

/// Reduce an absolute upstream URL to the path+query the relay expects.
/// Scheme and host are discarded so the continuation routes back through
/// the relay rather than hitting the upstream directly.
fn relay_path_of(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let path = parsed.path().trim_start_matches('/');
    Some(match parsed.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::{Query, State};
    use axum::http::HeaderMap as AxumHeaderMap;
    use axum::routing::get;

    #[derive(serde::Deserialize)]
    struct RelayParams {
        #[allow(dead_code)]
        base: String,
        path: String,
    }

    #[derive(Clone)]
    struct MockRelay {
        calls: Arc<AtomicUsize>,
        /// Item counts per page; the last page carries no next link.
        pages: Arc<Vec<usize>>,
        /// When true, every page links to a next page regardless of `pages`.
        endless: bool,
    }

    fn page_number(path: &str) -> usize {
        path.split(['?', '&'])
            .find_map(|kv| kv.strip_prefix("page="))
            .and_then(|n| n.parse().ok())
            .unwrap_or(1)
    }

    async fn mock_handler(
        State(relay): State<MockRelay>,
        Query(params): Query<RelayParams>,
    ) -> (AxumHeaderMap, String) {
        relay.calls.fetch_add(1, Ordering::SeqCst);
        let page = page_number(&params.path);

        let count = if relay.endless {
            1
        } else {
            relay.pages[page - 1]
        };
        let items: Vec<serde_json::Value> = (0..count)
            .map(|i| serde_json::json!({ "id": (page * 1000 + i) as i64 }))
            .collect();

        let mut headers = AxumHeaderMap::new();
        if relay.endless || page < relay.pages.len() {
            let next = format!(
                "https://school.instructure.com/api/v1/users/self/todo?per_page=100&page={}",
                page + 1
            );
            headers.insert(
                "link",
                format!(r#"<{next}>; rel="next", <{next}>; rel="last""#)
                    .parse()
                    .unwrap(),
            );
        }
        (headers, serde_json::to_string(&items).unwrap())
    }

    async fn spawn_mock(pages: Vec<usize>, endless: bool) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let relay = MockRelay {
            calls: calls.clone(),
            pages: Arc::new(pages),
            endless,
        };
        let app = Router::new()
            .route("/relay", get(mock_handler))
            .with_state(relay);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/relay"), calls)
    }

    #[derive(Debug, serde::Deserialize)]
    struct Row {
        id: i64,
    }

    #[tokio::test]
    async fn test_fetch_all_pages_concatenates_three_pages() {
        let (relay_url, calls) = spawn_mock(vec![100, 100, 37], false).await;
        let client =
            CanvasClient::new(&relay_url, "https://school.instructure.com", "tok").unwrap();

        let rows: Vec<Row> = client
            .fetch_all_pages("api/v1/users/self/todo?per_page=100")
            .await
            .unwrap();

        assert_eq!(rows.len(), 237);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Page order is preserved
        assert_eq!(rows[0].id, 1000);
        assert_eq!(rows[100].id, 2000);
        assert_eq!(rows[200].id, 3000);
    }

    #[tokio::test]
    async fn test_fetch_all_pages_stops_at_cap() {
        let (relay_url, calls) = spawn_mock(vec![], true).await;
        let client =
            CanvasClient::new(&relay_url, "https://school.instructure.com", "tok").unwrap();

        let rows: Vec<Row> = client
            .fetch_all_pages("api/v1/users/self/todo?per_page=100")
            .await
            .unwrap();

        assert_eq!(rows.len(), PAGE_CAP);
        assert_eq!(calls.load(Ordering::SeqCst), PAGE_CAP);
    }

    #[test]
    fn test_parse_link_header() {
        let header = concat!(
            r#"<https://school.instructure.com/api/v1/courses?page=2&per_page=100>; rel="next", "#,
            r#"<https://school.instructure.com/api/v1/courses?page=7&per_page=100>; rel="last""#
        );
        let rels = parse_link_header(header);
        assert_eq!(
            rels.get("next").map(String::as_str),
            Some("https://school.instructure.com/api/v1/courses?page=2&per_page=100")
        );
        assert_eq!(rels.len(), 2);
        assert!(parse_link_header("").is_empty());
    }

    #[test]
    fn test_relay_path_of_strips_host() {
        let next = "https://school.instructure.com/api/v1/courses?page=2&per_page=100";
        assert_eq!(
            relay_path_of(next).as_deref(),
            Some("api/v1/courses?page=2&per_page=100")
        );
        assert_eq!(
            relay_path_of("https://x.example/api/v1/users/self/todo").as_deref(),
            Some("api/v1/users/self/todo")
        );
        assert!(relay_path_of("not a url").is_none());
    }
}
