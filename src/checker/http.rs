// src/checker/http.rs
// =============================================================================
// The default single-URL checker: decides whether a URL is alive by making
// HTTP requests.
//
// Key functionality:
// - GET request, following redirects by hand so every hop is counted
// - Follows <meta http-equiv="refresh"> like a redirect (optional)
// - Warns when a #fragment has no matching element on the page (optional)
// - Retries 5xx, 429, timeouts and connection failures a few times
//
// Every network failure ends up as a DEAD outcome, and so does a URL (or a
// redirect hop) with a scheme other than http/https. Only a request that
// reqwest refuses to build for the URL as given is an error.
// =============================================================================

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use tracing::debug;
use url::Url;

use super::anchor::inspect_html;
use super::{CheckerOptions, Outcome, UrlChecker};
use crate::error::CheckError;

/// Checks URLs over HTTP(S) with one shared reqwest client.
///
/// The client is cheap to clone and pools connections across checks.
#[derive(Debug, Clone)]
pub struct HttpChecker {
    client: Client,
}

// How one attempt ended
enum Attempt {
    Settled(Outcome),
    // Dead, but worth another try
    Retryable(Outcome),
}

impl HttpChecker {
    pub fn new() -> Result<Self, CheckError> {
        // Redirects are followed by hand in `attempt`
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| CheckError::Client(e.to_string()))?;

        Ok(HttpChecker { client })
    }

    async fn attempt(
        &self,
        requested: &Url,
        options: &CheckerOptions,
    ) -> Result<Attempt, CheckError> {
        let mut current = requested.clone();
        current.set_fragment(None);
        let mut redirects = 0;

        loop {
            if !matches!(current.scheme(), "http" | "https") {
                return Ok(Attempt::Settled(unsupported_protocol(requested, &current)));
            }

            let sent = self
                .client
                .get(current.clone())
                .timeout(options.timeout)
                .header(USER_AGENT, options.user_agent.as_str())
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                // A hop we were sent to, not something the caller asked for
                Err(error) if error.is_builder() && redirects > 0 => {
                    let reason = describe_error(&current, &error);
                    return Ok(Attempt::Settled(Outcome::dead(requested.as_str(), reason)));
                }
                Err(error) if error.is_builder() => {
                    return Err(CheckError::Request {
                        url: requested.to_string(),
                        reason: error.to_string(),
                    });
                }
                Err(error) => {
                    let reason = describe_error(&current, &error);
                    return Ok(Attempt::Retryable(Outcome::dead(requested.as_str(), reason)));
                }
            };

            let status = response.status();

            if status.is_redirection() {
                let Some(next) = redirect_target(&current, &response) else {
                    let reason = format!(
                        "Unexpected redirect response `{}` without `Location` header on `{}`",
                        status.as_u16(),
                        current
                    );
                    return Ok(Attempt::Settled(Outcome::dead(requested.as_str(), reason)));
                };

                redirects += 1;
                if redirects > options.max_redirects {
                    return Ok(Attempt::Settled(too_many_redirects(requested, options)));
                }
                debug!(from = %current, to = %next, "following redirect");
                current = next;
                continue;
            }

            if !status.is_success() {
                let reason = format!(
                    "Unexpected not ok response `{}` (`{}`) on `{}`",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown"),
                    current
                );
                let outcome = Outcome::dead(requested.as_str(), reason);
                return Ok(if is_retryable(status) {
                    Attempt::Retryable(outcome)
                } else {
                    Attempt::Settled(outcome)
                });
            }

            let landed = final_url(requested, &current);
            let fragment = landed
                .fragment()
                .filter(|fragment| !fragment.is_empty() && !fragment.starts_with(":~:"))
                .map(str::to_string);
            let wants_anchor = options.check_anchor && fragment.is_some();

            // Fast path: nothing in the body matters
            if !is_html(&response) || !(wants_anchor || options.follow_meta_http_equiv) {
                return Ok(Attempt::Settled(Outcome::alive(landed)));
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => {
                    let reason = describe_error(&current, &error);
                    return Ok(Attempt::Retryable(Outcome::dead(requested.as_str(), reason)));
                }
            };
            let facts = inspect_html(&body);

            if options.follow_meta_http_equiv {
                let refresh = facts.refresh.as_deref().and_then(|target| current.join(target).ok());
                if let Some(next) = refresh.filter(|next| !same_document(next, &current)) {
                    redirects += 1;
                    if redirects > options.max_redirects {
                        return Ok(Attempt::Settled(too_many_redirects(requested, options)));
                    }
                    debug!(from = %current, to = %next, "following meta refresh");
                    current = next;
                    continue;
                }
            }

            let mut outcome = Outcome::alive(landed.as_str());
            if let Some(fragment) = fragment.filter(|_| wants_anchor) {
                if !facts.has_anchor(&fragment) {
                    outcome = outcome.with_warning(format!(
                        "Unexpected missing anchor element on `{}` for fragment `{}`, \
                         remove if unneeded or refer to an existing element",
                        current, fragment
                    ));
                }
            }

            return Ok(Attempt::Settled(outcome));
        }
    }
}

#[async_trait]
impl UrlChecker for HttpChecker {
    async fn check(&self, url: &str, options: &CheckerOptions) -> Result<Outcome, CheckError> {
        let requested = Url::parse(url).map_err(|e| CheckError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut retries = 0;
        loop {
            match self.attempt(&requested, options).await? {
                Attempt::Settled(outcome) => return Ok(outcome),
                Attempt::Retryable(_) if retries < options.max_retries => {
                    retries += 1;
                    debug!(url, retries, "retrying after a failed attempt");
                    tokio::time::sleep(options.retry_wait).await;
                }
                Attempt::Retryable(outcome) => return Ok(outcome),
            }
        }
    }
}

// The URL we ended up at, carrying the requested fragment unless a redirect
// supplied its own.
fn final_url(requested: &Url, current: &Url) -> Url {
    let mut url = current.clone();
    if url.fragment().is_none() {
        url.set_fragment(requested.fragment());
    }
    url
}

fn same_document(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains("text/html"))
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn unsupported_protocol(requested: &Url, current: &Url) -> Outcome {
    Outcome::dead(
        requested.as_str(),
        format!(
            "Unexpected unsupported protocol `{}:` on `{}`",
            current.scheme(),
            current
        ),
    )
}

fn too_many_redirects(requested: &Url, options: &CheckerOptions) -> Outcome {
    Outcome::dead(
        requested.as_str(),
        format!(
            "Unexpected redirect chain longer than {} on `{}`",
            options.max_redirects, requested
        ),
    )
}

// Turns a reqwest failure into a readable reason.
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - SSL certificate issues
// - Connection refused
fn describe_error(url: &Url, error: &reqwest::Error) -> String {
    let chain = error_chain(error);
    let lowered = chain.to_ascii_lowercase();

    if error.is_timeout() {
        format!("Unexpected timeout on `{}`", url)
    } else if lowered.contains("dns") || lowered.contains("failed to lookup") {
        format!("Unexpected unresolvable host on `{}`", url)
    } else if lowered.contains("certificate") || lowered.contains("tls") {
        format!("Unexpected certificate error on `{}`: {}", url, chain)
    } else if error.is_connect() {
        format!("Unexpected connection failure on `{}`: {}", url, chain)
    } else {
        format!("Unexpected error on `{}`: {}", url, chain)
    }
}

// reqwest keeps the interesting part (e.g. "dns error") in the source chain.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::LinkStatus;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_options() -> CheckerOptions {
        CheckerOptions {
            max_retries: 0,
            retry_wait: Duration::from_millis(0),
            timeout: Duration::from_secs(5),
            ..CheckerOptions::default()
        }
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
    }

    #[tokio::test]
    async fn test_ok_response_is_alive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let url = format!("{}/ok", server.uri());
        let outcome = HttpChecker::new().unwrap().check(&url, &fast_options()).await.unwrap();

        assert_eq!(outcome.status, LinkStatus::Alive);
        assert_eq!(outcome.url, url);
        assert!(outcome.messages.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_dead() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let outcome = HttpChecker::new().unwrap().check(&url, &fast_options()).await.unwrap();

        assert!(outcome.is_dead());
        assert!(outcome.messages[0].reason.contains("`404`"));
        assert!(outcome.messages[0].fatal);
    }

    #[tokio::test]
    async fn test_redirect_reports_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let url = format!("{}/old", server.uri());
        let outcome = HttpChecker::new().unwrap().check(&url, &fast_options()).await.unwrap();

        assert_eq!(outcome.status, LinkStatus::Alive);
        assert_eq!(outcome.url, format!("{}/new", server.uri()));
    }

    #[tokio::test]
    async fn test_redirect_loop_is_dead() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
            .mount(&server)
            .await;

        let options = CheckerOptions {
            max_redirects: 2,
            ..fast_options()
        };
        let url = format!("{}/loop", server.uri());
        let outcome = HttpChecker::new().unwrap().check(&url, &options).await.unwrap();

        assert!(outcome.is_dead());
        assert!(outcome.messages[0].reason.contains("longer than 2"));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let options = CheckerOptions {
            max_retries: 2,
            ..fast_options()
        };
        let url = format!("{}/flaky", server.uri());
        let outcome = HttpChecker::new().unwrap().check(&url, &options).await.unwrap();

        assert!(outcome.is_dead());
        server.verify().await;
    }

    #[tokio::test]
    async fn test_missing_anchor_is_a_warning() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(html(r#"<h1 id="present">Hi</h1>"#))
            .mount(&server)
            .await;

        let checker = HttpChecker::new().unwrap();
        let present = format!("{}/page#present", server.uri());
        let outcome = checker.check(&present, &fast_options()).await.unwrap();
        assert_eq!(outcome.url, present);
        assert!(outcome.messages.is_empty());

        let absent = format!("{}/page#absent", server.uri());
        let outcome = checker.check(&absent, &fast_options()).await.unwrap();
        assert_eq!(outcome.status, LinkStatus::Alive);
        assert!(!outcome.is_dead());
        assert_eq!(outcome.messages.len(), 1);
        assert!(!outcome.messages[0].fatal);
        assert!(outcome.messages[0].reason.contains("`absent`"));

        let options = CheckerOptions {
            check_anchor: false,
            ..fast_options()
        };
        let outcome = checker.check(&absent, &options).await.unwrap();
        assert!(outcome.messages.is_empty());
    }

    #[tokio::test]
    async fn test_meta_refresh_is_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/moved"))
            .respond_with(html(r#"<meta http-equiv="refresh" content="0; url=/target">"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/target"))
            .respond_with(html("<p>here</p>"))
            .mount(&server)
            .await;

        let checker = HttpChecker::new().unwrap();
        let url = format!("{}/moved", server.uri());

        let outcome = checker.check(&url, &fast_options()).await.unwrap();
        assert_eq!(outcome.url, format!("{}/target", server.uri()));

        let options = CheckerOptions {
            follow_meta_http_equiv: false,
            ..fast_options()
        };
        let outcome = checker.check(&url, &options).await.unwrap();
        assert_eq!(outcome.url, url);
    }

    #[tokio::test]
    async fn test_unsupported_scheme_is_dead() {
        let outcome = HttpChecker::new()
            .unwrap()
            .check("flopper://example.com/", &fast_options())
            .await
            .unwrap();

        assert!(outcome.is_dead());
        assert!(outcome.messages[0].reason.contains("`flopper:`"));

        let outcome = HttpChecker::new()
            .unwrap()
            .check("mailto:someone@example.com", &fast_options())
            .await
            .unwrap();
        assert!(outcome.is_dead());
    }

    #[tokio::test]
    async fn test_redirect_to_unsupported_scheme_is_dead() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "ftp://example.com/file"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/x", server.uri());
        let outcome = HttpChecker::new().unwrap().check(&url, &fast_options()).await.unwrap();

        assert!(outcome.is_dead());
        assert_eq!(outcome.url, url);
        assert!(outcome.messages[0].fatal);
        assert!(outcome.messages[0].reason.contains("`ftp:`"));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_unparseable_url_is_an_error() {
        let result = HttpChecker::new().unwrap().check("not a url", &fast_options()).await;
        assert!(matches!(result, Err(CheckError::Request { .. })));
    }
}
