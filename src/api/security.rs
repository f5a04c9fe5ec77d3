use super::*;
use axum::extract::ConnectInfo;
use std::net::SocketAddr;

pub(super) const DEFAULT_API_RATE_LIMIT_PER_SEC: u32 = 180;
const MAX_TRACKED_CLIENTS: usize = 4096;

#[derive(Clone)]
pub(super) struct ApiSecurity {
    pub required_token: Option<String>,
    pub rate_limit_per_sec: u32,
    /// Take the client address from `x-forwarded-for` / `x-real-ip`. Only
    /// safe behind a reverse proxy that overwrites those headers.
    pub trust_proxy: bool,
    pub buckets: Arc<Mutex<HashMap<String, RateBucket>>>,
}

#[derive(Clone)]
pub(super) struct RateBucket {
    pub window_start: std::time::Instant,
    pub count: u32,
}

impl ApiSecurity {
    pub(super) fn new(required_token: Option<String>, rate_limit_per_sec: u32) -> Self {
        Self {
            required_token,
            rate_limit_per_sec: rate_limit_per_sec.max(1),
            trust_proxy: false,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(super) fn from_env() -> Self {
        let required_token = std::env::var("PALACE_API_TOKEN")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let rate_limit_per_sec = std::env::var("PALACE_API_RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_API_RATE_LIMIT_PER_SEC);
        let trust_proxy = std::env::var("PALACE_API_TRUST_PROXY")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if required_token.is_some() {
            info!("[Palace API] token auth enabled");
        }
        if trust_proxy {
            info!("[Palace API] rate limiting by forwarded client address");
        }
        Self::new(required_token, rate_limit_per_sec).with_trusted_proxy(trust_proxy)
    }

    pub(super) fn with_trusted_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Rate-limit key for a request: the forwarded client when a proxy is
    /// trusted, else the peer address of the connection.
    fn client_key(&self, req: &Request) -> String {
        if self.trust_proxy {
            let forwarded = req
                .headers()
                .get("x-forwarded-for")
                .or_else(|| req.headers().get("x-real-ip"))
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(client) = forwarded {
                return client.to_string();
            }
        }
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "local".to_string())
    }

    fn authorized(&self, headers: &axum::http::HeaderMap) -> bool {
        let Some(expected) = self.required_token.as_deref() else {
            return true;
        };
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .unwrap_or("")
        };
        let auth = header("authorization");
        let bearer = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .unwrap_or(auth);
        bearer == expected || header("x-api-key") == expected
    }

    /// Counts one request for `client`. Returns false once the client is
    /// over its per-second allowance.
    fn admit(&self, client: String) -> bool {
        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = std::time::Instant::now();
        let entry = buckets.entry(client).or_insert(RateBucket {
            window_start: now,
            count: 0,
        });
        if now.duration_since(entry.window_start).as_secs_f32() >= 1.0 {
            entry.window_start = now;
            entry.count = 0;
        }
        entry.count = entry.count.saturating_add(1);
        let admitted = entry.count <= self.rate_limit_per_sec;
        if buckets.len() > MAX_TRACKED_CLIENTS {
            buckets.retain(|_, v| now.duration_since(v.window_start).as_secs_f32() < 10.0);
        }
        admitted
    }
}

pub(super) async fn api_guard(
    State(security): State<ApiSecurity>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    if !security.authorized(req.headers()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::err(
                "Unauthorized: send Authorization: Bearer <PALACE_API_TOKEN>",
            )),
        )
            .into_response();
    }

    let client = security.client_key(&req);
    if !security.admit(client) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ApiResponse::err("Rate limit exceeded")),
        )
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::Request as HttpRequest, routing::get, Router};
    use tower::util::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn guarded(security: ApiSecurity) -> Router {
        Router::new()
            .route("/", get(ok_handler))
            .layer(middleware::from_fn_with_state(security, api_guard))
    }

    #[tokio::test]
    async fn open_when_no_token_configured() {
        let app = guarded(ApiSecurity::new(None, 100));
        let req = HttpRequest::builder()
            .uri("/")
            .body(axum::body::Body::empty())
            .expect("request");
        let res = app.oneshot(req).await.expect("response");
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_missing_or_wrong_token() {
        let app = guarded(ApiSecurity::new(Some("secret".to_string()), 100));

        let req = HttpRequest::builder()
            .uri("/")
            .body(axum::body::Body::empty())
            .expect("request");
        let res = app.clone().oneshot(req).await.expect("response");
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req_bad = HttpRequest::builder()
            .uri("/")
            .header("authorization", "Bearer nope")
            .body(axum::body::Body::empty())
            .expect("request");
        let res_bad = app.clone().oneshot(req_bad).await.expect("response");
        assert_eq!(res_bad.status(), StatusCode::UNAUTHORIZED);

        let req_key = HttpRequest::builder()
            .uri("/")
            .header("x-api-key", "secret")
            .body(axum::body::Body::empty())
            .expect("request");
        let res_key = app.oneshot(req_key).await.expect("response");
        assert_eq!(res_key.status(), StatusCode::OK);
    }

    fn from_peer(ip: [u8; 4], forwarded: Option<&str>) -> HttpRequest<axum::body::Body> {
        let mut builder = HttpRequest::builder()
            .uri("/")
            .header("authorization", "Bearer secret");
        if let Some(forwarded) = forwarded {
            builder = builder.header("x-forwarded-for", forwarded);
        }
        let mut req = builder.body(axum::body::Body::empty()).expect("request");
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
        req
    }

    #[tokio::test]
    async fn rate_limit_is_per_peer_address() {
        let app = guarded(ApiSecurity::new(Some("secret".to_string()), 1));

        let first = app.clone().oneshot(from_peer([10, 0, 0, 1], None)).await.expect("response");
        assert_eq!(first.status(), StatusCode::OK);
        let second = app.clone().oneshot(from_peer([10, 0, 0, 1], None)).await.expect("response");
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        let other = app.oneshot(from_peer([10, 0, 0, 2], None)).await.expect("response");
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn forwarded_headers_ignored_without_trusted_proxy() {
        let app = guarded(ApiSecurity::new(Some("secret".to_string()), 1));

        let first = app
            .clone()
            .oneshot(from_peer([10, 0, 0, 1], Some("1.1.1.1")))
            .await
            .expect("response");
        assert_eq!(first.status(), StatusCode::OK);
        let rotated = app
            .oneshot(from_peer([10, 0, 0, 1], Some("2.2.2.2")))
            .await
            .expect("response");
        assert_eq!(rotated.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn trusted_proxy_limits_by_forwarded_client() {
        let security = ApiSecurity::new(Some("secret".to_string()), 1).with_trusted_proxy(true);
        let app = guarded(security);
        let proxy = [127, 0, 0, 1];

        let first = app
            .clone()
            .oneshot(from_peer(proxy, Some("1.1.1.1, 127.0.0.1")))
            .await
            .expect("response");
        assert_eq!(first.status(), StatusCode::OK);
        let again = app
            .clone()
            .oneshot(from_peer(proxy, Some("1.1.1.1")))
            .await
            .expect("response");
        assert_eq!(again.status(), StatusCode::TOO_MANY_REQUESTS);
        let other = app
            .oneshot(from_peer(proxy, Some("2.2.2.2")))
            .await
            .expect("response");
        assert_eq!(other.status(), StatusCode::OK);
    }
}
