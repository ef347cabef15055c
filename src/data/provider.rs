use std::time::Duration;

use chrono::{DateTime, Utc};
use hyper::ext::ReasonPhrase;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::config::{LookupConfig, INDICATORS, KLINE_PATH};
use crate::models::kline::KlineSeries;

const ONE_DAY_MS: i64 = 86_400_000;

/// The `begin` anchor: one day past `now`, so the newest bucket is included.
pub fn begin_millis(now: DateTime<Utc>) -> i64 {
    now.timestamp_millis() + ONE_DAY_MS
}

/// HTTP client for the monthly, pre-adjusted kline endpoint.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct KlineClient {
    http: reqwest::Client,
    endpoint: Url,
    site_url: String,
    lookback_count: u32,
}

impl KlineClient {
    pub fn new(config: &LookupConfig) -> Result<Self, AppError> {
        config.validate()?;

        let base = config.base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{}{}", base, KLINE_PATH))
            .map_err(|e| AppError::InvalidConfig(format!("base_url {}: {}", base, e)))?;

        let http = reqwest::Client::builder()
            .default_headers(static_headers(config)?)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::InvalidConfig(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            site_url: config.site_url.trim_end_matches('/').to_string(),
            lookback_count: config.lookback_count,
        })
    }

    /// Full request URL for `symbol` anchored at `begin` (epoch millis).
    pub fn request_url(&self, symbol: &str, begin: i64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("symbol", symbol)
            .append_pair("begin", &begin.to_string())
            .append_pair("period", "month")
            .append_pair("type", "before")
            .append_pair("count", &format!("-{}", self.lookback_count))
            .append_pair("indicator", INDICATORS);
        url
    }

    /// Fetch the monthly series for `symbol`.
    pub async fn fetch_monthly(&self, symbol: &str) -> Result<KlineSeries, AppError> {
        let url = self.request_url(symbol, begin_millis(Utc::now()));
        debug!("GET {}", url);

        let referer = format!("{}/S/{}", self.site_url, symbol);
        let referer = HeaderValue::from_str(&referer).map_err(|_| {
            AppError::InvalidQuery(format!("symbol {:?} is not usable in a header", symbol))
        })?;

        let resp = self
            .http
            .get(url)
            .header(header::REFERER, referer)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = status_text(&resp);
            warn!("Kline request for {} returned {}", symbol, text);
            return Err(AppError::RequestFailed(text));
        }

        let body = resp.text().await?;
        let series = KlineSeries::from_json(&body)?;
        debug!("Received {} monthly rows for {}", series.len(), symbol);
        Ok(series)
    }
}

/// Status line as the provider sent it: the code plus its own reason phrase,
/// or the canonical one when the response carries none.
fn status_text(resp: &reqwest::Response) -> String {
    let status = resp.status();
    let reason = resp
        .extensions()
        .get::<ReasonPhrase>()
        .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
        .or_else(|| status.canonical_reason().map(str::to_string));
    match reason {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Headers shared by every request. `Referer` is per symbol and added later.
fn static_headers(config: &LookupConfig) -> Result<HeaderMap, AppError> {
    let value = |name: &str, v: &str| {
        HeaderValue::from_str(v)
            .map_err(|_| AppError::InvalidConfig(format!("{} is not a valid header value", name)))
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        value("accept_language", &config.accept_language)?,
    );
    headers.insert(
        header::ORIGIN,
        value("site_url", config.site_url.trim_end_matches('/'))?,
    );
    headers.insert(header::USER_AGENT, value("user_agent", &config.user_agent)?);

    let browser_hints = [
        (
            "sec-ch-ua",
            r#""Chromium";v="110", "Not A(Brand";v="24", "Google Chrome";v="110""#,
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", r#""macOS""#),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-site"),
    ];
    for (name, v) in browser_hints {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(v));
    }

    if let Some(credential) = &config.credential {
        let mut cookie = value("credential", credential.expose())?;
        cookie.set_sensitive(true);
        headers.insert(header::COOKIE, cookie);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::Credential;
    use chrono::TimeZone;

    #[test]
    fn test_begin_is_one_day_ahead() {
        let now = Utc.with_ymd_and_hms(2023, 2, 25, 8, 0, 0).unwrap();
        assert_eq!(begin_millis(now), now.timestamp_millis() + 86_400_000);
    }

    #[test]
    fn test_request_url() {
        let client = KlineClient::new(&LookupConfig::default()).unwrap();
        let url = client.request_url("SH600519", 1_677_400_000_000);

        assert_eq!(url.host_str(), Some("stock.xueqiu.com"));
        assert_eq!(url.path(), "/v5/stock/chart/kline.json");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("symbol"), Some("SH600519"));
        assert_eq!(get("begin"), Some("1677400000000"));
        assert_eq!(get("period"), Some("month"));
        assert_eq!(get("type"), Some("before"));
        assert_eq!(get("count"), Some("-284"));
        assert_eq!(get("indicator"), Some(INDICATORS));
    }

    #[test]
    fn test_headers_without_credential() {
        let headers = static_headers(&LookupConfig::default()).unwrap();
        assert!(headers.get(header::COOKIE).is_none());
        assert_eq!(headers.get(header::ORIGIN).unwrap(), "https://xueqiu.com");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "cors");
    }

    #[test]
    fn test_headers_with_credential() {
        let config = LookupConfig::default().with_credential(Credential::new("xq_a_token=abc"));
        let headers = static_headers(&config).unwrap();
        let cookie = headers.get(header::COOKIE).unwrap();
        assert_eq!(cookie, "xq_a_token=abc");
        assert!(cookie.is_sensitive());
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = LookupConfig::default().with_credential(Credential::new("bad\nvalue"));
        assert!(matches!(
            KlineClient::new(&config),
            Err(AppError::InvalidConfig(_))
        ));

        let config = LookupConfig {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(
            KlineClient::new(&config),
            Err(AppError::InvalidConfig(_))
        ));
    }
}
