use super::util::send_with_retry;
use crate::core::currency::{CurrencyRateProvider, CurrencyRecord, query_key};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

const RETRY_DELAY_MS: u64 = 250;

/// Client for the currency converter API (`/api/v5/currencies`, `/api/v5/convert`).
pub struct CurrencyConverterApi {
    base_url: String,
    api_key: Option<String>,
    retries: usize,
    client: reqwest::Client,
}

impl CurrencyConverterApi {
    pub fn new(base_url: &str, api_key: Option<&str>, retries: usize) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent("xcc/1.0").build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            retries,
            client,
        })
    }

    /// Joins `endpoint` onto the base URL with percent-encoded query parameters.
    fn url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url> {
        let api_key = self.api_key.as_deref().map(|key| ("apiKey", key));
        Url::parse_with_params(
            &format!("{}{}", self.base_url, endpoint),
            params.iter().copied().chain(api_key),
        )
        .with_context(|| format!("Invalid API URL: {}{}", self.base_url, endpoint))
    }

    async fn fetch_text(&self, url: Url) -> Result<String> {
        let send = || self.client.get(url.clone()).send();
        let response = send_with_retry(send, self.retries, RETRY_DELAY_MS)
            .await
            .with_context(|| format!("Request error for URL: {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for URL: {}", response.status(), url));
        }

        response
            .text()
            .await
            .context("Failed to get response text")
    }
}

#[derive(Debug, Deserialize)]
struct CurrenciesResponse {
    results: BTreeMap<String, CurrencyItem>,
}

#[derive(Debug, Deserialize)]
struct CurrencyItem {
    id: String,
    #[serde(rename = "currencyName")]
    currency_name: String,
    #[serde(rename = "currencySymbol")]
    currency_symbol: Option<String>,
}

impl From<CurrencyItem> for CurrencyRecord {
    fn from(item: CurrencyItem) -> Self {
        CurrencyRecord {
            id: item.id,
            name: item.currency_name,
            symbol: item.currency_symbol.filter(|s| !s.is_empty()),
        }
    }
}

#[async_trait]
impl CurrencyRateProvider for CurrencyConverterApi {
    #[instrument(name = "CurrencyListFetch", skip(self))]
    async fn list_currencies(&self) -> Result<Vec<CurrencyRecord>> {
        let url = self.url("/api/v5/currencies", &[])?;
        debug!("Requesting currency list from {}", self.base_url);

        let text = self.fetch_text(url).await?;
        let data: CurrenciesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse currency list response: {}", e))?;

        if data.results.is_empty() {
            return Err(anyhow!("No currencies found in response"));
        }
        Ok(data.results.into_values().map(CurrencyRecord::from).collect())
    }

    #[instrument(name = "CurrencyRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let query = query_key(from, to);
        let url = self.url("/api/v5/convert", &[("q", query.as_str()), ("compact", "ultra")])?;
        debug!("Requesting currency rate for {}", query);

        let text = self.fetch_text(url).await?;
        let data: BTreeMap<String, serde_json::Value> = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", query, e))?;

        let rate = data
            .get(&query)
            .and_then(serde_json::Value::as_f64)
            .filter(|rate| rate.is_finite())
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", query))?;
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_convert(mock_server: &MockServer, query: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/api/v5/convert"))
            .and(query_param("q", query))
            .and(query_param("compact", "ultra"))
            .respond_with(response)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_server = MockServer::start().await;
        mock_convert(
            &mock_server,
            "USD_EUR",
            ResponseTemplate::new(200).set_body_string(r#"{"USD_EUR": 0.861504}"#),
        )
        .await;

        let provider = CurrencyConverterApi::new(&mock_server.uri(), None, 0).unwrap();
        let rate = provider.get_rate("USD", "EUR").await.unwrap();
        assert_eq!(rate, 0.861504);
    }

    #[tokio::test]
    async fn test_api_key_is_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v5/convert"))
            .and(query_param("apiKey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"USD_INR": 83.1}"#))
            .mount(&mock_server)
            .await;

        let provider = CurrencyConverterApi::new(&mock_server.uri(), Some("secret"), 0).unwrap();
        assert_eq!(provider.get_rate("USD", "INR").await.unwrap(), 83.1);
    }

    #[tokio::test]
    async fn test_query_values_are_percent_encoded() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v5/convert"))
            .and(query_param("q", "A&B_EUR"))
            .and(query_param("compact", "ultra"))
            .and(query_param("apiKey", "k=1&x"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"A&B_EUR": 2.5}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = CurrencyConverterApi::new(&mock_server.uri(), Some("k=1&x"), 0).unwrap();
        assert_eq!(provider.get_rate("A&B", "EUR").await.unwrap(), 2.5);
    }

    #[tokio::test]
    async fn test_missing_rate_is_an_error() {
        let mock_server = MockServer::start().await;
        mock_convert(
            &mock_server,
            "USD_EUR",
            ResponseTemplate::new(200).set_body_string("{}"),
        )
        .await;

        let provider = CurrencyConverterApi::new(&mock_server.uri(), None, 0).unwrap();
        let result = provider.get_rate("USD", "EUR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rate data found for currency pair: USD_EUR"
        );
    }

    #[tokio::test]
    async fn test_malformed_rate_response() {
        let mock_server = MockServer::start().await;
        mock_convert(
            &mock_server,
            "USD_EUR",
            ResponseTemplate::new(200).set_body_string(r#"{"USD_EUR": "n/a"}"#),
        )
        .await;

        let provider = CurrencyConverterApi::new(&mock_server.uri(), None, 0).unwrap();
        assert!(provider.get_rate("USD", "EUR").await.is_err());

        let mock_server = MockServer::start().await;
        mock_convert(
            &mock_server,
            "USD_EUR",
            ResponseTemplate::new(200).set_body_string("<html>"),
        )
        .await;
        let provider = CurrencyConverterApi::new(&mock_server.uri(), None, 0).unwrap();
        assert!(
            provider
                .get_rate("USD", "EUR")
                .await
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for USD_EUR")
        );
    }

    #[tokio::test]
    async fn test_server_error_response() {
        let mock_server = MockServer::start().await;
        mock_convert(&mock_server, "USD_EUR", ResponseTemplate::new(500)).await;

        let provider = CurrencyConverterApi::new(&mock_server.uri(), None, 0).unwrap();
        let err = provider.get_rate("USD", "EUR").await.unwrap_err();
        assert!(err.to_string().starts_with("HTTP error: 500 Internal Server Error"));
    }

    #[tokio::test]
    async fn test_successful_currency_list_fetch() {
        let mock_server = MockServer::start().await;
        let body = r#"{
            "results": {
                "EUR": {"currencyName": "Euro", "currencySymbol": "€", "id": "EUR"},
                "ALL": {"currencyName": "Albanian Lek", "currencySymbol": "Lek", "id": "ALL"},
                "XCD": {"currencyName": "East Caribbean Dollar", "id": "XCD"}
            }
        }"#;
        Mock::given(method("GET"))
            .and(path("/api/v5/currencies"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let provider = CurrencyConverterApi::new(&mock_server.uri(), None, 0).unwrap();
        let currencies = provider.list_currencies().await.unwrap();

        assert_eq!(currencies.len(), 3);
        assert_eq!(currencies[0], CurrencyRecord::new("ALL", "Albanian Lek", Some("Lek")));
        assert_eq!(currencies[1], CurrencyRecord::new("EUR", "Euro", Some("€")));
        assert_eq!(currencies[2].symbol, None);
    }

    #[tokio::test]
    async fn test_empty_currency_list_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v5/currencies"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"results": {}}"#))
            .mount(&mock_server)
            .await;

        let provider = CurrencyConverterApi::new(&mock_server.uri(), None, 0).unwrap();
        assert!(provider.list_currencies().await.is_err());
    }
}
