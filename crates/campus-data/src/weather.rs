//! Hong Kong Observatory 9-day forecast client.
//!
//! The response is deserialized into a strict shape and fails closed on
//! anything malformed; the body is never treated as executable input.

use campus_core::{config::WeatherConfig, error::CampusError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(rename = "weatherForecast")]
    weather_forecast: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    #[serde(rename = "forecastDate")]
    date: String,
    #[serde(rename = "forecastWeather")]
    weather: String,
}

pub struct WeatherClient {
    client: reqwest::Client,
    api_url: String,
    lang: String,
    days: usize,
    timeout: Duration,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            lang: config.lang.clone(),
            days: config.days,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Fetch the forecast as display lines, one per day.
    pub async fn forecast(&self) -> Result<Vec<String>, CampusError> {
        let resp = self
            .client
            .get(&self.api_url)
            .query(&[("dataType", "fnd"), ("lang", self.lang.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CampusError::Fetch("weather feed request timed out".to_string())
                } else {
                    CampusError::Fetch(format!("weather feed request failed: {e}"))
                }
            })?;

        if !resp.status().is_success() {
            return Err(CampusError::Fetch(format!(
                "weather feed returned HTTP {}",
                resp.status()
            )));
        }

        let parsed: ForecastResponse = resp
            .json()
            .await
            .map_err(|e| CampusError::Fetch(format!("invalid weather feed JSON: {e}")))?;

        Ok(format_forecast(&parsed, self.days))
    }
}

fn format_forecast(parsed: &ForecastResponse, days: usize) -> Vec<String> {
    parsed
        .weather_forecast
        .iter()
        .take(days)
        .map(|day| format!("{} : {}", day.date, day.weather))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_forecast() {
        let json = r#"{
            "generalSituation": "A trough of low pressure...",
            "weatherForecast": [
                {"forecastDate": "20240903", "forecastWeather": "Sunny periods", "week": "Tuesday"},
                {"forecastDate": "20240904", "forecastWeather": "Showers", "week": "Wednesday"}
            ]
        }"#;
        let parsed: ForecastResponse = serde_json::from_str(json).unwrap();
        let lines = format_forecast(&parsed, 9);
        assert_eq!(
            lines,
            vec![
                "20240903 : Sunny periods".to_string(),
                "20240904 : Showers".to_string(),
            ]
        );
    }

    #[test]
    fn test_forecast_capped_at_configured_days() {
        let days: Vec<String> = (1..=12)
            .map(|i| {
                format!(r#"{{"forecastDate": "202409{i:02}", "forecastWeather": "Fine"}}"#)
            })
            .collect();
        let json = format!(r#"{{"weatherForecast": [{}]}}"#, days.join(","));
        let parsed: ForecastResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(format_forecast(&parsed, 9).len(), 9);
    }

    #[test]
    fn test_malformed_body_fails_closed() {
        // Missing the weatherForecast field entirely.
        let result: Result<ForecastResponse, _> =
            serde_json::from_str(r#"{"anything": "but a forecast"}"#);
        assert!(result.is_err());
        // An array where an object is expected.
        let result: Result<ForecastResponse, _> =
            serde_json::from_str(r#"{"weatherForecast": "tomorrow"}"#);
        assert!(result.is_err());
    }
}
