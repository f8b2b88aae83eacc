//! OpenWeatherMap current-weather client

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::time::Duration;

use crate::core::Config;

#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub city: String,
    pub country: String,
    pub temperature: i32,
    pub feels_like: i32,
    pub humidity: u32,
    pub description: String,
    /// True when this is the placeholder reading rather than live data
    pub is_fallback: bool,
}

impl Weather {
    /// Placeholder reading used when the API is unavailable
    pub fn fallback(city: &str) -> Self {
        Self {
            city: city.to_string(),
            country: "PL".to_string(),
            temperature: 5,
            feels_like: 2,
            humidity: 75,
            description: "хмарно".to_string(),
            is_fallback: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    name: String,
    sys: SysSection,
    main: MainSection,
    weather: Vec<ConditionSection>,
}

#[derive(Debug, Deserialize)]
struct SysSection {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    temp: f64,
    feels_like: f64,
    humidity: u32,
}

#[derive(Debug, Deserialize)]
struct ConditionSection {
    description: String,
}

#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(api_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build weather HTTP client")?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.weather_api_url,
            config.weather_api_key.clone(),
            config.http_timeout,
        )
    }

    /// Current weather for `city`; never fails, falls back on any error
    pub async fn current(&self, city: &str) -> Weather {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No weather API key configured, using fallback for {city}");
            return Weather::fallback(city);
        };

        match self.fetch(city, api_key).await {
            Ok(weather) => weather,
            Err(e) => {
                warn!("Weather lookup for {city} failed: {e:#}");
                Weather::fallback(city)
            }
        }
    }

    async fn fetch(&self, city: &str, api_key: &str) -> Result<Weather> {
        let response = self
            .http
            .get(format!("{}/weather", self.api_url))
            .query(&[("q", city), ("appid", api_key), ("units", "metric"), ("lang", "uk")])
            .send()
            .await?
            .error_for_status()?;

        let data: CurrentWeatherResponse = response
            .json()
            .await
            .context("Unexpected weather response body")?;

        let description = data
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .unwrap_or_default();

        Ok(Weather {
            city: data.name,
            country: data.sys.country,
            temperature: data.main.temp.round() as i32,
            feels_like: data.main.feels_like.round() as i32,
            humidity: data.main.humidity,
            description,
            is_fallback: false,
        })
    }
}
