use recall_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use reqwest::{Client, StatusCode, Url};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_API_BASE: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Deserialize, JsonSchema)]
pub struct WeatherParameters {
    #[schemars(description = "City name, e.g. London.")]
    location: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    name: String,
    weather: Vec<Condition>,
    main: Readings,
    wind: Wind,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Readings {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

/// Where the weather tool fetches from.
#[derive(Clone, Debug)]
pub struct WeatherConfig {
    api_base: String,
    api_key: String,
}

impl WeatherConfig {
    /// Uses the OpenWeatherMap API with the given key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            api_key: api_key.into(),
        }
    }

    /// Overrides the API base URL.
    #[inline]
    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }
}

/// A tool for looking up the current weather of a city.
pub struct WeatherTool {
    client: Client,
    config: WeatherConfig,
    parameter_schema: Value,
}

impl WeatherTool {
    /// Creates a new weather tool.
    #[inline]
    pub fn new(config: WeatherConfig) -> Self {
        WeatherTool {
            client: Client::new(),
            config,
            parameter_schema: schema_for!(WeatherParameters).to_value(),
        }
    }
}

impl Tool for WeatherTool {
    type Input = WeatherParameters;

    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Get current weather conditions for a location (city name)"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: WeatherParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let config = self.config.clone();
        async move {
            let location = input.location.trim();
            if location.is_empty() {
                return Err(ToolError::execution_error()
                    .with_reason("Location is required"));
            }
            fetch_weather(&client, &config, location).await
        }
    }
}

async fn fetch_weather(
    client: &Client,
    config: &WeatherConfig,
    location: &str,
) -> ToolResult {
    let url = weather_url(config, location)?;
    let resp = client.get(url).send().await.map_err(fetch_error)?;

    match resp.status() {
        StatusCode::NOT_FOUND => {
            return Err(ToolError::execution_error().with_reason(format!(
                "Location \"{location}\" not found. Please check the spelling and try again."
            )));
        }
        status if !status.is_success() => {
            return Err(fetch_error(format!("server responded with {status}")));
        }
        _ => {}
    }

    let weather: WeatherResponse = resp.json().await.map_err(fetch_error)?;
    trace!("weather of {location}: {weather:?}");
    format_report(&weather)
}

fn weather_url(config: &WeatherConfig, location: &str) -> Result<Url, ToolError> {
    Url::parse_with_params(
        &format!("{}/weather", config.api_base),
        [
            ("q", location),
            ("appid", config.api_key.as_str()),
            ("units", "metric"),
        ],
    )
    .map_err(fetch_error)
}

#[inline]
fn fetch_error<E: std::fmt::Display>(err: E) -> ToolError {
    ToolError::execution_error()
        .with_reason(format!("Error fetching weather data: {err}"))
}

fn format_report(weather: &WeatherResponse) -> ToolResult {
    let Some(condition) = weather.weather.first() else {
        return Err(fetch_error("no conditions in the response"));
    };
    Ok(format!(
        "Current weather in {}:\n\
         Temperature: {}°C (feels like {}°C)\n\
         Conditions: {}\n\
         Humidity: {}%\n\
         Wind Speed: {} km/h",
        weather.name,
        weather.main.temp.round() as i64,
        weather.main.feels_like.round() as i64,
        condition.description,
        weather.main.humidity,
        (weather.wind.speed * 3.6).round() as i64,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> WeatherResponse {
        serde_json::from_value(serde_json::json!({
            "name": "London",
            "weather": [{ "main": "Clouds", "description": "overcast clouds" }],
            "main": { "temp": 14.6, "feels_like": 13.2, "humidity": 81 },
            "wind": { "speed": 4.1 },
            "cod": 200
        }))
        .unwrap()
    }

    #[test]
    fn test_format_report() {
        assert_eq!(
            format_report(&response()).unwrap(),
            "Current weather in London:\n\
             Temperature: 15°C (feels like 13°C)\n\
             Conditions: overcast clouds\n\
             Humidity: 81%\n\
             Wind Speed: 15 km/h"
        );
    }

    #[test]
    fn test_report_has_no_negative_zero() {
        let mut weather = response();
        weather.main.temp = -0.3;
        weather.main.feels_like = -0.4;
        let report = format_report(&weather).unwrap();
        assert!(report.contains("Temperature: 0°C (feels like 0°C)"));

        weather.main.temp = -2.6;
        let report = format_report(&weather).unwrap();
        assert!(report.contains("Temperature: -3°C"));
    }

    #[test]
    fn test_weather_url() {
        let config = WeatherConfig::with_api_key("secret")
            .with_api_base("http://localhost:8080/data/2.5/");
        let url = weather_url(&config, "São Paulo").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/data/2.5/weather?q=S%C3%A3o+Paulo&appid=secret&units=metric"
        );
    }

    #[tokio::test]
    async fn test_location_is_required() {
        let tool = WeatherTool::new(WeatherConfig::with_api_key("secret"));
        let input = WeatherParameters {
            location: "  ".to_owned(),
        };
        let err = tool.execute(input).await.unwrap_err();
        assert_eq!(err.to_string(), "Location is required");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let config = WeatherConfig::with_api_key("secret")
            .with_api_base("http://127.0.0.1:9");
        let tool = WeatherTool::new(config);
        let input = WeatherParameters {
            location: "London".to_owned(),
        };
        let err = tool.execute(input).await.unwrap_err();
        assert!(err.to_string().starts_with("Error fetching weather data: "));
    }
}
