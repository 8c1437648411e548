//! The built-in tools that models can use.

mod calculator;
mod email;
mod search;
mod weather;

pub use calculator::CalculatorTool;
pub use email::EmailTool;
pub use search::SearchTool;
pub use weather::{WeatherConfig, WeatherTool};
