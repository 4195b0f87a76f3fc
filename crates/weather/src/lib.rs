//! Weather data model and mock data source for Nimbus
//!
//! There is no real weather provider: [`MockWeatherSource`] synthesizes
//! readings and forecasts after a simulated network delay.
//!
//! ```
//! use weather::{search_cities, AirQuality, AqiLevel, CompassPoint};
//!
//! let hits = search_cities("Shang", 8);
//! assert_eq!(hits[0].name, "上海市");
//!
//! assert_eq!(AirQuality::new(120, 80, 110).level, AqiLevel::LightlyPolluted);
//! assert_eq!(CompassPoint::from_degrees(200), CompassPoint::S);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cities;
pub mod mock;
pub mod source;
pub mod types;

pub use cities::{search_cities, CityInfo, CITIES};
pub use mock::{MockConfig, MockWeatherSource, DAILY_SLOTS, HOURLY_SLOTS};
pub use source::WeatherSource;
pub use types::*;
