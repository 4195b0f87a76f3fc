//! Weather data model
//!
//! Readings and forecast slots are plain values. They are regenerated wholesale
//! on every refresh and never merged with earlier data.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Weather condition categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherKind {
    /// Clear sky
    #[default]
    Sunny,
    /// Sun with some cloud
    PartlyCloudy,
    /// Mostly cloudy
    Cloudy,
    /// Full cloud cover
    Overcast,
    /// Light rain
    LightRain,
    /// Moderate rain
    ModerateRain,
    /// Heavy rain
    HeavyRain,
    /// Thunderstorm
    Thunderstorm,
    /// Snow
    Snow,
    /// Mixed rain and snow
    Sleet,
    /// Fog
    Fog,
    /// Haze or smog
    Haze,
}

impl WeatherKind {
    /// Every kind, in display order
    pub const ALL: [WeatherKind; 12] = [
        WeatherKind::Sunny,
        WeatherKind::PartlyCloudy,
        WeatherKind::Cloudy,
        WeatherKind::Overcast,
        WeatherKind::LightRain,
        WeatherKind::ModerateRain,
        WeatherKind::HeavyRain,
        WeatherKind::Thunderstorm,
        WeatherKind::Snow,
        WeatherKind::Sleet,
        WeatherKind::Fog,
        WeatherKind::Haze,
    ];

    /// Localization key for the condition name
    pub fn translation_key(&self) -> &'static str {
        match self {
            Self::Sunny => "condition.sunny",
            Self::PartlyCloudy => "condition.partly-cloudy",
            Self::Cloudy => "condition.cloudy",
            Self::Overcast => "condition.overcast",
            Self::LightRain => "condition.light-rain",
            Self::ModerateRain => "condition.moderate-rain",
            Self::HeavyRain => "condition.heavy-rain",
            Self::Thunderstorm => "condition.thunderstorm",
            Self::Snow => "condition.snow",
            Self::Sleet => "condition.sleet",
            Self::Fog => "condition.fog",
            Self::Haze => "condition.haze",
        }
    }

    /// Icon name used by the view layer
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Sunny => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Cloudy | Self::Overcast => "cloud",
            Self::LightRain | Self::ModerateRain | Self::HeavyRain => "cloud_rain",
            Self::Thunderstorm => "cloud_lightning",
            Self::Snow | Self::Sleet => "cloud_snow",
            Self::Fog | Self::Haze => "cloud_fog",
        }
    }

    /// Whether the condition involves falling precipitation
    pub fn is_precipitation(&self) -> bool {
        matches!(
            self,
            Self::LightRain
                | Self::ModerateRain
                | Self::HeavyRain
                | Self::Thunderstorm
                | Self::Snow
                | Self::Sleet
        )
    }

    /// Whether visibility is reduced by particles in the air
    pub fn is_obscured(&self) -> bool {
        matches!(self, Self::Fog | Self::Haze)
    }
}

/// Air quality category derived from the AQI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiLevel {
    /// 0-50
    Excellent,
    /// 51-100
    Good,
    /// 101-150
    LightlyPolluted,
    /// 151-200
    ModeratelyPolluted,
    /// 201-300
    HeavilyPolluted,
    /// Above 300
    SeverelyPolluted,
}

impl AqiLevel {
    /// Classify an AQI value
    pub fn from_aqi(aqi: u32) -> Self {
        match aqi {
            0..=50 => Self::Excellent,
            51..=100 => Self::Good,
            101..=150 => Self::LightlyPolluted,
            151..=200 => Self::ModeratelyPolluted,
            201..=300 => Self::HeavilyPolluted,
            _ => Self::SeverelyPolluted,
        }
    }

    /// Localization key for the level name
    pub fn translation_key(&self) -> &'static str {
        match self {
            Self::Excellent => "aqi.excellent",
            Self::Good => "aqi.good",
            Self::LightlyPolluted => "aqi.lightly-polluted",
            Self::ModeratelyPolluted => "aqi.moderately-polluted",
            Self::HeavilyPolluted => "aqi.heavily-polluted",
            Self::SeverelyPolluted => "aqi.severely-polluted",
        }
    }

    /// Indicator color for the level
    pub fn color(&self) -> &'static str {
        match self {
            Self::Excellent => "#00E400",
            Self::Good => "#FFFF00",
            Self::LightlyPolluted => "#FF7E00",
            Self::ModeratelyPolluted => "#FF0000",
            Self::HeavilyPolluted => "#99004C",
            Self::SeverelyPolluted => "#7E0023",
        }
    }
}

/// Air quality measurements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQuality {
    /// Air quality index
    pub aqi: u32,
    /// Category derived from `aqi`
    pub level: AqiLevel,
    /// PM2.5 concentration in µg/m³
    pub pm25: u32,
    /// PM10 concentration in µg/m³
    pub pm10: u32,
}

impl AirQuality {
    /// Build a measurement, deriving the level from the AQI value
    pub fn new(aqi: u32, pm25: u32, pm10: u32) -> Self {
        Self { aqi, level: AqiLevel::from_aqi(aqi), pm25, pm10 }
    }
}

/// Eight-point compass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    /// North
    N,
    /// Northeast
    NE,
    /// East
    E,
    /// Southeast
    SE,
    /// South
    S,
    /// Southwest
    SW,
    /// West
    W,
    /// Northwest
    NW,
}

impl CompassPoint {
    /// Map a bearing in degrees onto the nearest compass point
    pub fn from_degrees(degrees: u16) -> Self {
        const POINTS: [CompassPoint; 8] = [
            CompassPoint::N,
            CompassPoint::NE,
            CompassPoint::E,
            CompassPoint::SE,
            CompassPoint::S,
            CompassPoint::SW,
            CompassPoint::W,
            CompassPoint::NW,
        ];
        let normalized = (degrees % 360) as f64;
        let index = ((normalized + 22.5) / 45.0).floor() as usize % 8;
        POINTS[index]
    }

    /// Localization key for the direction name
    pub fn translation_key(&self) -> &'static str {
        match self {
            Self::N => "wind.n",
            Self::NE => "wind.ne",
            Self::E => "wind.e",
            Self::SE => "wind.se",
            Self::S => "wind.s",
            Self::SW => "wind.sw",
            Self::W => "wind.w",
            Self::NW => "wind.nw",
        }
    }
}

/// Highest Beaufort level
pub const MAX_WIND_LEVEL: u8 = 12;

/// Representative speed in km/h for a Beaufort level
pub fn beaufort_to_kmh(level: u8) -> f64 {
    const MIDPOINTS: [f64; 13] =
        [0.5, 3.0, 8.5, 15.5, 24.0, 33.5, 44.0, 55.5, 68.0, 81.5, 95.5, 110.0, 125.0];
    MIDPOINTS[level.min(MAX_WIND_LEVEL) as usize]
}

/// Current conditions for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    /// City name
    pub location: String,
    /// Degrees Celsius
    pub temperature: i32,
    /// Apparent temperature, degrees Celsius
    pub feels_like: i32,
    /// Current condition
    pub condition: WeatherKind,
    /// Relative humidity, 0-100
    pub humidity: u8,
    /// Beaufort level, 0-12
    pub wind_speed: u8,
    /// Degrees, 0-359
    pub wind_direction: u16,
    /// hPa
    pub pressure: u32,
    /// km
    pub visibility: u32,
    /// 0-11
    pub uv_index: u8,
    /// Air quality measurements
    pub air_quality: AirQuality,
    /// Today's high, degrees Celsius
    pub max_temp: i32,
    /// Today's low, degrees Celsius
    pub min_temp: i32,
    /// Local sunrise
    pub sunrise: NaiveTime,
    /// Local sunset
    pub sunset: NaiveTime,
    /// When the reading was produced
    pub update_time: DateTime<Utc>,
}

impl WeatherReading {
    /// Whether `min_temp <= temperature <= max_temp` holds
    ///
    /// The mock source draws these fields independently, so this can be false.
    pub fn is_temperature_consistent(&self) -> bool {
        self.min_temp <= self.temperature && self.temperature <= self.max_temp
    }

    /// Whether a local time falls between sunrise and sunset
    pub fn is_daytime_at(&self, time: NaiveTime) -> bool {
        time >= self.sunrise && time < self.sunset
    }

    /// Compass direction of the wind
    pub fn wind_compass(&self) -> CompassPoint {
        CompassPoint::from_degrees(self.wind_direction)
    }
}

/// One hour of the 24-hour forecast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlySlot {
    /// Hour of day, 0-23
    pub hour: u32,
    /// Degrees Celsius
    pub temperature: i32,
    /// Expected condition
    pub weather_kind: WeatherKind,
    /// 0-100
    pub precipitation_chance: u8,
    /// Beaufort level
    pub wind_speed: u8,
}

/// Label shown for a forecast day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "day", rename_all = "snake_case")]
pub enum WeekdayLabel {
    /// First forecast day
    Today,
    /// Second forecast day
    Tomorrow,
    /// Any later day, by name
    Weekday(Weekday),
}

impl WeekdayLabel {
    /// Label for the forecast day `offset` days after `today`
    pub fn for_offset(offset: usize, date: NaiveDate) -> Self {
        use chrono::Datelike;

        match offset {
            0 => Self::Today,
            1 => Self::Tomorrow,
            _ => Self::Weekday(date.weekday()),
        }
    }

    /// Localization key for the label
    pub fn translation_key(&self) -> &'static str {
        match self {
            Self::Today => "day.today",
            Self::Tomorrow => "day.tomorrow",
            Self::Weekday(Weekday::Mon) => "weekday.mon",
            Self::Weekday(Weekday::Tue) => "weekday.tue",
            Self::Weekday(Weekday::Wed) => "weekday.wed",
            Self::Weekday(Weekday::Thu) => "weekday.thu",
            Self::Weekday(Weekday::Fri) => "weekday.fri",
            Self::Weekday(Weekday::Sat) => "weekday.sat",
            Self::Weekday(Weekday::Sun) => "weekday.sun",
        }
    }
}

/// One day of the 14-day forecast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySlot {
    /// Calendar date
    pub date: NaiveDate,
    /// Label shown for the day
    pub weekday_label: WeekdayLabel,
    /// Daytime condition
    pub day_weather_kind: WeatherKind,
    /// Nighttime condition
    pub night_weather_kind: WeatherKind,
    /// High, degrees Celsius
    pub max_temp: i32,
    /// Low, degrees Celsius
    pub min_temp: i32,
    /// 0-100
    pub precipitation_chance: u8,
    /// Beaufort level
    pub wind_speed: u8,
    /// Expected air quality category
    pub air_quality_level: AqiLevel,
}

/// Everything one refresh produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherBundle {
    /// Current conditions
    pub current: WeatherReading,
    /// Next 24 hours, one slot per hour
    pub hourly: Vec<HourlySlot>,
    /// Next 14 days, starting today
    pub daily: Vec<DailySlot>,
}

/// Weather source errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeatherError {
    /// The source could not produce data
    #[error("Weather data generation failed: {0}")]
    Generation(String),
    /// The city name was rejected
    #[error("Invalid city name: {0:?}")]
    InvalidCity(String),
}

/// Result type for weather operations
pub type Result<T> = std::result::Result<T, WeatherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aqi_level_boundaries() {
        assert_eq!(AqiLevel::from_aqi(0), AqiLevel::Excellent);
        assert_eq!(AqiLevel::from_aqi(50), AqiLevel::Excellent);
        assert_eq!(AqiLevel::from_aqi(51), AqiLevel::Good);
        assert_eq!(AqiLevel::from_aqi(100), AqiLevel::Good);
        assert_eq!(AqiLevel::from_aqi(150), AqiLevel::LightlyPolluted);
        assert_eq!(AqiLevel::from_aqi(200), AqiLevel::ModeratelyPolluted);
        assert_eq!(AqiLevel::from_aqi(300), AqiLevel::HeavilyPolluted);
        assert_eq!(AqiLevel::from_aqi(301), AqiLevel::SeverelyPolluted);
    }

    #[test]
    fn test_aqi_levels_are_ordered() {
        assert!(AqiLevel::Excellent < AqiLevel::Good);
        assert!(AqiLevel::HeavilyPolluted < AqiLevel::SeverelyPolluted);
    }

    #[test]
    fn test_air_quality_derives_level() {
        let aq = AirQuality::new(120, 80, 110);
        assert_eq!(aq.level, AqiLevel::LightlyPolluted);
    }

    #[test]
    fn test_compass_point_from_degrees() {
        assert_eq!(CompassPoint::from_degrees(0), CompassPoint::N);
        assert_eq!(CompassPoint::from_degrees(22), CompassPoint::N);
        assert_eq!(CompassPoint::from_degrees(23), CompassPoint::NE);
        assert_eq!(CompassPoint::from_degrees(90), CompassPoint::E);
        assert_eq!(CompassPoint::from_degrees(180), CompassPoint::S);
        assert_eq!(CompassPoint::from_degrees(270), CompassPoint::W);
        assert_eq!(CompassPoint::from_degrees(338), CompassPoint::N);
        assert_eq!(CompassPoint::from_degrees(359), CompassPoint::N);
    }

    #[test]
    fn test_beaufort_to_kmh_clamps() {
        assert_eq!(beaufort_to_kmh(0), 0.5);
        assert_eq!(beaufort_to_kmh(12), 125.0);
        assert_eq!(beaufort_to_kmh(40), 125.0);
    }

    #[test]
    fn test_weather_kind_keys_are_unique() {
        let mut keys: Vec<_> = WeatherKind::ALL.iter().map(|k| k.translation_key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), WeatherKind::ALL.len());
    }

    #[test]
    fn test_weather_kind_precipitation() {
        assert!(WeatherKind::HeavyRain.is_precipitation());
        assert!(WeatherKind::Snow.is_precipitation());
        assert!(!WeatherKind::Fog.is_precipitation());
        assert!(WeatherKind::Haze.is_obscured());
    }

    #[test]
    fn test_weekday_label_for_offset() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(); // Friday
        assert_eq!(WeekdayLabel::for_offset(0, date), WeekdayLabel::Today);
        assert_eq!(WeekdayLabel::for_offset(1, date), WeekdayLabel::Tomorrow);
        assert_eq!(WeekdayLabel::for_offset(2, date), WeekdayLabel::Weekday(Weekday::Fri));
        assert_eq!(WeekdayLabel::Weekday(Weekday::Sun).translation_key(), "weekday.sun");
    }

    #[test]
    fn test_weather_kind_serialization() {
        let json = serde_json::to_string(&WeatherKind::PartlyCloudy).unwrap();
        assert_eq!(json, "\"partly_cloudy\"");
    }
}
