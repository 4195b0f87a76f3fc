//! Mock weather data generation
//!
//! Every field is an independent uniform draw. There is no correlation
//! between fields: a rainy condition does not raise humidity, and
//! the current temperature is not clamped into `[min_temp, max_temp]`.

use crate::source::WeatherSource;
use crate::types::{
    AirQuality, DailySlot, HourlySlot, Result, WeatherBundle, WeatherError, WeatherKind,
    WeatherReading, WeekdayLabel, MAX_WIND_LEVEL,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, Timelike, Utc};
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Number of hourly slots per refresh
pub const HOURLY_SLOTS: usize = 24;

/// Number of daily slots per refresh
pub const DAILY_SLOTS: usize = 14;

/// Value ranges used by the generator
pub mod ranges {
    use std::ops::RangeInclusive;

    /// Current temperature, °C
    pub const TEMPERATURE: RangeInclusive<i32> = 5..=35;
    /// Apparent temperature offset from the current one
    pub const FEELS_LIKE_OFFSET: RangeInclusive<i32> = -3..=3;
    /// Relative humidity, %
    pub const HUMIDITY: RangeInclusive<u8> = 30..=90;
    /// Beaufort level
    pub const WIND_SPEED: RangeInclusive<u8> = 0..=super::MAX_WIND_LEVEL;
    /// Bearing in degrees
    pub const WIND_DIRECTION: RangeInclusive<u16> = 0..=359;
    /// hPa
    pub const PRESSURE: RangeInclusive<u32> = 990..=1030;
    /// km
    pub const VISIBILITY: RangeInclusive<u32> = 1..=30;
    /// UV index
    pub const UV_INDEX: RangeInclusive<u8> = 0..=11;
    /// Air quality index
    pub const AQI: RangeInclusive<u32> = 50..=250;
    /// PM2.5, µg/m³
    pub const PM25: RangeInclusive<u32> = 10..=150;
    /// PM10, µg/m³
    pub const PM10: RangeInclusive<u32> = 20..=200;
    /// Daily high, °C
    pub const MAX_TEMP: RangeInclusive<i32> = 20..=38;
    /// Daily low, °C
    pub const MIN_TEMP: RangeInclusive<i32> = 0..=20;
    /// Hour of sunrise
    pub const SUNRISE_HOUR: RangeInclusive<u32> = 5..=6;
    /// Hour of sunset
    pub const SUNSET_HOUR: RangeInclusive<u32> = 17..=19;
    /// Precipitation chance, %
    pub const PRECIPITATION: RangeInclusive<u8> = 0..=100;
}

/// Generate a complete bundle for `city` at `now`
pub fn generate_bundle<R: Rng + ?Sized>(
    rng: &mut R,
    city: &str,
    now: DateTime<Local>,
) -> WeatherBundle {
    WeatherBundle {
        current: generate_reading(rng, city, now.with_timezone(&Utc)),
        hourly: generate_hourly(rng, now.hour()),
        daily: generate_daily(rng, now),
    }
}

/// Generate current conditions
pub fn generate_reading<R: Rng + ?Sized>(
    rng: &mut R,
    city: &str,
    update_time: DateTime<Utc>,
) -> WeatherReading {
    let temperature = rng.random_range(ranges::TEMPERATURE);

    WeatherReading {
        location: city.to_string(),
        temperature,
        feels_like: temperature + rng.random_range(ranges::FEELS_LIKE_OFFSET),
        condition: random_kind(rng),
        humidity: rng.random_range(ranges::HUMIDITY),
        wind_speed: rng.random_range(ranges::WIND_SPEED),
        wind_direction: rng.random_range(ranges::WIND_DIRECTION),
        pressure: rng.random_range(ranges::PRESSURE),
        visibility: rng.random_range(ranges::VISIBILITY),
        uv_index: rng.random_range(ranges::UV_INDEX),
        air_quality: AirQuality::new(
            rng.random_range(ranges::AQI),
            rng.random_range(ranges::PM25),
            rng.random_range(ranges::PM10),
        ),
        max_temp: rng.random_range(ranges::MAX_TEMP),
        min_temp: rng.random_range(ranges::MIN_TEMP),
        sunrise: random_time(rng, ranges::SUNRISE_HOUR),
        sunset: random_time(rng, ranges::SUNSET_HOUR),
        update_time,
    }
}

/// Generate the 24-hour forecast starting at `start_hour`
pub fn generate_hourly<R: Rng + ?Sized>(rng: &mut R, start_hour: u32) -> Vec<HourlySlot> {
    (0..HOURLY_SLOTS as u32)
        .map(|offset| HourlySlot {
            hour: (start_hour + offset) % 24,
            temperature: rng.random_range(ranges::TEMPERATURE),
            weather_kind: random_kind(rng),
            precipitation_chance: rng.random_range(ranges::PRECIPITATION),
            wind_speed: rng.random_range(ranges::WIND_SPEED),
        })
        .collect()
}

/// Generate the 14-day forecast starting today
pub fn generate_daily<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Local>) -> Vec<DailySlot> {
    let today = now.date_naive();

    (0..DAILY_SLOTS)
        .map(|offset| {
            let date = today + ChronoDuration::days(offset as i64);
            DailySlot {
                date,
                weekday_label: WeekdayLabel::for_offset(offset, date),
                day_weather_kind: random_kind(rng),
                night_weather_kind: random_kind(rng),
                max_temp: rng.random_range(ranges::MAX_TEMP),
                min_temp: rng.random_range(ranges::MIN_TEMP),
                precipitation_chance: rng.random_range(ranges::PRECIPITATION),
                wind_speed: rng.random_range(ranges::WIND_SPEED),
                air_quality_level: AirQuality::new(rng.random_range(ranges::AQI), 0, 0).level,
            }
        })
        .collect()
}

fn random_kind<R: Rng + ?Sized>(rng: &mut R) -> WeatherKind {
    WeatherKind::ALL[rng.random_range(0..WeatherKind::ALL.len())]
}

fn random_time<R: Rng + ?Sized>(rng: &mut R, hours: RangeInclusive<u32>) -> NaiveTime {
    let hour = rng.random_range(hours);
    let minute = rng.random_range(0..60);
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Mock source configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Simulated network latency before data is produced
    pub latency: Duration,
    /// Probability in `0.0..=1.0` that a fetch fails
    pub failure_rate: f64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self { latency: Duration::from_secs(1), failure_rate: 0.0 }
    }
}

impl MockConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set simulated latency
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Set failure probability (clamped into `0.0..=1.0`)
    pub fn failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }
}

/// Weather source that synthesizes random data after a simulated delay
#[derive(Debug, Clone, Default)]
pub struct MockWeatherSource {
    config: MockConfig,
}

impl MockWeatherSource {
    /// Create a mock source
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Source configuration
    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    fn generate(&self, city: &str) -> Result<WeatherBundle> {
        let mut rng = rand::rng();

        if self.config.failure_rate > 0.0 && rng.random_bool(self.config.failure_rate) {
            return Err(WeatherError::Generation(format!(
                "simulated source failure for {}",
                city
            )));
        }

        Ok(generate_bundle(&mut rng, city, Local::now()))
    }
}

#[async_trait]
impl WeatherSource for MockWeatherSource {
    async fn fetch(&self, city: &str) -> Result<WeatherBundle> {
        if city.trim().is_empty() {
            return Err(WeatherError::InvalidCity(city.to_string()));
        }

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let bundle = self.generate(city)?;
        tracing::debug!(city, condition = ?bundle.current.condition, "generated mock weather");
        Ok(bundle)
    }
}
