use crate::{city::City, config::Config};
use anyhow::Context;
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
    thread,
};

/// The five daily prayers, in display order
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Self; 5] =
        [Self::Fajr, Self::Dhuhr, Self::Asr, Self::Maghrib, Self::Isha];

    /// Key in the API's timings map
    pub fn key(self) -> &'static str {
        match self {
            Self::Fajr => "Fajr",
            Self::Dhuhr => "Dhuhr",
            Self::Asr => "Asr",
            Self::Maghrib => "Maghrib",
            Self::Isha => "Isha",
        }
    }

    /// Arabic label shown next to the time
    pub fn label(self) -> &'static str {
        match self {
            Self::Fajr => "الفجر",
            Self::Dhuhr => "الظهر",
            Self::Asr => "العصر",
            Self::Maghrib => "المغرب",
            Self::Isha => "العشاء",
        }
    }
}

/// Gotta know when to pray
#[derive(Debug)]
pub struct Timings {
    url: String,
    country: String,
    method: String,
    /// ID of the city most recently handed to [Self::ensure]
    requested: Option<&'static str>,
    /// Sequence number of the most recently dispatched fetch. A completion
    /// that no longer matches this drops its response on the floor.
    latest: Arc<AtomicU64>,
    /// Fetches run in a separate thread and deposit their result here
    state: Arc<RwLock<FetchState>>,
}

impl Timings {
    pub fn new(config: &Config) -> Self {
        Self {
            url: format!("{}/v1/timingsByCity", config.api_host),
            country: config.country.clone(),
            method: config.method.to_string(),
            requested: None,
            latest: Arc::default(),
            state: Arc::default(),
        }
    }

    /// Fetch timings for the city unless they were already requested. Fires
    /// on the first call and whenever the city changes; otherwise a no-op.
    pub fn ensure(&mut self, city: &'static City) {
        if self.requested != Some(city.id) {
            self.requested = Some(city.id);
            self.fetch(city);
        }
    }

    /// A snapshot of the current fetch state, or `None` if a completion is
    /// mid-write. Callers should just keep their previous frame for that.
    pub fn snapshot(&self) -> Option<FetchState> {
        let Ok(guard) = self.state.try_read() else {
            // Writers hold the lock for nanoseconds, don't expect to hit this
            warn!("Failed to grab fetch state read lock");
            return None;
        };
        Some(guard.clone())
    }

    /// Spawn a thread to fetch timings for the given city. Every call issues
    /// an independent request; whichever was dispatched last owns the state,
    /// no matter the order the responses land in.
    pub fn fetch(&self, city: &'static City) {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.latest);
        let lock = Arc::clone(&self.state);
        let request = ureq::get(&self.url)
            .query("city", city.id)
            .query("country", &self.country)
            .query("method", &self.method);

        // Flag the request before the thread starts so the very next frame
        // can show a loading state
        match lock.write() {
            Ok(mut guard) => guard.loading = true,
            Err(_) => warn!("Failed to grab fetch state write lock"),
        }

        thread::spawn(move || {
            // Shitty try block
            let result: anyhow::Result<PrayerTimings> = (|| {
                info!(
                    "Fetching prayer timings for {} (request {generation})",
                    city.id
                );
                let response = request.call().with_context(|| {
                    format!("Error fetching prayer timings for {}", city.id)
                })?;
                let body: TimingsResponse = response
                    .into_json()
                    .context("Error parsing timings response as JSON")?;
                Ok(body.data)
            })();

            let Ok(mut guard) = lock.write() else {
                error!("Failed to grab fetch state write lock");
                return;
            };
            // Checked under the lock so a stale completion can't clobber a
            // newer dispatch's flag or data
            if latest.load(Ordering::SeqCst) != generation {
                debug!(
                    "Discarding superseded response for {} (request {generation})",
                    city.id
                );
                return;
            }

            guard.loading = false;
            match result {
                Ok(timings) => {
                    info!(
                        "Saving timings for {} (request {generation})",
                        city.id
                    );
                    guard.timings = Some(timings);
                    guard.generation = generation;
                }
                // Keep whatever we had. Old is better than nothing
                Err(err) => error!("Error fetching prayer timings: {err:?}"),
            }
        });
    }
}

/// Everything the presenter needs to know about fetch progress
#[derive(Clone, Debug, Default)]
pub struct FetchState {
    /// Timings from the last fetch that succeeded. Failures leave this alone.
    pub timings: Option<PrayerTimings>,
    /// True from dispatch until the most recently dispatched request settles
    pub loading: bool,
    /// Sequence number of the stored timings. Bumps exactly when `timings`
    /// is replaced, never on failure.
    pub generation: u64,
}

/// Response envelope from the timings endpoint. Everything outside `data`
/// (HTTP-ish code/status fields) is noise.
/// https://aladhan.com/prayer-times-api#get-/timingsByCity
#[derive(Clone, Debug, Deserialize)]
struct TimingsResponse {
    data: PrayerTimings,
}

/// One day of prayer timings for one city
#[derive(Clone, Debug, Deserialize)]
pub struct PrayerTimings {
    /// Prayer name -> 24-hour "HH:MM", in the order the API sent them
    timings: IndexMap<String, String>,
    date: DateInfo,
}

#[derive(Clone, Debug, Deserialize)]
struct DateInfo {
    gregorian: GregorianDate,
}

#[derive(Clone, Debug, Deserialize)]
struct GregorianDate {
    date: String,
}

impl PrayerTimings {
    /// The raw 24-hour time for a prayer, if the API sent one
    pub fn time24(&self, prayer: Prayer) -> Option<&str> {
        self.timings.get(prayer.key()).map(String::as_str)
    }

    /// 12-hour display time for a prayer. A time that doesn't parse is shown
    /// raw; a prayer missing from the response gets a placeholder.
    pub fn display_time(&self, prayer: Prayer) -> String {
        match self.time24(prayer) {
            Some(raw) => to_12_hour(raw).unwrap_or_else(|| raw.to_owned()),
            None => "--:--".into(),
        }
    }

    /// Full display row for a prayer
    pub fn row(&self, prayer: Prayer) -> String {
        format!("{} : {}", self.display_time(prayer), prayer.label())
    }

    /// Gregorian date the timings are for, as the API formatted it
    pub fn date(&self) -> &str {
        &self.date.gregorian.date
    }

    /// Every timing the API returned, in response order
    pub fn all(&self) -> impl '_ + Iterator<Item = (&str, &str)> {
        self.timings
            .iter()
            .map(|(name, time)| (name.as_str(), time.as_str()))
    }
}

/// Convert a 24-hour "HH:MM" string to a 12-hour clock string, e.g. "04:12"
/// to "4:12 AM". The minute field is carried over verbatim. Returns `None`
/// if the input doesn't look like a time.
pub fn to_12_hour(time24: &str) -> Option<String> {
    let (hour, minute) = time24.split_once(':')?;
    let hour = hour.parse::<u32>().ok()?;
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let hour = match hour % 12 {
        0 => 12,
        hour => hour,
    };
    Some(format!("{hour}:{minute} {suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "code": 200,
        "status": "OK",
        "data": {
            "timings": {
                "Fajr": "04:12",
                "Sunrise": "05:46",
                "Dhuhr": "11:58",
                "Asr": "15:31",
                "Sunset": "18:09",
                "Maghrib": "18:09",
                "Isha": "19:27"
            },
            "date": {
                "readable": "25 Aug 2026",
                "gregorian": {
                    "date": "25-08-2026",
                    "weekday": {"en": "Tuesday"}
                }
            },
            "meta": {"timezone": "Africa/Cairo"}
        }
    }"#;

    #[test]
    fn test_to_12_hour() {
        // Midnight and noon both show as 12
        assert_eq!(to_12_hour("00:05").as_deref(), Some("12:05 AM"));
        assert_eq!(to_12_hour("12:00").as_deref(), Some("12:00 PM"));
        assert_eq!(to_12_hour("13:30").as_deref(), Some("1:30 PM"));
        assert_eq!(to_12_hour("23:59").as_deref(), Some("11:59 PM"));
        assert_eq!(to_12_hour("04:12").as_deref(), Some("4:12 AM"));
        assert_eq!(to_12_hour("11:59").as_deref(), Some("11:59 AM"));
    }

    #[test]
    fn test_to_12_hour_whole_day() {
        for hour in 0u32..24 {
            let formatted = to_12_hour(&format!("{hour:02}:00")).unwrap();
            let (display_hour, rest) = formatted.split_once(':').unwrap();
            let display_hour: u32 = display_hour.parse().unwrap();
            assert!((1..=12).contains(&display_hour), "bad hour in {formatted}");
            let expected = if hour < 12 { "AM" } else { "PM" };
            assert!(rest.ends_with(expected), "bad suffix in {formatted}");
        }
    }

    #[test]
    fn test_to_12_hour_malformed() {
        assert_eq!(to_12_hour("noon"), None);
        assert_eq!(to_12_hour("7"), None);
        assert_eq!(to_12_hour(":30"), None);
        // Minutes pass through untouched, even weird ones
        assert_eq!(to_12_hour("1:5").as_deref(), Some("1:5 AM"));
    }

    #[test]
    fn test_parse_response() {
        let response: TimingsResponse = serde_json::from_str(RESPONSE).unwrap();
        let timings = response.data;
        assert_eq!(timings.time24(Prayer::Fajr), Some("04:12"));
        assert_eq!(timings.time24(Prayer::Isha), Some("19:27"));
        assert_eq!(timings.date(), "25-08-2026");
        assert_eq!(timings.row(Prayer::Fajr), "4:12 AM : الفجر");
        assert_eq!(timings.row(Prayer::Dhuhr), "11:58 AM : الظهر");

        // Response order survives the round trip
        let names: Vec<_> = timings.all().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            ["Fajr", "Sunrise", "Dhuhr", "Asr", "Sunset", "Maghrib", "Isha"]
        );
    }

    #[test]
    fn test_degraded_rows() {
        let mut response: TimingsResponse =
            serde_json::from_str(RESPONSE).unwrap();
        response.data.timings.shift_remove("Asr");
        assert_eq!(response.data.row(Prayer::Asr), "--:-- : العصر");

        // A time that doesn't parse is shown raw rather than dropped
        response.data.timings.insert("Isha".into(), "soon".into());
        assert_eq!(response.data.row(Prayer::Isha), "soon : العشاء");
    }
}
