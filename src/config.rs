use std::{str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Shape of the body sent with a play command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayBodyFormat {
    /// `{ trackId, deviceId }`
    #[default]
    TrackId,
    /// `{ uris: ["spotify:track:…"], deviceId }`
    Uris,
}

impl FromStr for PlayBodyFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "track-id" | "trackid" => Ok(Self::TrackId),
            "uris" => Ok(Self::Uris),
            _ => Err(()),
        }
    }
}

/// Which notifications count as "the track finished".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionRule {
    /// Position within the last second of a known duration, or a paused
    /// engine rewound to zero.
    #[default]
    TailOrRewind,
    /// Only the last-second rule.
    TailOnly,
}

impl FromStr for CompletionRule {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tail-or-rewind" => Ok(Self::TailOrRewind),
            "tail-only" => Ok(Self::TailOnly),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub api_base_url: String,
    pub device_name: String,
    pub volume: f32,
    pub poll_interval: Duration,
    pub ready_timeout: Duration,
    pub request_timeout: Duration,
    pub play_body: PlayBodyFormat,
    pub completion: CompletionRule,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            device_name: "Web Player".to_string(),
            volume: 0.5,
            poll_interval: Duration::from_millis(1000),
            ready_timeout: Duration::from_millis(10_000),
            request_timeout: Duration::from_secs(30),
            play_body: PlayBodyFormat::TrackId,
            completion: CompletionRule::TailOrRewind,
        }
    }
}

impl PlayerConfig {
    /// Reads `PLAYDECK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("PLAYDECK_API_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(name) = lookup("PLAYDECK_DEVICE_NAME") {
            config.device_name = name;
        }
        if let Some(raw) = lookup("PLAYDECK_VOLUME") {
            let volume: f32 = parse("PLAYDECK_VOLUME", &raw)?;
            config.volume = volume.clamp(0.0, 1.0);
        }
        if let Some(raw) = lookup("PLAYDECK_POLL_MS") {
            config.poll_interval = parse_millis("PLAYDECK_POLL_MS", &raw)?;
        }
        if let Some(raw) = lookup("PLAYDECK_READY_TIMEOUT_MS") {
            config.ready_timeout = parse_millis("PLAYDECK_READY_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("PLAYDECK_PLAY_BODY") {
            config.play_body = parse("PLAYDECK_PLAY_BODY", &raw)?;
        }
        if let Some(raw) = lookup("PLAYDECK_COMPLETION") {
            config.completion = parse("PLAYDECK_COMPLETION", &raw)?;
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

/// A positive number of milliseconds; zero is rejected.
fn parse_millis(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match parse::<u64>(key, raw)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
        ms => Ok(Duration::from_millis(ms)),
    }
}
