use once_cell::sync::Lazy;

/// Base URL of the club administration REST API. Defaults to `http://127.0.0.1:8080/api`.
pub static CLUB_API_BASE_URL: Lazy<String> = Lazy::new(|| {
    read_optional_env("CLUB_API_BASE_URL")
        .unwrap_or_else(|| "http://127.0.0.1:8080/api".to_string())
});

/// Optional bearer token presented to the club administration API.
pub static CLUB_API_TOKEN: Lazy<Option<String>> = Lazy::new(|| read_optional_env("CLUB_API_TOKEN"));

/// Per-request timeout for collaborator calls. Defaults to `10` seconds.
pub static CLUB_API_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
    std::env::var("CLUB_API_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(10)
});

// key: membership-config -> attempt budget for roster aggregation

pub static MEMBERSHIP_MAX_ATTEMPTS: Lazy<u32> = Lazy::new(|| {
    std::env::var("MEMBERSHIP_MAX_ATTEMPTS")
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(5)
});

// key: membership-config -> first backoff delay, doubled after every failed round

pub static MEMBERSHIP_BASE_BACKOFF_MS: Lazy<u64> = Lazy::new(|| {
    std::env::var("MEMBERSHIP_BASE_BACKOFF_MS")
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(1000)
});

/// Address the HTTP server should bind to. Defaults to `0.0.0.0`.
pub static BIND_ADDRESS: Lazy<String> =
    Lazy::new(|| std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()));

/// Port the HTTP server should listen on. Defaults to `3000`.
pub static BIND_PORT: Lazy<u16> = Lazy::new(|| {
    std::env::var("BIND_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000)
});

fn read_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
