//! Format-detection predicates shared by the validator (`format` keyword)
//! and the inferencer (`infer_formats`).
//!
//! Each predicate matches the *entire* string. Regex-backed where a regex
//! is the natural expression; `std::net` and a small label checker where it
//! is not (ipv4/ipv6 address grammar, hostname length limits).

use once_cell::sync::Lazy;
use regex::Regex;

/// Names recognised by [`check`], in no particular order.
pub const KNOWN_FORMATS: &[&str] = &[
    "email",
    "uuid",
    "date",
    "date-time",
    "time",
    "uri",
    "ipv4",
    "ipv6",
    "hostname",
];

/// Detection order for the inferencer: most specific first, so a UUID is
/// reported as `uuid` even though it also satisfies the hostname grammar.
pub(crate) const DETECTION_ORDER: &[&str] = &[
    "uuid",
    "email",
    "date-time",
    "date",
    "time",
    "ipv4",
    "ipv6",
    "uri",
    "hostname",
];

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@([A-Za-z0-9-]+\.)*[A-Za-z0-9-]{2,}$")
        .expect("static pattern compiles")
});

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}$")
        .expect("static pattern compiles")
});

static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("static pattern compiles")
});

static TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):[0-5]\d:([0-5]\d|60)(\.\d+)?([Zz]|[+-]([01]\d|2[0-3]):[0-5]\d)?$")
        .expect("static pattern compiles")
});

static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])[Tt]([01]\d|2[0-3]):[0-5]\d:([0-5]\d|60)(\.\d+)?([Zz]|[+-]([01]\d|2[0-3]):[0-5]\d)$",
    )
    .expect("static pattern compiles")
});

static URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:.+$").expect("static pattern compiles"));

/// `Some(matched)` for a known format name, `None` for an unknown one (the
/// caller's annotation case).
pub fn check(format: &str, value: &str) -> Option<bool> {
    let matched = match format {
        "email" => EMAIL.is_match(value),
        "uuid" => UUID.is_match(value),
        "date" => DATE.is_match(value),
        "date-time" => DATE_TIME.is_match(value),
        "time" => TIME.is_match(value),
        "uri" => URI.is_match(value),
        "ipv4" => value.parse::<std::net::Ipv4Addr>().is_ok(),
        "ipv6" => value.parse::<std::net::Ipv6Addr>().is_ok(),
        "hostname" => is_hostname(value),
        _ => return None,
    };
    Some(matched)
}

/// Dot-separated labels of `[A-Za-z0-9-]`, each 1..=63 chars, none starting
/// or ending with `-`, 253 chars total at most.
fn is_hostname(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 {
        return false;
    }
    value.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(format: &str, value: &str) {
        assert_eq!(check(format, value), Some(true), "{format} {value:?}");
    }

    fn bad(format: &str, value: &str) {
        assert_eq!(check(format, value), Some(false), "{format} {value:?}");
    }

    #[test]
    fn test_email() {
        ok("email", "a@b.co");
        ok("email", "alice.johnson+tag@example.museum");
        bad("email", "not-an-email");
        bad("email", "a@b");
        bad("email", "@example.com");
    }

    #[test]
    fn test_uuid() {
        ok("uuid", "550e8400-e29b-41d4-a716-446655440000");
        ok("uuid", "550E8400-E29B-41D4-A716-446655440000");
        bad("uuid", "550e8400e29b41d4a716446655440000");
        bad("uuid", "550e8400-e29b-41d4-a716-44665544000");
    }

    #[test]
    fn test_date() {
        ok("date", "2025-10-02");
        ok("date", "2025-01-31");
        bad("date", "2025-13-01");
        bad("date", "2025-00-10");
        bad("date", "2025-10-32");
        bad("date", "2025-1-2");
    }

    #[test]
    fn test_date_time() {
        ok("date-time", "2025-10-02T10:30:00Z");
        ok("date-time", "2025-10-02t10:30:00.123+02:00");
        // Offset is mandatory.
        bad("date-time", "2025-10-02T10:30:00");
        bad("date-time", "2025-10-02 10:30:00Z");
    }

    #[test]
    fn test_time() {
        ok("time", "10:30:00");
        ok("time", "23:59:60");
        ok("time", "10:30:00.5-07:00");
        bad("time", "24:00:00");
        bad("time", "10:30");
    }

    #[test]
    fn test_uri() {
        ok("uri", "https://example.com/a?b=c");
        ok("uri", "urn:isbn:0451450523");
        bad("uri", "example.com/no-scheme");
        bad("uri", "https:");
    }

    #[test]
    fn test_ipv4() {
        ok("ipv4", "192.168.0.1");
        ok("ipv4", "0.0.0.0");
        ok("ipv4", "255.255.255.255");
        bad("ipv4", "256.1.1.1");
        bad("ipv4", "01.2.3.4");
        bad("ipv4", "1.2.3");
    }

    #[test]
    fn test_ipv6() {
        ok("ipv6", "::1");
        ok("ipv6", "2001:db8::8a2e:370:7334");
        ok("ipv6", "fe80::");
        bad("ipv6", "2001:db8::8a2e::7334");
        bad("ipv6", "notanaddress");
    }

    #[test]
    fn test_hostname() {
        ok("hostname", "example.com");
        ok("hostname", "a-b.c-d.e2");
        ok("hostname", "localhost");
        bad("hostname", "-bad.example");
        bad("hostname", "bad-.example");
        bad("hostname", &"x".repeat(64));
        bad("hostname", "");
    }

    #[test]
    fn test_unknown_format_is_none() {
        assert_eq!(check("iri", "anything"), None);
    }

    #[test]
    fn test_detection_order_prefers_specific() {
        // A UUID also satisfies the hostname grammar; order must pick uuid.
        let value = "550e8400-e29b-41d4-a716-446655440000";
        let first = DETECTION_ORDER
            .iter()
            .find(|name| check(name, value) == Some(true));
        assert_eq!(first, Some(&"uuid"));
        assert_eq!(check("hostname", value), Some(true));
    }
}
