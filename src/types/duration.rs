// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Go-style duration strings as used by Kubernetes `metav1.Duration` and kubectl flags

use std::time::Duration;

/// Format a duration the way Go's `time.Duration.String()` does for whole seconds,
/// e.g. `30s`, `1m0s`, `1h30m0s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let millis = duration.subsec_millis();

    if total == 0 && millis == 0 {
        return "0s".to_string();
    }
    if total == 0 {
        return format!("{}ms", millis);
    }

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Parse a duration like `90s`, `1m`, `1h30m` or `500ms`
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(format!("invalid duration {:?}", input));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|e| format!("invalid duration {:?}: {}", input, e))?;
        rest = &rest[digits..];

        let unit_len = rest
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .count();
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "s" => Some(Duration::from_secs(value)),
            "ms" => Some(Duration::from_millis(value)),
            "" => return Err(format!("missing unit in duration {:?}", input)),
            other => return Err(format!("unknown unit {:?} in duration {:?}", other, input)),
        };

        total = part
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| format!("duration out of range {:?}", input))?;
    }

    Ok(total)
}
