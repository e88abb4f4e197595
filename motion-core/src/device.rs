//! Device capability classification.
//!
//! Hosts read the environment once at startup into [`DeviceSignals`]. Any
//! signal the runtime does not expose is `None` and counts as "not low-end".

use serde::{Deserialize, Serialize};

use crate::tier::PerformanceTier;

const MOBILE_TOKENS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Environment signals relevant to animation fidelity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSignals {
    /// Browser user agent.
    pub user_agent: String,
    /// Logical CPU cores (`navigator.hardwareConcurrency`).
    pub hardware_concurrency: Option<u32>,
    /// Reported memory in GB (`navigator.deviceMemory`).
    pub device_memory_gb: Option<f64>,
    /// Network effective type (`slow-2g`, `2g`, `3g`, `4g`).
    pub effective_connection: Option<String>,
    /// `prefers-reduced-motion: reduce` matches.
    pub prefers_reduced_motion: bool,
}

impl DeviceSignals {
    /// Whether the user agent looks like a phone or tablet.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        let ua = self.user_agent.to_ascii_lowercase();
        MOBILE_TOKENS.iter().any(|token| ua.contains(token))
    }

    /// Whether the user agent names an old mobile OS (Android 1-4, iOS 6-9).
    #[must_use]
    pub fn is_old_mobile_os(&self) -> bool {
        major_version_in(&self.user_agent, "Android ", 1..=4)
            || major_version_in(&self.user_agent, "iPhone OS ", 6..=9)
    }

    fn has_few_cores(&self) -> bool {
        self.hardware_concurrency.is_some_and(|cores| cores > 0 && cores <= 2)
    }

    fn has_little_memory(&self) -> bool {
        self.device_memory_gb.is_some_and(|gb| gb > 0.0 && gb <= 2.0)
    }

    fn has_slow_connection(&self) -> bool {
        self.effective_connection
            .as_deref()
            .is_some_and(|kind| matches!(kind, "slow-2g" | "2g"))
    }

    /// Whether any low-end indicator holds.
    #[must_use]
    pub fn is_low_end(&self) -> bool {
        self.has_few_cores()
            || self.has_little_memory()
            || self.has_slow_connection()
            || (self.is_mobile() && self.is_old_mobile_os())
    }

    /// Pick the starting tier.
    ///
    /// Reduced-motion preference wins over everything; then low-end
    /// indicators; then mobile; otherwise full fidelity.
    #[must_use]
    pub fn classify(&self) -> PerformanceTier {
        if self.prefers_reduced_motion {
            PerformanceTier::Reduced
        } else if self.is_low_end() {
            PerformanceTier::Low
        } else if self.is_mobile() {
            PerformanceTier::Medium
        } else {
            PerformanceTier::High
        }
    }
}

/// Whether `prefix` occurs in `haystack` followed by a major version in
/// `versions`.
fn major_version_in(haystack: &str, prefix: &str, versions: std::ops::RangeInclusive<u32>) -> bool {
    haystack.match_indices(prefix).any(|(at, _)| {
        let rest = &haystack[at + prefix.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..end]
            .parse::<u32>()
            .is_ok_and(|major| versions.contains(&major))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP_UA: &str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
    const MODERN_PHONE_UA: &str =
        "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/120.0 Mobile Safari/537.36";
    const OLD_PHONE_UA: &str =
        "Mozilla/5.0 (Linux; U; Android 4.4.2; en-us) AppleWebKit/534.30 Mobile Safari/534.30";
    const OLD_IPHONE_UA: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 9_3 like Mac OS X) AppleWebKit/601.1 Mobile/13E188";

    fn desktop() -> DeviceSignals {
        DeviceSignals {
            user_agent: DESKTOP_UA.to_string(),
            hardware_concurrency: Some(8),
            device_memory_gb: Some(8.0),
            effective_connection: Some("4g".to_string()),
            prefers_reduced_motion: false,
        }
    }

    #[test]
    fn desktop_is_high() {
        assert_eq!(desktop().classify(), PerformanceTier::High);
    }

    #[test]
    fn reduced_motion_wins_over_capability() {
        let signals = DeviceSignals {
            prefers_reduced_motion: true,
            hardware_concurrency: Some(1),
            ..desktop()
        };
        assert_eq!(signals.classify(), PerformanceTier::Reduced);
    }

    #[test]
    fn each_low_end_indicator_selects_low() {
        let few_cores = DeviceSignals {
            hardware_concurrency: Some(2),
            ..desktop()
        };
        let little_memory = DeviceSignals {
            device_memory_gb: Some(1.0),
            ..desktop()
        };
        let slow = DeviceSignals {
            effective_connection: Some("slow-2g".to_string()),
            ..desktop()
        };
        let old_phone = DeviceSignals {
            user_agent: OLD_PHONE_UA.to_string(),
            ..desktop()
        };
        let old_iphone = DeviceSignals {
            user_agent: OLD_IPHONE_UA.to_string(),
            ..desktop()
        };
        for signals in [few_cores, little_memory, slow, old_phone, old_iphone] {
            assert_eq!(signals.classify(), PerformanceTier::Low, "{signals:?}");
        }
    }

    #[test]
    fn modern_phone_is_medium() {
        let signals = DeviceSignals {
            user_agent: MODERN_PHONE_UA.to_string(),
            ..desktop()
        };
        assert!(signals.is_mobile());
        assert!(!signals.is_old_mobile_os());
        assert_eq!(signals.classify(), PerformanceTier::Medium);
    }

    #[test]
    fn missing_signals_count_as_false() {
        let signals = DeviceSignals {
            user_agent: DESKTOP_UA.to_string(),
            ..DeviceSignals::default()
        };
        assert_eq!(signals.classify(), PerformanceTier::High);
    }

    #[test]
    fn android_ten_is_not_old() {
        let signals = DeviceSignals {
            user_agent: "Mozilla/5.0 (Linux; Android 10; K) Mobile".to_string(),
            ..DeviceSignals::default()
        };
        assert!(signals.is_mobile());
        assert!(!signals.is_old_mobile_os());
    }
}
