//! Marker-based page signal inspector.
//!
//! Scans collaborator-supplied page text and URL for known restriction
//! markers and emits typed signals. This is the only place marker text
//! lives; everything downstream consumes `RestrictionSignal` values.

use crate::domain::models::RestrictionSignal;
use crate::domain::ports::{PageSignalInspector, PageSnapshot};

const WARNING_MARKERS: &[&str] = &[
    "unusual activity",
    "we've noticed some unusual activity",
    "slow down",
];

const RATE_LIMIT_MARKERS: &[&str] = &[
    "too many requests",
    "you've reached the weekly invitation limit",
    "try again later",
];

const RESTRICTION_MARKERS: &[&str] = &[
    "your account has been restricted",
    "account restricted",
    "temporarily restricted",
    "your account is suspended",
];

const CHALLENGE_MARKERS: &[&str] = &[
    "verify you're human",
    "security verification",
    "complete this security check",
    "captcha",
];

const REDIRECT_FRAGMENTS: &[&str] = &["/checkpoint/", "/authwall", "/uas/login"];

/// Default `PageSignalInspector` built on substring markers.
#[derive(Debug, Clone, Default)]
pub struct MarkerInspector;

impl MarkerInspector {
    pub fn new() -> Self {
        Self
    }
}

impl PageSignalInspector for MarkerInspector {
    fn inspect(&self, page: &PageSnapshot) -> Vec<RestrictionSignal> {
        let mut signals = Vec::new();
        let body = page.body_text.to_lowercase();
        let url = page.url.to_lowercase();

        // At most one signal per category; the first matching marker
        // names the signal.
        if let Some(marker) = first_match(&body, RESTRICTION_MARKERS) {
            signals.push(RestrictionSignal::Restricted { marker });
        }
        if let Some(marker) = first_match(&body, CHALLENGE_MARKERS) {
            signals.push(RestrictionSignal::Challenge { marker });
        }
        if let Some(marker) = first_match(&body, RATE_LIMIT_MARKERS) {
            signals.push(RestrictionSignal::RateLimited { marker });
        }
        if let Some(marker) = first_match(&body, WARNING_MARKERS) {
            signals.push(RestrictionSignal::Warning { marker });
        }
        if REDIRECT_FRAGMENTS.iter().any(|f| url.contains(f)) {
            signals.push(RestrictionSignal::Redirect {
                url: page.url.clone(),
            });
        }

        signals
    }
}

fn first_match(body: &str, markers: &[&str]) -> Option<String> {
    markers
        .iter()
        .find(|marker| body.contains(**marker))
        .map(|marker| (*marker).to_string())
}
