//! Anomaly Filter (spec §4.4, component C4).
//!
//! Runs between the Compressor/Summarizer's parsed output and the Store, and
//! again as a defense-in-depth pass before context injection. Never mutates
//! an observation; it only classifies it and, in `filter_observations`,
//! drops the ones carrying a `block` flag.

mod patterns;

use serde::Deserialize;
use serde::Serialize;

pub use patterns::INJECTION_PATTERNS;

/// Controlled vocabulary plus the two extra tags the context builder's
/// priority table understands (spec §4.4 point 1, §4.7).
const ALLOWED_TYPES: &[&str] = &[
    "bugfix",
    "feature",
    "refactor",
    "config",
    "research",
    "error",
    "decision",
    "discovery",
    "change",
    "other",
];

const WARN_SIZE_BYTES: usize = 8 * 1024;
const BLOCK_SIZE_BYTES: usize = 50 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warn,
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub kind: String,
    pub severity: Severity,
    pub detail: String,
}

impl Flag {
    fn new(kind: &str, severity: Severity, detail: impl Into<String>) -> Self {
        Flag {
            kind: kind.to_string(),
            severity,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub clean: bool,
    pub flags: Vec<Flag>,
}

impl DetectionResult {
    fn has_block(&self) -> bool {
        self.flags.iter().any(|f| f.severity == Severity::Block)
    }
}

/// A candidate observation, expressed as loosely as the checks need it
/// rather than as the Store's own row type: `obs_type` is the raw string the
/// compressor produced (or a caller-mapped `type`), not yet narrowed to the
/// Store's closed `ObsType` enum, since point 1 below validates exactly that
/// narrowing.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub obs_type: &'a str,
    pub title: &'a str,
    pub narrative: &'a str,
    pub compressed: &'a str,
    pub hmac: Option<&'a str>,
}

impl<'a> Candidate<'a> {
    pub fn from_observation(obs: &'a turnmem_store::Observation) -> Self {
        Candidate {
            obs_type: obs.obs_type.as_str(),
            title: &obs.title,
            narrative: &obs.narrative,
            compressed: &obs.compressed,
            hmac: obs.hmac.as_deref(),
        }
    }
}

/// Runs the five ordered checks from spec §4.4 and returns every flag raised.
pub fn detect_anomalies(obs: Candidate<'_>) -> DetectionResult {
    let mut flags = Vec::new();

    // 1. Structural/type.
    if !ALLOWED_TYPES.contains(&obs.obs_type) {
        flags.push(Flag::new(
            "structural_type",
            Severity::Block,
            format!("obs_type {:?} is not in the controlled vocabulary", obs.obs_type),
        ));
    }

    // 2. Structural/content.
    if obs.narrative.trim().is_empty() && obs.compressed.trim().is_empty() {
        flags.push(Flag::new(
            "structural_content",
            Severity::Warn,
            "both narrative and compressed are empty",
        ));
    }

    // 3. Prompt injection — first match wins, later patterns are skipped.
    let haystack = format!("{} {} {}", obs.title, obs.narrative, obs.compressed);
    if let Some(name) = patterns::first_match(&haystack) {
        flags.push(Flag::new(
            "prompt_injection",
            Severity::Block,
            format!("matched injection pattern {name:?}"),
        ));
    }

    // 4. Size.
    let total = obs.narrative.len() + obs.compressed.len();
    if total > BLOCK_SIZE_BYTES {
        flags.push(Flag::new(
            "size",
            Severity::Block,
            format!("narrative+compressed is {total} bytes, over the {BLOCK_SIZE_BYTES} byte limit"),
        ));
    } else if total > WARN_SIZE_BYTES {
        flags.push(Flag::new(
            "size",
            Severity::Warn,
            format!("narrative+compressed is {total} bytes, over the {WARN_SIZE_BYTES} byte soft limit"),
        ));
    }

    // 5. HMAC presence.
    if obs.hmac.is_none() {
        flags.push(Flag::new(
            "hmac_presence",
            Severity::Warn,
            "observation carries no hmac tag",
        ));
    }

    let clean = !flags.iter().any(|f| f.severity == Severity::Block);
    DetectionResult { clean, flags }
}

/// Runs `detect_anomalies` over a batch of stored observations and returns
/// only the ones with no `block` flag, logging every flag raised along the
/// way (spec §4.4 "logging all flags").
pub fn filter_observations(
    observations: Vec<turnmem_store::Observation>,
) -> Vec<turnmem_store::Observation> {
    observations
        .into_iter()
        .filter(|obs| {
            let result = detect_anomalies(Candidate::from_observation(obs));
            for flag in &result.flags {
                match flag.severity {
                    Severity::Block => {
                        tracing::warn!(
                            observation_id = obs.id,
                            kind = %flag.kind,
                            detail = %flag.detail,
                            "anomaly filter blocked observation"
                        );
                    }
                    Severity::Warn => {
                        tracing::info!(
                            observation_id = obs.id,
                            kind = %flag.kind,
                            detail = %flag.detail,
                            "anomaly filter flagged observation"
                        );
                    }
                }
            }
            !result.has_block()
        })
        .collect()
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
