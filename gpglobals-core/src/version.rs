//! Engine version detection and version-gated query construction.
//!
//! Catalog shapes differ between Greenplum major versions. Rather than
//! assembling query text with inline conditionals, each query declares the
//! fragments that only apply to some versions as a list of
//! [`GatedFragment`]s, evaluated once when the query is built.

use crate::{Result, error::GlobalsError};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Version of the Greenplum cluster being backed up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpVersion {
    components: Vec<u32>,
    version_string: String,
}

impl GpVersion {
    /// Parses a dotted version such as `5.28.1` or `6`.
    ///
    /// Anything after the numeric components (`6.0.0-beta.1`, `5.0.0 build dev`)
    /// is ignored.
    pub fn parse(version: &str) -> Result<Self> {
        let components: Vec<u32> = version
            .trim()
            .split(|c: char| !c.is_ascii_digit() && c != '.')
            .next()
            .unwrap_or_default()
            .split('.')
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| {
                GlobalsError::configuration(format!("Invalid version '{}': {}", version, e))
            })?;

        if components.is_empty() {
            return Err(GlobalsError::configuration(format!(
                "Invalid version '{}': no numeric components",
                version
            )));
        }

        Ok(Self {
            components,
            version_string: version.trim().to_string(),
        })
    }

    /// Extracts the Greenplum version from the output of `SELECT version()`.
    ///
    /// The server string looks like
    /// `PostgreSQL 8.3.23 (Greenplum Database 5.0.0 build dev) on x86_64-...`;
    /// only the Greenplum part is meaningful for catalog gating.
    pub fn from_server_version(server_version: &str) -> Result<Self> {
        static GREENPLUM_VERSION: OnceLock<Regex> = OnceLock::new();
        let pattern = GREENPLUM_VERSION.get_or_init(|| {
            Regex::new(r"Greenplum Database ([0-9]+(?:\.[0-9]+)*)")
                .expect("Invalid Greenplum version pattern")
        });

        let captured = pattern
            .captures(server_version)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| {
                GlobalsError::configuration(format!(
                    "Server is not a Greenplum cluster: '{}'",
                    server_version
                ))
            })?;

        Self::parse(captured.as_str())
    }

    /// True when this version is greater than or equal to `target`.
    ///
    /// Missing trailing components compare as zero, so `5.1` is at least `5`
    /// and `5` is at least `5.0.0`. An unparseable target never matches.
    pub fn at_least(&self, target: &str) -> bool {
        match Self::parse(target) {
            Ok(target) => self.compare(&target) != Ordering::Less,
            Err(_) => false,
        }
    }

    /// Major version number.
    pub fn major(&self) -> u32 {
        self.components.first().copied().unwrap_or_default()
    }

    fn compare(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for idx in 0..len {
            let ours = self.components.get(idx).copied().unwrap_or_default();
            let theirs = other.components.get(idx).copied().unwrap_or_default();
            match ours.cmp(&theirs) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl std::fmt::Display for GpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.version_string)
    }
}

/// Capability predicate attached to a query fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionGate {
    /// Cluster version is at least the given version
    AtLeast(&'static str),
    /// Cluster version is strictly older than the given version
    Before(&'static str),
}

impl VersionGate {
    /// Evaluates the predicate against a cluster version.
    pub fn allows(self, version: &GpVersion) -> bool {
        match self {
            Self::AtLeast(target) => version.at_least(target),
            Self::Before(target) => !version.at_least(target),
        }
    }
}

/// A piece of query text that only exists on some catalog versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatedFragment {
    /// When the fragment applies
    pub gate: VersionGate,
    /// SQL text included when the gate allows it
    pub fragment: &'static str,
}

impl GatedFragment {
    /// Fragment included from `version` onwards.
    pub const fn at_least(version: &'static str, fragment: &'static str) -> Self {
        Self {
            gate: VersionGate::AtLeast(version),
            fragment,
        }
    }

    /// Fragment included only for clusters older than `version`.
    pub const fn before(version: &'static str, fragment: &'static str) -> Self {
        Self {
            gate: VersionGate::Before(version),
            fragment,
        }
    }
}

/// Concatenates, in declaration order, every fragment whose gate allows
/// `version`. Fragments whose gate fails are omitted from the text entirely.
pub fn render_fragments(fragments: &[GatedFragment], version: &GpVersion) -> String {
    fragments
        .iter()
        .filter(|gated| gated.gate.allows(version))
        .map(|gated| gated.fragment)
        .collect()
}
