//! Artifact reference: the immutable description of what to upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Producer-assigned artifact identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where the device was when the artifact was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters.
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl GeoLocation {
    /// Link to a map centered on this location.
    pub fn map_link(&self) -> String {
        format!(
            "https://maps.google.com/?q={},{}",
            self.latitude, self.longitude
        )
    }
}

/// Immutable reference to a captured artifact.
///
/// `source_handle` is opaque to the queue; only the `ArtifactSource` port knows
/// how to turn it into bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRef {
    id: ArtifactId,
    source_handle: String,
    captured_at: DateTime<Utc>,
    reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<GeoLocation>,
}

impl ArtifactRef {
    pub fn new(
        id: ArtifactId,
        source_handle: impl Into<String>,
        captured_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id,
            source_handle: source_handle.into(),
            captured_at,
            reason: reason.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: GeoLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn id(&self) -> &ArtifactId {
        &self.id
    }

    pub fn source_handle(&self) -> &str {
        &self.source_handle
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn location(&self) -> Option<&GeoLocation> {
        self.location.as_ref()
    }
}
