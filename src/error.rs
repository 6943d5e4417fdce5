use thiserror::Error;

/// Stage-level failures of the enrichment pipeline. A subject whose profile
/// simply failed to match is not an error and never appears here.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// The upstream credential is absent. Raised per request, not at startup.
    #[error("upstream credential missing: {0}")]
    Configuration(String),

    /// The text stage failed: network, non-success response, or a payload
    /// that is not an array of profiles. Fatal to the whole session.
    #[error("failed to generate character info: {0}")]
    TextEnrichment(String),

    /// A single portrait request failed. The all-or-nothing join makes this
    /// fatal to the whole session as well.
    #[error("failed to generate portrait for {name}: {reason}")]
    ImageEnrichment { name: String, reason: String },
}

impl EnrichmentError {
    pub fn image<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        EnrichmentError::ImageEnrichment {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
