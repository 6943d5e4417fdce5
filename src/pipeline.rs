use crate::character::{merge_portraits, merge_profiles, EnrichedCharacter};
use crate::error::EnrichmentError;
use crate::imagegen::PortraitGenerator;
use crate::roster::Subject;
use crate::textgen::ProfileGenerator;
use futures_util::future::try_join_all;
use log::{error, info};
use std::time::Duration;

/// Shown when either stage fails. The specific cause goes to the log and the
/// returned error, never to the user-facing panel.
pub const CORRUPTION_MESSAGE: &str =
    "SYSTEM CORRUPTION. Failed to awaken stats. Check logs and API key configuration.";

/// Pause between finishing internally and revealing the gallery. UI pacing
/// only; nothing waits on it for correctness.
const REVEAL_DELAY: Duration = Duration::from_millis(500);

/// Session states. No way back out of Ready or Error short of a new run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwakeningStats,
    GeneratingPortraits,
    Ready,
    Error,
}

impl Phase {
    pub fn status(&self) -> &'static str {
        match self {
            Phase::AwakeningStats => "[ Awakening Stats... ]",
            Phase::GeneratingPortraits => "[ Generating Hunter Portraits... ]",
            Phase::Ready => "[ System Alert: Hunters Awakened ]",
            Phase::Error => CORRUPTION_MESSAGE,
        }
    }
}

/// Injected presentation seam. The pipeline pushes phase changes and
/// character snapshots through it and otherwise knows nothing about how the
/// session is displayed.
pub trait StatusSink: Send + Sync {
    fn phase_changed(&self, phase: Phase, status: &str);
    fn characters_updated(&self, characters: &[EnrichedCharacter]);
}

pub struct EnrichmentPipeline {
    profiles: Box<dyn ProfileGenerator>,
    portraits: Box<dyn PortraitGenerator>,
}

impl EnrichmentPipeline {
    pub fn new(profiles: Box<dyn ProfileGenerator>, portraits: Box<dyn PortraitGenerator>) -> Self {
        Self { profiles, portraits }
    }

    /// Run both enrichment stages over the roster. Any stage error surfaces
    /// to the sink as the generic corruption message; the typed error goes
    /// back to the caller. No retries, ever.
    pub async fn run(
        &self,
        roster: &[Subject],
        sink: &dyn StatusSink,
    ) -> Result<Vec<EnrichedCharacter>, EnrichmentError> {
        match self.run_stages(roster, sink).await {
            Ok(characters) => {
                tokio::time::sleep(REVEAL_DELAY).await;
                sink.phase_changed(Phase::Ready, Phase::Ready.status());
                Ok(characters)
            }
            Err(e) => {
                error!("Enrichment failed: {}", e);
                sink.phase_changed(Phase::Error, CORRUPTION_MESSAGE);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        roster: &[Subject],
        sink: &dyn StatusSink,
    ) -> Result<Vec<EnrichedCharacter>, EnrichmentError> {
        sink.phase_changed(Phase::AwakeningStats, Phase::AwakeningStats.status());

        let display_names: Vec<String> = roster.iter().map(Subject::display_name).collect();
        let generated = self.profiles.generate_profiles(&display_names).await?;
        info!("Text stage returned {} profiles", generated.len());

        let mut characters = merge_profiles(roster, &generated);
        let misses = characters.iter().filter(|c| !c.has_profile()).count();
        if misses > 0 {
            // Degraded but valid: those cards render as placeholders.
            info!("{} subject(s) had no matching profile", misses);
        }
        sink.characters_updated(&characters);

        sink.phase_changed(Phase::GeneratingPortraits, Phase::GeneratingPortraits.status());

        // One request per character, all in flight at once. The join is
        // all-or-nothing: the first failure wins and no image is merged.
        let images = try_join_all(
            characters
                .iter()
                .map(|character| self.portraits.generate_portrait(character)),
        )
        .await?;

        merge_portraits(&mut characters, images);
        sink.characters_updated(&characters);
        Ok(characters)
    }
}
