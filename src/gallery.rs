use crate::character::EnrichedCharacter;
use crate::pipeline::{Phase, StatusSink};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Terminal loading indicator fed by the pipeline's status updates.
pub struct ConsoleSink {
    spinner: ProgressBar,
}

impl ConsoleSink {
    pub fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("[ AWAKENING... ]");
        Ok(Self { spinner })
    }
}

impl StatusSink for ConsoleSink {
    fn phase_changed(&self, phase: Phase, status: &str) {
        match phase {
            Phase::AwakeningStats | Phase::GeneratingPortraits => {
                self.spinner.set_message(status.to_string());
            }
            Phase::Ready => {
                self.spinner.finish_with_message(status.to_string());
            }
            Phase::Error => {
                self.spinner.finish_and_clear();
                print_error_panel(status);
            }
        }
    }

    fn characters_updated(&self, characters: &[EnrichedCharacter]) {
        let portraits = characters.iter().filter(|c| c.image_url.is_some()).count();
        if portraits > 0 {
            self.spinner
                .println(format!("{} portraits bound", portraits));
        } else {
            self.spinner
                .println(format!("{} hunters registered", characters.len()));
        }
    }
}

pub fn print_error_panel(message: &str) {
    eprintln!();
    eprintln!("==================== SYSTEM ERROR ====================");
    eprintln!("{}", message);
    eprintln!("======================================================");
}

/// Render the finished gallery as terminal cards.
pub fn print_cards(characters: &[EnrichedCharacter]) {
    println!();
    println!("========= The Indoliya Guild =========");
    for character in characters {
        println!();
        println!("--- Hunter #{} ---", character.id);
        println!("{}", character.name);
        if let Some(alias) = &character.alias {
            println!("aka {}", alias);
        }
        if let (Some(rank), Some(class)) = (character.rank, character.class) {
            println!("[{} | {}]", rank, class);
        }
        if let Some(title) = &character.title {
            println!("{}", title);
            if let Some(description) = &character.description {
                println!("\"{}\"", description);
            }
            if let Some(quote) = &character.quote {
                println!("  -- {}", quote);
            }
        } else {
            println!("Stats are still being calculated...");
        }
    }
    println!();
}

/// Writes the finished gallery to disk: one decoded JPEG per portrait plus a
/// `gallery.json` dossier of the full character records.
pub struct GalleryWriter {
    output_folder: String,
}

impl GalleryWriter {
    pub fn new(output_folder: &str) -> Self {
        Self {
            output_folder: output_folder.to_string(),
        }
    }

    pub fn write(&self, characters: &[EnrichedCharacter]) -> Result<()> {
        let root = Path::new(&self.output_folder);
        fs::create_dir_all(root)?;

        let dossier = serde_json::to_string_pretty(characters)?;
        fs::write(root.join("gallery.json"), dossier)?;

        for character in characters {
            if let Some(image_url) = &character.image_url {
                let payload = image_url
                    .strip_prefix("data:image/jpeg;base64,")
                    .unwrap_or(image_url);
                let bytes = STANDARD.decode(payload).with_context(|| {
                    format!("Failed to decode portrait for {}", character.name)
                })?;
                let filename = format!("{:02}_{}.jpg", character.id, sanitize(&character.name));
                fs::write(root.join(filename), bytes)?;
            }
        }

        Ok(())
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
