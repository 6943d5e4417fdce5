mod character;
mod config;
mod error;
mod gallery;
mod imagegen;
mod pipeline;
mod roster;
mod textgen;

use anyhow::Result;
use config::Config;
use gallery::{ConsoleSink, GalleryWriter};
use pipeline::EnrichmentPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid provider settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    let profiles = textgen::create_profile_generator(&config)?;
    let portraits = imagegen::create_portrait_generator(&config)?;

    let pipeline = EnrichmentPipeline::new(profiles, portraits);
    let sink = ConsoleSink::new()?;

    let characters = pipeline.run(roster::ROSTER, &sink).await?;

    gallery::print_cards(&characters);
    GalleryWriter::new(&config.output_folder).write(&characters)?;
    println!("Gallery written to {}/", config.output_folder);

    Ok(())
}
