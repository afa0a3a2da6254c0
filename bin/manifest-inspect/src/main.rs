use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use iori_manifest::{
    Manifest, ManifestEvent, ManifestOptions, ParsedManifest, SupplementaryImageTrack,
};

#[derive(Parser, Debug, Clone)]
#[clap(name = "manifest-inspect", version, about)]
pub struct InspectArgs {
    /// Debug output
    #[clap(long, alias = "debug")]
    verbose: bool,

    /// Manifest refreshes applied as partial updates, in order
    #[clap(short, long = "update")]
    updates: Vec<PathBuf>,

    /// Manifest refreshes applied as full replacements, after the updates
    #[clap(short, long = "replace")]
    replaces: Vec<PathBuf>,

    /// Supplementary image track added to the first period
    ///
    /// Format: mime_type=url. eg. "application/bif=https://example.com/thumbnails.bif"
    #[clap(long = "image-track", env = "MANIFEST_IMAGE_TRACKS", value_delimiter = ',', value_parser = parse_image_track)]
    image_tracks: Vec<SupplementaryImageTrack>,

    /// URL used for partial refreshes of the manifest
    #[clap(long)]
    update_url: Option<String>,

    /// Parsed manifest, as JSON
    manifest: PathBuf,
}

fn parse_image_track(input: &str) -> Result<SupplementaryImageTrack, String> {
    let (mime_type, url) = input
        .split_once('=')
        .ok_or_else(|| format!("expected mime_type=url, got {input}"))?;
    Ok(SupplementaryImageTrack {
        mime_type: mime_type.trim().to_string(),
        url: url.trim().to_string(),
    })
}

impl InspectArgs {
    fn options(&self) -> ManifestOptions {
        let mut options = ManifestOptions::new();
        for track in &self.image_tracks {
            options = options.image_track(track.clone());
        }
        if let Some(url) = &self.update_url {
            options = options.manifest_update_url(url);
        }
        options
    }
}

fn load(path: &Path, options: &ManifestOptions) -> anyhow::Result<Manifest> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed = ParsedManifest::from_json(&data)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Manifest::new(parsed, options))
}

fn print_manifest(manifest: &Manifest) {
    println!("Manifest {} ({})", manifest.id(), manifest.transport);
    println!(
        "  dynamic: {}, live: {}, last period known: {}",
        manifest.is_dynamic, manifest.is_live, manifest.is_last_period_known
    );
    if let Some(url) = manifest.get_url() {
        println!("  url: {url}");
    }
    if let Some(url) = &manifest.update_url {
        println!("  update url: {url}");
    }
    if let Some(date) = manifest.availability_start_date() {
        println!("  available since: {}", date.to_rfc3339());
    }
    println!(
        "  positions: [{:.3}, {:.3}]",
        manifest.get_minimum_safe_position(),
        manifest.get_maximum_safe_position()
    );
    if let Some(live) = manifest.get_live_position() {
        println!("  live edge: {live:.3}");
    }

    for period in manifest.periods() {
        let period = period.read();
        let end = period
            .end
            .map_or_else(|| "...".to_string(), |end| format!("{end:.3}"));
        println!("  Period {} [{:.3}, {end})", period.id, period.start);
        for adaptation in period.get_adaptations() {
            println!(
                "    {} {} lang={} supported={}{}",
                adaptation.r#type,
                adaptation.id,
                adaptation.language.as_deref().unwrap_or("-"),
                adaptation.is_supported,
                if adaptation.manually_added { " (added)" } else { "" }
            );
            for representation in &adaptation.representations {
                println!(
                    "      {} {}bps {} index={} decipherable={:?}",
                    representation.id,
                    representation.bitrate,
                    representation.get_mime_type_string(),
                    representation.index.get_type(),
                    representation.decipherable
                );
            }
        }
    }

    for warning in manifest.content_warnings() {
        println!("  warning: {warning}");
    }
}

fn print_event(event: &ManifestEvent) {
    match event {
        ManifestEvent::ManifestUpdate => println!("> manifestUpdate"),
        ManifestEvent::DecipherabilityUpdate(updates) => {
            println!("> decipherabilityUpdate ({} representations)", updates.len());
            for update in updates {
                println!(
                    "    {}/{}/{} -> {:?}",
                    update.period.id(),
                    update.adaptation_id,
                    update.representation_id,
                    update.decipherable
                );
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = InspectArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing_subscriber::filter::LevelFilter::DEBUG.into()
                } else {
                    tracing_subscriber::filter::LevelFilter::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = args.options();
    let mut manifest = load(&args.manifest, &options)?;
    let mut events = manifest.subscribe();
    print_manifest(&manifest);

    for path in &args.updates {
        tracing::info!("Updating with {}", path.display());
        let new = load(path, &options)?;
        manifest
            .update(new)
            .with_context(|| format!("Failed to update with {}", path.display()))?;
        while let Ok(event) = events.try_recv() {
            print_event(&event);
        }
        print_manifest(&manifest);
    }

    for path in &args.replaces {
        tracing::info!("Replacing with {}", path.display());
        let new = load(path, &options)?;
        manifest.replace(new)?;
        while let Ok(event) = events.try_recv() {
            print_event(&event);
        }
        print_manifest(&manifest);
    }

    Ok(())
}
