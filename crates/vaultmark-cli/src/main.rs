use anyhow::{Context, Result, bail};
use relative_path::RelativePathBuf;
use std::{
    env,
    path::{Path, PathBuf},
    process,
};
use vaultmark_config::{Config, RenderConfig};
use vaultmark_engine::{
    BoundingRegion, CompileOptions, Pipeline, TrackFormat, VaultDir, build_file_index, decode,
    index_vault,
};

const USAGE: &str = "Usage:
  vaultmark-cli render <note> [vault-path]   compile a note to HTML
  vaultmark-cli track <file.gpx|file.kml>    decode a track and print stats as JSON
  vaultmark-cli index [vault-path]           print the vault index as JSON";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Render {
        note: String,
        vault: Option<PathBuf>,
    },
    Track {
        file: PathBuf,
    },
    Index {
        vault: Option<PathBuf>,
    },
}

fn parse_args(args: &[String]) -> Option<Command> {
    match args {
        [command, note, rest @ ..] if command == "render" && rest.len() <= 1 => {
            Some(Command::Render {
                note: note.clone(),
                vault: rest.first().map(PathBuf::from),
            })
        }
        [command, file] if command == "track" => Some(Command::Track {
            file: PathBuf::from(file),
        }),
        [command, rest @ ..] if command == "index" && rest.len() <= 1 => Some(Command::Index {
            vault: rest.first().map(PathBuf::from),
        }),
        _ => None,
    }
}

/// Vault root and render options, from the argument or the config file.
fn resolve_vault(vault: Option<PathBuf>) -> Result<(PathBuf, RenderConfig)> {
    let config = Config::load().context("Failed to load config file")?;
    match (vault, config) {
        (Some(path), config) => Ok((path, config.map(|c| c.render).unwrap_or_default())),
        (None, Some(config)) => Ok((config.vault_path, config.render)),
        (None, None) => bail!(
            "No vault path provided and no config file found at {}",
            Config::config_path().display()
        ),
    }
}

fn build_pipeline(render: &RenderConfig) -> Pipeline {
    render
        .disabled_passes
        .iter()
        .fold(Pipeline::standard(), |pipeline, name| pipeline.without(name))
}

/// Accepts `Trips/Alps.md`, `/Trips/Alps.md` or `Trips/Alps`.
fn note_vault_path(note: &str) -> String {
    let mut relative = RelativePathBuf::from(note.trim_start_matches('/'));
    if relative.extension().is_none() {
        relative.set_extension("md");
    }
    format!("/{relative}")
}

fn render(note: &str, vault: Option<PathBuf>) -> Result<()> {
    let (vault_path, render) = resolve_vault(vault)?;
    let vault = VaultDir::open(&vault_path)
        .with_context(|| format!("Vault path '{}' is invalid", vault_path.display()))?;
    let index = build_file_index(vault.root())?;
    let document_path = note_vault_path(note);
    let text = vault
        .read_note(&document_path)
        .with_context(|| format!("Failed to read note {document_path}"))?;

    let options = CompileOptions::new(&document_path)
        .with_index(&index)
        .with_asset_base_url(&render.asset_base_url)
        .with_external_links_new_tab(render.external_links_new_tab);
    let mut compiled = build_pipeline(&render).compile(&text, &options);
    log::info!(
        "Compiled {document_path}: {} headings, {} links, {} tracks, {} diagrams",
        compiled.metadata.headings.len(),
        compiled.metadata.links.len(),
        compiled.tracks.len(),
        compiled.diagrams.len()
    );
    compiled.realize_tracks(&vault);

    println!("{}", compiled.to_html());
    Ok(())
}

fn track(file: &Path) -> Result<()> {
    let name = file.to_string_lossy();
    let Some(format) = TrackFormat::from_path(&name) else {
        bail!("'{name}' is not a .gpx or .kml file");
    };
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {name}"))?;
    let tracks = decode(&bytes, format)?;

    let summary: Vec<serde_json::Value> = tracks
        .iter()
        .map(|track| {
            serde_json::json!({
                "name": track.name,
                "points": track.points.len(),
                "waypoints": track.waypoints.len(),
                "lengthM": track.length_m().round(),
                "elevationGainM": track.elevation_gain_m().round(),
            })
        })
        .collect();
    let output = serde_json::json!({
        "format": format.to_string(),
        "bounds": BoundingRegion::of_tracks(&tracks),
        "tracks": summary,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn index(vault: Option<PathBuf>) -> Result<()> {
    let (vault_path, render) = resolve_vault(vault)?;
    let index = index_vault(&vault_path, &build_pipeline(&render))?;
    println!("{}", serde_json::to_string_pretty(&index)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = parse_args(&args) else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    match command {
        Command::Render { note, vault } => render(&note, vault),
        Command::Track { file } => track(&file),
        Command::Index { vault } => index(vault),
    }
}
