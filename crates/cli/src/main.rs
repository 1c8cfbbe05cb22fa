//! Binary entry point: fetch a Bilibili subtitle and copy it to the clipboard.

mod clipboard;

use anyhow::{Context, Result};
use bilisub_core::pipeline::{discover, fetch_subtitle, FetchOptions, Fetched, Status};
use bilisub_core::select::Category;
use bilisub_core::subtitle::{self, OutputFormat};
use bilisub_core::BiliClient;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line options for the binary.
#[derive(Parser, Debug)]
#[command(name = "bilisub", about = "Fetch Bilibili subtitles (no login required)")]
struct Cli {
    /// BV id, video URL or short link (share text works too).
    #[arg(long)]
    input: String,

    /// Comma separated language codes; overrides --lang-priority when given.
    /// An entry ending in `-` matches every code it prefixes.
    #[arg(long, default_value = "")]
    lang: String,

    /// Comma separated category order out of en, zh, other.
    #[arg(long, default_value = "en,zh,other")]
    lang_priority: String,

    /// Download this subtitle JSON directly, skipping lookup and selection.
    #[arg(long)]
    subtitle_url: Option<String>,

    /// Render SRT instead of plain text.
    #[arg(long)]
    srt: bool,

    /// Print the result instead of copying it.
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Write the result to this file instead of copying it.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Only list the available tracks.
    #[arg(long)]
    list: bool,

    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,
}

/// Where the fetched text ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Delivery {
    Clipboard,
    Stdout,
    File(PathBuf),
}

impl Cli {
    fn delivery(&self) -> Delivery {
        match (&self.output, self.stdout) {
            (Some(path), _) => Delivery::File(path.clone()),
            (None, true) => Delivery::Stdout,
            (None, false) => Delivery::Clipboard,
        }
    }

    fn format(&self) -> OutputFormat {
        if self.srt {
            OutputFormat::Srt
        } else {
            OutputFormat::Text
        }
    }

    fn options(&self) -> FetchOptions {
        FetchOptions {
            whitelist: split_list(&self.lang),
            priority: Some(split_list(&self.lang_priority)),
            format: self.format(),
        }
    }
}

/// Split a comma separated flag value, dropping blank entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Delivery {
    /// Hand `text` over and describe where it went.
    fn deliver(&self, text: &str) -> Result<String> {
        match self {
            Delivery::Clipboard => {
                clipboard::copy_to_clipboard(text).context("copying to clipboard")?;
                Ok("copied to clipboard".to_string())
            }
            Delivery::Stdout => {
                println!("{text}");
                Ok("printed".to_string())
            }
            Delivery::File(path) => {
                fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
                Ok(format!("written to {}", path.display()))
            }
        }
    }

    /// Status lines go to stderr when stdout carries the subtitle.
    fn status(&self, line: &str) {
        if *self == Delivery::Stdout {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::default()
            .add_directive("bilisub=trace".parse().unwrap())
            .add_directive("bilisub_core=trace".parse().unwrap())
            .add_directive("info".parse().unwrap())
    } else {
        EnvFilter::default()
            .add_directive("bilisub=info".parse().unwrap())
            .add_directive("bilisub_core=info".parse().unwrap())
            .add_directive("warn".parse().unwrap())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn list_tracks(client: &BiliClient, cli: &Cli) -> Result<()> {
    let discovery = discover(client, &cli.input).context("listing subtitle tracks")?;
    println!(
        "{} (aid {}, cid {}) {}",
        discovery.reference.as_str(),
        discovery.video.aid,
        discovery.video.cid,
        discovery.video.title
    );
    match discovery.tracks {
        Some(list) => {
            for track in &list.tracks {
                let lang = if track.lang.is_empty() { "und" } else { track.lang.as_str() };
                println!(
                    "{}\t{}\t{}\t{}",
                    list.source,
                    lang,
                    Category::of(&track.lang),
                    track.url
                );
            }
        }
        None => println!("{}", Status::NoTracks.message()),
    }
    Ok(())
}

/// Application entry point which parses CLI args and performs actions.
/// Hard failures return an error and exit with status 1; empty results are
/// reported and exit with 0.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let client = BiliClient::new().context("building HTTP client")?;
    let delivery = cli.delivery();

    if let Some(url) = &cli.subtitle_url {
        info!("fetching subtitle payload directly from {url}");
        let text = subtitle::download(&client, url, cli.format()).context("downloading subtitle")?;
        let done = delivery.deliver(&text)?;
        delivery.status(&format!("subtitle {done}"));
        return Ok(());
    }

    if cli.list {
        return list_tracks(&client, &cli);
    }

    let fetched = fetch_subtitle(&client, &cli.input, &cli.options()).context("fetching subtitle")?;
    match fetched {
        Fetched::Subtitle { lang, text } => {
            let done = delivery.deliver(&text)?;
            let lang = if lang.is_empty() { "und".to_string() } else { lang };
            delivery.status(&format!("subtitle {done} (language: {lang})"));
        }
        Fetched::NoTracks => delivery.status(Status::NoTracks.message()),
        Fetched::NoWhitelistMatch => delivery.status(Status::NoWhitelistMatch.message()),
        Fetched::NoPriorityMatch => delivery.status(Status::NoPriorityMatch.message()),
    }
    Ok(())
}
