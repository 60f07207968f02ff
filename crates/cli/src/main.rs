//! CLI tool for turning song lyrics into PowerPoint slides.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lyrics_core::{
    output_file_name, Language, LyricsToSlidesTransformer, SearchQueryBuilder, SlideDocument,
};
use lyrics_pptx::PptxDocument;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Turn song lyrics into PowerPoint slides, or find lyrics on the web.
#[derive(Parser, Debug)]
#[command(name = "lyrics-slides")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a web search URL for a song's lyrics
    Search {
        /// First line of the lyrics
        first_line: Option<String>,

        /// Language of the song (English, Malayalam, Tamil, Hindi)
        #[arg(short = 'L', long, default_value = "English")]
        language: Language,
    },

    /// Write one slide per lyrics paragraph to "<song name>.pptx"
    Generate {
        /// Song name (used as the file name)
        #[arg(short, long)]
        song_name: Option<String>,

        /// Lyrics text file (default: read from stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// PowerPoint (.pptx) template to add slides to (default: built-in sample)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the text of every slide in PowerPoint files
    Inspect {
        /// Input PowerPoint file(s) (.pptx)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Print slides as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match args.command {
        Command::Search {
            first_line,
            language,
        } => {
            let url = search_url(first_line.as_deref(), language)?;
            println!("{}", url);
        }
        Command::Generate {
            song_name,
            input,
            template,
            output,
        } => {
            let song_name = song_name.unwrap_or_default();
            if song_name.trim().is_empty() {
                log::warn!("A song name is required; nothing generated");
                return Ok(());
            }

            let lyrics = read_lyrics(input.as_deref())?;
            let written = generate(
                &song_name,
                &lyrics,
                template.as_deref(),
                output.as_deref(),
            )?;
            match written {
                Some(path) => println!("{}", path.display()),
                None => log::warn!("No lyrics given; nothing generated"),
            }
        }
        Command::Inspect { input, json } => {
            for path in &input {
                match inspect_file(path, json) {
                    Ok(output) => print!("{}", output),
                    Err(e) => eprintln!("Error processing {}: {:#}", path.display(), e),
                }
            }
        }
    }

    Ok(())
}

/// Search URL for the first line of a song, or an error asking for one.
fn search_url(first_line: Option<&str>, language: Language) -> Result<String> {
    let url = SearchQueryBuilder::new().try_build_url(first_line.unwrap_or_default(), language)?;
    log::debug!("Search URL: {}", url);
    Ok(url)
}

/// Read lyrics from a file, or from stdin when no file is given.
fn read_lyrics(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read lyrics from {}", path.display())),
        None => {
            let mut lyrics = String::new();
            io::stdin()
                .read_to_string(&mut lyrics)
                .context("Failed to read lyrics from stdin")?;
            Ok(lyrics)
        }
    }
}

/// Open the uploaded template, or the built-in sample when there is none.
fn load_template(template: Option<&Path>) -> Result<PptxDocument> {
    match template {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("Failed to open {}", path.display()))?;
            log::debug!("Using template {}", path.display());
            PptxDocument::from_bytes(&bytes)
                .with_context(|| format!("Failed to load template {}", path.display()))
        }
        None => {
            log::debug!("No template given, using the built-in sample");
            Ok(PptxDocument::sample()?)
        }
    }
}

/// Generate the deck and write it, returning the written path.
///
/// Returns `Ok(None)` without touching anything when the song name or the
/// lyrics are blank.
fn generate(
    song_name: &str,
    lyrics: &str,
    template: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<Option<PathBuf>> {
    let song_name = song_name.trim();
    if song_name.is_empty() || lyrics.trim().is_empty() {
        return Ok(None);
    }

    let mut document = load_template(template)?;
    let existing = document.slide_count();

    LyricsToSlidesTransformer::new().transform(&mut document, lyrics)?;
    log::info!(
        "Added {} slides after {} existing",
        document.slide_count() - existing,
        existing
    );

    let bytes = document.to_bytes()?;
    let output_path = get_output_path(song_name, output_dir)?;
    write_output(&output_path, &bytes)?;

    Ok(Some(output_path))
}

/// Replace characters no common filesystem accepts in a file name.
///
/// Trailing dots and spaces are dropped.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect::<String>()
        .trim_end_matches(['.', ' '])
        .to_string()
}

/// Determine the output path for a song's deck.
fn get_output_path(song_name: &str, output_dir: Option<&Path>) -> Result<PathBuf> {
    // A song name must not escape the output directory.
    let file_name = output_file_name(&sanitize_file_name(song_name));

    let output_path = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(file_name)
        }
        None => PathBuf::from(file_name),
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

/// Render the slides of one presentation as text or JSON.
fn inspect_file(path: &Path, json: bool) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let document = PptxDocument::from_bytes(&bytes)?;
    let slides = document.slides()?;

    if json {
        let mut out = serde_json::to_string_pretty(&slides)?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = format!("== {} ({} slides)\n", path.display(), slides.len());
    for slide in &slides {
        out.push_str(&format!(
            "[{}] {}\n",
            slide.number,
            slide.title.as_deref().unwrap_or("(untitled)")
        ));
        for block in &slide.body {
            for line in block.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LYRICS: &str = "Amazing grace how sweet the sound\n\nI once was lost\n\nWas blind";

    #[test]
    fn test_search_url_requires_first_line() {
        let err = search_url(Some("  "), Language::English).unwrap_err();
        assert_eq!(err.to_string(), "Please enter the first line of lyrics.");
        assert!(search_url(None, Language::English).is_err());

        let url = search_url(Some("Amazing Grace"), Language::Tamil).unwrap();
        assert!(url.ends_with("lyrics+Amazing+Grace+Tamil+christian+devotional"));
    }

    #[test]
    fn test_generate_writes_deck() {
        let dir = tempfile::tempdir().unwrap();
        let path = generate("Amazing Grace", LYRICS, None, Some(dir.path()))
            .unwrap()
            .unwrap();

        assert_eq!(path, dir.path().join("Amazing Grace.pptx"));
        let document = PptxDocument::from_bytes(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(document.slide_count(), 3);
    }

    #[test]
    fn test_generate_with_template_appends() {
        let dir = tempfile::tempdir().unwrap();
        let first = generate("First", "Intro", None, Some(dir.path()))
            .unwrap()
            .unwrap();

        let second = generate("Second", LYRICS, Some(first.as_path()), Some(dir.path()))
            .unwrap()
            .unwrap();

        let document = PptxDocument::from_bytes(&fs::read(&second).unwrap()).unwrap();
        assert_eq!(document.slide_count(), 4);
        let out = inspect_file(&second, false).unwrap();
        assert!(out.contains("[4] Song Lyrics 3"));
        assert!(out.contains("    Was blind"));
    }

    #[test]
    fn test_generate_needs_name_and_lyrics() {
        let dir = tempfile::tempdir().unwrap();
        assert!(generate("  ", LYRICS, None, Some(dir.path())).unwrap().is_none());
        assert!(generate("Song", "\n\n", None, Some(dir.path())).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_bad_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("not-a-deck.pptx");
        fs::write(&template, b"plain text").unwrap();

        assert!(generate("Song", LYRICS, Some(template.as_path()), Some(dir.path())).is_err());
    }

    #[test]
    fn test_output_path_keeps_name_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("decks");
        let path = get_output_path("AC/DC", Some(nested.as_path())).unwrap();
        assert_eq!(path, nested.join("AC-DC.pptx"));
        assert!(nested.is_dir());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Amazing Grace"), "Amazing Grace");
        assert_eq!(
            sanitize_file_name(r#"Psalm 23: "The Lord" <is> my|shepherd?*"#),
            "Psalm 23- -The Lord- -is- my-shepherd--"
        );
        assert_eq!(sanitize_file_name("Holy\tHoly..."), "Holy-Holy");
    }

    #[test]
    fn test_output_path_for_windows_reserved_chars() {
        let dir = tempfile::tempdir().unwrap();
        let path = get_output_path("What: A Friend?", Some(dir.path())).unwrap();
        assert_eq!(path, dir.path().join("What- A Friend-.pptx"));
        fs::write(&path, b"deck").unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_read_lyrics_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.txt");
        fs::write(&path, LYRICS).unwrap();
        assert_eq!(read_lyrics(Some(path.as_path())).unwrap(), LYRICS);
    }

    #[test]
    fn test_inspect_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = generate("Json", "One", None, Some(dir.path()))
            .unwrap()
            .unwrap();
        let out = inspect_file(&path, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["title"], "Song Lyrics 1");
        assert_eq!(value[0]["body"][0], "One");
    }
}
