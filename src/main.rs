//! copywork – command-line Bible copywork worksheet generator.
//!
//! Usage:
//!   copywork generate "John 3:16, Psalm 23:1 (KJV)" [--translation nlt] [--cursive]
//!   copywork render <record.json> [output.pdf]
//!   copywork batch <json_dir> <pdf_dir>
//!   copywork demo <out_dir>
//!
//! Provider credentials and file locations come from the environment (see
//! `AppConfig`); `secret.env` and `.env` are read if present.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use verse_copywork::{
    assets::ImageAssets,
    config::AppConfig,
    content::{word_count, VerseRecord, WorksheetContent, TRACE_WORD_LIMIT},
    fonts::FontRegistry,
    pipeline::{self, PipelineConfig, Resources},
    provider::{OpenAiBackend, VerseProvider},
    reference::{parse_requests, VerseRequest},
    samples,
    store::RecordStore,
};

/// Tracing style for cached records that do not say.
const BATCH_DEFAULT_CURSIVE: bool = true;

#[derive(Parser, Debug)]
#[command(name = "copywork", about = "Printable Bible verse copywork worksheets")]
struct Cli {
    /// Use Helvetica metrics instead of the dotted / cursive tracing fonts.
    #[arg(long, global = true)]
    builtin_fonts: bool,

    /// Render on A4 instead of US Letter.
    #[arg(long, global = true)]
    a4: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch (or reuse cached) verse records and render one PDF per reference.
    Generate {
        /// Comma-separated references; each may end in its own `(VERSION)`.
        references: String,
        /// Translation used when a reference has no `(VERSION)` suffix.
        #[arg(short, long, default_value = "nlt")]
        translation: String,
        /// Trace in cursive instead of print.
        #[arg(long)]
        cursive: bool,
        /// Output directory (default: `COPYWORK_OUTPUT_DIR` or `output`).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Render a single cached JSON record.
    Render {
        input: PathBuf,
        /// Default: same stem as the input with `.pdf`.
        output: Option<PathBuf>,
        #[arg(short, long, default_value = "nlt")]
        translation: String,
    },
    /// Render every cached record in a directory that has no PDF yet.
    Batch { json_dir: PathBuf, pdf_dir: PathBuf },
    /// Render the bundled sample worksheets.
    Demo { out_dir: PathBuf },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let app = AppConfig::from_env();
    let resources = load_resources(&app, cli.builtin_fonts)?;
    let page = if cli.a4 {
        PipelineConfig::a4()
    } else {
        PipelineConfig::default()
    };

    match cli.command {
        Command::Generate {
            references,
            translation,
            cursive,
            out,
        } => {
            let out_dir = out.unwrap_or_else(|| app.output_dir.clone());
            generate(&app, &resources, &page, &references, &translation, cursive, &out_dir)
        }
        Command::Render {
            input,
            output,
            translation,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("pdf"));
            let record = read_record(&input)?;
            let content = WorksheetContent::from_record(&record, &translation)
                .with_context(|| format!("invalid record in '{}'", input.display()))?;
            write_worksheet(&content, &resources, &page, &output)
        }
        Command::Batch { json_dir, pdf_dir } => batch(&resources, &page, &json_dir, &pdf_dir),
        Command::Demo { out_dir } => {
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating '{}'", out_dir.display()))?;
            for (name, content) in samples::all() {
                write_worksheet(&content, &resources, &page, &out_dir.join(format!("{name}.pdf")))?;
            }
            Ok(())
        }
    }
}

fn load_resources(app: &AppConfig, builtin_fonts: bool) -> anyhow::Result<Resources> {
    let fonts = if builtin_fonts {
        log::info!("using builtin Helvetica metrics for tracing text");
        FontRegistry::builtin()
    } else {
        FontRegistry::load(&app.font_paths()).with_context(|| {
            format!(
                "loading tracing fonts from '{}' (pass --builtin-fonts to skip)",
                app.font_dir.display()
            )
        })?
    };
    Ok(Resources::new(fonts, ImageAssets::load(&app.asset_paths())))
}

fn generate(
    app: &AppConfig,
    resources: &Resources,
    page: &PipelineConfig,
    references: &str,
    translation: &str,
    cursive: bool,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let requests = parse_requests(references, translation);
    if requests.is_empty() {
        bail!("no verse references given");
    }
    let store = RecordStore::open(out_dir)
        .with_context(|| format!("opening output directory '{}'", out_dir.display()))?;

    // Built on first cache miss so cached runs need no API key.
    let mut provider: Option<VerseProvider<OpenAiBackend>> = None;
    let mut failures = 0usize;

    for request in &requests {
        let outcome = fetch_record(app, &store, &mut provider, request, cursive).and_then(|record| {
            let content = requested_content(&record, &request.version, cursive)?;
            let output = store.dir().join(format!("{}.pdf", request.file_stem()));
            write_worksheet(&content, resources, page, &output)
        });
        if let Err(e) = outcome {
            log::error!("{}: {e:#}", request.reference);
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{failures} of {} worksheet(s) failed", requests.len());
    }
    Ok(())
}

fn fetch_record(
    app: &AppConfig,
    store: &RecordStore,
    provider: &mut Option<VerseProvider<OpenAiBackend>>,
    request: &VerseRequest,
    cursive: bool,
) -> anyhow::Result<VerseRecord> {
    store.load_or_fetch(&request.file_stem(), cursive, || {
        let provider = match provider {
            Some(p) => p,
            None => {
                let backend =
                    OpenAiBackend::new(app.api_key.clone(), &app.model, &app.api_base_url)?;
                provider.insert(VerseProvider::new(backend))
            }
        };
        log::info!("requesting {} ({})", request.reference, request.version);
        let record = provider.fetch_verse(&request.reference, &request.version)?;
        Ok(provider.shorten_traceable(record))
    })
}

/// Worksheet for a `generate` request. The command's `--cursive` flag picks
/// the tracing style, whatever a cached record says.
fn requested_content(
    record: &VerseRecord,
    version: &str,
    cursive: bool,
) -> anyhow::Result<WorksheetContent> {
    Ok(WorksheetContent {
        cursive,
        ..WorksheetContent::from_record(record, version)?
    })
}

fn batch(
    resources: &Resources,
    page: &PipelineConfig,
    json_dir: &Path,
    pdf_dir: &Path,
) -> anyhow::Result<()> {
    let store = RecordStore::open(json_dir)?;
    fs::create_dir_all(pdf_dir).with_context(|| format!("creating '{}'", pdf_dir.display()))?;

    let (mut rendered, mut skipped) = (0usize, 0usize);
    for json_path in store.list()? {
        let Some(stem) = json_path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let pdf_path = pdf_dir.join(format!("{stem}.pdf"));
        if pdf_path.exists() {
            skipped += 1;
            continue;
        }

        let record = match read_record(&json_path) {
            Ok(r) => r,
            Err(e) => {
                log::error!("{e:#}");
                continue;
            }
        };
        if needs_regeneration(&record) {
            log::warn!("{stem}: verse and excerpt both exceed {TRACE_WORD_LIMIT} words; regenerate this record");
        }

        // `john_3_16_esv` → `esv`
        let fallback_version = stem.rsplit('_').next().unwrap_or("nlt");
        let outcome = batch_content(&record, fallback_version)
            .and_then(|content| write_worksheet(&content, resources, page, &pdf_path));
        match outcome {
            Ok(()) => rendered += 1,
            Err(e) => log::error!("{stem}: {e:#}"),
        }
    }
    log::info!("batch done: {rendered} rendered, {skipped} already present");
    Ok(())
}

/// Worksheet for a cached record in `batch`. Records saved without a
/// `cursive` key trace in cursive.
fn batch_content(record: &VerseRecord, fallback_version: &str) -> anyhow::Result<WorksheetContent> {
    Ok(WorksheetContent {
        cursive: record.cursive.unwrap_or(BATCH_DEFAULT_CURSIVE),
        ..WorksheetContent::from_record(record, fallback_version)?
    })
}

/// True when tracing would have to use more than the word limit.
fn needs_regeneration(record: &VerseRecord) -> bool {
    let too_long = |text: Option<&str>| text.map_or(true, |t| word_count(t) > TRACE_WORD_LIMIT);
    too_long(record.full_verse.as_deref()) && too_long(record.traceable_verse.as_deref())
}

fn read_record(path: &Path) -> anyhow::Result<VerseRecord> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))?;
    VerseRecord::from_json(&json).with_context(|| format!("parsing '{}'", path.display()))
}

fn write_worksheet(
    content: &WorksheetContent,
    resources: &Resources,
    page: &PipelineConfig,
    output: &Path,
) -> anyhow::Result<()> {
    let config = PipelineConfig {
        title: format!("{} copywork", content.reference),
        ..page.clone()
    };
    // Render in memory first so a failure never leaves a truncated file.
    let mut bytes = Vec::new();
    let report = pipeline::render(content, resources, &config, &mut bytes)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating '{}'", parent.display()))?;
        }
    }
    fs::write(output, &bytes).with_context(|| format!("writing '{}'", output.display()))?;
    let warnings = report.warnings.len();
    eprintln!(
        "Wrote '{}' ({} bytes, {} warning{})",
        output.display(),
        report.bytes_written,
        warnings,
        if warnings == 1 { "" } else { "s" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cursive: Option<bool>) -> VerseRecord {
        VerseRecord {
            verse: Some("Psalm 23:1".to_string()),
            full_verse: Some("The LORD is my shepherd; I shall not want.".to_string()),
            version: Some("KJV".to_string()),
            cursive,
            ..VerseRecord::default()
        }
    }

    #[test]
    fn generate_flag_overrides_cached_style() {
        let cached = record(Some(true));
        assert!(!requested_content(&cached, "kjv", false).unwrap().cursive);
        assert!(requested_content(&record(Some(false)), "kjv", true).unwrap().cursive);
    }

    #[test]
    fn batch_defaults_to_cursive() {
        assert!(batch_content(&record(None), "kjv").unwrap().cursive);
        assert!(!batch_content(&record(Some(false)), "kjv").unwrap().cursive);
    }

    #[test]
    fn batch_rejects_incomplete_records() {
        let incomplete = VerseRecord {
            full_verse: None,
            ..record(None)
        };
        assert!(batch_content(&incomplete, "kjv").is_err());
    }

    #[test]
    fn regeneration_needed_only_when_both_texts_are_long() {
        let long = vec!["word"; 30].join(" ");
        let mut r = record(None);
        assert!(!needs_regeneration(&r));
        r.full_verse = Some(long.clone());
        r.traceable_verse = Some("short excerpt".to_string());
        assert!(!needs_regeneration(&r));
        r.traceable_verse = Some(long);
        assert!(needs_regeneration(&r));
    }
}
