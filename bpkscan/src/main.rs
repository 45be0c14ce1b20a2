use anyhow::{bail, Context, Result};
use bpkscan_lib::config::{ScanConfig, DEFAULT_FRAMEWORK_PREFIX, DEFAULT_HIGHLIGHT_OUTLINE};
use bpkscan_lib::inspector::Inspector;
use bpkscan_lib::parser::{html, serialize};
use bpkscan_lib::scan::{report, Scanner};
use bpkscan_lib::style::loader::FsSheetLoader;
use bpkscan_lib::style::sheet::SheetSource;
use bpkscan_lib::watch::ChangeWatcher;
use clap::{Parser, ValueEnum};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

const BPKSCAN_INTRO: &str = r#"
      __          __
     / /_  ____  / /__ ______________ _____
    / __ \/ __ \/ //_// ___/ ___/ __ `/ __ \
   / /_/ / /_/ / ,<  (__  ) /__/ /_/ / / / /
  /_.___/ .___/_/|_|/____/\___/\__,_/_/ /_/
       /_/

    bpkscan - find author styles the framework silently overrides
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Remediation {
    /// Outline every flagged element.
    Highlight,
    /// Pin every overridden property to the author's value.
    Force,
}

#[derive(Parser)]
#[command(name = "bpkscan")]
#[command(about = "Report CSS properties that framework rules override on an HTML page")]
struct Args {
    /// Input HTML file.
    input: PathBuf,

    /// Extra stylesheet, cascading after the page's own sheets. Repeatable.
    #[arg(long = "css")]
    css: Vec<PathBuf>,

    /// Class prefix of the style framework.
    #[arg(long, env = "BPKSCAN_PREFIX", default_value = DEFAULT_FRAMEWORK_PREFIX)]
    prefix: String,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Apply a remediation effect and write the resulting page to --output.
    #[arg(long, value_enum, requires = "output")]
    remediate: Option<Remediation>,

    /// `outline` value used by `--remediate highlight`.
    #[arg(long, default_value = DEFAULT_HIGHLIGHT_OUTLINE)]
    outline: String,

    /// Output file for the remediated page.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Re-scan whenever the input or a --css file changes.
    #[arg(long)]
    watch: bool,

    /// Quiet period after a change before re-scanning, in milliseconds.
    #[arg(long, default_value_t = 250)]
    settle_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Args = Args::parse();
    if args.format == Format::Text {
        println!("{}", BPKSCAN_INTRO);
    }

    let config = ScanConfig::default()
        .with_framework_prefix(args.prefix.clone())
        .with_settle_delay(Duration::from_millis(args.settle_ms))
        .with_highlight_outline(args.outline.clone());

    run_once(&args, &config)?;
    if args.watch {
        watch(&args, &config)?;
    }
    Ok(())
}

/// Loads the page, scans it, prints the report and writes any remediated output.
fn run_once(args: &Args, config: &ScanConfig) -> Result<()> {
    let html_content = fs::read_to_string(&args.input)
        .with_context(|| format!("reading HTML file {}", args.input.display()))?;
    let document = html::create_dom_tree(&html_content);

    let mut inspector = Inspector::new(build_scanner(args, config)?, config);
    let format = args.format;
    inspector.subscribe("report", move |results| {
        let entries = report::summarize(results);
        match format {
            Format::Text => print!("{}", report::render_text(&entries)),
            Format::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        }
        Ok(())
    });
    inspector.rescan(&document);
    if let Some(failure) = inspector.last_failures().first() {
        bail!("{}", failure);
    }

    if let (Some(remediation), Some(output)) = (args.remediate, &args.output) {
        match remediation {
            Remediation::Highlight => inspector.toggle_highlight(&document),
            Remediation::Force => inspector.toggle_force_intended(&document),
        };
        fs::write(output, serialize::serialize_document(&document))
            .with_context(|| format!("writing {}", output.display()))?;
        log::info!(
            "wrote {} remediated element(s) to {}",
            inspector.results().len(),
            output.display()
        );
    }
    Ok(())
}

fn build_scanner(args: &Args, config: &ScanConfig) -> Result<Scanner> {
    let base_dir = args
        .input
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut scanner = Scanner::new(config).with_loader(FsSheetLoader::new(base_dir));
    for css in &args.css {
        let path = fs::canonicalize(css).with_context(|| format!("resolving {}", css.display()))?;
        scanner = scanner.with_extra_source(SheetSource::linked(path.to_string_lossy()));
    }
    Ok(scanner)
}

/// Blocks forever, re-running the scan once file events settle.
fn watch(args: &Args, config: &ScanConfig) -> Result<()> {
    let mut files = HashSet::new();
    for path in std::iter::once(&args.input).chain(&args.css) {
        files.insert(fs::canonicalize(path).with_context(|| format!("resolving {}", path.display()))?);
    }

    let (tx, rx) = mpsc::channel();
    let watched = files.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) && event.paths.iter().any(|path| watched.contains(path));
                if relevant {
                    let _ = tx.send(());
                }
            }
            Err(e) => log::warn!("watch error: {}", e),
        },
        Config::default(),
    )?;

    // Editors often replace files on save, so watch the containing directories.
    let dirs: HashSet<&Path> = files.iter().filter_map(|file| file.parent()).collect();
    for dir in dirs {
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {}", dir.display()))?;
    }
    log::info!("watching {} file(s) for changes", files.len());

    let mut changes = ChangeWatcher::new(config.settle_delay);
    loop {
        let timeout = changes
            .deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::from_secs(3600));
        match rx.recv_timeout(timeout) {
            Ok(()) => {
                changes.signal(Instant::now());
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => bail!("file watcher stopped"),
        }
        if changes.poll(Instant::now()) {
            if let Err(e) = run_once(args, config) {
                log::error!("{:#}", e);
            }
        }
    }
}
