//! Command-line front end for the zsync download engine.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Instant;

use clap::Parser;
use engine::{zsync_with_observers, Credentials, Options, ZsyncObserver};
use tracing_subscriber::EnvFilter;

/// Partial/differential file download client over HTTP(S).
///
/// Downloads the file described by a `.zsync` control file, reusing blocks
/// found in local files and fetching only what is missing.
#[derive(Debug, Parser)]
#[command(name = "zsync", version)]
struct Cli {
    /// URL or path of the .zsync control file
    zsync_file: String,

    /// Extra input file scanned for blocks in common with the target
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Override the default output file name
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Store a copy of a remote control file at this path
    #[arg(short = 'k', long = "save-zsync", value_name = "FILE")]
    save_zsync: Option<PathBuf>,

    /// URL the control file was originally retrieved from, for resolving a
    /// relative target URL in a locally stored control file
    #[arg(short = 'u', long = "url", value_name = "URL")]
    url: Option<String>,

    /// Credentials for a host, as hostname=username:password (repeatable)
    #[arg(short = 'A', value_name = "HOST=USER:PASS")]
    auth: Vec<String>,

    /// Suppress the completion summary
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

/// Byte counters accumulated over one run.
#[derive(Debug, Default)]
struct Stats {
    downloaded: u64,
    written: u64,
}

struct StatsObserver(Rc<RefCell<Stats>>);

impl ZsyncObserver for StatsObserver {
    fn block_written(&mut self, _index: usize, bytes: usize) {
        self.0.borrow_mut().written += bytes as u64;
    }

    fn bytes_downloaded(&mut self, bytes: u64) {
        self.0.borrow_mut().downloaded += bytes;
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("zsync: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut options = Options::new();
    for input in cli.inputs {
        options = options.seed(input);
    }
    if let Some(output) = cli.output {
        options = options.output_file(output);
    }
    if let Some(save) = cli.save_zsync {
        options = options.save_zsync_file(save);
    }
    if let Some(url) = cli.url {
        let url = url::Url::parse(&url).map_err(|err| format!("invalid --url {url:?}: {err}"))?;
        options = options.zsync_file_source(url);
    }
    for entry in &cli.auth {
        let (host, credentials) = parse_auth(entry)?;
        options = options.credentials(host, credentials);
    }

    let stats = Rc::new(RefCell::new(Stats::default()));
    let started = Instant::now();
    let observer = StatsObserver(Rc::clone(&stats));

    let path = zsync_with_observers(&cli.zsync_file, &options, vec![Box::new(observer)])
        .map_err(|err| err.to_string())?;

    if !cli.quiet {
        print_summary(&stats.borrow(), started, &path);
    }
    Ok(())
}

/// Parses one `-A hostname=username:password` argument.
fn parse_auth(entry: &str) -> Result<(String, Credentials), String> {
    let malformed = || format!("authenticator {entry:?} must be of form hostname=username:password");
    let (host, user_pass) = entry.split_once('=').ok_or_else(malformed)?;
    let (username, password) = user_pass.split_once(':').ok_or_else(malformed)?;
    if host.is_empty() || username.is_empty() {
        return Err(malformed());
    }
    Ok((host.to_string(), Credentials::new(username, password)))
}

fn print_summary(stats: &Stats, started: Instant, path: &Path) {
    println!(
        "downloaded {} of {} in {:.1}s, wrote {}",
        friendly_size(stats.downloaded),
        friendly_size(stats.written),
        started.elapsed().as_secs_f64(),
        path.display()
    );
}

/// Renders a byte count with a binary unit suffix.
fn friendly_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
