//! Main entry point for the runtar CLI application.
//!
//! This binary lists and extracts tar archives from both the local
//! filesystem and remote HTTP URLs, fetching only the byte ranges it needs.

use anyhow::Result;
use clap::Parser;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use runtar::fs::glob;
use runtar::{Cli, ErrorKind, FileType, HttpRangeReader, LocalFileReader, ReadAt, TarFs};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to the appropriate handler
/// based on whether the input is a local file or HTTP URL.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(&cli);

    if cli.is_http_url() {
        // Remote archive via HTTP Range requests
        let reader = HttpRangeReader::new(cli.file.clone()).await?;
        let transferred_before = reader.transferred_bytes();
        let reader = Arc::new(reader);

        process_tar(reader.clone(), &cli).await?;

        if !cli.is_quiet() {
            let transferred = reader.transferred_bytes() - transferred_before;
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        let reader = Arc::new(LocalFileReader::new(Path::new(&cli.file))?);
        process_tar(reader, &cli).await?;
    }

    Ok(())
}

fn setup_tracing(cli: &Cli) {
    let Some(level) = cli.log_level.to_tracing_level() else {
        return;
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

/// Index the archive, then list or extract according to CLI options.
async fn process_tar<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    let fs = TarFs::new(reader).await?;

    if cli.list || cli.verbose {
        return list_files(&fs, cli.verbose);
    }

    let selected = select_files(&fs, cli)?;
    let multiple_files = cli.pipe && selected.len() > 1;
    for path in &selected {
        extract_file(&fs, path, cli, multiple_files).await?;
    }

    Ok(())
}

/// Resolve the positional FILES arguments into regular file paths.
///
/// Each argument is a literal path or a glob pattern. Directories select
/// every file beneath them. No arguments selects the whole archive.
fn select_files<R: ReadAt>(fs: &TarFs<R>, cli: &Cli) -> Result<BTreeSet<String>> {
    let roots: Vec<String> = if cli.files.is_empty() {
        vec![".".to_owned()]
    } else {
        let mut roots = Vec::new();
        for arg in &cli.files {
            let arg = arg.trim_end_matches('/');
            let matched = if glob::has_meta(arg) {
                fs.glob(arg)?
            } else {
                vec![arg.to_owned()]
            };
            if matched.is_empty() && !cli.is_very_quiet() {
                eprintln!("caution: filename not matched:  {arg}");
            }
            roots.extend(matched);
        }
        roots
    };

    let mut selected = BTreeSet::new();
    for root in &roots {
        let walk = match fs.walk(root) {
            Ok(walk) => walk,
            Err(err) if matches!(err.kind(), ErrorKind::NotExist | ErrorKind::Invalid) => {
                if !cli.is_very_quiet() {
                    eprintln!("caution: filename not matched:  {root}");
                }
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        for (path, meta) in walk {
            match meta.file_type() {
                FileType::Directory => {}
                FileType::Regular => {
                    if !is_excluded(&path, &cli.exclude) {
                        selected.insert(path);
                    }
                }
                other => info!(path = %path, file_type = ?other, "skipping non-regular entry"),
            }
        }
    }

    debug!(count = selected.len(), "selected files");
    Ok(selected)
}

/// Whether a path matches any `-x` argument, as a substring, a whole-path
/// pattern, or a pattern on its base name.
fn is_excluded(path: &str, exclude: &[String]) -> bool {
    let basename = path.rsplit('/').next().unwrap_or(path);
    exclude.iter().any(|x| {
        path.contains(x.as_str())
            || glob::matches_path(x, path) == Some(true)
            || glob::matches_path(x, basename) == Some(true)
    })
}

/// List entries in the archive.
///
/// Short format prints one path per line, directories with a trailing
/// slash. Verbose format prints a table with mode, size and timestamp.
fn list_files<R: ReadAt>(fs: &TarFs<R>, verbose: bool) -> Result<()> {
    if verbose {
        println!(
            "{:<10}  {:>10}  {:>10}  {:>5}  Name",
            "Mode", "Length", "Date", "Time"
        );
        println!("{}", "-".repeat(60));
    }

    let mut total_size = 0u64;
    let mut file_count = 0usize;

    for (path, meta) in fs.walk(".")?.skip(1) {
        let display = if meta.is_dir() {
            format!("{path}/")
        } else {
            match meta.link_name() {
                Some(target) if verbose => format!("{path} -> {target}"),
                _ => path,
            }
        };

        if !verbose {
            println!("{display}");
            continue;
        }

        let (year, month, day, hour, minute) = civil_time(meta.mtime());
        println!(
            "{}  {:>10}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            meta.mode_string(),
            meta.size(),
            year,
            month,
            day,
            hour,
            minute,
            display
        );

        if !meta.is_dir() {
            total_size += meta.size();
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(60));
        println!("{:<10}  {:>10}  {:>17}  {} files", "", total_size, "", file_count);
    }

    Ok(())
}

/// Extract a single regular file.
///
/// Handles pipe mode (`-p`), the output directory (`-d`), junk paths
/// (`-j`) and the overwrite policy (`-n`, `-o`).
async fn extract_file<R: ReadAt>(
    fs: &TarFs<R>,
    path: &str,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    if cli.pipe {
        if show_filename {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(format!("--- {path} ---\n").as_bytes())
                .await?;
        }
        fs.extract_to_stdout(path).await?;
        return Ok(());
    }

    let file_name = if cli.junk_paths {
        path.rsplit('/').next().unwrap_or(path)
    } else {
        path
    };
    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(file_name),
        None => PathBuf::from(file_name),
    };

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {path} (file exists)");
            }
            return Ok(());
        }
        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {path} (use -o to overwrite)");
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {path}");
    }

    match fs.extract_to_file(path, &output_path).await {
        Ok(written) => {
            debug!(path, written, output = %output_path.display(), "extracted");
            Ok(())
        }
        Err(err) => {
            warn!(path, "extraction failed: {err}");
            Err(err.into())
        }
    }
}

/// Split a Unix timestamp into UTC `(year, month, day, hour, minute)`.
fn civil_time(secs: u64) -> (i64, u32, u32, u32, u32) {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (hour, minute) = ((rem / 3600) as u32, (rem % 3600 / 60) as u32);

    // Days since 1970-01-01 to a proleptic Gregorian date
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);

    (year, month, day, hour, minute)
}

/// Render a byte count with a binary unit, e.g. `1.50 KiB`.
fn format_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if size < 1024 {
        return format!("{size} bytes");
    }
    let mut value = size as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}
