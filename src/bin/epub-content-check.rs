//! Validate one EPUB content document from the command line.
//!
//! Usage:
//!   epub-content-check [OPTIONS] FILE
//!
//! Without `--properties` the document is checked on its own and manifest
//! property reconciliation is skipped. Any `--resource` switches on
//! reference resolution against an in-memory manifest.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use epub_content_check::{
    validate_content_file, ContentDocument, ContentValidationOptions, DeclaredProperties,
    ManifestRegistry, ReconcileMode, ResourceRegistry,
};
use tracing_subscriber::filter::LevelFilter;

struct Args {
    file: String,
    path: Option<String>,
    mime: Option<String>,
    properties: Option<String>,
    resources: Vec<(String, String)>,
    bindings: Vec<(String, String)>,
    substring: bool,
    verbosity: u8,
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(msg) if msg == "help requested" => {
            println!("{}", help_text());
            ExitCode::SUCCESS
        }
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::from(2)
        }
    }
}

/// Returns `Ok(true)` when no error diagnostics were reported.
fn run(args: Vec<String>) -> Result<bool, String> {
    let cli = parse_args(args)?;
    init_logging(cli.verbosity);

    let path = cli.path.clone().unwrap_or_else(|| {
        Path::new(&cli.file)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| cli.file.clone())
    });
    let mime = cli
        .mime
        .clone()
        .unwrap_or_else(|| default_mime_type(&cli.file).to_string());
    let declared = match &cli.properties {
        Some(list) => DeclaredProperties::from_manifest(Some(list.as_str())),
        None => DeclaredProperties::SingleDocument,
    };
    let document = ContentDocument::new(path, mime).with_declared_properties(declared);
    let options = ContentValidationOptions {
        reconcile: if cli.substring {
            ReconcileMode::Substring
        } else {
            ReconcileMode::Tokens
        },
        ..ContentValidationOptions::default()
    };

    let mut registry = if cli.resources.is_empty() && cli.bindings.is_empty() {
        None
    } else {
        let mut registry = ManifestRegistry::new();
        for (target, mime_type) in &cli.resources {
            registry.insert_item(target.as_str(), mime_type.as_str());
        }
        for (mime_type, handler) in &cli.bindings {
            registry.insert_binding(mime_type.as_str(), handler.as_str());
        }
        Some(registry)
    };

    let report = validate_content_file(
        &cli.file,
        document,
        registry.as_mut().map(|r| r as &mut dyn ResourceRegistry),
        options,
    )
    .map_err(|e| format!("{}: {}", cli.file, e))?;

    for diagnostic in report.diagnostics() {
        println!("{}", diagnostic);
    }
    if report.dropped_count() > 0 {
        eprintln!(
            "{} further diagnostics were not shown",
            report.dropped_count()
        );
    }
    if let Some(registry) = &registry {
        log::info!("registered {} references", registry.references().len());
    }
    Ok(report.is_valid())
}

fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

// The subscriber also installs the `log` bridge, so library records show up.
fn init_logging(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_filter(verbosity))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn default_mime_type(file: &str) -> &'static str {
    let is_svg = Path::new(file)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
    if is_svg {
        epub_content_check::media_type::SVG
    } else {
        epub_content_check::media_type::XHTML
    }
}

fn split_pair(flag: &str, value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((left, right)) if !left.is_empty() && !right.is_empty() => {
            Ok((left.to_string(), right.to_string()))
        }
        _ => Err(format!("invalid {} value '{}', expected A=B", flag, value)),
    }
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    let mut cfg = Args {
        file: String::new(),
        path: None,
        mime: None,
        properties: None,
        resources: Vec::new(),
        bindings: Vec::new(),
        substring: false,
        verbosity: 0,
    };

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Err("help requested".to_string()),
            "--mime" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--mime requires a value".to_string())?;
                cfg.mime = Some(v.clone());
                i += 2;
            }
            "--properties" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--properties requires a value".to_string())?;
                cfg.properties = Some(v.clone());
                i += 2;
            }
            "--resource" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--resource requires a value".to_string())?;
                cfg.resources.push(split_pair("--resource", v)?);
                i += 2;
            }
            "--binding" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--binding requires a value".to_string())?;
                cfg.bindings.push(split_pair("--binding", v)?);
                i += 2;
            }
            "--path" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--path requires a value".to_string())?;
                cfg.path = Some(v.clone());
                i += 2;
            }
            "--substring" => {
                cfg.substring = true;
                i += 1;
            }
            "-v" => {
                cfg.verbosity = cfg.verbosity.saturating_add(1);
                i += 1;
            }
            "-vv" => {
                cfg.verbosity = cfg.verbosity.saturating_add(2);
                i += 1;
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option '{}'", other));
            }
            other => {
                if !cfg.file.is_empty() {
                    return Err(format!("unexpected extra argument '{}'", other));
                }
                cfg.file = other.to_string();
                i += 1;
            }
        }
    }

    if cfg.file.is_empty() {
        return Err("missing FILE argument".to_string());
    }
    Ok(cfg)
}

fn help_text() -> &'static str {
    "Usage: epub-content-check [OPTIONS] FILE

Options:
  --mime TYPE             Document media type (default: from file extension)
  --properties \"LIST\"     Manifest properties; omit to check the file on its own
  --resource PATH=TYPE    Manifest item; repeatable, enables reference checks
  --binding TYPE=HANDLER  Manifest binding for a foreign media type; repeatable
  --substring             Match declared properties as raw substrings
  --path NAME             Document path inside the container (default: file name)
  -v, -vv                 Log debug / trace output to stderr
  -h, --help              Show this help

Exit status: 0 clean, 1 error diagnostics reported, 2 operational failure."
}
