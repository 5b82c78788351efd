//! Command-line front end for icondigger.
//!
//! Lists installed icon packs, prints a pack's parsed appfilter, and runs the
//! export operations. Exports run on the background worker so the command
//! mirrors how interactive front ends drive the library; a summary object is
//! printed as JSON when the export finishes.

use anyhow::{Result, anyhow, bail};
use icondigger::logging::init_tracing;
use icondigger::{
    BackgroundRunner, DirectoryDevice, DirectorySink, ExportContext, ExportMode, IconPackSession,
    PackageIdentity, find_device_root, installed_icon_packs, load_manifest, resolve_actions,
    resolve_output_dir, run_export,
};
use icondigger::resources::ResourceSource;
use serde_json::json;
use std::env;
use std::path::PathBuf;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    let device_root = find_device_root(cli.device.as_deref())?;
    let device = DirectoryDevice::new(device_root);

    match cli.command {
        Command::List => {
            let actions = resolve_actions(&cli.actions);
            let packs = installed_icon_packs(&device, actions.as_slice());
            println!("{}", serde_json::to_string_pretty(&packs)?);
            Ok(())
        }
        Command::Manifest(package) => {
            let resources = device.resources_for(&package).ok();
            let manifest = load_manifest(resources.as_deref(), &package);
            println!("{}", serde_json::to_string_pretty(&manifest)?);
            Ok(())
        }
        Command::Export { mode, package } => {
            let output = resolve_output_dir(cli.output.as_deref());
            run_background_export(device, output, mode, package)
        }
    }
}

fn run_background_export(
    device: DirectoryDevice,
    output: PathBuf,
    mode: ExportMode,
    package: Option<PackageIdentity>,
) -> Result<()> {
    let runner = BackgroundRunner::new();
    let sink = DirectorySink::new(output.clone());
    let job_package = package.clone();
    let handle = runner
        .spawn(mode.as_str(), move || {
            let ctx = ExportContext {
                source: &device,
                enumerator: &device,
                sink: &sink,
            };
            let mut session = IconPackSession::new();
            run_export(&ctx, &mut session, mode, job_package.as_ref())
        })?
        .ok_or_else(|| anyhow!("another export is already running"))?;
    let summary = handle.wait()??;

    let report = json!({
        "mode": mode,
        "package": package,
        "output": output.display().to_string(),
        "summary": summary,
        "processed": summary.processed(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

enum Command {
    List,
    Manifest(PackageIdentity),
    Export {
        mode: ExportMode,
        package: Option<PackageIdentity>,
    },
}

struct Cli {
    command: Command,
    device: Option<PathBuf>,
    output: Option<PathBuf>,
    actions: Vec<String>,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args_os();
        let _program = args.next();

        let mut positional: Vec<String> = Vec::new();
        let mut device = None;
        let mut output = None;
        let mut actions = Vec::new();

        while let Some(arg) = args.next() {
            let arg_str = arg
                .to_str()
                .ok_or_else(|| anyhow!("invalid UTF-8 in argument"))?;
            match arg_str {
                "--device" => {
                    let value = next_value("--device", &mut args)?;
                    device = Some(PathBuf::from(value));
                }
                "--output" | "-o" => {
                    let value = next_value("--output", &mut args)?;
                    output = Some(PathBuf::from(value));
                }
                "--action" => {
                    let value = next_value("--action", &mut args)?;
                    actions.push(normalize_token(value, "--action")?);
                }
                "--help" | "-h" => usage(0),
                flag if flag.starts_with('-') => bail!("unknown argument: {flag}"),
                other => positional.push(other.to_string()),
            }
        }

        let mut positional = positional.into_iter();
        let Some(name) = positional.next() else {
            usage(1);
        };
        let package = positional
            .next()
            .map(|raw| normalize_token(raw, "package").map(PackageIdentity))
            .transpose()?;
        if let Some(extra) = positional.next() {
            bail!("unexpected argument: {extra}");
        }

        let command = match name.as_str() {
            "list" => {
                if package.is_some() {
                    bail!("list takes no package argument");
                }
                Command::List
            }
            "manifest" => Command::Manifest(
                package.ok_or_else(|| anyhow!("manifest requires a package argument"))?,
            ),
            other => {
                let mode = ExportMode::try_from(other)?;
                if mode.needs_icon_pack() && package.is_none() {
                    bail!("{other} requires a package argument");
                }
                if !mode.needs_icon_pack() && package.is_some() {
                    bail!("{other} takes no package argument");
                }
                Command::Export { mode, package }
            }
        };

        Ok(Self {
            command,
            device,
            output,
            actions,
        })
    }
}

fn next_value(flag: &str, args: &mut env::ArgsOs) -> Result<String> {
    let value = args
        .next()
        .ok_or_else(|| anyhow!("{flag} requires a value"))?;
    value
        .into_string()
        .map_err(|_| anyhow!("{flag} value must be valid UTF-8"))
}

fn normalize_token(raw: String, flag: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("{flag} value must not be empty");
    }
    Ok(trimmed.to_string())
}

fn usage(code: i32) -> ! {
    eprintln!("{USAGE}");
    std::process::exit(code);
}

const USAGE: &str = r"Usage: icondigger <command> [package] [options]

Commands:
  list                  List installed icon packs (sorted by label).
  manifest <package>    Print the parsed appfilter of an icon pack.
  appfilter <package>   Save the pack's component list as <package>.appfilter.xml.
  drawables <package>   Save every drawable's original bytes (xml/png/...).
  bitmaps <package>     Save every drawable decoded to PNG.
  device-icons          Save each launchable component's icon at 512x512.
  my-appfilters         Save MyAppFilters.txt describing launchable components.

Options:
      --device <dir>    Device root with one directory per package (or set ICONDIGGER_DEVICE_ROOT).
  -o, --output <dir>    Export destination (or set ICONDIGGER_OUTPUT; default ./Downloads).
      --action <list>   Icon pack advertisement actions (repeatable, or set ICONDIGGER_ACTIONS).
      --help            Show this help text.

Logging: ICONDIGGER_LOG (or RUST_LOG) takes tracing filter directives, e.g. ICONDIGGER_LOG=debug.";
