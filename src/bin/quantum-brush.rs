use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand};
use quantum_brush::{
    CapturedPath, ClientConfig, EffectClient, EffectService, EncodedImage, ExportName,
    ExportedImage, GridPoint, InMemorySurface, RunOutcome, StrokeManager, export_composite_image,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quantum-brush", version)]
struct Cli {
    /// Effect service base URL (overrides QUANTUM_BRUSH_BASE_URL).
    #[arg(long, global = true)]
    base_url: Option<url::Url>,

    /// Request timeout in seconds (overrides QUANTUM_BRUSH_TIMEOUT_SECS).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the effects offered by the service.
    Effects,
    /// Apply an effect to a whole image.
    Render(RenderArgs),
    /// Paint one or more strokes, run them, and export the composite.
    Stroke(StrokeArgs),
    /// Layer local overlay images over a base image, in order.
    Composite(CompositeArgs),
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output PNG path.
    #[arg(long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// Directory receiving a timestamped PNG.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Effect name.
    #[arg(long)]
    effect: String,

    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct StrokeArgs {
    /// Effect name.
    #[arg(long)]
    effect: String,

    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Stroke path as `row,col;row,col;...`. Repeat for several strokes.
    #[arg(long = "path", required = true)]
    paths: Vec<String>,

    /// Click points as `row,col;...`, shared by all strokes.
    #[arg(long)]
    clicks: Option<String>,

    #[arg(long)]
    radius: Option<f64>,

    #[arg(long)]
    strength: Option<f64>,

    /// Extra effect parameter as `Name=value` (value parsed as JSON, else kept as text).
    #[arg(long = "param")]
    params: Vec<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct CompositeArgs {
    /// Base image.
    #[arg(long)]
    base: PathBuf,

    /// Overlay images, applied in the given order.
    #[arg(long = "overlay", required = true)]
    overlays: Vec<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Effects => cmd_effects(client(&cli.base_url, cli.timeout_secs)?).await,
        Command::Render(ref args) => {
            cmd_render(client(&cli.base_url, cli.timeout_secs)?, args).await
        }
        Command::Stroke(ref args) => {
            cmd_stroke(client(&cli.base_url, cli.timeout_secs)?, args).await
        }
        Command::Composite(args) => cmd_composite(args),
    }
}

fn client(base_url: &Option<url::Url>, timeout_secs: Option<u64>) -> anyhow::Result<EffectClient> {
    let mut cfg = ClientConfig::from_env()?;
    if let Some(url) = base_url {
        cfg.base_url = url.clone();
    }
    if let Some(secs) = timeout_secs {
        if secs == 0 {
            bail!("--timeout-secs must be > 0");
        }
        cfg.timeout = std::time::Duration::from_secs(secs);
    }
    Ok(EffectClient::with_config(cfg)?)
}

async fn cmd_effects(client: EffectClient) -> anyhow::Result<()> {
    for name in client.get_effects().await? {
        println!("{name}");
    }
    Ok(())
}

async fn cmd_render(client: EffectClient, args: &RenderArgs) -> anyhow::Result<()> {
    let manager = session(client, &args.in_path)?;
    manager.apply_whole_image(&args.effect).await?;
    let exported = manager
        .export(ExportName::SingleEffect(args.effect.clone()))
        .await?;
    write_export(&exported, &args.output)
}

async fn cmd_stroke(client: EffectClient, args: &StrokeArgs) -> anyhow::Result<()> {
    let manager = session(client, &args.in_path)?;
    manager.select_effect(&args.effect);
    if let Some(r) = args.radius {
        manager.set_parameter("Radius", serde_json::json!(r));
    }
    if let Some(s) = args.strength {
        manager.set_parameter("Strength", serde_json::json!(s));
    }
    for raw in &args.params {
        let (key, value) = parse_param(raw)?;
        manager.set_parameter(&key, value);
    }

    let clicks = match &args.clicks {
        Some(raw) => parse_points(raw)?,
        None => Vec::new(),
    };
    for raw in &args.paths {
        let captured = CapturedPath {
            path: parse_points(raw)?,
            clicks: clicks.clone(),
        };
        manager
            .draw_stroke(captured)
            .await
            .with_context(|| format!("stroke path '{raw}'"))?;
    }

    let outcomes = manager.run_all().await;
    let mut completed = 0usize;
    for (id, outcome) in &outcomes {
        match outcome {
            RunOutcome::Completed => completed += 1,
            RunOutcome::Failed(msg) => eprintln!("{id}: {msg}"),
            RunOutcome::Skipped | RunOutcome::Discarded => {}
        }
    }
    if completed == 0 {
        bail!("no stroke completed ({} attempted)", outcomes.len());
    }

    let exported = manager.export(ExportName::Art).await?;
    write_export(&exported, &args.output)
}

fn cmd_composite(args: CompositeArgs) -> anyhow::Result<()> {
    let base = read_image(&args.base)?;
    let overlays = args
        .overlays
        .iter()
        .map(|p| read_image(p))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let out = export_composite_image(&base, &overlays)?;
    write_file(&args.out, out.as_bytes())
}

fn session(
    client: EffectClient,
    in_path: &Path,
) -> anyhow::Result<StrokeManager<InMemorySurface>> {
    let surface = InMemorySurface::from_image(read_image(in_path)?)
        .with_context(|| format!("load canvas '{}'", in_path.display()))?;
    let service: Arc<dyn EffectService> = Arc::new(client);
    Ok(StrokeManager::new(service, surface))
}

fn read_image(path: &Path) -> anyhow::Result<EncodedImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    Ok(EncodedImage::from_bytes(bytes))
}

fn write_export(exported: &ExportedImage, output: &OutputArgs) -> anyhow::Result<()> {
    let path = match (&output.out, &output.out_dir) {
        (Some(out), _) => out.clone(),
        (None, Some(dir)) => dir.join(&exported.file_name),
        (None, None) => PathBuf::from(&exported.file_name),
    };
    write_file(&path, exported.image.as_bytes())
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn parse_points(raw: &str) -> anyhow::Result<Vec<GridPoint>> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (row, col) = pair
                .split_once(',')
                .with_context(|| format!("point '{pair}' is not 'row,col'"))?;
            let row: i32 = row.trim().parse().with_context(|| format!("row in '{pair}'"))?;
            let col: i32 = col.trim().parse().with_context(|| format!("col in '{pair}'"))?;
            Ok(GridPoint { row, col })
        })
        .collect()
}

fn parse_param(raw: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("parameter '{raw}' is not 'Name=value'"))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}
