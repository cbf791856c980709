use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "snapbook", version)]
struct Cli {
    /// JSON config file; defaults plus `SNAPBOOK_*` env overrides when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store directory (overrides the config).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture a photo, annotate it and save it as today's snap.
    Add(AddArgs),
    /// List snaps.
    List(ListArgs),
    /// Write today's newest composite to a file.
    Export(ExportArgs),
    /// Delete one of today's snaps.
    Delete(DeleteArgs),
    /// Run the legacy-list migration.
    Migrate(CategoryArgs),
}

#[derive(Parser, Debug)]
struct CategoryArgs {
    /// Category key.
    #[arg(long)]
    category: String,

    /// Allow several snaps per day.
    #[arg(long)]
    multi: bool,
}

#[derive(Parser, Debug)]
struct AddArgs {
    #[command(flatten)]
    cat: CategoryArgs,

    /// Photo to capture.
    #[arg(long)]
    photo: PathBuf,

    /// Caption text.
    #[arg(long, default_value = "")]
    caption: String,

    /// Caption font key (system, yomogi, kosugi, sawarabi, noto).
    #[arg(long, default_value = "system")]
    font: String,

    /// Sticker as `GLYPH@X,Y` or `GLYPH@X,Y@SCALE`, in stage coordinates. Repeatable.
    #[arg(long = "sticker")]
    stickers: Vec<String>,

    /// Replace today's snap in a single category without asking.
    #[arg(long)]
    yes: bool,
}

#[derive(Parser, Debug)]
struct ListArgs {
    #[command(flatten)]
    cat: CategoryArgs,

    /// Show every stored day, not only today.
    #[arg(long)]
    all_days: bool,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    cat: CategoryArgs,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct DeleteArgs {
    #[command(flatten)]
    cat: CategoryArgs,

    /// Position in today's list (0 = newest).
    #[arg(long)]
    index: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => snapbook::SnapConfig::from_path(path)?,
        None => snapbook::SnapConfig::from_env(),
    };
    if let Some(dir) = &cli.store {
        config.store_dir = dir.clone();
    }
    let ctx = snapbook::SnapContext::new(config)?;

    match cli.cmd {
        Command::Add(args) => cmd_add(&ctx, args),
        Command::List(args) => cmd_list(&ctx, args),
        Command::Export(args) => cmd_export(&ctx, args),
        Command::Delete(args) => cmd_delete(&ctx, args),
        Command::Migrate(args) => cmd_migrate(&ctx, args),
    }
}

fn open_store(ctx: &snapbook::SnapContext) -> anyhow::Result<snapbook::FileKvStore> {
    let cfg = ctx.config();
    Ok(snapbook::FileKvStore::open(
        cfg.store_dir.clone(),
        cfg.quota_bytes,
    )?)
}

fn open_category(
    ctx: &snapbook::SnapContext,
    args: &CategoryArgs,
) -> anyhow::Result<snapbook::SnapCategory<snapbook::FileKvStore>> {
    let config = snapbook::CategoryConfig::new(args.category.clone())
        .single(!args.multi)
        .ingest_max_side(ctx.config().ingest_max_side);
    Ok(snapbook::SnapCategory::init(ctx, open_store(ctx)?, config)?)
}

fn parse_sticker(spec: &str) -> anyhow::Result<(String, f64, f64, Option<f64>)> {
    let mut parts = spec.split('@');
    let glyph = parts
        .next()
        .filter(|g| !g.is_empty())
        .with_context(|| format!("sticker '{spec}' has no glyph"))?;
    let pos = parts
        .next()
        .with_context(|| format!("sticker '{spec}' has no position"))?;
    let (x, y) = pos
        .split_once(',')
        .with_context(|| format!("sticker position '{pos}' is not X,Y"))?;
    let scale = parts
        .next()
        .map(|s| s.trim().parse::<f64>())
        .transpose()
        .with_context(|| format!("sticker '{spec}' has a bad scale"))?;
    Ok((
        glyph.to_string(),
        x.trim().parse().context("sticker x")?,
        y.trim().parse().context("sticker y")?,
        scale,
    ))
}

fn parse_font(key: &str) -> anyhow::Result<snapbook::FontKey> {
    let found = snapbook::FONT_OPTIONS
        .iter()
        .find(|o| o.key.key().eq_ignore_ascii_case(key.trim()));
    match found {
        Some(option) => Ok(option.key),
        None => {
            let known: Vec<String> = snapbook::FONT_OPTIONS
                .iter()
                .map(|o| format!("{} ({})", o.key, o.label))
                .collect();
            anyhow::bail!("unknown font '{key}'; choose one of: {}", known.join(", "))
        }
    }
}

fn cmd_add(ctx: &snapbook::SnapContext, args: AddArgs) -> anyhow::Result<()> {
    let mut cat = open_category(ctx, &args.cat)?;
    if cat.needs_replace_confirmation()? && !args.yes {
        anyhow::bail!(
            "category '{}' already has today's snap; pass --yes to replace it",
            cat.key()
        );
    }

    let raw = std::fs::read(&args.photo)
        .with_context(|| format!("read photo '{}'", args.photo.display()))?;
    let mut session = cat.begin_capture(&raw)?;
    session.set_caption(args.caption);
    session.set_font(parse_font(&args.font)?);
    for spec in &args.stickers {
        let (glyph, x, y, scale) = parse_sticker(spec)?;
        session.choose_glyph(glyph);
        // The new sticker is selected, so the scale lands on it alone.
        session.tap_canvas(x, y);
        session.set_scale(scale.unwrap_or(1.0));
    }

    let mut compositor = ctx.compositor();
    let snap = session.save(&mut compositor, cat.now_millis())?;
    let items = cat.commit_new(snap)?;
    println!("saved; {} snap(s) today", items.len());
    Ok(())
}

fn print_snap(i: usize, snap: &snapbook::Snap) {
    println!(
        "  [{i}] ts={} font={} stickers={} image={}B caption={:?}",
        snap.timestamp,
        snap.caption_font_key,
        snap.stickers.len(),
        snap.raster_payload.byte_len(),
        snap.caption
    );
    for st in &snap.stickers {
        println!("      sticker {} at ({:.0}, {:.0}) scale {}", st.glyph, st.x, st.y, st.scale);
    }
}

fn cmd_list(ctx: &snapbook::SnapContext, args: ListArgs) -> anyhow::Result<()> {
    let mut cat = open_category(ctx, &args.cat)?;
    if args.all_days {
        let calendar = cat.store().load_calendar(cat.key())?;
        for (day, items) in &calendar {
            println!("{day}");
            for (i, snap) in items.iter().enumerate() {
                print_snap(i, snap);
            }
        }
        return Ok(());
    }
    let items = cat.items()?;
    println!("{} ({} today)", cat.key(), items.len());
    for (i, snap) in items.iter().enumerate() {
        print_snap(i, snap);
    }
    Ok(())
}

fn cmd_export(ctx: &snapbook::SnapContext, args: ExportArgs) -> anyhow::Result<()> {
    let mut cat = open_category(ctx, &args.cat)?;
    let name = file_name(&args.out);
    let file = cat
        .latest_as_file("image/jpeg", &name)
        .with_context(|| format!("no exportable snap in '{}' today", cat.key()))?;
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &file.bytes)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    println!("wrote {} ({} bytes)", args.out.display(), file.bytes.len());
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snap.jpg".to_string())
}

fn cmd_delete(ctx: &snapbook::SnapContext, args: DeleteArgs) -> anyhow::Result<()> {
    let mut cat = open_category(ctx, &args.cat)?;
    if cat.delete(args.index)? {
        println!("deleted [{}]", args.index);
    } else {
        println!("nothing at [{}]", args.index);
    }
    Ok(())
}

fn cmd_migrate(ctx: &snapbook::SnapContext, args: CategoryArgs) -> anyhow::Result<()> {
    // Opening a category already migrates; report the resulting state.
    let cat = open_category(ctx, &args)?;
    let version = cat.store().schema_version(cat.key())?;
    println!("{} at schema version {version}", cat.key());
    Ok(())
}
