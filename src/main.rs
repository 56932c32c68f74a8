use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};

use gallerywall::chart::{generate_legend, render_bar_chart_png, BarChartOptions};
use gallerywall::page::discover;
use gallerywall::rendering::images::{ImageLoader, NoImages, SourceLoader};
use gallerywall::{
    AlgorithmType, ArrangementSession, CanvasSize, ClientConfig, Color, HttpBackend, RasterCanvas, RenderConfig,
    Screenshot, WallBackend, WallDescriptor, WallRenderer, WallService,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render gallery walls and time charts to PNG", long_about = None)]
struct Cli {
    #[command(flatten)]
    backend: BackendArgs,

    #[command(flatten)]
    render: RenderArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct BackendArgs {
    /// Base URL of the wall backend
    #[arg(long, global = true, default_value = "http://localhost:5000/")]
    base_url: String,

    /// Request timeout in milliseconds
    #[arg(long, global = true, default_value_t = 30000)]
    timeout_ms: u64,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Maximum canvas width
    #[arg(long, global = true, default_value_t = 900)]
    width: u32,

    /// Maximum canvas height
    #[arg(long, global = true, default_value_t = 300)]
    height: u32,

    /// Clamp a zero scale up to 1 for walls larger than the canvas
    #[arg(long, global = true)]
    min_scale_one: bool,

    /// Draw placeholders instead of loading picture images
    #[arg(long, global = true)]
    no_images: bool,

    /// Canvas background color (CSS hex or rgb()), transparent by default
    #[arg(long, global = true)]
    background: Option<String>,

    /// Seed for the floor decoration, for reproducible output
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a wall fetched from the backend
    Wall {
        id: u64,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Render a gallery (with floor) fetched from the backend
    Gallery {
        id: u64,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Render a wall from a local JSON file
    File {
        path: PathBuf,
        /// Draw the gallery floor
        #[arg(long)]
        gallery: bool,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Render every wall and gallery referenced by an HTML page
    Page {
        /// Page URL, relative to the base URL, or a local HTML file
        source: String,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Arrange a gallery and render the resulting wall
    Arrange {
        gallery_id: u64,
        /// linear, column or grid
        #[arg(default_value = "column")]
        algorithm: AlgorithmType,
        /// Save the arranged wall
        #[arg(long)]
        save: bool,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Mark a wall as saved
    Save { wall_id: u64 },
    /// Render the tracked time charts
    Chart {
        #[arg(value_enum, default_value_t = ChartKind::Time)]
        kind: ChartKind,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChartKind {
    /// Daily totals per activity
    Time,
    /// One small chart per activity
    Spark,
}

impl RenderArgs {
    fn config(&self) -> Result<RenderConfig> {
        let background = match &self.background {
            Some(css) => Some(Color::parse(css).ok_or_else(|| anyhow!("unrecognised background color {:?}", css))?),
            None => None,
        };
        let config = RenderConfig {
            canvas: CanvasSize {
                width: self.width,
                height: self.height,
            },
            min_scale_one: self.min_scale_one,
            enable_images: !self.no_images,
            background,
            floor_seed: self.seed,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }
}

impl BackendArgs {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout_ms: self.timeout_ms,
            ..Default::default()
        }
    }
}

fn render<L: ImageLoader>(renderer: &WallRenderer<L>, wall: &WallDescriptor, size: CanvasSize) -> Result<Screenshot> {
    let config = renderer.config();
    let mut canvas = RasterCanvas::new(size.width, size.height, config.background);
    let report = renderer.paint_with(wall, size, &mut canvas, &mut renderer.floor_rng())?;
    info!(
        "wall {}: scale {}, {} images, {} placeholders",
        wall.id, report.transform.scale, report.images_drawn, report.placeholders_drawn
    );
    Ok(canvas.to_screenshot()?)
}

fn write_png(shot: &Screenshot, path: &Path) -> Result<()> {
    fs::write(path, &shot.png_data).with_context(|| format!("writing {}", path.display()))?;
    println!("{} {}x{} sha256:{}", path.display(), shot.width, shot.height, shot.digest());
    Ok(())
}

fn fetch_and_render(
    backend: &HttpBackend,
    args: &RenderArgs,
    wall: Option<WallDescriptor>,
    what: &str,
    out: PathBuf,
) -> Result<()> {
    let Some(wall) = wall else {
        warn!("{} not found", what);
        return Ok(());
    };
    let config = args.config()?;
    let size = config.canvas;
    let renderer = WallRenderer::new(config, backend.image_loader());
    write_png(&render(&renderer, &wall, size)?, &out)
}

fn run_page(cli: &Cli, source: &str, out_dir: &Path) -> Result<()> {
    let html = if Path::new(source).is_file() {
        fs::read_to_string(source).with_context(|| format!("reading {}", source))?
    } else {
        HttpBackend::new(cli.backend.config())?.fetch_page(source)?
    };
    let targets = discover(&html)?;
    if targets.is_empty() {
        warn!("no walls or galleries found in {}", source);
        return Ok(());
    }
    if !targets.algorithms.is_empty() {
        let names: Vec<&str> = targets.algorithms.iter().map(|a| a.as_str()).collect();
        info!("{} offers arrangements: {}", source, names.join(", "));
    }
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let render_config = cli.render.config()?;
    let client_config = cli.backend.config();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let service = WallService::new(Some(client_config), Some(render_config)).await?;

        let walls = futures::future::join_all(targets.walls.iter().map(|t| service.render_wall(t.id, t.canvas))).await;
        let galleries =
            futures::future::join_all(targets.galleries.iter().map(|t| service.render_gallery(t.id, t.canvas))).await;

        let results = targets
            .walls
            .iter()
            .zip(walls)
            .map(|(t, r)| (format!("wall-{}.png", t.id), r))
            .chain(
                targets
                    .galleries
                    .iter()
                    .zip(galleries)
                    .map(|(t, r)| (format!("gallery-{}.png", t.id), r)),
            );
        for (name, result) in results {
            match result {
                Ok(Some(shot)) => write_png(&shot, &out_dir.join(&name))?,
                Ok(None) => warn!("{}: not found on the backend", name),
                Err(e) => warn!("{}: {}", name, e),
            }
        }
        service.close().await?;
        Ok::<_, anyhow::Error>(())
    })
}

fn run_chart(backend: &HttpBackend, kind: ChartKind, out_dir: &Path, width: u32, height: u32) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let size = CanvasSize { width, height };
    match kind {
        ChartKind::Time => {
            let data = backend.get_time_chart()?;
            let shot = render_bar_chart_png(&data, &BarChartOptions::default(), size)?;
            write_png(&shot, &out_dir.join("time.png"))?;
            let legend = out_dir.join("time-legend.html");
            fs::write(&legend, generate_legend(&data)).with_context(|| format!("writing {}", legend.display()))?;
        }
        ChartKind::Spark => {
            let plots = backend.get_time_plots()?;
            let options = BarChartOptions::spark();
            for (i, data) in plots.all_plots.iter().enumerate() {
                let name = plots.all_types.get(i).cloned().unwrap_or_else(|| format!("plot{}", i));
                if let Some(title) = plots.all_labels.get(i) {
                    info!("rendering {} ({})", name, title);
                }
                let shot = render_bar_chart_png(data, &options, size)?;
                write_png(&shot, &out_dir.join(format!("spark-{}.png", name)))?;
            }
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::File { path, gallery, out } => {
            let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            let Some(mut wall) = WallDescriptor::from_payload(&json)? else {
                bail!("{} describes no wall (id is null)", path.display());
            };
            if *gallery {
                wall = wall.as_gallery();
            }
            let config = cli.render.config()?;
            let size = config.canvas;
            let out = out.clone().unwrap_or_else(|| PathBuf::from(format!("wall-{}.png", wall.id)));
            let shot = if config.enable_images {
                render(&WallRenderer::new(config, SourceLoader::new()), &wall, size)?
            } else {
                render(&WallRenderer::new(config, NoImages), &wall, size)?
            };
            write_png(&shot, &out)
        }
        Command::Wall { id, out } => {
            let backend = HttpBackend::new(cli.backend.config())?;
            let wall = backend.get_wall(*id)?;
            let out = out.clone().unwrap_or_else(|| PathBuf::from(format!("wall-{}.png", id)));
            fetch_and_render(&backend, &cli.render, wall, &format!("wall {}", id), out)
        }
        Command::Gallery { id, out } => {
            let backend = HttpBackend::new(cli.backend.config())?;
            let gallery = backend.get_gallery(*id)?;
            let out = out.clone().unwrap_or_else(|| PathBuf::from(format!("gallery-{}.png", id)));
            fetch_and_render(&backend, &cli.render, gallery, &format!("gallery {}", id), out)
        }
        Command::Page { source, out_dir } => run_page(&cli, source, out_dir),
        Command::Arrange {
            gallery_id,
            algorithm,
            save,
            out,
        } => {
            let backend = HttpBackend::new(cli.backend.config())?;
            let mut session = ArrangementSession::new(&backend, *gallery_id);
            let wall_id = session.show(*algorithm)?;
            println!("arranged gallery {} as wall {}", gallery_id, wall_id);
            if *save {
                session.save_current()?;
                println!("saved wall {}", wall_id);
            }
            let wall = session.fetch_current()?;
            let out = out.clone().unwrap_or_else(|| PathBuf::from(format!("wall-{}.png", wall_id)));
            fetch_and_render(&backend, &cli.render, wall, &format!("wall {}", wall_id), out)
        }
        Command::Save { wall_id } => {
            let backend = HttpBackend::new(cli.backend.config())?;
            let saved = backend.save_wall(*wall_id)?;
            println!("saved wall {}", saved);
            Ok(())
        }
        Command::Chart { kind, out_dir } => {
            let backend = HttpBackend::new(cli.backend.config())?;
            run_chart(&backend, *kind, out_dir, cli.render.width, cli.render.height)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("gallerywall: {:#}", e);
        std::process::exit(1);
    }
}
