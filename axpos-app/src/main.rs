use std::io;
use std::path::PathBuf;

use axpos_config::AppConfig;
use axpos_frontend::loader::StartupOptions;
use axpos_io::{LayoutSaver, StreamFacade};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 交互式调整图幅中各坐标轴的位置。
#[derive(Debug, Parser)]
#[command(name = "axpos", version)]
struct Cli {
    /// 图幅宽度（英寸）
    #[arg(short = 'W', long)]
    width: Option<f64>,
    /// 图幅高度（英寸）
    #[arg(short = 'H', long)]
    height: Option<f64>,
    /// 锚点名称（如 C、SW、NE）或 `ax,ay`
    #[arg(short, long)]
    anchor: Option<String>,
    /// 初始边界文件（`FIG: w,h` + 每行 `xll,yll,w,h`）
    #[arg(short, long)]
    bounds: Option<PathBuf>,
    /// 结束时以流格式输出边界
    #[arg(long)]
    stream_bounds: bool,
    /// 结束时把边界流写入文件
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 指定配置文件
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let config = load_configuration(cli.config.clone());
    init_logging(&config);
    info!("启动 axpos 编辑器");

    let options = StartupOptions {
        width: cli.width,
        height: cli.height,
        anchor: cli.anchor.clone(),
        bounds_path: cli.bounds.clone(),
    };

    let stdin = io::stdin();
    let layout = match axpos_frontend::run_console(&config, &options, stdin.lock(), io::stdout())
    {
        Ok(layout) => layout,
        Err(err) => {
            error!(error = %err, "编辑器运行失败");
            std::process::exit(1);
        }
    };

    if let Some(path) = &cli.output {
        if let Err(err) = StreamFacade::new().save(&layout, path) {
            error!(path = %path.display(), error = %err, "写出边界文件失败");
            std::process::exit(1);
        }
        info!(path = %path.display(), "边界已写出");
    }

    let stream = cli.stream_bounds || config.editor.stream_bounds;
    print!("{}", axpos_frontend::render_layout(&layout, stream));
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    let loaded = match &override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    };
    loaded.unwrap_or_else(|err| {
        warn!(error = %err, "加载配置失败，使用内建默认值");
        AppConfig::default()
    })
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout 保留给编辑器输出与最终边界
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
