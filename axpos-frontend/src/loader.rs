use std::path::PathBuf;

use axpos_config::AppConfig;
use axpos_core::{Anchor, FigureSize};
use axpos_engine::rect_set::RectSet;
use axpos_io::{Layout, LayoutLoader, StreamFacade};
use tracing::info;

use crate::errors::FrontendError;

/// 命令行传入的启动参数，未给出的项回退到边界文件或配置。
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub anchor: Option<String>,
    pub bounds_path: Option<PathBuf>,
}

/// 初始边界来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutSource {
    File(PathBuf),
    Empty,
}

#[derive(Debug)]
pub struct LoadedSet {
    pub rects: RectSet,
    pub source: LayoutSource,
}

/// 组装初始集合。图幅尺寸优先级：命令行 > 边界文件中的 `FIG:` 行 > 配置。
pub fn load_rect_set(
    config: &AppConfig,
    options: &StartupOptions,
) -> Result<LoadedSet, FrontendError> {
    let (layout, source) = match &options.bounds_path {
        Some(path) => {
            let layout = StreamFacade::new().load(path)?;
            info!(path = %path.display(), count = layout.bounds.len(), "已读取初始边界");
            (layout, LayoutSource::File(path.clone()))
        }
        None => (Layout::default(), LayoutSource::Empty),
    };

    let base = match layout.figsize {
        Some(figure) => figure,
        None => FigureSize::new(config.figure.width, config.figure.height)?,
    };
    let figure = FigureSize::new(
        options.width.unwrap_or(base.width()),
        options.height.unwrap_or(base.height()),
    )?;

    let anchor: Anchor = options
        .anchor
        .as_deref()
        .unwrap_or(config.figure.anchor.as_str())
        .parse()?;

    let rects = RectSet::from_bounds(figure, layout.bounds, anchor)?;
    Ok(LoadedSet { rects, source })
}
