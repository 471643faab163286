use std::fs;
use std::path::{Path, PathBuf};

use axpos_core::{Bounds, FigureSize};
use serde::Serialize;
use thiserror::Error;

const FIGURE_PREFIX: &str = "FIG:";

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    InvalidLine { line: usize, message: String },
}

/// 边界流的内容：可选的图幅尺寸与按顺序排列的边界。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub figsize: Option<FigureSize>,
    pub bounds: Vec<Bounds>,
}

pub trait LayoutLoader {
    fn load(&self, path: &Path) -> Result<Layout, IoError>;
}

pub trait LayoutSaver {
    fn save(&self, layout: &Layout, path: &Path) -> Result<(), IoError>;
}

/// 文本边界流：可选 `FIG: w,h` 行，其后每行一个 `xll,yll,w,h`。
pub struct StreamFacade;

impl StreamFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StreamFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutLoader for StreamFacade {
    fn load(&self, path: &Path) -> Result<Layout, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        parse_stream(&data)
    }
}

impl LayoutSaver for StreamFacade {
    fn save(&self, layout: &Layout, path: &Path) -> Result<(), IoError> {
        fs::write(path, write_stream(layout)).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// 解析边界流，空行忽略。
pub fn parse_stream(input: &str) -> Result<Layout, IoError> {
    let mut layout = Layout::default();
    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(FIGURE_PREFIX) {
            let [width, height] = parse_numbers::<2>(rest, line_no)?;
            let figure = FigureSize::new(width, height).map_err(|err| IoError::InvalidLine {
                line: line_no,
                message: err.to_string(),
            })?;
            layout.figsize = Some(figure);
        } else {
            let [xll, yll, w, h] = parse_numbers::<4>(line, line_no)?;
            layout.bounds.push(Bounds::new(xll, yll, w, h));
        }
    }
    Ok(layout)
}

/// 以完整精度写出边界流，可无损回读。
pub fn write_stream(layout: &Layout) -> String {
    let mut out = String::new();
    if let Some(figure) = layout.figsize {
        out.push_str(&format!(
            "{FIGURE_PREFIX} {},{}\n",
            figure.width(),
            figure.height()
        ));
    }
    for bnd in &layout.bounds {
        let [xll, yll, w, h] = bnd.to_array();
        out.push_str(&format!("{xll},{yll},{w},{h}\n"));
    }
    out
}

/// 便于阅读的列表形式，保留两位小数：
///
/// ```text
/// [(0.10, 0.10, 0.80, 0.80),
///  (0.20, 0.20, 0.30, 0.30)]
/// ```
pub fn format_bounds_list(bounds: &[Bounds]) -> String {
    let items: Vec<String> = bounds.iter().map(|bnd| format!("({bnd})")).collect();
    format!("[{}]", items.join(",\n "))
}

fn parse_numbers<const N: usize>(raw: &str, line: usize) -> Result<[f64; N], IoError> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(IoError::InvalidLine {
            line,
            message: format!("expected {N} comma separated values, got {}", parts.len()),
        });
    }
    let mut values = [0.0; N];
    for (slot, part) in values.iter_mut().zip(parts) {
        *slot = part.parse::<f64>().map_err(|_| IoError::InvalidLine {
            line,
            message: format!("`{part}` is not a number"),
        })?;
    }
    Ok(values)
}
