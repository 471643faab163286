pub mod console;
pub mod errors;
pub mod loader;

use std::io::{BufRead, Write};

use axpos_config::AppConfig;
use axpos_io::{Layout, format_bounds_list, write_stream};
use console::ConsoleEditor;
use errors::FrontendError;
use loader::{LayoutSource, StartupOptions, load_rect_set};
use tracing::info;

/// 启动控制台编辑器，会话结束后返回最终图幅与边界。
pub fn run_console<R: BufRead, W: Write>(
    config: &AppConfig,
    options: &StartupOptions,
    input: R,
    output: W,
) -> Result<Layout, FrontendError> {
    let loaded = load_rect_set(config, options)?;
    match &loaded.source {
        LayoutSource::File(path) => {
            info!(path = %path.display(), count = loaded.rects.len(), "以已有边界启动编辑器");
        }
        LayoutSource::Empty => info!("以空图幅启动编辑器"),
    }

    let mut editor = ConsoleEditor::new(loaded.rects, &config.editor);
    editor.run(input, output)?;
    Ok(editor.layout())
}

/// 结束时的输出：流格式可被再次读取，否则为便于阅读的列表。
pub fn render_layout(layout: &Layout, stream: bool) -> String {
    if stream {
        return write_stream(layout);
    }
    let mut out = String::new();
    if let Some(figure) = layout.figsize {
        out.push_str(&format!(
            "figsize: {:.2}, {:.2}\n",
            figure.width(),
            figure.height()
        ));
    }
    out.push_str(&format_bounds_list(&layout.bounds));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use axpos_core::{Bounds, FigureSize};

    use super::*;

    #[test]
    fn console_session_returns_final_layout() {
        let mut output = Vec::new();
        let layout = run_console(
            &AppConfig::default(),
            &StartupOptions::default(),
            "add 0.1 0.1 0.3 0.3\nadd 0.5 0.5 0.3 0.3\npop A\n".as_bytes(),
            &mut output,
        )
        .unwrap();
        assert_eq!(layout.bounds, vec![Bounds::new(0.5, 0.5, 0.3, 0.3)]);
        assert_eq!(layout.figsize, Some(FigureSize::new(8.0, 6.0).unwrap()));
    }

    #[test]
    fn render_layout_in_both_formats() {
        let layout = Layout {
            figsize: Some(FigureSize::new(8.0, 6.0).unwrap()),
            bounds: vec![Bounds::new(0.1, 0.1, 0.8, 0.8)],
        };
        assert_eq!(
            render_layout(&layout, false),
            "figsize: 8.00, 6.00\n[(0.10, 0.10, 0.80, 0.80)]\n"
        );
        assert_eq!(render_layout(&layout, true), "FIG: 8,6\n0.1,0.1,0.8,0.8\n");
    }
}
