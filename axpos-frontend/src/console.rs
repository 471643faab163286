use std::io::{BufRead, Write};

use axpos_config::EditorConfig;
use axpos_core::layout::GridSpec;
use axpos_core::{Anchor, Bounds, FigureSize};
use axpos_engine::command::{CommandBus, CommandContext, CommandRequest};
use axpos_engine::rect_set::{Property, RectSet};
use axpos_io::Layout;
use tracing::{debug, warn};

use crate::errors::FrontendError;

const HELP: &str = "\
list                         列出全部轴
add XLL YLL W H              以绝对边界添加
add-at X Y [W H]             以锚点相对位置添加
grid ROWS COLS [INDEX..]     按网格添加（默认全部单元）
set NAME x|y|w|h|aspect V    修改属性
lock NAME on|off             锁定长宽比
select NAME [on|off]         选中 / 取消选中
anchor NAME|AX,AY            更换锚点
figsize W H                  修改图幅尺寸（英寸）
order NAME..                 按给定顺序重排
move TARGET ROW..            把若干行移动到 TARGET 之前
pop NAME                     删除指定轴
clear                        删除全部轴
help                         显示帮助
quit                         结束编辑";

/// 单行命令的执行结果。
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Output(String),
    Quit,
}

/// 基于文本命令的轴位置编辑器。复合操作转交 [`CommandBus`]。
pub struct ConsoleEditor {
    rects: RectSet,
    bus: CommandBus,
    default_size: (f64, f64),
}

impl ConsoleEditor {
    pub fn new(rects: RectSet, config: &EditorConfig) -> Self {
        Self {
            rects,
            bus: CommandBus::new(),
            default_size: (config.default_width, config.default_height),
        }
    }

    #[inline]
    pub fn rects(&self) -> &RectSet {
        &self.rects
    }

    /// 当前图幅与边界，供退出时输出。
    pub fn layout(&self) -> Layout {
        Layout {
            figsize: Some(self.rects.figure()),
            bounds: self.rects.bounds_list(),
        }
    }

    /// 逐行读取命令直到 `quit` 或输入结束。单条命令出错不会中断会话。
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<(), FrontendError> {
        for line in input.lines() {
            let line = line?;
            match self.execute_line(&line) {
                Ok(LineOutcome::Quit) => break,
                Ok(LineOutcome::Output(text)) => {
                    if !text.is_empty() {
                        writeln!(output, "{text}")?;
                    }
                }
                Err(err) => {
                    warn!(line = line.as_str(), error = %err, "命令执行失败");
                    writeln!(output, "错误: {err}")?;
                }
            }
        }
        output.flush()?;
        Ok(())
    }

    pub fn execute_line(&mut self, line: &str) -> Result<LineOutcome, FrontendError> {
        let mut tokens = line.split_whitespace();
        let Some(command) = tokens.next() else {
            return Ok(LineOutcome::Output(String::new()));
        };
        if command.starts_with('#') {
            return Ok(LineOutcome::Output(String::new()));
        }
        let args: Vec<&str> = tokens.collect();
        debug!(command, ?args, "执行控制台命令");

        let text = match command {
            "quit" | "exit" => return Ok(LineOutcome::Quit),
            "help" => format!("{HELP}\n复合操作: {}", self.bus.available_commands().join(", ")),
            "list" | "ls" => self.render_table(),
            "add" => {
                let [xll, yll, w, h] = numbers::<4>(&args, "add XLL YLL W H")?;
                let name = self.rects.add(Bounds::new(xll, yll, w, h))?;
                format!("已添加 {name}")
            }
            "add-at" => {
                let (x, y, w, h) = match args.len() {
                    2 => {
                        let [x, y] = numbers::<2>(&args, "add-at X Y [W H]")?;
                        (x, y, self.default_size.0, self.default_size.1)
                    }
                    _ => {
                        let [x, y, w, h] = numbers::<4>(&args, "add-at X Y [W H]")?;
                        (x, y, w, h)
                    }
                };
                let name = self.rects.add_at_position(x, y, w, h)?;
                format!("已添加 {name}")
            }
            "grid" => {
                let usage = "grid ROWS COLS [INDEX..]";
                if args.len() < 2 {
                    return Err(usage_error(usage));
                }
                let indices: Vec<usize> = args
                    .iter()
                    .map(|raw| parse_usize(raw, usage))
                    .collect::<Result<_, _>>()?;
                let spec = GridSpec::new(indices[0], indices[1]);
                let names = self.rects.add_grid(&spec, &indices[2..])?;
                format!("已添加 {}", names.join(", "))
            }
            "set" => {
                let usage = "set NAME x|y|w|h|aspect VALUE";
                let [name, property, value] = words::<3>(&args, usage)?;
                let property: Property = property.parse()?;
                let value = parse_f64(value, usage)?;
                self.rects.set_property(name, property, value)?;
                format!("{name}.{property} = {value}")
            }
            "lock" => {
                let usage = "lock NAME on|off";
                let [name, flag] = words::<2>(&args, usage)?;
                let locked = parse_flag(flag, usage)?;
                self.rects.set_lock_aspect(name, locked)?;
                format!("{name} 长宽比{}", if locked { "已锁定" } else { "已解锁" })
            }
            "select" => {
                let usage = "select NAME [on|off]";
                let (name, selected) = match args.as_slice() {
                    [name] => (*name, true),
                    [name, flag] => (*name, parse_flag(flag, usage)?),
                    _ => return Err(usage_error(usage)),
                };
                self.rects.select(name, selected)?;
                format!("已选中: {}", self.rects.selected_names().join(", "))
            }
            "anchor" => {
                if args.is_empty() {
                    return Err(usage_error("anchor NAME|AX,AY"));
                }
                let anchor: Anchor = args.concat().parse()?;
                self.rects.set_anchor(anchor);
                format!("锚点 = {anchor}")
            }
            "figsize" => {
                let [width, height] = numbers::<2>(&args, "figsize W H")?;
                self.rects.set_figure(FigureSize::new(width, height)?);
                format!("图幅 = {width:.2} x {height:.2}")
            }
            "order" => {
                self.rects.change_order(&args)?;
                format!("顺序: {}", self.rects.names().join(", "))
            }
            "move" => {
                let usage = "move TARGET ROW..";
                if args.len() < 2 {
                    return Err(usage_error(usage));
                }
                let target = parse_usize(args[0], usage)?;
                let rows: Vec<usize> = args[1..]
                    .iter()
                    .map(|raw| parse_usize(raw, usage))
                    .collect::<Result<_, _>>()?;
                self.rects.move_rows(&rows, target)?;
                format!("顺序: {}", self.rects.names().join(", "))
            }
            "pop" => {
                let [name] = words::<1>(&args, "pop NAME")?;
                let entry = self.rects.pop(name)?;
                format!("已删除 {}", entry.name())
            }
            "clear" => {
                self.rects.clear();
                "已清空".to_string()
            }
            other => {
                if !self.bus.contains(other) {
                    return Err(usage_error(&format!("未知命令: {other}，输入 help 查看帮助")));
                }
                let request = CommandRequest::with_args(other, args.iter().copied());
                let mut context = CommandContext {
                    rects: &mut self.rects,
                };
                let response = self.bus.dispatch(&request, &mut context);
                let message = response.message.unwrap_or_default();
                if !response.success {
                    return Err(FrontendError::Command(message));
                }
                message
            }
        };
        Ok(LineOutcome::Output(text))
    }

    fn render_table(&self) -> String {
        let figure = self.rects.figure();
        let mut lines = vec![
            format!(
                "figure {:.2} x {:.2}, anchor {}",
                figure.width(),
                figure.height(),
                self.rects.anchor()
            ),
            format!(
                "{:<4} {:>7} {:>7} {:>7} {:>7} {:>7}  flags",
                "name", "x", "y", "w", "h", "aspect"
            ),
        ];
        for entry in self.rects.iter() {
            let rect = entry.geometry(self.rects.anchor());
            let aspect = rect
                .aspect(figure)
                .map(|value| format!("{value:.3}"))
                .unwrap_or_else(|_| "-".to_string());
            let mut flags = Vec::new();
            if entry.is_selected() {
                flags.push("selected");
            }
            if entry.is_aspect_locked() {
                flags.push("locked");
            }
            lines.push(format!(
                "{:<4} {:>7.3} {:>7.3} {:>7.3} {:>7.3} {:>7}  {}",
                entry.name(),
                rect.x(),
                rect.y(),
                rect.w(),
                rect.h(),
                aspect,
                flags.join(",")
            ));
        }
        lines.join("\n")
    }
}

fn usage_error(usage: &str) -> FrontendError {
    FrontendError::Usage(format!("用法: {usage}"))
}

fn words<'a, const N: usize>(args: &[&'a str], usage: &str) -> Result<[&'a str; N], FrontendError> {
    <[&str; N]>::try_from(args).map_err(|_| usage_error(usage))
}

fn numbers<const N: usize>(args: &[&str], usage: &str) -> Result<[f64; N], FrontendError> {
    let words = words::<N>(args, usage)?;
    let mut values = [0.0; N];
    for (slot, raw) in values.iter_mut().zip(words) {
        *slot = parse_f64(raw, usage)?;
    }
    Ok(values)
}

fn parse_f64(raw: &str, usage: &str) -> Result<f64, FrontendError> {
    raw.parse::<f64>()
        .map_err(|_| FrontendError::Usage(format!("无效数值 `{raw}`，用法: {usage}")))
}

fn parse_usize(raw: &str, usage: &str) -> Result<usize, FrontendError> {
    raw.parse::<usize>()
        .map_err(|_| FrontendError::Usage(format!("无效整数 `{raw}`，用法: {usage}")))
}

fn parse_flag(raw: &str, usage: &str) -> Result<bool, FrontendError> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(usage_error(usage)),
    }
}

#[cfg(test)]
mod tests {
    use axpos_engine::errors::EngineError;

    use super::*;

    fn editor() -> ConsoleEditor {
        let rects = RectSet::new(FigureSize::new(6.0, 6.0).unwrap(), Anchor::C);
        ConsoleEditor::new(rects, &EditorConfig::default())
    }

    fn run_script(editor: &mut ConsoleEditor, script: &str) -> String {
        let mut output = Vec::new();
        editor.run(script.as_bytes(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn add_and_list_show_anchor_relative_values() {
        let mut editor = editor();
        let output = run_script(&mut editor, "add 0.1 0.1 0.8 0.8\nlist\n");
        assert!(output.contains("已添加 A"));
        assert!(output.contains("anchor C"));
        assert!(output.contains("A      0.500   0.500   0.800   0.800   1.000"));
    }

    #[test]
    fn add_at_uses_configured_default_size() {
        let mut editor = editor();
        editor.execute_line("add-at 0.5 0.5").unwrap();
        let bounds = editor.rects().bounds_list();
        assert!(bounds[0].approx_eq(&Bounds::new(0.3, 0.3, 0.4, 0.4), 1e-9));
    }

    #[test]
    fn split_then_join_through_the_bus() {
        let mut editor = editor();
        let script = "\
anchor SW
add 0 0 1 1
select A
split 0.5 0.1 h
select_all
join
quit
add 0 0 0.1 0.1
";
        let output = run_script(&mut editor, script);
        assert!(output.contains("新增 B"), "{output}");
        assert_eq!(editor.rects().len(), 1);
        assert!(
            editor.rects().bounds_list()[0].approx_eq(&Bounds::new(0.0, 0.0, 1.0, 1.0), 1e-9)
        );
    }

    #[test]
    fn errors_are_reported_and_session_continues() {
        let mut editor = editor();
        let output = run_script(
            &mut editor,
            "add 0 0 1 1\nselect A\nsplit 0.5 1.5\nset A depth 1\nfrobnicate\nlist\n",
        );
        assert!(output.contains("错误: 命令执行失败"), "{output}");
        assert!(output.contains("unsupported property `depth`"), "{output}");
        assert!(output.contains("未知命令: frobnicate"), "{output}");
        assert_eq!(editor.rects().len(), 1);
        assert!(output.contains("selected"));
    }

    #[test]
    fn reorder_and_move_rows() {
        let mut editor = editor();
        for _ in 0..3 {
            editor.execute_line("add 0 0 0.1 0.1").unwrap();
        }
        editor.execute_line("order C B A").unwrap();
        assert_eq!(editor.rects().names(), vec!["C", "B", "A"]);
        editor.execute_line("move 0 2").unwrap();
        assert_eq!(editor.rects().names(), vec!["A", "C", "B"]);
        assert!(matches!(
            editor.execute_line("move 0 5"),
            Err(FrontendError::Engine(EngineError::RowOutOfRange { row: 5, len: 3 }))
        ));
        assert_eq!(editor.rects().names(), vec!["A", "C", "B"]);
        assert!(matches!(
            editor.execute_line("order A B"),
            Err(FrontendError::Engine(_))
        ));
    }

    #[test]
    fn figure_and_lock_commands_update_state() {
        let mut editor = editor();
        editor.execute_line("add 0 0 0.8 0.4").unwrap();
        editor.execute_line("figsize 8 4").unwrap();
        editor.execute_line("lock A on").unwrap();
        editor.execute_line("set A w 0.4").unwrap();
        let layout = editor.layout();
        assert_eq!(layout.figsize, Some(FigureSize::new(8.0, 4.0).unwrap()));
        assert!(layout.bounds[0].approx_eq(&Bounds::new(0.2, 0.1, 0.4, 0.2), 1e-9));
    }

    #[test]
    fn grid_adds_cells_and_anchor_accepts_pairs() {
        let mut editor = editor();
        let outcome = editor.execute_line("grid 2 2 0 3").unwrap();
        assert_eq!(outcome, LineOutcome::Output("已添加 A, B".to_string()));
        editor.execute_line("anchor 0.25, 0.75").unwrap();
        assert_eq!(editor.rects().anchor(), Anchor::new(0.25, 0.75).unwrap());
        assert!(editor.execute_line("grid 2").is_err());
    }
}
