use std::collections::HashMap;

use axpos_core::SplitAxis;
use tracing::debug;

use crate::errors::EngineError;
use crate::rect_set::RectSet;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

impl From<EngineError> for CommandResponse {
    fn from(value: EngineError) -> Self {
        CommandResponse::err(value.to_string())
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub rects: &'a mut RectSet,
}

/// 以名称分发的选中集操作，对应编辑器中的 “Actions” 列表。
pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(SelectionCommand::new("align_x", "x 已对齐", RectSet::align_x));
        bus.register(SelectionCommand::new("align_y", "y 已对齐", RectSet::align_y));
        bus.register(SelectionCommand::new(
            "equal_width",
            "宽度已统一",
            RectSet::equal_width,
        ));
        bus.register(SelectionCommand::new(
            "equal_height",
            "高度已统一",
            RectSet::equal_height,
        ));
        bus.register(SelectionCommand::new(
            "equal_aspect",
            "长宽比已统一",
            RectSet::equal_aspect,
        ));
        bus.register(JoinCommand);
        bus.register(SplitCommand);
        bus.register(DeleteSelectedCommand);
        bus.register(SelectAllCommand);
        bus.register(SelectNoneCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            let response = handler.execute(request, context);
            debug!(
                command = request.name.as_str(),
                args = ?request.args,
                success = response.success,
                "命令已执行"
            );
            response
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    /// 已注册命令名，按字母排序。
    pub fn available_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

type SelectionAction = fn(&mut RectSet) -> Result<usize, EngineError>;

/// 以第一个选中项为参照、无参数的复合操作。
struct SelectionCommand {
    name: &'static str,
    summary: &'static str,
    action: SelectionAction,
}

impl SelectionCommand {
    fn new(name: &'static str, summary: &'static str, action: SelectionAction) -> Self {
        Self {
            name,
            summary,
            action,
        }
    }
}

impl CommandHandler for SelectionCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match (self.action)(context.rects) {
            Ok(count) => CommandResponse::ok(format!("{}（{count} 个）", self.summary)),
            Err(err) => err.into(),
        }
    }
}

struct JoinCommand;

impl CommandHandler for JoinCommand {
    fn name(&self) -> &'static str {
        "join"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match context.rects.join() {
            Some(name) => CommandResponse::ok(format!("选中项已合并为 {name}")),
            None => CommandResponse::ok("没有选中项"),
        }
    }
}

/// `split [ratio] [spacing] [h|v]`，默认 0.5 / 0.1 / 水平。
struct SplitCommand;

impl SplitCommand {
    fn parse_args(args: &[String]) -> Result<(f64, f64, SplitAxis), String> {
        let number = |index: usize, default: f64| -> Result<f64, String> {
            match args.get(index) {
                Some(raw) => raw
                    .parse::<f64>()
                    .map_err(|_| format!("无效数值: {raw}")),
                None => Ok(default),
            }
        };
        let ratio = number(0, 0.5)?;
        let spacing = number(1, 0.1)?;
        let axis = match args.get(2) {
            Some(raw) => raw.parse::<SplitAxis>().map_err(|err| err.to_string())?,
            None => SplitAxis::Horizontal,
        };
        Ok((ratio, spacing, axis))
    }
}

impl CommandHandler for SplitCommand {
    fn name(&self) -> &'static str {
        "split"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let (ratio, spacing, axis) = match Self::parse_args(&request.args) {
            Ok(parsed) => parsed,
            Err(message) => return CommandResponse::err(message),
        };
        match context.rects.split(ratio, spacing, axis) {
            Ok(created) if created.is_empty() => CommandResponse::ok("没有选中项"),
            Ok(created) => CommandResponse::ok(format!("已拆分，新增 {}", created.join(", "))),
            Err(err) => err.into(),
        }
    }
}

struct DeleteSelectedCommand;

impl CommandHandler for DeleteSelectedCommand {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let removed = context.rects.delete_selected();
        CommandResponse::ok(format!("已删除 {} 个", removed.len()))
    }
}

struct SelectAllCommand;

impl CommandHandler for SelectAllCommand {
    fn name(&self) -> &'static str {
        "select_all"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.rects.select_all();
        CommandResponse::ok("已全选")
    }
}

struct SelectNoneCommand;

impl CommandHandler for SelectNoneCommand {
    fn name(&self) -> &'static str {
        "select_none"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.rects.select_none();
        CommandResponse::ok("选中集已清空")
    }
}
