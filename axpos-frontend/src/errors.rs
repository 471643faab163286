use axpos_core::GeometryError;
use axpos_engine::errors::EngineError;
use axpos_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("读取边界文件失败: {0}")]
    Load(#[from] IoError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("{0}")]
    Usage(String),
    #[error("命令执行失败: {0}")]
    Command(String),
    #[error("终端读写失败: {0}")]
    Terminal(#[from] std::io::Error),
}
