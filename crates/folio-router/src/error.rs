use folio_core::RegistryError;
use folio_llm::LLMError;
use folio_profile::FetchError;
use folio_session::SessionError;
use folio_tool::ToolError;
use thiserror::Error;

/// 补全调用失败
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("completion provider failed: {0}")]
    Provider(#[from] LLMError),

    #[error("completion returned no text")]
    EmptyOutput,

    #[error("model was still requesting tools after {rounds} round(s)")]
    ToolRoundsExhausted { rounds: usize },

    #[error("tool setup failed: {0}")]
    Tools(#[from] ToolError),
}

/// 单轮处理中可能出现的失败，最终都会转成给用户的错误文本
#[derive(Error, Debug)]
pub enum TurnError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// 会话服务层错误（不属于某一轮）
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Agent registry error: {0}")]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, RouterError>;
