use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("商品データが不正: {0}")]
    Validation(String),

    #[error("カタログに載せる商品がありません")]
    EmptyCatalogue,

    #[error("カタログ生成エラー: {0}")]
    GenerationFailure(String),

    #[error("HTTPクライアント初期化エラー: {0}")]
    HttpClient(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] catalogue_common::Error),
}

pub type Result<T> = std::result::Result<T, CatalogueError>;
