use crate::cli::PdfQuality;
use crate::error::{CatalogueError, Result};
use catalogue_common::PlannerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// ヘッダー左端・表紙に使うブランド名
    pub brand_name: String,
    /// 画像1枚あたりの取得タイムアウト（秒）
    pub image_timeout_seconds: u64,
    /// 1ページ内の画像取得の同時実行数
    pub image_concurrency: usize,
    pub pdf_quality: PdfQuality,
    pub planner: PlannerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brand_name: "Thai Tribal Crafts".into(),
            image_timeout_seconds: 5,
            image_concurrency: 4,
            pdf_quality: PdfQuality::Medium,
            planner: PlannerConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 指定パスから読み込み（なければデフォルト）
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        // テスト・CI用の上書き
        if let Ok(path) = std::env::var("CRAFT_CATALOGUE_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| CatalogueError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("craft-catalogue").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_timeout_seconds == 0 {
            return Err(CatalogueError::Config("imageTimeoutSeconds は1以上にしてください".into()));
        }
        if self.image_concurrency == 0 {
            return Err(CatalogueError::Config("imageConcurrency は1以上にしてください".into()));
        }
        self.planner.validate()?;
        Ok(())
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_seconds)
    }

    pub fn set_image_timeout(&mut self, seconds: u64) -> Result<()> {
        self.image_timeout_seconds = seconds;
        self.save()
    }

    pub fn set_image_concurrency(&mut self, concurrency: usize) -> Result<()> {
        self.image_concurrency = concurrency;
        self.save()
    }

    pub fn set_brand_name(&mut self, name: String) -> Result<()> {
        self.brand_name = name;
        self.save()
    }
}
