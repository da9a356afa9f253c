use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "catalogue")]
#[command(about = "手工芸品カタログ管理・PDFカタログ生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 商品JSONからPDFカタログを生成
    Export {
        /// 商品JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ファイル/ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 表紙タイトル
        #[arg(short, long, default_value = "THAI TRIBAL CRAFTS")]
        title: String,

        /// 出力する商品ID（カンマ区切り、入力順を維持）
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,

        /// PDF画像品質 (high/medium/low)。省略時は設定ファイルの値
        #[arg(long)]
        pdf_quality: Option<PdfQuality>,
    },

    /// ページごとのレイアウト計画を表示（PDFは生成しない）
    Plan {
        /// 商品JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// 商品JSONを検証
    Validate {
        /// 商品JSONファイル
        #[arg(required = true)]
        input: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// 画像取得タイムアウト（秒）を設定
        #[arg(long)]
        set_timeout: Option<u64>,

        /// 画像取得の同時実行数を設定
        #[arg(long)]
        set_concurrency: Option<usize>,

        /// ブランド名を設定
        #[arg(long)]
        set_brand: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 絞り込みオプション（"all" は条件なし）
#[derive(Args, Clone, Debug, Default)]
pub struct FilterArgs {
    /// 民族で絞り込み (Karen/Hmong/Lisu/Akha/Lahu/Yao/Other)
    #[arg(long)]
    pub tribe: Option<String>,

    /// カテゴリで絞り込み
    #[arg(long)]
    pub category: Option<String>,

    /// 商品名・ストーリーの部分一致
    #[arg(long)]
    pub search: Option<String>,

    /// おすすめ商品のみ
    #[arg(long)]
    pub featured_only: bool,
}

/// 商品画像をカタログPDFに埋め込む前の縮小・再圧縮プリセット
///
/// 取得した画像はこの最大幅まで縮小し、JPEGで再エンコードしてから
/// XObjectとして埋め込む（`image_loader::prepare_for_pdf`）。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfQuality {
    /// 印刷向け: 1400px, JPEG 85
    High,
    /// 画面閲覧向け（デフォルト）: 800px, JPEG 75
    #[default]
    Medium,
    /// メール添付向け: 500px, JPEG 60
    Low,
}

impl PdfQuality {
    pub const ALL: [PdfQuality; 3] = [PdfQuality::High, PdfQuality::Medium, PdfQuality::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            PdfQuality::High => "high",
            PdfQuality::Medium => "medium",
            PdfQuality::Low => "low",
        }
    }

    /// 埋め込み画像の最大ピクセル幅（これより広い画像だけ縮小）
    pub fn max_width(&self) -> u32 {
        match self {
            PdfQuality::High => 1400,
            PdfQuality::Medium => 800,
            PdfQuality::Low => 500,
        }
    }

    /// 再エンコード時のJPEG品質 (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            PdfQuality::High => 85,
            PdfQuality::Medium => 75,
            PdfQuality::Low => 60,
        }
    }
}

impl std::str::FromStr for PdfQuality {
    type Err = String;

    /// プリセット名か頭文字（`h` / `m` / `l`）を受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PdfQuality::ALL
            .into_iter()
            .find(|q| q.as_str() == wanted || q.as_str()[..1] == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = PdfQuality::ALL.iter().map(PdfQuality::as_str).collect();
                format!("画像品質 '{}' は不明です（{} のいずれか）", s, names.join(" / "))
            })
    }
}

impl std::fmt::Display for PdfQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}
