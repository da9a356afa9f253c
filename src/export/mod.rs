pub mod canvas;
pub mod card;
pub mod context;
pub mod image_loader;
pub mod pdf;

use crate::error::Result;
use catalogue_common::ProductRecord;
use chrono::NaiveDate;
use image_loader::ImageFetcher;
use pdf::{CatalogueOptions, CatalogueOutput};
use std::path::{Path, PathBuf};

pub const FILE_PREFIX: &str = "thai-tribal-crafts-catalogue";

/// 既定の出力ファイル名: `thai-tribal-crafts-catalogue-YYYY-MM-DD.pdf`
pub fn catalogue_file_name(date: NaiveDate) -> String {
    format!("{}-{}.pdf", FILE_PREFIX, date.format("%Y-%m-%d"))
}

/// 出力先がディレクトリ（または拡張子なし）なら既定のファイル名を付ける
pub fn output_path_for(output: &Path, date: NaiveDate) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(catalogue_file_name(date))
    } else {
        output.to_path_buf()
    }
}

/// 生成してファイルに書き出す。失敗時はファイルを作らない
pub async fn export_catalogue<F: ImageFetcher>(
    products: &[ProductRecord],
    options: &CatalogueOptions,
    fetcher: &F,
    output: &Path,
) -> Result<(PathBuf, CatalogueOutput)> {
    let output_path = output_path_for(output, options.generated_on);
    let catalogue = pdf::generate_catalogue(products, options, fetcher).await?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&output_path, &catalogue.bytes).await?;
    log::info!("PDF出力: {} ({} bytes)", output_path.display(), catalogue.bytes.len());

    Ok((output_path, catalogue))
}
