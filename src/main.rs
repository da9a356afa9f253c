use anyhow::{bail, Context};
use catalogue_common::{content_weight, plan_catalogue, ProductFilter};
use chrono::Local;
use clap::Parser;
use craft_catalogue::{catalog, cli, config, error, export};
use cli::{Cli, Commands, FilterArgs};
use config::Config;
use export::image_loader::HttpFetcher;
use export::pdf::CatalogueOptions;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load().context("設定ファイルを読み込めません")?;

    match cli.command {
        Commands::Export { input, output, title, ids, filter, pdf_quality } => {
            println!("📄 craft-catalogue - PDFカタログ生成\n");

            // 1. 商品読み込み
            println!("[1/3] 商品データを読み込み中...");
            let products = catalog::load_products(&input)
                .with_context(|| format!("{} を読み込めません", input.display()))?;
            let filter = product_filter(&filter)?;
            let selected = catalog::select_products(&products, &filter, &ids);
            println!("✔ {}件中{}件を掲載\n", products.len(), selected.len());

            if selected.is_empty() {
                return Err(error::CatalogueError::EmptyCatalogue.into());
            }

            // 2. PDF生成
            let quality = pdf_quality.unwrap_or(config.pdf_quality);
            println!("[2/3] PDFを生成中... (品質: {})", quality);
            let options = CatalogueOptions {
                brand_name: config.brand_name.clone(),
                title,
                generated_on: Local::now().date_naive(),
                quality,
                concurrency: config.image_concurrency,
                planner: config.planner.clone(),
            };
            let fetcher = HttpFetcher::new(config.image_timeout())?;
            let output = output.unwrap_or_else(|| PathBuf::from("."));

            let spinner = spinner("画像を取得してページを組み立て中...");
            let result = export::export_catalogue(&selected, &options, &fetcher, &output).await;
            spinner.finish_and_clear();
            let (path, catalogue) = result?;
            println!("✔ PDF出力: {}\n", path.display());

            // 3. 概要
            println!("[3/3] 概要");
            println!("  ページ数: {}（商品ページ {}）", catalogue.content_pages + 2, catalogue.content_pages);
            println!("  画像プレースホルダー: {}", catalogue.placeholders);
            println!("  サイズ: {} bytes", catalogue.bytes.len());
            println!("  SHA-256: {}", hex::encode(Sha256::digest(&catalogue.bytes)));

            println!("\n✅ エクスポート完了");
        }

        Commands::Plan { input, filter } => {
            let products = catalog::load_products(&input)
                .with_context(|| format!("{} を読み込めません", input.display()))?;
            let filter = product_filter(&filter)?;
            let selected = catalog::select_products(&products, &filter, &[]);
            if selected.is_empty() {
                return Err(error::CatalogueError::EmptyCatalogue.into());
            }

            let plans = plan_catalogue(&selected, &config.planner);
            println!("📐 レイアウト計画: {}件 → {}ページ\n", selected.len(), plans.len());

            let mut cursor = 0;
            for (page, plan) in plans.iter().enumerate() {
                let page_products = &selected[cursor..cursor + plan.products_on_page];
                println!("  {:>3}. {:<12} {}件", page + 1, plan.layout_type, plan.products_on_page);
                for product in page_products {
                    println!("       - {} (重み {:.0})", product.label(), content_weight(product));
                }
                cursor += plan.products_on_page;
            }
        }

        Commands::Validate { input } => {
            let (total, issues) = catalog::inspect_products(&input)
                .with_context(|| format!("{} を読み込めません", input.display()))?;

            if issues.is_empty() {
                println!("✔ {}件すべて問題なし", total);
            } else {
                println!("✘ {}件中{}件に不備があります\n", total, issues.len());
                for issue in &issues {
                    println!("  #{} ({})", issue.index, issue.label);
                    for message in &issue.messages {
                        println!("    - {}", message);
                    }
                }
                bail!("商品データの検証に失敗しました");
            }
        }

        Commands::Config { set_timeout, set_concurrency, set_brand, show } => {
            let mut config = config;

            if let Some(seconds) = set_timeout {
                config.set_image_timeout(seconds)?;
                println!("✔ 画像取得タイムアウトを{}秒に設定しました", seconds);
            }

            if let Some(concurrency) = set_concurrency {
                config.set_image_concurrency(concurrency)?;
                println!("✔ 画像取得の同時実行数を{}に設定しました", concurrency);
            }

            if let Some(brand) = set_brand {
                config.set_brand_name(brand)?;
                println!("✔ ブランド名を設定しました");
            }

            if show {
                println!("設定: {}", Config::config_path()?.display());
                println!("  ブランド名: {}", config.brand_name);
                println!("  画像タイムアウト: {}秒", config.image_timeout_seconds);
                println!("  同時実行数: {}", config.image_concurrency);
                println!("  PDF品質: {}", config.pdf_quality);
                println!(
                    "  レイアウト閾値: {} / {}（サンプル{}件）",
                    config.planner.light_threshold, config.planner.heavy_threshold, config.planner.sample_window
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn product_filter(args: &FilterArgs) -> anyhow::Result<ProductFilter> {
    let filter = ProductFilter::from_parts(
        args.tribe.as_deref(),
        args.category.as_deref(),
        args.search.as_deref(),
        args.featured_only,
    )
    .context("絞り込み条件が不正です")?;
    Ok(filter)
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
