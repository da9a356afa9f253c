//! カタログPDFの組み立て
//!
//! 表紙 → 商品ページ（0枚以上）→ 締めページ → 確定 の順でしか進まない。
//! 順序違反は `GenerationFailure`。

use super::canvas::{Align, EmbeddedImage, PageCanvas};
use super::card::render_card;
use super::context::{RenderContext, SECTION_TITLE};
use super::image_loader::{load_images, ImageFetcher, ImageOutcome};
use crate::cli::PdfQuality;
use crate::error::{CatalogueError, Result};
use catalogue_common::export::card_core::MAX_THUMBNAILS;
use catalogue_common::layout::{HEADER_BASELINE_MM, HEADER_RULE_MM};
use catalogue_common::text::TextFont;
use catalogue_common::{plan_page, PageLayoutPlan, PlannerConfig, ProductRecord};
use chrono::NaiveDate;
use printpdf::date::DateTime;
use printpdf::{PdfDocument, PdfSaveOptions, XObject, XObjectId};
use sha2::{Digest, Sha256};

// 表紙（上からのmm）
const COVER_TITLE_Y: f64 = 100.0;
const COVER_SUBTITLE_Y: f64 = 115.0;
const COVER_RULE_Y: [f64; 2] = [125.0, 127.0];
const COVER_RULE_INSET: f64 = 50.0;
const COVER_DATE_Y: f64 = 140.0;

const CLOSING_HEADING: &str = "THANK YOU";
const CLOSING_MESSAGE: &str = "For supporting traditional craftsmanship and cultural preservation";

// printpdfが書くトレーラー /ID の各文字列長
const TRAILER_ID_LEN: usize = 32;

/// 組み立ての進行状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    Empty,
    Cover,
    Content,
    Closing,
    Finalized,
}

/// 1回の生成ごとに作る。ドキュメントはこの構造体だけが持つ
pub struct CatalogueAssembler {
    ctx: RenderContext,
    doc: PdfDocument,
    pages: Vec<PageCanvas>,
    state: AssemblyState,
    page_number: usize,
    placeholders: usize,
    /// トレーラー /ID の元（タイトル・ブランド・生成日・掲載順の商品ID）
    fingerprint: Sha256,
}

impl CatalogueAssembler {
    pub fn new(ctx: RenderContext) -> Self {
        let mut doc = PdfDocument::new(&ctx.title);
        pin_document_dates(&mut doc, ctx.generated_on);

        let mut fingerprint = Sha256::new();
        for part in [ctx.title.as_str(), ctx.brand_name.as_str()] {
            fingerprint.update(part.as_bytes());
            fingerprint.update([0u8]);
        }
        fingerprint.update(ctx.generated_on.to_string().as_bytes());

        Self {
            ctx,
            doc,
            pages: Vec::new(),
            state: AssemblyState::Empty,
            page_number: 0,
            placeholders: 0,
            fingerprint,
        }
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    /// 商品ページ数
    pub fn content_pages(&self) -> usize {
        self.page_number
    }

    pub fn placeholders(&self) -> usize {
        self.placeholders
    }

    pub fn pages(&self) -> &[PageCanvas] {
        &self.pages
    }

    fn transition(&mut self, allowed: &[AssemblyState], next: AssemblyState) -> Result<()> {
        if !allowed.contains(&self.state) {
            return Err(CatalogueError::GenerationFailure(format!(
                "ページの順序が不正です: {:?} の後に {:?} は追加できません",
                self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }

    fn blank_page(&self) -> PageCanvas {
        let geometry = &self.ctx.geometry;
        let mut canvas = PageCanvas::new(geometry.width_mm, geometry.height_mm);
        canvas.fill_rect(geometry.page_rect(), self.ctx.palette.background);
        canvas
    }

    pub fn add_cover(&mut self) -> Result<()> {
        self.transition(&[AssemblyState::Empty], AssemblyState::Cover)?;

        let mut canvas = self.blank_page();
        let ctx = &self.ctx;
        let palette = &ctx.palette;
        let center = ctx.geometry.width_mm / 2.0;

        canvas.text(&ctx.title, center, COVER_TITLE_Y, TextFont::SerifBold, 36.0, palette.primary, Align::Center);
        canvas.text(
            &ctx.subtitle,
            center,
            COVER_SUBTITLE_Y,
            TextFont::SerifItalic,
            14.0,
            palette.secondary,
            Align::Center,
        );
        for y in COVER_RULE_Y {
            canvas.hline(COVER_RULE_INSET, ctx.geometry.width_mm - COVER_RULE_INSET, y, palette.accent, 0.5);
        }
        canvas.text(&ctx.date_label(), center, COVER_DATE_Y, TextFont::Sans, 9.0, palette.muted, Align::Center);

        self.pages.push(canvas);
        Ok(())
    }

    /// 1ページ分の商品を描く
    ///
    /// `images` はページ内の商品順に、各商品の表示画像を並べたもの。
    pub fn add_content_page(
        &mut self,
        plan: &PageLayoutPlan,
        products: &[ProductRecord],
        images: Vec<ImageOutcome>,
    ) -> Result<()> {
        if products.len() != plan.products_on_page {
            return Err(CatalogueError::GenerationFailure(format!(
                "ページの商品数が計画と一致しません: {} != {}",
                products.len(),
                plan.products_on_page
            )));
        }
        self.transition(&[AssemblyState::Cover, AssemblyState::Content], AssemblyState::Content)?;
        self.page_number += 1;
        for product in products {
            self.fingerprint.update(product.id.as_bytes());
            self.fingerprint.update([0u8]);
        }

        // XObject名はページ番号と取得順で決める（printpdfの乱数IDは使わない）
        let page_number = self.page_number;
        let embedded: Vec<Option<EmbeddedImage>> = images
            .into_iter()
            .enumerate()
            .map(|(n, outcome)| match outcome {
                Ok(prepared) => {
                    let id = XObjectId(format!("img{}_{}", page_number, n));
                    self.doc
                        .resources
                        .xobjects
                        .map
                        .insert(id.clone(), XObject::Image(prepared.raw));
                    Some(EmbeddedImage {
                        id,
                        width_px: prepared.width_px,
                        height_px: prepared.height_px,
                        aspect_ratio: prepared.aspect_ratio,
                    })
                }
                Err(e) => {
                    log::warn!("{}", e);
                    None
                }
            })
            .collect();
        let mut embedded = embedded.into_iter();

        let mut canvas = self.blank_page();
        draw_header(&self.ctx, &mut canvas, self.page_number);

        let slots = self.ctx.geometry.slot_rects(plan.layout_type);
        for (slot_index, (product, rect)) in products.iter().zip(slots).enumerate() {
            let card_images: Vec<Option<EmbeddedImage>> = embedded
                .by_ref()
                .take(display_image_count(product))
                .collect();
            let report = render_card(
                &self.ctx,
                &mut canvas,
                product,
                rect,
                slot_index,
                plan.layout_type,
                &card_images,
            );
            if report.placeholders > 0 {
                log::debug!("{}: 画像{}枚をプレースホルダーで描画", product.label(), report.placeholders);
            }
            self.placeholders += report.placeholders;
        }

        self.pages.push(canvas);
        Ok(())
    }

    pub fn add_closing(&mut self) -> Result<()> {
        self.transition(&[AssemblyState::Cover, AssemblyState::Content], AssemblyState::Closing)?;

        let mut canvas = self.blank_page();
        let ctx = &self.ctx;
        let palette = &ctx.palette;
        let center = ctx.geometry.width_mm / 2.0;
        let middle = ctx.geometry.height_mm / 2.0;

        canvas.text(CLOSING_HEADING, center, middle - 20.0, TextFont::SerifBold, 28.0, palette.primary, Align::Center);
        canvas.text(CLOSING_MESSAGE, center, middle, TextFont::Serif, 10.0, palette.text, Align::Center);
        canvas.text(
            &format!("{} Catalogue", ctx.brand_name),
            center,
            middle + 15.0,
            TextFont::Serif,
            8.0,
            palette.muted,
            Align::Center,
        );

        self.pages.push(canvas);
        Ok(())
    }

    /// PDFバイト列に確定する
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        self.transition(&[AssemblyState::Closing], AssemblyState::Finalized)?;

        let pages = std::mem::take(&mut self.pages)
            .into_iter()
            .map(PageCanvas::into_page)
            .collect();
        self.doc.with_pages(pages);

        let mut warnings = Vec::new();
        let mut bytes = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        for warning in &warnings {
            log::debug!("PDF保存時の警告: {:?}", warning);
        }
        if bytes.is_empty() {
            return Err(CatalogueError::GenerationFailure("PDFの出力が空です".into()));
        }

        let digest = hex::encode_upper(self.fingerprint.clone().finalize());
        let (document_id, instance_id) = digest.split_at(TRAILER_ID_LEN);
        rewrite_trailer_id(&mut bytes, [document_id.as_bytes(), instance_id.as_bytes()])?;
        Ok(bytes)
    }
}

/// 作成日・更新日・メタデータ日付を生成日の 00:00 UTC に固定する
fn pin_document_dates(doc: &mut PdfDocument, generated_on: NaiveDate) {
    let timestamp = generated_on.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
    match DateTime::from_unix_timestamp(timestamp) {
        Ok(date) => {
            let info = &mut doc.metadata.info;
            info.creation_date = date;
            info.modification_date = date;
            info.metadata_date = date;
        }
        Err(e) => log::warn!("PDFの日付を設定できません ({}): {}", generated_on, e),
    }
}

/// 保存済みPDFのトレーラー `/ID[(..)(..)]` を同じ長さの固定値で置き換える
///
/// 長さを変えないのでxrefのオフセットはそのまま有効。
fn rewrite_trailer_id(bytes: &mut [u8], ids: [&[u8]; 2]) -> Result<()> {
    let missing = || CatalogueError::GenerationFailure("PDFトレーラーの /ID が見つかりません".into());

    let key = bytes.windows(3).rposition(|w| w == b"/ID").ok_or_else(missing)?;
    let mut pos = skip_whitespace(bytes, key + 3);
    if bytes.get(pos) != Some(&b'[') {
        return Err(missing());
    }
    pos += 1;

    for id in ids {
        if id.len() != TRAILER_ID_LEN {
            return Err(CatalogueError::GenerationFailure(format!(
                "/ID の長さが不正です: {}",
                id.len()
            )));
        }
        pos = skip_whitespace(bytes, pos);
        let start = pos + 1;
        let end = start + TRAILER_ID_LEN;
        let well_formed = bytes.get(pos) == Some(&b'(')
            && bytes.get(end) == Some(&b')')
            && bytes[start..end].iter().all(u8::is_ascii_alphanumeric);
        if !well_formed {
            return Err(missing());
        }
        bytes[start..end].copy_from_slice(id);
        pos = end + 1;
    }
    Ok(())
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

/// ヘッダー帯（左: ブランド、中央: セクション名、右: ページ番号、下線）
fn draw_header(ctx: &RenderContext, canvas: &mut PageCanvas, page_number: usize) {
    let palette = &ctx.palette;
    let margin = ctx.geometry.margin_mm;
    let right = ctx.geometry.width_mm - margin;

    canvas.text(&ctx.brand_mark(), margin, HEADER_BASELINE_MM, TextFont::Serif, 8.0, palette.muted, Align::Left);
    canvas.text(
        SECTION_TITLE,
        ctx.geometry.width_mm / 2.0,
        HEADER_BASELINE_MM,
        TextFont::SerifBold,
        10.0,
        palette.text,
        Align::Center,
    );
    canvas.text(
        &page_number.to_string(),
        right,
        HEADER_BASELINE_MM,
        TextFont::Serif,
        8.0,
        palette.muted,
        Align::Right,
    );
    canvas.hline(margin, right, HEADER_RULE_MM, palette.muted, 0.3);
}

/// カードに載せる画像数（メイン + サムネイル）
fn display_image_count(product: &ProductRecord) -> usize {
    product.images.len().min(1 + MAX_THUMBNAILS)
}

// ============================================
// 生成パイプライン
// ============================================

#[derive(Debug, Clone)]
pub struct CatalogueOptions {
    pub brand_name: String,
    pub title: String,
    pub generated_on: NaiveDate,
    pub quality: PdfQuality,
    pub concurrency: usize,
    pub planner: PlannerConfig,
}

#[derive(Debug, Clone)]
pub struct CatalogueOutput {
    pub bytes: Vec<u8>,
    pub plans: Vec<PageLayoutPlan>,
    pub content_pages: usize,
    pub placeholders: usize,
}

/// 確定前まで組み立てる（ページ単位で画像を並列取得してから描画）
pub async fn assemble_catalogue<F: ImageFetcher>(
    products: &[ProductRecord],
    options: &CatalogueOptions,
    fetcher: &F,
) -> Result<(CatalogueAssembler, Vec<PageLayoutPlan>)> {
    if products.is_empty() {
        return Err(CatalogueError::EmptyCatalogue);
    }
    options.planner.validate()?;

    let ctx = RenderContext::new(&options.brand_name, &options.title, options.generated_on);
    let mut assembler = CatalogueAssembler::new(ctx);
    let mut plans = Vec::new();

    assembler.add_cover()?;

    let mut cursor = 0;
    while let Some(plan) = plan_page(products, cursor, &options.planner) {
        if plan.products_on_page == 0 {
            return Err(CatalogueError::GenerationFailure(format!(
                "{}件目以降のページ計画が空です",
                cursor
            )));
        }
        let page_products = &products[cursor..cursor + plan.products_on_page];
        log::debug!(
            "ページ{}: {} ({}件)",
            assembler.content_pages() + 1,
            plan.layout_type,
            plan.products_on_page
        );

        let urls: Vec<String> = page_products
            .iter()
            .flat_map(|p| {
                p.primary_image()
                    .into_iter()
                    .chain(p.extra_images(MAX_THUMBNAILS).iter().map(String::as_str))
                    .map(str::to_string)
            })
            .collect();
        let images = load_images(fetcher, urls, options.quality, options.concurrency).await;

        assembler.add_content_page(&plan, page_products, images)?;
        cursor += plan.products_on_page;
        plans.push(plan);
    }

    assembler.add_closing()?;
    Ok((assembler, plans))
}

/// 商品リストからカタログPDFを生成する
pub async fn generate_catalogue<F: ImageFetcher>(
    products: &[ProductRecord],
    options: &CatalogueOptions,
    fetcher: &F,
) -> Result<CatalogueOutput> {
    let (mut assembler, plans) = assemble_catalogue(products, options, fetcher).await?;
    let bytes = assembler.finalize()?;
    Ok(CatalogueOutput {
        bytes,
        plans,
        content_pages: assembler.content_pages(),
        placeholders: assembler.placeholders(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::image_loader::ImageUnavailable;
    use catalogue_common::{Category, Currency, LayoutType, Price, Tribe};

    /// すべて404を返す
    struct NotFound;

    impl ImageFetcher for NotFound {
        async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, ImageUnavailable> {
            Err(ImageUnavailable::new(url, "HTTP 404 Not Found"))
        }
    }

    fn product(i: usize) -> ProductRecord {
        ProductRecord {
            id: format!("p{}", i),
            name: format!("Woven Basket {}", i),
            tribe: Tribe::Karen,
            category: Category::HomeDecor,
            story: "Rattan woven by hand.".into(),
            materials: vec!["Rattan".into()],
            dimensions: None,
            price: Price { amount: 650.0, currency: Currency::Thb },
            images: vec![format!("https://example.com/{}.jpg", i)],
            stock_quantity: 1,
            featured: false,
            created_at: None,
        }
    }

    fn options() -> CatalogueOptions {
        CatalogueOptions {
            brand_name: "Thai Tribal Crafts".into(),
            title: "THAI TRIBAL CRAFTS".into(),
            generated_on: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            quality: PdfQuality::Low,
            concurrency: 4,
            planner: PlannerConfig::default(),
        }
    }

    fn context() -> RenderContext {
        let opts = options();
        RenderContext::new(&opts.brand_name, &opts.title, opts.generated_on)
    }

    #[tokio::test]
    async fn test_empty_catalogue_rejected() {
        let result = generate_catalogue(&[], &options(), &NotFound).await;
        assert!(matches!(result, Err(CatalogueError::EmptyCatalogue)));
    }

    #[tokio::test]
    async fn test_thirteen_light_products() {
        let products: Vec<_> = (0..13).map(product).collect();
        let output = generate_catalogue(&products, &options(), &NotFound).await.unwrap();

        assert_eq!(output.content_pages, 3);
        let counts: Vec<_> = output.plans.iter().map(|p| p.products_on_page).collect();
        assert_eq!(counts, vec![6, 6, 1]);
        assert_eq!(output.plans[2].layout_type, LayoutType::Featured);
        assert_eq!(output.placeholders, 13);
        assert!(output.bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_single_product_is_featured() {
        let (assembler, plans) = assemble_catalogue(&[product(0)], &options(), &NotFound).await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].layout_type, LayoutType::Featured);
        // 表紙 + 商品 + 締め
        assert_eq!(assembler.pages().len(), 3);
        assert_eq!(assembler.state(), AssemblyState::Closing);
    }

    #[tokio::test]
    async fn test_same_input_gives_same_drawing() {
        let products: Vec<_> = (0..8).map(product).collect();
        let drawing = |assembler: &CatalogueAssembler| {
            assembler
                .pages()
                .iter()
                .map(|page| format!("{:?}", page.ops()))
                .collect::<Vec<_>>()
        };

        let (first, _) = assemble_catalogue(&products, &options(), &NotFound).await.unwrap();
        let (second, _) = assemble_catalogue(&products, &options(), &NotFound).await.unwrap();
        assert_eq!(drawing(&first), drawing(&second));
    }

    #[tokio::test]
    async fn test_same_input_gives_same_bytes() {
        let products: Vec<_> = (0..8).map(product).collect();
        let first = generate_catalogue(&products, &options(), &NotFound).await.unwrap();
        let second = generate_catalogue(&products, &options(), &NotFound).await.unwrap();
        assert_eq!(first.bytes, second.bytes);

        // 生成日が変わればトレーラー /ID も変わる
        let mut later = options();
        later.generated_on = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let third = generate_catalogue(&products, &later, &NotFound).await.unwrap();
        assert_ne!(first.bytes, third.bytes);
    }

    #[test]
    fn test_document_dates_follow_generation_date() {
        let assembler = CatalogueAssembler::new(context());
        let info = &assembler.doc.metadata.info;
        assert_eq!(info.creation_date.year(), 2026);
        assert_eq!(info.creation_date.day(), 19);
        assert_eq!(info.creation_date, info.modification_date);
        assert_eq!(info.creation_date, info.metadata_date);
    }

    #[test]
    fn test_rewrite_trailer_id() {
        let mut bytes = b"1 0 obj\n(/ID)\nendobj\ntrailer\n<</Root 1 0 R/ID[(ABCDEFGHIJABCDEFGHIJABCDEFGHIJAB)(JIHGFEDCBAJIHGFEDCBAJIHGFEDCBAJI)]>>\n%%EOF".to_vec();
        let before = bytes.len();
        let document_id = [b'1'; TRAILER_ID_LEN];
        let instance_id = [b'2'; TRAILER_ID_LEN];

        rewrite_trailer_id(&mut bytes, [&document_id[..], &instance_id[..]]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.len(), before);
        assert!(text.contains(&format!("/ID[({})({})]", "1".repeat(32), "2".repeat(32))));
        assert!(text.starts_with("1 0 obj\n(/ID)"));
    }

    #[test]
    fn test_rewrite_trailer_id_without_trailer_fails() {
        let mut bytes = b"%PDF-1.3\ntrailer\n<</Root 1 0 R>>".to_vec();
        let id = [b'0'; TRAILER_ID_LEN];
        let result = rewrite_trailer_id(&mut bytes, [&id[..], &id[..]]);
        assert!(matches!(result, Err(CatalogueError::GenerationFailure(_))));
    }

    #[test]
    fn test_out_of_order_calls_fail() {
        let plan = PageLayoutPlan { layout_type: LayoutType::Featured, products_on_page: 1 };

        let mut assembler = CatalogueAssembler::new(context());
        let result = assembler.add_content_page(&plan, &[product(0)], vec![]);
        assert!(matches!(result, Err(CatalogueError::GenerationFailure(_))));
        assert!(matches!(assembler.add_closing(), Err(CatalogueError::GenerationFailure(_))));
        assert!(matches!(assembler.finalize(), Err(CatalogueError::GenerationFailure(_))));

        assembler.add_cover().unwrap();
        assert!(assembler.add_cover().is_err());
        assembler.add_content_page(&plan, &[product(0)], vec![]).unwrap();
        assembler.add_closing().unwrap();
        assert!(assembler.add_content_page(&plan, &[product(1)], vec![]).is_err());
        assert!(assembler.add_closing().is_err());

        let bytes = assembler.finalize().unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(assembler.state(), AssemblyState::Finalized);
        assert!(assembler.finalize().is_err());
        assert_eq!(assembler.content_pages(), 1);
    }

    #[test]
    fn test_plan_mismatch_is_generation_failure() {
        let plan = PageLayoutPlan { layout_type: LayoutType::TwoColumn, products_on_page: 4 };
        let mut assembler = CatalogueAssembler::new(context());
        assembler.add_cover().unwrap();
        let result = assembler.add_content_page(&plan, &[product(0)], vec![]);
        assert!(matches!(result, Err(CatalogueError::GenerationFailure(_))));
    }

    #[test]
    fn test_header_page_numbers_count_content_pages_only() {
        let plan = PageLayoutPlan { layout_type: LayoutType::Featured, products_on_page: 1 };
        let mut assembler = CatalogueAssembler::new(context());
        assembler.add_cover().unwrap();
        assembler.add_content_page(&plan, &[product(0)], vec![]).unwrap();
        assembler.add_content_page(&plan, &[product(1)], vec![]).unwrap();
        assert_eq!(assembler.content_pages(), 2);

        let second = format!("{:?}", assembler.pages()[2].ops());
        assert!(second.contains("\"2\""));
        assert!(second.contains("PRODUCT COLLECTION"));
    }
}
