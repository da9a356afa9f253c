//! テキスト計測と折り返し
//!
//! PDF標準フォント（Helvetica / Times）の字幅を文字クラスごとの近似値で見積もる。
//! 単位は1/1000 em。正確なAFMメトリクスではないが、折り返し位置の判定には十分。

use crate::layout::pt_to_mm;

/// 使用フォント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextFont {
    Serif,
    SerifBold,
    SerifItalic,
    Sans,
    SansBold,
}

impl TextFont {
    fn is_serif(&self) -> bool {
        matches!(self, TextFont::Serif | TextFont::SerifBold | TextFont::SerifItalic)
    }

    fn is_bold(&self) -> bool {
        matches!(self, TextFont::SerifBold | TextFont::SansBold)
    }
}

/// 行送り（フォントサイズ比）
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// 省略記号（標準フォントで表示できるASCII）
pub const ELLIPSIS: &str = "...";

/// Helvetica基準の字幅（1/1000 em）
fn sans_units(c: char) -> f64 {
    match c {
        ' ' | ',' | '.' | ':' | ';' | '!' | '\'' | '|' | 'i' | 'j' | 'l' | 'I' => 260.0,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' | '/' => 333.0,
        'm' | 'M' => 833.0,
        'w' => 722.0,
        'W' => 944.0,
        '@' | '%' => 889.0,
        '×' => 584.0,
        '0'..='9' => 556.0,
        c if c.is_uppercase() => 667.0,
        c if c.is_lowercase() => 530.0,
        _ => 556.0,
    }
}

/// 1文字の幅（1/1000 em）
fn char_units(c: char, font: TextFont) -> f64 {
    let mut units = sans_units(c);
    if font.is_serif() {
        // Timesは全体的にやや狭い
        units *= 0.92;
    }
    if font.is_bold() {
        units *= 1.06;
    }
    units
}

/// 文字列幅（mm）
pub fn text_width_mm(text: &str, font: TextFont, size_pt: f64) -> f64 {
    let units: f64 = text.chars().map(|c| char_units(c, font)).sum();
    pt_to_mm(units / 1000.0 * size_pt)
}

/// 行送り（mm）
pub fn line_height_mm(size_pt: f64) -> f64 {
    pt_to_mm(size_pt * LINE_HEIGHT_FACTOR)
}

/// 単語単位で折り返す。1行に収まらない単語は文字単位で分割する
pub fn wrap_text(text: &str, font: TextFont, size_pt: f64, max_width_mm: f64) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width_mm(&candidate, font, size_pt) <= max_width_mm {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width_mm(word, font, size_pt) <= max_width_mm {
                current = word.to_string();
            } else {
                let mut pieces = break_word(word, font, size_pt, max_width_mm);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

fn break_word(word: &str, font: TextFont, size_pt: f64, max_width_mm: f64) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if current.chars().count() > 1 && text_width_mm(&current, font, size_pt) > max_width_mm {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// 最大行数に切り詰め、切り詰めた場合は最終行に省略記号を付ける
pub fn clamp_lines(
    mut lines: Vec<String>,
    max_lines: usize,
    font: TextFont,
    size_pt: f64,
    max_width_mm: f64,
) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let mut shortened = last.trim_end().to_string();
        while !shortened.is_empty()
            && text_width_mm(&format!("{}{}", shortened, ELLIPSIS), font, size_pt) > max_width_mm
        {
            shortened.pop();
        }
        *last = format!("{}{}", shortened.trim_end(), ELLIPSIS);
    }
    lines
}

/// 折り返してから最大行数に切り詰める
pub fn wrap_clamped(
    text: &str,
    font: TextFont,
    size_pt: f64,
    max_width_mm: f64,
    max_lines: usize,
) -> Vec<String> {
    let lines = wrap_text(text, font, size_pt, max_width_mm);
    clamp_lines(lines, max_lines, font, size_pt, max_width_mm)
}
