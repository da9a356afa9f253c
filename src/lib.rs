//! 手工芸品カタログのPDF生成
//!
//! 商品JSONを読み込み、ページごとにレイアウトを決めてA4のカタログPDFを組み立てる。

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
