//! qt-ts-catalog
//!
//! Qt Linguist の翻訳テーブル (`.ts`) を読み込み、チェックし、編集して書き戻す
//!
//! Files are read losslessly: writing an unedited table reproduces it byte for
//! byte, and edits only touch the elements they change.

pub mod catalog;
pub mod check;
pub mod config;
pub mod indexer;
pub mod syntax;
pub mod types;

pub use catalog::{
    TranslationStatus,
    TranslationTable,
};
