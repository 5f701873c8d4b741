//! Template filling and sheet cloning engines.

pub mod cloner;
pub mod filler;

pub use cloner::{CloneReport, SheetCloner, SkippedMerge};
pub use filler::TemplateFiller;
