use crate::core::{SheetCloner, TemplateFiller};
use crate::error::{FormpressError, FormpressResult};
use crate::excel::Workbook;
use crate::records;
use colored::Colorize;
use std::path::PathBuf;

/// Execute the fill command: one record into the single-entry template.
pub fn fill(
    data: PathBuf,
    index: usize,
    template: Option<PathBuf>,
    sheet: Option<String>,
    out_dir: PathBuf,
    output: String,
    verbose: bool,
) -> FormpressResult<()> {
    println!("{}", "📋 Formpress - Filling template".bold().green());
    println!("   Data: {}", data.display());
    println!();

    let recs = records::load_records(&data)?;
    if recs.is_empty() {
        return Err(FormpressError::NoRecords);
    }
    if index >= recs.len() {
        return Err(FormpressError::IndexOutOfRange(index, recs.len()));
    }
    if verbose {
        println!("   {} records loaded, using index {}", recs.len(), index);
        println!(
            "   Record: {}",
            recs[index].text("name").bright_blue().bold()
        );
        println!();
    }

    let mut filler = TemplateFiller::new();
    if let Some(template) = template {
        filler = filler.with_template(template);
    }
    if let Some(sheet) = sheet {
        filler = filler.with_sheet(sheet);
    }

    let path = filler.fill(&recs[index], &out_dir, &output)?;
    println!("{} {}", "✅ Written:".bold().green(), path.display());
    Ok(())
}

/// Execute the clone command: one form-sheet copy per record.
#[allow(clippy::too_many_arguments)]
pub fn clone(
    data: PathBuf,
    template: Option<PathBuf>,
    sheet: Option<String>,
    start: usize,
    count: Option<usize>,
    out_dir: PathBuf,
    output: String,
    verbose: bool,
) -> FormpressResult<()> {
    println!("{}", "📋 Formpress - Cloning form sheets".bold().green());
    println!("   Data: {}", data.display());
    println!();

    let recs = records::load_records(&data)?;
    if recs.is_empty() {
        return Err(FormpressError::NoRecords);
    }
    if start >= recs.len() {
        return Err(FormpressError::IndexOutOfRange(start, recs.len()));
    }
    let end = match count {
        Some(count) => (start + count).min(recs.len()),
        None => recs.len(),
    };
    let slice = &recs[start..end];

    if verbose {
        println!(
            "   {} records loaded, cloning {} (index {}..{})",
            recs.len(),
            slice.len(),
            start,
            end
        );
        for (i, record) in slice.iter().enumerate() {
            println!(
                "   STT-{} ← {} (Mã lớp: {})",
                i,
                record.text("name").cyan(),
                record.text("classcode")
            );
        }
        println!();
    }

    let mut cloner = SheetCloner::new();
    if let Some(template) = template {
        cloner = cloner.with_template(template);
    }
    if let Some(sheet) = sheet {
        cloner = cloner.with_sheet(sheet);
    }

    let report = cloner.clone_all(slice, &out_dir, &output)?;

    println!(
        "{} {} sheet(s) → {}",
        "✅ Written:".bold().green(),
        report.sheets.len(),
        report.path.display()
    );
    if !report.skipped.is_empty() {
        println!(
            "{}",
            format!("⚠️  {} merge range(s) skipped", report.skipped.len()).yellow()
        );
        if verbose {
            for skip in &report.skipped {
                println!("   {} {}: {}", skip.sheet, skip.range, skip.reason);
            }
        }
    }
    Ok(())
}

/// Execute the sheets command: list a workbook's worksheet names.
pub fn sheets(file: PathBuf) -> FormpressResult<()> {
    println!("{}", "📋 Formpress - Worksheets".bold().green());
    println!("   File: {}\n", file.display());

    let workbook = Workbook::open(&file)?;
    for name in workbook.sheet_names() {
        println!("   {}", name.bright_blue());
    }
    Ok(())
}
