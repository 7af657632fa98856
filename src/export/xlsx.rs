use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};

use super::{Cell, Dataset, ExportData, ExportError};

const HEADER_FILL: u32 = 0xCCCCCC;

/// Workbook with a Summary sheet followed by one sheet per non-empty type.
pub fn to_bytes(data: &ExportData) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();

    write_summary(workbook.add_worksheet(), data)?;

    let header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL));
    for dataset in data.datasets.iter().filter(|d| !d.is_empty()) {
        write_dataset(workbook.add_worksheet(), dataset, &header)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_summary(sheet: &mut Worksheet, data: &ExportData) -> Result<(), XlsxError> {
    let title = Format::new().set_bold().set_font_size(14);
    let bold = Format::new().set_bold();

    sheet.set_name("Summary")?;
    sheet.write_string_with_format(0, 0, "DevTracker - Export Summary", &title)?;
    sheet.write_string(1, 0, "Export Date:")?;
    sheet.write_string(1, 1, data.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())?;
    sheet.write_string(2, 0, "Project:")?;
    sheet.write_string(2, 1, data.project_name().unwrap_or("All Projects"))?;
    sheet.write_string_with_format(4, 0, "Data Type", &bold)?;
    sheet.write_string_with_format(4, 1, "Record Count", &bold)?;

    for (i, dataset) in data.datasets.iter().enumerate() {
        let row = 5 + i as u32;
        sheet.write_string(row, 0, dataset.kind.title())?;
        sheet.write_number(row, 1, dataset.len() as f64)?;
    }
    sheet.set_column_width(0, 24)?;
    sheet.set_column_width(1, 20)?;
    Ok(())
}

fn write_dataset(sheet: &mut Worksheet, dataset: &Dataset, header: &Format) -> Result<(), XlsxError> {
    sheet.set_name(dataset.kind.title())?;

    for (col, name) in dataset.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, column_title(name), header)?;
    }

    for (r, row) in dataset.rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Null => {}
                Cell::Int(n) => {
                    sheet.write_number(r, col, *n as f64)?;
                }
                other => {
                    sheet.write_string(r, col, other.to_text())?;
                }
            }
        }
    }
    Ok(())
}

/// `start_date` -> `Start Date`
pub fn column_title(column: &str) -> String {
    column
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
