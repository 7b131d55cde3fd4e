//! Multi-sheet Excel workbook export.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Chart, ChartType, Color, Format, Workbook, Worksheet};
use tracing::debug;

use super::table::{Cell, ChartKind, ChartSpec, Table};

/// Fill used to flag misconfigurations.
const HIGHLIGHT_COLOR: u32 = 0xFFCCCC;

/// Write every table as one worksheet, in order.
pub fn save_workbook(tables: &[Table], path: &Path) -> Result<PathBuf> {
    super::ensure_parent(path)?;
    let mut workbook = Workbook::new();

    let header_format = Format::new().set_bold();
    let highlight_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HIGHLIGHT_COLOR));

    for table in tables {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&table.name)
            .with_context(|| format!("Invalid sheet name '{}'", table.name))?;

        write_table(worksheet, table, &header_format, &highlight_format)?;

        if !table.is_empty() {
            for spec in &table.charts {
                let chart = build_chart(spec, table);
                worksheet.insert_chart(spec.anchor.0, spec.anchor.1, &chart)?;
            }
        }

        worksheet.autofit();
        debug!("Wrote sheet '{}' ({} rows)", table.name, table.len());
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook {}", path.display()))?;
    Ok(path.to_path_buf())
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &Table,
    header_format: &Format,
    highlight_format: &Format,
) -> Result<()> {
    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, header_format)?;
    }

    for (i, row) in table.rows().iter().enumerate() {
        let row_num = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col_num = col as u16;
            if table.highlight_column == Some(col) {
                worksheet.write_string_with_format(
                    row_num,
                    col_num,
                    cell.to_string(),
                    highlight_format,
                )?;
                continue;
            }
            match cell {
                Cell::Text(s) => worksheet.write_string(row_num, col_num, s)?,
                Cell::Int(n) => worksheet.write_number(row_num, col_num, *n as f64)?,
                Cell::Float(n) => worksheet.write_number(row_num, col_num, *n)?,
                Cell::Bool(b) => worksheet.write_boolean(row_num, col_num, *b)?,
            };
        }
    }

    Ok(())
}

fn build_chart(spec: &ChartSpec, table: &Table) -> Chart {
    let chart_type = match spec.kind {
        ChartKind::Pie => ChartType::Pie,
        ChartKind::Column => ChartType::Column,
    };
    let mut chart = Chart::new(chart_type);
    chart.title().set_name(&spec.title);

    let last_row = table.len() as u32;
    chart
        .add_series()
        .set_categories((table.name.as_str(), 1, 0, last_row, 0))
        .set_values((table.name.as_str(), 1, 1, last_row, 1));

    if let Some(x) = &spec.x_axis {
        chart.x_axis().set_name(x);
    }
    if let Some(y) = &spec.y_axis {
        chart.y_axis().set_name(y);
    }
    // Single series: the legend only helps pie slices
    if spec.kind == ChartKind::Column {
        chart.legend().set_hidden();
    }

    chart
}
