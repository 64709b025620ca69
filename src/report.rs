//! Workbook output.
//!
//! One worksheet per station. Each sheet starts with the scan banner, then
//! lays sensors out left to right as two-column blocks separated by an empty
//! column:
//!
//! ```text
//!   A                    B            C   D                    E
//! 1 Дата сканирования: 16.10.2026 (10.30)
//! 2 Интервал: День
//! 3 |        CO         |                 |        NO2        |
//! 4 | Время измерения   | мг/м³       |   | Не удалось получить данные |
//! 5 | 16.10.2026 00:20  | 0.4         |
//! ```
//!
//! The workbook is rendered to memory and then moved into place, so a failed
//! run never leaves a truncated file at the destination.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use rust_xlsxwriter::{
    Color, ColNum, Format, FormatAlign, FormatBorder, FormatScript, RowNum, Workbook, Worksheet,
};
use tempfile::NamedTempFile;
use tracing::info;

use crate::config::ReportConfig;
use crate::logging::Stage;
use crate::model::{Report, ReportError, SensorSeries, StationSeries};
use crate::sanitize::{self, Script};

pub const SCAN_BANNER: &str = "Дата сканирования";
pub const INTERVAL_BANNER: &str = "Интервал";
pub const TIME_HEADER: &str = "Время измерения";
pub const UNAVAILABLE: &str = "Не удалось получить данные";

/// First row (0-based) of every sensor block.
pub const DATA_TOP_ROW: RowNum = 2;
/// Two data columns plus one spacer.
pub const BLOCK_STRIDE: ColNum = 3;

const MAX_SHEET_NAME_CHARS: usize = 31;
const STAMP_FORMAT: &str = "%d.%m.%Y (%H.%M)";
#[cfg(unix)]
const REPORT_FILE_MODE: u32 = 0o644;

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

struct ReportFormats {
    header: Format,
    value: Format,
    date: Format,
    run_normal: Format,
    run_superscript: Format,
    run_subscript: Format,
}

impl ReportFormats {
    fn new() -> Self {
        let header = Format::new()
            .set_bold()
            .set_italic()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_background_color(Color::RGB(0xD3D3D3))
            .set_border(FormatBorder::Thin);

        let value = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin);

        let date = value.clone().set_num_format("dd.mm.yyyy hh:mm");

        let run_normal = Format::new().set_bold().set_italic();
        let run_superscript = run_normal.clone().set_font_script(FormatScript::Superscript);
        let run_subscript = run_normal.clone().set_font_script(FormatScript::Subscript);

        ReportFormats {
            header,
            value,
            date,
            run_normal,
            run_superscript,
            run_subscript,
        }
    }

    fn run(&self, script: Script) -> &Format {
        match script {
            Script::Normal => &self.run_normal,
            Script::Superscript => &self.run_superscript,
            Script::Subscript => &self.run_subscript,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `<site label> dd.mm.yyyy (HH.MM).xlsx`
pub fn report_file_name(site_label: &str, scanned_at: NaiveDateTime) -> String {
    format!("{} {}.xlsx", site_label, scanned_at.format(STAMP_FORMAT))
}

/// Renders `report` and writes it to `destination`.
pub fn write_report(
    report: &Report,
    settings: &ReportConfig,
    destination: &Path,
) -> Result<(), ReportError> {
    info!(stage = %Stage::Report, "Сохранение данных в книгу {}", destination.display());

    let mut workbook = build_workbook(report, settings)?;
    let bytes = workbook.save_to_buffer()?;
    persist(&bytes, destination)
}

/// Builds the in-memory workbook, one sheet per station sorted by name.
pub fn build_workbook(report: &Report, settings: &ReportConfig) -> Result<Workbook, ReportError> {
    let formats = ReportFormats::new();
    let mut workbook = Workbook::new();

    let names: Vec<&str> = report.stations.keys().map(String::as_str).collect();
    for ((_, sensors), sheet_name) in report.stations.iter().zip(sheet_names(&names)) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name)?;
        write_station_sheet(worksheet, report, sensors, settings, &formats)?;
    }

    Ok(workbook)
}

/// Makes station names acceptable as xlsx sheet names: forbidden characters
/// become `_`, names are cut to 31 characters and repeats get a suffix.
pub fn sheet_names(stations: &[&str]) -> Vec<String> {
    let mut taken = HashSet::new();

    stations
        .iter()
        .map(|name| {
            let cleaned: String = name
                .chars()
                .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
                .collect();
            let cleaned = cleaned.trim_matches('\'');
            let base: String = if cleaned.is_empty() {
                "Лист".to_string()
            } else {
                cleaned.chars().take(MAX_SHEET_NAME_CHARS).collect()
            };

            let mut candidate = base.clone();
            let mut n = 2;
            while !taken.insert(candidate.to_lowercase()) {
                let suffix = format!(" ({})", n);
                let keep = MAX_SHEET_NAME_CHARS - suffix.chars().count();
                candidate = base.chars().take(keep).collect::<String>() + &suffix;
                n += 1;
            }
            candidate
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sheet layout
// ---------------------------------------------------------------------------

fn write_station_sheet(
    worksheet: &mut Worksheet,
    report: &Report,
    sensors: &StationSeries,
    settings: &ReportConfig,
    formats: &ReportFormats,
) -> Result<(), ReportError> {
    worksheet.write_string(
        0,
        0,
        format!("{}: {}", SCAN_BANNER, report.scanned_at.format(STAMP_FORMAT)),
    )?;
    worksheet.write_string(1, 0, format!("{}: {}", INTERVAL_BANNER, report.interval.label()))?;

    let mut col: ColNum = 0;
    for (name, series) in sensors {
        write_sensor_block(worksheet, col, name, series, settings, formats)?;
        col += BLOCK_STRIDE;
    }

    Ok(())
}

fn write_sensor_block(
    worksheet: &mut Worksheet,
    col: ColNum,
    name: &str,
    series: &SensorSeries,
    settings: &ReportConfig,
    formats: &ReportFormats,
) -> Result<(), ReportError> {
    let mut row = DATA_TOP_ROW;

    worksheet.merge_range(row, col, row, col + 1, name, &formats.header)?;
    row += 1;

    if series.is_empty() {
        worksheet.merge_range(row, col, row, col + 1, UNAVAILABLE, &formats.header)?;
    } else {
        worksheet.write_string_with_format(row, col, TIME_HEADER, &formats.header)?;
        write_unit_header(worksheet, row, col + 1, &series.unit, formats)?;
        row += 1;

        for reading in &series.readings {
            worksheet.write_number_with_format(row, col, reading.serial, &formats.date)?;
            match reading.value {
                Some(value) => worksheet.write_number_with_format(row, col + 1, value, &formats.value)?,
                None => worksheet.write_blank(row, col + 1, &formats.value)?,
            };
            row += 1;
        }
    }

    worksheet.set_column_width(col, settings.column_width)?;
    worksheet.set_column_width(col + 1, settings.column_width)?;
    Ok(())
}

/// Units with `<sup>`/`<sub>` become rich strings; anything else is written
/// as the stripped plain label.
fn write_unit_header(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    unit: &str,
    formats: &ReportFormats,
) -> Result<(), ReportError> {
    let plain = sanitize::strip_markup(unit);
    let runs = sanitize::segments(unit);
    let joined: String = runs.iter().map(|s| s.text.as_str()).collect();

    if sanitize::has_markup(unit) && !runs.is_empty() && joined == plain {
        let rich: Vec<(&Format, &str)> = runs
            .iter()
            .map(|s| (formats.run(s.script), s.text.as_str()))
            .collect();
        worksheet.write_rich_string_with_format(row, col, &rich, &formats.header)?;
    } else {
        worksheet.write_string_with_format(row, col, plain, &formats.header)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Writes to a temporary file next to `destination`, then renames it over.
fn persist(bytes: &[u8], destination: &Path) -> Result<(), ReportError> {
    let io_err = |source: std::io::Error| ReportError::Io {
        path: destination.to_path_buf(),
        source,
    };

    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Temporary files are created 0600; the report is an ordinary document.
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(REPORT_FILE_MODE))
            .map_err(io_err)?;
    }
    tmp.persist(destination).map_err(|e| io_err(e.error))?;
    Ok(())
}
