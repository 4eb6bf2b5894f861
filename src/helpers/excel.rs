//! Export engine: template bootstrap, data merge, and output persistence.

use calamine::{Data, Reader, Xlsx, open_workbook};
use chrono::{Datelike, Duration, Local, NaiveDate};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

use crate::helpers::config::EngineConfig;
use crate::models::timesheet::TimesheetSubmission;

/// Header row of the template, 0-based (spreadsheet row 4).
pub const HEADER_ROW: u32 = 3;
/// Cell that receives the employee name, 0-based (spreadsheet cell B2).
pub const EMPLOYEE_NAME_ROW: u32 = 1;
pub const EMPLOYEE_NAME_COL: u16 = 1;
/// First project data row, 0-based (spreadsheet row 5).
pub const DATA_START_ROW: u32 = 4;
/// First weekday hours column, 0-based (spreadsheet column C).
pub const DAY_START_COL: u16 = 2;
/// Upper bound on project rows per submission. Rows past this point would
/// run into template content below the data block, so the engine rejects
/// oversized submissions instead of overwriting it.
pub const MAX_PROJECT_ROWS: usize = 16;

/// Written to B2 when a submission arrives without an employee name.
const FALLBACK_EMPLOYEE_NAME: &str = "Mom";

const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Classified export failures.
///
/// A lock conflict on the template or output file is the one user-actionable
/// case; everything else collapses into [`ExportError::Engine`] with the
/// underlying message attached. The engine never panics and never retries.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Please close the Excel file before exporting!")]
    TemplateLocked,
    #[error("timesheet exceeds the {max} project row limit ({count} submitted)")]
    TooManyProjects { count: usize, max: usize },
    #[error("An error occurred: {0}")]
    Engine(String),
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        match err {
            // A workbook held open elsewhere surfaces as PermissionDenied on
            // save (the Windows sharing-violation case).
            rust_xlsxwriter::XlsxError::IoError(e)
                if e.kind() == ErrorKind::PermissionDenied =>
            {
                ExportError::TemplateLocked
            }
            other => ExportError::Engine(other.to_string()),
        }
    }
}

impl From<calamine::XlsxError> for ExportError {
    fn from(err: calamine::XlsxError) -> Self {
        match err {
            calamine::XlsxError::Io(e) if e.kind() == ErrorKind::PermissionDenied => {
                ExportError::TemplateLocked
            }
            other => ExportError::Engine(other.to_string()),
        }
    }
}

/// Round hours to the nearest quarter hour.
///
/// Uses `f64::round`, which rounds half away from zero, so `0.125` becomes
/// `0.25`. (Exact `.125` boundaries would land on the even quarter under
/// banker's rounding instead; half-away-from-zero is this implementation's
/// documented choice.)
pub fn round_to_quarter(hours: f64) -> f64 {
    (hours * 4.0).round() / 4.0
}

/// Monday on or before the given date.
fn start_of_week(today: NaiveDate) -> NaiveDate {
    today - Duration::days(today.weekday().num_days_from_monday() as i64)
}

/// Create the template workbook at `config.template_path` if it does not
/// exist yet. Idempotent: once the file is present this is a no-op, so the
/// header dates stay anchored to the week the template was first created.
/// Deleting the file is the only way to get fresh dates.
pub fn ensure_template(config: &EngineConfig) -> Result<(), ExportError> {
    let path = Path::new(&config.template_path);
    if path.exists() {
        return Ok(());
    }

    info!("Template missing, creating {}", path.display());

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| ExportError::Engine(e.to_string()))?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.write_string(HEADER_ROW, 0, "Project Name")?;

    let monday = start_of_week(Local::now().date_naive());
    for (idx, label) in DAY_LABELS.iter().enumerate() {
        let date = monday + Duration::days(idx as i64);
        let header = format!("{label} {}", date.format("%m/%d"));
        worksheet.write_string(HEADER_ROW, DAY_START_COL + idx as u16, &header)?;
    }

    workbook.save(path)?;
    info!("Created template anchored to week of {}", monday);

    Ok(())
}

/// Merge a submission into a fresh copy of the template.
///
/// The template is re-read from disk on every call; nothing is cached across
/// requests. Project rows land in submission order from row 5 downward, one
/// row per project, names written verbatim. Hours equal to 0 after rounding
/// leave the cell blank rather than writing a numeric 0.
pub fn merge_submission(
    submission: &TimesheetSubmission,
    config: &EngineConfig,
) -> Result<Workbook, ExportError> {
    if submission.projects.len() > MAX_PROJECT_ROWS {
        return Err(ExportError::TooManyProjects {
            count: submission.projects.len(),
            max: MAX_PROJECT_ROWS,
        });
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    replay_template(Path::new(&config.template_path), worksheet)?;

    let employee_name = if submission.employee_name.trim().is_empty() {
        FALLBACK_EMPLOYEE_NAME
    } else {
        submission.employee_name.as_str()
    };
    worksheet.write_string(EMPLOYEE_NAME_ROW, EMPLOYEE_NAME_COL, employee_name)?;

    for (idx, project) in submission.projects.iter().enumerate() {
        let row = DATA_START_ROW + idx as u32;
        worksheet.write_string(row, 0, &project.name)?;

        for (day_idx, raw_hours) in project.week_hours().iter().enumerate() {
            let hours = if config.rounding_enabled {
                round_to_quarter(*raw_hours)
            } else {
                *raw_hours
            };
            if hours > 0.0 {
                worksheet.write_number(row, DAY_START_COL + day_idx as u16, hours)?;
            }
        }
    }

    Ok(workbook)
}

/// Replay every populated template cell into the output worksheet.
///
/// There is no in-place xlsx editor in this stack, so "load the template and
/// write into it" is realized by copying the template's cells into a new
/// workbook before the submission data goes on top. Observable output is the
/// same as editing the template copy directly.
fn replay_template(path: &Path, worksheet: &mut Worksheet) -> Result<(), ExportError> {
    let mut template: Xlsx<_> = open_workbook(path)?;
    let range = template
        .worksheet_range_at(0)
        .ok_or_else(|| ExportError::Engine("template workbook has no sheets".to_string()))??;

    let Some((row_offset, col_offset)) = range.start() else {
        return Ok(());
    };

    for (row, col, cell) in range.used_cells() {
        let abs_row = row_offset + row as u32;
        let abs_col = cast_col(col_offset as usize + col)?;
        match cell {
            Data::String(s) => {
                worksheet.write_string(abs_row, abs_col, s)?;
            }
            Data::Float(n) => {
                worksheet.write_number(abs_row, abs_col, *n)?;
            }
            Data::Int(n) => {
                worksheet.write_number(abs_row, abs_col, *n as f64)?;
            }
            Data::Bool(b) => {
                worksheet.write_boolean(abs_row, abs_col, *b)?;
            }
            // Formula errors and date cells do not occur in templates this
            // engine creates; skip rather than guess a representation.
            _ => {}
        }
    }

    Ok(())
}

fn cast_col(value: usize) -> Result<u16, ExportError> {
    u16::try_from(value).map_err(|_| ExportError::Engine(format!("column index overflow: {value}")))
}

/// Save the merged workbook under a timestamped name inside
/// `config.output_folder`, creating the folder if needed.
///
/// Filename granularity is one second; two exports completing within the
/// same second collide on the name. That limitation is accepted rather than
/// papered over with a uniqueness suffix, since it would change the
/// observable naming scheme.
pub fn persist(workbook: &mut Workbook, config: &EngineConfig) -> Result<PathBuf, ExportError> {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let filename = format!("Timesheet_{timestamp}.xlsx");

    let output_dir = Path::new(&config.output_folder);
    fs::create_dir_all(output_dir).map_err(|e| ExportError::Engine(e.to_string()))?;

    let save_path = output_dir.join(filename);
    workbook.save(&save_path)?;
    info!("Saved timesheet to {}", save_path.display());

    Ok(save_path)
}

/// Run one full export: ensure the template exists, merge the submission
/// into it, and persist the result. Returns the path of the generated file.
pub fn export_timesheet(
    submission: &TimesheetSubmission,
    config: &EngineConfig,
) -> Result<PathBuf, ExportError> {
    let result = ensure_template(config)
        .and_then(|_| merge_submission(submission, config))
        .and_then(|mut workbook| persist(&mut workbook, config));

    if let Err(e) = &result {
        error!("Export failed: {e}");
    }

    result
}
