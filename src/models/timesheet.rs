use serde::{Deserialize, Serialize};

/// One submitted week of hours for a single project.
///
/// Days absent from the request body default to 0 hours, mirroring the
/// frontend which only sends fields the user touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    #[serde(default)]
    pub monday: f64,
    #[serde(default)]
    pub tuesday: f64,
    #[serde(default)]
    pub wednesday: f64,
    #[serde(default)]
    pub thursday: f64,
    #[serde(default)]
    pub friday: f64,
    #[serde(default)]
    pub saturday: f64,
    #[serde(default)]
    pub sunday: f64,
}

impl ProjectEntry {
    /// Hours in fixed Monday-through-Sunday order, matching the template's
    /// day columns.
    pub fn week_hours(&self) -> [f64; 7] {
        [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]
    }
}

/// A full weekly timesheet as posted by the client.
///
/// Project order is significant: it determines row placement in the
/// generated workbook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimesheetSubmission {
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
}
