#[cfg(feature = "cli")]
pub mod cli;
pub mod relay;

use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};

pub const DEFAULT_NAME_COLUMN: &str = "Name";
pub const DEFAULT_TRACK_COLUMN: &str = "Track";
pub const DEFAULT_EMAIL_COLUMN: &str = "Email";

/// Which CSV header feeds each recipient field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub name: String,
    pub track: String,
    pub email: String,
}

impl ColumnMapping {
    /// Column names in the order they are checked and reported.
    pub fn required(&self) -> [&str; 3] {
        [&self.name, &self.track, &self.email]
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME_COLUMN.to_string(),
            track: DEFAULT_TRACK_COLUMN.to_string(),
            email: DEFAULT_EMAIL_COLUMN.to_string(),
        }
    }
}

/// Parameters of one mail-merge run. Built once from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_path: String,
    pub template_path: String,
    pub role: String,
    pub subject: String,
    pub sender_display_name: String,
    pub columns: ColumnMapping,
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validate_path("csv", &self.source_path)?;
        validate_path("template", &self.template_path)?;
        validate_non_empty_string("name_col", &self.columns.name)?;
        validate_non_empty_string("track_col", &self.columns.track)?;
        validate_non_empty_string("email_col", &self.columns.email)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_config() -> RunConfig {
        RunConfig {
            source_path: "members.csv".to_string(),
            template_path: "welcome.html".to_string(),
            role: "Member".to_string(),
            subject: "Welcome".to_string(),
            sender_display_name: "Tuwaiq Club".to_string(),
            columns: ColumnMapping::default(),
        }
    }

    #[test]
    fn test_valid_run_config() {
        assert!(run_config().validate().is_ok());
    }

    #[test]
    fn test_empty_column_name_is_rejected() {
        let mut config = run_config();
        config.columns.email = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_paths_are_rejected() {
        let mut config = run_config();
        config.template_path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_free_text_fields_may_be_empty() {
        let mut config = run_config();
        config.role = String::new();
        config.subject = String::new();
        assert!(config.validate().is_ok());
    }
}
