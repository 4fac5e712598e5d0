use super::{
    ColumnMapping, RunConfig, DEFAULT_EMAIL_COLUMN, DEFAULT_NAME_COLUMN, DEFAULT_TRACK_COLUMN,
};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "club-mailer")]
#[command(about = "A CLI tool for sending templated club emails to every row of a CSV file")]
pub struct CliArgs {
    #[arg(short = 'c', long, help = "Path to the CSV file containing recipient data")]
    pub csv: String,

    #[arg(short = 't', long, help = "Path to the HTML template file")]
    pub template: String,

    #[arg(short = 'r', long, help = "The role substituted for {{ROLE}} (e.g. 'Member', 'Lead')")]
    pub role: String,

    #[arg(short = 's', long, help = "Email subject line")]
    pub subject: String,

    #[arg(short = 'n', long, help = "Sender display name (e.g. 'Tuwaiq Club')")]
    pub name: String,

    #[arg(long, default_value = DEFAULT_NAME_COLUMN, help = "Column name for the recipient's name")]
    pub name_col: String,

    #[arg(long, default_value = DEFAULT_TRACK_COLUMN, help = "Column name for the recipient's track/department")]
    pub track_col: String,

    #[arg(long, default_value = DEFAULT_EMAIL_COLUMN, help = "Column name for the recipient's email")]
    pub email_col: String,

    #[arg(short = 'v', long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl From<CliArgs> for RunConfig {
    fn from(args: CliArgs) -> Self {
        RunConfig {
            source_path: args.csv,
            template_path: args.template,
            role: args.role,
            subject: args.subject,
            sender_display_name: args.name,
            columns: ColumnMapping {
                name: args.name_col,
                track: args.track_col,
                email: args.email_col,
            },
        }
    }
}
