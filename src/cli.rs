// Command-line surface. Two subcommands: `upload` drives the whole
// pipeline, `check-job` re-checks a job started by an earlier run.

use crate::audience::ListType;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Uploads hashed CRM contact lists to the ads platform's Customer
/// Match API and tracks the resulting ingestion jobs.
#[derive(Parser, Debug)]
#[command(name = "admatch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read an audience CSV and submit it as offline user-data jobs.
    Upload(UploadArgs),
    /// Check the status of a previously started job.
    CheckJob(CheckJobArgs),
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Credentials file for API access.
    #[arg(long, default_value = "adsapi_config.yaml")]
    pub config_file: PathBuf,

    /// Customer ID under which lists and jobs are created.
    #[arg(long)]
    pub customer_id: String,

    /// CSV file with the audience rows; the first row is the header.
    #[arg(long, default_value = "audience.csv")]
    pub audience_file: PathBuf,

    /// Default list name for rows without a `List` value.
    #[arg(long)]
    pub audience_name: Option<String>,

    /// Customer match upload key type.
    #[arg(long, value_enum, default_value = "contact-info")]
    pub list_type: ListType,

    /// App ID to associate with the list; required by the platform for
    /// mobile advertising lists.
    #[arg(long)]
    pub app_id: Option<String>,

    /// The input values are pre-hashed; forward them verbatim instead
    /// of hashing. Applies to the whole file.
    #[arg(long)]
    pub already_hashed: bool,

    /// Block until each job reaches a terminal status.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct CheckJobArgs {
    /// Credentials file for API access.
    #[arg(long, default_value = "adsapi_config.yaml")]
    pub config_file: PathBuf,

    /// Customer ID the job was created under.
    #[arg(long)]
    pub customer_id: String,

    /// Resource name of the offline user-data job to check.
    #[arg(long)]
    pub job_resource_name: String,

    /// Resource name of the user list the job feeds.
    #[arg(long)]
    pub user_list_resource_name: String,
}
