// Job status and user-list reporting. Shared by the upload pipeline
// (post-submission check and `--wait` polling) and the standalone
// `check-job` subcommand.

use crate::api::{AdsClient, OfflineJobRow};
use crate::cli::CheckJobArgs;
use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// GAQL query that reads one offline user-data job by resource name.
/// Printed for operators so they can re-check later by hand.
pub fn job_status_query(job_resource_name: &str) -> String {
    format!(
        "SELECT offline_user_data_job.resource_name, offline_user_data_job.id, \
         offline_user_data_job.status, offline_user_data_job.type, \
         offline_user_data_job.failure_reason \
         FROM offline_user_data_job \
         WHERE offline_user_data_job.resource_name = '{job_resource_name}' LIMIT 1"
    )
}

/// Fetch the current state of a job.
pub fn fetch_job(
    client: &AdsClient,
    customer_id: &str,
    job_resource_name: &str,
) -> Result<OfflineJobRow> {
    let query = job_status_query(job_resource_name);
    let response = client.search(customer_id, &query)?;
    response
        .results
        .into_iter()
        .filter_map(|row| row.offline_user_data_job)
        .next()
        .ok_or_else(|| Error::Api {
            status: reqwest::StatusCode::OK,
            body: format!("job '{job_resource_name}' not found in search response"),
        })
}

/// One line of human-readable job state.
pub fn describe_job(job: &OfflineJobRow) -> String {
    format!(
        "Offline user data job ID '{}' with type '{}' has status: {}",
        job.id.as_deref().unwrap_or("?"),
        job.job_type.as_deref().unwrap_or("?"),
        job.status.as_deref().unwrap_or("UNKNOWN")
    )
}

/// Print the size estimates for a user list, plus the populate-delay
/// reminder. Sizes show as zero until the list is large enough for the
/// platform to report them.
pub fn print_user_list_info(
    client: &AdsClient,
    customer_id: &str,
    user_list_resource_name: &str,
) -> Result<()> {
    let query = format!(
        "SELECT user_list.size_for_display, user_list.size_for_search \
         FROM user_list \
         WHERE user_list.resource_name = '{user_list_resource_name}'"
    );
    let response = client.search(customer_id, &query)?;
    let list = response
        .results
        .into_iter()
        .filter_map(|row| row.user_list)
        .next()
        .ok_or_else(|| Error::Api {
            status: reqwest::StatusCode::OK,
            body: format!("user list '{user_list_resource_name}' not found"),
        })?;

    println!(
        "The estimated number of users on list '{}' is {} for Display and {} for Search.",
        list.resource_name,
        list.size_for_display.as_deref().unwrap_or("0"),
        list.size_for_search.as_deref().unwrap_or("0"),
    );
    println!(
        "Reminder: it may take several hours for the user list to be populated; \
         estimates of size zero are possible."
    );
    Ok(())
}

/// Handler for `admatch check-job`: one-shot status report.
pub fn run(args: &CheckJobArgs) -> Result<()> {
    let config = ApiConfig::load(&args.config_file)?;
    let client = AdsClient::connect(&config)?;

    let job = fetch_job(&client, &args.customer_id, &args.job_resource_name)?;
    println!("{}", describe_job(&job));

    match job.status.as_deref() {
        Some("SUCCESS") => {
            print_user_list_info(&client, &args.customer_id, &args.user_list_resource_name)?
        }
        Some("FAILED") => println!(
            "\tFailure reason: {}",
            job.failure_reason.as_deref().unwrap_or("not reported")
        ),
        _ => println!("The job is still running."),
    }
    Ok(())
}
