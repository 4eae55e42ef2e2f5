// The upload pipeline: read and group the audience file, then walk the
// groups sequentially. Each group gets its user list resolved or
// created, a fresh offline user-data job populated and started, and —
// with `--wait` — a blocking poll until the job terminates. A failing
// group is logged and skipped; the remaining groups still run.

use crate::api::AdsClient;
use crate::audience::{read_audience_file, Identifier};
use crate::cli::UploadArgs;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::status;
use indicatif::{ProgressBar, ProgressStyle};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(10);
const MAX_POLL_ATTEMPTS: u32 = 30;

/// Handler for `admatch upload`.
pub fn run(args: &UploadArgs) -> Result<()> {
    let groups = read_audience_file(
        &args.audience_file,
        args.list_type,
        args.already_hashed,
        args.audience_name.as_deref(),
    )?;

    let config = ApiConfig::load(&args.config_file)?;
    let client = AdsClient::connect(&config)?;

    let mut failed = 0usize;
    for (name, identifiers) in &groups {
        tracing::info!("processing data for list '{name}'");
        if identifiers.is_empty() {
            tracing::info!("skipping list '{name}': no compatible data found");
            continue;
        }
        if let Err(e) = upload_group(&client, args, name, identifiers) {
            tracing::error!("upload for list '{name}' failed: {e}");
            failed += 1;
        }
    }

    println!("The process has finished.");
    if failed > 0 {
        return Err(Error::GroupsFailed(failed));
    }
    Ok(())
}

/// Upload one audience group end to end and report its job.
fn upload_group(
    client: &AdsClient,
    args: &UploadArgs,
    list_name: &str,
    identifiers: &[Identifier],
) -> Result<()> {
    let customer_id = &args.customer_id;

    let user_list = match client.find_user_list(customer_id, list_name)? {
        Some(resource_name) => resource_name,
        None => {
            tracing::info!("user list '{list_name}' does not exist yet and will be created");
            let resource_name =
                client.create_user_list(customer_id, list_name, args.list_type, args.app_id.as_deref())?;
            println!("User list with resource name \"{resource_name}\" was created.");
            resource_name
        }
    };

    tracing::info!(
        "uploading {} identifier(s) to list '{list_name}'",
        identifiers.len()
    );
    let job = client.create_offline_user_data_job(customer_id, &user_list)?;
    println!("Created an offline user data job with resource name: \"{job}\".");

    if let Some(message) = client.add_job_operations(&job, identifiers)? {
        // Partial failures drop individual identifiers but the job as
        // a whole still runs.
        tracing::warn!("partial failure while adding operations: {message}");
    }
    client.run_job(&job)?;

    if args.wait {
        wait_for_job(client, customer_id, &job)?;
        status::print_user_list_info(client, customer_id, &user_list)?;
    } else {
        let state = status::fetch_job(client, customer_id, &job)?;
        println!("{}", status::describe_job(&state));
        match state.status.as_deref() {
            Some("SUCCESS") => status::print_user_list_info(client, customer_id, &user_list)?,
            Some("FAILED") => println!(
                "\tFailure reason: {}",
                state.failure_reason.as_deref().unwrap_or("not reported")
            ),
            _ => {
                println!(
                    "To check the job periodically, run this GAQL query with the search operation:\n{}",
                    status::job_status_query(&job)
                );
                println!(
                    "Or re-run: admatch check-job --config-file {} --customer-id {} \
                     --job-resource-name {} --user-list-resource-name {}",
                    args.config_file.display(),
                    customer_id,
                    job,
                    user_list
                );
            }
        }
    }
    Ok(())
}

/// Block polling the job at a fixed interval until SUCCESS or FAILED,
/// bounded so an operator is never stuck on a wedged job.
fn wait_for_job(client: &AdsClient, customer_id: &str, job_resource_name: &str) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message("Waiting for the job to complete...");

    for _ in 0..MAX_POLL_ATTEMPTS {
        let state = status::fetch_job(client, customer_id, job_resource_name)?;
        match state.status.as_deref() {
            Some("SUCCESS") => {
                spinner.finish_and_clear();
                println!("{}", status::describe_job(&state));
                return Ok(());
            }
            Some("FAILED") => {
                spinner.finish_and_clear();
                return Err(Error::JobFailed {
                    resource_name: job_resource_name.to_string(),
                    reason: state
                        .failure_reason
                        .unwrap_or_else(|| "not reported".to_string()),
                });
            }
            other => {
                spinner.set_message(format!(
                    "Job status: {}, next check in {}s",
                    other.unwrap_or("UNKNOWN"),
                    POLL_INTERVAL.as_secs()
                ));
                spinner.tick();
                thread::sleep(POLL_INTERVAL);
            }
        }
    }

    Err(Error::PollTimeout(job_resource_name.to_string()))
}
