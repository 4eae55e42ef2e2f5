// API client module: a small blocking HTTP client for the ads
// platform's REST surface. It covers exactly the operations the
// uploader consumes: GAQL search, user-list creation, and the offline
// user-data job calls. Request and response shapes follow the
// platform's JSON encoding (camelCase keys, int64 values as strings).

use crate::audience::{Identifier, ListType, MEMBERSHIP_LIFESPAN_DAYS};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

const DEFAULT_API_URL: &str = "https://googleads.googleapis.com/v14";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Blocking client holding the base URL and the per-run auth headers.
/// Built once from the config and shared by all remote calls.
pub struct AdsClient {
    http: Client,
    base_url: String,
    headers: HeaderMap,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

/// One page of GAQL search results. Only the fields this tool selects
/// are modeled; everything else in the response is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResponse {
    pub results: Vec<SearchRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRow {
    pub user_list: Option<UserListRow>,
    pub offline_user_data_job: Option<OfflineJobRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserListRow {
    pub resource_name: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub size_for_display: Option<String>,
    pub size_for_search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfflineJobRow {
    pub resource_name: String,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub status: Option<String>,
    pub failure_reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserListMutate<'a> {
    operations: [UserListOperation<'a>; 1],
}

#[derive(Serialize)]
struct UserListOperation<'a> {
    create: UserListCreate<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserListCreate<'a> {
    name: &'a str,
    description: &'a str,
    membership_life_span: u32,
    crm_based_user_list: CrmBasedUserList<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CrmBasedUserList<'a> {
    upload_key_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_id: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutateResponse {
    results: Vec<MutateResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutateResult {
    resource_name: String,
}

#[derive(Serialize)]
struct CreateJobRequest<'a> {
    job: OfflineJob<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OfflineJob<'a> {
    #[serde(rename = "type")]
    job_type: &'static str,
    customer_match_user_list_metadata: UserListMetadata<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserListMetadata<'a> {
    user_list: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateJobResponse {
    resource_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddOperationsRequest {
    enable_partial_failure: bool,
    operations: Vec<JobOperation>,
}

#[derive(Serialize)]
struct JobOperation {
    create: UserData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserData {
    user_identifiers: [UserIdentifierBody; 1],
}

/// Wire shape of one user identifier; exactly one field is set.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserIdentifierBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    hashed_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hashed_phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mobile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    third_party_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_info: Option<AddressInfo>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressInfo {
    hashed_first_name: String,
    hashed_last_name: String,
    country_code: String,
    postal_code: String,
}

impl From<&Identifier> for UserIdentifierBody {
    fn from(id: &Identifier) -> Self {
        let mut body = UserIdentifierBody {
            hashed_email: None,
            hashed_phone_number: None,
            mobile_id: None,
            third_party_user_id: None,
            address_info: None,
        };
        match id {
            Identifier::HashedEmail(v) => body.hashed_email = Some(v.clone()),
            Identifier::HashedPhone(v) => body.hashed_phone_number = Some(v.clone()),
            Identifier::MobileId(v) => body.mobile_id = Some(v.clone()),
            Identifier::ThirdPartyUserId(v) => body.third_party_user_id = Some(v.clone()),
            Identifier::Address {
                hashed_first_name,
                hashed_last_name,
                country_code,
                postal_code,
            } => {
                body.address_info = Some(AddressInfo {
                    hashed_first_name: hashed_first_name.clone(),
                    hashed_last_name: hashed_last_name.clone(),
                    country_code: country_code.clone(),
                    postal_code: postal_code.clone(),
                })
            }
        }
        body
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AddOperationsResponse {
    partial_failure_error: Option<ApiStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiStatus {
    code: i32,
    message: String,
}

impl AdsClient {
    /// Build a client from the credentials file: exchange the refresh
    /// token for an access token, then fix the auth headers for the
    /// rest of the run.
    ///
    /// The endpoints default to the production platform and can be
    /// overridden with `ADS_API_URL` / `ADS_TOKEN_URL` for testing
    /// against a stub server.
    pub fn connect(config: &ApiConfig) -> Result<Self> {
        let base_url = std::env::var("ADS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let token_url = std::env::var("ADS_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.into());
        let http = Client::builder().build()?;

        let token = fetch_access_token(&http, &token_url, config)?;

        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {token}");
        headers.insert(AUTHORIZATION, header_value(&bearer)?);
        headers.insert("developer-token", header_value(&config.developer_token)?);
        if let Some(login) = &config.login_customer_id {
            headers.insert("login-customer-id", header_value(login)?);
        }

        Ok(AdsClient {
            http,
            base_url,
            headers,
        })
    }

    /// Run a GAQL search under the given customer account.
    pub fn search(&self, customer_id: &str, query: &str) -> Result<SearchResponse> {
        let url = format!("{}/customers/{customer_id}/googleAds:search", self.base_url);
        self.post_json(&url, &SearchRequest { query })
    }

    /// Look up a user list by name. Returns its resource name, or
    /// `None` when no list with that name exists yet.
    pub fn find_user_list(&self, customer_id: &str, list_name: &str) -> Result<Option<String>> {
        let query = format!(
            "SELECT user_list.id, user_list.name FROM user_list \
             WHERE user_list.name = '{}'",
            escape_gaql(list_name)
        );
        let response = self.search(customer_id, &query)?;
        Ok(response
            .results
            .into_iter()
            .filter_map(|row| row.user_list)
            .map(|list| list.resource_name)
            .next_back())
    }

    /// Create a CRM-based user list and return its resource name.
    pub fn create_user_list(
        &self,
        customer_id: &str,
        list_name: &str,
        list_type: ListType,
        app_id: Option<&str>,
    ) -> Result<String> {
        let url = format!("{}/customers/{customer_id}/userLists:mutate", self.base_url);
        let body = UserListMutate {
            operations: [UserListOperation {
                create: UserListCreate {
                    name: list_name,
                    description: "This is a list of users uploaded using Ads API.",
                    membership_life_span: MEMBERSHIP_LIFESPAN_DAYS,
                    crm_based_user_list: CrmBasedUserList {
                        upload_key_type: list_type.as_api_str(),
                        app_id,
                    },
                },
            }],
        };
        let response: MutateResponse = self.post_json(&url, &body)?;
        response
            .results
            .into_iter()
            .map(|r| r.resource_name)
            .next()
            .ok_or_else(|| Error::Api {
                status: reqwest::StatusCode::OK,
                body: "mutate response contained no results".into(),
            })
    }

    /// Create an offline user-data job scoped to `user_list` and return
    /// the job resource name.
    pub fn create_offline_user_data_job(
        &self,
        customer_id: &str,
        user_list: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/customers/{customer_id}/offlineUserDataJobs:create",
            self.base_url
        );
        let body = CreateJobRequest {
            job: OfflineJob {
                job_type: "CUSTOMER_MATCH_USER_LIST",
                customer_match_user_list_metadata: UserListMetadata { user_list },
            },
        };
        let response: CreateJobResponse = self.post_json(&url, &body)?;
        Ok(response.resource_name)
    }

    /// Add one create-operation per identifier to a pending job.
    /// Partial failure is enabled; when the platform reports one, its
    /// message is returned so the caller can log it.
    pub fn add_job_operations(
        &self,
        job_resource_name: &str,
        identifiers: &[Identifier],
    ) -> Result<Option<String>> {
        let url = format!("{}/{job_resource_name}:addOperations", self.base_url);
        let body = AddOperationsRequest {
            enable_partial_failure: true,
            operations: identifiers
                .iter()
                .map(|id| JobOperation {
                    create: UserData {
                        user_identifiers: [id.into()],
                    },
                })
                .collect(),
        };
        let response: AddOperationsResponse = self.post_json(&url, &body)?;
        Ok(response
            .partial_failure_error
            .filter(|status| status.code != 0)
            .map(|status| status.message))
    }

    /// Start asynchronous processing of a fully-populated job.
    pub fn run_job(&self, job_resource_name: &str) -> Result<()> {
        let url = format!("{}/{job_resource_name}:run", self.base_url);
        let _: serde_json::Value = self.post_json(&url, &serde_json::json!({}))?;
        Ok(())
    }

    /// POST a JSON body and parse a JSON response. Any non-success
    /// status becomes an `Error::Api` carrying the response body.
    fn post_json<T: DeserializeOwned>(&self, url: &str, body: &impl Serialize) -> Result<T> {
        let res = self
            .http
            .post(url)
            .headers(self.headers.clone())
            .json(body)
            .send()?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_else(|_| String::new());
            return Err(Error::Api { status, body });
        }
        Ok(res.json()?)
    }
}

/// Exchange the long-lived refresh token for a short-lived access token.
fn fetch_access_token(http: &Client, token_url: &str, config: &ApiConfig) -> Result<String> {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", config.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];
    let res = http.post(token_url).form(&params).send()?;
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().unwrap_or_else(|_| String::new());
        return Err(Error::Api { status, body });
    }
    let token: TokenResponse = res.json()?;
    Ok(token.access_token)
}

fn header_value(s: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(s)
        .map_err(|_| Error::Config(format!("credential value is not a valid header: {s:?}")))
}

/// Escape single quotes for interpolation into a GAQL string literal.
fn escape_gaql(s: &str) -> String {
    s.replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_list_create_body_shape() {
        let body = UserListMutate {
            operations: [UserListOperation {
                create: UserListCreate {
                    name: "Sports",
                    description: "This is a list of users uploaded using Ads API.",
                    membership_life_span: MEMBERSHIP_LIFESPAN_DAYS,
                    crm_based_user_list: CrmBasedUserList {
                        upload_key_type: ListType::ContactInfo.as_api_str(),
                        app_id: None,
                    },
                },
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "operations": [{
                    "create": {
                        "name": "Sports",
                        "description": "This is a list of users uploaded using Ads API.",
                        "membershipLifeSpan": 8,
                        "crmBasedUserList": {"uploadKeyType": "CONTACT_INFO"}
                    }
                }]
            })
        );
    }

    #[test]
    fn mobile_list_carries_app_id() {
        let body = CrmBasedUserList {
            upload_key_type: ListType::MobileAdvertisingId.as_api_str(),
            app_id: Some("com.example.app"),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"uploadKeyType": "MOBILE_ADVERTISING_ID", "appId": "com.example.app"})
        );
    }

    #[test]
    fn identifier_bodies_set_exactly_one_field() {
        let email: UserIdentifierBody = (&Identifier::HashedEmail("abc123".into())).into();
        assert_eq!(
            serde_json::to_value(&email).unwrap(),
            json!({"hashedEmail": "abc123"})
        );

        let phone: UserIdentifierBody = (&Identifier::HashedPhone("def456".into())).into();
        assert_eq!(
            serde_json::to_value(&phone).unwrap(),
            json!({"hashedPhoneNumber": "def456"})
        );

        let address: UserIdentifierBody = (&Identifier::Address {
            hashed_first_name: "f".into(),
            hashed_last_name: "l".into(),
            country_code: "US".into(),
            postal_code: "94105".into(),
        })
            .into();
        assert_eq!(
            serde_json::to_value(&address).unwrap(),
            json!({
                "addressInfo": {
                    "hashedFirstName": "f",
                    "hashedLastName": "l",
                    "countryCode": "US",
                    "postalCode": "94105"
                }
            })
        );
    }

    #[test]
    fn job_create_body_shape() {
        let body = CreateJobRequest {
            job: OfflineJob {
                job_type: "CUSTOMER_MATCH_USER_LIST",
                customer_match_user_list_metadata: UserListMetadata {
                    user_list: "customers/123/userLists/456",
                },
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "job": {
                    "type": "CUSTOMER_MATCH_USER_LIST",
                    "customerMatchUserListMetadata": {
                        "userList": "customers/123/userLists/456"
                    }
                }
            })
        );
    }

    #[test]
    fn job_status_rows_parse_string_int64s() {
        let raw = json!({
            "results": [{
                "offlineUserDataJob": {
                    "resourceName": "customers/123/offlineUserDataJobs/789",
                    "id": "789",
                    "type": "CUSTOMER_MATCH_USER_LIST",
                    "status": "RUNNING"
                }
            }]
        });
        let parsed: SearchResponse = serde_json::from_value(raw).unwrap();
        let job = parsed.results[0].offline_user_data_job.as_ref().unwrap();
        assert_eq!(job.id.as_deref(), Some("789"));
        assert_eq!(job.status.as_deref(), Some("RUNNING"));
        assert!(job.failure_reason.is_none());
    }

    #[test]
    fn gaql_escaping_handles_quotes() {
        assert_eq!(escape_gaql("O'Brien's List"), "O\\'Brien\\'s List");
    }
}
