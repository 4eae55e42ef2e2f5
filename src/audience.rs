// Input handling: reads the audience CSV, normalizes and hashes the
// identity fields, and partitions rows into audience groups keyed by
// their resolved list name. Everything here is pure in-memory work; the
// remote API is not touched.

use crate::error::{Error, Result};
use crate::normalize::{normalize_and_sha256, phone_sha256};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Fallback list name for rows without a `List` value when no default
/// audience name was given on the command line.
pub const GENERIC_LIST: &str = "Generic List from the API";

/// Days an uploaded member stays on a list before expiring.
pub const MEMBERSHIP_LIFESPAN_DAYS: u32 = 8;

/// The recognized CSV header columns. Any other header is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Email,
    Phone,
    MobileId,
    UserId,
    FirstName,
    LastName,
    CountryCode,
    ZipCode,
    List,
}

impl FieldKind {
    /// Map a header cell to a field kind, or `None` for unknown names.
    pub fn from_header(name: &str) -> Option<Self> {
        match name {
            "Email" => Some(Self::Email),
            "Phone" => Some(Self::Phone),
            "MobileId" => Some(Self::MobileId),
            "UserId" => Some(Self::UserId),
            "FirstName" => Some(Self::FirstName),
            "LastName" => Some(Self::LastName),
            "CountryCode" => Some(Self::CountryCode),
            "ZipCode" => Some(Self::ZipCode),
            "List" => Some(Self::List),
            _ => None,
        }
    }
}

/// Customer match upload key type. Decides which identifiers a row
/// contributes to its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ListType {
    /// Hashed emails, hashed phone numbers, and hashed name + address.
    ContactInfo,
    /// Mobile advertising IDs, uploaded in the clear.
    MobileAdvertisingId,
    /// Third-party CRM user IDs, uploaded in the clear.
    CrmId,
}

impl ListType {
    /// The platform's enum string for this key type.
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::ContactInfo => "CONTACT_INFO",
            Self::MobileAdvertisingId => "MOBILE_ADVERTISING_ID",
            Self::CrmId => "CRM_ID",
        }
    }
}

/// One user identifier ready for submission. Identity fields are
/// already hashed; country code and postal code travel in the clear as
/// the platform requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    HashedEmail(String),
    HashedPhone(String),
    MobileId(String),
    ThirdPartyUserId(String),
    Address {
        hashed_first_name: String,
        hashed_last_name: String,
        country_code: String,
        postal_code: String,
    },
}

/// Audience groups keyed by resolved list name. Within a group the
/// identifiers keep their source row order.
pub type AudienceGroups = BTreeMap<String, Vec<Identifier>>;

/// Read and group an audience CSV file.
pub fn read_audience_file(
    path: &Path,
    list_type: ListType,
    already_hashed: bool,
    default_name: Option<&str>,
) -> Result<AudienceGroups> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Input(format!("cannot read {}: {e}", path.display())))?;
    let groups = read_audience(file, list_type, already_hashed, default_name)?;
    tracing::info!("processed input file {}", path.display());
    Ok(groups)
}

/// Read records from `input` (first row is the header), hash identity
/// fields unless `already_hashed`, and partition by resolved list name:
/// explicit `List` column, else `default_name`, else [`GENERIC_LIST`].
pub fn read_audience<R: Read>(
    input: R,
    list_type: ListType,
    already_hashed: bool,
    default_name: Option<&str>,
) -> Result<AudienceGroups> {
    let mut reader = csv::Reader::from_reader(input);

    let columns: Vec<FieldKind> = reader
        .headers()?
        .iter()
        .map(|h| {
            FieldKind::from_header(h.trim())
                .ok_or_else(|| Error::Input(format!("unknown header column '{}'", h.trim())))
        })
        .collect::<Result<_>>()?;

    let mut groups = AudienceGroups::new();
    let mut rows = 0usize;

    for record in reader.records() {
        let record = record?;
        let value = |kind| cell(&columns, &record, kind);

        let name = value(FieldKind::List)
            .map(str::trim)
            .or(default_name)
            .unwrap_or(GENERIC_LIST);
        let entry = groups.entry(name.to_string()).or_default();

        // Pre-hashed input is forwarded byte-for-byte; the whole file
        // is either hashed or not, mixed files are unsupported.
        let hash = |raw: &str| -> String {
            if already_hashed {
                raw.to_string()
            } else {
                normalize_and_sha256(raw)
            }
        };

        match list_type {
            ListType::ContactInfo => {
                if let Some(email) = value(FieldKind::Email) {
                    entry.push(Identifier::HashedEmail(hash(email)));
                }
                if let Some(phone) = value(FieldKind::Phone) {
                    let hashed = if already_hashed {
                        phone.to_string()
                    } else {
                        phone_sha256(phone)
                    };
                    entry.push(Identifier::HashedPhone(hashed));
                }
                // An address identifier needs all four parts; partial
                // addresses are dropped.
                if let (Some(first), Some(last), Some(country), Some(zip)) = (
                    value(FieldKind::FirstName),
                    value(FieldKind::LastName),
                    value(FieldKind::CountryCode),
                    value(FieldKind::ZipCode),
                ) {
                    entry.push(Identifier::Address {
                        hashed_first_name: hash(first),
                        hashed_last_name: hash(last),
                        country_code: country.trim().to_string(),
                        postal_code: zip.trim().to_string(),
                    });
                }
            }
            ListType::MobileAdvertisingId => {
                if let Some(id) = value(FieldKind::MobileId) {
                    entry.push(Identifier::MobileId(id.trim().to_string()));
                }
            }
            ListType::CrmId => {
                if let Some(id) = value(FieldKind::UserId) {
                    entry.push(Identifier::ThirdPartyUserId(id.trim().to_string()));
                }
            }
        }
        rows += 1;
    }

    tracing::info!("processed {rows} data rows into {} group(s)", groups.len());
    Ok(groups)
}

/// Look up a record cell by field kind. A cell counts as present only
/// when it has non-whitespace content; empty cells are omitted, never
/// hashed.
fn cell<'r>(
    columns: &[FieldKind],
    record: &'r csv::StringRecord,
    kind: FieldKind,
) -> Option<&'r str> {
    columns
        .iter()
        .position(|&c| c == kind)
        .and_then(|i| record.get(i))
        .filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_and_sha256;

    fn read(csv: &str, list_type: ListType, already_hashed: bool, default: Option<&str>) -> AudienceGroups {
        read_audience(csv.as_bytes(), list_type, already_hashed, default).unwrap()
    }

    #[test]
    fn groups_by_list_column_with_cli_default() {
        // Two rows name a list, one falls back to the CLI default.
        let input = "Email,List\n\
                     a@example.com,Sports\n\
                     b@example.com,Sports\n\
                     c@example.com,\n";
        let groups = read(input, ListType::ContactInfo, false, Some("Shoes"));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["Sports"].len(), 2);
        assert_eq!(groups["Shoes"].len(), 1);
    }

    #[test]
    fn falls_back_to_generic_list_without_default() {
        let input = "Email\na@example.com\n";
        let groups = read(input, ListType::ContactInfo, false, None);
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key(GENERIC_LIST));
    }

    #[test]
    fn email_is_normalized_and_hashed() {
        let input = "Email\nTest@Example.com\n";
        let groups = read(input, ListType::ContactInfo, false, None);
        assert_eq!(
            groups[GENERIC_LIST],
            vec![Identifier::HashedEmail(
                "973dfe463ec85785f5f95af5ba3906eedb2d931c24e69824a89ea65dba4e813b".into()
            )]
        );
    }

    #[test]
    fn already_hashed_values_forward_unchanged() {
        let digest = "973dfe463ec85785f5f95af5ba3906eedb2d931c24e69824a89ea65dba4e813b";
        let input = format!("Email\n{digest}\n");
        let groups = read(&input, ListType::ContactInfo, true, None);
        // Forwarded byte-for-byte, never hashed a second time.
        assert_eq!(
            groups[GENERIC_LIST],
            vec![Identifier::HashedEmail(digest.into())]
        );
    }

    #[test]
    fn empty_cells_are_omitted() {
        let input = "Email,Phone\n,415-555-0123\n";
        let groups = read(input, ListType::ContactInfo, false, None);
        let ids = &groups[GENERIC_LIST];
        assert_eq!(ids.len(), 1);
        assert!(matches!(ids[0], Identifier::HashedPhone(_)));
    }

    #[test]
    fn partial_address_is_dropped() {
        // Missing ZipCode: no address identifier is produced.
        let input = "FirstName,LastName,CountryCode,ZipCode\nAlex,Doe,US,\n";
        let groups = read(input, ListType::ContactInfo, false, None);
        assert!(groups[GENERIC_LIST].is_empty());
    }

    #[test]
    fn complete_address_hashes_names_only() {
        let input = "FirstName,LastName,CountryCode,ZipCode\nAlex,Doe,US,94105\n";
        let groups = read(input, ListType::ContactInfo, false, None);
        assert_eq!(
            groups[GENERIC_LIST],
            vec![Identifier::Address {
                hashed_first_name: normalize_and_sha256("Alex"),
                hashed_last_name: normalize_and_sha256("Doe"),
                country_code: "US".into(),
                postal_code: "94105".into(),
            }]
        );
    }

    #[test]
    fn row_order_is_preserved_within_a_group() {
        let input = "Email\nfirst@example.com\nsecond@example.com\nthird@example.com\n";
        let groups = read(input, ListType::ContactInfo, false, None);
        let expected: Vec<Identifier> = ["first@example.com", "second@example.com", "third@example.com"]
            .iter()
            .map(|e| Identifier::HashedEmail(normalize_and_sha256(e)))
            .collect();
        assert_eq!(groups[GENERIC_LIST], expected);
    }

    #[test]
    fn mobile_list_takes_only_mobile_ids() {
        let input = "Email,MobileId\nuser@example.com,abcd-1234\n";
        let groups = read(input, ListType::MobileAdvertisingId, false, None);
        assert_eq!(
            groups[GENERIC_LIST],
            vec![Identifier::MobileId("abcd-1234".into())]
        );
    }

    #[test]
    fn crm_list_takes_only_user_ids() {
        let input = "UserId,List\ncrm-42,Loyalty\n";
        let groups = read(input, ListType::CrmId, false, None);
        assert_eq!(
            groups["Loyalty"],
            vec![Identifier::ThirdPartyUserId("crm-42".into())]
        );
    }

    #[test]
    fn unknown_header_is_rejected() {
        let err = read_audience(
            "Email,Nickname\na@b.c,al\n".as_bytes(),
            ListType::ContactInfo,
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Input(ref msg) if msg.contains("Nickname")));
    }

    #[test]
    fn rows_with_no_compatible_data_leave_group_empty() {
        // Email rows under a CRM_ID upload contribute nothing, but the
        // group still exists so the caller can report the skip.
        let input = "Email,List\na@example.com,Sports\n";
        let groups = read(input, ListType::CrmId, false, None);
        assert!(groups["Sports"].is_empty());
    }
}
