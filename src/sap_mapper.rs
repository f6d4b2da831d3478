//! Autoline → SAP customer-creation mapping.
//!
//! Both mappers are pure and total: a missing source field contributes an
//! empty string, it never aborts the mapping or drops a key from the body.

use crate::models::{AutolineRecord, SapCreateRequestBody};
use crate::probe::{field, probe_key};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Tag SAP stores as the referring user of every customer created here.
pub const REFERRING_USER: &str = "AUTOLINE_INTEGRATION";

/// All customers are registered under the head office.
pub const DEFAULT_CITY: &str = "Cairo";
pub const DEFAULT_DISTRICT: &str = "cairo";

const DEFAULT_GENDER: &str = "M";

/// Phone slots of an individual record, probed in this order.
const PHONE_SLOTS: [&str; 4] = ["Phone001", "Phone002", "Phone003", "Phone004"];

/// Address lines holding the street. 004/005 usually carry city and country.
const STREET_SLOTS: [&str; 3] = ["Address001", "Address002", "Address003"];

const EMAIL_KEYS: &[&str] = &["Email", "EmailAddress"];

// local-part@domain.tld
static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

/// Maps a natural-person Autoline record.
pub fn map_individual(record: &AutolineRecord, mk: &str) -> SapCreateRequestBody {
    let first_name = field(record, &["FirstName", "Forename"]);
    let last_name = field(record, &["SurName", "LastName"]);
    let full_name = join_name(&first_name, &last_name);

    let street_parts: Vec<String> = STREET_SLOTS.iter().map(|slot| field(record, &[*slot])).collect();
    let phone = first_phone(record);

    let gender = probe_key(record, &["Sex", "Gender"])
        .into_value()
        .unwrap_or_else(|| DEFAULT_GENDER.to_string());

    tracing::debug!(mk, has_phone = !phone.is_empty(), "Mapped individual customer");

    SapCreateRequestBody {
        national_id: field(record, &["SocialId"]),
        autoline_mk: mk.to_string(),
        name: full_name.clone(),
        first_name,
        last_name,
        gender,
        city: DEFAULT_CITY.to_string(),
        district: DEFAULT_DISTRICT.to_string(),
        street: join_unique_parts(&street_parts),
        telephone: phone.clone(),
        mobile_phone: phone,
        email: sanitize_email(&field(record, EMAIL_KEYS)),
        arabic_name: full_name,
        referring_user: REFERRING_USER.to_string(),
    }
}

/// Maps a company (sales ledger) Autoline record.
///
/// The SAP first/last name slots carry the Arabic and English contact names.
pub fn map_corporate(record: &AutolineRecord, mk: &str) -> SapCreateRequestBody {
    let company_name = field(record, &["CompanyName", "Name"]);
    let arabic_name = join_name(
        &field(record, &["ArabicFirstName"]),
        &field(record, &["ArabicLastName"]),
    );
    let english_name = join_name(
        &field(record, &["EnglishFirstName", "EnglishFirstNmae"]),
        &field(record, &["EnglishLastName"]),
    );

    let street_parts = [
        field(record, &["Address"]),
        field(record, &["District"]),
        field(record, &["Region"]),
        field(record, &["BuildingNumber"]),
    ];
    let phone = field(record, &["MobileNumber", "Mobile"]);

    tracing::debug!(mk, has_phone = !phone.is_empty(), "Mapped corporate customer");

    SapCreateRequestBody {
        national_id: field(
            record,
            &["TaxRegistrationNumber", "TaxRegNo", "TaxNumber"],
        ),
        autoline_mk: mk.to_string(),
        name: company_name.clone(),
        arabic_name: if arabic_name.is_empty() {
            company_name
        } else {
            arabic_name.clone()
        },
        first_name: arabic_name,
        last_name: english_name,
        gender: String::new(),
        city: DEFAULT_CITY.to_string(),
        district: DEFAULT_DISTRICT.to_string(),
        street: join_unique_parts(&street_parts),
        telephone: phone.clone(),
        mobile_phone: phone,
        email: sanitize_email(&field(record, EMAIL_KEYS)),
        referring_user: REFERRING_USER.to_string(),
    }
}

/// First non-empty value of `Phone001`..`Phone004`, or `""`.
pub fn first_phone(record: &AutolineRecord) -> String {
    PHONE_SLOTS
        .iter()
        .find_map(|slot| probe_key(record, &[*slot]).into_value())
        .unwrap_or_default()
}

/// Joins non-empty parts with a space, skipping values already seen
/// (compared ignoring case and whitespace).
pub fn join_unique_parts<S: AsRef<str>>(parts: &[S]) -> String {
    let mut seen = HashSet::new();
    let mut kept: Vec<&str> = Vec::with_capacity(parts.len());

    for part in parts {
        let part = part.as_ref().trim();
        if part.is_empty() {
            continue;
        }
        let key: String = part
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        if seen.insert(key) {
            kept.push(part);
        }
    }

    kept.join(" ")
}

/// Returns the trimmed address when it looks like `local@domain.tld`, else `""`.
pub fn sanitize_email(raw: &str) -> String {
    let email = raw.trim();
    if EMAIL_SHAPE.is_match(email) {
        email.to_string()
    } else {
        if !email.is_empty() {
            tracing::warn!("Dropping malformed email from SAP payload");
        }
        String::new()
    }
}

fn join_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> AutolineRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_street_deduplicates_ignoring_case_and_space() {
        assert_eq!(
            join_unique_parts(&["Giza St", "giza st", "Main Rd"]),
            "Giza St Main Rd"
        );
        assert_eq!(join_unique_parts(&["", "  ", "Main  Rd", "main rd"]), "Main  Rd");
        assert_eq!(join_unique_parts::<&str>(&[]), "");
    }

    #[test]
    fn test_first_phone_skips_blank_slots() {
        let rec = record(json!({
            "Phone001": "",
            "Phone002": " ",
            "Phone003": "0100000000",
            "Phone004": "0200000000"
        }));
        assert_eq!(first_phone(&rec), "0100000000");
        assert_eq!(first_phone(&record(json!({}))), "");
    }

    #[test]
    fn test_email_shape() {
        assert_eq!(sanitize_email("a@b"), "");
        assert_eq!(sanitize_email("a@b.com"), "a@b.com");
        assert_eq!(sanitize_email(" user.name+tag@mail.example.eg "), "user.name+tag@mail.example.eg");
        assert_eq!(sanitize_email("no at sign.com"), "");
        assert_eq!(sanitize_email("@example.com"), "");
        assert_eq!(sanitize_email(""), "");
    }

    #[test]
    fn test_map_individual_full_record() {
        let rec = record(json!({
            "SocialId": "29001011234567",
            "FirstName": "Ahmed",
            "SurName": "Hassan",
            "Sex": "M",
            "Salute": "Mr",
            "Phone001": "",
            "Phone002": "01001234567",
            "Address001": "12 Tahrir St",
            "Address002": "12 tahrir st",
            "Address003": "Dokki",
            "Address004": "Giza",
            "Address005": "Egypt",
            "Email": "ahmed@example.com"
        }));
        let body = map_individual(&rec, "18643");

        assert_eq!(body.national_id, "29001011234567");
        assert_eq!(body.autoline_mk, "18643");
        assert_eq!(body.name, "Ahmed Hassan");
        assert_eq!(body.first_name, "Ahmed");
        assert_eq!(body.last_name, "Hassan");
        assert_eq!(body.gender, "M");
        assert_eq!(body.street, "12 Tahrir St Dokki");
        assert_eq!(body.telephone, "01001234567");
        assert_eq!(body.mobile_phone, "01001234567");
        assert_eq!(body.email, "ahmed@example.com");
        assert_eq!(body.arabic_name, "Ahmed Hassan");
        assert_eq!(body.city, DEFAULT_CITY);
        assert_eq!(body.district, DEFAULT_DISTRICT);
        assert_eq!(body.referring_user, REFERRING_USER);
    }

    #[test]
    fn test_map_individual_tolerates_casing_and_gaps() {
        let rec = record(json!({
            "socialid": 29001011234567u64,
            "firstname": "Mona",
            "email": "mona@invalid"
        }));
        let body = map_individual(&rec, "7");

        assert_eq!(body.national_id, "29001011234567");
        assert_eq!(body.name, "Mona");
        assert_eq!(body.last_name, "");
        assert_eq!(body.gender, "M");
        assert_eq!(body.street, "");
        assert_eq!(body.telephone, "");
        assert_eq!(body.email, "");
    }

    #[test]
    fn test_map_individual_empty_record_keeps_every_key() {
        let body = map_individual(&record(json!({})), "1");
        let value = serde_json::to_value(&body).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 14);
        assert_eq!(obj["Street"], "");
        assert_eq!(obj["Telephone"], "");
        assert_eq!(obj["Email"], "");
        assert_eq!(obj["Gender"], "M");
    }

    #[test]
    fn test_map_corporate() {
        let rec = record(json!({
            "TaxRegistrationNumber": "123-456-789",
            "CompanyName": "Nile Logistics",
            "ArabicFirstName": "شركة",
            "ArabicLastName": "النيل",
            "EnglishFirstNmae": "Nile",
            "EnglishLastName": "Logistics",
            "MobileNumber": "01223334444",
            "Address": "5 Corniche",
            "District": "Maadi",
            "Region": "maadi",
            "BuildingNumber": "5",
            "Email": "info@nile.com.eg"
        }));
        let body = map_corporate(&rec, "900100");

        assert_eq!(body.national_id, "123-456-789");
        assert_eq!(body.name, "Nile Logistics");
        assert_eq!(body.first_name, "شركة النيل");
        assert_eq!(body.last_name, "Nile Logistics");
        assert_eq!(body.arabic_name, "شركة النيل");
        assert_eq!(body.gender, "");
        assert_eq!(body.street, "5 Corniche Maadi 5");
        assert_eq!(body.telephone, "01223334444");
        assert_eq!(body.mobile_phone, "01223334444");
        assert_eq!(body.email, "info@nile.com.eg");
    }

    #[test]
    fn test_map_corporate_falls_back_to_company_name() {
        let rec = record(json!({"CompanyName": "Delta Motors"}));
        let body = map_corporate(&rec, "5");
        assert_eq!(body.arabic_name, "Delta Motors");
        assert_eq!(body.first_name, "");
        assert_eq!(body.street, "");
        assert_eq!(body.telephone, "");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_rejected_email_address_is_not_logged() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(sanitize_email("ahmed.hassan@example"), "");
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Dropping malformed email"));
        assert!(!output.contains("ahmed.hassan"));
    }
}
