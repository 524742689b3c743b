use {
    crate::{error::Error, model::Database},
    csv::{Error as CsvError, WriterBuilder},
    serde::Serialize,
    std::io,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GuestRow<'a> {
    name: &'a str,
    invite_code: &'a str,
    status: &'static str,
    submitted_at: String,
}

/// One row per guest, in insertion order, with their answer if any
pub fn guest_report(db: &Database) -> Result<String, Error> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(vec![]);
    for guest in &db.guests {
        let rsvp = db.rsvp_for_guest(&guest.id);
        let status = match rsvp {
            Some(rsvp) if rsvp.is_attending => "attending",
            Some(_) => "not attending",
            None => "pending",
        };
        wtr.serialize(GuestRow {
            name: &guest.name,
            invite_code: &guest.invite_code,
            status,
            submitted_at: rsvp
                .map(|rsvp| rsvp.submitted_at.to_rfc3339())
                .unwrap_or_default(),
        })?;
    }
    if db.guests.is_empty() {
        wtr.write_record(["name", "inviteCode", "status", "submittedAt"])?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|error| CsvError::from(error.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|error| CsvError::from(io::Error::new(io::ErrorKind::InvalidData, error)).into())
}
