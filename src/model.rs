use {
    chrono::{DateTime, Utc},
    rand::Rng,
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

const INVITE_CODE_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const INVITE_CODE_LEN: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: String,
    pub name: String,
    pub invite_code: String,
    pub is_invited: bool,
    pub created_at: DateTime<Utc>,
}

impl Guest {
    /// Expects an already trimmed, non-empty name
    pub fn new(name: String, invite_code: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            invite_code,
            is_invited: true,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> GuestSummary {
        GuestSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            invite_code: self.invite_code.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    pub id: String,
    pub guest_id: String,
    /// Snapshot of the guest's name when the RSVP was submitted
    pub guest_name: String,
    pub is_attending: bool,
    pub submitted_at: DateTime<Utc>,
}

impl Rsvp {
    pub fn new(guest: &Guest, is_attending: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            guest_id: guest.id.clone(),
            guest_name: guest.name.clone(),
            is_attending,
            submitted_at: Utc::now(),
        }
    }
}

/// The whole persisted document, read and written in one piece
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub guests: Vec<Guest>,
    #[serde(default)]
    pub rsvps: Vec<Rsvp>,
}

impl Database {
    pub fn guest_by_id(&self, id: &str) -> Option<&Guest> {
        self.guests.iter().find(|guest| guest.id == id)
    }

    pub fn guest_by_invite_code(&self, code: &str) -> Option<&Guest> {
        self.guests.iter().find(|guest| guest.invite_code == code)
    }

    pub fn rsvp_for_guest(&self, guest_id: &str) -> Option<&Rsvp> {
        self.rsvps.iter().find(|rsvp| rsvp.guest_id == guest_id)
    }

    pub fn has_invite_code(&self, code: &str) -> bool {
        self.guest_by_invite_code(code).is_some()
    }

    pub fn stats(&self) -> RsvpStats {
        let total_guests = self.guests.len();
        let total_rsvps = self.rsvps.len();
        let attending_count = self.rsvps.iter().filter(|rsvp| rsvp.is_attending).count();
        RsvpStats {
            total_guests,
            total_rsvps,
            attending_count,
            not_attending_count: total_rsvps - attending_count,
            // only meaningful while each guest has at most one RSVP
            pending_count: total_guests as i64 - total_rsvps as i64,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpStats {
    pub total_guests: usize,
    #[serde(rename = "totalRSVPs")]
    pub total_rsvps: usize,
    pub attending_count: usize,
    pub not_attending_count: usize,
    pub pending_count: i64,
}

/// Public view of a guest, as handed out with an invite
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestSummary {
    pub id: String,
    pub name: String,
    pub invite_code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteStatus {
    pub guest: GuestSummary,
    #[serde(rename = "hasRSVPed")]
    pub has_rsvped: bool,
    pub rsvp: Option<Rsvp>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AddGuestParams {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRsvpParams {
    #[serde(default)]
    pub is_attending: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRsvpParams {
    #[serde(default)]
    pub is_attending: Option<bool>,
}

/// Form posted from the invite page
#[derive(Debug, Serialize, Deserialize)]
pub struct AttendParams {
    pub attending: Option<bool>,
}

/// Form posted from the admin page
#[derive(Debug, Serialize, Deserialize)]
pub struct NameParams {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CodeParams {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsQuery {
    pub stats: Option<String>,
}

pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_CODE_CHARS[rng.gen_range(0..INVITE_CODE_CHARS.len())] as char)
        .collect()
}
