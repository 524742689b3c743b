use {
    crate::{
        backend::Backend,
        error::Error,
        export,
        model::{generate_invite_code, Database, Guest, InviteStatus, Rsvp, RsvpStats},
    },
    log::info,
    std::sync::Arc,
    tokio::sync::Mutex,
};

pub static NAME_REQUIRED_MESSAGE: &str = "Name is required and must be a non-empty string";
pub static GUEST_NOT_FOUND_MESSAGE: &str = "Guest not found";
pub static RSVP_NOT_FOUND_MESSAGE: &str = "RSVP not found";
pub static INVALID_INVITE_MESSAGE: &str = "Invalid invite code";
pub static ATTENDANCE_REQUIRED_MESSAGE: &str = "isAttending must be a boolean value";

/// Guest and RSVP operations over one persisted document.
///
/// Reads load the whole document. Mutations hold the writer lock for the
/// entire load, modify, save cycle so writes from this process never
/// interleave. Processes sharing a remote document are not coordinated.
#[derive(Clone)]
pub struct GuestStore {
    backend: Arc<dyn Backend>,
    writer: Arc<Mutex<()>>,
}

impl GuestStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    async fn load(&self) -> Result<Database, Error> {
        self.backend.load().await
    }

    /// Runs `f` against a fresh copy of the document and saves it if `f`
    /// asks for it, all while holding the writer lock.
    async fn mutate<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Database) -> Result<(T, bool), Error>,
    {
        let _guard = self.writer.lock().await;
        let mut db = self.backend.load().await?;
        let (result, changed) = f(&mut db)?;
        if changed {
            self.backend.save(&db).await?;
        }
        Ok(result)
    }

    pub async fn list_guests(&self) -> Result<Vec<Guest>, Error> {
        Ok(self.load().await?.guests)
    }

    pub async fn create_guest(&self, name: &str) -> Result<Guest, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation(NAME_REQUIRED_MESSAGE.to_string()));
        }
        let guest = self
            .mutate(|db| {
                let mut code = generate_invite_code();
                while db.has_invite_code(&code) {
                    code = generate_invite_code();
                }
                let guest = Guest::new(name.to_string(), code);
                db.guests.push(guest.clone());
                Ok((guest, true))
            })
            .await?;
        info!("Added guest {} with invite code {}", guest.name, guest.invite_code);
        Ok(guest)
    }

    /// Exact match; callers upper-case user input first
    pub async fn get_guest_by_invite_code(&self, code: &str) -> Result<Option<Guest>, Error> {
        Ok(self.load().await?.guest_by_invite_code(code).cloned())
    }

    pub async fn get_guest_by_id(&self, id: &str) -> Result<Option<Guest>, Error> {
        Ok(self.load().await?.guest_by_id(id).cloned())
    }

    /// Removes the guest and every RSVP pointing at it in one write.
    /// Returns false if there was no such guest.
    pub async fn delete_guest(&self, id: &str) -> Result<bool, Error> {
        let deleted = self
            .mutate(|db| {
                let before = db.guests.len();
                db.guests.retain(|guest| guest.id != id);
                if db.guests.len() == before {
                    return Ok((false, false));
                }
                db.rsvps.retain(|rsvp| rsvp.guest_id != id);
                Ok((true, true))
            })
            .await?;
        if deleted {
            info!("Deleted guest {} and their RSVPs", id);
        }
        Ok(deleted)
    }

    pub async fn clear_all(&self) -> Result<(), Error> {
        self.mutate(|db| {
            *db = Database::default();
            Ok(((), true))
        })
        .await?;
        info!("Cleared all guests and RSVPs");
        Ok(())
    }

    pub async fn list_rsvps(&self) -> Result<Vec<Rsvp>, Error> {
        Ok(self.load().await?.rsvps)
    }

    /// Records an RSVP for a known guest. Does not check for an existing
    /// RSVP; use [`GuestStore::submit_invite_rsvp`] for the guarded flow.
    pub async fn submit_rsvp(&self, guest_id: &str, is_attending: bool) -> Result<Rsvp, Error> {
        let rsvp = self
            .mutate(|db| {
                let guest = db
                    .guest_by_id(guest_id)
                    .ok_or_else(|| Error::NotFound(GUEST_NOT_FOUND_MESSAGE.to_string()))?;
                let rsvp = Rsvp::new(guest, is_attending);
                db.rsvps.push(rsvp.clone());
                Ok((rsvp, true))
            })
            .await?;
        info!("New RSVP from {}: attending={}", rsvp.guest_name, rsvp.is_attending);
        Ok(rsvp)
    }

    /// Resolves the invite code, rejects a second answer and records the
    /// RSVP without releasing the writer lock in between.
    pub async fn submit_invite_rsvp(&self, code: &str, is_attending: bool) -> Result<Rsvp, Error> {
        let rsvp = self
            .mutate(|db| {
                let guest = db
                    .guest_by_invite_code(code)
                    .ok_or_else(|| Error::NotFound(INVALID_INVITE_MESSAGE.to_string()))?;
                if db.rsvp_for_guest(&guest.id).is_some() {
                    return Err(Error::AlreadySubmitted);
                }
                let rsvp = Rsvp::new(guest, is_attending);
                db.rsvps.push(rsvp.clone());
                Ok((rsvp, true))
            })
            .await?;
        info!("New RSVP from {}: attending={}", rsvp.guest_name, rsvp.is_attending);
        Ok(rsvp)
    }

    pub async fn invite_status(&self, code: &str) -> Result<Option<InviteStatus>, Error> {
        let db = self.load().await?;
        Ok(db.guest_by_invite_code(code).map(|guest| {
            let rsvp = db.rsvp_for_guest(&guest.id).cloned();
            InviteStatus {
                guest: guest.summary(),
                has_rsvped: rsvp.is_some(),
                rsvp,
            }
        }))
    }

    pub async fn get_rsvp_by_id(&self, id: &str) -> Result<Option<Rsvp>, Error> {
        Ok(self.load().await?.rsvps.into_iter().find(|rsvp| rsvp.id == id))
    }

    /// Only the attendance flag can change; `id` and `submitted_at` are kept
    pub async fn update_rsvp(
        &self,
        id: &str,
        is_attending: Option<bool>,
    ) -> Result<Option<Rsvp>, Error> {
        self.mutate(|db| match db.rsvps.iter_mut().find(|rsvp| rsvp.id == id) {
            Some(rsvp) => {
                if let Some(is_attending) = is_attending {
                    rsvp.is_attending = is_attending;
                }
                Ok((Some(rsvp.clone()), true))
            }
            None => Ok((None, false)),
        })
        .await
    }

    pub async fn delete_rsvp(&self, id: &str) -> Result<bool, Error> {
        self.mutate(|db| {
            let before = db.rsvps.len();
            db.rsvps.retain(|rsvp| rsvp.id != id);
            let deleted = db.rsvps.len() != before;
            Ok((deleted, deleted))
        })
        .await
    }

    pub async fn stats(&self) -> Result<RsvpStats, Error> {
        Ok(self.load().await?.stats())
    }

    pub async fn snapshot(&self) -> Result<Database, Error> {
        self.load().await
    }

    pub async fn export_csv(&self) -> Result<String, Error> {
        export::guest_report(&self.load().await?)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::backend::{FileBackend, MemoryBackend},
        std::collections::HashSet,
        tempfile::tempdir,
    };

    fn memory_store() -> GuestStore {
        GuestStore::new(Arc::new(MemoryBackend::new()))
    }

    #[actix_rt::test]
    async fn create_trims_and_lists_in_order() {
        let store = memory_store();
        let ana = store.create_guest("  Ana ").await.unwrap();
        let bo = store.create_guest("Bo").await.unwrap();
        assert_eq!(ana.name, "Ana");
        assert!(ana.is_invited);
        assert_eq!(ana.invite_code.len(), 8);

        let guests = store.list_guests().await.unwrap();
        assert_eq!(guests, vec![ana, bo]);
    }

    #[actix_rt::test]
    async fn create_rejects_blank_name() {
        let store = memory_store();
        for name in ["", "   ", "\t\n"] {
            let error = store.create_guest(name).await.unwrap_err();
            assert!(matches!(error, Error::Validation(_)));
        }
        assert!(store.list_guests().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn invite_codes_are_unique() {
        let store = memory_store();
        for i in 0..200 {
            store.create_guest(&format!("Guest {}", i)).await.unwrap();
        }
        let guests = store.list_guests().await.unwrap();
        let codes: HashSet<_> = guests.iter().map(|g| g.invite_code.clone()).collect();
        assert_eq!(codes.len(), guests.len());
    }

    #[actix_rt::test]
    async fn lookups() {
        let store = memory_store();
        let ana = store.create_guest("Ana").await.unwrap();
        assert_eq!(
            store.get_guest_by_invite_code(&ana.invite_code).await.unwrap(),
            Some(ana.clone())
        );
        if ana.invite_code.chars().any(|c| c.is_ascii_alphabetic()) {
            let lower = ana.invite_code.to_lowercase();
            assert_eq!(store.get_guest_by_invite_code(&lower).await.unwrap(), None);
        }
        assert_eq!(store.get_guest_by_id(&ana.id).await.unwrap(), Some(ana));
        assert_eq!(store.get_guest_by_id("nope").await.unwrap(), None);
    }

    #[actix_rt::test]
    async fn delete_guest_cascades() {
        let store = memory_store();
        let ana = store.create_guest("Ana").await.unwrap();
        let bo = store.create_guest("Bo").await.unwrap();
        store.submit_rsvp(&ana.id, true).await.unwrap();
        let bo_rsvp = store.submit_rsvp(&bo.id, false).await.unwrap();

        let before = store.stats().await.unwrap();
        assert_eq!((before.total_guests, before.total_rsvps), (2, 2));

        assert!(store.delete_guest(&ana.id).await.unwrap());
        let after = store.stats().await.unwrap();
        assert_eq!((after.total_guests, after.total_rsvps), (1, 1));
        assert_eq!(store.list_rsvps().await.unwrap(), vec![bo_rsvp]);

        assert!(!store.delete_guest(&ana.id).await.unwrap());
    }

    #[actix_rt::test]
    async fn clear_all_empties_everything() {
        let store = memory_store();
        let ana = store.create_guest("Ana").await.unwrap();
        store.submit_rsvp(&ana.id, true).await.unwrap();
        store.clear_all().await.unwrap();
        assert!(store.list_guests().await.unwrap().is_empty());
        assert!(store.list_rsvps().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn submit_rsvp_unknown_guest() {
        let store = memory_store();
        let error = store.submit_rsvp("missing", true).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
        assert!(store.list_rsvps().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn submit_rsvp_snapshots_name() {
        let store = memory_store();
        let ana = store.create_guest("Ana").await.unwrap();
        let rsvp = store.submit_rsvp(&ana.id, true).await.unwrap();
        assert_eq!(rsvp.guest_id, ana.id);
        assert_eq!(rsvp.guest_name, "Ana");
        assert_eq!(store.get_rsvp_by_id(&rsvp.id).await.unwrap(), Some(rsvp));
    }

    #[actix_rt::test]
    async fn invite_submission_is_guarded() {
        let store = memory_store();
        let ana = store.create_guest("Ana").await.unwrap();
        let status = store.invite_status(&ana.invite_code).await.unwrap().unwrap();
        assert!(!status.has_rsvped);
        assert_eq!(status.guest, ana.summary());

        let rsvp = store.submit_invite_rsvp(&ana.invite_code, true).await.unwrap();
        let error = store
            .submit_invite_rsvp(&ana.invite_code, false)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::AlreadySubmitted));

        let status = store.invite_status(&ana.invite_code).await.unwrap().unwrap();
        assert!(status.has_rsvped);
        assert_eq!(status.rsvp, Some(rsvp));
        assert_eq!(store.list_rsvps().await.unwrap().len(), 1);

        let error = store.submit_invite_rsvp("ZZZZZZZZ", true).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
        assert!(store.invite_status("ZZZZZZZZ").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn concurrent_invite_submissions_record_once() {
        let store = memory_store();
        let ana = store.create_guest("Ana").await.unwrap();
        let (a, b) = tokio::join!(
            store.submit_invite_rsvp(&ana.invite_code, true),
            store.submit_invite_rsvp(&ana.invite_code, false),
        );
        assert!(a.is_ok() != b.is_ok());
        assert_eq!(store.list_rsvps().await.unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn update_only_touches_attendance() {
        let store = memory_store();
        let ana = store.create_guest("Ana").await.unwrap();
        let original = store.submit_rsvp(&ana.id, true).await.unwrap();

        let updated = store
            .update_rsvp(&original.id, Some(false))
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.is_attending);
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.submitted_at, original.submitted_at);
        assert_eq!(updated.guest_id, original.guest_id);

        let unchanged = store.update_rsvp(&original.id, None).await.unwrap().unwrap();
        assert_eq!(unchanged, updated);

        assert_eq!(store.update_rsvp("missing", Some(true)).await.unwrap(), None);
    }

    #[actix_rt::test]
    async fn delete_rsvp() {
        let store = memory_store();
        let ana = store.create_guest("Ana").await.unwrap();
        let rsvp = store.submit_rsvp(&ana.id, true).await.unwrap();
        assert!(store.delete_rsvp(&rsvp.id).await.unwrap());
        assert!(!store.delete_rsvp(&rsvp.id).await.unwrap());
        assert_eq!(store.list_guests().await.unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn pending_tracks_creates_and_deletes() {
        let store = memory_store();
        let mut ids = vec![];
        for name in ["Ana", "Bo", "Cy", "Di"] {
            ids.push(store.create_guest(name).await.unwrap().id);
        }
        store.submit_rsvp(&ids[0], true).await.unwrap();
        store.submit_rsvp(&ids[1], false).await.unwrap();
        store.delete_guest(&ids[2]).await.unwrap();
        store.delete_guest(&ids[1]).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(
            stats.pending_count,
            stats.total_guests as i64 - stats.total_rsvps as i64
        );
        assert_eq!(stats.total_guests, 2);
        assert_eq!(stats.attending_count, 1);
        assert_eq!(stats.not_attending_count, 0);
        assert_eq!(stats.pending_count, 1);
    }

    #[actix_rt::test]
    async fn file_backed_store_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rsvp-database.json");
        let store = GuestStore::new(Arc::new(FileBackend::new(&path)));
        let ana = store.create_guest("Ana").await.unwrap();
        store.submit_invite_rsvp(&ana.invite_code, true).await.unwrap();

        let reopened = GuestStore::new(Arc::new(FileBackend::new(&path)));
        assert_eq!(reopened.backend_name(), "file");
        let status = reopened.invite_status(&ana.invite_code).await.unwrap().unwrap();
        assert!(status.has_rsvped);
    }
}
