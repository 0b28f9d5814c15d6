//! # Announcements
//!
//! Notices published by the programme team to trainees, mentors, employers
//! or everyone.

use crate::catalog::{next_id, required_text};
use crate::primitives::{MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};
use crate::store::PortalStore;
use crate::{Announcement, AnnouncementId, Audience, PortalError};
use chrono::{DateTime, Utc};

/// Publishing and audience-filtered listing over a [`PortalStore`].
pub struct AnnouncementBoard;

impl AnnouncementBoard {
    /// Publish a notice with an `ann-<n>` id.
    ///
    /// Title and body are trimmed and must not be empty.
    pub fn publish<S: PortalStore + ?Sized>(
        store: &mut S,
        title: &str,
        body: &str,
        audience: Audience,
        at: DateTime<Utc>,
    ) -> Result<Announcement, PortalError> {
        let title = required_text("title", title, MAX_TITLE_LENGTH)?;
        let body = required_text("body", body, MAX_DESCRIPTION_LENGTH)?;

        let existing = store.list_announcements()?;
        let id = next_id("ann", existing.len(), |candidate| {
            existing.iter().any(|a| a.id.as_str() == candidate)
        });

        let announcement = Announcement {
            id: AnnouncementId::new(id),
            title,
            body,
            audience,
            published_at: at,
        };
        store.save_announcement(announcement.clone())?;
        Ok(announcement)
    }

    /// Announcements visible to `reader`, newest first.
    ///
    /// `None` lists every announcement regardless of audience.
    pub fn list<S: PortalStore + ?Sized>(
        store: &S,
        reader: Option<Audience>,
    ) -> Result<Vec<Announcement>, PortalError> {
        let mut announcements: Vec<Announcement> = store
            .list_announcements()?
            .into_iter()
            .filter(|a| reader.is_none_or(|r| r.sees(a.audience)))
            .collect();
        announcements.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(announcements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use chrono::TimeDelta;

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    fn board() -> MemoryStore {
        let mut store = MemoryStore::new();
        let notices = [
            ("New module launch", "WSQ Food Safety 2 is open.", Audience::Trainees),
            ("Mentor sync", "Mentor standup on Friday.", Audience::Mentors),
            ("Public feedback", "Share praise or concerns.", Audience::All),
        ];
        for (hours, (title, body, audience)) in (0..).zip(notices) {
            AnnouncementBoard::publish(&mut store, title, body, audience, epoch() + TimeDelta::hours(hours))
                .expect("publish");
        }
        store
    }

    #[test]
    fn publish_assigns_sequential_ids() {
        let store = board();
        let ids: Vec<String> = store
            .list_announcements()
            .expect("list")
            .into_iter()
            .map(|a| a.id.0)
            .collect();
        assert_eq!(ids, vec!["ann-1", "ann-2", "ann-3"]);
    }

    #[test]
    fn reader_sees_own_audience_and_all() {
        let store = board();
        let titles: Vec<String> = AnnouncementBoard::list(&store, Some(Audience::Trainees))
            .expect("list")
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["Public feedback", "New module launch"]);

        let employers = AnnouncementBoard::list(&store, Some(Audience::Employers)).expect("list");
        assert_eq!(employers.len(), 1);
        assert_eq!(employers[0].audience, Audience::All);

        assert_eq!(AnnouncementBoard::list(&store, None).expect("list").len(), 3);
    }

    #[test]
    fn blank_title_or_body_rejected() {
        let mut store = MemoryStore::new();
        for (title, body) in [("  ", "Body"), ("Title", "\n")] {
            let result = AnnouncementBoard::publish(&mut store, title, body, Audience::All, epoch());
            assert!(matches!(result, Err(PortalError::InvalidInput(_))));
        }
        assert!(store.list_announcements().expect("list").is_empty());
    }
}
