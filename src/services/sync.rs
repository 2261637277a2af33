//! Синхронизация серверных данных в локальное зеркало.
//!
//! Каждая бронь из админского списка пишется одним атомарным пакетом
//! "событие, пользователь, бронь". Сбой одного пакета не останавливает остальные.
//! Повторный прогон с теми же данными ничего не меняет.

use tracing::{debug, info, warn};

use crate::api_client::{AdminBooking, ApiEvent};
use crate::error::MirrorError;
use crate::mirror::MirrorStore;
use crate::models::{Booking, Event, User, UserAttributes};

pub const PLACEHOLDER_USER_NAME: &str = "Unknown User";

/// id пользователя-заглушки для брони, у которой сервер не вернул пользователя.
pub fn placeholder_user_id(booking_id: &str) -> String {
    format!("unknown-{}", booking_id)
}

/// Итог одного прохода синхронизации.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub mirrored: Vec<String>,
    /// Брони без события: в зеркало не попадают.
    pub skipped_orphans: Vec<String>,
    /// Брони, для которых создан пользователь-заглушка.
    pub placeholder_users: Vec<String>,
    /// Брони, пакет которых откатился, с причиной.
    pub failed: Vec<(String, String)>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone)]
pub struct SyncCoordinator {
    mirror: MirrorStore,
}

impl SyncCoordinator {
    pub fn new(mirror: MirrorStore) -> Self {
        Self { mirror }
    }

    pub async fn reconcile(&self, remote_bookings: &[AdminBooking]) -> SyncReport {
        let mut report = SyncReport::default();

        for remote in remote_bookings {
            let Some(event) = &remote.event else {
                debug!("Skipping booking {} without event", remote.booking_id);
                report.skipped_orphans.push(remote.booking_id.clone());
                continue;
            };

            if remote.user.is_none() {
                report.placeholder_users.push(remote.booking_id.clone());
            }

            match self.mirror_record(remote, event).await {
                Ok(()) => report.mirrored.push(remote.booking_id.clone()),
                Err(e) => {
                    warn!("Failed to mirror booking {}: {}", remote.booking_id, e);
                    report.failed.push((remote.booking_id.clone(), e.to_string()));
                }
            }
        }

        info!(
            "Sync pass finished: {} mirrored, {} orphans skipped, {} placeholders, {} failed",
            report.mirrored.len(),
            report.skipped_orphans.len(),
            report.placeholder_users.len(),
            report.failed.len()
        );
        report
    }

    async fn mirror_record(&self, remote: &AdminBooking, event: &ApiEvent) -> Result<(), MirrorError> {
        let (user_id, user_attributes) = match &remote.user {
            Some(user) => (user.id.clone(), user.to_attributes()),
            None => (
                placeholder_user_id(&remote.booking_id),
                UserAttributes {
                    name: Some(remote.name.clone().unwrap_or_else(|| PLACEHOLDER_USER_NAME.to_string())),
                    email: Some(remote.email.clone().unwrap_or_default()),
                    is_admin: Some(false),
                },
            ),
        };

        // Порядок важен: бронь ссылается на событие и пользователя
        let mut batch = self.mirror.begin().await?;
        batch.upsert::<Event>(&event.id, &event.to_attributes()).await?;
        batch.upsert::<User>(&user_id, &user_attributes).await?;
        batch
            .upsert::<Booking>(&remote.booking_id, &remote.to_attributes(&event.id, &user_id))
            .await?;
        batch.commit().await
    }

    /// Публичный список событий для офлайн-просмотра. Один пакет на весь список.
    pub async fn mirror_events(&self, events: &[ApiEvent]) -> Result<usize, MirrorError> {
        let mut batch = self.mirror.begin().await?;
        for event in events {
            batch.upsert::<Event>(&event.id, &event.to_attributes()).await?;
        }
        batch.commit().await?;
        info!("Mirrored {} events", events.len());
        Ok(events.len())
    }

    // === Представления из зеркала ===

    /// События, у которых есть хотя бы одна живая бронь, в порядке первой брони.
    pub async fn events_with_any_booking(&self) -> Result<Vec<Event>, MirrorError> {
        let bookings = self.mirror.all_bookings().await?;
        let event_ids = first_seen(bookings.iter().map(|b| &b.event_id));
        self.mirror.events_by_ids(&event_ids).await
    }

    /// Пользователи с бронями на событие, в порядке первой брони.
    pub async fn users_for_event(&self, event_id: &str) -> Result<Vec<User>, MirrorError> {
        let bookings = self.mirror.bookings_for_event(event_id).await?;
        let user_ids = first_seen(bookings.iter().map(|b| &b.user_id));
        self.mirror.users_by_ids(&user_ids).await
    }

    pub async fn bookings_for(&self, event_id: &str, user_id: &str) -> Result<Vec<Booking>, MirrorError> {
        self.mirror.bookings_for(event_id, user_id).await
    }
}

fn first_seen<'a>(ids: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for id in ids {
        if !unique.contains(id) {
            unique.push(id.clone());
        }
    }
    unique
}
