//! Админский просмотр билетов: события, затем пользователи события, затем их брони.
//!
//! Список броней берётся из последнего успешного ответа сервера, а если его нет
//! (сеть недоступна), то из локального зеркала. Удаление сначала ставит надгробие
//! локально, потом идёт на сервер; сбой сервера не откатывает локальное удаление.

use tracing::{info, warn};

use crate::api_client::{AdminBooking, ApiClient};
use crate::error::{AdminError, PartialSyncError};
use crate::mirror::MirrorStore;
use crate::models::{Booking, Event, User};
use crate::services::sync::{placeholder_user_id, SyncCoordinator, SyncReport};
use crate::session::Session;

/// Откуда сейчас берутся брони.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Синхронизации ещё не было, показывается зеркало.
    NotSynced,
    /// Последний `refresh` прошёл, показывается ответ сервера.
    Live,
    /// Последний `refresh` не прошёл, показывается зеркало.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub freshness: Freshness,
    pub report: Option<SyncReport>,
    /// Отложенные удаления, которые на этот раз дошли до сервера.
    pub deletes_synced: usize,
    pub deletes_pending: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Synced,
    /// Удалено только локально. Сервер получит удаление при следующем `refresh`.
    LocalOnly(PartialSyncError),
}

/// Строка списка билетов, одинаковая для данных сервера и зеркала.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketView {
    pub booking_id: String,
    pub ticket_number: Option<String>,
    pub status: String,
    pub seat_numbers: Vec<u32>,
    pub seat_categories: Vec<String>,
    pub qr_codes: Vec<String>,
}

impl From<&AdminBooking> for TicketView {
    fn from(remote: &AdminBooking) -> Self {
        Self {
            booking_id: remote.booking_id.clone(),
            ticket_number: remote.ticket_number.clone(),
            status: remote.status.clone().unwrap_or_default(),
            seat_numbers: remote.effective_seat_numbers(),
            seat_categories: remote.effective_seat_categories(),
            qr_codes: remote.effective_qr_codes(),
        }
    }
}

impl From<&Booking> for TicketView {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id.clone(),
            ticket_number: booking.ticket_number.clone(),
            status: booking.status.clone(),
            seat_numbers: booking.effective_seat_numbers(),
            seat_categories: booking
                .effective_seat_categories()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            qr_codes: booking.effective_qr_codes(),
        }
    }
}

pub struct AdminView {
    api: ApiClient,
    mirror: MirrorStore,
    sync: SyncCoordinator,
    session: Session,
    selected_event: Option<String>,
    selected_user: Option<String>,
    freshness: Freshness,
    remote: Vec<AdminBooking>,
}

impl AdminView {
    pub fn new(api: ApiClient, mirror: MirrorStore, session: Session) -> Result<Self, AdminError> {
        if !session.is_admin() {
            warn!("Admin view refused for non-admin user {}", session.user.id);
            return Err(AdminError::AccessDenied);
        }

        Ok(Self {
            api,
            sync: SyncCoordinator::new(mirror.clone()),
            mirror,
            session,
            selected_event: None,
            selected_user: None,
            freshness: Freshness::NotSynced,
            remote: Vec::new(),
        })
    }

    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    pub fn selected_event(&self) -> Option<&str> {
        self.selected_event.as_deref()
    }

    pub fn selected_user(&self) -> Option<&str> {
        self.selected_user.as_deref()
    }

    /// Выбор события сбрасывает выбор пользователя.
    pub fn select_event(&mut self, event_id: Option<&str>) {
        self.selected_event = event_id.map(str::to_string);
        self.selected_user = None;
    }

    pub fn select_user(&mut self, user_id: Option<&str>) {
        self.selected_user = user_id.map(str::to_string);
    }

    /// Досылает отложенные удаления, забирает все билеты с сервера и зеркалирует их.
    pub async fn refresh(&mut self) -> Result<RefreshOutcome, AdminError> {
        let (deletes_synced, deletes_pending) = self.retry_pending_deletes().await?;

        match self.api.all_tickets(&self.session.credentials).await {
            Ok(remote) => {
                let report = self.sync.reconcile(&remote).await;
                self.remote = remote;
                self.freshness = Freshness::Live;
                Ok(RefreshOutcome {
                    freshness: self.freshness,
                    report: Some(report),
                    deletes_synced,
                    deletes_pending,
                    error: None,
                })
            }
            Err(e) => {
                warn!("Admin refresh failed, serving mirror data: {}", e);
                self.remote.clear();
                self.freshness = Freshness::Stale;
                Ok(RefreshOutcome {
                    freshness: self.freshness,
                    report: None,
                    deletes_synced,
                    deletes_pending,
                    error: Some(e.to_string()),
                })
            }
        }
    }

    async fn retry_pending_deletes(&self) -> Result<(usize, usize), AdminError> {
        let pending = self.mirror.pending_deletes().await?;
        let mut synced = 0;

        for delete in &pending {
            match self.api.delete_booking(&self.session.credentials, &delete.booking_id).await {
                Ok(()) => {
                    self.mirror.clear_delete_pending(&delete.booking_id).await?;
                    synced += 1;
                }
                Err(e) if e.is_not_found() => {
                    self.mirror.clear_delete_pending(&delete.booking_id).await?;
                    synced += 1;
                }
                Err(e) => {
                    warn!(
                        "Remote delete of booking {} still failing (attempt {}): {}",
                        delete.booking_id,
                        delete.attempts + 1,
                        e
                    );
                    self.mirror.mark_delete_pending(&delete.booking_id, &e.to_string()).await?;
                }
            }
        }

        if synced > 0 {
            info!("Synced {} pending remote deletes", synced);
        }
        Ok((synced, pending.len() - synced))
    }

    /// События с бронями (из зеркала).
    pub async fn events(&self) -> Result<Vec<Event>, AdminError> {
        Ok(self.sync.events_with_any_booking().await?)
    }

    /// Пользователи выбранного события; пусто, если событие не выбрано.
    pub async fn users(&self) -> Result<Vec<User>, AdminError> {
        match &self.selected_event {
            Some(event_id) => Ok(self.sync.users_for_event(event_id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Брони выбранного пользователя на выбранном событии.
    pub async fn tickets(&self) -> Result<Vec<TicketView>, AdminError> {
        let (Some(event_id), Some(user_id)) = (&self.selected_event, &self.selected_user) else {
            return Ok(Vec::new());
        };

        if self.freshness == Freshness::Live {
            let deleted = self.mirror.deleted_ids::<Booking>().await?;
            return Ok(self
                .remote
                .iter()
                .filter(|remote| !deleted.contains(&remote.booking_id))
                .filter(|remote| remote.event.as_ref().is_some_and(|event| &event.id == event_id))
                .filter(|remote| &remote_user_id(remote) == user_id)
                .map(TicketView::from)
                .collect());
        }

        let bookings = self.sync.bookings_for(event_id, user_id).await?;
        Ok(bookings.iter().map(TicketView::from).collect())
    }

    pub async fn delete_booking(&mut self, booking_id: &str) -> Result<DeleteOutcome, AdminError> {
        if !self.mirror.soft_delete::<Booking>(booking_id).await? {
            warn!("Booking {} not found in mirror, deleting on server only", booking_id);
        }
        self.remote.retain(|remote| remote.booking_id != booking_id);

        match self.api.delete_booking(&self.session.credentials, booking_id).await {
            Ok(()) => Ok(DeleteOutcome::Synced),
            Err(e) if e.is_not_found() => {
                info!("Booking {} was already gone on server", booking_id);
                Ok(DeleteOutcome::Synced)
            }
            Err(e) => {
                warn!("Booking {} deleted locally, remote delete failed: {}", booking_id, e);
                self.mirror.mark_delete_pending(booking_id, &e.to_string()).await?;
                Ok(DeleteOutcome::LocalOnly(PartialSyncError {
                    booking_id: booking_id.to_string(),
                    reason: e.to_string(),
                }))
            }
        }
    }
}

fn remote_user_id(remote: &AdminBooking) -> String {
    match &remote.user {
        Some(user) => user.id.clone(),
        None => placeholder_user_id(&remote.booking_id),
    }
}
