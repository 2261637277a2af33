use crate::error::MirrorError;
use crate::mirror::{Filter, MirrorStore};
use crate::models::Event;

impl MirrorStore {
    /// События с заданными id в порядке `ids`; отсутствующие и удалённые пропускаются.
    pub async fn events_by_ids(&self, ids: &[String]) -> Result<Vec<Event>, MirrorError> {
        let found = self.query::<Event>(&Filter::all().one_of("id", ids.iter().cloned())).await?;
        Ok(order_by_ids(found, ids, |event| &event.id))
    }

    pub async fn all_events(&self) -> Result<Vec<Event>, MirrorError> {
        self.query::<Event>(&Filter::all()).await
    }
}

pub(crate) fn order_by_ids<T>(mut records: Vec<T>, ids: &[String], id_of: impl Fn(&T) -> &String) -> Vec<T> {
    records.sort_by_key(|record| ids.iter().position(|id| id == id_of(record)).unwrap_or(usize::MAX));
    records
}
