use crate::error::MirrorError;
use crate::mirror::events::order_by_ids;
use crate::mirror::{Filter, MirrorStore};
use crate::models::User;

impl MirrorStore {
    pub async fn users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, MirrorError> {
        let found = self.query::<User>(&Filter::all().one_of("id", ids.iter().cloned())).await?;
        Ok(order_by_ids(found, ids, |user| &user.id))
    }
}
