use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use tracing::trace;

use crate::{
    AgentflowError, Result,
    store::{DbCollection, PageData, Query},
};

use super::document::DbDocument;

/// In-memory collection, iterated in id order unless the query orders it.
#[derive(Debug)]
pub struct Collect<T> {
    name: String,
    items: RwLock<BTreeMap<String, T>>,
}

impl<T> Collect<T>
where
    T: DbDocument,
{
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T> DbCollection for Collect<T>
where
    T: DbDocument,
{
    type Item = T;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.contains_key(id))
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        trace!("{}::find({})", self.name, id);
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items.get(id).cloned().ok_or_else(|| AgentflowError::NotFound(format!("{} '{}' not found", self.name, id)))
    }

    fn query(
        &self,
        q: &Query,
    ) -> Result<PageData<Self::Item>> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<T> = items.values().filter(|item| item.matches(q)).cloned().collect();
        drop(items);

        if !q.order_by().is_empty() {
            rows.sort_by(|a, b| {
                q.order_by().iter().fold(std::cmp::Ordering::Equal, |acc, (field, rev)| {
                    acc.then_with(|| {
                        let ord = a.compare(b, *field);
                        if *rev { ord.reverse() } else { ord }
                    })
                })
            });
        }

        let count = rows.len();
        let rows = rows.into_iter().skip(q.offset()).take(q.limit()).collect();
        Ok(PageData::new(q, count, rows))
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        trace!("{}::create({})", self.name, data.id());
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.contains_key(data.id()) {
            return Err(AgentflowError::Store(format!("{} '{}' already exists", self.name, data.id())));
        }
        items.insert(data.id().to_string(), data.clone());
        Ok(true)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        trace!("{}::update({})", self.name, data.id());
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        match items.get_mut(data.id()) {
            Some(item) => {
                *item = data.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("{}::delete({})", self.name, id);
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        Ok(items.remove(id).is_some())
    }
}
