use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;

use super::{group_not_found, GroupRepository};
use crate::errors::StoreError;
use crate::schemas::{Expense, Group, Participant};
use crate::validation::NewExpense;

/// Keeps every group in process memory. Used for tests and for running
/// without a database.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    groups: RwLock<HashMap<String, Group>>,
}

impl InMemoryRepository {
    async fn update<T>(
        &self,
        code: &str,
        change: impl FnOnce(&mut Group) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut groups = self.groups.write().await;
        let group = groups.get_mut(code).ok_or_else(|| group_not_found(code))?;
        change(group)
    }
}

impl GroupRepository for InMemoryRepository {
    fn create_group(&self, group: Group) -> BoxFuture<'_, Result<Group, StoreError>> {
        async move {
            let mut groups = self.groups.write().await;
            if groups.contains_key(&group.code) {
                return Err(StoreError::Conflict(format!("group {}", group.code)));
            }
            groups.insert(group.code.clone(), group.clone());
            Ok(group)
        }
        .boxed()
    }

    fn get_group<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Group, StoreError>> {
        async move {
            self.groups
                .read()
                .await
                .get(code)
                .cloned()
                .ok_or_else(|| group_not_found(code))
        }
        .boxed()
    }

    fn delete_group<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            self.groups
                .write()
                .await
                .remove(code)
                .map(|_| ())
                .ok_or_else(|| group_not_found(code))
        }
        .boxed()
    }

    fn add_participant<'a>(
        &'a self,
        code: &'a str,
        name: String,
    ) -> BoxFuture<'a, Result<Participant, StoreError>> {
        self.update(code, move |group| group.add_participant(name))
            .boxed()
    }

    fn remove_participant<'a>(
        &'a self,
        code: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        self.update(code, move |group| group.remove_participant(id))
            .boxed()
    }

    fn add_expense<'a>(
        &'a self,
        code: &'a str,
        expense: NewExpense,
    ) -> BoxFuture<'a, Result<Expense, StoreError>> {
        self.update(code, move |group| group.add_expense(expense))
            .boxed()
    }

    fn remove_expense<'a>(
        &'a self,
        code: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        self.update(code, move |group| group.remove_expense(id))
            .boxed()
    }
}
