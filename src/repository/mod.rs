use futures::future::BoxFuture;

use crate::errors::StoreError;
use crate::schemas::{Expense, Group, Participant};
use crate::validation::NewExpense;

pub mod memory;
pub mod mongo;

/// Storage for groups. Each group holds its participants and expenses, and
/// every method sees or changes one group at a time.
///
/// Implementations own referential integrity: a participant who paid for an
/// expense cannot be removed, and expenses may only reference participants
/// of their own group.
pub trait GroupRepository: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the code is taken.
    fn create_group(&self, group: Group) -> BoxFuture<'_, Result<Group, StoreError>>;

    fn get_group<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Group, StoreError>>;

    fn delete_group<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;

    /// `name` must already be trimmed and non-empty.
    fn add_participant<'a>(
        &'a self,
        code: &'a str,
        name: String,
    ) -> BoxFuture<'a, Result<Participant, StoreError>>;

    fn remove_participant<'a>(
        &'a self,
        code: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    fn add_expense<'a>(
        &'a self,
        code: &'a str,
        expense: NewExpense,
    ) -> BoxFuture<'a, Result<Expense, StoreError>>;

    fn remove_expense<'a>(
        &'a self,
        code: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>>;
}

pub(crate) fn group_not_found(code: &str) -> StoreError {
    StoreError::NotFound(format!("group {code}"))
}
