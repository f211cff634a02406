use futures::future::{BoxFuture, FutureExt};
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, IndexModel,
};

use super::{group_not_found, GroupRepository};
use crate::errors::StoreError;
use crate::schemas::{Expense, Group, Participant};
use crate::validation::NewExpense;

pub const COLLECTION: &str = "Groups";

const DUPLICATE_KEY: i32 = 11000;

/// One document per group, participants and expenses embedded.
///
/// Writes that depend on the group's contents put their precondition in the
/// `update_one` filter, so the check and the write happen atomically. When
/// nothing matches, the group is read back to report why.
#[derive(Clone, Debug)]
pub struct MongoRepository {
    groups: Collection<Group>,
}

impl MongoRepository {
    pub async fn new(client: &Client, database: &str) -> Result<Self, StoreError> {
        let groups = client.database(database).collection::<Group>(COLLECTION);
        let index = IndexModel::builder()
            .keys(doc! { "code": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        groups.create_index(index, None).await?;
        Ok(MongoRepository { groups })
    }

    async fn find(&self, code: &str) -> Result<Group, StoreError> {
        self.groups
            .find_one(doc! { "code": code }, None)
            .await?
            .ok_or_else(|| group_not_found(code))
    }

    /// Returns whether a document matched `filter`.
    async fn update(&self, filter: Document, update: Document) -> Result<bool, StoreError> {
        let result = self.groups.update_one(filter, update, None).await?;
        Ok(result.matched_count > 0)
    }

    /// Called after a guarded update matched nothing: reports the failed
    /// precondition, or a concurrent change if the group now looks fine.
    async fn explain_miss(
        &self,
        code: &str,
        check: impl FnOnce(&Group) -> Result<(), StoreError>,
    ) -> StoreError {
        match self.find(code).await {
            Ok(group) => match check(&group) {
                Ok(()) => StoreError::Concurrent,
                Err(err) => err,
            },
            Err(err) => err,
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

impl GroupRepository for MongoRepository {
    fn create_group(&self, group: Group) -> BoxFuture<'_, Result<Group, StoreError>> {
        async move {
            match self.groups.insert_one(&group, None).await {
                Ok(_) => {
                    tracing::info!(code = %group.code, "group created");
                    Ok(group)
                }
                Err(err) if is_duplicate_key(&err) => {
                    Err(StoreError::Conflict(format!("group {}", group.code)))
                }
                Err(err) => Err(err.into()),
            }
        }
        .boxed()
    }

    fn get_group<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Group, StoreError>> {
        self.find(code).boxed()
    }

    fn delete_group<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            let result = self.groups.delete_one(doc! { "code": code }, None).await?;
            if result.deleted_count == 0 {
                return Err(group_not_found(code));
            }
            Ok(())
        }
        .boxed()
    }

    fn add_participant<'a>(
        &'a self,
        code: &'a str,
        name: String,
    ) -> BoxFuture<'a, Result<Participant, StoreError>> {
        async move {
            let participant = self.find(code).await?.new_participant(name)?;
            let filter = doc! {
                "code": code,
                "participants.name": { "$ne": participant.name.as_str() },
            };
            let update = doc! { "$push": { "participants": bson::to_bson(&participant)? } };
            if !self.update(filter, update).await? {
                let name = participant.name.clone();
                return Err(self
                    .explain_miss(code, |group| group.new_participant(name).map(|_| ()))
                    .await);
            }
            Ok(participant)
        }
        .boxed()
    }

    fn remove_participant<'a>(
        &'a self,
        code: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            let filter = doc! {
                "code": code,
                "participants.id": id,
                "expenses.payer": { "$ne": id },
            };
            let update = doc! {
                "$pull": {
                    "participants": { "id": id },
                    "expenses.$[].participants": id,
                }
            };
            if !self.update(filter, update).await? {
                return Err(self
                    .explain_miss(code, |group| group.check_removable(id))
                    .await);
            }
            Ok(())
        }
        .boxed()
    }

    fn add_expense<'a>(
        &'a self,
        code: &'a str,
        expense: NewExpense,
    ) -> BoxFuture<'a, Result<Expense, StoreError>> {
        async move {
            let expense = self.find(code).await?.new_expense(expense)?;
            let mut members = expense.participants.clone();
            if !members.contains(&expense.payer) {
                members.push(expense.payer.clone());
            }
            let filter = doc! { "code": code, "participants.id": { "$all": members.clone() } };
            let update = doc! { "$push": { "expenses": bson::to_bson(&expense)? } };
            if !self.update(filter, update).await? {
                return Err(self
                    .explain_miss(code, |group| {
                        match members.iter().find(|id| !group.has_participant(id)) {
                            Some(id) => Err(StoreError::UnknownParticipant(id.clone())),
                            None => Ok(()),
                        }
                    })
                    .await);
            }
            Ok(expense)
        }
        .boxed()
    }

    fn remove_expense<'a>(
        &'a self,
        code: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            let filter = doc! { "code": code, "expenses.id": id };
            let update = doc! { "$pull": { "expenses": { "id": id } } };
            if !self.update(filter, update).await? {
                return Err(self
                    .explain_miss(code, |_| Err(StoreError::NotFound(format!("expense {id}"))))
                    .await);
            }
            Ok(())
        }
        .boxed()
    }
}
