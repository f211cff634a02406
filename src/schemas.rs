use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::code::generate_id;
use crate::errors::StoreError;
use crate::validation::NewExpense;

pub type ParticipantId = String;
pub type ExpenseId = String;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: f64,
    pub payer: ParticipantId,
    /// Who the amount is split between, evenly.
    pub participants: Vec<ParticipantId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl Group {
    pub fn new(code: String, name: String) -> Self {
        Group {
            code,
            name,
            participants: vec![],
            expenses: vec![],
        }
    }

    pub fn has_participant(&self, id: &str) -> bool {
        self.participants.iter().any(|p| p.id == id)
    }

    /// Builds a participant with a fresh id, refusing names already taken.
    pub fn new_participant(&self, name: String) -> Result<Participant, StoreError> {
        if self.participants.iter().any(|p| p.name == name) {
            return Err(StoreError::Conflict(format!("participant named {name:?}")));
        }
        Ok(Participant {
            id: generate_id(),
            name,
        })
    }

    pub fn add_participant(&mut self, name: String) -> Result<Participant, StoreError> {
        let participant = self.new_participant(name)?;
        self.participants.push(participant.clone());
        Ok(participant)
    }

    pub fn check_removable(&self, id: &str) -> Result<(), StoreError> {
        if !self.has_participant(id) {
            return Err(StoreError::NotFound(format!("participant {id}")));
        }
        if self.expenses.iter().any(|e| e.payer == id) {
            return Err(StoreError::ParticipantIsPayer(id.to_string()));
        }
        Ok(())
    }

    /// Removes a participant who pays for nothing, and takes them out of
    /// every expense they were sharing.
    pub fn remove_participant(&mut self, id: &str) -> Result<(), StoreError> {
        self.check_removable(id)?;
        self.participants.retain(|p| p.id != id);
        for expense in &mut self.expenses {
            expense.participants.retain(|p| p != id);
        }
        Ok(())
    }

    /// Checks payer and splitting participants against this group and builds
    /// the stored expense.
    pub fn new_expense(&self, new: NewExpense) -> Result<Expense, StoreError> {
        let unknown = std::iter::once(&new.payer)
            .chain(new.participants.iter())
            .find(|id| !self.has_participant(id));
        if let Some(id) = unknown {
            return Err(StoreError::UnknownParticipant(id.clone()));
        }
        Ok(Expense {
            id: generate_id(),
            description: new.description,
            amount: new.amount,
            payer: new.payer,
            participants: new.participants,
            created_at: Utc::now(),
        })
    }

    pub fn add_expense(&mut self, new: NewExpense) -> Result<Expense, StoreError> {
        let expense = self.new_expense(new)?;
        self.expenses.push(expense.clone());
        Ok(expense)
    }

    pub fn remove_expense(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id != id);
        if self.expenses.len() == before {
            return Err(StoreError::NotFound(format!("expense {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_with(names: &[&str]) -> (Group, Vec<ParticipantId>) {
        let mut group = Group::new("abc12345".into(), "Trip".into());
        let ids = names
            .iter()
            .map(|name| group.add_participant(name.to_string()).unwrap().id)
            .collect();
        (group, ids)
    }

    fn expense(payer: &str, amount: f64, split: &[&ParticipantId]) -> NewExpense {
        NewExpense {
            description: "Dinner".into(),
            amount,
            payer: payer.to_string(),
            participants: split.iter().map(|id| id.to_string()).collect(),
        }
    }

    #[test]
    fn participant_names_are_unique() {
        let (mut group, _) = group_with(&["Alice"]);
        let err = group.add_participant("Alice".into()).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(group.participants.len(), 1);
    }

    #[test]
    fn payer_cannot_be_removed() {
        let (mut group, ids) = group_with(&["Alice", "Bob"]);
        group
            .add_expense(expense(&ids[0], 10.0, &[&ids[0], &ids[1]]))
            .unwrap();

        let err = group.remove_participant(&ids[0]).unwrap_err();
        assert!(matches!(err, StoreError::ParticipantIsPayer(id) if id == ids[0]));
    }

    #[test]
    fn removing_participant_strips_them_from_splits() {
        let (mut group, ids) = group_with(&["Alice", "Bob"]);
        group
            .add_expense(expense(&ids[0], 10.0, &[&ids[0], &ids[1]]))
            .unwrap();

        group.remove_participant(&ids[1]).unwrap();

        assert_eq!(group.participants.len(), 1);
        assert_eq!(group.expenses[0].participants, vec![ids[0].clone()]);
    }

    #[test]
    fn expense_must_reference_group_members() {
        let (mut group, ids) = group_with(&["Alice"]);
        let stranger = "nobody".to_string();

        let err = group
            .add_expense(expense(&ids[0], 10.0, &[&stranger]))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownParticipant(id) if id == "nobody"));

        let err = group
            .add_expense(expense("nobody", 10.0, &[&ids[0]]))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownParticipant(_)));
        assert!(group.expenses.is_empty());
    }

    #[test]
    fn removing_unknown_expense_is_not_found() {
        let (mut group, _) = group_with(&["Alice"]);
        assert!(matches!(
            group.remove_expense("missing"),
            Err(StoreError::NotFound(_))
        ));
    }
}
