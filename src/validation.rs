use std::collections::HashSet;

use serde::Deserialize;

use crate::errors::ValidationError;
use crate::money::round_to_2_decimals;
use crate::schemas::ParticipantId;

pub const DEFAULT_DESCRIPTION: &str = "Expense";

#[derive(Debug, Default, Deserialize)]
pub struct GroupRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    #[serde(default)]
    pub description: Option<String>,
    pub amount: f64,
    pub payer: ParticipantId,
    pub participants: Vec<ParticipantId>,
}

/// An expense that passed the group-independent checks. Membership of the
/// payer and participants is checked against the stored group on insert.
#[derive(Clone, Debug, PartialEq)]
pub struct NewExpense {
    pub description: String,
    pub amount: f64,
    pub payer: ParticipantId,
    pub participants: Vec<ParticipantId>,
}

pub fn participant_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}

/// Rounds to cents. Rounding scales by 100, so a huge finite input can come
/// out infinite; the result is checked, not the input.
pub fn expense_amount(raw: f64) -> Result<f64, ValidationError> {
    let amount = round_to_2_decimals(raw);
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(amount)
}

/// Drops repeated ids, keeping the first occurrence of each.
fn dedup_participants(ids: Vec<ParticipantId>) -> Vec<ParticipantId> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

pub fn group_code(raw: &str) -> Result<String, ValidationError> {
    let code = raw.trim();
    let valid = !code.is_empty()
        && code.len() <= 32
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ValidationError::InvalidCode(raw.to_string()));
    }
    Ok(code.to_string())
}

impl ExpenseRequest {
    pub fn validate(self) -> Result<NewExpense, ValidationError> {
        let amount = expense_amount(self.amount)?;
        let participants = dedup_participants(self.participants);
        if participants.is_empty() {
            return Err(ValidationError::EmptySplit);
        }
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        Ok(NewExpense {
            description,
            amount,
            payer: self.payer,
            participants,
        })
    }
}
