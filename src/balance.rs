use std::collections::BTreeMap;

use crate::schemas::{Expense, Participant, ParticipantId};

/// Net position per participant. Positive means the others owe them money.
pub type Balance = BTreeMap<ParticipantId, f64>;

/// Every participant gets an entry, starting at zero. Each expense credits
/// its payer with the full amount and debits every splitting participant
/// with an even share.
pub fn compute_balances(participants: &[Participant], expenses: &[Expense]) -> Balance {
    let mut balance: Balance = participants.iter().map(|p| (p.id.clone(), 0.0)).collect();
    for expense in expenses {
        if expense.participants.is_empty() {
            tracing::warn!(expense = %expense.id, "skipping expense with nobody to split it");
            continue;
        }
        let amount = expense.amount;
        *balance.entry(expense.payer.clone()).or_insert(0.0) += amount;
        let amount_per_receiver = amount / expense.participants.len() as f64;
        for receiver in &expense.participants {
            *balance.entry(receiver.clone()).or_insert(0.0) -= amount_per_receiver;
        }
    }
    balance
}
