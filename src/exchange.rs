use serde::{Deserialize, Serialize};

use crate::balance::{compute_balances, Balance};
use crate::errors::SettlementError;
use crate::money::{is_negligible, EPSILON};
use crate::schemas::{Expense, Participant, ParticipantId};

#[derive(Clone, Debug)]
struct PersonalBalance {
    id: ParticipantId,
    /// Magnitude still to pay or to receive, always positive.
    balance: f64,
}

/// One suggested payment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: f64,
}

/// The settlement view of a group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub balances: Balance,
    pub transfers: Vec<Exchange>,
    /// Tells "nothing recorded yet" apart from "everyone is even".
    pub has_expenses: bool,
}

pub fn check_consistency(balances: &Balance) -> Result<(), SettlementError> {
    let sum: f64 = balances.values().sum();
    if is_negligible(sum) {
        Ok(())
    } else {
        Err(SettlementError::Inconsistent { sum })
    }
}

// Ascending by amount; among equal amounts the lowest id sorts last, so
// `last_mut` picks the largest amount and then the lowest id.
fn sort_for_pick(people: &mut [PersonalBalance]) {
    people.sort_by(|a, b| {
        a.balance
            .total_cmp(&b.balance)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Greedily matches the largest debtor with the largest creditor until one
/// side runs out. Every round settles at least one of the two, so there are
/// at most `n - 1` transfers for `n` unsettled participants.
pub fn compute_transfers(balances: &Balance) -> Vec<Exchange> {
    if let Err(err) = check_consistency(balances) {
        tracing::warn!(%err, "settling inconsistent balances");
    }

    let mut payers = Vec::new();
    let mut receivers = Vec::new();
    for (id, &balance) in balances {
        if is_negligible(balance) {
            continue;
        }
        let person = PersonalBalance {
            id: id.clone(),
            balance: balance.abs(),
        };
        if balance < 0.0 {
            payers.push(person);
        } else {
            receivers.push(person);
        }
    }

    let max_rounds = payers.len() + receivers.len();
    let mut exchanges = Vec::new();
    for _ in 0..max_rounds {
        sort_for_pick(&mut payers);
        sort_for_pick(&mut receivers);
        let (Some(payer), Some(receiver)) = (payers.last_mut(), receivers.last_mut()) else {
            break;
        };

        let amount = payer.balance.min(receiver.balance);
        if amount >= EPSILON {
            exchanges.push(Exchange {
                from: payer.id.clone(),
                to: receiver.id.clone(),
                amount,
            });
        }
        payer.balance -= amount;
        receiver.balance -= amount;

        if is_negligible(payer.balance) {
            payers.pop();
        }
        if is_negligible(receiver.balance) {
            receivers.pop();
        }
    }

    if !payers.is_empty() && !receivers.is_empty() {
        tracing::warn!(
            payers = payers.len(),
            receivers = receivers.len(),
            "settlement stopped with balances left open"
        );
    } else if !payers.is_empty() || !receivers.is_empty() {
        tracing::debug!(
            left = payers.len() + receivers.len(),
            "one-sided balances left after settlement"
        );
    }
    exchanges
}

/// Runs both stages over a point-in-time snapshot of a group.
pub fn settle(participants: &[Participant], expenses: &[Expense]) -> Settlement {
    let balances = compute_balances(participants, expenses);
    let transfers = compute_transfers(&balances);
    Settlement {
        balances,
        transfers,
        has_expenses: !expenses.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::random_group;
    use chrono::Utc;
    use rstest::rstest;

    fn balances(entries: &[(&str, f64)]) -> Balance {
        entries
            .iter()
            .map(|(id, amount)| (id.to_string(), *amount))
            .collect()
    }

    fn exchange(from: &str, to: &str, amount: f64) -> Exchange {
        Exchange {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    fn apply(balances: &Balance, exchanges: &[Exchange]) -> Balance {
        let mut after = balances.clone();
        for e in exchanges {
            *after.get_mut(&e.from).unwrap() += e.amount;
            *after.get_mut(&e.to).unwrap() -= e.amount;
        }
        after
    }

    #[rstest]
    #[case::one_creditor(
        &[("alice", 20.0), ("bob", -10.0), ("carol", -10.0)],
        vec![exchange("bob", "alice", 10.0), exchange("carol", "alice", 10.0)]
    )]
    #[case::single_debt(
        &[("alice", 50.0), ("bob", -50.0)],
        vec![exchange("bob", "alice", 50.0)]
    )]
    #[case::already_even(&[("alice", 0.0), ("bob", 0.0)], vec![])]
    #[case::empty(&[], vec![])]
    #[case::below_tolerance(&[("alice", 0.004), ("bob", -0.004)], vec![])]
    #[case::largest_first(
        &[("a", -60.0), ("b", -40.0), ("c", 70.0), ("d", 30.0)],
        vec![
            exchange("a", "c", 60.0),
            exchange("b", "d", 30.0),
            exchange("b", "c", 10.0),
        ]
    )]
    fn settles(#[case] entries: &[(&str, f64)], #[case] expected: Vec<Exchange>) {
        assert_eq!(compute_transfers(&balances(entries)), expected);
    }

    #[test]
    fn ties_go_to_lowest_id() {
        let input = balances(&[("zed", -5.0), ("amy", -5.0), ("kim", 10.0)]);
        assert_eq!(
            compute_transfers(&input),
            vec![exchange("amy", "kim", 5.0), exchange("zed", "kim", 5.0)]
        );
    }

    #[test]
    fn applying_transfers_clears_every_balance() {
        let input = balances(&[
            ("a", 10.0 / 3.0),
            ("b", -20.0 / 3.0),
            ("c", 10.0 / 3.0),
            ("d", 41.5),
            ("e", -41.5),
        ]);
        let transfers = compute_transfers(&input);
        assert!(transfers.len() <= input.len() - 1);
        assert!(transfers.iter().all(|t| t.amount >= EPSILON));
        assert!(apply(&input, &transfers).values().all(|v| is_negligible(*v)));
    }

    #[rstest]
    fn random_groups_settle_completely(
        #[values(1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233)] seed: u64,
    ) {
        let (people, expenses) = random_group(seed);
        let balances = compute_balances(&people, &expenses);
        let transfers = compute_transfers(&balances);

        assert!(transfers.len() < people.len(), "seed {seed}");
        assert!(transfers.iter().all(|t| t.amount >= EPSILON && t.from != t.to));
        let after = apply(&balances, &transfers);
        assert!(
            after.values().all(|v| is_negligible(*v)),
            "seed {seed}: {after:?}"
        );
        assert_eq!(transfers, compute_transfers(&balances));
    }

    #[test]
    fn inconsistent_input_terminates() {
        let input = balances(&[("a", 100.0), ("b", -30.0)]);
        assert_eq!(
            check_consistency(&input),
            Err(SettlementError::Inconsistent { sum: 70.0 })
        );
        assert_eq!(compute_transfers(&input), vec![exchange("b", "a", 30.0)]);
    }

    #[test]
    fn same_balances_same_transfers() {
        let input = balances(&[("a", 12.5), ("b", -7.25), ("c", -5.25)]);
        assert_eq!(compute_transfers(&input), compute_transfers(&input));
    }

    fn expense(payer: &str, amount: f64, split: &[&str]) -> Expense {
        Expense {
            id: format!("{payer}-{amount}"),
            description: "Expense".into(),
            amount,
            payer: payer.into(),
            participants: split.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn people(ids: &[&str]) -> Vec<Participant> {
        ids.iter()
            .map(|id| Participant {
                id: id.to_string(),
                name: id.to_string(),
            })
            .collect()
    }

    #[test]
    fn cancelling_expenses_need_no_transfers() {
        let settlement = settle(
            &people(&["alice", "bob"]),
            &[
                expense("alice", 20.0, &["alice", "bob"]),
                expense("bob", 20.0, &["alice", "bob"]),
            ],
        );
        assert!(settlement.has_expenses);
        assert!(settlement.transfers.is_empty());
        assert!(settlement.balances.values().all(|v| *v == 0.0));
    }

    #[test]
    fn group_without_expenses() {
        let settlement = settle(&people(&["alice", "bob"]), &[]);
        assert!(!settlement.has_expenses);
        assert!(settlement.transfers.is_empty());
        assert_eq!(settlement.balances.len(), 2);
    }

    #[test]
    fn idle_participant_gets_no_transfer() {
        let settlement = settle(
            &people(&["alice", "bob", "dave"]),
            &[expense("alice", 9.99, &["alice", "bob", "alice"])],
        );
        assert_eq!(settlement.balances["dave"], 0.0);
        assert!(settlement
            .transfers
            .iter()
            .all(|t| t.from != "dave" && t.to != "dave"));
    }
}
