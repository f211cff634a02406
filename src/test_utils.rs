use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::schemas::{Expense, Participant};

/// A reproducible random group: 2 to 8 participants and 1 to 12 expenses,
/// each paid by anyone and split between a random non-empty subset.
pub fn random_group(seed: u64) -> (Vec<Participant>, Vec<Expense>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let participants: Vec<Participant> = (0..rng.gen_range(2..=8))
        .map(|i| Participant {
            id: format!("p{i}"),
            name: format!("Person {i}"),
        })
        .collect();

    let expenses = (0..rng.gen_range(1..=12))
        .map(|i| {
            let payer = participants[rng.gen_range(0..participants.len())].id.clone();
            let mut split: Vec<_> = participants
                .iter()
                .filter(|_| rng.gen_bool(0.5))
                .map(|p| p.id.clone())
                .collect();
            if split.is_empty() {
                split.push(participants[rng.gen_range(0..participants.len())].id.clone());
            }
            Expense {
                id: format!("e{i}"),
                description: "Expense".into(),
                amount: rng.gen_range(1..=100_000) as f64 / 100.0,
                payer,
                participants: split,
                created_at: Utc::now(),
            }
        })
        .collect();

    (participants, expenses)
}
