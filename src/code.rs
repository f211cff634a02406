use bson::oid::ObjectId;
use rand::Rng;

use crate::errors::StoreError;
use crate::repository::GroupRepository;
use crate::schemas::Group;

pub const CODE_LEN: usize = 8;
pub const MAX_CODE_ATTEMPTS: usize = 5;

const CODE_ALPHABET: &[u8] = b"0123456789abcdef";

/// Short share code for a new group, lowercase hex drawn from the thread-local
/// CSPRNG. The code is the only key to a group, so it must not be guessable
/// from another code.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Opaque id for participants and expenses.
pub fn generate_id() -> String {
    ObjectId::new().to_hex()
}

/// Creates a group under a freshly generated code, drawing a new code when
/// the previous one is already taken.
pub async fn create_group_with_fresh_code(
    repo: &dyn GroupRepository,
    name: String,
) -> Result<Group, StoreError> {
    let mut last_err = None;
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let group = Group::new(generate_code(), name.clone());
        match repo.create_group(group).await {
            Ok(group) => return Ok(group),
            Err(StoreError::Conflict(what)) => {
                tracing::debug!(attempt, %what, "group code taken, retrying");
                last_err = Some(StoreError::Conflict(what));
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| StoreError::Conflict("group code".into())))
}
