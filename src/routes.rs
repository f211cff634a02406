use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::balance::{compute_balances, Balance};
use crate::code::create_group_with_fresh_code;
use crate::errors::{ApiError, ValidationError};
use crate::exchange::{settle, Exchange, Settlement};
use crate::money::round_to_2_decimals;
use crate::repository::GroupRepository;
use crate::schemas::Group;
use crate::validation::{self, ExpenseRequest, GroupRequest, ParticipantRequest};

type Repo = web::Data<dyn GroupRepository>;

#[derive(Deserialize)]
struct GroupPath {
    code: String,
}

#[derive(Deserialize)]
struct ItemPath {
    code: String,
    id: String,
}

// Extractor failures answer with the same `{ "error": ... }` body as handlers.
fn malformed(err: impl std::fmt::Display, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "rejected malformed request");
    ApiError::from(ValidationError::MalformedRequest(err.to_string())).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| malformed(err, req)))
        .app_data(web::PathConfig::default().error_handler(|err, req| malformed(err, req)));
    cfg.service(create_group)
        .service(put_group)
        .service(get_group)
        .service(delete_group)
        .service(add_participant)
        .service(remove_participant)
        .service(add_expense)
        .service(remove_expense)
        .service(get_balance)
        .service(get_settlement);
}

fn rounded(balances: Balance) -> Balance {
    balances
        .into_iter()
        .map(|(id, amount)| (id, round_to_2_decimals(amount)))
        .collect()
}

#[post("/groups")]
async fn create_group(
    repo: Repo,
    json: Option<web::Json<GroupRequest>>,
) -> Result<HttpResponse, ApiError> {
    let name = json.map(|j| j.into_inner().name).unwrap_or_default();
    let group = create_group_with_fresh_code(repo.get_ref(), name.trim().to_string()).await?;
    Ok(HttpResponse::Created().json(group))
}

#[put("/groups/{code}")]
async fn put_group(
    repo: Repo,
    path: web::Path<GroupPath>,
    json: Option<web::Json<GroupRequest>>,
) -> Result<HttpResponse, ApiError> {
    let code = validation::group_code(&path.code)?;
    let name = json.map(|j| j.into_inner().name).unwrap_or_default();
    let group = repo
        .create_group(Group::new(code, name.trim().to_string()))
        .await?;
    Ok(HttpResponse::Created().json(group))
}

#[get("/groups/{code}")]
async fn get_group(repo: Repo, path: web::Path<GroupPath>) -> Result<HttpResponse, ApiError> {
    let group = repo.get_group(&path.code).await?;
    Ok(HttpResponse::Ok().json(group))
}

#[delete("/groups/{code}")]
async fn delete_group(repo: Repo, path: web::Path<GroupPath>) -> Result<HttpResponse, ApiError> {
    repo.delete_group(&path.code).await?;
    tracing::info!(code = %path.code, "group deleted");
    Ok(HttpResponse::NoContent().finish())
}

#[post("/groups/{code}/participants")]
async fn add_participant(
    repo: Repo,
    path: web::Path<GroupPath>,
    json: web::Json<ParticipantRequest>,
) -> Result<HttpResponse, ApiError> {
    let name = validation::participant_name(&json.name)?;
    let participant = repo.add_participant(&path.code, name).await?;
    tracing::info!(code = %path.code, id = %participant.id, "participant added");
    Ok(HttpResponse::Created().json(participant))
}

#[delete("/groups/{code}/participants/{id}")]
async fn remove_participant(
    repo: Repo,
    path: web::Path<ItemPath>,
) -> Result<HttpResponse, ApiError> {
    repo.remove_participant(&path.code, &path.id).await?;
    tracing::info!(code = %path.code, id = %path.id, "participant removed");
    Ok(HttpResponse::NoContent().finish())
}

#[post("/groups/{code}/expenses")]
async fn add_expense(
    repo: Repo,
    path: web::Path<GroupPath>,
    json: web::Json<ExpenseRequest>,
) -> Result<HttpResponse, ApiError> {
    let new_expense = json.into_inner().validate()?;
    let expense = repo.add_expense(&path.code, new_expense).await?;
    tracing::info!(
        code = %path.code,
        id = %expense.id,
        amount = expense.amount,
        "expense added"
    );
    Ok(HttpResponse::Created().json(expense))
}

#[delete("/groups/{code}/expenses/{id}")]
async fn remove_expense(repo: Repo, path: web::Path<ItemPath>) -> Result<HttpResponse, ApiError> {
    repo.remove_expense(&path.code, &path.id).await?;
    tracing::info!(code = %path.code, id = %path.id, "expense removed");
    Ok(HttpResponse::NoContent().finish())
}

#[get("/groups/{code}/balance")]
async fn get_balance(repo: Repo, path: web::Path<GroupPath>) -> Result<HttpResponse, ApiError> {
    let group = repo.get_group(&path.code).await?;
    let balances = compute_balances(&group.participants, &group.expenses);
    Ok(HttpResponse::Ok().json(rounded(balances)))
}

/// Balances and transfer amounts are each rounded to cents for display, so
/// with uneven shares a transfer can differ from the rounded balance it
/// settles by 0.01.
#[get("/groups/{code}/settlement")]
async fn get_settlement(repo: Repo, path: web::Path<GroupPath>) -> Result<HttpResponse, ApiError> {
    let group = repo.get_group(&path.code).await?;
    let settlement = settle(&group.participants, &group.expenses);
    tracing::debug!(
        code = %path.code,
        transfers = settlement.transfers.len(),
        "settlement computed"
    );
    Ok(HttpResponse::Ok().json(Settlement {
        balances: rounded(settlement.balances),
        transfers: settlement
            .transfers
            .into_iter()
            .map(|t| Exchange {
                amount: round_to_2_decimals(t.amount),
                ..t
            })
            .collect(),
        has_expenses: settlement.has_expenses,
    }))
}
