use rocket::{
    data::{Data, Limits, ToByteUnit},
    serde::json::{self, serde_json, Json},
    Route, State,
};

use crate::{
    config::Config,
    error::{Error, Result},
    logging::RequestId,
    manager::ElectionManager,
    model::{
        api::{election::ElectionInput, message::Message},
        common::election::ElectionStatus,
        db::election::Election,
        pagination::Pagination,
    },
};

const CREATE_DECODE_FAILED: &str = "could not parse election";
const UPDATE_DECODE_FAILED: &str = "could not parse update information";

/// Query value that lists every status regardless of the configured default.
const ALL_STATUSES: &str = "all";

pub fn routes() -> Vec<Route> {
    routes![create_election, list_elections, get_election, update_election]
}

#[post("/elections", data = "<input>")]
async fn create_election(
    req: &RequestId,
    manager: &State<ElectionManager>,
    input: std::result::Result<Json<ElectionInput>, json::Error<'_>>,
) -> Result<Json<Message>> {
    let input = input.map_err(|e| Error::decode(CREATE_DECODE_FAILED, e))?;
    manager.create(req, input.into_inner().into_draft()).await?;
    Ok(Json(Message::new("created election")))
}

#[get("/elections?<status>&<page>&<size>")]
async fn list_elections(
    req: &RequestId,
    manager: &State<ElectionManager>,
    config: &State<Config>,
    status: Option<&str>,
    page: Option<&str>,
    size: Option<&str>,
) -> Result<Json<Vec<Election>>> {
    let status = match status {
        None => config.default_status_filter().map(ElectionStatus::as_str),
        Some(ALL_STATUSES) => None,
        Some(status) => Some(status),
    };
    // An unknown status is reported ahead of malformed page values.
    manager.parse_status(req, status)?;
    let page = parse_or(page, Pagination::DEFAULT_PAGE_NUM, "could not parse page number")?;
    let size = parse_or(size, Pagination::DEFAULT_PAGE_SIZE, "could not parse page size")?;
    let elections = manager.list(req, status, page, size).await?;
    Ok(Json(elections))
}

#[get("/elections/<id>")]
async fn get_election(
    req: &RequestId,
    manager: &State<ElectionManager>,
    id: &str,
) -> Result<Json<Election>> {
    let election = manager.get_one(req, id).await?;
    Ok(Json(election))
}

/// Replace a draft election.
///
/// The election is checked before the body is read, so edits to an election
/// outside its mutable window are refused whatever the payload.
#[patch("/elections/<id>", data = "<data>")]
async fn update_election(
    req: &RequestId,
    manager: &State<ElectionManager>,
    limits: &Limits,
    id: &str,
    data: Data<'_>,
) -> Result<Json<Message>> {
    manager.ensure_mutable(req, id).await?;

    let limit = limits.get("json").unwrap_or_else(|| 1.mebibytes());
    let body = data
        .open(limit)
        .into_string()
        .await
        .map_err(|e| Error::decode(UPDATE_DECODE_FAILED, e))?;
    if !body.is_complete() {
        return Err(Error::decode(
            UPDATE_DECODE_FAILED,
            format!("body exceeds {limit}"),
        ));
    }
    let input: ElectionInput = serde_json::from_str(&body.into_inner())
        .map_err(|e| Error::decode(UPDATE_DECODE_FAILED, e))?;

    manager.update(req, id, input.into_spec()).await?;
    Ok(Json(Message::new("updated election")))
}

/// Parse an optional query value, falling back to `default` when absent.
fn parse_or(value: Option<&str>, default: i64, message: &str) -> Result<i64> {
    value.map_or(Ok(default), |value| {
        value
            .parse()
            .map_err(|_| Error::Validation(message.to_string()))
    })
}
