use rocket::{serde::json::Json, Route};

use crate::model::api::message::Message;

pub fn routes() -> Vec<Route> {
    routes![health]
}

#[get("/")]
fn health() -> Json<Message> {
    Json(Message::new("server is working well"))
}
