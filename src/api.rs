use rocket::Route;

mod election;
mod health;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(health::routes());
    routes.extend(election::routes());
    routes
}
