mod config;
mod entities;
mod error;
mod middleware;
mod pagination;
mod routes;
mod services;
mod store;

use routes::create_routes;
use services::notifier::{run_dispatcher, ShareNotifier};
use store::Store;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = config::get_config();

    // Notification events drain into a logging dispatcher; real delivery
    // belongs to an external collaborator
    let (notifier, rx) = ShareNotifier::new();
    tokio::spawn(run_dispatcher(rx));

    let store = Store::seed(notifier).await;

    // build our application using the routes module
    let app = create_routes(store);

    // run our app with hyper, listening on the configured address
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.unwrap();
    println!("Listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}
