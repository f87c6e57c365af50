use vocab_reminder::configuration::get_configuration;
use vocab_reminder::push::PushClients;
use vocab_reminder::startup::build;
use vocab_reminder::telemetry::{get_subscriber, init_subscriber};

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    let subscriber = get_subscriber("vocab-reminder".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration().expect("Failed to read configuration.");
    let push_clients =
        PushClients::build(&configuration.push).expect("Failed to build push clients.");
    let application = build(&configuration, push_clients).await?;
    application.server.launch().await
}
