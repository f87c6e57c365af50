use crate::catchers::*;
use crate::configuration::Settings;
use crate::push::PushClients;
use crate::routes::*;
use rocket::fairing::Info;
use rocket::figment::Figment;
use rocket::{Ignite, Orbit, Rocket};
use rocket_sync_db_pools::database;
use tokio::sync::watch;

#[database("vocab_db")]
pub struct VocabDbConn(diesel::PgConnection);

pub struct Application {
    pub server: Rocket<Ignite>,
    pub port: BoundPort,
}

pub async fn build(
    configuration: &Settings,
    push_clients: PushClients,
) -> Result<Application, rocket::Error> {
    let (port_saver, port) = port_channel();
    let figment = figment(configuration);
    let server = rocket::custom(figment)
        .attach(port_saver)
        .attach(VocabDbConn::fairing())
        .manage(push_clients)
        .manage(configuration.schedule.clone())
        .manage(configuration.operator.clone())
        .mount(
            "/",
            routes![
                health_check,
                register_web_push,
                register_fcm,
                subscription_status,
                update_notification_time,
                dispatch_notifications,
                run_schedule,
            ],
        )
        .register(
            "/",
            catchers![
                unprocessable_entity_to_bad_request,
                unauthorized_request_credentials,
            ],
        )
        .ignite()
        .await?;
    Ok(Application { server, port })
}

fn figment(configuration: &Settings) -> Figment {
    use rocket::figment::util::map;
    rocket::Config::figment()
        .merge(("port", configuration.application.port.unwrap_or(0)))
        .merge(("address", configuration.application.host.to_string()))
        .merge((
            "databases.vocab_db",
            map!["url" => configuration.database.connection_string()],
        ))
}

// The test harness binds to port 0 and needs to know what the OS picked;
// a Liftoff fairing publishes it through a watch channel.

pub fn port_channel() -> (PortSaver, BoundPort) {
    let (tx, rx) = watch::channel(None);
    (PortSaver { tx }, BoundPort { rx })
}

pub struct BoundPort {
    rx: watch::Receiver<Option<u16>>,
}

impl BoundPort {
    pub async fn get(&mut self) -> u16 {
        loop {
            if let Some(port) = *self.rx.borrow() {
                return port;
            }
            self.rx
                .changed()
                .await
                .expect("The server exited before publishing its port.");
        }
    }
}

pub struct PortSaver {
    tx: watch::Sender<Option<u16>>,
}

#[rocket::async_trait]
impl rocket::fairing::Fairing for PortSaver {
    fn info(&self) -> Info {
        Info {
            name: "Port Saver",
            kind: rocket::fairing::Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let _ = self.tx.send(Some(rocket.config().port));
    }
}
