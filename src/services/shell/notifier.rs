use crate::error::Result;
use std::collections::HashMap;
use tracing::{debug, info};
use zbus::zvariant::Value;
use zbus::Connection;

use super::about::APP_NAME;

const NOTIFICATIONS_DEST: &str = "org.freedesktop.Notifications";
const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
const NOTIFICATIONS_IFACE: &str = "org.freedesktop.Notifications";
const EXPIRE_TIMEOUT_MS: i32 = 5000;

/// Уведомления рабочего стола через D-Bus
pub struct Notifier {
    connection: Connection,
}

impl Notifier {
    pub async fn connect() -> Result<Self> {
        info!("Подключение к сервису уведомлений через D-Bus");
        let connection = Connection::session().await?;
        Ok(Self { connection })
    }

    pub async fn notify(&self, summary: &str, body: &str) -> Result<u32> {
        let actions: Vec<&str> = Vec::new();
        let hints: HashMap<&str, Value<'_>> = HashMap::new();

        let reply = self
            .connection
            .call_method(
                Some(NOTIFICATIONS_DEST),
                NOTIFICATIONS_PATH,
                Some(NOTIFICATIONS_IFACE),
                "Notify",
                &(APP_NAME, 0u32, "", summary, body, actions, hints, EXPIRE_TIMEOUT_MS),
            )
            .await?;

        let id: u32 = reply.body().deserialize()?;
        debug!("Уведомление '{}' показано (id {})", summary, id);
        Ok(id)
    }
}
