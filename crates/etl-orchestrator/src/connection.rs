use etl_config::PostgresConnection;
use tokio_postgres::{Client, NoTls};
use tracing::error;

use crate::error::Result;

/// Opens a fresh connection to the source database, spawning its driving
/// future onto its own task. The returned `Client` is handed to extractors;
/// if the connection drops, the orchestrator's outer loop notices the next
/// query failure and calls this again to reconnect (see §4.5's
/// reopen-and-restart semantics).
pub async fn connect(config: &PostgresConnection) -> Result<Client> {
    let conn_string = format!(
        "host={} port={} dbname={} user={} password={}",
        config.host, config.port, config.db_name, config.user, config.password
    );
    let (client, connection) = tokio_postgres::connect(&conn_string, NoTls).await?;

    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(error = %err, "source database connection closed with an error");
        }
    });

    Ok(client)
}
