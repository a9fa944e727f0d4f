//! Stub backend command: `taskboard stub`.

use anyhow::Result;

use taskboard::stub::{StubServerConfig, start_server};

pub async fn cmd_stub(port: u16, dev: bool, reject_moves: bool, empty: bool) -> Result<()> {
    start_server(StubServerConfig {
        port,
        dev_mode: dev,
        reject_moves,
        empty,
    })
    .await
}
