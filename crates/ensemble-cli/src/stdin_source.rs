use ensemble_engine::{JobEvent, JobRecord};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Newline-delimited JSON shape a record line must match, decoupled from
/// [`JobRecord`]'s own (non-`Deserialize`) shape so the wire format can
/// evolve independently of the in-process type.
#[derive(Debug, Deserialize)]
struct RecordLine {
    job_id: i64,
    #[serde(default)]
    events: Vec<EventLine>,
}

#[derive(Debug, Deserialize)]
struct EventLine {
    name: String,
    timestamp: f64,
    #[serde(default)]
    status: Option<i32>,
}

/// Spawn a task that reads newline-delimited JSON records from stdin and
/// forwards them to `tx` until stdin closes or a line fails to parse.
pub fn spawn_stdin_reader(tx: mpsc::Sender<JobRecord>) {
    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<RecordLine>(&line) {
                        Ok(parsed) => {
                            let record = JobRecord {
                                job_id: parsed.job_id,
                                events: parsed
                                    .events
                                    .into_iter()
                                    .map(|e| JobEvent {
                                        name: e.name,
                                        timestamp: e.timestamp,
                                        status: e.status,
                                    })
                                    .collect(),
                            };
                            if tx.send(record).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, line, "ignoring malformed record line");
                        }
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "stdin read error, stopping reader");
                    break;
                }
            }
        }
    });
}
