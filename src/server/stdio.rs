use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::protocol::{json_rpc_error, PARSE_ERROR};
use super::{Dispatch, McpServer};
use crate::error::Result;
use crate::providers::gitlab::GitLabApi;

/// Serves MCP over the process's stdin and stdout until stdin closes.
pub async fn serve_stdio<A: GitLabApi + 'static>(server: Arc<McpServer<A>>) -> Result<()> {
    info!("{} listening on stdio", server.name());
    serve(server, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Reads newline-delimited JSON-RPC messages from `reader` and writes
/// responses to `writer`, one per line.
///
/// Tool calls run concurrently; every response goes through a single
/// writer task so lines never interleave. Returns once the input ends and
/// all in-flight calls have answered.
pub async fn serve<A, R, W>(server: Arc<McpServer<A>>, reader: R, writer: W) -> Result<()>
where
    A: GitLabApi + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<Value>();
    let writer_task = tokio::spawn(write_responses(rx, writer));

    let mut calls = JoinSet::new();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        // A line that is not UTF-8 gets a parse error like any other bad JSON
        let dispatch = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => server.dispatch(line.trim()),
            Err(e) => Dispatch::Reply(json_rpc_error(
                None,
                PARSE_ERROR,
                &format!("Parse error: {e}"),
            )),
        };

        match dispatch {
            Dispatch::Reply(response) => {
                if tx.send(response).is_err() {
                    break;
                }
            }
            Dispatch::Call(call) => {
                let server = Arc::clone(&server);
                let tx = tx.clone();
                calls.spawn(async move {
                    let response = server.run_call(call).await;
                    let _ = tx.send(response);
                });
            }
            Dispatch::Ignore => {}
        }

        while let Some(finished) = calls.try_join_next() {
            if let Err(e) = finished {
                warn!("Tool call task failed: {e}");
            }
        }
    }

    debug!("Input closed, waiting for {} in-flight calls", calls.len());
    while let Some(finished) = calls.join_next().await {
        if let Err(e) = finished {
            warn!("Tool call task failed: {e}");
        }
    }

    drop(tx);
    match writer_task.await {
        Ok(result) => result,
        Err(e) => {
            warn!("Response writer stopped: {e}");
            Ok(())
        }
    }
}

async fn write_responses<W>(mut rx: mpsc::UnboundedReceiver<Value>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::providers::gitlab::fake::FakeGitLab;
    use crate::providers::gitlab::GitLabProvider;

    async fn run(input: impl AsRef<[u8]>) -> Vec<Value> {
        let server = McpServer::new(GitLabProvider::new(FakeGitLab::new()), "test-server");
        let (mut output, writer) = tokio::io::duplex(64 * 1024);

        serve(server, input.as_ref(), writer).await.unwrap();

        let mut raw = String::new();
        output.read_to_string(&mut raw).await.unwrap();
        raw.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn by_id(responses: &[Value], id: i64) -> &Value {
        responses
            .iter()
            .find(|response| response["id"] == id)
            .unwrap_or_else(|| panic!("no response for id {id}"))
    }

    #[tokio::test]
    async fn test_session() {
        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"health_check","arguments":{}}}"#,
            r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#,
        ]
        .join("\n");

        let responses = run(&input).await;

        assert_eq!(responses.len(), 4);
        assert_eq!(by_id(&responses, 1)["result"]["serverInfo"]["name"], "test-server");
        assert_eq!(by_id(&responses, 2)["result"]["tools"].as_array().unwrap().len(), 8);
        let health = by_id(&responses, 3)["result"]["content"][0]["text"]
            .as_str()
            .unwrap();
        assert!(health.contains("healthy"));
        assert_eq!(by_id(&responses, 4)["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_malformed_line_does_not_stop_the_session() {
        let input = [
            "not json at all",
            r#"{"jsonrpc":"2.0","id":9,"method":"initialize","params":{}}"#,
        ]
        .join("\n");

        let responses = run(&input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], 9);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_stop_the_session() {
        let mut input = br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#.to_vec();
        input.extend_from_slice(b"\n\xff\xfe garbage\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);

        let responses = run(input).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["error"]["code"], -32700);
        assert_eq!(responses[2]["id"], 2);
    }
}
