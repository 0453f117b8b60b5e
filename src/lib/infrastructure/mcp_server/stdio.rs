use super::service::AtlassianService;
use crate::infrastructure::rpc::{RpcRequest, RpcResponse};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Serve newline-delimited JSON-RPC until `reader` reaches EOF.
pub async fn serve<R, W>(reader: R, mut writer: W, service: &AtlassianService) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(trimmed) {
            Ok(request) => service.handle_request(request).await,
            Err(err) => {
                warn!(%err, "Rejected malformed JSON-RPC line");
                Some(RpcResponse::parse_error(format!("Invalid JSON-RPC message: {err}")))
            }
        };

        if let Some(response) = response {
            let encoded = serde_json::to_string(&response).map_err(io::Error::other)?;
            writer.write_all(encoded.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    debug!("Input closed, stopping MCP server loop");
    Ok(())
}

/// Serve over the process's stdin and stdout.
pub async fn serve_stdio(service: AtlassianService) -> io::Result<()> {
    info!("MCP server listening on stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(stdin, stdout, &service).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::atlassian::InMemoryAtlassian;
    use serde_json::Value;
    use std::sync::Arc;

    #[tokio::test]
    async fn answers_requests_and_skips_notifications() {
        let service = AtlassianService::in_memory(Arc::new(InMemoryAtlassian::default()));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            "not json\n",
            r#"{"jsonrpc":"2.0","id":"b","method":"tools/list"}"#,
            "\n",
        );
        let mut output = Vec::new();
        serve(input.as_bytes(), &mut output, &service)
            .await
            .expect("serve");

        let replies: Vec<Value> = String::from_utf8(output)
            .expect("utf8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["error"]["code"], -32700);
        assert_eq!(replies[2]["id"], "b");
        assert_eq!(replies[2]["result"]["tools"].as_array().map(Vec::len), Some(3));
    }
}
