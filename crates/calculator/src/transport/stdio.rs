use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::rpc::{Dispatcher, parse_error};

/// Serves one message per line of `input`, writing one reply per line to
/// `output`, until `input` ends.
///
/// Nothing else may be written to `output`, so logs go to stderr.
pub async fn serve_stdio<R, W>(
    dispatcher: &Dispatcher,
    mut input: R,
    mut output: W,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let reply = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => dispatcher.handle_text(line).await,
            Err(err) => {
                warn!("dropping a line that is not UTF-8: {err}");
                Some(parse_error(err))
            }
        };
        if let Some(reply) = reply {
            write_reply(&mut output, &reply).await?;
        }
    }
    info!("input closed, shutting down");
    Ok(())
}

async fn write_reply<W>(output: &mut W, reply: &Value) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut reply = reply.to_string();
    reply.push('\n');
    output.write_all(reply.as_bytes()).await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::code;
    use crate::tools;

    async fn replies(input: &[u8]) -> Vec<Value> {
        let mut output = Vec::new();
        let dispatcher = Dispatcher::new(tools::catalog());
        serve_stdio(&dispatcher, input, &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_reply_per_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","#,
            r#""params":{"name":"power","arguments":{"a":2,"b":8}}}"#,
            "\n",
        );
        let replies = replies(input.as_bytes()).await;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["result"]["content"][0]["text"], "256");
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_answered_and_skipped() {
        let input =
            b"\xFF\xFE\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}";
        let replies = replies(input).await;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], Value::Null);
        assert_eq!(replies[0]["error"]["code"], code::PARSE_ERROR);
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["result"], serde_json::json!({}));
    }
}
