// typings-worker/src/ipc.rs
// Length-prefixed JSON framing over the parent channel
use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use typings_common::{ProtocolError, Request, Response};

const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024; // 16MB

/// Read one length-prefixed JSON request.
///
/// Returns `Ok(None)` when the peer closed the channel, including partway
/// through a frame.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Request>>
where
    R: AsyncRead + Unpin,
{
    // Read the 4-byte length prefix (big-endian u32)
    let mut len_buf = [0u8; 4];
    if !read_or_disconnect(reader, &mut len_buf)
        .await
        .context("Failed to read request length")?
    {
        return Ok(None);
    }

    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        }
        .into());
    }

    if len == 0 {
        return Err(ProtocolError::EmptyFrame.into());
    }

    let mut buf = vec![0u8; len];
    if !read_or_disconnect(reader, &mut buf)
        .await
        .context("Failed to read request payload")?
    {
        return Ok(None);
    }

    Ok(Some(Request::decode(&buf)?))
}

/// Fill `buf`, or return `false` if the peer hung up first
async fn read_or_disconnect<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<bool>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Write one length-prefixed JSON response and flush it
pub async fn write_response<W>(writer: &mut W, response: &Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json_bytes = serde_json::to_vec(response).context("Failed to serialize response")?;

    if json_bytes.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: json_bytes.len(),
            max: MAX_FRAME_SIZE,
        }
        .into());
    }

    let len = json_bytes.len() as u32;
    writer
        .write_all(&len.to_be_bytes())
        .await
        .context("Failed to write response length")?;

    writer
        .write_all(&json_bytes)
        .await
        .context("Failed to write response payload")?;

    writer.flush().await.context("Failed to flush response")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    async fn write_raw<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) {
        writer
            .write_all(&(payload.len() as u32).to_be_bytes())
            .await
            .unwrap();
        writer.write_all(payload).await.unwrap();
        writer.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_read_request() {
        let (mut client, mut server) = duplex(1024);
        write_raw(&mut client, br#"{"kind":"typesRegistry"}"#).await;

        let request = read_request(&mut server).await.unwrap();
        assert_eq!(request, Some(Request::TypesRegistry));
    }

    #[tokio::test]
    async fn test_read_request_clean_eof() {
        let (client, mut server) = duplex(1024);
        drop(client);

        let request = read_request(&mut server).await.unwrap();
        assert!(request.is_none());
    }

    #[tokio::test]
    async fn test_read_request_eof_inside_length() {
        let (mut client, mut server) = duplex(1024);
        client.write_all(&[0u8, 0u8]).await.unwrap();
        drop(client);

        assert!(read_request(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_request_eof_inside_payload() {
        let (mut client, mut server) = duplex(1024);
        client.write_all(&100u32.to_be_bytes()).await.unwrap();
        client.write_all(br#"{"kind":"ty"#).await.unwrap();
        drop(client);

        assert!(read_request(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_request_with_zero_length() {
        let (mut client, mut server) = duplex(1024);
        client.write_all(&0u32.to_be_bytes()).await.unwrap();

        let err = read_request(&mut server).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ProtocolError>(),
            Some(&ProtocolError::EmptyFrame)
        );
    }

    #[tokio::test]
    async fn test_read_request_too_large() {
        let (mut client, mut server) = duplex(1024);
        let len = (MAX_FRAME_SIZE as u32) + 1;
        client.write_all(&len.to_be_bytes()).await.unwrap();

        let err = read_request(&mut server).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProtocolError>(),
            Some(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_request_unknown_kind() {
        let (mut client, mut server) = duplex(1024);
        write_raw(&mut client, br#"{"kind":"shutdown"}"#).await;

        let err = read_request(&mut server).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ProtocolError>(),
            Some(&ProtocolError::UnknownKind("shutdown".to_string()))
        );
    }

    #[tokio::test]
    async fn test_write_response_frame() {
        let (mut client, mut server) = duplex(1024);
        let response = Response::initialization_failed("boom", None);

        write_response(&mut server, &response).await.unwrap();

        let mut len_buf = [0u8; 4];
        client.read_exact(&mut len_buf).await.unwrap();
        let mut buf = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        client.read_exact(&mut buf).await.unwrap();

        let decoded: Response = serde_json::from_slice(&buf).unwrap();
        assert_eq!(decoded, response);
    }
}
