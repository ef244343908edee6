use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use typings_common::{Request, Response};

const WORKER_BINARY: &str = "typings-worker";
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024; // 16MB

/// How to launch the worker
#[derive(Debug, Clone, Default)]
pub struct WorkerOptions {
    pub worker: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    pub npm: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl WorkerOptions {
    /// Worker binary: explicit path, else next to this executable, else PATH
    pub fn worker_path(&self) -> PathBuf {
        if let Some(worker) = &self.worker {
            return worker.clone();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(WORKER_BINARY)))
            .filter(|candidate| candidate.is_file())
            .unwrap_or_else(|| PathBuf::from(WORKER_BINARY))
    }

    /// Command-line flags passed through to the worker
    pub fn worker_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(cache) = &self.cache {
            args.push("--globalTypingsCacheLocation".to_string());
            args.push(cache.display().to_string());
        }
        if let Some(log_file) = &self.log_file {
            args.push("--logFile".to_string());
            args.push(log_file.display().to_string());
        }
        match &self.npm {
            Some(npm) => {
                args.push("--npmLocation".to_string());
                args.push(npm.clone());
            }
            None => args.push("--validateDefaultNpmLocation".to_string()),
        }
        args
    }
}

/// Spawn a worker, send `request` and collect every response until the
/// worker closes its stdout.
pub async fn send_request(options: &WorkerOptions, request: Request) -> Result<Vec<Response>> {
    let worker = options.worker_path();
    let mut child = Command::new(&worker)
        .args(options.worker_args())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .context(format!("Failed to start worker {:?}", worker))?;

    let mut stdin = child.stdin.take().context("Worker stdin unavailable")?;
    let mut stdout = child.stdout.take().context("Worker stdout unavailable")?;

    write_frame(&mut stdin, &request).await?;
    // Closing stdin tells the worker its parent is done
    drop(stdin);

    let mut responses = Vec::new();
    while let Some(response) = read_frame(&mut stdout).await? {
        responses.push(response);
    }

    let status = child.wait().await.context("Failed to wait for worker")?;
    if !status.success() {
        bail!("Worker {} exited with {}", display_name(&worker), status);
    }

    Ok(responses)
}

/// Write one request using length-prefixed framing: [4 bytes length][JSON payload]
pub async fn write_frame<W>(writer: &mut W, request: &Request) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json_bytes = serde_json::to_vec(request).context("Failed to serialize request")?;

    let len = json_bytes.len() as u32;
    writer
        .write_all(&len.to_be_bytes())
        .await
        .context("Failed to write request length")?;
    writer
        .write_all(&json_bytes)
        .await
        .context("Failed to write request payload")?;
    writer.flush().await.context("Failed to flush request")?;
    Ok(())
}

/// Read one response frame; `None` once the worker has closed the stream
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Response>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("Failed to read response length"),
    }

    let resp_len = u32::from_be_bytes(len_buf) as usize;
    if resp_len > MAX_FRAME_SIZE {
        bail!("Response too large: {} bytes", resp_len);
    }

    let mut resp_buf = vec![0u8; resp_len];
    reader
        .read_exact(&mut resp_buf)
        .await
        .context("Failed to read response payload")?;

    let response: Response =
        serde_json::from_slice(&resp_buf).context("Failed to deserialize response")?;
    Ok(Some(response))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use typings_common::TypesRegistryResponse;

    #[test]
    fn test_worker_args_default_validates_npm() {
        let args = WorkerOptions::default().worker_args();
        assert_eq!(args, vec!["--validateDefaultNpmLocation".to_string()]);
    }

    #[test]
    fn test_worker_args_pass_through() {
        let options = WorkerOptions {
            worker: None,
            cache: Some(PathBuf::from("/tmp/cache")),
            npm: Some("/usr/bin/npm".to_string()),
            log_file: Some(PathBuf::from("/tmp/worker.log")),
        };
        assert_eq!(
            options.worker_args(),
            vec![
                "--globalTypingsCacheLocation",
                "/tmp/cache",
                "--logFile",
                "/tmp/worker.log",
                "--npmLocation",
                "/usr/bin/npm",
            ]
        );
    }

    #[test]
    fn test_explicit_worker_path_wins() {
        let options = WorkerOptions {
            worker: Some(PathBuf::from("/opt/bin/typings-worker")),
            ..Default::default()
        };
        assert_eq!(options.worker_path(), PathBuf::from("/opt/bin/typings-worker"));
    }

    #[tokio::test]
    async fn test_request_frame_layout() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_frame(&mut client, &Request::TypesRegistry).await.unwrap();

        let mut len_buf = [0u8; 4];
        server.read_exact(&mut len_buf).await.unwrap();
        let mut payload = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        server.read_exact(&mut payload).await.unwrap();

        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["kind"], "typesRegistry");
    }

    #[tokio::test]
    async fn test_read_frames_until_eof() {
        let response = Response::TypesRegistry(TypesRegistryResponse {
            types_registry: Default::default(),
        });
        let json = serde_json::to_vec(&response).unwrap();

        let (mut worker, mut client) = tokio::io::duplex(1024);
        worker.write_all(&(json.len() as u32).to_be_bytes()).await.unwrap();
        worker.write_all(&json).await.unwrap();
        drop(worker);

        assert_eq!(read_frame(&mut client).await.unwrap(), Some(response));
        assert_eq!(read_frame(&mut client).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_response_rejected() {
        let (mut worker, mut client) = tokio::io::duplex(64);
        worker
            .write_all(&((MAX_FRAME_SIZE as u32) + 1).to_be_bytes())
            .await
            .unwrap();

        assert!(read_frame(&mut client).await.is_err());
    }
}
