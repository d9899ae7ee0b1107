//! Collaborator implementations backed by `panxfer_api::Client`.

use std::path::Path;
use std::sync::Arc;

use panxfer_api::{Client, RangeProbe};
use panxfer_protocol::{
    AccountTier, ChunkUploadResponse, CommitRequest, FileInfo, PrecreateRequest,
    PrecreateResponse,
};

use crate::config::TransferConfig;
use crate::download::Downloader;
use crate::error::EngineError;
use crate::source::{AccountInfo, BoxFuture, FileMetaLookup, RangeSource, UploadEndpoint};
use crate::upload::Uploader;

impl RangeSource for Client {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RangeProbe, EngineError>> {
        Box::pin(async move {
            Client::probe(self, url)
                .await
                .map_err(|e| EngineError::Probe(e.to_string()))
        })
    }

    fn fetch_range<'a>(
        &'a self,
        url: &'a str,
        from: u64,
        to: u64,
    ) -> BoxFuture<'a, Result<Vec<u8>, EngineError>> {
        Box::pin(async move { Ok(Client::fetch_range(self, url, from, to).await?) })
    }

    fn fetch_whole<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<u64, EngineError>> {
        Box::pin(async move { Ok(self.download_to(url, dest).await?) })
    }
}

impl UploadEndpoint for Client {
    fn precreate<'a>(
        &'a self,
        req: &'a PrecreateRequest,
    ) -> BoxFuture<'a, Result<PrecreateResponse, EngineError>> {
        Box::pin(async move { Ok(Client::precreate(self, req).await?) })
    }

    fn upload_chunk<'a>(
        &'a self,
        path: &'a str,
        upload_id: &'a str,
        seq: u32,
        data: Vec<u8>,
    ) -> BoxFuture<'a, Result<ChunkUploadResponse, EngineError>> {
        Box::pin(async move { Ok(Client::upload_chunk(self, path, upload_id, seq, data).await?) })
    }

    fn commit<'a>(&'a self, req: &'a CommitRequest) -> BoxFuture<'a, Result<FileInfo, EngineError>> {
        Box::pin(async move { Ok(self.create(req).await?) })
    }
}

impl AccountInfo for Client {
    fn account_tier(&self) -> BoxFuture<'_, Result<AccountTier, EngineError>> {
        Box::pin(async move {
            let info = self.user_info().await?;
            Ok(AccountTier::from_vip_type(info.vip_type))
        })
    }
}

impl FileMetaLookup for Client {
    fn download_link(&self, fs_id: u64) -> BoxFuture<'_, Result<String, EngineError>> {
        Box::pin(async move { Ok(Client::download_link(self, fs_id).await?) })
    }

    fn path_link(&self, path: &str) -> Result<String, EngineError> {
        Ok(self.path_download_url(path)?)
    }

    fn authorize(&self, link: &str) -> Result<String, EngineError> {
        Ok(self.authorize_link(link)?)
    }
}

impl Downloader {
    /// Builds a downloader that uses `client` for every collaborator.
    pub fn with_client(client: Client, config: TransferConfig) -> Self {
        let client = Arc::new(client);
        Self::new(client.clone(), client.clone(), client, config)
    }
}

impl Uploader {
    /// Builds an uploader that uses `client` for every collaborator.
    pub fn with_client(client: Client, config: TransferConfig) -> Self {
        let client = Arc::new(client);
        Self::new(client.clone(), client, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DownloadSource;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `body` for `requests` connections (no range support) and
    /// returns the request lines it saw.
    async fn file_server(
        body: &'static [u8],
        requests: usize,
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let mut lines = Vec::new();
            for _ in 0..requests {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut head = Vec::new();
                let mut tmp = [0u8; 4096];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut tmp).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&tmp[..n]);
                }
                let line = String::from_utf8_lossy(&head)
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string();

                let mut response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                )
                .into_bytes();
                if !line.starts_with("HEAD") {
                    response.extend_from_slice(body);
                }
                let _ = stream.write_all(&response).await;
                let _ = stream.shutdown().await;
                lines.push(line);
            }
            lines
        });

        (format!("http://127.0.0.1:{port}"), handle)
    }

    #[tokio::test]
    async fn direct_link_requests_carry_access_token() {
        let (base, server) = file_server(b"hello", 2).await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("x.bin");

        let downloader =
            Downloader::with_client(Client::new("tok").unwrap(), TransferConfig::default());
        let outcome = downloader
            .download(&DownloadSource::Link(format!("{base}/file/x?fid=1")), &dest)
            .await
            .unwrap();

        assert_eq!(outcome.bytes, 5);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");

        let lines = server.await.unwrap();
        assert_eq!(
            lines,
            vec![
                "HEAD /file/x?fid=1&access_token=tok HTTP/1.1".to_string(),
                "GET /file/x?fid=1&access_token=tok HTTP/1.1".to_string(),
            ]
        );
    }
}
