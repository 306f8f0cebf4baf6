use std::path::Path;

use {
    tokio::{fs::File, io::AsyncWriteExt},
    tracing::debug,
};

use crate::{Error, Result};

/// Stream `url` into the file at `dest`, replacing its contents.
///
/// Non-2xx responses are errors. Returns the number of bytes written.
pub async fn download_resource(client: &reqwest::Client, url: &str, dest: &Path) -> Result<u64> {
    let download_err = |source| Error::Download {
        url: url.to_string(),
        source,
    };

    let mut resp = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(download_err)?;

    let mut file = File::create(dest).await?;
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await.map_err(download_err)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    debug!(url, bytes = written, path = %dest.display(), "downloaded resource");
    Ok(written)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_body_to_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/static/tacos.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(b"\xff\xd8\xff\xe0jpeg-bytes")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tacos.jpg");
        let url = format!("{}/static/tacos.jpg", server.url());
        let n = download_resource(&reqwest::Client::new(), &url, &dest)
            .await
            .unwrap();

        assert_eq!(n, 14);
        assert_eq!(std::fs::read(&dest).unwrap(), b"\xff\xd8\xff\xe0jpeg-bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_resource_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone.png")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/gone.png", server.url());
        let err = download_resource(&reqwest::Client::new(), &url, &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Download { .. }));
        assert!(err.to_string().contains("/gone.png"));
    }
}
