use std::{
    fs::OpenOptions,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use bytes::Bytes;
use chrono::Local;
use color_eyre::{
    Result,
    eyre::{WrapErr as _, ensure},
};
use log::debug;
use reqwest::Client;

/// `YYYYmmdd_HHMMSS` in local time
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub async fn fetch(client: &Client, url: &str) -> Result<Bytes> {
    let resp = client
        .get(url)
        .send()
        .await
        .wrap_err_with(|| format!("Failed to download image from {url}"))?;
    let status = resp.status();
    ensure!(
        status.is_success(),
        "Failed to download image from {url}: {status}"
    );
    Ok(resp.bytes().await?)
}

/// Creates `<stem>.<ext>` in `folder`, or `<stem>_<n>.<ext>` with the first free `n` when
/// the name is taken. Existing files are never overwritten.
pub fn write_unique(folder: &Path, stem: &str, ext: &str, bytes: &[u8]) -> Result<PathBuf> {
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{stem}.{ext}")
        } else {
            format!("{stem}_{attempt}.{ext}")
        };
        let path = folder.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)
                    .wrap_err_with(|| format!("Couldn't write {}", path.display()))?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(e).wrap_err_with(|| format!("Couldn't create {}", path.display()));
            }
        }
    }
}

/// Downloads `url` into `folder` as `<prefix>_<timestamp>.<ext>`
pub async fn save_image(
    client: &Client,
    url: &str,
    folder: &Path,
    prefix: &str,
    ext: &str,
) -> Result<PathBuf> {
    let bytes = fetch(client, url).await?;
    debug!("Downloaded {} bytes from {url}", bytes.len());
    write_unique(folder, &format!("{prefix}_{}", timestamp()), ext, &bytes)
}


#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::{
        testing::{dead_url, serve_image},
        *,
    };

    #[test]
    fn timestamp_shape() {
        let ts = timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn same_second_names_do_not_collide() -> Result<()> {
        let dir = tempdir()?;
        let first = write_unique(dir.path(), "logo_20250101_120000", "png", b"one")?;
        let second = write_unique(dir.path(), "logo_20250101_120000", "png", b"two")?;
        let third = write_unique(dir.path(), "logo_20250101_120000", "png", b"three")?;

        assert_eq!(first.file_name().unwrap(), "logo_20250101_120000.png");
        assert_eq!(second.file_name().unwrap(), "logo_20250101_120000_1.png");
        assert_eq!(third.file_name().unwrap(), "logo_20250101_120000_2.png");
        assert_eq!(fs::read(&first)?, b"one");
        assert_eq!(fs::read(&second)?, b"two");
        Ok(())
    }

    #[tokio::test]
    async fn saves_downloaded_bytes() -> Result<()> {
        let dir = tempdir()?;
        let server = MockServer::start().await;
        let url = serve_image(&server, "/out/0.png", b"\x89PNG fake").await;

        let client = Client::new();
        let first = save_image(&client, &url, dir.path(), "sticker", "png").await?;
        let second = save_image(&client, &url, dir.path(), "sticker", "png").await?;

        assert_ne!(first, second);
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("sticker_") && name.ends_with(".png"), "{name}");
        assert_eq!(fs::read(&second)?, b"\x89PNG fake");
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.png"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;
        let url = format!("{}/gone.png", server.uri());

        let err = save_image(&Client::new(), &url, dir.path(), "logo", "png")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("410"), "{err}");
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() -> Result<()> {
        let url = dead_url("x.png");
        let err = fetch(&Client::new(), &url).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to download image from"));
        Ok(())
    }
}
