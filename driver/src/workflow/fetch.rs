use anyhow::{bail, Context};
use log::info;
use skyplotcore::feed::StateSnapshot;
use std::fs;
use std::path::Path;

pub const DEFAULT_SOURCE_URL: &str = "https://opensky-network.org/api/states/all";

/// Retrieves one snapshot from the upstream feed. Any transport, status or decode
/// failure is returned as an error and the pipeline is not run for that pass.
pub async fn fetch_snapshot(url: &str) -> anyhow::Result<StateSnapshot> {
    info!("Beginning fetch from {}", url);
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("requesting snapshot from {url}"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("snapshot request to {url} failed with {status}");
    }

    let snapshot = response
        .json::<StateSnapshot>()
        .await
        .with_context(|| format!("decoding snapshot from {url}"))?;
    info!("Fetched {} states", snapshot.len());
    Ok(snapshot)
}

/// Reads a snapshot previously saved from the feed.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> anyhow::Result<StateSnapshot> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading snapshot {}", path_ref.display()))?;
    let snapshot = StateSnapshot::from_json(&contents)
        .with_context(|| format!("parsing snapshot {}", path_ref.display()))?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::SocketAddr;
    use tempfile::NamedTempFile;
    use warp::{http::StatusCode, Filter};

    const DOCUMENT: &str = r#"{"time": 1700000000, "states": [
        ["4b1805", "SWR38A  ", "Switzerland", 1700000000, 1700000000, 7.4, 46.9, 10363.2, false, 221.5, 45.0, 0.0, null, 10500.0, "2315", false, 0],
        ["4b1806", "SWR12   ", "Switzerland", 1700000000, 1700000000, 8.5, 47.4, null, true, 0.0, null, null, null, null, null, false, 0]
    ]}"#;

    fn local_addr() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[test]
    fn load_snapshot_reads_saved_document() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(DOCUMENT.as_bytes()).unwrap();
        let path = temp.into_temp_path();
        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.states[1].on_ground);
    }

    #[test]
    fn load_snapshot_reports_parse_failure() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"<html>rate limited</html>").unwrap();
        let path = temp.into_temp_path();
        let err = load_snapshot(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing snapshot"));
    }

    #[tokio::test]
    async fn fetch_snapshot_decodes_response() {
        let route = warp::path!("api" / "states" / "all").map(|| {
            warp::reply::with_header(DOCUMENT, "content-type", "application/json")
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(local_addr());
        tokio::spawn(server);

        let snapshot = fetch_snapshot(&format!("http://{addr}/api/states/all"))
            .await
            .unwrap();
        assert_eq!(snapshot.time, Some(1700000000));
        assert_eq!(snapshot.states[0].callsign.as_deref(), Some("SWR38A  "));
    }

    #[tokio::test]
    async fn fetch_snapshot_fails_on_error_status() {
        let route = warp::any().map(|| {
            warp::reply::with_status("too many requests", StatusCode::TOO_MANY_REQUESTS)
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(local_addr());
        tokio::spawn(server);

        let err = fetch_snapshot(&format!("http://{addr}/")).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
