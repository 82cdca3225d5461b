use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use url::Url;

/// Trigger a scan of a single folder inside a library section.
///
/// Endpoint: `GET /library/sections/{section_id}/refresh?path={path}`
///
/// Much faster than a full section refresh when only a few files were added.
/// `force` makes Plex rescan even if the folder timestamp did not change, but
/// may cause broader rescans.
pub async fn refresh_section_path(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    section_id: &str,
    path: &str,
    force: bool,
) -> Result<()> {
    let mut url = base_url.join(&format!("library/sections/{}/refresh", section_id))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("path", path);
        if force {
            query.append_pair("force", "1");
        }
    }

    log::debug!("Refreshing section {} path {} (force: {})", section_id, path, force);

    client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .send()
        .await?
        .error_for_status()
        .wrap_err("Failed to refresh library section path")?;

    Ok(())
}
