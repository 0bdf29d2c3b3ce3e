#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/", origin))?;
    Ok(base.join(file_name)?)
}

/// Reads a whole resource into memory.
///
/// On the web `file_name` is resolved against the page origin and `asset_root`
/// is ignored; natively it is a path below `asset_root`.
#[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
pub async fn load_binary(asset_root: &str, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        // URLs are origin-absolute ("/models/x.glb"), the asset root stands in for the origin
        let path = std::path::Path::new(asset_root).join(file_name.trim_start_matches('/'));
        std::fs::read(&path).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?
    };

    Ok(data)
}
