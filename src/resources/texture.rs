use std::path::Path;

use crate::{
    data_structures::texture::Texture,
    error::{EngineError, Result},
    resources::{
        database::AssetDatabase,
        material::{TextureRequest, TextureSource},
    },
};

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| EngineError::msg("no browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| EngineError::msg("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{origin}/assets/"))
        .map_err(|e| EngineError::with_cause("invalid asset base url", e))?;
    base.join(file_name)
        .map_err(|e| EngineError::with_cause(format!("invalid asset url {file_name}"), e))
}

/// Native location of an asset: absolute paths are kept, relative ones are
/// resolved against `./assets`.
#[cfg(not(target_arch = "wasm32"))]
pub fn asset_path(file_name: &str) -> std::path::PathBuf {
    let path = Path::new(file_name);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new("./").join("assets").join(path)
    }
}

pub async fn load_string(file_name: &str) -> Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await
            .map_err(EngineError::from_cause)?
            .text()
            .await
            .map_err(EngineError::from_cause)?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = tokio::fs::read_to_string(asset_path(file_name))
        .await
        .map_err(|e| EngineError::with_cause(format!("could not read {file_name}"), e))?;

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await
            .map_err(EngineError::from_cause)?
            .bytes()
            .await
            .map_err(EngineError::from_cause)?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(asset_path(file_name))
        .await
        .map_err(|e| EngineError::with_cause(format!("could not read {file_name}"), e))?;

    Ok(data)
}

pub async fn load_texture(
    file_name: &str,
    linear: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<Texture> {
    let data = load_binary(file_name).await?;
    let format = Path::new(file_name).extension().and_then(|e| e.to_str());
    Texture::from_bytes(device, queue, &data, file_name, format, linear)
}

/// Load every requested texture that is not in `db` yet.
///
/// Files are read concurrently. A texture that fails to load is skipped with
/// a warning; materials referencing it render with the slot's fallback.
pub async fn load_requested_textures(
    requests: &[TextureRequest],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    db: &mut AssetDatabase,
) {
    let pending: Vec<&TextureRequest> = requests
        .iter()
        .filter(|request| {
            let cached = db.contains(&request.key);
            if cached {
                log::debug!("texture {} is cached", request.key);
            }
            !cached
        })
        .collect();

    let loaded = futures::future::join_all(
        pending
            .iter()
            .map(|request| load_request(request, device, queue)),
    )
    .await;

    for (request, texture) in pending.into_iter().zip(loaded) {
        match texture {
            Ok(texture) => {
                db.insert(request.key.clone(), texture);
            }
            Err(e) => log::warn!("texture {} could not be loaded: {e}", request.key),
        }
    }
}

async fn load_request(
    request: &TextureRequest,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<Texture> {
    match &request.source {
        TextureSource::File(path) => load_texture(path, request.linear, device, queue).await,
        TextureSource::Embedded { bytes, .. } => Texture::from_bytes(
            device,
            queue,
            bytes,
            &request.key,
            request.source.format_hint(),
            request.linear,
        ),
    }
}
