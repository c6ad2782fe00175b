//! Texture asset database.
//!
//! Textures are referenced by string keys everywhere in the engine
//! (materials, water maps, GUI panes). The database resolves those keys to GPU
//! textures and falls back to one of its built-in textures when a key is
//! unknown, so a missing texture never aborts a frame.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::data_structures::{material::TextureType, texture::Texture};

pub const TEXTURE_BLACK: &str = "builtin/black";
pub const TEXTURE_WHITE: &str = "builtin/white";
pub const DEFAULT_NORMAL_MAP: &str = "builtin/normal";

static NEXT_DATABASE_ID: AtomicU64 = AtomicU64::new(0);

/// Built-in texture used when a key cannot be resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    Black,
    White,
    NormalMap,
}

impl Fallback {
    /// Neutral value for a material slot.
    pub fn for_slot(ty: TextureType) -> Self {
        match ty {
            TextureType::Normals => Fallback::NormalMap,
            TextureType::Displacement => Fallback::Black,
            TextureType::Diffuse
            | TextureType::Specular
            | TextureType::Ambient
            | TextureType::Opacity => Fallback::White,
        }
    }
}

pub struct AssetDatabase {
    id: u64,
    textures: HashMap<String, Texture>,
    black: Texture,
    white: Texture,
    normal_map: Texture,
}

impl AssetDatabase {
    /// Create the database with its built-in textures of `size` x `size` pixels.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, size: u32) -> Self {
        Self {
            id: NEXT_DATABASE_ID.fetch_add(1, Ordering::Relaxed),
            textures: HashMap::new(),
            black: Texture::solid_color(device, queue, [0, 0, 0, 255], size, false, TEXTURE_BLACK),
            white: Texture::solid_color(
                device,
                queue,
                [255, 255, 255, 255],
                size,
                false,
                TEXTURE_WHITE,
            ),
            normal_map: Texture::create_default_normal_map(size, device, queue),
        }
    }

    /// Identifies this database among all databases created by the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Look up `key`, built-in keys included.
    pub fn get(&self, key: &str) -> Option<&Texture> {
        match key {
            TEXTURE_BLACK => Some(&self.black),
            TEXTURE_WHITE => Some(&self.white),
            DEFAULT_NORMAL_MAP => Some(&self.normal_map),
            _ => self.textures.get(key),
        }
    }

    /// Resolve `key` or return the `fallback` texture.
    pub fn texture(&self, key: Option<&str>, fallback: Fallback) -> &Texture {
        match key {
            None => self.fallback(fallback),
            Some(key) => self.get(key).unwrap_or_else(|| {
                log::warn!("texture {key} is not loaded, using {fallback:?}");
                self.fallback(fallback)
            }),
        }
    }

    pub fn fallback(&self, fallback: Fallback) -> &Texture {
        match fallback {
            Fallback::Black => &self.black,
            Fallback::White => &self.white,
            Fallback::NormalMap => &self.normal_map,
        }
    }

    /// Store a texture. Returns `false` and keeps the old texture if `key`
    /// is already present.
    pub fn insert(&mut self, key: impl Into<String>, texture: Texture) -> bool {
        let key = key.into();
        if self.contains(&key) {
            log::debug!("texture {key} already loaded");
            return false;
        }
        self.textures.insert(key, texture);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of loaded textures, built-ins excluded.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
