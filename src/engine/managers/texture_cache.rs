use std::cell::Cell;
use std::collections::HashMap;
use std::path::{ Path, PathBuf };
use std::rc::Rc;

use image::imageops::{ self, FilterType };
use tokio::runtime::Handle;
use tokio::sync::mpsc::{ unbounded_channel, UnboundedReceiver, UnboundedSender };

use crate::engine::error::TextureLoadError;
use crate::engine::rendering::device::RenderDevice;
use crate::engine::utils::math::{ is_power_of_two, next_power_of_two };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    Pending,
    Ready,
    Failed,
}

/// A cached texture. The GPU object exists from the moment the slot is
/// created; its pixels only become meaningful once the state is `Ready`.
#[derive(Debug)]
pub struct TextureSlot<T> {
    key: String,
    texture: T,
    state: Cell<TextureState>,
}

impl<T: Copy> TextureSlot<T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn texture(&self) -> T {
        self.texture
    }

    pub fn state(&self) -> TextureState {
        self.state.get()
    }

    pub fn is_ready(&self) -> bool {
        self.state.get() == TextureState::Ready
    }
}

/// RGBA8 pixels, bottom row first, with power-of-two sides.
#[derive(Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

struct FinishedLoad {
    key: String,
    result: Result<DecodedImage, TextureLoadError>,
}

pub type TextureHandle<D> = Rc<TextureSlot<<D as RenderDevice>::Texture>>;

/// Path-keyed texture cache with asynchronous loading.
///
/// Reads and decodes run on the tokio runtime; finished images are sent back
/// over a channel and uploaded on the render thread by `poll` or
/// `wait_until_loaded`. A key is fetched at most once, whether it succeeds
/// or fails.
pub struct TextureCache<D: RenderDevice> {
    runtime: Handle,
    slots: HashMap<String, TextureHandle<D>>,
    sender: UnboundedSender<FinishedLoad>,
    receiver: UnboundedReceiver<FinishedLoad>,
    pending: usize,
}

impl<D: RenderDevice> TextureCache<D> {
    pub fn new(runtime: Handle) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            runtime,
            slots: HashMap::new(),
            sender,
            receiver,
            pending: 0,
        }
    }

    /// Returns the slot for `key`, starting a load the first time it is seen.
    pub fn get_or_create(&mut self, device: &D, key: &str) -> Option<TextureHandle<D>> {
        if key.is_empty() {
            log::error!("texture requested with an empty path");
            return None;
        }
        if let Some(slot) = self.slots.get(key) {
            return Some(Rc::clone(slot));
        }

        let texture = match device.create_texture() {
            Ok(texture) => texture,
            Err(e) => {
                log::error!("could not create texture for {}: {}", key, e);
                return None;
            }
        };

        let slot = Rc::new(TextureSlot {
            key: key.to_string(),
            texture,
            state: Cell::new(TextureState::Pending),
        });
        self.slots.insert(key.to_string(), Rc::clone(&slot));
        self.pending += 1;

        let sender = self.sender.clone();
        let key = key.to_string();
        self.runtime.spawn(async move {
            let result = load_image(PathBuf::from(&key)).await;
            // The receiver only goes away with the cache itself.
            let _ = sender.send(FinishedLoad { key, result });
        });

        Some(slot)
    }

    /// Number of loads started but not yet finished.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Uploads every load that has finished so far without blocking.
    pub fn poll(&mut self, device: &D) {
        while let Ok(finished) = self.receiver.try_recv() {
            self.finish(device, finished);
        }
    }

    /// Resolves once no load is outstanding.
    pub async fn wait_until_loaded(&mut self, device: &D) {
        while self.pending > 0 {
            match self.receiver.recv().await {
                Some(finished) => self.finish(device, finished),
                None => break,
            }
        }
    }

    fn finish(&mut self, device: &D, finished: FinishedLoad) {
        self.pending = self.pending.saturating_sub(1);

        let Some(slot) = self.slots.get(&finished.key) else {
            log::warn!("finished load for unknown texture {}", finished.key);
            return;
        };

        match finished.result {
            Ok(image) => {
                device.upload_texture_image(slot.texture, image.width, image.height, &image.pixels);
                slot.state.set(TextureState::Ready);
                log::info!("texture {} ready ({}x{})", slot.key, image.width, image.height);
            }
            Err(e) => {
                slot.state.set(TextureState::Failed);
                log::error!("texture {} failed: {}", slot.key, e);
            }
        }
    }

    pub fn release(&mut self, device: &D) {
        for (_, slot) in self.slots.drain() {
            device.delete_texture(slot.texture);
        }
    }
}

async fn load_image(path: PathBuf) -> Result<DecodedImage, TextureLoadError> {
    let bytes = tokio::fs::read(&path).await.map_err(|source| TextureLoadError::Io {
        path: path.clone(),
        source,
    })?;

    let task_path = path.clone();
    let decoded = tokio::task::spawn_blocking(move || decode_image(&task_path, &bytes)).await;
    decoded.map_err(|e| TextureLoadError::Task { path, reason: e.to_string() })?
}

/// Decodes to RGBA8, flips to GL's bottom-left origin and stretches to
/// power-of-two sides when needed.
pub fn decode_image(path: &Path, bytes: &[u8]) -> Result<DecodedImage, TextureLoadError> {
    let decoded = image::load_from_memory(bytes).map_err(|source| TextureLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rgba = decoded.to_rgba8();
    imageops::flip_vertical_in_place(&mut rgba);

    let (width, height) = rgba.dimensions();
    if !is_power_of_two(width) || !is_power_of_two(height) {
        let (w, h) = (next_power_of_two(width), next_power_of_two(height));
        log::debug!("resampling {} from {}x{} to {}x{}", path.display(), width, height, w, h);
        rgba = imageops::resize(&rgba, w, h, FilterType::Triangle);
    }

    let (width, height) = rgba.dimensions();
    Ok(DecodedImage { width, height, pixels: rgba.into_raw() })
}
