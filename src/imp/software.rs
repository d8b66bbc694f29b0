// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A CPU-memory backend.

Textures are plain byte buffers, one per mip level.  Useful headless, and as the reference
the wgpu backend is checked against.
*/

use crate::imp::{Backend, BackendError, BackendTexture, TextureHandle, TextureMode};
use crate::mips;
use crate::pixel_formats::{PixelRows, PixelsMeta};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Proof that the software "device" was available when it was obtained.
#[derive(Debug, Clone, Copy)]
pub struct SoftwareContext {
    _private: (),
}

//boxed so the handle stays put when the texture moves
#[derive(Debug)]
struct SoftwareView {
    #[allow(dead_code)] //only its address is used
    texture_id: u64,
}

/// A texture held in CPU memory.
#[derive(Debug)]
pub struct SoftwareTexture {
    meta: PixelsMeta,
    mode: TextureMode,
    levels: Vec<Box<[u8]>>,
    view: Box<SoftwareView>,
}

impl SoftwareTexture {
    /// A zeroed texture.  With `enable_mips` it has a full mip chain.
    pub fn new(meta: PixelsMeta, mode: TextureMode, enable_mips: bool) -> Self {
        let level_count = if enable_mips { meta.mip_level_count() } else { 1 };
        let mut levels = vec![vec![0u8; meta.data_size()].into_boxed_slice()];
        levels.extend(
            (1..level_count).map(|level| vec![0u8; meta.mip_level(level).data_size()].into_boxed_slice()),
        );
        Self {
            meta,
            mode,
            levels,
            view: Box::new(SoftwareView {
                texture_id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            }),
        }
    }

    pub fn meta(&self) -> &PixelsMeta {
        &self.meta
    }

    pub fn mode(&self) -> TextureMode {
        self.mode
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Contents of mip `level`, tightly packed.
    pub fn level(&self, level: usize) -> Option<&[u8]> {
        self.levels.get(level).map(|l| &l[..])
    }

    /// Bytes of row `y` of the base level.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let bytes_per_row = self.meta.bytes_per_row();
        self.levels[0].get(y * bytes_per_row..(y + 1) * bytes_per_row)
    }

    /// The base level as png, for formats png can represent.
    pub fn encode_png(&self) -> Result<Option<Vec<u8>>, png::EncodingError> {
        crate::pixel_formats::png_support::encode(&self.meta, &self.levels[0])
    }

    fn write(&mut self, rows: &PixelRows<'_>) -> Result<(), BackendError> {
        let source = rows.meta();
        if source.width() != self.meta.width() || source.format() != self.meta.format() {
            return Err(BackendError::TextureMismatch {
                expected: *source,
                actual: self.meta,
            });
        }
        if rows.row_last() > self.meta.height() as usize {
            return Err(BackendError::RowsOutOfBounds {
                row_first: rows.row_first(),
                row_last: rows.row_last(),
                height: self.meta.height(),
            });
        }
        let bytes_per_row = self.meta.bytes_per_row();
        for (y, row) in rows.rows() {
            let start = y * bytes_per_row;
            self.levels[0][start..start + bytes_per_row].copy_from_slice(row);
        }
        Ok(())
    }

    fn rebuild_mips(&mut self) {
        let chain = mips::mip_chain(&self.meta, &self.levels[0]);
        for (level, (_, data)) in self.levels.iter_mut().skip(1).zip(chain) {
            *level = data.into_boxed_slice();
        }
    }
}

impl BackendTexture for SoftwareTexture {
    type Context = SoftwareContext;

    fn write_rows(&mut self, _context: &SoftwareContext, rows: &PixelRows<'_>) -> Result<(), BackendError> {
        self.write(rows)
    }

    fn display_view(&self) -> TextureHandle {
        TextureHandle::from_ref(&*self.view)
    }
}

/// A caller-owned software texture.  The caller keeps one clone to read back results.
pub type SharedTexture = Arc<Mutex<SoftwareTexture>>;

/**
Backend whose "GPU" is main memory.

The device context can be switched off to simulate a host whose graphics API
hasn't come up yet.
*/
#[derive(Debug)]
pub struct SoftwareBackend {
    context_available: AtomicBool,
    textures_created: AtomicUsize,
    mip_generations: AtomicUsize,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self {
            context_available: AtomicBool::new(true),
            textures_created: AtomicUsize::new(0),
            mip_generations: AtomicUsize::new(0),
        }
    }

    /// A backend whose context is unavailable until [Self::set_context_available].
    pub fn without_context() -> Self {
        let backend = Self::new();
        backend.set_context_available(false);
        backend
    }

    pub fn set_context_available(&self, available: bool) {
        self.context_available.store(available, Ordering::Relaxed);
    }

    /// A texture for use with bind-existing allocation.
    pub fn create_shared(&self, meta: PixelsMeta) -> SharedTexture {
        Arc::new(Mutex::new(SoftwareTexture::new(meta, TextureMode::default(), false)))
    }

    /// Number of textures created through [Backend::create_texture].
    pub fn textures_created(&self) -> usize {
        self.textures_created.load(Ordering::Relaxed)
    }

    /// Number of [Backend::generate_mips] calls.
    pub fn mip_generations(&self) -> usize {
        self.mip_generations.load(Ordering::Relaxed)
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SoftwareBackend {
    type Context = SoftwareContext;
    type Texture = SoftwareTexture;
    type External = SharedTexture;

    fn current_context(&self) -> Option<SoftwareContext> {
        self.context_available
            .load(Ordering::Relaxed)
            .then_some(SoftwareContext { _private: () })
    }

    fn create_texture(
        &self,
        _context: &SoftwareContext,
        meta: &PixelsMeta,
        mode: TextureMode,
        enable_mips: bool,
    ) -> Result<SoftwareTexture, BackendError> {
        self.textures_created.fetch_add(1, Ordering::Relaxed);
        Ok(SoftwareTexture::new(*meta, mode, enable_mips))
    }

    fn write_external(
        &self,
        _context: &SoftwareContext,
        external: &SharedTexture,
        rows: &PixelRows<'_>,
    ) -> Result<(), BackendError> {
        external
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(rows)
    }

    fn generate_mips(&self, _context: &SoftwareContext, texture: &mut SoftwareTexture) -> Result<(), BackendError> {
        self.mip_generations.fetch_add(1, Ordering::Relaxed);
        texture.rebuild_mips();
        Ok(())
    }
}
