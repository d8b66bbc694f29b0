// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Allocation, release and texture ownership across a cache's lifetime.

use write_pixels::imp::SharedTexture;
use write_pixels::{
    Error, PixelFormat, PixelsMeta, SoftwareBackend, TextureHandle, TextureMode, Uploader, UploaderConfig,
};

fn rgba(width: u32, height: u32) -> PixelsMeta {
    PixelsMeta::new(width, height, PixelFormat::Rgba8Unorm)
}

fn uploader(capacity: usize) -> Uploader<SoftwareBackend> {
    Uploader::with_config(SoftwareBackend::new(), UploaderConfig::new().with_capacity(capacity))
}

#[test]
fn indices_are_distinct_and_first_fit() {
    let mut uploader = uploader(16);
    let mut live: Vec<usize> = (0..10)
        .map(|_| uploader.allocate_owned(rgba(2, 2), false).unwrap())
        .collect();
    let mut sorted = live.clone();
    sorted.dedup();
    assert_eq!(sorted.len(), live.len());

    for released in [7, 2, 9] {
        uploader.release(released).unwrap();
        live.retain(|&i| i != released);
        let reused = uploader.allocate_owned(rgba(2, 2), false).unwrap();
        assert_eq!(reused, released);
        assert!(!live.contains(&reused));
        live.push(reused);
    }

    uploader.release(5).unwrap();
    uploader.release(3).unwrap();
    assert_eq!(uploader.allocate_owned(rgba(2, 2), false).unwrap(), 3);
    assert_eq!(uploader.allocate_owned(rgba(2, 2), false).unwrap(), 5);
    assert_eq!(uploader.allocate_owned(rgba(2, 2), false).unwrap(), 10);
}

#[test]
fn exhaustion_is_reported() {
    let mut uploader = uploader(3);
    for _ in 0..3 {
        uploader.allocate_owned(rgba(1, 1), false).unwrap();
    }
    assert!(matches!(
        uploader.allocate_owned(rgba(1, 1), false),
        Err(Error::PoolExhausted { capacity: 3 })
    ));
    assert_eq!(uploader.pool().in_use_count(), 3);
}

#[test]
fn release_of_never_allocated_is_tolerated() {
    let mut uploader = uploader(8);
    uploader.allocate_owned(rgba(1, 1), false).unwrap();
    uploader.allocate_owned(rgba(1, 1), false).unwrap();
    let before: Vec<usize> = uploader.pool().allocated().collect();

    uploader.release(6).unwrap();

    assert_eq!(uploader.pool().allocated().collect::<Vec<_>>(), before);
    assert_eq!(uploader.allocate_owned(rgba(1, 1), false).unwrap(), 2);
}

#[test]
fn release_out_of_range_fails() {
    let mut uploader = uploader(2);
    assert!(matches!(uploader.release(2), Err(Error::InvalidIndex(2))));
}

#[test]
fn owned_texture_is_created_lazily_with_configured_mode() {
    let backend = SoftwareBackend::new();
    let config = UploaderConfig::new()
        .with_capacity(2)
        .with_texture_mode(TextureMode::WriteOnly);
    let mut uploader = Uploader::with_config(backend, config);
    let index = uploader.allocate_owned(rgba(2, 2), false).unwrap();

    let cache = uploader.cache(index).unwrap();
    assert!(cache.is_used());
    assert!(cache.is_pending_creation());
    assert_eq!(uploader.texture_handle(index).unwrap(), None);
    assert_eq!(uploader.backend().textures_created(), 0);

    uploader.queue_bytes(index, vec![0u8; 16]).unwrap();
    uploader.advance(index).unwrap();

    let cache = uploader.cache(index).unwrap();
    let texture = cache.owned_texture().unwrap();
    assert_eq!(texture.mode(), TextureMode::WriteOnly);
    assert_eq!(uploader.backend().textures_created(), 1);
    assert!(uploader.texture_handle(index).unwrap().is_some());
}

#[test]
fn released_cache_drops_its_state() {
    let mut uploader = uploader(2);
    let index = uploader.allocate_owned(rgba(1, 2), true).unwrap();
    uploader.queue_bytes(index, vec![1u8; 8]).unwrap();
    uploader.advance(index).unwrap();
    uploader.release(index).unwrap();

    assert!(matches!(uploader.cache(index), Err(Error::NotAllocated(0))));
    assert!(matches!(uploader.rows_written(index), Err(Error::NotAllocated(0))));

    let again = uploader.allocate_owned(rgba(1, 2), false).unwrap();
    assert_eq!(again, index);
    let cache = uploader.cache(again).unwrap();
    assert!(cache.pending().is_none());
    assert!(cache.owned_texture().is_none());
    assert!(!cache.mips_enabled());
}

#[test]
fn bound_texture_is_written_but_never_owned() {
    let mut uploader = uploader(2);
    let meta = rgba(2, 2);
    let shared: SharedTexture = uploader.backend().create_shared(meta);
    let handle = TextureHandle::from_ref(&*shared);
    let index = uploader.allocate_bound(handle, shared.clone(), meta).unwrap();
    assert_eq!(uploader.texture_handle(index).unwrap(), Some(handle));

    let bytes: Vec<u8> = (0..16).collect();
    uploader.queue_bytes(index, bytes.clone()).unwrap();
    uploader.advance(index).unwrap();

    assert_eq!(uploader.backend().textures_created(), 0);
    assert!(uploader.cache(index).unwrap().owned_texture().is_none());
    assert_eq!(shared.lock().unwrap().level(0).unwrap(), &bytes[..]);

    uploader.release(index).unwrap();
    //still ours
    assert_eq!(std::sync::Arc::strong_count(&shared), 1);
    assert_eq!(shared.lock().unwrap().level(0).unwrap(), &bytes[..]);
}

#[test]
fn bound_texture_never_gets_mips() {
    let mut uploader = uploader(1);
    let meta = rgba(4, 4);
    let shared = uploader.backend().create_shared(meta);
    let handle = TextureHandle::from_ref(&*shared);
    let index = uploader.allocate_bound(handle, shared, meta).unwrap();
    uploader.queue_bytes(index, vec![255u8; 64]).unwrap();
    uploader.advance(index).unwrap();
    assert!(!uploader.cache(index).unwrap().mips_enabled());
    assert_eq!(uploader.backend().mip_generations(), 0);
}

#[test]
fn uploaded_texture_encodes_as_png() {
    let mut uploader = uploader(1);
    let index = uploader.allocate_owned(rgba(3, 2), false).unwrap();
    uploader.set_row_budget(index, 1).unwrap();
    uploader.queue_bytes(index, vec![200u8; 24]).unwrap();
    uploader.advance(index).unwrap();
    uploader.advance(index).unwrap();

    let texture = uploader.cache(index).unwrap().owned_texture().unwrap();
    let png = texture.encode_png().unwrap().unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn float_textures_have_no_png() {
    let mut uploader = uploader(1);
    let meta = PixelsMeta::new(1, 1, PixelFormat::R32Float);
    let index = uploader.allocate_owned(meta, false).unwrap();
    uploader.queue_bytes(index, 1.0f32.to_le_bytes()).unwrap();
    uploader.advance(index).unwrap();
    let texture = uploader.cache(index).unwrap().owned_texture().unwrap();
    assert!(texture.encode_png().unwrap().is_none());
}
