/// Media helpers for captured photos
///
/// This module handles:
/// - Generating list thumbnails
/// - Caching thumbnails to disk

pub mod thumbnail;
