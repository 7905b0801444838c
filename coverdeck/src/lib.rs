//! Swipeable cover carousel core.
//!
//! A three-pane previous/current/next strip driven by raw pointer events:
//! drag to peek at the adjacent pages, release to snap onto one, fling to
//! turn a page further. Covers are rendered off the control thread through
//! a pluggable executor and kept in a bounded cache that recycles pixel
//! buffers instead of freeing them.
//!
//! The crate draws nothing itself. Hosts describe items with
//! [`render::CoverSource`], produce covers with a [`render::CoverRenderer`],
//! then drive a [`carousel::CarouselController`] with pointer events and a
//! per-frame tick, painting whatever
//! [`carousel::CarouselController::visible_pages`] reports.
//!
//! ## Usage
//!
//! ```
//! use std::{convert::Infallible, sync::Arc, time::Instant};
//!
//! use coverdeck::{
//!     cache::CoverKey,
//!     carousel::{CarouselArgs, CarouselController},
//!     render::{CoverItem, CoverRenderer, CoverSource, InlineExecutor, RenderMode},
//!     window::SLOT_CURRENT,
//! };
//!
//! #[derive(Clone, PartialEq)]
//! struct Track(i64);
//!
//! impl CoverItem for Track {
//!     fn cover_key(&self) -> Option<CoverKey> {
//!         Some(self.0)
//!     }
//! }
//!
//! struct Playlist(i64);
//!
//! impl CoverSource for Playlist {
//!     type Item = Track;
//!
//!     fn item_at(&mut self, offset: i32) -> Option<Track> {
//!         Some(Track(self.0 + i64::from(offset)))
//!     }
//! }
//!
//! struct FlatRenderer;
//!
//! impl CoverRenderer for FlatRenderer {
//!     type Item = Track;
//!     type Cover = Vec<u8>;
//!     type Error = Infallible;
//!
//!     fn render(
//!         &self,
//!         _item: &Track,
//!         width: u32,
//!         height: u32,
//!         _mode: RenderMode,
//!         reuse: Option<Vec<u8>>,
//!     ) -> Result<Vec<u8>, Infallible> {
//!         let mut buffer = reuse.unwrap_or_default();
//!         buffer.resize((width * height) as usize, 0);
//!         Ok(buffer)
//!     }
//!
//!     fn release(&self, _cover: Vec<u8>) {}
//! }
//!
//! let mut carousel = CarouselController::new(
//!     CarouselArgs::new(900.0),
//!     Playlist(10),
//!     Arc::new(FlatRenderer),
//!     Box::new(InlineExecutor),
//! );
//! carousel.set_surface_size(320, 240);
//! carousel.initialize(10);
//! carousel.tick(Instant::now());
//! assert!(carousel.cover_for(SLOT_CURRENT).is_some());
//! ```

#![deny(missing_docs, clippy::unwrap_used)]

mod animation;
mod velocity;

pub mod cache;
pub mod carousel;
pub mod render;
pub mod window;
