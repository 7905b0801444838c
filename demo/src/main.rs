//! Headless drive of the cover carousel: a scripted gesture session over a
//! small album library, with covers rendered off-thread into RGBA images.
//!
//! Run with `RUST_LOG=debug` to watch the controller's internal decisions.

use std::{
    convert::Infallible,
    error::Error,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use coverdeck::{
    cache::CoverKey,
    carousel::{CarouselArgs, CarouselController},
    render::{CoverItem, CoverRenderer, CoverSource, RenderMode, ThreadExecutor},
    window::SLOT_CURRENT,
};
use image::{Rgba, RgbaImage};
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);
const SURFACE: u32 = 480;

const LIBRARY: &[(&str, &str)] = &[
    ("Morning Glass", "The Harbor Lights"),
    ("Static Bloom", "Velvet Arcade"),
    ("Northern Mile", "June Runner"),
    ("Paper Planets", "The Harbor Lights"),
    ("Low Tide Atlas", "Cobalt Choir"),
    ("Second Summer", "Velvet Arcade"),
    ("Glasshouse", "Mara Voss"),
    ("Departures", "Cobalt Choir"),
];

#[derive(Clone, PartialEq, Debug)]
struct Album {
    index: i64,
    title: &'static str,
    artist: &'static str,
}

impl CoverItem for Album {
    fn cover_key(&self) -> Option<CoverKey> {
        (self.index >= 0).then_some(self.index)
    }
}

struct Playlist {
    cursor: Arc<AtomicI64>,
}

impl Playlist {
    fn album_at(index: i64) -> Option<Album> {
        let entry = usize::try_from(index).ok().and_then(|i| LIBRARY.get(i))?;
        Some(Album {
            index,
            title: entry.0,
            artist: entry.1,
        })
    }
}

impl CoverSource for Playlist {
    type Item = Album;

    fn item_at(&mut self, offset: i32) -> Option<Album> {
        Self::album_at(self.cursor.load(Ordering::SeqCst) + i64::from(offset))
    }
}

/// Paints flat tinted covers with a darker info band whose height depends
/// on the render mode.
struct AlbumArtRenderer;

impl AlbumArtRenderer {
    fn tint(index: i64) -> Rgba<u8> {
        let seed = (index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Rgba([
            (seed >> 16) as u8 | 0x40,
            (seed >> 32) as u8 | 0x40,
            (seed >> 48) as u8 | 0x40,
            0xff,
        ])
    }
}

impl CoverRenderer for AlbumArtRenderer {
    type Item = Album;
    type Cover = RgbaImage;
    type Error = Infallible;

    fn render(
        &self,
        item: &Album,
        width: u32,
        height: u32,
        mode: RenderMode,
        reuse: Option<RgbaImage>,
    ) -> Result<RgbaImage, Infallible> {
        let mut canvas = match reuse {
            Some(existing) if existing.dimensions() == (width, height) => existing,
            _ => RgbaImage::new(width, height),
        };
        let tint = Self::tint(item.index);
        for pixel in canvas.pixels_mut() {
            *pixel = tint;
        }

        // Overlapping keeps the art full-bleed with a thin dimmed strip for
        // the track info; separated reserves a third of the page for it.
        let band_top = match mode {
            RenderMode::Overlapping => height - height / 5,
            RenderMode::Separated => height - height / 3,
        };
        for y in band_top..height {
            for x in 0..width {
                let Rgba([r, g, b, a]) = *canvas.get_pixel(x, y);
                canvas.put_pixel(x, y, Rgba([r / 3, g / 3, b / 3, a]));
            }
        }
        Ok(canvas)
    }

    fn release(&self, _cover: RgbaImage) {}
}

type Deck = CarouselController<Playlist, AlbumArtRenderer>;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,coverdeck=debug"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(filter)
        .init();
}

fn pump(deck: &mut Deck, frames: u32) {
    for _ in 0..frames {
        deck.tick(Instant::now());
        thread::sleep(FRAME);
    }
}

fn pump_until_settled(deck: &mut Deck) {
    for _ in 0..300 {
        deck.tick(Instant::now());
        if !deck.is_settling() {
            return;
        }
        thread::sleep(FRAME);
    }
}

/// Scripted horizontal drag over roughly `ms` milliseconds.
fn swipe(deck: &mut Deck, from_x: f32, to_x: f32, ms: u64) {
    let steps = (ms / 16).max(1);
    let dx = (to_x - from_x) / steps as f32;
    let mut x = from_x;
    deck.pointer_down(x, SURFACE as f32 / 2.0, Instant::now());
    for _ in 0..steps {
        thread::sleep(FRAME);
        x += dx;
        deck.pointer_move(x, SURFACE as f32 / 2.0, Instant::now());
        deck.tick(Instant::now());
    }
    deck.pointer_up(x, SURFACE as f32 / 2.0, Instant::now());
}

/// Applies committed page turns the way a playback host would: advance the
/// playlist cursor, then hand the new current track back to the carousel.
fn process_turns(deck: &mut Deck, cursor: &AtomicI64, turned: &Mutex<Vec<i32>>) {
    let deltas: Vec<i32> = turned.lock().expect("turn queue").drain(..).collect();
    for delta in deltas {
        let position = cursor.load(Ordering::SeqCst) + i64::from(delta);
        cursor.store(position, Ordering::SeqCst);
        let current = Playlist::album_at(position);
        info!(
            position,
            track = current.as_ref().map(|album| album.title),
            artist = current.as_ref().map(|album| album.artist),
            "now playing"
        );
        deck.on_window_changed(position as usize, current.as_ref(), false);
    }
}

fn describe(deck: &Deck) {
    let title = deck
        .item(SLOT_CURRENT)
        .map(|album| album.title)
        .unwrap_or("<blank>");
    info!(
        position = deck.position(),
        title,
        visible = deck.visible_pages().len(),
        mode = ?deck.render_mode(),
        "carousel state"
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let cursor = Arc::new(AtomicI64::new(2));
    let turned = Arc::new(Mutex::new(Vec::new()));
    let repaints = Arc::new(AtomicUsize::new(0));
    let layout_requested = Arc::new(AtomicBool::new(false));

    let args = {
        let turned = Arc::clone(&turned);
        let repaints = Arc::clone(&repaints);
        let layout_requested = Arc::clone(&layout_requested);
        CarouselArgs::new(900.0)
            .on_commit(move |delta| turned.lock().expect("turn queue").push(delta))
            .on_tap(|| info!("tap: toggling playback"))
            .on_long_press(move || {
                info!("long press: switching cover layout");
                layout_requested.store(true, Ordering::SeqCst);
            })
            .on_redraw(move || {
                repaints.fetch_add(1, Ordering::SeqCst);
            })
    };

    let mut deck = CarouselController::new(
        args,
        Playlist {
            cursor: Arc::clone(&cursor),
        },
        Arc::new(AlbumArtRenderer),
        Box::new(ThreadExecutor::spawn()?),
    );

    deck.set_surface_size(SURFACE, SURFACE);
    deck.initialize(cursor.load(Ordering::SeqCst) as usize);
    pump(&mut deck, 20);
    describe(&deck);

    info!("fast rightward swipe: fling to the next track");
    swipe(&mut deck, 120.0, 360.0, 96);
    pump_until_settled(&mut deck);
    process_turns(&mut deck, &cursor, &turned);
    pump(&mut deck, 10);
    describe(&deck);

    info!("long leftward drag: pull the previous track back in");
    swipe(&mut deck, 420.0, 80.0, 240);
    pump_until_settled(&mut deck);
    process_turns(&mut deck, &cursor, &turned);
    pump(&mut deck, 10);
    describe(&deck);

    info!("quick touch");
    deck.pointer_down(240.0, 240.0, Instant::now());
    thread::sleep(Duration::from_millis(40));
    deck.pointer_up(242.0, 240.0, Instant::now());

    info!("press and hold");
    deck.pointer_down(240.0, 240.0, Instant::now());
    pump(&mut deck, 40);
    deck.pointer_up(240.0, 240.0, Instant::now());
    if layout_requested.swap(false, Ordering::SeqCst) {
        deck.toggle_render_mode();
        pump(&mut deck, 20);
        describe(&deck);
    }

    info!("surface rotated");
    deck.set_surface_size(640, 360);
    pump(&mut deck, 20);
    describe(&deck);

    if let Some(cover) = deck.cover_for(SLOT_CURRENT) {
        let path = std::env::temp_dir().join("coverdeck-current.png");
        cover.save(&path)?;
        info!(path = %path.display(), "saved the current cover");
    }

    info!(repaints = repaints.load(Ordering::SeqCst), "session done");
    Ok(())
}
