//! Gesture-driven three-pane carousel controller.
//!
//! [`CarouselController`] owns the sliding item window, the bounded cover
//! cache and the horizontal gesture state machine. The host feeds it raw
//! pointer events plus a per-frame [`CarouselController::tick`], draws
//! whatever [`CarouselController::visible_pages`] reports, and reacts to the
//! hooks configured on [`CarouselArgs`]: a committed page turn, a tap, a
//! long press, or a redraw request.
//!
//! All methods must be called from one thread. Rendering runs wherever the
//! configured [`RenderExecutor`] puts it; finished covers are handed back
//! over a channel and installed during `tick`, so the controller itself
//! never blocks on a render.

use std::{
    sync::{Arc, mpsc},
    time::{Duration, Instant},
};

use derive_setters::Setters;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::{
    animation::SnapAnimation,
    cache::{CoverCache, DEFAULT_CACHE_CAPACITY},
    render::{CoverItem, CoverRenderer, CoverSource, RenderExecutor, RenderMode, RenderOutcome},
    velocity::FlingTracker,
    window::{CoverWindow, SLOT_COUNT, SLOT_CURRENT},
};

/// Maximum Manhattan displacement, in pixels, for a gesture to count as a tap.
const TAP_THRESHOLD: f32 = 10.0;
/// How long a pointer must rest before the gesture becomes a long press.
const DEFAULT_LONG_PRESS_TIMEOUT: Duration = Duration::from_millis(500);
/// Settle animation pace: time spent per pixel of remaining distance.
const SNAP_TIME_PER_PX: Duration = Duration::from_millis(2);

type CommitHook = Arc<dyn Fn(i32) + Send + Sync>;
type EventHook = Arc<dyn Fn() + Send + Sync>;

/// Configuration and event hooks for a [`CarouselController`].
#[derive(Setters)]
pub struct CarouselArgs {
    /// Minimum pointer velocity, in px/s, for a release to count as a fling.
    ///
    /// Required at construction; hosts derive it from their input stack's
    /// touch configuration, so there is no meaningful built-in default.
    #[setters(skip)]
    pub min_fling_velocity: f32,
    /// Number of rendered covers kept alive. Must be at least one.
    pub cache_capacity: usize,
    /// Rest time before a stationary pointer becomes a long press.
    pub long_press_timeout: Duration,
    /// Maximum Manhattan displacement for a gesture to count as a tap.
    pub tap_threshold: f32,
    /// Settle animation pace as time per pixel of distance.
    pub snap_time_per_px: Duration,
    /// Initial visual treatment for rendered covers.
    pub render_mode: RenderMode,
    #[setters(skip)]
    on_commit: Option<CommitHook>,
    #[setters(skip)]
    on_tap: Option<EventHook>,
    #[setters(skip)]
    on_long_press: Option<EventHook>,
    #[setters(skip)]
    on_redraw: Option<EventHook>,
}

impl CarouselArgs {
    /// Creates args with the host-measured minimum fling velocity in px/s.
    pub fn new(min_fling_velocity: f32) -> Self {
        Self {
            min_fling_velocity,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            long_press_timeout: DEFAULT_LONG_PRESS_TIMEOUT,
            tap_threshold: TAP_THRESHOLD,
            snap_time_per_px: SNAP_TIME_PER_PX,
            render_mode: RenderMode::default(),
            on_commit: None,
            on_tap: None,
            on_long_press: None,
            on_redraw: None,
        }
    }

    /// Called when a settle commits a page turn of `delta` (`±1`) pages.
    ///
    /// Fires just before the window shifts, so the controller still reports
    /// the pre-turn position inside the hook.
    pub fn on_commit(mut self, hook: impl Fn(i32) + Send + Sync + 'static) -> Self {
        self.on_commit = Some(Arc::new(hook));
        self
    }

    /// Called when a gesture resolves to a tap.
    pub fn on_tap(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_tap = Some(Arc::new(hook));
        self
    }

    /// Called when a pointer rests long enough to become a long press.
    pub fn on_long_press(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_long_press = Some(Arc::new(hook));
        self
    }

    /// Called whenever the visible state changes and a frame should be
    /// drawn. May fire from the render executor's thread.
    pub fn on_redraw(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_redraw = Some(Arc::new(hook));
        self
    }
}

/// Where one window slot lands on the viewport this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    /// Window slot index: `0` previous, `1` current, `2` next.
    pub slot: usize,
    /// Horizontal origin of the page in viewport coordinates. Negative
    /// while the page hangs off the left edge.
    pub origin_x: f32,
}

/// Three-pane cover carousel: window, cache and gesture machine in one.
///
/// Type parameters tie the item flow together: the [`CoverSource`] serves
/// items, the [`CoverRenderer`] turns them into covers, and both must agree
/// on the item type.
pub struct CarouselController<S, R>
where
    S: CoverSource,
    R: CoverRenderer<Item = S::Item>,
{
    args: CarouselArgs,
    source: S,
    renderer: Arc<R>,
    executor: Box<dyn RenderExecutor>,
    cache: CoverCache<R::Cover>,
    window: CoverWindow<S::Item>,
    position: usize,
    surface_width: u32,
    surface_height: u32,
    render_mode: RenderMode,
    /// Horizontal scroll offset in pixels; page `k` is centered at `k * width`.
    scroll_offset: f32,
    is_dragging: bool,
    anchor_x: f32,
    anchor_y: f32,
    last_x: f32,
    tracker: Option<FlingTracker>,
    long_press_deadline: Option<Instant>,
    suppress_tap: bool,
    animation: Option<SnapAnimation>,
    pending_commit: Option<i32>,
    /// Bumped whenever cached covers are invalidated wholesale; results from
    /// older generations arrive stale and are released on drain.
    generation: u64,
    results_tx: mpsc::Sender<RenderOutcome<R::Cover, R::Error>>,
    results_rx: mpsc::Receiver<RenderOutcome<R::Cover, R::Error>>,
}

impl<S, R> CarouselController<S, R>
where
    S: CoverSource,
    R: CoverRenderer<Item = S::Item>,
{
    /// Creates an idle controller; nothing renders until the surface gets a
    /// size via [`CarouselController::set_surface_size`].
    pub fn new(
        args: CarouselArgs,
        source: S,
        renderer: Arc<R>,
        executor: Box<dyn RenderExecutor>,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        let cache = CoverCache::new(args.cache_capacity);
        let render_mode = args.render_mode;
        Self {
            args,
            source,
            renderer,
            executor,
            cache,
            window: CoverWindow::new(),
            position: 0,
            surface_width: 0,
            surface_height: 0,
            render_mode,
            scroll_offset: 0.0,
            is_dragging: false,
            anchor_x: 0.0,
            anchor_y: 0.0,
            last_x: 0.0,
            tracker: None,
            long_press_deadline: None,
            suppress_tap: false,
            animation: None,
            pending_commit: None,
            generation: 0,
            results_tx,
            results_rx,
        }
    }

    /// Adopts a new surface size, rebuilding every cover for it.
    ///
    /// A zero dimension means the surface is not ready and the call is
    /// ignored, as is a size identical to the current one. Otherwise covers
    /// rendered for the old size are released, any gesture or settle in
    /// progress is dropped, the strip recenters on the current page and all
    /// three covers are re-requested.
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width == self.surface_width && height == self.surface_height {
            return;
        }
        self.surface_width = width;
        self.surface_height = height;
        debug!(width, height, "surface resized");
        self.release_all_cached();
        self.reset_gesture();
        self.animation = None;
        self.pending_commit = None;
        self.scroll_offset = self.centered_offset();
        self.request_all();
        self.signal_redraw();
    }

    /// Adopts `position` as the current page and force-refreshes the window.
    ///
    /// Every slot is re-fetched from the source even when it already holds
    /// a matching item. A settle still in flight is dropped along with its
    /// pending page turn.
    pub fn initialize(&mut self, position: usize) {
        self.adopt_position(position);
        debug!(position, "carousel initialized");
        self.refresh(true);
    }

    /// Reconciles the window after the host's current item may have changed.
    ///
    /// `current_item` is the host's authoritative current item, or `None`
    /// when nothing is current. When `force` is set, or the center slot
    /// does not hold `current_item`, every slot is re-fetched; otherwise
    /// only blank slots are filled in. A settle still in flight is dropped
    /// along with its pending page turn; the adopted position supersedes
    /// it.
    pub fn on_window_changed(
        &mut self,
        position: usize,
        current_item: Option<&S::Item>,
        force: bool,
    ) {
        let matches = match (self.window.item(SLOT_CURRENT), current_item) {
            (Some(held), Some(current)) => held == current,
            _ => false,
        };
        self.adopt_position(position);
        self.refresh(force || !matches);
    }

    /// Replaces the item in `slot` without moving the window, and requests
    /// its cover.
    ///
    /// For metadata changes on an already-visible page. Panics if `slot` is
    /// not below [`SLOT_COUNT`].
    pub fn replace_slot(&mut self, slot: usize, item: Option<S::Item>) {
        assert!(slot < SLOT_COUNT, "slot {slot} out of range");
        self.window.set(slot, item);
        self.request_cover(slot);
        self.signal_redraw();
    }

    /// Ensures a cover for the item in `slot` is cached or being rendered.
    ///
    /// Blank slots, placeholder items and an unsized surface are no-ops. A
    /// cache hit just promotes the entry; a miss reclaims the oldest cover
    /// for buffer reuse and queues a render job. Re-requesting the same
    /// slot is idempotent apart from that promotion.
    pub fn request_cover(&mut self, slot: usize) {
        assert!(slot < SLOT_COUNT, "slot {slot} out of range");
        if self.surface_width == 0 || self.surface_height == 0 {
            return;
        }
        let Some(item) = self.window.item(slot) else {
            return;
        };
        let Some(key) = item.cover_key() else {
            return;
        };

        if self.cache.contains(key) {
            self.cache.touch(key);
            self.signal_redraw();
            return;
        }

        let reuse = self.cache.discard_oldest();
        let item = item.clone();
        let renderer = Arc::clone(&self.renderer);
        let results = self.results_tx.clone();
        let redraw = self.args.on_redraw.clone();
        let (width, height) = (self.surface_width, self.surface_height);
        let mode = self.render_mode;
        let generation = self.generation;
        trace!(key, slot, "queueing cover render");
        self.executor.execute(Box::new(move || {
            let result = renderer.render(&item, width, height, mode, reuse);
            match results.send(RenderOutcome { key, generation, result }) {
                Ok(()) => {
                    if let Some(redraw) = &redraw {
                        redraw();
                    }
                }
                Err(mpsc::SendError(outcome)) => {
                    // Controller is already gone; reclaim the orphan here.
                    if let Ok(cover) = outcome.result {
                        renderer.release(cover);
                    }
                }
            }
        }));
    }

    /// Begins a gesture at viewport coordinates (`x`, `y`).
    ///
    /// Freezes an in-flight settle where it stands and discards its pending
    /// page turn: the pointer owns the offset now. Also arms the long-press
    /// timer. Ignored while the surface has no size.
    pub fn pointer_down(&mut self, x: f32, y: f32, now: Instant) {
        if self.surface_width == 0 || self.surface_height == 0 {
            return;
        }
        if self.animation.take().is_some() {
            self.pending_commit = None;
        }
        self.is_dragging = true;
        self.anchor_x = x;
        self.anchor_y = y;
        self.last_x = x;
        self.tracker = Some(FlingTracker::new(now));
        self.long_press_deadline = Some(now + self.args.long_press_timeout);
        self.suppress_tap = false;
    }

    /// Continues a gesture; the strip follows the pointer horizontally.
    ///
    /// The offset clamps so the strip neither scrolls before the first page
    /// of the sequence nor past the next page. Once motion leaves the tap
    /// radius the armed long press is abandoned.
    pub fn pointer_move(&mut self, x: f32, y: f32, now: Instant) {
        if !self.is_dragging {
            return;
        }
        self.resolve_long_press(now);

        let dx = x - self.last_x;
        self.last_x = x;
        if let Some(tracker) = &mut self.tracker {
            tracker.push_delta(now, dx);
        }

        let clamped = (self.scroll_offset + dx).clamp(self.min_offset(), self.max_offset());
        if clamped != self.scroll_offset {
            self.scroll_offset = clamped;
            self.signal_redraw();
        }

        if self.long_press_deadline.is_some()
            && manhattan(x - self.anchor_x, y - self.anchor_y) >= self.args.tap_threshold
        {
            self.long_press_deadline = None;
        }
    }

    /// Ends a gesture.
    ///
    /// A displacement inside the tap radius counts as a tap — unless a long
    /// press already fired for this gesture — and leaves the offset where it
    /// is. Anything longer settles onto a page chosen from the release
    /// offset and the fling velocity.
    pub fn pointer_up(&mut self, x: f32, y: f32, now: Instant) {
        if !self.is_dragging {
            return;
        }
        self.resolve_long_press(now);
        self.is_dragging = false;
        self.long_press_deadline = None;

        let displacement = manhattan(x - self.anchor_x, y - self.anchor_y);
        let velocity = self
            .tracker
            .take()
            .map_or(0.0, |mut tracker| tracker.resolve(now));

        if displacement < self.args.tap_threshold {
            if self.suppress_tap {
                self.suppress_tap = false;
                return;
            }
            debug!("tap");
            if let Some(on_tap) = self.args.on_tap.clone() {
                on_tap();
            }
            return;
        }

        self.settle(velocity, now);
    }

    /// Advances time-based state; call once per host frame with a monotonic
    /// timestamp.
    ///
    /// Resolves an armed long press, installs finished render results, and
    /// steps the settle animation. When the settle completes with a page
    /// turn pending, the commit hook fires and the window shifts.
    pub fn tick(&mut self, now: Instant) {
        self.resolve_long_press(now);
        self.drain_render_results();

        let Some(animation) = &self.animation else {
            return;
        };
        let sampled = animation.sample(now);
        let finished = animation.is_finished(now);

        if sampled != self.scroll_offset {
            self.scroll_offset = sampled;
            self.signal_redraw();
        }

        if finished {
            self.animation = None;
            if let Some(delta) = self.pending_commit.take() {
                debug!(delta, "page turn committed");
                if let Some(on_commit) = self.args.on_commit.clone() {
                    on_commit(delta);
                }
                self.shift(delta);
            }
        }
    }

    /// Rotates the window one page in `delta`'s direction and recenters the
    /// strip. The only mutator of the carousel position.
    ///
    /// The slot entering from the trailing edge is left blank; the host
    /// fills it through [`CarouselController::on_window_changed`]. Panics
    /// if `delta` is not `±1`, or on a backward shift at position zero.
    pub fn shift(&mut self, delta: i32) {
        assert!(delta == 1 || delta == -1, "shift delta must be ±1, got {delta}");
        assert!(
            delta == 1 || self.position > 0,
            "cannot shift backward past the start of the sequence"
        );
        self.window.rotate(delta);
        self.position = self
            .position
            .checked_add_signed(delta as isize)
            .expect("carousel position overflow");
        self.animation = None;
        self.pending_commit = None;
        self.scroll_offset = self.centered_offset();
        debug!(position = self.position, delta, "window shifted");
        self.signal_redraw();
    }

    /// Switches cover rendering to `mode`, rebuilding every cover in place.
    ///
    /// The scroll offset is left alone so the flip happens without motion.
    /// A repeated mode is ignored.
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if mode == self.render_mode {
            return;
        }
        self.render_mode = mode;
        debug!(?mode, "render mode changed");
        self.release_all_cached();
        self.request_all();
        self.signal_redraw();
    }

    /// Flips between the two render modes.
    pub fn toggle_render_mode(&mut self) {
        self.set_render_mode(self.render_mode.toggled());
    }

    /// Placements of the window slots intersecting the viewport this frame.
    ///
    /// The viewport is one page wide: at a page boundary exactly one slot
    /// is visible, mid-scroll two. Empty while the surface has no size.
    pub fn visible_pages(&self) -> SmallVec<[PagePlacement; SLOT_COUNT]> {
        let mut placements = SmallVec::new();
        if self.surface_width == 0 {
            return placements;
        }
        let width = self.page_width();
        for slot in 0..SLOT_COUNT {
            let origin_x = slot as f32 * width - self.scroll_offset;
            if origin_x > -width && origin_x < width {
                placements.push(PagePlacement { slot, origin_x });
            }
        }
        placements
    }

    /// Cached cover for the item in `slot`, if one has been rendered.
    ///
    /// Looking at a cover does not promote it; drawing must not reorder
    /// eviction.
    pub fn cover_for(&self, slot: usize) -> Option<&R::Cover> {
        let key = self.window.item(slot)?.cover_key()?;
        self.cache.get(key)
    }

    /// Item currently held by `slot`, if any.
    pub fn item(&self, slot: usize) -> Option<&S::Item> {
        self.window.item(slot)
    }

    /// Current position within the backing sequence.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Current horizontal scroll offset in pixels.
    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Surface dimensions in pixels, `(0, 0)` until sized.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_width, self.surface_height)
    }

    /// Visual treatment currently applied to covers.
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// Whether a settle animation is in flight.
    pub fn is_settling(&self) -> bool {
        self.animation.is_some()
    }

    /// The window turn the running settle will apply on completion.
    pub fn pending_commit(&self) -> Option<i32> {
        self.pending_commit
    }

    /// Whether a pointer currently owns the strip.
    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    /// Rebinds the carousel to an externally chosen position.
    ///
    /// A settle still running was aimed at the window being replaced, so
    /// it is dropped with its pending page turn and the strip recenters;
    /// the turn must not fire against the new position. A live drag keeps
    /// the pointer's offset, clamped into the range the new position
    /// allows.
    fn adopt_position(&mut self, position: usize) {
        let before = self.scroll_offset;
        self.position = position;
        if self.animation.take().is_some() {
            self.scroll_offset = self.centered_offset();
        }
        self.pending_commit = None;
        self.scroll_offset = self.scroll_offset.clamp(self.min_offset(), self.max_offset());
        if self.scroll_offset != before {
            self.signal_redraw();
        }
    }

    /// Re-fetches window slots and requests their covers. With `force`
    /// every slot is re-fetched, otherwise only blank ones; a full window
    /// without `force` is left untouched.
    fn refresh(&mut self, force: bool) {
        if !force && !self.window.has_blanks() {
            return;
        }
        for slot in 0..SLOT_COUNT {
            if force || self.window.is_blank(slot) {
                let item = self.source.item_at(slot as i32 - 1);
                self.window.set(slot, item);
                self.request_cover(slot);
            }
        }
        self.signal_redraw();
    }

    /// Picks the settle target from the release offset and fling velocity,
    /// then starts the snap animation toward it.
    fn settle(&mut self, velocity: f32, now: Instant) {
        let width = self.page_width();
        let min_index = if self.position == 0 { 1 } else { 0 };
        let max_index = (SLOT_COUNT - 1) as i32;
        let nearest = (self.scroll_offset / width).round() as i32;
        let mut target = nearest.clamp(min_index, max_index);

        if velocity.abs() > self.args.min_fling_velocity {
            if velocity < 0.0 && target > min_index {
                target -= 1;
            } else if velocity > 0.0 && target < max_index {
                target += 1;
            }
        }

        debug!(target, velocity, "settling");
        self.animation = Some(SnapAnimation::new(
            self.scroll_offset,
            target as f32 * width,
            now,
            self.args.snap_time_per_px,
        ));
        let delta = target - SLOT_CURRENT as i32;
        self.pending_commit = (delta != 0).then_some(delta);
    }

    /// Installs finished render results; called on the controller's turn.
    fn drain_render_results(&mut self) {
        while let Ok(outcome) = self.results_rx.try_recv() {
            if outcome.generation != self.generation {
                trace!(key = outcome.key, "stale cover render discarded");
                if let Ok(cover) = outcome.result {
                    self.renderer.release(cover);
                }
                continue;
            }
            match outcome.result {
                Ok(cover) => {
                    if self.cache.contains(outcome.key) {
                        // Two requests raced before the first result landed;
                        // the installed cover wins.
                        trace!(key = outcome.key, "duplicate cover render discarded");
                        self.renderer.release(cover);
                        continue;
                    }
                    if let Some(displaced) = self.cache.put(outcome.key, cover) {
                        self.renderer.release(displaced);
                    }
                    self.signal_redraw();
                }
                Err(error) => {
                    warn!(key = outcome.key, error = %error, "cover render failed");
                }
            }
        }
    }

    fn resolve_long_press(&mut self, now: Instant) {
        let Some(deadline) = self.long_press_deadline else {
            return;
        };
        if now < deadline {
            return;
        }
        self.long_press_deadline = None;
        self.suppress_tap = true;
        debug!("long press fired");
        if let Some(on_long_press) = self.args.on_long_press.clone() {
            on_long_press();
        }
    }

    fn release_all_cached(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        for cover in self.cache.clear() {
            self.renderer.release(cover);
        }
    }

    fn request_all(&mut self) {
        for slot in 0..SLOT_COUNT {
            self.request_cover(slot);
        }
    }

    fn reset_gesture(&mut self) {
        self.is_dragging = false;
        self.tracker = None;
        self.long_press_deadline = None;
        self.suppress_tap = false;
    }

    fn signal_redraw(&self) {
        if let Some(on_redraw) = &self.args.on_redraw {
            on_redraw();
        }
    }

    fn page_width(&self) -> f32 {
        self.surface_width as f32
    }

    /// Offset at which the current page fills the viewport exactly.
    fn centered_offset(&self) -> f32 {
        self.page_width() * SLOT_CURRENT as f32
    }

    /// Lower drag bound: the first position has no previous page to reveal.
    fn min_offset(&self) -> f32 {
        if self.position == 0 { self.page_width() } else { 0.0 }
    }

    fn max_offset(&self) -> f32 {
        self.page_width() * 2.0
    }
}

impl<S, R> Drop for CarouselController<S, R>
where
    S: CoverSource,
    R: CoverRenderer<Item = S::Item>,
{
    fn drop(&mut self) {
        // Jobs still in flight reclaim their covers through the send-error
        // path in `request_cover` once the receiver closes.
        while let Ok(outcome) = self.results_rx.try_recv() {
            if let Ok(cover) = outcome.result {
                self.renderer.release(cover);
            }
        }
        for cover in self.cache.clear() {
            self.renderer.release(cover);
        }
    }
}

fn manhattan(dx: f32, dy: f32) -> f32 {
    dx.abs() + dy.abs()
}
