//! Persistent per-view state for passes, with idle eviction.

use crate::view::{FeatureLevel, PixelRect, RenderView, ViewKey};
use nalgebra::Vector2;
use prism_utils::threading;
use std::collections::{HashMap, HashSet};

/// Views idle longer than this many ticks are cleaned up, unless protected.
pub const DEFAULT_CLEANUP_FRAME_THRESHOLD: u32 = 60;

/// Persistent per-view resources owned by a pass, e.g. history buffers.
///
/// Implementors define how their data reacts to the view's pixel rectangle
/// changing, which happens when the resolution or screen percentage scales.
pub trait ViewPersistentData {
    fn resample(
        &mut self,
        old_size: Vector2<i32>,
        new_size: Vector2<i32>,
        pixel_offset: Vector2<i32>,
    );
}

struct ViewEntry<T> {
    user: T,
    pixel_subset: PixelRect,
    feature_level: FeatureLevel,
    frames_since_access: u32,
}

/// Caches per-view persistent state for one pass. Submission-thread only.
///
/// Per-view GPU resources are expensive to recreate, so entries survive
/// between frames; the idle-eviction window bounds memory for views that
/// stop rendering (closed viewports, dead PIP cameras) without the pass
/// needing explicit teardown hooks.
pub struct PerViewData<T: ViewPersistentData> {
    /// Views idle longer than this many ticks get evicted.
    pub cleanup_frame_threshold: u32,
    /// View keys that are never evicted, regardless of idle time.
    pub cleanup_prevention: HashSet<ViewKey>,
    entries: HashMap<ViewKey, ViewEntry<T>>,
}

impl<T: ViewPersistentData> Default for PerViewData<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ViewPersistentData> PerViewData<T> {
    pub fn new() -> Self {
        Self {
            cleanup_frame_threshold: DEFAULT_CLEANUP_FRAME_THRESHOLD,
            cleanup_prevention: HashSet::new(),
            entries: HashMap::new(),
        }
    }

    /// Ages every unprotected entry and evicts the ones past the idle
    /// threshold. Call exactly once per frame on the submission thread.
    #[profiling::function]
    pub fn tick(&mut self) {
        threading::assert_render_thread("PerViewData::tick");

        let threshold = self.cleanup_frame_threshold;
        let protected = &self.cleanup_prevention;
        self.entries.retain(|key, entry| {
            if protected.contains(key) {
                return true;
            }
            entry.frames_since_access += 1;
            entry.frames_since_access <= threshold
        });
    }

    /// Mutable access to a view's data, creating it on first use.
    ///
    /// Resets the idle counter, and resamples the user data when the view's
    /// pixel rectangle changed since the last access. The returned reference
    /// is only good until the next `tick` or `data_for_view` call; callers
    /// must not retain it across either.
    pub fn data_for_view(
        &mut self,
        view: &RenderView,
        create: impl FnOnce(&RenderView) -> T,
    ) -> &mut T {
        threading::assert_render_thread("PerViewData::data_for_view");

        let entry = self.entries.entry(view.key).or_insert_with(|| ViewEntry {
            user: create(view),
            pixel_subset: view.pixel_rect,
            feature_level: view.feature_level,
            frames_since_access: 0,
        });

        entry.frames_since_access = 0;

        if entry.pixel_subset != view.pixel_rect {
            let old = entry.pixel_subset;
            entry
                .user
                .resample(old.size(), view.pixel_rect.size(), old.offset_to(&view.pixel_rect));
            entry.pixel_subset = view.pixel_rect;
        }

        &mut entry.user
    }

    /// Pure lookup; no timestamps move.
    pub fn data_exists_for_view(&self, view: &RenderView) -> bool {
        self.entries.contains_key(&view.key)
    }

    /// Visits every live entry.
    pub fn for_each_view(&mut self, mut visit: impl FnMut(ViewKey, &mut T, FeatureLevel)) {
        for (key, entry) in &mut self.entries {
            visit(*key, &mut entry.user, entry.feature_level);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
