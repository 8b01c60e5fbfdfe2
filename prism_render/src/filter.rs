//! Whitelist/blacklist view filtering.
//!
//! Every pass owns two copies of its [`FilterSet`]: one consumed by the
//! simulation thread and one by the submission thread. Both copies receive
//! the same [`FilterMutation`] stream through their respective queues and may
//! disagree for at most one pending command; nothing depends on immediate
//! cross-copy consistency.

use crate::error::{FilterError, PolarityConflictSnafu};
use crate::view::{
    ExtensionContext, RenderTargetId, RenderView, SceneId, ViewActorId, ViewFamily, ViewportId,
};
use tracing::error;

/// Whether a filter list admits listed elements or rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Whitelist,
    Blacklist,
}

/// A whitelist OR blacklist of values of one type.
///
/// Which one it is gets decided on construction, or by the first element
/// added. An unconfigured list allows everything.
#[derive(Debug, Clone)]
pub struct FilterList<T> {
    polarity: Option<Polarity>,
    elements: Vec<T>,
    comparator: fn(&T, &T) -> bool,
}

impl<T: PartialEq> Default for FilterList<T> {
    fn default() -> Self {
        Self {
            polarity: None,
            elements: Vec::new(),
            comparator: |a, b| a == b,
        }
    }
}

impl<T> FilterList<T> {
    pub fn with_comparator(comparator: fn(&T, &T) -> bool) -> Self {
        Self {
            polarity: None,
            elements: Vec::new(),
            comparator,
        }
    }

    /// `true` for everything while unconfigured; otherwise list membership
    /// has to agree with the polarity.
    pub fn is_allowed(&self, candidate: &T) -> bool {
        let Some(polarity) = self.polarity else {
            return true;
        };

        let listed = self
            .elements
            .iter()
            .any(|element| (self.comparator)(element, candidate));

        listed == (polarity == Polarity::Whitelist)
    }

    /// Appends an element, fixing the polarity on first insert.
    ///
    /// Adding with the opposite polarity of an already-polarized list fails
    /// and leaves the list untouched.
    pub fn add(&mut self, element: T, polarity: Polarity) -> Result<(), FilterError> {
        if let Some(existing) = self.polarity
            && existing != polarity
        {
            return PolarityConflictSnafu {
                adding: polarity,
                existing,
            }
            .fail();
        }

        self.polarity = Some(polarity);
        self.elements.push(element);
        Ok(())
    }

    /// Removes every element matching via the comparator. Polarity is kept.
    pub fn remove(&mut self, element: &T) {
        let comparator = self.comparator;
        self.elements.retain(|e| !comparator(e, element));
    }

    /// Reconfigures the polarity without touching the elements.
    pub fn configure(&mut self, polarity: Polarity) {
        self.polarity = Some(polarity);
    }

    /// Drops all elements and optionally re-seeds the polarity.
    pub fn clear(&mut self, polarity: Option<Polarity>) {
        self.elements.clear();
        self.polarity = polarity;
    }

    pub fn polarity(&self) -> Option<Polarity> {
        self.polarity
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// One edit to a single filter category.
#[derive(Debug, Clone)]
pub enum FilterOp<T> {
    Add(T, Polarity),
    Remove(T),
    Configure(Polarity),
    Clear,
}

/// One filter edit, replayed identically on the simulation-side and the
/// submission-side copies of a pass's filter set.
#[derive(Debug, Clone)]
pub enum FilterMutation {
    RenderTarget(FilterOp<RenderTargetId>),
    Scene(FilterOp<SceneId>),
    Viewport(FilterOp<ViewportId>),
    ViewActor(FilterOp<Option<ViewActorId>>),
    PlayerIndex(FilterOp<i32>),
    ExcludeAll(bool),
}

/// One thread's copy of a pass's view filters.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    /// When set, no view passes the filter at all.
    pub exclude_all: bool,
    by_render_target: FilterList<RenderTargetId>,
    by_scene: FilterList<SceneId>,
    by_viewport: FilterList<ViewportId>,
    by_view_actor: FilterList<Option<ViewActorId>>,
    by_player_index: FilterList<i32>,
}

impl FilterSet {
    /// Replays one mutation onto this copy. Polarity conflicts are logged
    /// and leave the set unchanged.
    pub fn apply(&mut self, mutation: &FilterMutation) {
        match mutation {
            FilterMutation::RenderTarget(op) => {
                Self::apply_op(&mut self.by_render_target, op, "render-target");
            }
            FilterMutation::Scene(op) => Self::apply_op(&mut self.by_scene, op, "scene"),
            FilterMutation::Viewport(op) => Self::apply_op(&mut self.by_viewport, op, "viewport"),
            FilterMutation::ViewActor(op) => {
                Self::apply_op(&mut self.by_view_actor, op, "view-actor");
            }
            FilterMutation::PlayerIndex(op) => {
                Self::apply_op(&mut self.by_player_index, op, "player-index");
            }
            FilterMutation::ExcludeAll(exclude) => self.exclude_all = *exclude,
        }
    }

    fn apply_op<T: Clone + PartialEq>(list: &mut FilterList<T>, op: &FilterOp<T>, category: &str) {
        match op {
            FilterOp::Add(element, polarity) => {
                if let Err(e) = list.add(element.clone(), *polarity) {
                    error!("Failed to update the {category} view filter: {e}");
                }
            }
            FilterOp::Remove(element) => list.remove(element),
            FilterOp::Configure(polarity) => list.configure(*polarity),
            FilterOp::Clear => list.clear(None),
        }
    }

    pub fn should_render_for_viewport(&self, viewport: ViewportId) -> bool {
        !self.exclude_all && self.by_viewport.is_allowed(&viewport)
    }

    pub fn should_render_for_scene(&self, scene: SceneId) -> bool {
        !self.exclude_all && self.by_scene.is_allowed(&scene)
    }

    /// Extension-context test: the scene and viewport sub-tests must both
    /// pass.
    pub fn should_render_for_context(&self, ctx: &ExtensionContext) -> bool {
        self.should_render_for_scene(ctx.scene) && self.should_render_for_viewport(ctx.viewport)
    }

    /// View-family test: scene AND render-target.
    pub fn should_render_for_family(&self, family: &ViewFamily) -> bool {
        !self.exclude_all
            && self.by_scene.is_allowed(&family.scene)
            && self.by_render_target.is_allowed(&family.render_target)
    }

    /// Full-view test: the view-family test plus player-index and view-actor.
    pub fn should_render_for_view(&self, view: &RenderView) -> bool {
        !self.exclude_all
            && self.by_scene.is_allowed(&view.scene)
            && self.by_render_target.is_allowed(&view.render_target)
            && self.by_player_index.is_allowed(&view.player_index)
            && self.by_view_actor.is_allowed(&view.view_actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::PixelRect;

    fn test_view(scene: u64, target: u64, player: i32, actor: Option<u64>) -> RenderView {
        RenderView::builder()
            .key(crate::view::ViewKey(1))
            .scene(SceneId(scene))
            .render_target(RenderTargetId(target))
            .viewport(ViewportId::PRIMARY)
            .player_index(player)
            .maybe_view_actor(actor.map(ViewActorId))
            .pixel_rect(PixelRect::new(0, 0, 1920, 1080))
            .build()
    }

    #[test]
    fn unconfigured_list_allows_everything() {
        let list = FilterList::<i32>::default();
        assert!(list.is_allowed(&0));
        assert!(list.is_allowed(&i32::MAX));
    }

    #[test]
    fn whitelist_allows_only_members() {
        let mut list = FilterList::default();
        list.add(1, Polarity::Whitelist).unwrap();
        list.add(2, Polarity::Whitelist).unwrap();

        assert!(list.is_allowed(&1));
        assert!(list.is_allowed(&2));
        assert!(!list.is_allowed(&3));
    }

    #[test]
    fn blacklist_rejects_only_members() {
        let mut list = FilterList::default();
        list.add(1, Polarity::Blacklist).unwrap();
        list.add(2, Polarity::Blacklist).unwrap();

        assert!(!list.is_allowed(&1));
        assert!(!list.is_allowed(&2));
        assert!(list.is_allowed(&3));
    }

    #[test]
    fn opposite_polarity_add_is_rejected_and_keeps_list_unchanged() {
        let mut list = FilterList::default();
        list.add(1, Polarity::Whitelist).unwrap();

        let result = list.add(2, Polarity::Blacklist);
        assert_eq!(
            result,
            Err(FilterError::PolarityConflict {
                adding: Polarity::Blacklist,
                existing: Polarity::Whitelist,
            })
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list.polarity(), Some(Polarity::Whitelist));
        assert!(!list.is_allowed(&2));
    }

    #[test]
    fn remove_keeps_polarity_and_drops_all_matches() {
        let mut list = FilterList::default();
        list.add(1, Polarity::Whitelist).unwrap();
        list.add(1, Polarity::Whitelist).unwrap();
        list.add(2, Polarity::Whitelist).unwrap();

        list.remove(&1);
        assert_eq!(list.len(), 1);
        assert_eq!(list.polarity(), Some(Polarity::Whitelist));
        assert!(!list.is_allowed(&1));
        assert!(list.is_allowed(&2));
    }

    #[test]
    fn clear_resets_mode() {
        let mut list = FilterList::default();
        list.add(1, Polarity::Blacklist).unwrap();

        list.clear(None);
        assert!(list.is_allowed(&1));
        assert_eq!(list.polarity(), None);

        list.clear(Some(Polarity::Whitelist));
        assert_eq!(list.polarity(), Some(Polarity::Whitelist));
        assert!(!list.is_allowed(&1));
    }

    #[test]
    fn custom_comparator_drives_membership() {
        let mut list = FilterList::with_comparator(|a: &i32, b: &i32| a.abs() == b.abs());
        list.add(3, Polarity::Whitelist).unwrap();

        assert!(list.is_allowed(&-3));
        assert!(!list.is_allowed(&4));
    }

    #[test]
    fn full_view_test_composes_all_sub_filters() {
        let mut set = FilterSet::default();
        set.apply(&FilterMutation::Scene(FilterOp::Add(
            SceneId(1),
            Polarity::Whitelist,
        )));
        set.apply(&FilterMutation::RenderTarget(FilterOp::Add(
            RenderTargetId(1),
            Polarity::Whitelist,
        )));
        set.apply(&FilterMutation::PlayerIndex(FilterOp::Add(
            0,
            Polarity::Whitelist,
        )));
        set.apply(&FilterMutation::ViewActor(FilterOp::Add(
            Some(ViewActorId(5)),
            Polarity::Whitelist,
        )));

        assert!(set.should_render_for_view(&test_view(1, 1, 0, Some(5))));

        // Flipping any one sub-filter to reject flips the composite.
        assert!(!set.should_render_for_view(&test_view(2, 1, 0, Some(5))));
        assert!(!set.should_render_for_view(&test_view(1, 2, 0, Some(5))));
        assert!(!set.should_render_for_view(&test_view(1, 1, 1, Some(5))));
        assert!(!set.should_render_for_view(&test_view(1, 1, 0, None)));
    }

    #[test]
    fn exclude_all_rejects_regardless_of_sub_filters() {
        let mut set = FilterSet::default();
        assert!(set.should_render_for_view(&test_view(1, 1, 0, None)));

        set.apply(&FilterMutation::ExcludeAll(true));
        assert!(!set.should_render_for_view(&test_view(1, 1, 0, None)));
        assert!(!set.should_render_for_scene(SceneId(1)));
        assert!(!set.should_render_for_viewport(ViewportId::PRIMARY));

        set.apply(&FilterMutation::ExcludeAll(false));
        assert!(set.should_render_for_view(&test_view(1, 1, 0, None)));
    }

    #[test]
    fn context_test_requires_scene_and_viewport() {
        let mut set = FilterSet::default();
        set.apply(&FilterMutation::Viewport(FilterOp::Add(
            ViewportId(7),
            Polarity::Whitelist,
        )));

        let accepted = ExtensionContext {
            scene: SceneId(1),
            viewport: ViewportId(7),
        };
        let rejected = ExtensionContext {
            scene: SceneId(1),
            viewport: ViewportId(8),
        };
        assert!(set.should_render_for_context(&accepted));
        assert!(!set.should_render_for_context(&rejected));
    }

    #[test]
    fn conflicting_mutation_leaves_set_usable() {
        let mut set = FilterSet::default();
        set.apply(&FilterMutation::Scene(FilterOp::Add(
            SceneId(1),
            Polarity::Whitelist,
        )));
        // Rejected, logged, and the set still behaves as a pure whitelist.
        set.apply(&FilterMutation::Scene(FilterOp::Add(
            SceneId(2),
            Polarity::Blacklist,
        )));

        assert!(set.should_render_for_scene(SceneId(1)));
        assert!(!set.should_render_for_scene(SceneId(2)));
    }
}
