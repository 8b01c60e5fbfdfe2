use crossbeam_channel::{Receiver, unbounded};
use prism::render::extension::SceneViewExtension;
use prism::render::message::RenderCommand;
use prism::render::pass::{PassSubmission, PassTypeId, SubmissionCtx};
use prism::render::scheduler::RenderScheduler;
use prism::render::view::{ExtensionContext, PixelRect, RenderTargetId, RenderView, SceneId, ViewKey, ViewportId};
use prism::render::{FilterMutation, FilterOp, Polarity};
use prism::utils::{PassComponentKey, ProxyBytes};
use prism::{PassComponent, RenderPass, World, register_pass_type, write_simple_proxy};
use std::cell::RefCell;
use std::sync::Arc;
use web_time::Duration;

thread_local! {
    static OBSERVED_TABLES: RefCell<Vec<Vec<PassComponentKey>>> = const { RefCell::new(Vec::new()) };
    static OBSERVED_STRENGTHS: RefCell<Vec<Vec<f32>>> = const { RefCell::new(Vec::new()) };
}

fn reset_observations() {
    OBSERVED_TABLES.with_borrow_mut(Vec::clear);
    OBSERVED_STRENGTHS.with_borrow_mut(Vec::clear);
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct GlowProxy {
    strength: f32,
    flicker_seed: u32,
}

#[derive(Default)]
struct GlowPass;

impl RenderPass for GlowPass {
    fn init_game_thread(&mut self, scene: SceneId) -> Arc<SceneViewExtension> {
        SceneViewExtension::new(scene)
    }

    fn create_submission(&mut self) -> Box<dyn PassSubmission> {
        Box::new(GlowSubmission)
    }
}

struct GlowSubmission;

impl PassSubmission for GlowSubmission {
    fn submit(&mut self, ctx: SubmissionCtx<'_>) {
        let mut keys: Vec<_> = ctx.proxies.iter().map(|(key, _)| key).collect();
        keys.sort();

        let strengths = keys
            .iter()
            .filter_map(|key| ctx.proxies.read::<GlowProxy>(*key))
            .map(|proxy| proxy.strength)
            .collect();

        OBSERVED_TABLES.with_borrow_mut(|tables| tables.push(keys));
        OBSERVED_STRENGTHS.with_borrow_mut(|all| all.push(strengths));
    }
}

struct GlowComponent {
    strength: f32,
}

impl PassComponent for GlowComponent {
    fn pass_type(&self) -> PassTypeId {
        register_pass_type::<GlowPass>()
    }

    fn construct_proxy(&self, out: &mut ProxyBytes) {
        write_simple_proxy(
            out,
            GlowProxy {
                strength: self.strength,
                flicker_seed: 7,
            },
        );
    }
}

fn setup() -> (World, RenderScheduler, Receiver<RenderCommand>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    reset_observations();
    let (render_tx, render_rx) = unbounded();
    let world = World::new(SceneId(1), render_tx);
    (world, RenderScheduler::new(), render_rx)
}

fn frame(world: &mut World, scheduler: &mut RenderScheduler, rx: &Receiver<RenderCommand>) {
    world.update(Duration::from_millis(16));
    scheduler.pump(rx);
}

fn glow(strength: f32) -> Box<GlowComponent> {
    Box::new(GlowComponent { strength })
}

fn test_view(player: i32) -> RenderView {
    RenderView::builder()
        .key(ViewKey(1))
        .scene(SceneId(1))
        .render_target(RenderTargetId(1))
        .viewport(ViewportId::PRIMARY)
        .player_index(player)
        .pixel_rect(PixelRect::new(0, 0, 640, 480))
        .build()
}

#[test]
fn proxies_follow_registration_across_frames() {
    let (mut world, mut scheduler, rx) = setup();

    let a = world.spawn_component(glow(1.0));
    let b = world.spawn_component(glow(2.0));
    let c = world.spawn_component(glow(3.0));
    world.set_component_enabled(c, false);

    frame(&mut world, &mut scheduler, &rx);
    OBSERVED_TABLES.with_borrow(|tables| {
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(tables.as_slice(), &[expected]);
    });

    world.despawn_component(b);
    frame(&mut world, &mut scheduler, &rx);
    OBSERVED_TABLES.with_borrow(|tables| {
        assert_eq!(tables[1], vec![a]);
    });
}

#[test]
fn submission_reads_typed_snapshots() {
    let (mut world, mut scheduler, rx) = setup();

    world.spawn_component(glow(0.25));
    frame(&mut world, &mut scheduler, &rx);

    OBSERVED_STRENGTHS.with_borrow(|all| {
        assert_eq!(all.as_slice(), &[vec![0.25]]);
    });
}

#[test]
fn re_enabled_components_rejoin_the_next_snapshot() {
    let (mut world, mut scheduler, rx) = setup();

    let a = world.spawn_component(glow(1.0));
    world.set_component_enabled(a, false);
    frame(&mut world, &mut scheduler, &rx);

    world.set_component_enabled(a, true);
    frame(&mut world, &mut scheduler, &rx);

    OBSERVED_TABLES.with_borrow(|tables| {
        assert!(tables[0].is_empty());
        assert_eq!(tables[1], vec![a]);
    });
}

#[test]
fn despawn_destroys_the_published_proxy_after_in_flight_frames() {
    let (mut world, mut scheduler, rx) = setup();

    let a = world.spawn_component(glow(1.0));
    frame(&mut world, &mut scheduler, &rx);
    assert!(scheduler.published_proxy(a).is_some());

    world.despawn_component(a);
    // Still published until the submission thread drains the destroy command.
    assert!(scheduler.published_proxy(a).is_some());

    scheduler.pump(&rx);
    assert!(scheduler.published_proxy(a).is_none());
}

#[test]
fn filter_edits_from_any_thread_converge_on_both_copies() {
    let (mut world, mut scheduler, rx) = setup();

    let pass = register_pass_type::<GlowPass>();
    world.subsystem.get_pass(pass, true);
    let editor = world.subsystem.filter_editor(pass).unwrap();

    std::thread::spawn(move || {
        editor.filter_by_player_index(0, Polarity::Whitelist);
    })
    .join()
    .unwrap();

    // One world update drains the routed task, one pump drains the command.
    frame(&mut world, &mut scheduler, &rx);

    let simulation_copy = world.subsystem.pass(pass).unwrap().filter();
    assert!(simulation_copy.should_render_for_view(&test_view(0)));
    assert!(!simulation_copy.should_render_for_view(&test_view(1)));

    let submission_copy = scheduler.host(pass).unwrap().filter();
    assert!(submission_copy.should_render_for_view(&test_view(0)));
    assert!(!submission_copy.should_render_for_view(&test_view(1)));
}

#[test]
fn simulation_thread_filter_edits_apply_immediately() {
    let (mut world, mut scheduler, rx) = setup();

    let pass = register_pass_type::<GlowPass>();
    world.subsystem.get_pass(pass, true);

    world.edit_pass_filter(pass, FilterMutation::ExcludeAll(true));

    // The simulation-side copy changed without waiting for any queue.
    assert!(
        !world
            .subsystem
            .pass(pass)
            .unwrap()
            .filter()
            .should_render_for_view(&test_view(0))
    );

    scheduler.pump(&rx);
    assert!(
        !scheduler
            .host(pass)
            .unwrap()
            .filter()
            .should_render_for_view(&test_view(0))
    );
}

#[test]
fn conflicting_filter_edits_are_dropped_on_both_copies() {
    let (mut world, mut scheduler, rx) = setup();

    let pass = register_pass_type::<GlowPass>();
    world.subsystem.get_pass(pass, true);

    world.edit_pass_filter(
        pass,
        FilterMutation::PlayerIndex(FilterOp::Add(0, Polarity::Whitelist)),
    );
    world.edit_pass_filter(
        pass,
        FilterMutation::PlayerIndex(FilterOp::Add(1, Polarity::Blacklist)),
    );
    frame(&mut world, &mut scheduler, &rx);

    for filter in [
        world.subsystem.pass(pass).unwrap().filter(),
        scheduler.host(pass).unwrap().filter(),
    ] {
        assert!(filter.should_render_for_view(&test_view(0)));
        assert!(!filter.should_render_for_view(&test_view(1)));
    }
}

#[test]
fn killed_extensions_stop_activation_but_keep_published_proxies() {
    let (mut world, mut scheduler, rx) = setup();

    let a = world.spawn_component(glow(1.0));
    frame(&mut world, &mut scheduler, &rx);

    let pass = register_pass_type::<GlowPass>();
    let ctx = ExtensionContext {
        scene: SceneId(1),
        viewport: ViewportId::PRIMARY,
    };
    assert!(scheduler.host(pass).unwrap().is_active(&ctx));

    world.subsystem.pass(pass).unwrap().extension().kill_rendering();

    assert!(!scheduler.host(pass).unwrap().is_active(&ctx));
    assert!(!world.subsystem.pass(pass).unwrap().should_render_for(&ctx));
    assert!(scheduler.published_proxy(a).is_some());
}

#[test]
fn components_spawned_during_teardown_render_nothing() {
    let (mut world, mut scheduler, rx) = setup();

    world.begin_destroy();
    let key = world.spawn_component(glow(1.0));

    // The component exists but found no pass; it quietly does nothing.
    assert!(world.component_exists(key));
    frame(&mut world, &mut scheduler, &rx);

    OBSERVED_TABLES.with_borrow(|tables| assert!(tables.is_empty()));
    assert_eq!(scheduler.published_proxy_count(), 0);
}

#[test]
fn lazy_pass_creation_happens_on_first_component_spawn() {
    let (mut world, mut scheduler, rx) = setup();
    let pass = register_pass_type::<GlowPass>();

    assert!(world.subsystem.pass(pass).is_none());
    world.spawn_component(glow(1.0));
    assert!(world.subsystem.pass(pass).is_some());
    assert_eq!(world.subsystem.pass(pass).unwrap().component_count(), 1);

    frame(&mut world, &mut scheduler, &rx);
    assert!(scheduler.host(pass).is_some());
}
