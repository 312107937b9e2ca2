mod common;

use bedview::capabilities::Capabilities;
use bedview::scene::ModelTransform;
use bedview::config::ViewerConfig;
use bedview::interaction::{Modifiers, PointerButton};
use bedview::viewport::{Viewport, ViewportEvent};
use bedview::GraphicsBackend;

use glam::Vec3;

use common::{shared, software_viewport, FlakyBackend, Panel, Slab, HEIGHT, WIDTH};

const CENTRE: (f32, f32) = (WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0);

fn right_click<B: GraphicsBackend>(viewport: &mut Viewport<B>, x: f32, y: f32) {
    viewport.pointer_down(x, y, PointerButton::Secondary, Modifiers::NONE);
    viewport.pointer_up();
}

fn selections<B: GraphicsBackend>(viewport: &mut Viewport<B>) -> Vec<ViewportEvent> {
    viewport
        .take_events()
        .into_iter()
        .filter(|event| matches!(event, ViewportEvent::ObjectSelected(_)))
        .collect()
}

#[test]
fn empty_scene_selects_nothing() {
    let mut viewport = software_viewport(ViewerConfig::default());
    right_click(&mut viewport, CENTRE.0, CENTRE.1);
    assert!(selections(&mut viewport).is_empty());
}

#[test]
fn nearest_object_wins_over_registry_order() {
    let mut viewport = software_viewport(ViewerConfig::default());
    let far = Panel::at(150.0);
    let near = Panel::at(50.0);
    let _far_id = viewport.add_model(&shared(&far));
    let near_id = viewport.add_model(&shared(&near));

    right_click(&mut viewport, CENTRE.0, CENTRE.1);
    assert_eq!(
        selections(&mut viewport),
        vec![ViewportEvent::ObjectSelected(near_id)]
    );
}

#[test]
fn equal_depth_keeps_registry_order() {
    let mut viewport = software_viewport(ViewerConfig::default());
    let first = Panel::at(100.0);
    let second = Panel::at(100.0);
    let first_id = viewport.add_model(&shared(&first));
    viewport.add_model(&shared(&second));

    right_click(&mut viewport, CENTRE.0, CENTRE.1);
    assert_eq!(
        selections(&mut viewport),
        vec![ViewportEvent::ObjectSelected(first_id)]
    );
}

#[test]
fn miss_outside_objects() {
    let mut viewport = software_viewport(ViewerConfig::default());
    let panel = Panel::at(100.0);
    viewport.add_model(&shared(&panel));

    // Top-left corner looks over the panel's upper edge
    right_click(&mut viewport, 0.5, 0.5);
    assert!(selections(&mut viewport).is_empty());
}

#[test]
fn primary_button_does_not_pick() {
    let mut viewport = software_viewport(ViewerConfig::default());
    let panel = Panel::at(100.0);
    viewport.add_model(&shared(&panel));

    viewport.pointer_down(CENTRE.0, CENTRE.1, PointerButton::Primary, Modifiers::NONE);
    assert!(selections(&mut viewport).is_empty());
}

#[test]
fn hidden_surface_selects_nothing() {
    let mut viewport = software_viewport(ViewerConfig::default());
    let panel = Panel::at(100.0);
    viewport.add_model(&shared(&panel));
    viewport.make_visible(false);

    right_click(&mut viewport, CENTRE.0, CENTRE.1);
    assert!(selections(&mut viewport).is_empty());
}

#[test]
fn failed_pick_pass_is_swallowed() {
    let backend = FlakyBackend::new();
    let capabilities = Capabilities::probe(&backend.info());
    let mut viewport = Viewport::new(backend, ViewerConfig::default(), capabilities);
    let panel = Panel::at(100.0);
    viewport.add_model(&shared(&panel));

    viewport.backend_mut().fail_picks = true;
    right_click(&mut viewport, CENTRE.0, CENTRE.1);
    assert!(selections(&mut viewport).is_empty());

    viewport.backend_mut().fail_picks = false;
    right_click(&mut viewport, CENTRE.0, CENTRE.1);
    assert_eq!(selections(&mut viewport).len(), 1);
}

#[test]
fn pick_leaves_frame_rendering_intact() {
    let mut viewport = software_viewport(ViewerConfig::default());
    let panel = Panel::at(100.0);
    viewport.add_model(&shared(&panel));

    right_click(&mut viewport, CENTRE.0, CENTRE.1);
    viewport.render_frame().unwrap();

    // The panel fills the middle of the picture
    let pixel = viewport
        .backend()
        .framebuffer()
        .pixel(WIDTH as usize / 2, HEIGHT as usize / 2)
        .unwrap();
    assert_ne!(pixel, viewport.config().colors.background);
}

#[test]
fn pick_follows_rotation_and_scale() {
    // A 80 x 4 bar lying across the bed 30 units above the view centre.
    // Turned a quarter about y it stands upright through the centre.
    let bar = |rotation_y: f32| ModelTransform {
        position: Vec3::new(100.0, 100.0, 80.0),
        rotation: Vec3::new(0.0, rotation_y, 0.0),
        scale: Vec3::new(40.0, 1.0, 2.0),
    };

    let mut viewport = software_viewport(ViewerConfig::default());
    let flat = Slab::with(bar(0.0));
    viewport.add_model(&shared(&flat));
    right_click(&mut viewport, CENTRE.0, CENTRE.1);
    assert!(selections(&mut viewport).is_empty());

    let upright = Slab::with(bar(90.0));
    let upright_id = viewport.add_model(&shared(&upright));
    right_click(&mut viewport, CENTRE.0, CENTRE.1);
    assert_eq!(
        selections(&mut viewport),
        vec![ViewportEvent::ObjectSelected(upright_id)]
    );
}
