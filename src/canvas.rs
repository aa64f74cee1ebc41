use crate::config::EngineConfig;
use crate::engine::{Engine, FrameOutcome};
use crate::raster::PixelBuffer;
use crate::state::{BackdropState, Surface};
use bevy::asset::RenderAssetUsages;
use bevy::image::ImageSampler;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::PrimaryWindow;

/// DOM canvas the wasm build renders into.
pub const CANVAS_SELECTOR: &str = "#ink-backdrop";

#[derive(Component)]
pub struct BackdropSprite;

/// Whether the page carries the canvas the backdrop draws into. Native
/// builds always have their window.
#[cfg(target_arch = "wasm32")]
pub fn surface_present() -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.query_selector(CANVAS_SELECTOR).ok().flatten())
        .is_some()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn surface_present() -> bool {
    true
}

/// Logical size of the drawing surface, or `None` when there is none.
fn probe_surface(window: &Window) -> Option<UVec2> {
    surface_present().then(|| UVec2::new(window.width() as u32, window.height() as u32))
}

fn surface_size(canvas: UVec2, scale: f32) -> UVec2 {
    (canvas.as_vec2() * scale.clamp(0.05, 1.0)).round().as_uvec2().max(UVec2::ONE)
}

fn surface_image(size: UVec2) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width: size.x,
            height: size.y,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    image.sampler = ImageSampler::linear();
    image
}

pub fn attach_system(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    mut state: ResMut<BackdropState>,
    config: Res<EngineConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut sprites: Query<&mut Sprite, With<BackdropSprite>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let state = &mut *state;

    // 1. Engine, until one starts
    if state.attach_requested {
        let surface = probe_surface(window);
        state.engine = Engine::attach(surface, config.clone(), rand::random());
        // A window still at 0x0 gets another try next frame
        state.attach_requested = state.engine.is_none() && surface.is_some();
        if let Some(canvas) = surface {
            state.last_size = canvas;
        }
    }

    let Some(engine) = state.engine.as_ref() else {
        return;
    };
    let canvas = engine.canvas();
    if canvas.x == 0 || canvas.y == 0 {
        return;
    }

    // 2. Surface texture, rebuilt whenever the canvas changes size
    let wanted = surface_size(canvas, engine.config().render.surface_scale);
    if state.surface.as_ref().is_some_and(|s| s.buffer.size() == wanted) {
        return;
    }
    let Ok(buffer) = PixelBuffer::new(wanted.x, wanted.y) else {
        return;
    };

    if let Some(old) = state.surface.take() {
        images.remove(&old.image);
    }
    let handle = images.add(surface_image(wanted));
    let display = canvas.as_vec2();

    if let Ok(mut sprite) = sprites.single_mut() {
        sprite.image = handle.clone();
        sprite.custom_size = Some(display);
    } else {
        commands.spawn((
            Sprite {
                image: handle.clone(),
                custom_size: Some(display),
                ..default()
            },
            Transform::default(),
            BackdropSprite,
        ));
    }

    info!(
        "Backdrop surface {}x{} for {}x{} canvas",
        wanted.x, wanted.y, canvas.x, canvas.y
    );
    state.surface = Some(Surface {
        buffer,
        image: handle,
    });
}

pub fn upload_system(mut images: ResMut<Assets<Image>>, state: Res<BackdropState>) {
    if state.last_outcome != Some(FrameOutcome::Rendered) {
        return;
    }
    let Some(surface) = state.surface.as_ref() else {
        return;
    };
    let bytes = surface.buffer.as_bytes();
    if let Some(image) = images.get_mut(&surface.image)
        && let Some(data) = image.data.as_mut()
        && data.len() == bytes.len()
    {
        data.copy_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn surface_is_scaled_and_never_empty() {
        assert_eq!(surface_size(UVec2::new(1280, 720), 0.5), UVec2::new(640, 360));
        assert_eq!(surface_size(UVec2::new(1, 1), 0.5), UVec2::ONE);
        assert_eq!(surface_size(UVec2::new(100, 50), 4.0), UVec2::new(100, 50));
    }

    #[test]
    fn attach_retries_until_window_has_a_size() {
        let mut world = World::new();
        world.init_resource::<Assets<Image>>();
        world.init_resource::<EngineConfig>();
        world.init_resource::<BackdropState>();
        let mut window = Window::default();
        window.resolution.set(0.0, 0.0);
        world.spawn((window, PrimaryWindow));

        world.run_system_once(attach_system).unwrap();
        let state = world.resource::<BackdropState>();
        assert!(state.engine.is_none());
        assert!(state.attach_requested);

        let mut windows = world.query_filtered::<&mut Window, With<PrimaryWindow>>();
        windows.single_mut(&mut world).unwrap().resolution.set(320.0, 200.0);
        world.run_system_once(attach_system).unwrap();
        let state = world.resource::<BackdropState>();
        assert!(!state.attach_requested);
        assert_eq!(state.engine.as_ref().map(Engine::canvas), Some(UVec2::new(320, 200)));
        assert_eq!(state.surface.as_ref().map(|s| s.buffer.size()), Some(UVec2::new(160, 100)));
    }
}
