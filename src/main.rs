use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};
use ink_backdrop::{EngineConfig, canvas, host, state, ui};

fn main() {
    if !canvas::surface_present() {
        debug!("No {} element, backdrop disabled", canvas::CANVAS_SELECTOR);
        return;
    }

    App::new()
        .add_plugins((
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Ink Backdrop".into(),
                        canvas: Some(canvas::CANVAS_SELECTOR.into()),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: false,
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: "info,wgpu=error,naga=warn".into(),
                    ..default()
                }),
            EguiPlugin::default(),
        ))
        .insert_resource(ClearColor(Color::BLACK))
        .init_resource::<EngineConfig>()
        .init_resource::<state::BackdropState>()
        .add_systems(Startup, ui::setup_scene)
        .add_systems(EguiPrimaryContextPass, ui::ui_system)
        .add_systems(
            Update,
            (
                host::collect_input_system,
                canvas::attach_system,
                host::frame_system,
                canvas::upload_system,
            )
                .chain(),
        )
        .run();
}
