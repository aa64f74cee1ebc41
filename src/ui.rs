use crate::config::BackdropMode;
use crate::engine::Background;
use crate::state::BackdropState;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

pub fn setup_scene(mut commands: Commands) {
    // Camera: one world unit per logical pixel, centred on the backdrop sprite
    commands.spawn(Camera2d);
}

pub fn ui_system(mut contexts: EguiContexts, mut state: ResMut<BackdropState>) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    let state = &mut *state;

    egui::Window::new("Backdrop Controls")
        .default_open(false)
        .show(ctx, |ui| {
            let Some(engine) = state.engine.as_mut() else {
                ui.label("No drawing surface.");
                return;
            };

            ui.label("Mode");
            let mut mode = engine.mode();
            ui.horizontal(|ui| {
                for option in BackdropMode::ALL {
                    ui.selectable_value(&mut mode, option, option.label());
                }
            });
            if mode != engine.mode() {
                engine.set_mode(mode);
            }

            let mut reduced = state.reduced_motion_override.unwrap_or(state.reduced_motion);
            if ui.checkbox(&mut reduced, "Reduced motion").changed() {
                state.reduced_motion_override = Some(reduced);
            }

            ui.separator();

            let config = engine.config_mut();
            match mode {
                BackdropMode::Ink => {
                    egui::Grid::new("ink_grid").striped(true).show(ui, |ui| {
                        ui.label("Feed");
                        ui.add(egui::Slider::new(&mut config.ink.feed, 0.01..=0.08));
                        ui.end_row();

                        ui.label("Kill");
                        ui.add(egui::Slider::new(&mut config.ink.kill, 0.03..=0.075));
                        ui.end_row();

                        ui.label("Diffusion U");
                        ui.add(egui::Slider::new(&mut config.ink.diffusion_u, 0.2..=1.0));
                        ui.end_row();

                        ui.label("Diffusion V");
                        ui.add(egui::Slider::new(&mut config.ink.diffusion_v, 0.1..=0.8));
                        ui.end_row();

                        ui.label("Flow");
                        ui.add(egui::Slider::new(&mut config.ink.flow_strength, 0.0..=1.0));
                        ui.end_row();

                        ui.label("Brush");
                        ui.add(egui::Slider::new(&mut config.ink.brush_radius, 2.0..=16.0));
                        ui.end_row();

                        ui.label("Ink");
                        ui.add(egui::Slider::new(&mut config.ink.ink_strength, 0.0..=1.0));
                        ui.end_row();
                    });
                }
                BackdropMode::Particles => {
                    egui::Grid::new("particle_grid").striped(true).show(ui, |ui| {
                        ui.label("Flow");
                        ui.add(egui::Slider::new(&mut config.particles.flow_strength, 0.0..=4.0));
                        ui.end_row();

                        ui.label("Friction");
                        ui.add(egui::Slider::new(&mut config.particles.friction, 0.01..=0.5));
                        ui.end_row();

                        ui.label("Swirl");
                        ui.add(egui::Slider::new(&mut config.particles.swirl, 0.0..=2.0));
                        ui.end_row();

                        ui.label("Trails");
                        ui.add(egui::Slider::new(&mut config.particles.trail_alpha, 0.01..=1.0));
                        ui.end_row();
                    });
                }
                BackdropMode::Terrain => {
                    ui.add(egui::Slider::new(&mut config.terrain.scroll_speed, 0.0..=40.0).text("Scroll"));
                    ui.add(egui::Slider::new(&mut config.terrain.day_length, 10.0..=300.0).text("Day length (s)"));
                }
            }

            ui.separator();
            let canvas = engine.canvas();
            ui.label(format!("Canvas {}x{}", canvas.x, canvas.y));
            match engine.background() {
                Some(Background::Ink(ink)) => {
                    let grid = ink.grid();
                    let (lo, hi) = grid.v_range();
                    ui.label(format!("Grid {}x{}, v in [{lo:.2}, {hi:.2}]", grid.width(), grid.height()));
                }
                Some(Background::Particles(field)) => {
                    ui.label(format!("{} particles, {} bursts", field.len(), field.bursts().len()));
                }
                Some(Background::Terrain(terrain)) => {
                    let size = terrain.image().size();
                    ui.label(format!("Terrain {}x{}", size.x, size.y));
                }
                None => {
                    ui.label("No buffers");
                }
            }
            if engine.is_running() {
                ui.label(format!("Frames {}, last {:?}", engine.frames(), state.last_outcome));
            } else {
                ui.label(format!("Paused after {} frames", engine.frames()));
            }
        });
}
