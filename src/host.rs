use crate::engine::{FrameOutcome, InputEvent};
use crate::state::BackdropState;
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowOccluded};

/// Native hosts take the reduced-motion preference from this variable.
pub const REDUCED_MOTION_ENV: &str = "INK_REDUCED_MOTION";
const PREFERENCE_POLL_SECS: f64 = 1.0;

#[cfg(target_arch = "wasm32")]
fn prefers_reduced_motion() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-reduced-motion: reduce)").ok().flatten())
        .is_some_and(|query| query.matches())
}

#[cfg(not(target_arch = "wasm32"))]
fn prefers_reduced_motion() -> bool {
    std::env::var(REDUCED_MOTION_ENV).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

#[cfg(target_arch = "wasm32")]
fn page_hidden(_occluded: Option<bool>) -> Option<bool> {
    web_sys::window().and_then(|w| w.document()).map(|d| d.hidden())
}

#[cfg(not(target_arch = "wasm32"))]
fn page_hidden(occluded: Option<bool>) -> Option<bool> {
    occluded
}

/// Turns polled window state into engine input events.
pub fn collect_input_system(
    windows: Query<&Window, With<PrimaryWindow>>,
    buttons: Res<ButtonInput<MouseButton>>,
    time: Res<Time>,
    mut occlusion: MessageReader<WindowOccluded>,
    mut last_poll: Local<Option<f64>>,
    mut state: ResMut<BackdropState>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let now_ms = time.elapsed_secs_f64() * 1000.0;
    let state = &mut *state;

    // 1. Viewport
    let size = UVec2::new(window.width() as u32, window.height() as u32);
    if size != state.last_size {
        state.last_size = size;
        state.pending.push(InputEvent::Resize {
            width: size.x,
            height: size.y,
        });
    }

    // 2. Pointer
    match window.cursor_position() {
        Some(position) => {
            if state.last_cursor != Some(position) {
                state.pending.push(InputEvent::PointerMove { position, time_ms: now_ms });
            }
            if buttons.just_pressed(MouseButton::Left) {
                state.pending.push(InputEvent::PointerDown { position, time_ms: now_ms });
            }
            state.last_cursor = Some(position);
        }
        None => {
            if state.last_cursor.take().is_some() {
                state.pending.push(InputEvent::PointerLeave);
            }
        }
    }

    // 3. Page visibility
    let occluded = occlusion.read().last().map(|ev| ev.occluded);
    if let Some(hidden) = page_hidden(occluded)
        && hidden != state.hidden
    {
        state.hidden = hidden;
        state.pending.push(InputEvent::Visibility { hidden });
    }

    // 4. Reduced motion, polled since it can change at runtime
    let due = last_poll.is_none_or(|t| now_ms / 1000.0 - t >= PREFERENCE_POLL_SECS);
    if due || state.reduced_motion_override.is_some() {
        if due {
            *last_poll = Some(now_ms / 1000.0);
        }
        let reduced = state.reduced_motion_override.unwrap_or_else(|| {
            if due {
                prefers_reduced_motion()
            } else {
                state.reduced_motion
            }
        });
        if reduced != state.reduced_motion {
            state.reduced_motion = reduced;
            state.pending.push(InputEvent::ReducedMotion(reduced));
        }
    }
}

/// Drives the engine once per display refresh and composites the result.
pub fn frame_system(time: Res<Time>, mut state: ResMut<BackdropState>) {
    let state = &mut *state;
    let Some(engine) = state.engine.as_mut() else {
        state.pending.clear();
        return;
    };

    let now_ms = time.elapsed_secs_f64() * 1000.0;
    let outcome = engine.tick(now_ms, &state.pending);
    state.pending.clear();
    state.last_outcome = Some(outcome);

    if outcome == FrameOutcome::Rendered
        && let Some(surface) = state.surface.as_mut()
    {
        state.compositor.execute(&engine.frame(), &mut surface.buffer);
    }
}
