// Physical input simulation on top of enigo.
// Enigo handles are not Send on every platform, so each call builds its own
// handle inside the blocking pool and drops it before returning.
use std::time::Duration;

use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::errors::ChatLoopResult;
use crate::perception::types::{Point, Region};

#[cfg(target_os = "macos")]
const SHORTCUT_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
const SHORTCUT_MODIFIER: Key = Key::Control;

/// Number of intermediate mouse moves used to spread a drag over its duration.
const DRAG_STEPS: u32 = 20;

async fn with_enigo<F>(op: F) -> ChatLoopResult<()>
where
    F: FnOnce(&mut Enigo) -> ChatLoopResult<()> + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> ChatLoopResult<()> {
        let mut enigo = Enigo::new(&Settings::default())?;
        op(&mut enigo)
    })
    .await?
}

pub async fn mouse_click(at: Point) -> ChatLoopResult<()> {
    tracing::debug!(x = at.x, y = at.y, "mouse click");
    with_enigo(move |enigo| {
        enigo.move_mouse(at.x, at.y, Coordinate::Abs)?;
        enigo.button(Button::Left, Direction::Click)?;
        Ok(())
    })
    .await
}

/// Clicks wherever the cursor currently is. Used to drop a text selection.
pub async fn click_in_place() -> ChatLoopResult<()> {
    with_enigo(|enigo| {
        enigo.button(Button::Left, Direction::Click)?;
        Ok(())
    })
    .await
}

/// Press at `region.start`, move to `region.end` over `duration`, release.
pub async fn drag(region: Region, duration: Duration) -> ChatLoopResult<()> {
    tracing::debug!(
        from = %region.start,
        to = %region.end,
        ms = duration.as_millis() as u64,
        "mouse drag"
    );
    let step_pause = duration / DRAG_STEPS;
    with_enigo(move |enigo| {
        enigo.move_mouse(region.start.x, region.start.y, Coordinate::Abs)?;
        enigo.button(Button::Left, Direction::Press)?;
        let mut moved = Ok(());
        for step in 1..=DRAG_STEPS {
            let p = region.lerp(step as f64 / DRAG_STEPS as f64);
            if let Err(e) = enigo.move_mouse(p.x, p.y, Coordinate::Abs) {
                moved = Err(e);
                break;
            }
            std::thread::sleep(step_pause);
        }
        // Always release, otherwise the OS keeps the button held down.
        enigo.button(Button::Left, Direction::Release)?;
        moved.map_err(Into::into)
    })
    .await
}

pub async fn type_text(text: &str) -> ChatLoopResult<()> {
    let text = text.to_string();
    with_enigo(move |enigo| {
        enigo.text(&text)?;
        Ok(())
    })
    .await
}

pub async fn press_enter() -> ChatLoopResult<()> {
    with_enigo(|enigo| {
        enigo.key(Key::Return, Direction::Click)?;
        Ok(())
    })
    .await
}

/// Platform copy chord (Ctrl+C, Cmd+C on macOS).
pub async fn copy_shortcut() -> ChatLoopResult<()> {
    with_enigo(|enigo| shortcut(enigo, 'c')).await
}

/// Platform paste chord (Ctrl+V, Cmd+V on macOS).
pub async fn paste_shortcut() -> ChatLoopResult<()> {
    with_enigo(|enigo| shortcut(enigo, 'v')).await
}

fn shortcut(enigo: &mut Enigo, key: char) -> ChatLoopResult<()> {
    enigo.key(SHORTCUT_MODIFIER, Direction::Press)?;
    let clicked = enigo.key(Key::Unicode(key), Direction::Click);
    enigo.key(SHORTCUT_MODIFIER, Direction::Release)?;
    clicked.map_err(Into::into)
}
