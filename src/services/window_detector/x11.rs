use crate::error::{HelperError, Result};
use crate::events::{ScreenBounds, WindowHandle};

use super::command::run_tool;

/// Признаки оформления окна, которые выставляет оконный менеджер
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowDecorations {
    /// `_NET_FRAME_EXTENTS`: left, right, top, bottom
    pub frame_extents: Option<[u32; 4]>,
    /// В `_NET_WM_STATE` есть `_NET_WM_STATE_FULLSCREEN`
    pub fullscreen_hint: bool,
}

impl WindowDecorations {
    /// Окно с рамкой или заголовком
    pub fn is_decorated(&self) -> bool {
        !self.fullscreen_hint
            && self
                .frame_extents
                .map(|extents| extents.iter().any(|&side| side > 0))
                .unwrap_or(false)
    }
}

/// Свойства окон и мониторов через `xprop` и `xrandr`
pub struct X11Properties;

impl X11Properties {
    pub fn new() -> Self {
        Self
    }

    pub async fn decorations(&self, handle: WindowHandle) -> Result<WindowDecorations> {
        let id = handle.to_string();
        let output = run_tool("xprop", &["-id", &id, "_NET_FRAME_EXTENTS", "_NET_WM_STATE"]).await?;
        Ok(parse_xprop(&output))
    }

    pub async fn primary_monitor(&self) -> Result<ScreenBounds> {
        let output = run_tool("xrandr", &["--current"]).await?;
        parse_primary_monitor(&output)
            .ok_or_else(|| HelperError::Internal("xrandr не сообщил основной монитор".to_string()))
    }
}

/// Разбор вывода `xprop -id ID _NET_FRAME_EXTENTS _NET_WM_STATE`
pub fn parse_xprop(output: &str) -> WindowDecorations {
    let mut decorations = WindowDecorations::default();

    for line in output.lines() {
        let Some((name, value)) = line.split_once('=') else {
            // "_NET_FRAME_EXTENTS:  not found."
            continue;
        };

        if name.starts_with("_NET_FRAME_EXTENTS") {
            let sides: Vec<u32> = value
                .split(',')
                .filter_map(|side| side.trim().parse().ok())
                .collect();
            if let [left, right, top, bottom] = sides[..] {
                decorations.frame_extents = Some([left, right, top, bottom]);
            }
        } else if name.starts_with("_NET_WM_STATE") {
            decorations.fullscreen_hint = value
                .split(',')
                .any(|atom| atom.trim() == "_NET_WM_STATE_FULLSCREEN");
        }
    }

    decorations
}

/// Разбор `xrandr --current`: строка вида `DP-1 connected primary 2560x1440+0+0 ...`
pub fn parse_primary_monitor(output: &str) -> Option<ScreenBounds> {
    let line = output
        .lines()
        .find(|line| line.contains(" connected primary "))?;

    line.split_whitespace().find_map(parse_mode_geometry)
}

fn parse_mode_geometry(token: &str) -> Option<ScreenBounds> {
    let (size, offsets) = token.split_once('+')?;
    let (width, height) = size.split_once('x')?;
    let (x, y) = offsets.split_once('+')?;

    Some(ScreenBounds {
        x: x.parse().ok()?,
        y: y.parse().ok()?,
        width: width.parse().ok()?,
        height: height.parse().ok()?,
    })
}
