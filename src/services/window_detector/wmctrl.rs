use crate::error::{HelperError, Result};
use crate::events::window::title_matches;
use crate::events::{ScreenBounds, WindowGeometry, WindowHandle};

use super::command::run_tool;

/// Строка вывода `wmctrl -lG`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WmctrlWindow {
    pub handle: WindowHandle,
    pub geometry: WindowGeometry,
    pub title: String,
}

pub struct WmctrlDetector;

impl WmctrlDetector {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        run_tool("wmctrl", &["-m"]).await.map(|_| ())
    }

    async fn list_windows(&self) -> Result<Vec<WmctrlWindow>> {
        let output = run_tool("wmctrl", &["-lG"]).await?;
        Ok(parse_window_list(&output))
    }

    pub async fn find_window(&self, title: &str) -> Result<Option<WindowHandle>> {
        Ok(self
            .list_windows()
            .await?
            .into_iter()
            .find(|window| title_matches(&window.title, title))
            .map(|window| window.handle))
    }

    pub async fn geometry(&self, handle: WindowHandle) -> Result<WindowGeometry> {
        self.list_windows()
            .await?
            .into_iter()
            .find(|window| window.handle == handle)
            .map(|window| window.geometry)
            .ok_or_else(|| HelperError::Internal(format!("Окно {} пропало из списка wmctrl", handle)))
    }

    pub async fn screen_bounds(&self) -> Result<ScreenBounds> {
        let output = run_tool("wmctrl", &["-d"]).await?;
        parse_desktop_geometry(&output)
            .ok_or_else(|| HelperError::Internal("Текущий рабочий стол в wmctrl не найден".to_string()))
    }

    pub async fn activate(&self, handle: WindowHandle) -> Result<()> {
        run_tool("wmctrl", &["-i", "-a", &handle.to_string()]).await.map(|_| ())
    }
}

/// Разбор `wmctrl -lG`: id, рабочий стол, x, y, ширина, высота, хост, заголовок
pub fn parse_window_list(output: &str) -> Vec<WmctrlWindow> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 7 {
                return None;
            }
            let handle = WindowHandle::parse(parts[0])?;
            let geometry = WindowGeometry {
                x: parts[2].parse().ok()?,
                y: parts[3].parse().ok()?,
                width: parts[4].parse().ok()?,
                height: parts[5].parse().ok()?,
            };
            let title = parts[7..].join(" ");
            Some(WmctrlWindow { handle, geometry, title })
        })
        .collect()
}

/// Разбор `wmctrl -d`: берём DG текущего рабочего стола (помечен `*`)
pub fn parse_desktop_geometry(output: &str) -> Option<ScreenBounds> {
    let line = output.lines().find(|line| {
        line.split_whitespace().nth(1) == Some("*")
    })?;

    let mut parts = line.split_whitespace();
    parts.find(|part| *part == "DG:")?;
    let (width, height) = parts.next()?.split_once('x')?;

    Some(ScreenBounds::from_size(width.parse().ok()?, height.parse().ok()?))
}
