use crate::error::{HelperError, Result};
use crate::events::window::title_matches;
use crate::events::{ScreenBounds, WindowGeometry, WindowHandle};
use tracing::debug;

use super::command::{run_raw, run_tool};

pub struct XdotoolDetector;

impl XdotoolDetector {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        run_tool("xdotool", &["getdisplaygeometry"]).await.map(|_| ())
    }

    pub async fn find_window(&self, title: &str) -> Result<Option<WindowHandle>> {
        let pattern = escape_regex(title);
        let output = run_raw("xdotool", &["search", "--onlyvisible", "--name", &pattern]).await?;

        // Если совпадений нет, xdotool завершается с кодом 1 и пустым выводом
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                return Err(HelperError::ServiceUnavailable(format!(
                    "xdotool search вернул ошибку: {}",
                    stderr.trim()
                )));
            }
            return Ok(None);
        }

        for handle in stdout.lines().filter_map(WindowHandle::parse) {
            let id = handle.value().to_string();
            match run_tool("xdotool", &["getwindowname", &id]).await {
                Ok(name) if title_matches(&name, title) => {
                    debug!("xdotool нашёл окно {} '{}'", handle, name);
                    return Ok(Some(handle));
                }
                Ok(name) => debug!("Окно {} '{}' не подходит по заголовку", handle, name),
                Err(e) => debug!("Не удалось получить заголовок окна {}: {}", handle, e),
            }
        }

        Ok(None)
    }

    pub async fn geometry(&self, handle: WindowHandle) -> Result<WindowGeometry> {
        let id = handle.value().to_string();
        let output = run_tool("xdotool", &["getwindowgeometry", "--shell", &id]).await?;
        parse_shell_geometry(&output).ok_or_else(|| {
            HelperError::Internal(format!("Не удалось разобрать геометрию окна {}: {}", handle, output))
        })
    }

    pub async fn screen_bounds(&self) -> Result<ScreenBounds> {
        let output = run_tool("xdotool", &["getdisplaygeometry"]).await?;
        parse_display_geometry(&output).ok_or_else(|| {
            HelperError::Internal(format!("Не удалось разобрать размер дисплея: {}", output))
        })
    }

    pub async fn activate(&self, handle: WindowHandle) -> Result<()> {
        let id = handle.value().to_string();
        run_tool("xdotool", &["windowactivate", "--sync", &id]).await.map(|_| ())
    }
}

/// Разбор вывода `xdotool getwindowgeometry --shell`
pub fn parse_shell_geometry(output: &str) -> Option<WindowGeometry> {
    let mut x = None;
    let mut y = None;
    let mut width = None;
    let mut height = None;

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "X" => x = value.parse().ok(),
            "Y" => y = value.parse().ok(),
            "WIDTH" => width = value.parse().ok(),
            "HEIGHT" => height = value.parse().ok(),
            _ => {}
        }
    }

    Some(WindowGeometry {
        x: x?,
        y: y?,
        width: width?,
        height: height?,
    })
}

/// Разбор вывода `xdotool getdisplaygeometry` ("1920 1080")
pub fn parse_display_geometry(output: &str) -> Option<ScreenBounds> {
    let mut parts = output.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    Some(ScreenBounds::from_size(width, height))
}

/// `xdotool search --name` принимает регулярное выражение, заголовок ищем буквально
fn escape_regex(title: &str) -> String {
    let mut escaped = String::with_capacity(title.len());
    for ch in title.chars() {
        if "\\.+*?()|[]{}^$".contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell_geometry() {
        let output = "WINDOW=60817411\nX=0\nY=0\nWIDTH=1920\nHEIGHT=1080\nSCREEN=0\n";
        assert_eq!(
            parse_shell_geometry(output),
            Some(WindowGeometry { x: 0, y: 0, width: 1920, height: 1080 })
        );
    }

    #[test]
    fn test_parse_shell_geometry_negative_offset() {
        let output = "WINDOW=1\nX=-4\nY=27\nWIDTH=1280\nHEIGHT=720\nSCREEN=0";
        let geometry = parse_shell_geometry(output).unwrap();
        assert_eq!(geometry.x, -4);
        assert_eq!(geometry.y, 27);
    }

    #[test]
    fn test_parse_shell_geometry_incomplete() {
        assert_eq!(parse_shell_geometry("WINDOW=1\nX=0\nY=0\n"), None);
        assert_eq!(parse_shell_geometry(""), None);
    }

    #[test]
    fn test_parse_display_geometry() {
        assert_eq!(parse_display_geometry("2560 1440\n"), Some(ScreenBounds::from_size(2560, 1440)));
        assert_eq!(parse_display_geometry("2560"), None);
    }

    #[test]
    fn test_escape_regex() {
        assert_eq!(escape_regex("Magic The Gatherin"), "Magic The Gatherin");
        assert_eq!(escape_regex("Game (x64) v1.2"), "Game \\(x64\\) v1\\.2");
    }
}
