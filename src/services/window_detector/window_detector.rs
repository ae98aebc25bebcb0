use crate::error::{HelperError, Result};
use crate::events::{KeyChord, ScreenBounds, WindowGeometry, WindowHandle, WindowState};
use crate::services::VirtualDevice;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::classifier::classify;
use super::r#trait::WindowPlatform;
use super::wmctrl::WmctrlDetector;
use super::x11::X11Properties;
use super::xdotool::XdotoolDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkingMethod {
    Xdotool,
    Wmctrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackendChoice {
    Auto,
    Only(WorkingMethod),
}

impl BackendChoice {
    fn parse(backend: &str) -> Result<Self> {
        match backend {
            "auto" => Ok(BackendChoice::Auto),
            "xdotool" => Ok(BackendChoice::Only(WorkingMethod::Xdotool)),
            "wmctrl" => Ok(BackendChoice::Only(WorkingMethod::Wmctrl)),
            other => Err(HelperError::Internal(format!("Неизвестный backend окон: {}", other))),
        }
    }
}

pub struct RealWindowPlatform {
    backend: BackendChoice,
    working_method: RwLock<Option<WorkingMethod>>,
    virtual_device: Arc<VirtualDevice>,
    chord: KeyChord,

    // Детекторы утилит
    xdotool: XdotoolDetector,
    wmctrl: WmctrlDetector,
    x11: X11Properties,
}

impl RealWindowPlatform {
    pub fn new(backend: &str, virtual_device: Arc<VirtualDevice>, chord: KeyChord) -> Result<Self> {
        info!("Инициализация RealWindowPlatform (backend: {}, сочетание: {})", backend, chord);

        Ok(Self {
            backend: BackendChoice::parse(backend)?,
            working_method: RwLock::new(None),
            virtual_device,
            chord,
            xdotool: XdotoolDetector::new(),
            wmctrl: WmctrlDetector::new(),
            x11: X11Properties::new(),
        })
    }

    async fn detect_working_method(&self) -> Result<WorkingMethod> {
        info!("Определяем рабочий метод поиска окон...");

        let candidates: &[WorkingMethod] = match self.backend {
            BackendChoice::Auto => &[WorkingMethod::Xdotool, WorkingMethod::Wmctrl],
            BackendChoice::Only(ref method) => std::slice::from_ref(method),
        };

        for &method in candidates {
            let tested = match method {
                WorkingMethod::Xdotool => self.xdotool.test().await,
                WorkingMethod::Wmctrl => self.wmctrl.test().await,
            };
            match tested {
                Ok(()) => {
                    info!("Используем {:?}", method);
                    return Ok(method);
                }
                Err(e) => debug!("{:?} недоступен: {}", method, e),
            }
        }

        HelperError::service_unavailable("Ни один метод поиска окон не работает")
    }

    async fn method(&self) -> Result<WorkingMethod> {
        let cached = *self.working_method.read();
        if let Some(method) = cached {
            return Ok(method);
        }

        let method = self.detect_working_method().await?;
        *self.working_method.write() = Some(method);
        Ok(method)
    }

    async fn geometry(&self, method: WorkingMethod, handle: WindowHandle) -> Option<WindowGeometry> {
        let geometry = match method {
            WorkingMethod::Xdotool => self.xdotool.geometry(handle).await,
            WorkingMethod::Wmctrl => self.wmctrl.geometry(handle).await,
        };
        geometry
            .map_err(|e| debug!("Геометрия окна {} недоступна: {}", handle, e))
            .ok()
    }

    /// Основной монитор по xrandr, иначе размер всего дисплея
    async fn screen_bounds(&self, method: WorkingMethod) -> Option<ScreenBounds> {
        if let Ok(bounds) = self.x11.primary_monitor().await {
            return Some(bounds);
        }

        let bounds = match method {
            WorkingMethod::Xdotool => self.xdotool.screen_bounds().await,
            WorkingMethod::Wmctrl => self.wmctrl.screen_bounds().await,
        };
        bounds
            .map_err(|e| debug!("Размер экрана недоступен: {}", e))
            .ok()
    }

    async fn activate(&self, method: WorkingMethod, handle: WindowHandle) -> Result<()> {
        match method {
            WorkingMethod::Xdotool => self.xdotool.activate(handle).await,
            WorkingMethod::Wmctrl => self.wmctrl.activate(handle).await,
        }
    }
}

#[async_trait::async_trait]
impl WindowPlatform for RealWindowPlatform {
    async fn find_window(&self, title: &str) -> Result<Option<WindowHandle>> {
        let method = self.method().await?;

        let found = match method {
            WorkingMethod::Xdotool => self.xdotool.find_window(title).await,
            WorkingMethod::Wmctrl => self.wmctrl.find_window(title).await,
        };

        if let Err(e) = &found {
            warn!("Рабочий метод {:?} перестал работать: {}. Переопределим на следующем тике", method, e);
            *self.working_method.write() = None;
        }

        found
    }

    async fn classify(&self, handle: WindowHandle) -> WindowState {
        let cached = *self.working_method.read();
        let Some(method) = cached else {
            return WindowState::Fullscreen;
        };

        let decorated = match self.x11.decorations(handle).await {
            Ok(decorations) => decorations.is_decorated(),
            Err(e) => {
                debug!("Оформление окна {} недоступно: {}", handle, e);
                false
            }
        };
        let geometry = self.geometry(method, handle).await;
        let screen = self.screen_bounds(method).await;

        let state = classify(decorated, geometry, screen);
        debug!(
            "Окно {}: рамка={}, геометрия={:?}, экран={:?} -> {:?}",
            handle, decorated, geometry, screen, state
        );
        state
    }

    async fn restore(&self, handle: WindowHandle) {
        match self.method().await {
            Ok(method) => {
                if let Err(e) = self.activate(method, handle).await {
                    warn!("Не удалось активировать окно {}: {}", handle, e);
                }
            }
            Err(e) => warn!("Не удалось активировать окно {}: {}", handle, e),
        }

        if let Err(e) = self.virtual_device.send_chord(&self.chord).await {
            warn!("Не удалось отправить сочетание {}: {}", self.chord, e);
        }
    }
}

impl Drop for RealWindowPlatform {
    fn drop(&mut self) {
        info!("RealWindowPlatform завершает работу");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_choice_parse() {
        assert_eq!(BackendChoice::parse("auto").unwrap(), BackendChoice::Auto);
        assert_eq!(
            BackendChoice::parse("wmctrl").unwrap(),
            BackendChoice::Only(WorkingMethod::Wmctrl)
        );
        assert!(BackendChoice::parse("kdotool").is_err());
    }
}
