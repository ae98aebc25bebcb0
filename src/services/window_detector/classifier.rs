use crate::events::{ScreenBounds, WindowGeometry, WindowState};

/// Классифицировать окно как оконное или полноэкранное.
///
/// Окно считается оконным, если у него есть рамка/заголовок или если оно не
/// закрывает основной экран целиком. Если геометрию получить не удалось,
/// решение принимается только по оформлению.
pub fn classify(
    decorated: bool,
    geometry: Option<WindowGeometry>,
    screen: Option<ScreenBounds>,
) -> WindowState {
    if decorated {
        return WindowState::Windowed;
    }

    match (geometry, screen) {
        (Some(geometry), Some(screen)) if !covers_screen(&geometry, &screen) => WindowState::Windowed,
        _ => WindowState::Fullscreen,
    }
}

pub fn covers_screen(geometry: &WindowGeometry, screen: &ScreenBounds) -> bool {
    geometry.x <= screen.x
        && geometry.y <= screen.y
        && geometry.right() >= screen.right()
        && geometry.bottom() >= screen.bottom()
}
