use crate::error::{HelperError, Result};
use crate::events::{KeyChord, KeyCode, VirtualKeyEvent};
use parking_lot::Mutex;
use smallvec::SmallVec;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

// Сколько держать сочетание нажатым: часть игр не замечает мгновенный press+release
const CHORD_HOLD: Duration = Duration::from_millis(30);

pub struct VirtualDevice {
    device: Option<Mutex<uinput::Device>>,
    device_name: String,
    dry_run: bool,
}

impl VirtualDevice {
    pub fn new(device_name: &str, dry_run: bool) -> Result<Self> {
        info!("Инициализация VirtualDevice '{}' (dry_run: {})", device_name, dry_run);

        let device = if dry_run {
            None
        } else {
            Some(Mutex::new(Self::create_virtual_device(device_name)?))
        };

        Ok(Self {
            device,
            device_name: device_name.to_string(),
            dry_run,
        })
    }

    fn create_virtual_device(device_name: &str) -> Result<uinput::Device> {
        info!("Создание виртуального устройства uinput '{}' для отправки сочетаний", device_name);

        let virtual_device = uinput::default()?
            .name(device_name)?
            .event(uinput::event::Keyboard::All)?
            .create()
            .map_err(|e| HelperError::Internal(format!("Не удалось создать виртуальное устройство '{}': {}", device_name, e)))?;

        info!("Виртуальное устройство '{}' создано успешно", device_name);
        Ok(virtual_device)
    }

    pub fn send_event(&self, event: VirtualKeyEvent) -> Result<()> {
        if self.dry_run {
            info!("[DRY RUN] Виртуальное событие: {} {:?}", event.key_code, event.state);
            return Ok(());
        }

        let Some(device) = &self.device else {
            return Err(HelperError::Internal("Виртуальное устройство недоступно".to_string()));
        };

        let mut device = device.lock();
        let keycode = event.key_code.value() as i32;

        // EV_KEY
        if let Err(e) = device.write(1, keycode, event.state.value()) {
            return Err(HelperError::Internal(format!("Не удалось отправить событие клавиши {}: {}", event.key_code, e)));
        }

        // EV_SYN / SYN_REPORT
        if let Err(e) = device.write(0, 0, 0) {
            return Err(HelperError::Internal(format!("Не удалось синхронизировать события: {}", e)));
        }

        debug!("Виртуальное событие {} {:?} отправлено", event.key_code, event.state);
        Ok(())
    }

    /// Нажать сочетание целиком и отпустить его в обратном порядке
    pub async fn send_chord(&self, chord: &KeyChord) -> Result<()> {
        debug!("Отправка сочетания {} через '{}'", chord, self.device_name);
        send_chord_to(self, chord, CHORD_HOLD).await
    }
}

/// Получатель событий клавиатуры: uinput устройство или подмена в тестах
pub trait KeySink: Send + Sync {
    fn send_key(&self, event: VirtualKeyEvent) -> Result<()>;
}

impl KeySink for VirtualDevice {
    fn send_key(&self, event: VirtualKeyEvent) -> Result<()> {
        self.send_event(event)
    }
}

/// Любая нажатая клавиша будет отпущена, даже если отправка сорвалась на середине,
/// иначе модификатор залипнет до конца сессии. Возвращается первая ошибка.
async fn send_chord_to<S: KeySink + ?Sized>(sink: &S, chord: &KeyChord, hold: Duration) -> Result<()> {
    let mut pressed = SmallVec::<[KeyCode; 4]>::new();

    for key in chord.presses() {
        if let Err(e) = sink.send_key(VirtualKeyEvent::press(key)) {
            warn!("Не удалось нажать {}, отпускаем уже нажатые клавиши", key);
            release_all(sink, &pressed);
            return Err(e);
        }
        pressed.push(key);
    }

    sleep(hold).await;

    match release_all(sink, &pressed) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Отпустить клавиши в обратном порядке, не останавливаясь на ошибках
fn release_all<S: KeySink + ?Sized>(sink: &S, pressed: &[KeyCode]) -> Option<HelperError> {
    let mut first_error = None;
    for &key in pressed.iter().rev() {
        if let Err(e) = sink.send_key(VirtualKeyEvent::release(key)) {
            first_error.get_or_insert(e);
        }
    }
    first_error
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        if !self.dry_run {
            info!("Закрытие виртуального устройства '{}'", self.device_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::KeyState;

    #[tokio::test]
    async fn test_dry_run_device_accepts_chords() {
        let device = VirtualDevice::new("test", true).unwrap();
        let chord = KeyChord::parse("alt+enter").unwrap();
        assert!(device.send_chord(&chord).await.is_ok());
    }

    /// Записывает события и отказывает на нажатии выбранной клавиши
    struct RecordingSink {
        events: Mutex<Vec<VirtualKeyEvent>>,
        fail_press_of: Option<KeyCode>,
    }

    impl RecordingSink {
        fn new(fail_press_of: Option<&str>) -> Self {
            Self {
                events: Mutex::new(Vec::new()),
                fail_press_of: fail_press_of.map(|name| KeyChord::parse(name).unwrap().keys()[0]),
            }
        }

        fn events(&self) -> Vec<VirtualKeyEvent> {
            self.events.lock().clone()
        }
    }

    impl KeySink for RecordingSink {
        fn send_key(&self, event: VirtualKeyEvent) -> Result<()> {
            if event.state == KeyState::Pressed && Some(event.key_code) == self.fail_press_of {
                return Err(HelperError::Internal(format!("press {} failed", event.key_code)));
            }
            self.events.lock().push(event);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_chord_releases_in_reverse_order() {
        let sink = RecordingSink::new(None);
        let chord = KeyChord::parse("ctrl+alt+enter").unwrap();
        let [ctrl, alt, enter] = [chord.keys()[0], chord.keys()[1], chord.keys()[2]];

        send_chord_to(&sink, &chord, Duration::ZERO).await.unwrap();

        assert_eq!(
            sink.events(),
            vec![
                VirtualKeyEvent::press(ctrl),
                VirtualKeyEvent::press(alt),
                VirtualKeyEvent::press(enter),
                VirtualKeyEvent::release(enter),
                VirtualKeyEvent::release(alt),
                VirtualKeyEvent::release(ctrl),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_press_releases_held_modifiers() {
        let sink = RecordingSink::new(Some("enter"));
        let chord = KeyChord::parse("ctrl+alt+enter").unwrap();
        let [ctrl, alt] = [chord.keys()[0], chord.keys()[1]];

        let result = send_chord_to(&sink, &chord, Duration::ZERO).await;

        assert!(matches!(result, Err(HelperError::Internal(_))));
        assert_eq!(
            sink.events(),
            vec![
                VirtualKeyEvent::press(ctrl),
                VirtualKeyEvent::press(alt),
                VirtualKeyEvent::release(alt),
                VirtualKeyEvent::release(ctrl),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_first_press_sends_nothing_else() {
        let sink = RecordingSink::new(Some("alt"));
        let chord = KeyChord::parse("alt+enter").unwrap();

        assert!(send_chord_to(&sink, &chord, Duration::ZERO).await.is_err());
        assert!(sink.events().is_empty());
    }
}
