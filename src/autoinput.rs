//! Timed keypresses sent to the emulator window after launch.
//!
//! Xenia opens on its game list; pressing the "launch last game" hotkey and
//! the fullscreen hotkey a few seconds later gets the player straight into
//! the game. This is best effort: the key goes to whatever window has focus.

use crate::config::{AutoOption, ManagerConfig};
use crate::error::Result;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Keys the auto-input backend can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// F1..=F24
    Function(u8),
    /// `a`-`z` or `0`-`9`, stored lowercase.
    Char(char),
    Enter,
    Escape,
    Space,
    Tab,
    Backspace,
}

impl Key {
    /// Parse a key name such as `f9`, `F11`, `enter` or `x`.
    pub fn parse(name: &str) -> Option<Key> {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "enter" => return Some(Key::Enter),
            "esc" | "escape" => return Some(Key::Escape),
            "space" => return Some(Key::Space),
            "tab" => return Some(Key::Tab),
            "backspace" => return Some(Key::Backspace),
            _ => {}
        }
        if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            return (1..=24).contains(&n).then_some(Key::Function(n));
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Some(Key::Char(c)),
            _ => None,
        }
    }

    /// Windows virtual-key code.
    pub fn virtual_key(self) -> u16 {
        match self {
            Key::Function(n) => 0x70 + u16::from(n) - 1,
            Key::Char(c) => c.to_ascii_uppercase() as u16,
            Key::Enter => 0x0D,
            Key::Escape => 0x1B,
            Key::Space => 0x20,
            Key::Tab => 0x09,
            Key::Backspace => 0x08,
        }
    }

    /// X11 KeySym, turned into a keycode by the X server at send time.
    pub fn x11_keysym(self) -> u64 {
        match self {
            Key::Function(n) => 0xFFBE + u64::from(n) - 1,
            Key::Char(c) => c as u64,
            Key::Enter => 0xFF0D,
            Key::Escape => 0xFF1B,
            Key::Space => 0x20,
            Key::Tab => 0xFF09,
            Key::Backspace => 0xFF08,
        }
    }
}

/// Something that can synthesize a key press (down + up).
pub trait KeySender: Send + Sync {
    fn press(&self, key: Key) -> Result<()>;
}

#[cfg(target_os = "windows")]
mod windows_backend {
    use super::{Key, KeySender};
    use crate::error::Result;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
        KEYEVENTF_KEYUP, VIRTUAL_KEY,
    };

    /// Injects key events with `SendInput`.
    pub struct WindowsKeySender;

    fn key_input(vk: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    impl KeySender for WindowsKeySender {
        fn press(&self, key: Key) -> Result<()> {
            let vk = key.virtual_key();
            let inputs = [
                key_input(vk, KEYBD_EVENT_FLAGS(0)),
                key_input(vk, KEYEVENTF_KEYUP),
            ];
            // SAFETY: both INPUT values are fully initialised keyboard events.
            let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
            if sent as usize != inputs.len() {
                return Err(std::io::Error::last_os_error().into());
            }
            Ok(())
        }
    }
}

#[cfg(target_os = "windows")]
pub use windows_backend::WindowsKeySender;

/// XTest backend. Needs libX11 and libXtst at link time, so it sits behind
/// the `x11` feature.
#[cfg(all(target_os = "linux", feature = "x11"))]
mod x11_backend {
    use super::{Key, KeySender};
    use crate::error::{ManagerError, Result};
    use std::os::raw::c_ulong;
    use std::ptr;
    use x11::xlib::{KeySym, XCloseDisplay, XFlush, XKeysymToKeycode, XOpenDisplay};
    use x11::xtest::XTestFakeKeyEvent;

    /// `CurrentTime`: let the server stamp the event.
    const CURRENT_TIME: c_ulong = 0;

    /// Injects key events into the display named by `DISPLAY`. The display
    /// is opened per press; presses are seconds apart.
    pub struct X11KeySender;

    impl KeySender for X11KeySender {
        fn press(&self, key: Key) -> Result<()> {
            // SAFETY: the display pointer is checked for null, used only on
            // this thread and closed before returning.
            unsafe {
                let display = XOpenDisplay(ptr::null());
                if display.is_null() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::NotConnected,
                        "cannot open X display (is DISPLAY set?)",
                    )
                    .into());
                }
                let keycode = XKeysymToKeycode(display, key.x11_keysym() as KeySym);
                let sent = keycode != 0
                    && XTestFakeKeyEvent(display, u32::from(keycode), 1, CURRENT_TIME) != 0
                    && XTestFakeKeyEvent(display, u32::from(keycode), 0, CURRENT_TIME) != 0;
                XFlush(display);
                XCloseDisplay(display);
                if !sent {
                    return Err(ManagerError::InvalidInput(format!(
                        "X server could not send {:?}",
                        key
                    )));
                }
            }
            Ok(())
        }
    }
}

#[cfg(all(target_os = "linux", feature = "x11"))]
pub use x11_backend::X11KeySender;

/// Fallback for platforms without an input backend: records the intent in
/// the log and does nothing else.
pub struct LogOnlySender;

impl KeySender for LogOnlySender {
    fn press(&self, key: Key) -> Result<()> {
        log::warn!("Key injection is not supported on this platform, skipping {:?}", key);
        Ok(())
    }
}

/// The platform's key sender: `SendInput` on Windows, XTest on Linux when
/// built with the `x11` feature, otherwise the log-only fallback.
pub fn default_sender() -> Arc<dyn KeySender> {
    #[cfg(target_os = "windows")]
    let sender: Arc<dyn KeySender> = Arc::new(WindowsKeySender);
    #[cfg(all(target_os = "linux", feature = "x11"))]
    let sender: Arc<dyn KeySender> = Arc::new(X11KeySender);
    #[cfg(not(any(target_os = "windows", all(target_os = "linux", feature = "x11"))))]
    let sender: Arc<dyn KeySender> = Arc::new(LogOnlySender);
    sender
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoStep {
    pub delay: Duration,
    pub key: String,
}

/// Ordered keypresses to perform after a launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoInputPlan {
    pub steps: Vec<AutoStep>,
}

impl AutoInputPlan {
    /// Auto-launch first, then auto-fullscreen, each only when enabled.
    pub fn from_config(config: &ManagerConfig) -> Self {
        let steps = [AutoOption::Launch, AutoOption::Fullscreen]
            .into_iter()
            .filter(|opt| config.is_enabled(*opt))
            .map(|opt| AutoStep {
                delay: Duration::from_secs(config.delay(opt)),
                key: config.key(opt).to_string(),
            })
            .collect();
        AutoInputPlan { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Run the plan on a background thread. The thread is not cancellable;
/// callers may drop the handle. Returns `None` when there is nothing to do.
pub fn spawn(plan: AutoInputPlan, sender: Arc<dyn KeySender>) -> Option<JoinHandle<()>> {
    if plan.is_empty() {
        return None;
    }
    let handle = thread::spawn(move || {
        for step in plan.steps {
            thread::sleep(step.delay);
            let Some(key) = Key::parse(&step.key) else {
                log::error!("Unknown auto-input key '{}', skipping", step.key);
                continue;
            };
            match sender.press(key) {
                Ok(()) => log::info!("Sent {} after {:?}", step.key, step.delay),
                Err(e) => log::error!("Failed to send {}: {}", step.key, e),
            }
        }
    });
    Some(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        pressed: Mutex<Vec<Key>>,
    }

    impl KeySender for RecordingSender {
        fn press(&self, key: Key) -> Result<()> {
            self.pressed.lock().unwrap().push(key);
            Ok(())
        }
    }

    #[test]
    fn parses_supported_names() {
        assert_eq!(Key::parse("f9"), Some(Key::Function(9)));
        assert_eq!(Key::parse("F11"), Some(Key::Function(11)));
        assert_eq!(Key::parse("esc"), Some(Key::Escape));
        assert_eq!(Key::parse("Q"), Some(Key::Char('q')));
        assert_eq!(Key::parse("7"), Some(Key::Char('7')));
        assert_eq!(Key::parse("f0"), None);
        assert_eq!(Key::parse("f25"), None);
        assert_eq!(Key::parse("ctrl"), None);
        assert_eq!(Key::parse("enter"), Some(Key::Enter));
        assert_eq!(Key::parse("return"), None);
        assert_eq!(Key::parse(""), None);
    }

    #[test]
    fn virtual_key_codes() {
        assert_eq!(Key::Function(1).virtual_key(), 0x70);
        assert_eq!(Key::Function(9).virtual_key(), 0x78);
        assert_eq!(Key::Function(11).virtual_key(), 0x7A);
        assert_eq!(Key::Char('a').virtual_key(), 0x41);
        assert_eq!(Key::Char('0').virtual_key(), 0x30);
    }

    #[test]
    fn x11_keysyms() {
        assert_eq!(Key::Function(1).x11_keysym(), 0xFFBE);
        assert_eq!(Key::Function(9).x11_keysym(), 0xFFC6);
        assert_eq!(Key::Function(11).x11_keysym(), 0xFFC8);
        assert_eq!(Key::Char('q').x11_keysym(), 0x71);
        assert_eq!(Key::Char('7').x11_keysym(), 0x37);
        assert_eq!(Key::Enter.x11_keysym(), 0xFF0D);
        assert_eq!(Key::Escape.x11_keysym(), 0xFF1B);
    }

    #[test]
    fn plan_orders_launch_before_fullscreen() {
        let mut config = ManagerConfig::default();
        assert!(AutoInputPlan::from_config(&config).is_empty());

        config.auto_fullscreen = true;
        config.auto_launch = true;
        config.auto_launch_delay = 5;
        let plan = AutoInputPlan::from_config(&config);
        assert_eq!(
            plan.steps,
            vec![
                AutoStep { delay: Duration::from_secs(5), key: "f9".into() },
                AutoStep { delay: Duration::from_secs(2), key: "f11".into() },
            ]
        );
    }

    #[test]
    fn worker_presses_keys_in_order_and_skips_unknown() {
        let sender = Arc::new(RecordingSender::default());
        let plan = AutoInputPlan {
            steps: vec![
                AutoStep { delay: Duration::ZERO, key: "f9".into() },
                AutoStep { delay: Duration::ZERO, key: "bogus".into() },
                AutoStep { delay: Duration::ZERO, key: "f11".into() },
            ],
        };
        let handle = spawn(plan, sender.clone()).unwrap();
        handle.join().unwrap();
        assert_eq!(
            *sender.pressed.lock().unwrap(),
            vec![Key::Function(9), Key::Function(11)]
        );
    }

    #[test]
    fn empty_plan_spawns_nothing() {
        let sender = Arc::new(RecordingSender::default());
        assert!(spawn(AutoInputPlan::default(), sender).is_none());
    }
}
