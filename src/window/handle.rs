use std::fmt;

use raw_window_handle::{HasWindowHandle, RawWindowHandle};

use super::ShellError;

/// Native id of the host window, as the parent and the media engine see it:
/// the HWND on Windows, the X11 window id elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(i64);

impl NativeHandle {
  pub fn new(raw: i64) -> Self {
    Self(raw)
  }

  pub fn raw(self) -> i64 {
    self.0
  }

  pub fn from_raw(handle: RawWindowHandle) -> Result<Self, ShellError> {
    match handle {
      RawWindowHandle::Win32(h) => Ok(Self(h.hwnd.get() as i64)),
      RawWindowHandle::Xlib(h) => Ok(Self(h.window as i64)),
      RawWindowHandle::Xcb(h) => Ok(Self(h.window.get() as i64)),
      other => Err(ShellError::UnsupportedHandle(format!("{:?}", other))),
    }
  }

  pub fn of(window: &impl HasWindowHandle) -> Result<Self, ShellError> {
    let handle = window.window_handle()?;
    Self::from_raw(handle.as_raw())
  }
}

impl fmt::Display for NativeHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}
