//! Keeps the wallpaper window out of the way: never activated, absent from
//! the taskbar and the Alt+Tab switcher.
//!
//! Only Windows has a primitive for this. Elsewhere styling is a no-op and the
//! parent is expected to manage the window's stacking itself.

use winit::window::Window;

use super::{NativeHandle, ShellError};

/// Apply the wallpaper window styles.
pub fn apply(window: &Window, handle: NativeHandle) -> Result<(), ShellError> {
  imp::apply(window, handle)
}

#[cfg(windows)]
mod imp {
  use std::ffi::c_void;

  use windows::Win32::Foundation::{GetLastError, SetLastError, HWND, WIN32_ERROR};
  use windows::Win32::UI::WindowsAndMessaging::{GWL_EXSTYLE, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW};
  use winit::window::Window;

  use super::{NativeHandle, ShellError};

  pub fn apply(window: &Window, handle: NativeHandle) -> Result<(), ShellError> {
    let hwnd = HWND(handle.raw() as isize as *mut c_void);
    let style = WS_EX_NOACTIVATE.0 | WS_EX_TOOLWINDOW.0;

    unsafe {
      SetLastError(WIN32_ERROR(0));
      let previous = set_ex_style(hwnd, style);
      let err = GetLastError();
      if previous == 0 && err != WIN32_ERROR(0) {
        return Err(ShellError::Style(format!("SetWindowLong failed: {:?}", err)));
      }
      log::debug!("Extended style {:#x} -> {:#x}", previous, style);
    }

    // The shell only re-reads the taskbar flags when the window is shown again
    window.set_visible(false);
    window.set_visible(true);
    Ok(())
  }

  #[cfg(target_pointer_width = "64")]
  unsafe fn set_ex_style(hwnd: HWND, style: u32) -> isize {
    use windows::Win32::UI::WindowsAndMessaging::SetWindowLongPtrW;
    unsafe { SetWindowLongPtrW(hwnd, GWL_EXSTYLE, style as isize) }
  }

  // user32 has no SetWindowLongPtr export on 32-bit
  #[cfg(target_pointer_width = "32")]
  unsafe fn set_ex_style(hwnd: HWND, style: u32) -> isize {
    use windows::Win32::UI::WindowsAndMessaging::SetWindowLongW;
    unsafe { SetWindowLongW(hwnd, GWL_EXSTYLE, style as i32) as isize }
  }
}

#[cfg(not(windows))]
mod imp {
  use winit::window::Window;

  use super::{NativeHandle, ShellError};

  pub fn apply(_window: &Window, handle: NativeHandle) -> Result<(), ShellError> {
    log::debug!("No switcher exclusion on this platform for window {}", handle);
    Ok(())
  }
}
