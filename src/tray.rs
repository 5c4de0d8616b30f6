/// System tray icon with a context menu, also shown when the bird is clicked.
/// Uses the Win32 Shell_NotifyIconW API directly.

#[cfg(windows)]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(windows)]
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
#[cfg(windows)]
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW,
};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow,
    GetCursorPos, LoadIconW, PostMessageW, RegisterClassW, SetForegroundWindow, TrackPopupMenu,
    CS_HREDRAW, CS_VREDRAW, HMENU, IDI_APPLICATION, MF_SEPARATOR, MF_STRING, TPM_BOTTOMALIGN,
    TPM_LEFTALIGN, WM_COMMAND, WM_DESTROY, WM_USER, WNDCLASSW, WS_EX_TOOLWINDOW,
};

/// Custom message ID for tray icon callbacks.
#[cfg(windows)]
const WM_TRAYICON: u32 = WM_USER + 1;

/// Menu item IDs.
#[cfg(windows)]
const ID_QUIT: u16 = 1000;
#[cfg(windows)]
const ID_TOGGLE_VISIBLE: u16 = 1001;
#[cfg(windows)]
const ID_NEXT_VARIANT: u16 = 1002;

/// Label state for the Show/Hide entry, read from the window procedure.
#[cfg(windows)]
static BIRD_VISIBLE: AtomicBool = AtomicBool::new(true);

/// Commands returned from tray menu interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    None,
    Quit,
    ToggleVisible,
    NextVariant,
}

/// System tray icon state.
pub struct TrayIcon {
    #[cfg(windows)]
    hwnd: HWND,
    #[cfg(windows)]
    nid: NOTIFYICONDATAW,
    /// Pending command from the last menu interaction.
    pending_command: TrayCommand,
}

#[cfg(windows)]
impl TrayIcon {
    /// Add the tray icon. Returns `None` (after logging) if the shell refuses.
    pub fn new() -> Option<Self> {
        unsafe {
            // Hidden window class for receiving tray messages.
            let class_name: Vec<u16> = "PerchbirdTrayClass\0".encode_utf16().collect();
            let wc = WNDCLASSW {
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(tray_wnd_proc),
                lpszClassName: windows::core::PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };
            RegisterClassW(&wc);

            use windows::Win32::Foundation::HINSTANCE;
            let hwnd = match CreateWindowExW(
                WS_EX_TOOLWINDOW,
                windows::core::PCWSTR(class_name.as_ptr()),
                windows::core::PCWSTR::null(),
                Default::default(),
                0,
                0,
                0,
                0,
                HWND::default(),
                HMENU::default(),
                HINSTANCE::default(),
                None,
            ) {
                Ok(hwnd) => hwnd,
                Err(e) => {
                    log::warn!("Failed to create tray message window: {e}");
                    return None;
                }
            };

            let mut nid = NOTIFYICONDATAW::default();
            nid.cbSize = std::mem::size_of::<NOTIFYICONDATAW>() as u32;
            nid.hWnd = hwnd;
            nid.uID = 1;
            nid.uFlags = NIF_ICON | NIF_MESSAGE | NIF_TIP;
            nid.uCallbackMessage = WM_TRAYICON;
            nid.hIcon = LoadIconW(None, IDI_APPLICATION).unwrap_or_default();

            let tip = "Perchbird";
            for (i, ch) in tip.encode_utf16().enumerate() {
                if i >= nid.szTip.len() - 1 {
                    break;
                }
                nid.szTip[i] = ch;
            }

            if !Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
                log::warn!("Shell refused the tray icon");
            } else {
                log::info!("System tray icon created");
            }

            Some(Self {
                hwnd,
                nid,
                pending_command: TrayCommand::None,
            })
        }
    }

    /// Poll for menu commands. Call once per frame.
    pub fn poll(&mut self) -> TrayCommand {
        unsafe {
            use windows::Win32::UI::WindowsAndMessaging::{
                DispatchMessageW, PeekMessageW, TranslateMessage, PM_REMOVE,
            };
            let mut msg = std::mem::zeroed();
            while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);

                if msg.message == WM_COMMAND {
                    let id = (msg.wParam.0 & 0xFFFF) as u16;
                    self.pending_command = match id {
                        ID_QUIT => TrayCommand::Quit,
                        ID_TOGGLE_VISIBLE => TrayCommand::ToggleVisible,
                        ID_NEXT_VARIANT => TrayCommand::NextVariant,
                        _ => TrayCommand::None,
                    };
                }
            }
        }

        std::mem::replace(&mut self.pending_command, TrayCommand::None)
    }

    /// Keep the Show/Hide label in step with the bird.
    pub fn set_bird_visible(&self, visible: bool) {
        BIRD_VISIBLE.store(visible, Ordering::Relaxed);
    }

    /// Pop up the menu at the cursor. Blocks until it closes; the chosen
    /// command arrives through `poll`.
    pub fn show_menu(&self) {
        unsafe { show_context_menu(self.hwnd) }
    }

    /// Remove the tray icon (called on shutdown).
    pub fn remove(&mut self) {
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &self.nid);
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

#[cfg(windows)]
impl Drop for TrayIcon {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Window procedure for the hidden tray message window.
#[cfg(windows)]
unsafe extern "system" fn tray_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_TRAYICON {
        let event = (lparam.0 & 0xFFFF) as u32;
        // WM_RBUTTONUP = 0x0205
        if event == 0x0205 {
            show_context_menu(hwnd);
            return LRESULT(0);
        }
    }
    if msg == WM_COMMAND {
        // Post back to self so poll() picks it up via PeekMessage
        let _ = PostMessageW(hwnd, WM_COMMAND, wparam, LPARAM(0));
        return LRESULT(0);
    }
    if msg == WM_DESTROY {
        return LRESULT(0);
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

#[cfg(windows)]
unsafe fn append_item(hmenu: HMENU, id: u16, label: &str) {
    let wide: Vec<u16> = label.encode_utf16().chain(std::iter::once(0)).collect();
    let _ = AppendMenuW(
        hmenu,
        MF_STRING,
        id as usize,
        windows::core::PCWSTR(wide.as_ptr()),
    );
}

/// Show the context menu at the cursor position.
#[cfg(windows)]
unsafe fn show_context_menu(hwnd: HWND) {
    let hmenu = match CreatePopupMenu() {
        Ok(m) => m,
        Err(e) => {
            log::warn!("Failed to create popup menu: {e}");
            return;
        }
    };

    let toggle = if BIRD_VISIBLE.load(Ordering::Relaxed) {
        "Hide bird"
    } else {
        "Show bird"
    };
    append_item(hmenu, ID_TOGGLE_VISIBLE, toggle);
    append_item(hmenu, ID_NEXT_VARIANT, "Next species");
    let _ = AppendMenuW(hmenu, MF_SEPARATOR, 0, windows::core::PCWSTR::null());
    append_item(hmenu, ID_QUIT, "Quit");

    let mut pt = windows::Win32::Foundation::POINT::default();
    let _ = GetCursorPos(&mut pt);

    // Required so menu closes when clicking outside
    let _ = SetForegroundWindow(hwnd);

    let _ = TrackPopupMenu(
        hmenu,
        TPM_LEFTALIGN | TPM_BOTTOMALIGN,
        pt.x,
        pt.y,
        0,
        hwnd,
        None,
    );

    let _ = DestroyMenu(hmenu);
}

// Non-windows stub
#[cfg(not(windows))]
impl TrayIcon {
    pub fn new() -> Option<Self> {
        Some(Self {
            pending_command: TrayCommand::None,
        })
    }
    pub fn poll(&mut self) -> TrayCommand {
        std::mem::replace(&mut self.pending_command, TrayCommand::None)
    }
    pub fn set_bird_visible(&self, _visible: bool) {}
    pub fn show_menu(&self) {}
}
