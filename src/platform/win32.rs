use glam::Vec2;
use instant::Instant;
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use windows::Win32::Foundation::{BOOL, COLORREF, HWND, LPARAM, POINT, RECT, TRUE};
use windows::Win32::Graphics::Dwm::{DwmGetWindowAttribute, DwmSetWindowAttribute, DWMWINDOWATTRIBUTE};
use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, GetLastInputInfo, LASTINPUTINFO};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetCursorPos, GetLayeredWindowAttributes, GetWindowLongPtrW, GetWindowRect,
    GetWindowTextW, IsIconic, IsWindow, IsWindowVisible, SetWindowLongPtrW, SetWindowPos,
    GWL_EXSTYLE, LAYERED_WINDOW_ATTRIBUTES_FLAGS, LWA_ALPHA, SWP_FRAMECHANGED, SWP_NOACTIVATE,
    SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW,
};

use crate::motion::layout::{Element, ElementId, LayoutOracle, Rect, Visibility};

/// How often the top-level window list is re-enumerated (seconds).
const RESCAN_INTERVAL: f64 = 2.0;

/// Extract the Win32 HWND from a winit window.
pub fn get_hwnd(window: &winit::window::Window) -> Option<HWND> {
    let handle = window.window_handle().ok()?;
    match handle.as_raw() {
        RawWindowHandle::Win32(h) => Some(HWND(h.hwnd.get() as *mut core::ffi::c_void)),
        _ => None,
    }
}

/// Apply overlay window styles for a transparent desktop pet.
pub unsafe fn make_overlay(hwnd: HWND) {
    let style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);

    // No WS_EX_LAYERED: it forces a GDI backing surface that fights
    // DirectComposition. WS_EX_NOREDIRECTIONBITMAP keeps DWM from creating a
    // redirection surface, so everything comes from wgpu's DxgiFromVisual.
    const WS_EX_NOREDIRECTIONBITMAP: isize = 0x00200000;

    let new_style = (style & !(WS_EX_LAYERED.0 as isize))
        | WS_EX_NOACTIVATE.0 as isize
        | WS_EX_TOOLWINDOW.0 as isize
        | WS_EX_NOREDIRECTIONBITMAP;
    SetWindowLongPtrW(hwnd, GWL_EXSTYLE, new_style);

    log::debug!("Window ex-style 0x{style:08X} -> 0x{new_style:08X}");

    // Make DWM pick up the new styles instead of cached frame info.
    let _ = SetWindowPos(
        hwnd,
        HWND::default(),
        0,
        0,
        0,
        0,
        SWP_FRAMECHANGED | SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
    );

    // NCRENDERING_POLICY = disabled, no rounded corners, no border color,
    // no Mica/Acrylic backdrop.
    for (attribute, value) in [(2, 2u32), (33, 1), (34, 0xFFFFFFFE), (38, 1)] {
        let _ = DwmSetWindowAttribute(
            hwnd,
            DWMWINDOWATTRIBUTE(attribute),
            &value as *const u32 as *const core::ffi::c_void,
            4,
        );
    }
}

/// Set up the window as a transparent, click-through, always-on-top overlay.
pub fn setup_overlay(window: &winit::window::Window) {
    if let Err(e) = window.set_cursor_hittest(false) {
        log::warn!("Could not make overlay click-through: {e}");
    }

    let Some(hwnd) = get_hwnd(window) else {
        log::warn!("Overlay is not a Win32 window, skipping style setup");
        return;
    };
    unsafe {
        make_overlay(hwnd);
    }

    log::info!("Win32 overlay setup complete (DirectComposition + click-through + toolwindow)");
}

/// Get the current global mouse cursor position in screen pixels.
pub fn get_mouse_pos() -> Vec2 {
    let mut point = POINT::default();
    unsafe {
        let _ = GetCursorPos(&mut point);
    }
    Vec2::new(point.x as f32, point.y as f32)
}

/// Whether the left button is down or was clicked since the last poll.
/// The transition bit catches quick clicks that release between polls.
pub fn is_left_button_down() -> bool {
    // VK_LBUTTON = 0x01
    let state = unsafe { GetAsyncKeyState(0x01) };
    (state & (0x8000u16 as i16) != 0) || (state & 1 != 0)
}

/// Seconds since the last keyboard or mouse input anywhere on the system.
pub fn get_idle_time() -> f64 {
    unsafe {
        let mut info = LASTINPUTINFO {
            cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };
        if GetLastInputInfo(&mut info).as_bool() {
            let tick_count = windows::Win32::System::SystemInformation::GetTickCount();
            let elapsed_ms = tick_count.wrapping_sub(info.dwTime);
            elapsed_ms as f64 / 1000.0
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Window enumeration
// ---------------------------------------------------------------------------

fn hwnd_of(id: ElementId) -> HWND {
    HWND(id.0 as *mut core::ffi::c_void)
}

/// Hidden by the shell (other virtual desktop, suspended UWP app).
unsafe fn is_cloaked(hwnd: HWND) -> bool {
    // DWMWA_CLOAKED = 14
    let mut cloaked = 0u32;
    DwmGetWindowAttribute(
        hwnd,
        DWMWINDOWATTRIBUTE(14),
        &mut cloaked as *mut u32 as *mut core::ffi::c_void,
        4,
    )
    .is_ok()
        && cloaked != 0
}

/// Layered windows can be translucent; everything else is opaque.
unsafe fn window_opacity(hwnd: HWND) -> f32 {
    let ex_style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE) as u32;
    if ex_style & WS_EX_LAYERED.0 == 0 {
        return 1.0;
    }
    let mut key = COLORREF::default();
    let mut alpha = 255u8;
    let mut flags = LAYERED_WINDOW_ATTRIBUTES_FLAGS::default();
    let ok = GetLayeredWindowAttributes(
        hwnd,
        Some(&mut key as *mut _),
        Some(&mut alpha as *mut _),
        Some(&mut flags as *mut _),
    )
    .is_ok();
    if ok && flags.0 & LWA_ALPHA.0 != 0 {
        alpha as f32 / 255.0
    } else {
        1.0
    }
}

/// Live rectangle and visibility of one window, `None` if it is gone.
fn query_element(id: ElementId) -> Option<Element> {
    let hwnd = hwnd_of(id);
    unsafe {
        if !IsWindow(hwnd).as_bool() {
            return None;
        }
        let mut rect = RECT::default();
        GetWindowRect(hwnd, &mut rect).ok()?;
        let visible = IsWindowVisible(hwnd).as_bool() && !IsIconic(hwnd).as_bool() && !is_cloaked(hwnd);
        Some(Element {
            id,
            rect: Rect::new(
                rect.left as f32,
                rect.top as f32,
                (rect.right - rect.left) as f32,
                (rect.bottom - rect.top) as f32,
            ),
            visibility: Visibility {
                visible,
                opacity: window_opacity(hwnd),
            },
        })
    }
}

/// Enumerate visible, non-tool, titled top-level windows.
/// Excludes our own overlay and windows with zero area.
/// Call this periodically, NOT every frame.
pub fn enumerate_windows(own_hwnd: HWND) -> Vec<Element> {
    struct EnumState {
        own_hwnd: HWND,
        results: Vec<Element>,
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let state = &mut *(lparam.0 as *mut EnumState);

        if hwnd == state.own_hwnd || !IsWindowVisible(hwnd).as_bool() {
            return TRUE;
        }

        // Tooltips, floating toolbars, etc.
        let ex_style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
        if (ex_style as u32) & WS_EX_TOOLWINDOW.0 != 0 {
            return TRUE;
        }

        // Untitled top-level windows are mostly shell plumbing
        let mut buf = [0u16; 256];
        if GetWindowTextW(hwnd, &mut buf) <= 0 {
            return TRUE;
        }

        let Some(el) = query_element(ElementId(hwnd.0 as isize)) else {
            return TRUE;
        };
        if el.rect.w <= 0.0 || el.rect.h <= 0.0 || !el.visibility.visible {
            return TRUE;
        }

        state.results.push(el);
        TRUE
    }

    let mut state = EnumState {
        own_hwnd,
        results: Vec::with_capacity(64),
    };

    unsafe {
        let _ = EnumWindows(
            Some(enum_callback),
            LPARAM(&mut state as *mut EnumState as isize),
        );
    }

    state.results
}

/// Desktop windows as perches. The window list is cached and rescanned every
/// couple of seconds; individual windows are always queried live.
pub struct DesktopLayout {
    own_hwnd: HWND,
    size: Vec2,
    windows: Vec<Element>,
    last_scan: Option<Instant>,
}

impl DesktopLayout {
    pub fn new(window: &winit::window::Window) -> Self {
        let size = window.inner_size();
        Self {
            own_hwnd: get_hwnd(window).unwrap_or_default(),
            size: Vec2::new(size.width as f32, size.height as f32),
            windows: Vec::new(),
            last_scan: None,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.size = Vec2::new(width as f32, height as f32);
    }

    /// Re-enumerate windows if the cached list is stale. Call once per frame.
    pub fn refresh(&mut self) {
        let stale = self
            .last_scan
            .map_or(true, |t| t.elapsed().as_secs_f64() >= RESCAN_INTERVAL);
        if stale {
            self.windows = enumerate_windows(self.own_hwnd);
            self.last_scan = Some(Instant::now());
            log::trace!("Enumerated {} windows", self.windows.len());
        }
    }
}

impl LayoutOracle for DesktopLayout {
    fn viewport(&self) -> Vec2 {
        self.size
    }

    fn candidates(&self) -> Vec<Element> {
        self.windows.clone()
    }

    fn element(&self, id: ElementId) -> Option<Element> {
        query_element(id)
    }
}
