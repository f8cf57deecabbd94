//! Windows platform implementation for the overlay window
//!
//! Uses the Win32 API to create a transparent, always-on-top, full-screen
//! layered window. Click-through is driven by the `WS_EX_*` extended style
//! bits, read and written through [`WindowStyleAccess`].

use std::mem;
use std::ptr;

use tracing::{debug, info, warn};
use windows::Win32::Foundation::{
    COLORREF, HWND, LPARAM, LRESULT, POINT, SIZE, SetLastError, WIN32_ERROR, WPARAM,
};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BLENDFUNCTION, CreateCompatibleDC, CreateDIBSection,
    DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, HBITMAP, HDC, ReleaseDC, SelectObject,
    SetDIBits,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::VK_ESCAPE;
use windows::Win32::UI::WindowsAndMessaging::{
    CS_HREDRAW, CS_VREDRAW, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW,
    GWL_EXSTYLE, GetSystemMetrics, GetWindowLongPtrW, HTCLIENT, HWND_TOPMOST, IDC_ARROW,
    IsWindow, IsWindowVisible, LoadCursorW, MSG, PM_REMOVE, PeekMessageW, PostQuitMessage,
    RegisterClassExW, SM_CXSCREEN, SM_CYSCREEN, SW_SHOWNOACTIVATE, SWP_FRAMECHANGED,
    SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SetWindowLongPtrW, SetWindowPos, ShowWindow,
    TranslateMessage, ULW_ALPHA, UpdateLayeredWindow, WM_DESTROY, WM_ERASEBKGND, WM_KEYDOWN,
    WM_NCHITTEST, WM_QUIT, WNDCLASSEXW, WS_EX_LAYERED, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_POPUP,
};
use windows::core::PCWSTR;

use super::{
    ExtendedStyle, OverlayConfig, OverlayPlatform, PlatformError, WindowStyleAccess,
    replace_surface,
};

const CLASS_NAME: &str = "CrosshairOverlayClass";

/// ERROR_CLASS_ALREADY_EXISTS
const ERROR_CLASS_ALREADY_EXISTS: i32 = 1410;

/// Memory DC with a DIB section selected into it
#[derive(Default)]
struct DibSurface {
    hdc: HDC,
    hbitmap: HBITMAP,
}

impl DibSurface {
    fn create(width: u32, height: u32) -> Result<Self, PlatformError> {
        unsafe {
            let hdc_screen = GetDC(HWND::default());

            let hdc = CreateCompatibleDC(hdc_screen);
            if hdc.is_invalid() {
                ReleaseDC(HWND::default(), hdc_screen);
                return Err(PlatformError::BufferError(
                    "CreateCompatibleDC failed".to_string(),
                ));
            }

            let bmi = bitmap_info(width, height);
            let mut bits: *mut std::ffi::c_void = ptr::null_mut();
            let created = CreateDIBSection(hdc_screen, &bmi, DIB_RGB_COLORS, &mut bits, None, 0);
            ReleaseDC(HWND::default(), hdc_screen);

            let hbitmap = match created {
                Ok(hbitmap) => hbitmap,
                Err(e) => {
                    let _ = DeleteDC(hdc);
                    return Err(PlatformError::BufferError(format!(
                        "CreateDIBSection failed: {}",
                        e
                    )));
                }
            };
            SelectObject(hdc, hbitmap);

            Ok(Self { hdc, hbitmap })
        }
    }

    fn release(self) {
        unsafe {
            if !self.hdc.is_invalid() {
                let _ = DeleteDC(self.hdc);
            }
            if !self.hbitmap.is_invalid() {
                let _ = DeleteObject(self.hbitmap);
            }
        }
    }
}

fn bitmap_info(width: u32, height: u32) -> BITMAPINFO {
    BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width as i32,
            biHeight: -(height as i32), // Top-down DIB
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Windows overlay implementation
pub struct WindowsOverlay {
    hwnd: HWND,
    surface: DibSurface,
    width: u32,
    height: u32,
    pixel_data: Vec<u8>,
    bgra_buffer: Vec<u8>, // Pre-allocated buffer for RGBA->BGRA conversion
    content_dirty: bool,  // Track if pixel content changed
    size_dirty: bool,
    running: bool,
}

// NOTE: WindowsOverlay intentionally does NOT implement Send.
// Win32 HWND handles must be used from the thread that created them.
// spawn_overlay creates the window INSIDE the overlay thread.

/// Primary screen size in pixels
fn screen_size() -> (u32, u32) {
    let (w, h) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
    (w.max(1) as u32, h.max(1) as u32)
}

impl WindowsOverlay {
    fn register_class() -> Result<(), PlatformError> {
        unsafe {
            let class_name = wide_string(CLASS_NAME);
            let hinstance = GetModuleHandleW(None)
                .map_err(|e| PlatformError::Other(format!("GetModuleHandleW failed: {}", e)))?;

            let wc = WNDCLASSEXW {
                cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(window_proc),
                hInstance: hinstance.into(),
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                lpszClassName: PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };

            let atom = RegisterClassExW(&wc);
            if atom == 0 {
                // Class may already be registered, which is fine
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(ERROR_CLASS_ALREADY_EXISTS) {
                    return Err(PlatformError::Other(format!(
                        "RegisterClassExW failed: {}",
                        err
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build a surface for the new size, then swap it in.
    /// On failure the old surface and size stay in place.
    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), PlatformError> {
        replace_surface(
            &mut self.surface,
            || DibSurface::create(width, height),
            DibSurface::release,
        )?;

        self.width = width;
        self.height = height;
        let size = (width * height * 4) as usize;
        self.pixel_data.resize(size, 0);
        self.bgra_buffer.resize(size, 0);
        self.content_dirty = true;
        Ok(())
    }

    fn update_layered_window(&mut self) {
        // Skip expensive pixel operations if content hasn't changed
        if !self.content_dirty {
            return;
        }
        self.content_dirty = false;

        // RGBA -> BGRA into the pre-allocated buffer
        for (src, dst) in self
            .pixel_data
            .chunks_exact(4)
            .zip(self.bgra_buffer.chunks_exact_mut(4))
        {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
            dst[3] = src[3];
        }

        unsafe {
            let hdc_screen = GetDC(HWND::default());
            let bmi = bitmap_info(self.width, self.height);

            SetDIBits(
                self.surface.hdc,
                self.surface.hbitmap,
                0,
                self.height,
                self.bgra_buffer.as_ptr() as *const _,
                &bmi,
                DIB_RGB_COLORS,
            );

            let pt_src = POINT { x: 0, y: 0 };
            let pt_dst = POINT { x: 0, y: 0 };
            let size = SIZE {
                cx: self.width as i32,
                cy: self.height as i32,
            };
            let blend = BLENDFUNCTION {
                BlendOp: 0, // AC_SRC_OVER
                BlendFlags: 0,
                SourceConstantAlpha: 255,
                AlphaFormat: 1, // AC_SRC_ALPHA
            };

            if let Err(e) = UpdateLayeredWindow(
                self.hwnd,
                hdc_screen,
                Some(&pt_dst),
                Some(&size),
                self.surface.hdc,
                Some(&pt_src),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            ) {
                debug!(hwnd = ?self.hwnd, error = %e, "UpdateLayeredWindow failed");
            }

            ReleaseDC(HWND::default(), hdc_screen);
        }
    }

    /// Follow the primary screen size (display mode changes)
    fn track_screen_size(&mut self) {
        let (width, height) = screen_size();
        if (width, height) == (self.width, self.height) {
            return;
        }

        info!(width, height, "Screen size changed, resizing overlay");
        if let Err(e) = self.resize_surface(width, height) {
            warn!(error = %e, "Failed to recreate overlay buffer, keeping old size");
            return;
        }

        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                0,
                0,
                width as i32,
                height as i32,
                SWP_NOMOVE | SWP_NOACTIVATE,
            );
        }
        self.size_dirty = true;
    }
}

impl WindowStyleAccess for WindowsOverlay {
    fn is_ready(&self) -> bool {
        unsafe { IsWindow(self.hwnd).as_bool() && IsWindowVisible(self.hwnd).as_bool() }
    }

    fn read_style(&self) -> Result<ExtendedStyle, PlatformError> {
        unsafe {
            SetLastError(WIN32_ERROR(0));
            let value = GetWindowLongPtrW(self.hwnd, GWL_EXSTYLE);
            if value == 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(0) {
                    return Err(PlatformError::StyleQuery(format!(
                        "GetWindowLongPtrW failed: {}",
                        err
                    )));
                }
            }
            Ok(ExtendedStyle::from_bits(value as u32))
        }
    }

    fn write_style(&mut self, style: ExtendedStyle) -> Result<(), PlatformError> {
        debug!(hwnd = ?self.hwnd, %style, "Writing extended style");
        unsafe {
            // A zero return is only an error if the last-error code says so
            SetLastError(WIN32_ERROR(0));
            let previous = SetWindowLongPtrW(self.hwnd, GWL_EXSTYLE, style.bits() as isize);
            if previous == 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(0) {
                    return Err(PlatformError::StyleUpdate(format!(
                        "SetWindowLongPtrW failed: {}",
                        err
                    )));
                }
            }

            // Cached frame data only picks up the new style after SWP_FRAMECHANGED
            SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE | SWP_FRAMECHANGED,
            )
            .map_err(|e| PlatformError::StyleUpdate(format!("SetWindowPos failed: {}", e)))?;
        }
        Ok(())
    }
}

impl OverlayPlatform for WindowsOverlay {
    fn new(config: OverlayConfig) -> Result<Self, PlatformError> {
        Self::register_class()?;

        let (width, height) = config.size.unwrap_or_else(screen_size);
        debug!(namespace = %config.namespace, width, height, "Creating overlay window");

        let hwnd = unsafe {
            let class_name = wide_string(CLASS_NAME);
            let window_name = wide_string(&config.namespace);
            let hinstance = GetModuleHandleW(None)
                .map_err(|e| PlatformError::Other(format!("GetModuleHandleW failed: {}", e)))?;

            // Interactive until the click-through controller says otherwise
            let ex_style = WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW;

            CreateWindowExW(
                ex_style,
                PCWSTR(class_name.as_ptr()),
                PCWSTR(window_name.as_ptr()),
                WS_POPUP,
                0,
                0,
                width as i32,
                height as i32,
                None,
                None,
                hinstance,
                None,
            )
            .map_err(|e| PlatformError::Other(format!("CreateWindowExW failed: {}", e)))?
        };

        let surface = match DibSurface::create(width, height) {
            Ok(surface) => surface,
            Err(e) => {
                unsafe {
                    let _ = DestroyWindow(hwnd);
                }
                return Err(e);
            }
        };

        let overlay = Self {
            hwnd,
            surface,
            width,
            height,
            pixel_data: vec![0u8; (width * height * 4) as usize],
            bgra_buffer: vec![0u8; (width * height * 4) as usize],
            content_dirty: true, // Initial render needed
            size_dirty: false,
            running: true,
        };

        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
        }
        info!(hwnd = ?hwnd, width, height, "Overlay window created");

        Ok(overlay)
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn take_size_dirty(&mut self) -> bool {
        std::mem::take(&mut self.size_dirty)
    }

    fn is_interactive(&self) -> bool {
        self.read_style()
            .map(|style| !style.contains(ExtendedStyle::TRANSPARENT))
            .unwrap_or(false)
    }

    fn pixel_buffer(&mut self) -> Option<&mut [u8]> {
        self.content_dirty = true; // Assume caller will modify the buffer
        Some(&mut self.pixel_data)
    }

    fn commit(&mut self) {
        self.update_layered_window();
    }

    fn poll_events(&mut self) -> bool {
        unsafe {
            let mut msg = MSG::default();
            // Thread-wide: WM_QUIT is not addressed to the window
            while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
                match msg.message {
                    WM_QUIT => {
                        debug!(hwnd = ?self.hwnd, "Received WM_QUIT");
                        self.running = false;
                    }
                    // Only reachable while interactive; click-through windows never get focus
                    WM_KEYDOWN if msg.wParam.0 == VK_ESCAPE.0 as usize => {
                        info!("Escape pressed on overlay, closing");
                        self.running = false;
                    }
                    _ => {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }
            }

            if self.running && !IsWindow(self.hwnd).as_bool() {
                debug!(hwnd = ?self.hwnd, "Window destroyed externally");
                self.running = false;
            }
        }

        if self.running {
            self.track_screen_size();
        }
        self.running
    }
}

impl Drop for WindowsOverlay {
    fn drop(&mut self) {
        unsafe {
            mem::take(&mut self.surface).release();
            if IsWindow(self.hwnd).as_bool() {
                let _ = DestroyWindow(self.hwnd);
            }
        }
        debug!(hwnd = ?self.hwnd, "Overlay window dropped");
    }
}

/// Window procedure for the overlay window
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        // Hit-testing stays HTCLIENT; WS_EX_TRANSPARENT alone decides pass-through
        WM_NCHITTEST => LRESULT(HTCLIENT as isize),
        WM_ERASEBKGND => LRESULT(1), // Don't erase background
        WM_DESTROY => {
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

/// Convert a &str to a null-terminated wide string
fn wide_string(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
