//! X11 platform implementation for the overlay window
//!
//! Uses XCB via x11rb for a transparent, always-on-top, full-screen overlay.
//! Requires a compositor for transparency.
//!
//! X11 has no extended style word, so each [`ExtendedStyle`] bit is kept in
//! the server-side state that expresses it:
//!
//! | bit           | X11 state                                    |
//! |---------------|----------------------------------------------|
//! | `TRANSPARENT` | empty SHAPE input region                     |
//! | `NO_ACTIVATE` | `WM_HINTS` input field set to false          |
//! | `TOOL_WINDOW` | `_NET_WM_STATE_SKIP_TASKBAR` / `SKIP_PAGER`  |
//! | `LAYERED`     | always set (32-bit ARGB visual)              |
//!
//! Reading the style queries the server, so a reset done by another client
//! shows up on the next read.

use std::cell::Cell;
use std::fs::File;
use std::os::fd::AsFd;

use rustix::fs::{MemfdFlags, memfd_create};
use rustix::mm::{MapFlags, ProtFlags, mmap};
use tracing::{debug, info, warn};
use x11rb::atom_manager;
use x11rb::connection::Connection;
use x11rb::protocol::shape::{self, ConnectionExt as _};
use x11rb::protocol::shm::{self, ConnectionExt as _};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::{
    ExtendedStyle, OverlayConfig, OverlayPlatform, PlatformError, WindowStyleAccess,
    replace_surface,
};

// Atoms needed for EWMH hints
atom_manager! {
    pub AtomCollection: AtomCollectionCookie {
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_STATE,
        _NET_WM_STATE_ABOVE,
        _NET_WM_STATE_SKIP_TASKBAR,
        _NET_WM_STATE_SKIP_PAGER,
        ATOM,
    }
}

/// `WM_HINTS` is nine 32-bit words; flag bit 0 marks the input field valid
const WM_HINTS_LEN: u32 = 9;
const WM_HINTS_INPUT_FLAG: u32 = 1;

/// SHM buffer for efficient pixel transfer
struct ShmBuffer {
    seg_id: shm::Seg,
    ptr: *mut u8,
    size: usize,
}

pub struct X11Overlay {
    conn: RustConnection,
    window: Window,
    root: Window,
    gc: Gcontext,
    atoms: AtomCollection,
    width: u32,
    height: u32,
    depth: u8,

    // Pixel buffers
    pixel_data: Vec<u8>, // RGBA from renderer
    shm_buffer: ShmBuffer,

    mapped: bool,
    size_dirty: bool,
    /// Last input-transparency seen on the server
    input_transparent: Cell<bool>,
    running: bool,
}

fn query_err(e: impl std::fmt::Display) -> PlatformError {
    PlatformError::StyleQuery(e.to_string())
}

fn update_err(e: impl std::fmt::Display) -> PlatformError {
    PlatformError::StyleUpdate(e.to_string())
}

impl X11Overlay {
    /// Find a 32-bit ARGB visual for transparency
    fn find_argb_visual(screen: &Screen) -> Option<(Visualid, u8)> {
        for depth in &screen.allowed_depths {
            if depth.depth == 32 {
                for visual in &depth.visuals {
                    if visual.class == VisualClass::TRUE_COLOR {
                        return Some((visual.visual_id, depth.depth));
                    }
                }
            }
        }
        None
    }

    /// Create a shared memory buffer for efficient pixel transfer
    fn create_shm_buffer(
        conn: &RustConnection,
        width: u32,
        height: u32,
    ) -> Result<ShmBuffer, PlatformError> {
        let size = (width * height * 4) as usize;

        // Create anonymous shared memory
        let fd = memfd_create(c"crosshair-x11-buffer", MemfdFlags::CLOEXEC)
            .map_err(|e| PlatformError::BufferError(format!("memfd_create failed: {}", e)))?;

        rustix::fs::ftruncate(&fd, size as u64)
            .map_err(|e| PlatformError::BufferError(format!("ftruncate failed: {}", e)))?;

        // Memory map it
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                fd.as_fd(),
                0,
            )
            .map_err(|e| PlatformError::BufferError(format!("mmap failed: {}", e)))?
        };

        // Attach to X server
        let seg_id = conn
            .generate_id()
            .map_err(|e| PlatformError::BufferError(e.to_string()))?;

        // x11rb shm_attach_fd takes ownership of the fd
        let file = File::from(fd);
        if let Err(e) = conn.shm_attach_fd(seg_id, file, false) {
            unsafe {
                rustix::mm::munmap(ptr, size).ok();
            }
            return Err(PlatformError::BufferError(format!(
                "shm_attach_fd failed: {}",
                e
            )));
        }

        Ok(ShmBuffer {
            seg_id,
            ptr: ptr as *mut u8,
            size,
        })
    }

    fn release_shm_buffer(conn: &RustConnection, buffer: &ShmBuffer) {
        let _ = conn.shm_detach(buffer.seg_id);
        unsafe {
            rustix::mm::munmap(buffer.ptr as *mut _, buffer.size).ok();
        }
    }

    /// Build an SHM buffer for the new size, then swap it in.
    /// On failure the old buffer and size stay in place.
    fn resize_shm_buffer(&mut self, width: u32, height: u32) -> Result<(), PlatformError> {
        let conn = &self.conn;
        replace_surface(
            &mut self.shm_buffer,
            || Self::create_shm_buffer(conn, width, height),
            |old| Self::release_shm_buffer(conn, &old),
        )?;

        self.width = width;
        self.height = height;
        self.pixel_data.resize((width * height * 4) as usize, 0);
        Ok(())
    }

    /// Window type, title and class so compositors and WM rules can find it
    fn setup_window_hints(&self, namespace: &str) -> Result<(), PlatformError> {
        // Window type: dock (stays on top, no decorations)
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                self.atoms._NET_WM_WINDOW_TYPE,
                self.atoms.ATOM,
                &[self.atoms._NET_WM_WINDOW_TYPE_DOCK],
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.window,
                AtomEnum::WM_NAME,
                AtomEnum::STRING,
                namespace.as_bytes(),
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        // WM_CLASS is instance\0class\0
        let class = format!("{0}\0{0}\0", namespace);
        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.window,
                AtomEnum::WM_CLASS,
                AtomEnum::STRING,
                class.as_bytes(),
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        Ok(())
    }

    fn read_input_transparent(&self) -> Result<bool, PlatformError> {
        let reply = self
            .conn
            .shape_get_rectangles(self.window, shape::SK::INPUT)
            .map_err(query_err)?
            .reply()
            .map_err(query_err)?;
        Ok(reply.rectangles.is_empty())
    }

    fn read_no_activate(&self) -> Result<bool, PlatformError> {
        let reply = self
            .conn
            .get_property(
                false,
                self.window,
                AtomEnum::WM_HINTS,
                AtomEnum::WM_HINTS,
                0,
                WM_HINTS_LEN,
            )
            .map_err(query_err)?
            .reply()
            .map_err(query_err)?;

        let words: Vec<u32> = reply.value32().map(|v| v.collect()).unwrap_or_default();
        Ok(match words.as_slice() {
            [flags, input, ..] => flags & WM_HINTS_INPUT_FLAG != 0 && *input == 0,
            _ => false,
        })
    }

    fn read_skip_taskbar(&self) -> Result<bool, PlatformError> {
        let reply = self
            .conn
            .get_property(
                false,
                self.window,
                self.atoms._NET_WM_STATE,
                AtomEnum::ATOM,
                0,
                32,
            )
            .map_err(query_err)?
            .reply()
            .map_err(query_err)?;

        let skip = reply
            .value32()
            .map(|mut atoms| atoms.any(|a| a == self.atoms._NET_WM_STATE_SKIP_TASKBAR))
            .unwrap_or(false);
        Ok(skip)
    }

    fn write_input_shape(&self, transparent: bool) -> Result<(), PlatformError> {
        let full = [Rectangle {
            x: 0,
            y: 0,
            width: self.width as u16,
            height: self.height as u16,
        }];
        // Empty input region - clicks pass through
        let rects: &[Rectangle] = if transparent { &[] } else { &full };

        self.conn
            .shape_rectangles(
                shape::SO::SET,
                shape::SK::INPUT,
                ClipOrdering::UNSORTED,
                self.window,
                0,
                0,
                rects,
            )
            .map_err(update_err)?
            .check()
            .map_err(update_err)?;
        self.input_transparent.set(transparent);
        Ok(())
    }

    fn write_no_activate(&self, no_activate: bool) -> Result<(), PlatformError> {
        let mut hints = [0u32; WM_HINTS_LEN as usize];
        hints[0] = WM_HINTS_INPUT_FLAG;
        hints[1] = u32::from(!no_activate);

        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                AtomEnum::WM_HINTS,
                AtomEnum::WM_HINTS,
                &hints,
            )
            .map_err(update_err)?
            .check()
            .map_err(update_err)
    }

    fn write_wm_state(&self, skip_taskbar: bool) -> Result<(), PlatformError> {
        let mut state = vec![self.atoms._NET_WM_STATE_ABOVE];
        if skip_taskbar {
            state.push(self.atoms._NET_WM_STATE_SKIP_TASKBAR);
            state.push(self.atoms._NET_WM_STATE_SKIP_PAGER);
        }

        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                self.atoms._NET_WM_STATE,
                self.atoms.ATOM,
                &state,
            )
            .map_err(update_err)?
            .check()
            .map_err(update_err)
    }

    fn resize_to(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }

        info!(width, height, "Screen size changed, resizing overlay");
        if let Err(e) = self.resize_shm_buffer(width, height) {
            warn!(error = %e, "Failed to recreate overlay buffer, keeping old size");
            return;
        }

        let _ = self.conn.configure_window(
            self.window,
            &ConfigureWindowAux::new().width(width).height(height),
        );

        // A full-window input region must grow with the window
        if !self.input_transparent.get() {
            if let Err(e) = self.write_input_shape(false) {
                warn!(error = %e, "Failed to resize input region");
            }
        }

        let _ = self.conn.flush();
        self.size_dirty = true;
    }
}

impl WindowStyleAccess for X11Overlay {
    fn is_ready(&self) -> bool {
        self.mapped && self.running
    }

    fn read_style(&self) -> Result<ExtendedStyle, PlatformError> {
        let mut style = ExtendedStyle::LAYERED;

        let transparent = self.read_input_transparent()?;
        self.input_transparent.set(transparent);
        if transparent {
            style |= ExtendedStyle::TRANSPARENT;
        }
        if self.read_no_activate()? {
            style |= ExtendedStyle::NO_ACTIVATE;
        }
        if self.read_skip_taskbar()? {
            style |= ExtendedStyle::TOOL_WINDOW;
        }
        Ok(style)
    }

    fn write_style(&mut self, style: ExtendedStyle) -> Result<(), PlatformError> {
        debug!(window = self.window, %style, "Writing extended style");
        self.write_input_shape(style.contains(ExtendedStyle::TRANSPARENT))?;
        self.write_no_activate(style.contains(ExtendedStyle::NO_ACTIVATE))?;
        self.write_wm_state(style.contains(ExtendedStyle::TOOL_WINDOW))?;
        self.conn.flush().map_err(update_err)
    }
}

impl OverlayPlatform for X11Overlay {
    fn new(config: OverlayConfig) -> Result<Self, PlatformError> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;

        // Intern atoms
        let atoms = AtomCollection::new(&conn)
            .map_err(|e| PlatformError::Other(e.to_string()))?
            .reply()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let setup = conn.setup();
        let screen = &setup.roots[screen_num];
        let root = screen.root;
        let (width, height) = config.size.unwrap_or((
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        ));

        // Check for required extensions
        conn.shape_query_version()
            .map_err(|_| PlatformError::UnsupportedFeature("Shape extension".into()))?
            .reply()
            .map_err(|_| PlatformError::UnsupportedFeature("Shape extension".into()))?;

        conn.shm_query_version()
            .map_err(|_| PlatformError::UnsupportedFeature("SHM extension".into()))?
            .reply()
            .map_err(|_| PlatformError::UnsupportedFeature("SHM extension".into()))?;

        // Find 32-bit visual for transparency
        let (visual, depth) = Self::find_argb_visual(screen)
            .ok_or_else(|| PlatformError::UnsupportedFeature("32-bit ARGB visual".into()))?;

        // Create colormap for 32-bit visual
        let colormap = conn
            .generate_id()
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        conn.create_colormap(ColormapAlloc::NONE, colormap, root, visual)
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        // Root size changes arrive as ConfigureNotify on the root window
        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
        )
        .map_err(|e| PlatformError::Other(e.to_string()))?;

        let window = conn
            .generate_id()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let win_aux = CreateWindowAux::new()
            .background_pixel(0)
            .border_pixel(0)
            .colormap(colormap)
            .event_mask(EventMask::EXPOSURE | EventMask::STRUCTURE_NOTIFY)
            .override_redirect(1);

        conn.create_window(
            depth,
            window,
            root,
            0,
            0,
            width as u16,
            height as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            visual,
            &win_aux,
        )
        .map_err(|e| PlatformError::Other(e.to_string()))?;

        // Create graphics context
        let gc = conn
            .generate_id()
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        conn.create_gc(gc, window, &CreateGCAux::new())
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let shm_buffer = Self::create_shm_buffer(&conn, width, height)?;

        let overlay = Self {
            conn,
            window,
            root,
            gc,
            atoms,
            width,
            height,
            depth,
            pixel_data: vec![0u8; (width * height * 4) as usize],
            shm_buffer,
            mapped: false,
            size_dirty: false,
            input_transparent: Cell::new(false),
            running: true,
        };

        overlay.setup_window_hints(&config.namespace)?;
        // Interactive until the click-through controller says otherwise
        overlay.write_wm_state(true)?;

        overlay
            .conn
            .map_window(window)
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        overlay
            .conn
            .flush()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        info!(window, width, height, "Overlay window created");
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
        !self.input_transparent.get()
    }

    fn pixel_buffer(&mut self) -> Option<&mut [u8]> {
        Some(&mut self.pixel_data)
    }

    fn commit(&mut self) {
        // Convert RGBA to BGRA directly into SHM buffer
        let shm_slice =
            unsafe { std::slice::from_raw_parts_mut(self.shm_buffer.ptr, self.shm_buffer.size) };

        for (src, dst) in self.pixel_data.chunks_exact(4).zip(shm_slice.chunks_exact_mut(4)) {
            dst[0] = src[2]; // B
            dst[1] = src[1]; // G
            dst[2] = src[0]; // R
            dst[3] = src[3]; // A
        }

        let _ = self.conn.shm_put_image(
            self.window,
            self.gc,
            self.width as u16,
            self.height as u16,
            0,
            0,
            self.width as u16,
            self.height as u16,
            0,
            0,
            self.depth,
            ImageFormat::Z_PIXMAP.into(),
            false,
            self.shm_buffer.seg_id,
            0,
        );
        let _ = self.conn.flush();
    }

    fn poll_events(&mut self) -> bool {
        let mut root_size = None;

        while let Ok(Some(event)) = self.conn.poll_for_event() {
            match event {
                x11rb::protocol::Event::MapNotify(e) if e.window == self.window => {
                    debug!(window = self.window, "Overlay mapped");
                    self.mapped = true;
                }
                x11rb::protocol::Event::UnmapNotify(e) if e.window == self.window => {
                    debug!(window = self.window, "Overlay unmapped");
                    self.mapped = false;
                }
                x11rb::protocol::Event::ConfigureNotify(e) if e.window == self.root => {
                    root_size = Some((u32::from(e.width), u32::from(e.height)));
                }
                // Contents committed before the first map are lost; ask for a repaint
                x11rb::protocol::Event::Expose(e) if e.window == self.window && e.count == 0 => {
                    self.size_dirty = true;
                }
                x11rb::protocol::Event::DestroyNotify(e) if e.window == self.window => {
                    self.running = false;
                    return false;
                }
                _ => {}
            }
        }

        if let Some((width, height)) = root_size {
            self.resize_to(width, height);
        }
        self.running
    }
}

impl Drop for X11Overlay {
    fn drop(&mut self) {
        Self::release_shm_buffer(&self.conn, &self.shm_buffer);
        let _ = self.conn.destroy_window(self.window);
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.flush();
    }
}
