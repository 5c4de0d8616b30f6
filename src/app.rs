use std::error::Error;
use std::sync::Arc;

use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::creature::CreatureController;
use crate::input::{InputEvent, PointerTracker};
#[cfg(not(windows))]
use crate::motion::layout::ViewportLayout;
#[cfg(windows)]
use crate::platform;
use crate::render::{GpuState, RenderError};
use crate::settings::Settings;
use crate::sprite::bird::BirdSprites;
use crate::sprite::PixelCanvas;
use crate::tray::{TrayCommand, TrayIcon};

/// Logic tick rate (seconds per tick).
const TICK_RATE: f64 = 1.0 / 60.0;
/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// How often to log FPS (seconds).
const FPS_LOG_INTERVAL: f64 = 5.0;
/// System input more recent than this counts as the user being active (seconds).
#[cfg(windows)]
const ACTIVE_IDLE_THRESHOLD: f64 = 1.0;

#[cfg(windows)]
type Layout = platform::win32::DesktopLayout;
#[cfg(not(windows))]
type Layout = ViewportLayout;

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    last_log_time: Instant,
    frame_time_sum: f64,
    frame_time_max: f64,
    frames_since_log: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            last_log_time: Instant::now(),
            frame_time_sum: 0.0,
            frame_time_max: 0.0,
            frames_since_log: 0,
        }
    }

    fn record_frame(&mut self, dt: f64, ticks: u64) {
        self.frame_count += 1;
        self.frames_since_log += 1;
        self.frame_time_sum += dt;
        self.frame_time_max = self.frame_time_max.max(dt);

        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        if elapsed >= FPS_LOG_INTERVAL {
            let avg_ms = (self.frame_time_sum / self.frames_since_log as f64) * 1000.0;
            let fps = self.frames_since_log as f64 / elapsed;
            log::debug!(
                "FPS: {:.0} | avg: {:.2}ms | max: {:.2}ms | frames: {} | ticks: {}",
                fps,
                avg_ms,
                self.frame_time_max * 1000.0,
                self.frame_count,
                ticks,
            );
            self.last_log_time = Instant::now();
            self.frame_time_sum = 0.0;
            self.frame_time_max = 0.0;
            self.frames_since_log = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Everything that only exists once the overlay window is up.
struct Overlay {
    window: Arc<Window>,
    gpu: GpuState,
    bird: CreatureController,
    canvas: PixelCanvas,
    layout: Layout,
}

/// Top-level application state.
struct App {
    settings: Settings,
    /// Moved into the bird when the overlay is created.
    sprites: Option<BirdSprites>,
    overlay: Option<Overlay>,
    tray: Option<TrayIcon>,

    // Input
    pointer: PointerTracker,
    cursor: Vec2,
    left_down: bool,
    pending: Vec<InputEvent>,

    // Fixed timestep
    clock_start: Instant,
    last_frame_time: Option<Instant>,
    accumulator: f64,
    tick_count: u64,
    frame_stats: FrameStats,

    /// Setup failure to report once the event loop returns.
    fatal: Option<RenderError>,
}

impl App {
    fn new(settings: Settings, sprites: BirdSprites) -> Self {
        Self {
            settings,
            sprites: Some(sprites),
            overlay: None,
            tray: None,
            pointer: PointerTracker::new(),
            cursor: Vec2::ZERO,
            left_down: false,
            pending: Vec::with_capacity(16),
            clock_start: Instant::now(),
            last_frame_time: None,
            accumulator: 0.0,
            tick_count: 0,
            frame_stats: FrameStats::new(),
            fatal: None,
        }
    }

    /// Milliseconds since the bird was created.
    fn now_ms(&self) -> f64 {
        self.clock_start.elapsed().as_secs_f64() * 1000.0
    }

    /// Create the overlay window, GPU state and the bird.
    fn create_overlay(
        &self,
        event_loop: &ActiveEventLoop,
        sprites: BirdSprites,
    ) -> Result<Overlay, RenderError> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or(RenderError::NoMonitor)?;
        let screen_size = monitor.size();

        // On Windows transparency comes from DxgiFromVisual + premultiplied
        // alpha; with_transparent would add WS_EX_LAYERED and break it.
        // Start hidden so DWM doesn't cache a stale frame before the overlay
        // styles are applied.
        let attrs = WindowAttributes::default()
            .with_title("Perchbird")
            .with_decorations(false)
            .with_transparent(!cfg!(windows))
            .with_visible(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(screen_size)
            .with_position(winit::dpi::PhysicalPosition::new(0, 0));

        let window = Arc::new(event_loop.create_window(attrs)?);

        #[cfg(windows)]
        platform::win32::setup_overlay(&window);

        let size = window.inner_size();
        log::info!(
            "Overlay window created: {}x{} on {:?}",
            size.width,
            size.height,
            monitor.name().unwrap_or_default()
        );

        let viewport = Vec2::new(size.width as f32, size.height as f32);
        let bird = CreatureController::new(sprites, &self.settings, viewport);
        let (canvas_w, canvas_h) = bird.canvas_size();
        let canvas = PixelCanvas::new(canvas_w, canvas_h);

        let gpu = GpuState::new(window.clone(), canvas_w, canvas_h)?;
        log::info!("wgpu + sprite pipeline initialized");

        #[cfg(windows)]
        let layout = platform::win32::DesktopLayout::new(&window);
        #[cfg(not(windows))]
        let layout = ViewportLayout { size: viewport };

        Ok(Overlay {
            window,
            gpu,
            bird,
            canvas,
            layout,
        })
    }

    /// Poll pointer and idle state, queue the resulting events.
    fn poll_input(&mut self) {
        let Some(overlay) = &self.overlay else {
            return;
        };

        #[cfg(windows)]
        {
            self.cursor = platform::win32::get_mouse_pos();
            self.left_down = platform::win32::is_left_button_down();
            if platform::win32::get_idle_time() < ACTIVE_IDLE_THRESHOLD {
                self.pending.push(InputEvent::Activity);
            }
        }

        let over_bird = overlay.bird.hit_test(self.cursor);
        self.pointer
            .update(self.cursor, self.left_down, over_bird, &mut self.pending);
    }

    /// Apply tray commands. Returns false when the user asked to quit.
    fn handle_tray(&mut self) -> bool {
        let Some(tray) = &mut self.tray else {
            return true;
        };
        let Some(overlay) = &self.overlay else {
            return true;
        };
        match tray.poll() {
            TrayCommand::None => {}
            TrayCommand::Quit => {
                log::info!("Quit from tray");
                return false;
            }
            TrayCommand::ToggleVisible => self.pending.push(InputEvent::ToggleVisible),
            TrayCommand::NextVariant => {
                let next = overlay.bird.variant().next_in_catalog();
                self.pending.push(InputEvent::SetVariant(next));
            }
        }
        true
    }

    /// Clicking the bird opens the tray menu. The bird runs a logic tick with
    /// the menu open before the blocking call, and hears it close afterwards.
    fn open_menu_on_click(&mut self) {
        if !self.pending.contains(&InputEvent::Click) {
            return;
        }
        let now = self.now_ms();
        let (Some(tray), Some(overlay)) = (&self.tray, &mut self.overlay) else {
            return;
        };

        for event in self.pending.drain(..) {
            overlay.bird.push_input(event);
        }
        overlay.bird.push_input(InputEvent::MenuOpened);
        overlay.bird.logic_tick(now, &overlay.layout);

        tray.show_menu();
        self.pending.push(InputEvent::MenuClosed);
    }

    /// Run fixed-timestep logic ticks for `dt` seconds of wall time.
    fn run_fixed_update(&mut self, dt: f64) {
        self.accumulator = (self.accumulator + dt).min(MAX_ACCUMULATOR);
        let now = self.now_ms();

        let Some(overlay) = &mut self.overlay else {
            return;
        };
        for event in self.pending.drain(..) {
            overlay.bird.push_input(event);
        }

        while self.accumulator >= TICK_RATE {
            overlay.bird.logic_tick(now, &overlay.layout);
            self.accumulator -= TICK_RATE;
            self.tick_count += 1;
        }
    }

    /// Paint the bird and present the frame.
    fn paint(&mut self) {
        let now = self.now_ms();
        let Some(overlay) = &mut self.overlay else {
            return;
        };

        #[cfg(windows)]
        overlay.layout.refresh();

        let placement = overlay
            .bird
            .paint_tick(now, &overlay.layout, &mut overlay.canvas);
        if overlay.canvas.take_dirty() {
            overlay.gpu.upload_canvas(overlay.canvas.as_bytes());
        }
        overlay.gpu.render_frame(placement);

        if let Some(tray) = &self.tray {
            tray.set_bird_visible(overlay.bird.is_visible());
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Sprites are consumed by the first (and only) overlay
        let Some(sprites) = self.sprites.take() else {
            return;
        };

        let overlay = match self.create_overlay(event_loop, sprites) {
            Ok(overlay) => overlay,
            Err(e) => {
                self.fatal = Some(e);
                event_loop.exit();
                return;
            }
        };

        self.tray = TrayIcon::new();

        // Continuous loop, the bird is always animating
        event_loop.set_control_flow(ControlFlow::Poll);

        // Show window now that all styles and GPU resources are ready.
        overlay.window.set_visible(true);
        self.clock_start = Instant::now();
        self.overlay = Some(overlay);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(overlay) = &self.overlay {
            overlay.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(overlay) = &mut self.overlay {
                    overlay.gpu.resize(new_size.width, new_size.height);
                    #[cfg(windows)]
                    overlay.layout.set_viewport(new_size.width, new_size.height);
                    #[cfg(not(windows))]
                    {
                        overlay.layout.size = Vec2::new(new_size.width as f32, new_size.height as f32);
                    }
                }
            }
            // Only reach us where the overlay is not click-through.
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.left_down = state == ElementState::Pressed;
            }
            WindowEvent::Touch(touch) => {
                let point = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                let on_bird = self
                    .overlay
                    .as_ref()
                    .is_some_and(|o| o.bird.hit_test(point));
                if touch.phase == TouchPhase::Started && on_bird {
                    self.pending.push(InputEvent::Touch);
                }
            }
            WindowEvent::KeyboardInput { .. } => self.pending.push(InputEvent::Activity),
            WindowEvent::RedrawRequested => {
                let frame_start = Instant::now();
                let dt = self
                    .last_frame_time
                    .map_or(0.0, |last| frame_start.duration_since(last).as_secs_f64());
                self.last_frame_time = Some(frame_start);
                self.frame_stats.record_frame(dt, self.tick_count);

                self.poll_input();
                if !self.handle_tray() {
                    event_loop.exit();
                    return;
                }
                self.open_menu_on_click();
                self.run_fixed_update(dt);
                self.paint();
            }
            _ => {}
        }
    }
}

/// Entry point: load sprites, create the event loop and run.
pub fn run(settings: Settings) -> Result<(), Box<dyn Error>> {
    let sprites = match &settings.sheet {
        Some(path) => {
            log::info!("Loading sprite sheet from {}", path.display());
            BirdSprites::open(path)?
        }
        None => BirdSprites::bundled()?,
    };
    log::info!(
        "Starting as {} ({}), accent #{:08X}, pixel size {}",
        settings.variant.name,
        settings.variant.description,
        settings.variant.theme_accent(),
        settings.pixel_size
    );

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings, sprites);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
