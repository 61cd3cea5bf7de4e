//! Window host: winit event loop and vello rendering for the board.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use vello::util::{RenderContext, RenderSurface};
use vello::wgpu;
use vello::{AaConfig, Renderer, RendererOptions, Scene};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window};

use crate::board::Board;
use crate::config_watcher::ConfigWatcher;
use crate::fit::BoxSize;
use crate::intro::Intro;
use crate::render::BoardPainter;
use crate::text::ParleyMeasurer;

#[derive(Debug)]
enum RenderState {
    Active {
        surface: Box<RenderSurface<'static>>,
        valid_surface: bool,
        window: Arc<Window>,
    },
    Suspended(Option<Arc<Window>>),
}

pub struct App {
    context: RenderContext,
    renderers: Vec<Option<Renderer>>,
    state: RenderState,
    scene: Scene,
    start_time: Instant,
    windowed: bool,
    board: Board,
    painter: BoardPainter,
    measurer: ParleyMeasurer,
    intro: Option<Intro>,
    watcher: Option<ConfigWatcher>,
    cursor: (f64, f64),
}

impl App {
    pub fn new(board: Board, watcher: Option<ConfigWatcher>, windowed: bool) -> Self {
        let intro = (board.config().intro.enabled && !board.session().intro_shown())
            .then(|| Intro::new(&board.config().intro));
        Self {
            context: RenderContext::new(),
            renderers: vec![],
            state: RenderState::Suspended(None),
            scene: Scene::new(),
            start_time: Instant::now(),
            windowed,
            board,
            painter: BoardPainter::new(),
            measurer: ParleyMeasurer::new(),
            intro,
            watcher,
            cursor: (0.0, 0.0),
        }
    }

    fn handle_click(&mut self) {
        if let Some(intro) = self.intro.as_mut() {
            intro.skip();
            return;
        }
        let (x, y) = self.cursor;
        if let Some(id) = self.board.card_at(x, y) {
            self.board.click(id, Instant::now());
        }
    }

    fn poll_config(&mut self) {
        let Some(config) = self.watcher.as_ref().and_then(ConfigWatcher::poll) else {
            return;
        };
        if let Err(e) = self.board.apply_config(config, Instant::now()) {
            warn!(target: "config", "rejected reloaded config: {e}");
        }
    }

    /// Advance the board and build this frame's scene.
    fn build_scene(&mut self, width: f64, height: f64) {
        let now = Instant::now();
        self.poll_config();
        self.board.tick(now, &mut self.measurer);

        self.scene.reset();
        self.painter
            .paint_board(&mut self.scene, &self.board, (width, height), now, self.measurer.ctx());

        let elapsed = self.start_time.elapsed().as_secs_f64();
        if let Some(intro) = self.intro.as_mut() {
            if intro.is_finished(elapsed) {
                self.intro = None;
                self.board.session_mut().mark_intro_shown();
                info!(target: "app", "intro finished");
            } else {
                let alpha = intro.alpha(elapsed);
                let config = self.board.config();
                self.painter.paint_intro(
                    &mut self.scene,
                    (width, height),
                    alpha,
                    &config.intro,
                    &config.palette,
                    self.measurer.ctx(),
                );
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let RenderState::Suspended(cached_window) = &mut self.state else {
            return;
        };

        let window = match cached_window.take() {
            Some(window) => window,
            None => match create_window(event_loop, self.windowed) {
                Ok(window) => window,
                Err(e) => {
                    error!(target: "app", "failed to create window: {e}");
                    event_loop.exit();
                    return;
                }
            },
        };

        let size = window.inner_size();
        let surface_future = self.context.create_surface(
            window.clone(),
            size.width,
            size.height,
            wgpu::PresentMode::AutoVsync,
        );
        let surface = match pollster::block_on(surface_future) {
            Ok(surface) => surface,
            Err(e) => {
                error!(target: "app", "failed to create surface: {e}");
                event_loop.exit();
                return;
            }
        };

        self.renderers
            .resize_with(self.context.devices.len(), || None);
        if self.renderers[surface.dev_id].is_none() {
            match create_renderer(&self.context, &surface) {
                Ok(renderer) => self.renderers[surface.dev_id] = Some(renderer),
                Err(e) => {
                    error!(target: "app", "failed to create renderer: {e}");
                    event_loop.exit();
                    return;
                }
            }
        }

        self.board.layout(
            BoxSize::new(size.width as f32, size.height as f32),
            Instant::now(),
        );

        self.state = RenderState::Active {
            surface: Box::new(surface),
            valid_surface: true,
            window,
        };
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let RenderState::Active { window, .. } = &self.state {
            self.state = RenderState::Suspended(Some(window.clone()));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (surface, valid_surface, window) = match &mut self.state {
            RenderState::Active {
                surface,
                valid_surface,
                window,
            } if window.id() == window_id => (surface, valid_surface, window.clone()),
            _ => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
            }

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.handle_click(),

            WindowEvent::Resized(size) => {
                if size.width != 0 && size.height != 0 {
                    self.context
                        .resize_surface(surface, size.width, size.height);
                    *valid_surface = true;
                } else {
                    *valid_surface = false;
                }
                self.board.layout(
                    BoxSize::new(size.width as f32, size.height as f32),
                    Instant::now(),
                );
            }

            WindowEvent::RedrawRequested => {
                if !*valid_surface {
                    return;
                }

                let width = surface.config.width;
                let height = surface.config.height;
                let dev_id = surface.dev_id;

                self.build_scene(width as f64, height as f64);

                // Re-borrow after `build_scene` took `&mut self`.
                let RenderState::Active { surface, .. } = &mut self.state else {
                    return;
                };
                let device_handle = &self.context.devices[dev_id];
                let Some(renderer) = self.renderers[dev_id].as_mut() else {
                    return;
                };

                let background = self.board.config().palette.background.color();
                if let Err(e) = renderer.render_to_texture(
                    &device_handle.device,
                    &device_handle.queue,
                    &self.scene,
                    &surface.target_view,
                    &vello::RenderParams {
                        base_color: background,
                        width,
                        height,
                        antialiasing_method: AaConfig::Msaa16,
                    },
                ) {
                    error!(target: "app", "render failed: {e}");
                    return;
                }

                let surface_texture = match surface.surface.get_current_texture() {
                    Ok(texture) => texture,
                    Err(e) => {
                        warn!(target: "app", "failed to get surface texture: {e}");
                        return;
                    }
                };

                let mut encoder =
                    device_handle
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Surface Blit"),
                        });
                surface.blitter.copy(
                    &device_handle.device,
                    &mut encoder,
                    &surface.target_view,
                    &surface_texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default()),
                );
                device_handle.queue.submit([encoder.finish()]);
                surface_texture.present();
                if let Err(e) = device_handle.device.poll(wgpu::PollType::Poll) {
                    warn!(target: "app", "device poll failed: {e}");
                }

                // Keep animating: tweens, reveals and the intro run off the clock.
                window.request_redraw();
            }

            _ => {}
        }
    }
}

fn create_window(
    event_loop: &ActiveEventLoop,
    windowed: bool,
) -> Result<Arc<Window>, winit::error::OsError> {
    let mut attr = Window::default_attributes().with_title("advice-board");

    if !windowed {
        attr = attr.with_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        attr = attr.with_inner_size(winit::dpi::LogicalSize::new(1280, 800));
    }

    Ok(Arc::new(event_loop.create_window(attr)?))
}

fn create_renderer(
    render_cx: &RenderContext,
    surface: &RenderSurface<'_>,
) -> Result<Renderer, vello::Error> {
    Renderer::new(
        &render_cx.devices[surface.dev_id].device,
        RendererOptions::default(),
    )
}
