//! Terminal host for the viewport
//!
//! Each terminal cell shows two vertical pixels of the software framebuffer
//! using an upper half block (foreground = top pixel, background = bottom
//! pixel). The last row is a status line.

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::backend::{GraphicsBackend, Rgba};
use crate::capabilities::Capabilities;
use crate::config::ViewerConfig;
use crate::cube::CubeModel;
use crate::interaction::{InteractionMode, Modifiers, PointerButton};
use crate::raster::SoftwareBackend;
use crate::scene::{ModelId, SharedModel};
use crate::viewport::{Viewport, ViewportEvent};

/// Wheel units reported for one scroll step
const WHEEL_NOTCH: f32 = 120.0;
/// Degrees per frame for cubes toggled into spinning
const SPIN_STEP: f32 = 3.0;
const DEMO_CUBE_SIZE: f32 = 30.0;
const UPPER_HALF_BLOCK: char = '\u{2580}';

/// Whether the host loop keeps running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Framebuffer size for a terminal of `columns` x `rows` cells
pub fn surface_size(columns: u16, rows: u16) -> (u32, u32) {
    (columns as u32, rows.saturating_sub(1) as u32 * 2)
}

/// Framebuffer position at the centre of a terminal cell
pub fn cell_to_pixel(column: u16, row: u16) -> (f32, f32) {
    (column as f32 + 0.5, row as f32 * 2.0 + 1.0)
}

pub fn translate_modifiers(modifiers: KeyModifiers) -> Modifiers {
    Modifiers {
        shift: modifiers.contains(KeyModifiers::SHIFT),
        control: modifiers.contains(KeyModifiers::CONTROL),
        alt: modifiers.contains(KeyModifiers::ALT),
    }
}

pub fn translate_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
    }
}

/// Toolbar shortcuts
pub fn mode_for_key(key: char) -> Option<InteractionMode> {
    match key {
        '1' => Some(InteractionMode::Orbit),
        '2' => Some(InteractionMode::PanEye),
        '3' => Some(InteractionMode::PanTarget),
        '4' => Some(InteractionMode::Dolly),
        '5' => Some(InteractionMode::MoveObject),
        _ => None,
    }
}

fn terminal_color(color: Rgba) -> Color {
    Color::Rgb {
        r: color.0,
        g: color.1,
        b: color.2,
    }
}

/// Demo cubes spread across the middle of the bed
fn demo_cubes(config: &ViewerConfig, count: usize) -> Vec<Rc<RefCell<CubeModel>>> {
    let volume = &config.volume;
    let size = DEMO_CUBE_SIZE.min(volume.width / (count as f32 + 1.0));
    (0..count)
        .map(|i| {
            let x = volume.width * (i as f32 + 1.0) / (count as f32 + 1.0);
            Rc::new(RefCell::new(CubeModel::new(x, volume.depth * 0.5, size)))
        })
        .collect()
}

/// Viewport plus the scene it shows and the host-side selection state
pub struct TerminalHost {
    viewport: Viewport<SoftwareBackend>,
    cubes: Vec<(ModelId, Rc<RefCell<CubeModel>>)>,
    selected: Option<ModelId>,
    editor: bool,
}

impl TerminalHost {
    pub fn new(
        backend: SoftwareBackend,
        config: ViewerConfig,
        capabilities: Capabilities,
        cube_count: usize,
    ) -> Self {
        let cubes_to_add = demo_cubes(&config, cube_count);
        let mut viewport = Viewport::new(backend, config, capabilities);
        let cubes = cubes_to_add
            .into_iter()
            .map(|cube| {
                let shared: SharedModel = cube.clone();
                (viewport.add_model(&shared), cube)
            })
            .collect();

        Self {
            viewport,
            cubes,
            selected: None,
            editor: false,
        }
    }

    pub fn viewport(&self) -> &Viewport<SoftwareBackend> {
        &self.viewport
    }

    pub fn selected(&self) -> Option<ModelId> {
        self.selected
    }

    pub fn cube(&self, id: ModelId) -> Option<&Rc<RefCell<CubeModel>>> {
        self.cubes
            .iter()
            .find(|(cube_id, _)| *cube_id == id)
            .map(|(_, cube)| cube)
    }

    pub fn handle_event(&mut self, event: Event) -> Flow {
        match event {
            Event::Key(key) => return self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => {
                let (width, height) = surface_size(columns, rows);
                self.viewport.resize(width, height);
            }
            _ => {}
        }
        Flow::Continue
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('=') => {
                self.viewport.key_press('+');
            }
            KeyCode::Char(c @ ('+' | '-')) => {
                self.viewport.key_press(c);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.viewport.reset_view(),
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.editor = !self.editor;
                self.viewport.set_editor(self.editor);
                tracing::info!(editor = self.editor, "Editor toggled");
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if let Err(error) = self.viewport.clear_scene() {
                    tracing::warn!(%error, "Scene not cleared");
                }
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                let enabled = !self.viewport.auto_update();
                self.viewport.set_auto_update(enabled);
            }
            KeyCode::Char('a') | KeyCode::Char('A') => self.toggle_spin(),
            KeyCode::Char(c) => {
                if let Some(mode) = mode_for_key(c) {
                    self.viewport.set_mode(mode);
                }
            }
            _ => {}
        }
        Flow::Continue
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (x, y) = cell_to_pixel(mouse.column, mouse.row);
        let modifiers = translate_modifiers(mouse.modifiers);
        match mouse.kind {
            MouseEventKind::Down(button) => {
                self.viewport.pointer_move(x, y, modifiers);
                self.viewport
                    .pointer_down(x, y, translate_button(button), modifiers);
            }
            MouseEventKind::Drag(_) | MouseEventKind::Moved => {
                self.viewport.pointer_move(x, y, modifiers)
            }
            MouseEventKind::Up(_) => self.viewport.pointer_up(),
            MouseEventKind::ScrollUp => self.viewport.wheel(WHEEL_NOTCH),
            MouseEventKind::ScrollDown => self.viewport.wheel(-WHEEL_NOTCH),
            _ => {}
        }
    }

    /// Start or stop spinning the selected cube
    fn toggle_spin(&mut self) {
        let Some(cube) = self.selected.and_then(|id| self.cube(id)) else {
            return;
        };
        let mut cube = cube.borrow_mut();
        let spin = if cube.is_spinning() {
            None
        } else {
            Some(SPIN_STEP)
        };
        cube.set_spin(spin);
    }

    /// Run one scheduler tick and apply the resulting notifications.
    /// Returns true when a new frame is ready to show.
    pub fn tick(&mut self, now: Instant) -> bool {
        let presented = self.viewport.tick(now);
        for event in self.viewport.take_events() {
            match event {
                ViewportEvent::ObjectSelected(id) => {
                    self.selected = Some(id);
                    self.viewport.set_object_selected(true);
                    tracing::info!(?id, "Object selected");
                }
                ViewportEvent::ObjectMoved { dx, dy } if dx == 0.0 && dy == 0.0 => {}
                ViewportEvent::ObjectMoved { dx, dy } => {
                    if let Some(cube) = self.selected.and_then(|id| self.cube(id)) {
                        cube.borrow_mut().translate(dx, dy);
                    }
                }
            }
        }
        presented
    }

    pub fn status_line(&self) -> String {
        let fps = self
            .viewport
            .scheduler()
            .last_fps()
            .map(|fps| format!("{:.0} FPS", fps.min(9999.0)))
            .unwrap_or_else(|| "-- FPS".to_string());
        let selected = self
            .selected
            .and_then(|id| self.cubes.iter().position(|(cube_id, _)| *cube_id == id))
            .map(|index| format!("cube {}", index + 1))
            .unwrap_or_else(|| "none".to_string());
        format!(
            " {}{} | zoom {:.2} | {:?} | editor {} | selected {} | {:?}",
            fps,
            if self.viewport.auto_update() { "" } else { " (paused)" },
            self.viewport.camera().zoom(),
            self.viewport.controller().effective_mode(),
            if self.editor { "on" } else { "off" },
            selected,
            self.viewport.tier(),
        )
    }

    /// Write the framebuffer as half-block cells followed by the status line
    pub fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        let framebuffer = self.viewport.backend().framebuffer();
        let (width, height) = (framebuffer.width(), framebuffer.height());
        let background = self.viewport.config().colors.background;

        for row in 0..height / 2 {
            queue!(out, MoveTo(0, row as u16))?;
            let mut last: Option<(Rgba, Rgba)> = None;
            for x in 0..width {
                let top = framebuffer.pixel(x, row * 2).unwrap_or(background);
                let bottom = framebuffer.pixel(x, row * 2 + 1).unwrap_or(background);
                if last != Some((top, bottom)) {
                    queue!(
                        out,
                        SetForegroundColor(terminal_color(top)),
                        SetBackgroundColor(terminal_color(bottom))
                    )?;
                    last = Some((top, bottom));
                }
                queue!(out, Print(UPPER_HALF_BLOCK))?;
            }
        }

        self.draw_status(out)
    }

    /// Refresh only the status line below the picture
    pub fn draw_status(&self, out: &mut impl Write) -> io::Result<()> {
        let (width, height) = self.viewport.backend().viewport_size();
        let status: String = self.status_line().chars().take(width as usize).collect();
        queue!(
            out,
            ResetColor,
            MoveTo(0, (height / 2) as u16),
            Clear(ClearType::CurrentLine),
            Print(status)
        )?;
        out.flush()
    }
}

/// Terminal size in cells, from the tty or a conventional fallback
fn terminal_size() -> (u16, u16) {
    termsize::get()
        .map(|size| (size.cols, size.rows))
        .unwrap_or((80, 24))
}

/// Take over the terminal and run the viewport until the user quits.
pub fn run(config: ViewerConfig, cube_count: usize) -> io::Result<()> {
    let (columns, rows) = terminal_size();
    let (width, height) = surface_size(columns, rows);
    let backend = SoftwareBackend::new(width, height);

    // Probed once, before the viewport exists
    let capabilities = Capabilities::probe(&backend.info());
    let tick_interval = Duration::from_millis(config.render.tick_interval_ms.max(1));
    let mut host = TerminalHost::new(backend, config, capabilities, cube_count);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, Hide)?;

    let result = host_loop(&mut host, &mut stdout, tick_interval);

    execute!(stdout, ResetColor, Show, DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    result
}

fn host_loop(
    host: &mut TerminalHost,
    out: &mut impl Write,
    tick_interval: Duration,
) -> io::Result<()> {
    let mut next_tick = Instant::now();
    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            if host.handle_event(event::read()?) == Flow::Quit {
                return Ok(());
            }
            continue;
        }

        let now = Instant::now();
        next_tick = now + tick_interval;
        if host.tick(now) {
            host.draw(out)?;
        } else {
            host.draw_status(out)?;
        }
    }
}
