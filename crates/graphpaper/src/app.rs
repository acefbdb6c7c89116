//! The eframe application: equation side panel, graph canvas, and the
//! per-frame pipeline of input → session maintenance → rebuild →
//! uniform refresh → paint callback.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{anyhow, Result};
use eframe::egui;

use crate::cli::Args;
use crate::render::RenderState;
use crate::session::{GraphSession, ParseState};
use crate::view::{PointerState, ViewTransform};

/// One wheel notch per 50 logical points of scroll delta.
const SCROLL_POINTS_PER_STEP: f64 = 50.0;

pub struct GraphApp {
    session: GraphSession,
    view: ViewTransform,
    /// Shared with the paint callback, which outlives `update`.
    render: Arc<Mutex<RenderState>>,
    /// Entry to hand keyboard focus to on the next frame, used when a
    /// keystroke in the blank slot promotes it to a real entry.
    pending_focus: Option<u64>,
    draft: String,
    started: Instant,
}

impl GraphApp {
    pub fn new(cc: &eframe::CreationContext<'_>, args: &Args) -> Result<Self> {
        if cc.gl.is_none() {
            return Err(anyhow!("graphpaper requires the glow backend"));
        }
        let render = RenderState::new(args.thickness, args.dump_shader.clone())?;
        let mut session = GraphSession::new();
        session.mark_dirty();
        Ok(Self {
            session,
            view: ViewTransform::new(),
            render: Arc::new(Mutex::new(render)),
            pending_focus: None,
            draft: String::new(),
            started: Instant::now(),
        })
    }

    fn side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("equations")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Equations");
                ui.separator();

                let grab_focus = self.pending_focus.take();
                let mut any_changed = false;
                for entry in self.session.entries_mut() {
                    let mut changed = false;
                    ui.horizontal(|ui| {
                        changed |= ui.color_edit_button_rgb(&mut entry.color).changed();
                        let response = ui.add(
                            egui::TextEdit::singleline(&mut entry.text)
                                .hint_text("y = f(x)")
                                .desired_width(f32::INFINITY),
                        );
                        if grab_focus == Some(entry.id) {
                            response.request_focus();
                        }
                        entry.focused = response.has_focus();
                        if response.changed() {
                            entry.reparse();
                            changed = true;
                        }
                    });
                    match &entry.simplified {
                        ParseState::Invalid => {
                            ui.colored_label(egui::Color32::LIGHT_RED, "cannot graph this");
                        }
                        _ => {
                            if let Some(notation) = entry.notation() {
                                ui.weak(notation);
                            }
                        }
                    }
                    ui.add_space(4.0);
                    any_changed |= changed;
                }
                if any_changed {
                    self.session.mark_dirty();
                }

                // Blank slot; the first keystroke turns it into a real
                // entry and focus follows it there.
                let draft_response = ui.add(
                    egui::TextEdit::singleline(&mut self.draft)
                        .hint_text("add equation")
                        .desired_width(f32::INFINITY),
                );
                if draft_response.changed() && !self.draft.is_empty() {
                    let text = std::mem::take(&mut self.draft);
                    self.pending_focus = Some(self.session.push_entry(text));
                }
            });
        self.session.prune_empty();
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

                let scale = ctx.pixels_per_point();
                let width_px = (rect.width() * scale).round() as u32;
                let height_px = (rect.height() * scale).round() as u32;
                self.view.set_viewport(width_px, height_px);

                let pointer = self.pointer_state(ctx, &response, rect);
                self.view.update(&pointer);

                let mouse = pointer
                    .uv
                    .map(|(u, v)| [u as f32 * width_px as f32, v as f32 * height_px as f32])
                    .unwrap_or([0.0; 2]);
                let time = self.started.elapsed().as_secs_f32();
                if let Ok(mut render) = self.render.lock() {
                    if let Err(err) = render.update_view_uniforms(&self.view, time, mouse) {
                        tracing::error!(%err, "uniform refresh failed");
                    }
                }

                let render = Arc::clone(&self.render);
                let callback = egui::PaintCallback {
                    rect,
                    callback: Arc::new(egui_glow::CallbackFn::new(move |_info, painter| {
                        if let Ok(state) = render.lock() {
                            state.draw(painter.gl());
                        }
                    })),
                };
                ui.painter().add(callback);
            });
    }

    fn pointer_state(
        &self,
        ctx: &egui::Context,
        response: &egui::Response,
        rect: egui::Rect,
    ) -> PointerState {
        let uv = response
            .interact_pointer_pos()
            .or_else(|| response.hover_pos())
            .map(|pos| {
                let u = ((pos.x - rect.min.x) / rect.width()) as f64;
                let v = 1.0 - ((pos.y - rect.min.y) / rect.height()) as f64;
                (u, v)
            });
        let primary_down = response.is_pointer_button_down_on()
            && ctx.input(|input| input.pointer.primary_down());
        let wheel_steps = if response.hovered() {
            let delta = ctx.input(|input| input.raw_scroll_delta.y);
            // Scrolling up zooms in.
            -f64::from(delta) / SCROLL_POINTS_PER_STEP
        } else {
            0.0
        };
        // Canvas drags also count as pointer use, so only treat the
        // pointer as widget-held when the press did not land here.
        let widget_holds_pointer = ctx.is_using_pointer() && !response.is_pointer_button_down_on();
        PointerState {
            uv,
            primary_down,
            wheel_steps,
            gui_active: ctx.wants_keyboard_input() || widget_holds_pointer,
        }
    }
}

impl eframe::App for GraphApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.side_panel(ctx);
        self.canvas(ctx);

        if self.session.take_dirty() {
            if let Some(gl) = frame.gl() {
                let curves = self.session.curves();
                if let Ok(mut render) = self.render.lock() {
                    if let Err(err) = render.rebuild(gl, &curves) {
                        tracing::error!(%err, "shader rebuild failed");
                    }
                }
            }
        }

        // iTime advances every frame.
        ctx.request_repaint();
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        if let (Some(gl), Ok(mut render)) = (gl, self.render.lock()) {
            render.destroy(gl);
        }
    }
}
