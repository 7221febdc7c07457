// ui.rs - Controls, statistics and the clickable board painter

use eframe::egui;
use egui::{Color32, Rect, Stroke, Vec2};
use life_core::{Grid, PATTERNS, SimConfig, Simulation};
use tokio::runtime::Runtime;
use tokio::sync::watch;

const LIVE_COLOR: Color32 = Color32::from_rgb(0, 200, 0);
const DEAD_COLOR: Color32 = Color32::from_rgb(40, 40, 40);

pub struct LifeApp {
    // Keeps the clock's spawn target alive for the life of the app
    _runtime: Runtime,
    sim: Simulation,
    grid_rx: watch::Receiver<Grid>,
    grid: Grid,
    selected_pattern: usize,
}

impl LifeApp {
    pub fn new(config: SimConfig) -> Self {
        let runtime = Runtime::new().expect("failed to start tokio runtime");
        let sim = {
            let _enter = runtime.enter();
            Simulation::new(config)
        };
        let mut grid_rx = sim.subscribe();
        let grid = grid_rx.borrow_and_update().clone();
        Self {
            _runtime: runtime,
            sim,
            grid_rx,
            grid,
            selected_pattern: 0,
        }
    }
}

impl eframe::App for LifeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pull the latest published generation before drawing
        if self.grid_rx.has_changed().unwrap_or(false) {
            self.grid = self.grid_rx.borrow_and_update().clone();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Conway's Game of Life");

            // Controls
            ui.horizontal(|ui| {
                let button_text = if self.sim.is_running() { "⏸ Pause" } else { "▶ Start" };
                if ui.button(button_text).clicked() {
                    if self.sim.is_running() {
                        self.sim.stop();
                    } else {
                        self.sim.start();
                    }
                }

                if ui.button("⏹ Clear").clicked() {
                    self.sim.stop();
                    self.sim.clear();
                }

                if ui.button("🎲 Random").clicked() {
                    self.sim.stop();
                    self.sim.randomize();
                }

                ui.separator();

                // Pattern dropdown
                ui.label("Pattern:");
                egui::ComboBox::from_id_source("pattern_selector")
                    .selected_text(PATTERNS[self.selected_pattern].name)
                    .show_ui(ui, |ui| {
                        for (i, pattern) in PATTERNS.iter().enumerate() {
                            ui.selectable_value(&mut self.selected_pattern, i, pattern.name);
                        }
                    });

                if ui.button("Apply Pattern").clicked() {
                    self.sim.stop();
                    self.sim.apply_pattern(&PATTERNS[self.selected_pattern]);
                }

                ui.separator();

                ui.label(format!("Generation: {}", self.sim.generation()));
            });

            ui.separator();

            // Speed control
            ui.horizontal(|ui| {
                ui.label("Interval:");
                let cfg = self.sim.config();
                let (min, max, step) = (
                    cfg.min_interval_ms,
                    cfg.max_interval_ms,
                    cfg.interval_step_ms,
                );
                let mut interval = self.sim.interval_ms();
                if ui
                    .add(
                        egui::Slider::new(&mut interval, min..=max)
                            .step_by(step as f64)
                            .suffix(" ms"),
                    )
                    .changed()
                {
                    self.sim.set_interval_ms(interval);
                }

                if ui.button("Slower").clicked() {
                    self.sim.increase_interval();
                }
                if ui.button("Faster").clicked() {
                    self.sim.decrease_interval();
                }
            });

            ui.separator();

            ui.label("Click cells to toggle them alive/dead, even while the simulation runs.");

            ui.separator();

            // Draw the board
            let box_size = 15.0;
            let spacing = 0.5;

            let start_pos = ui.cursor().min;
            let total_size = Vec2::new(
                (box_size + spacing) * self.grid.cols() as f32 - spacing,
                (box_size + spacing) * self.grid.rows() as f32 - spacing,
            );

            let (response, painter) = ui.allocate_painter(total_size, egui::Sense::click());

            // Fill background
            painter.rect_filled(Rect::from_min_size(start_pos, total_size), 0.0, Color32::BLACK);

            let clicked_at = response
                .clicked()
                .then(|| response.interact_pointer_pos())
                .flatten();

            for row in 0..self.grid.rows() {
                for col in 0..self.grid.cols() {
                    let x = start_pos.x + col as f32 * (box_size + spacing);
                    let y = start_pos.y + row as f32 * (box_size + spacing);

                    let rect = Rect::from_min_size(egui::pos2(x, y), Vec2::splat(box_size));

                    let cell_color = if self.grid.is_alive(row, col) {
                        LIVE_COLOR
                    } else {
                        DEAD_COLOR
                    };

                    painter.rect_filled(rect, 1.0, cell_color);

                    // Draw subtle border
                    painter.rect_stroke(rect, 1.0, Stroke::new(0.2, Color32::from_gray(60)));

                    if let Some(pos) = clicked_at {
                        if rect.contains(pos) {
                            if let Err(err) = self.sim.toggle_cell(row, col) {
                                log::warn!("toggle rejected: {}", err);
                            }
                        }
                    }
                }
            }

            ui.separator();

            // Statistics
            let live_cells = self.grid.alive_count();
            let total_cells = self.grid.rows() * self.grid.cols();
            ui.horizontal(|ui| {
                ui.label(format!("Live cells: {}", live_cells));
                ui.label(format!("Dead cells: {}", total_cells - live_cells));
                ui.label(format!(
                    "Population: {:.1}%",
                    (live_cells as f32 / total_cells as f32) * 100.0
                ));
            });
        });

        // Keep repainting while the clock runs so published generations
        // show up without waiting for input events
        if self.sim.is_running() {
            ctx.request_repaint();
        }
    }
}
