// main.rs - egui front-end over the life_core simulation

use eframe::egui;
use life_core::SimConfig;

mod ui;

use ui::LifeApp;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 950.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Conway's Game of Life",
        options,
        Box::new(|_cc| Box::new(LifeApp::new(SimConfig::default()))),
    )
}
