use anyhow::Result;
use clap::Parser;
use winit::event_loop::EventLoop;

use pergola_viewer::app::App;
use pergola_viewer::cli::Cli;
use pergola_viewer::config::ViewerConfig;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    cli.apply_to(&mut config);

    if !cli.no_ui {
        println!(
            "Pergola Viewer [{}] - Controls: drag to orbit, WASD to walk, Escape to quit",
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, !cli.no_ui)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
