use anyhow::Result;
use frame_input::engine::input::{
    Action, EventQueue, InlineSettings, InputEngine, MetaCommand, SettingsFile,
};
use log::{info, warn};
use winit::{
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::{Fullscreen, WindowBuilder},
};

/// Build the input engine from the file given on the command line,
/// falling back to the bundled settings
fn create_input_engine() -> Result<InputEngine> {
    if let Some(path) = std::env::args().nth(1) {
        match InputEngine::from_source(SettingsFile::new(&path)) {
            Ok(engine) => {
                info!("Input settings loaded from {}", path);
                return Ok(engine);
            }
            Err(e) => warn!("Could not load {}: {}. Using defaults.", path, e),
        }
    }
    Ok(InputEngine::from_source(InlineSettings::default())?)
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting input demo...");

    let mut input = create_input_engine()?;
    input.initialize_joysticks();
    let mut queue = EventQueue::new();

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Frame Input")
        .with_inner_size(winit::dpi::LogicalSize::new(640, 360))
        .with_resizable(true)
        .build(&event_loop)?;

    info!("Window created successfully");

    // Main event loop
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => {
                queue.push_window_event(&event);
                if let WindowEvent::RedrawRequested = event {
                    window.request_redraw();
                }
            }
            Event::AboutToWait => {
                // One input cycle per frame
                match input.handle_events(&mut queue) {
                    Some(MetaCommand::Quit) => {
                        info!("Quit requested, shutting down...");
                        input.deinitialize_joysticks();
                        elwt.exit();
                    }
                    Some(MetaCommand::ToggleFullscreen) => {
                        let fullscreen = match window.fullscreen() {
                            Some(_) => None,
                            None => Some(Fullscreen::Borderless(None)),
                        };
                        window.set_fullscreen(fullscreen);
                    }
                    Some(MetaCommand::Screenshot) => {
                        info!("Screenshot requested");
                    }
                    None => {}
                }

                for action in input.snapshot().pressed_actions() {
                    info!("{:?} pressed", action);
                }
                if input.pressed(Action::Quit) {
                    info!("Quit key pressed, shutting down...");
                    input.deinitialize_joysticks();
                    elwt.exit();
                }
                if let Some(axis) = input.last_axis_moved() {
                    info!("Joystick axis {} moved", axis);
                    input.reset_last_axis_moved();
                }

                window.request_redraw();
            }
            _ => {}
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}
