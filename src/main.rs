//! Tilt Arcade headless run
//!
//! Drives the engine for a fixed number of frames against a recording
//! backend with placeholder art and a swaying scripted tilt, then logs a
//! summary. Usage: `tilt-arcade [frames] [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    if let Err(err) = headless::run(std::env::args().skip(1).collect()) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on this target
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use tilt_arcade::assets::{DecodedImage, MemoryImages};
    use tilt_arcade::input::ScriptedTilt;
    use tilt_arcade::layout::{HudElement, PixelRect, ViewportLayout};
    use tilt_arcade::renderer::RecordingBackend;
    use tilt_arcade::sim::SpriteAsset;
    use tilt_arcade::{EngineError, GameEngine, Settings};

    const DEFAULT_FRAMES: u64 = 3600;
    const SCREEN: (u32, u32) = (1080, 1920);

    pub fn run(args: Vec<String>) -> Result<(), EngineError> {
        let frames = args
            .first()
            .and_then(|a| a.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FRAMES);
        let settings = match args.get(1) {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        log::info!("Tilt Arcade (headless) running {frames} frames");

        let mut engine = GameEngine::new(settings, swaying_tilt());
        let mut gfx = RecordingBackend::new();
        let mut images = placeholder_art();

        engine.on_surface_created(&mut gfx, &mut images)?;
        engine.on_surface_changed(SCREEN.0, SCREEN.1);
        engine.command_sender().set_viewport_locations(hud_layout());

        let mut total_draws = 0usize;
        let mut runs = 1u32;
        for _ in 0..frames {
            let was_playing = engine.is_playing();
            total_draws += engine.draw_frame(&mut gfx, &mut images);
            gfx.take_commands();

            if was_playing && !engine.is_playing() {
                log::info!("Run {runs} ended with score {}", engine.score());
                runs += 1;
                engine.command_sender().start();
            }
        }

        let state = engine.state();
        log::info!(
            "Done: {} frames, {} sprites drawn, score {}, obstacles spawned {}",
            engine.frames_drawn(),
            total_draws,
            state.score,
            state.obstacles_spawned
        );
        log::info!(
            "Pools: obstacles {}/{}, debris {}/{}, targets {}/{}",
            state.obstacle_pool.in_use_count(),
            state.obstacle_pool.len(),
            state.debris_pool.in_use_count(),
            state.debris_pool.len(),
            state.target_pool.in_use_count(),
            state.target_pool.len()
        );

        engine.destroy();
        Ok(())
    }

    /// Slow left/right sway in degrees
    fn swaying_tilt() -> ScriptedTilt {
        let samples = (0..240)
            .map(|i| (i as f32 / 240.0 * std::f32::consts::TAU).sin() * 12.0)
            .collect();
        ScriptedTilt::new(samples)
    }

    fn placeholder_art() -> MemoryImages {
        MemoryImages::new()
            .with(SpriteAsset::Asteroid.key(), DecodedImage::solid(408, 384, [140, 110, 90, 255]))
            .with(SpriteAsset::Chicken.key(), DecodedImage::solid(204, 328, [245, 245, 235, 255]))
            .with(SpriteAsset::Ship.key(), DecodedImage::solid(256, 256, [90, 170, 255, 255]))
    }

    fn hud_layout() -> ViewportLayout {
        let mut layout = ViewportLayout::new();
        layout.insert(HudElement::ObstacleIcon, PixelRect::new(32.0, 32.0, 96.0, 96.0));
        layout.insert(HudElement::ObstacleCounter, PixelRect::new(112.0, 32.0, 240.0, 96.0));
        layout
    }
}
