//! Scene viewer
//!
//! Loads a RON config (`viewer.ron` unless another path is given),
//! imports its scene and orbits the camera around the target.

use std::path::{Path, PathBuf};

use clap::Parser;
use macroquad::prelude::*;
use softraster::rasterizer::{self as sr, Framebuffer, Rasterizer};
use softraster::scene::{load_config, ViewerConfig};

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn window_conf() -> Conf {
    Conf {
        window_title: format!("softraster viewer v{}", VERSION),
        window_width: sr::WIDTH as i32 * 2,
        window_height: sr::HEIGHT as i32 * 2,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Software rasterizer scene viewer
#[derive(Parser)]
#[command(name = "softraster-viewer")]
#[command(version, about, long_about = None)]
struct Args {
    /// Viewer config file (RON)
    #[arg(default_value = "viewer.ron")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn read_config(path: &Path) -> ViewerConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Using default config, could not load {}: {}", path.display(), e);
            ViewerConfig::default()
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Args::parse();
    let filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let config = read_config(&args.config);
    let mut fb = Framebuffer::new(config.width, config.height);
    let mut rasterizer = Rasterizer::new(&fb);
    rasterizer.settings = config.settings.clone();
    rasterizer.scene.add(&config.scene, config.scale);

    let mut camera = sr::Camera::new();
    let offset = config.camera_position - config.camera_target;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let angle = get_time() as f32 * config.orbit_speed;
        let eye = config.camera_target + sr::Mat4::rotate_y(angle).transform_vector(offset);
        camera.set_position(eye);
        camera.look_at(config.camera_target);

        fb.clear(config.clear_color);
        rasterizer.render(&camera, &mut fb);

        // Convert framebuffer to texture and scale it to the window
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
        texture.set_filter(FilterMode::Nearest);

        let scale = (screen_width() / fb.width as f32).min(screen_height() / fb.height as f32);
        let (w, h) = (fb.width as f32 * scale, fb.height as f32 * scale);

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            (screen_width() - w) * 0.5,
            (screen_height() - h) * 0.5,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(w, h)),
                ..Default::default()
            },
        );

        let stats = rasterizer.stats;
        draw_text(
            &format!("{} tris, {} px", stats.triangles_drawn, stats.pixels_written),
            8.0,
            20.0,
            16.0,
            WHITE,
        );

        next_frame().await;
    }
}
