//! Window creation for the demo binary.

use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

/// Smallest logical size the HUD layout still fits in.
pub const MIN_WIDTH: u32 = 640;
pub const MIN_HEIGHT: u32 = 360;

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "ISS Cupola Demo".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
        }
    }
}

impl PlatformConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Window config invalid: title is empty".to_string());
        }
        if self.width < MIN_WIDTH || self.height < MIN_HEIGHT {
            return Err(format!(
                "Window config invalid: {}x{} is below the {}x{} minimum",
                self.width, self.height, MIN_WIDTH, MIN_HEIGHT
            ));
        }
        Ok(())
    }

    fn attributes(&self) -> WindowAttributes {
        WindowAttributes::default()
            .with_title(&self.title)
            .with_inner_size(LogicalSize::new(self.width, self.height))
            .with_min_inner_size(LogicalSize::new(MIN_WIDTH, MIN_HEIGHT))
            .with_resizable(self.resizable)
    }
}

pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, String> {
    config.validate()?;
    let window = event_loop
        .create_window(config.attributes())
        .map_err(|e| format!("Failed to create window: {e}"))?;
    log::debug!("Window '{}' created", config.title);
    Ok(Arc::new(window))
}
