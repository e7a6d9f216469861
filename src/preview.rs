//! Optional on-screen preview of each saved comparison.

use image::RgbImage;

use crate::error::Result;

/// Shows a finished comparison image to the user.
///
/// Called after the image has been written, so a failing preview never costs
/// an output file.
pub trait Preview {
    /// Display `image` and return once the user dismisses it.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be displayed.
    fn show(&mut self, title: &str, image: &RgbImage) -> Result<()>;
}

/// Preview that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreview;

impl Preview for NoPreview {
    fn show(&mut self, _title: &str, _image: &RgbImage) -> Result<()> {
        Ok(())
    }
}

#[cfg(feature = "preview")]
pub use window::WindowPreview;

#[cfg(feature = "preview")]
mod window {
    use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions, ViewportBuilder};
    use image::RgbImage;

    use crate::error::{Error, Result};

    use super::Preview;

    /// Blocking native window; closes on any key press.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WindowPreview;

    impl Preview for WindowPreview {
        #[allow(clippy::cast_precision_loss)]
        fn show(&mut self, title: &str, image: &RgbImage) -> Result<()> {
            let size = [image.width() as usize, image.height() as usize];
            let pixels = ColorImage::from_rgb(size, image.as_raw());

            let options = eframe::NativeOptions {
                viewport: ViewportBuilder::default()
                    .with_title(title)
                    .with_inner_size([image.width() as f32, image.height() as f32]),
                ..Default::default()
            };

            eframe::run_native(
                title,
                options,
                Box::new(|_cc| Ok(Box::new(PreviewApp::new(pixels)))),
            )
            .map_err(|err| Error::Preview(err.to_string()))
        }
    }

    struct PreviewApp {
        pixels: Option<ColorImage>,
        texture: Option<TextureHandle>,
    }

    impl PreviewApp {
        fn new(pixels: ColorImage) -> Self {
            Self {
                pixels: Some(pixels),
                texture: None,
            }
        }
    }

    impl eframe::App for PreviewApp {
        fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
            if let Some(pixels) = self.pixels.take() {
                self.texture = Some(ctx.load_texture("combined", pixels, TextureOptions::default()));
            }

            let key_pressed = ctx.input(|i| {
                i.events
                    .iter()
                    .any(|e| matches!(e, egui::Event::Key { pressed: true, .. }))
            });
            if key_pressed {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }

            egui::CentralPanel::default()
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    if let Some(texture) = &self.texture {
                        ui.add(egui::Image::new(texture).shrink_to_fit());
                    }
                });
        }
    }
}
