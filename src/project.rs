use std::path::{Path, PathBuf};

use egui::Pos2;
use image::RgbaImage;

use crate::canvas::{PixelBuffer, Viewport};
use crate::components::history::HistoryStack;
use crate::components::tools::{MaskTools, ToolOutcome, ToolProperties};
use crate::error::MaskError;
use crate::io;
use crate::ops::filters::MaskFilter;
use crate::ops::mask::{export_mask, import_mask_into};
use crate::settings::EditorSettings;

/// One mask-editing session: the working buffer, its undo history, the tool
/// state and the viewport the pointer events arrive through.
pub struct MaskProject {
    /// Suggested export name, used when the background has no usable path.
    pub name: String,
    /// Where the background image came from (URL, path or `data:` URL).
    pub background_source: String,
    pub tools: MaskTools,
    pub is_dirty: bool,
    buffer: PixelBuffer,
    history: HistoryStack,
    viewport: Viewport,
    /// Last imported mask, kept so it can be re-imported after a color change.
    mask_source: Option<RgbaImage>,
}

impl MaskProject {
    pub fn new(width: u32, height: u32) -> Result<Self, MaskError> {
        Self::from_settings(width, height, &EditorSettings::default())
    }

    pub fn from_settings(
        width: u32,
        height: u32,
        settings: &EditorSettings,
    ) -> Result<Self, MaskError> {
        let buffer = PixelBuffer::new(width, height)?;
        let viewport = Viewport::new(Pos2::ZERO, settings.scale)?;
        crate::log_info!("New mask session {}×{}", width, height);
        Ok(Self {
            name: String::new(),
            background_source: String::new(),
            tools: MaskTools::new(
                settings.tool,
                ToolProperties {
                    brush_size: settings.brush_size,
                    color: settings.on_color.clone(),
                },
            ),
            is_dirty: false,
            buffer,
            history: HistoryStack::new(settings.max_undo_steps),
            viewport,
            mask_source: None,
        })
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_origin(&mut self, origin: Pos2) {
        self.viewport.set_origin(origin);
    }

    /// Change the zoom.  A rejected scale leaves the viewport unchanged.
    pub fn set_scale(&mut self, scale: f32) -> Result<(), MaskError> {
        self.viewport.set_scale(scale)
    }

    /// A new background was loaded.  The working buffer is reallocated (and
    /// the history dropped) only when the dimensions change.
    pub fn load_background(
        &mut self,
        width: u32,
        height: u32,
        source: &str,
    ) -> Result<(), MaskError> {
        self.background_source = source.to_string();
        if self.buffer.dimensions() == (width, height) {
            return Ok(());
        }
        let buffer = PixelBuffer::new(width, height)?;
        crate::log_info!(
            "Background {} is {}×{}; reallocating mask buffer",
            source,
            width,
            height
        );
        self.tools.cancel_gesture();
        self.buffer = buffer;
        self.history.clear();
        self.mask_source = None;
        self.is_dirty = false;
        Ok(())
    }

    pub fn load_background_image(&mut self, image: &RgbaImage, source: &str) -> Result<(), MaskError> {
        self.load_background(image.width(), image.height(), source)
    }

    /// Import an existing mask image, stretched to the buffer size.
    /// Replaces the buffer contents and is not recorded in the history.
    pub fn load_mask(&mut self, source: &RgbaImage) {
        self.tools.pointer_leave(&mut self.buffer);
        import_mask_into(&mut self.buffer, source, &self.tools.properties.color);
        self.mask_source = Some(source.clone());
        crate::log_info!(
            "Imported mask {}×{} ({} pixels on)",
            source.width(),
            source.height(),
            self.buffer.on_pixel_count()
        );
    }

    /// Re-import the last loaded mask with the current on-color.  Returns
    /// `false` when no mask was ever loaded.
    pub fn redraw_mask(&mut self) -> bool {
        let Some(source) = self.mask_source.as_ref() else { return false };
        self.tools.pointer_leave(&mut self.buffer);
        self.buffer.clear();
        import_mask_into(&mut self.buffer, source, &self.tools.properties.color);
        true
    }

    /// Erase the whole mask as one undoable step.
    pub fn clear(&mut self) {
        self.tools.pointer_leave(&mut self.buffer);
        self.history.push(&self.buffer);
        self.buffer.clear();
        self.is_dirty = true;
    }

    /// Revert the last gesture.  Any gesture in progress is abandoned first,
    /// so a line preview never survives an undo.
    pub fn undo(&mut self) -> bool {
        self.tools.pointer_leave(&mut self.buffer);
        self.history
            .undo(&mut self.buffer, self.tools.composite_mut())
    }

    /// Run a clean-up filter over the whole mask as one undoable step.
    pub fn apply_filter(&mut self, filter: MaskFilter) {
        self.tools.pointer_leave(&mut self.buffer);
        self.history.push(&self.buffer);
        filter.apply(&mut self.buffer, &self.tools.properties.color);
        self.is_dirty = true;
        crate::log_info!("Applied {} filter", filter.label());
    }

    // Pointer events arrive in display space.

    pub fn pointer_down(&mut self, display: Pos2) -> Result<ToolOutcome, MaskError> {
        let pos = self.viewport.to_buffer_space(display);
        let outcome = self
            .tools
            .pointer_down(pos, &mut self.buffer, &mut self.history)?;
        self.track(outcome);
        Ok(outcome)
    }

    pub fn pointer_move(&mut self, display: Pos2) -> ToolOutcome {
        let pos = self.viewport.to_buffer_space(display);
        let outcome = self.tools.pointer_move(pos, &mut self.buffer);
        self.track(outcome);
        outcome
    }

    pub fn pointer_up(&mut self, display: Pos2) -> ToolOutcome {
        let pos = self.viewport.to_buffer_space(display);
        let outcome = self
            .tools
            .pointer_up(pos, &mut self.buffer, &mut self.history);
        self.track(outcome);
        outcome
    }

    pub fn pointer_leave(&mut self) -> ToolOutcome {
        self.tools.pointer_leave(&mut self.buffer)
    }

    pub fn pointer_enter(
        &mut self,
        display: Pos2,
        primary_down: bool,
    ) -> Result<ToolOutcome, MaskError> {
        let pos = self.viewport.to_buffer_space(display);
        let outcome =
            self.tools
                .pointer_enter(pos, primary_down, &mut self.buffer, &mut self.history)?;
        self.track(outcome);
        Ok(outcome)
    }

    /// Opaque black/white rendition of the mask.
    pub fn export(&self) -> PixelBuffer {
        export_mask(&self.buffer)
    }

    pub fn export_png(&self) -> Result<Vec<u8>, MaskError> {
        io::encode_png(self.export().as_image())
    }

    /// Name the export file would get.
    pub fn export_file_name(&self) -> String {
        io::export_file_name(&self.background_source, &self.name)
    }

    /// Write the export PNG into `dir` and return its path.
    pub fn save_export(&mut self, dir: &Path) -> Result<PathBuf, MaskError> {
        let path = io::export_path(dir, &self.background_source, &self.name);
        io::write_png(self.export().as_image(), &path)?;
        self.is_dirty = false;
        Ok(path)
    }

    /// Display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        let stem = io::export_file_stem(&self.background_source, &self.name);
        if self.is_dirty {
            format!("{}*", stem)
        } else {
            stem
        }
    }

    fn track(&mut self, outcome: ToolOutcome) {
        if matches!(outcome, ToolOutcome::Painted(_))
            || matches!(outcome, ToolOutcome::Filled(f) if f.changed())
        {
            self.is_dirty = true;
        }
    }
}
