use egui::{Pos2, Rect, pos2};

use crate::canvas::{PixelBuffer, pixel_coord};
use crate::components::colors::DEFAULT_ON_COLOR;
use crate::components::history::{HistoryStack, Snapshot};
use crate::error::MaskError;
use crate::ops::brush::draw_segment;
use crate::ops::fill::{FillOutcome, flood_fill};

/// Brush widths offered by the size picker.
pub const BRUSH_SIZE_PRESETS: [u32; 4] = [8, 16, 32, 64];

pub const DEFAULT_BRUSH_SIZE: u32 = 8;

/// Tool selected in the toolbar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Draw,
    Delete,
    Fill,
    Line,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Draw => "Draw",
            Tool::Delete => "Delete",
            Tool::Fill => "Fill",
            Tool::Line => "Line",
        }
    }

    /// Identifier used in settings files.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Draw => "draw",
            Tool::Delete => "delete",
            Tool::Fill => "fill",
            Tool::Line => "line",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::all().iter().copied().find(|t| t.name() == name)
    }

    pub fn all() -> &'static [Tool] {
        &[Tool::Draw, Tool::Delete, Tool::Fill, Tool::Line]
    }

    /// Composite mode strokes of this tool render with.
    pub fn composite(&self) -> CompositeMode {
        match self {
            Tool::Delete => CompositeMode::Erase,
            Tool::Draw | Tool::Fill | Tool::Line => CompositeMode::Paint,
        }
    }
}

/// Whether a stroke adds mask pixels or removes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CompositeMode {
    #[default]
    Paint,
    Erase,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolProperties {
    /// Brush width in buffer pixels.
    pub brush_size: u32,
    /// `#RRGGBB` "on" color.
    pub color: String,
}

impl Default for ToolProperties {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            color: DEFAULT_ON_COLOR.to_string(),
        }
    }
}

/// In-progress pointer interaction.
#[derive(Default)]
enum Gesture {
    #[default]
    Idle,
    /// Free-hand draw/delete: each move renders `last → current`.
    Stroke { last: Pos2 },
    /// Line tool: every move restores `original` then renders `start → current`.
    /// `original` is kept aside, not on the undo stack.
    Line { start: Pos2, original: Snapshot },
}

/// What a pointer event did to the working buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToolOutcome {
    Unchanged,
    /// A gesture began without touching pixels yet (line tool).
    Started,
    /// Pixels were rendered; carries the touched region.
    Painted(Option<Rect>),
    Filled(FillOutcome),
    /// The pre-gesture state was put back.
    Restored,
}

/// Tool selection, brush properties and gesture tracking for one session.
///
/// Positions are in buffer space; down/up positions are floored to whole
/// pixels, move samples stay sub-pixel.
#[derive(Default)]
pub struct MaskTools {
    pub active_tool: Tool,
    pub properties: ToolProperties,
    composite: CompositeMode,
    gesture: Gesture,
}

impl MaskTools {
    pub fn new(active_tool: Tool, properties: ToolProperties) -> Self {
        Self {
            active_tool,
            properties,
            composite: CompositeMode::Paint,
            gesture: Gesture::Idle,
        }
    }

    pub fn composite(&self) -> CompositeMode {
        self.composite
    }

    pub fn composite_mut(&mut self) -> &mut CompositeMode {
        &mut self.composite
    }

    pub fn is_gesture_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Forget the active gesture without touching the buffer.
    pub fn cancel_gesture(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Start a gesture with the active tool.
    ///
    /// Draw, delete and fill push one history snapshot here.  A line pushes
    /// its snapshot only when committed in [`MaskTools::pointer_up`], so an
    /// abandoned line costs no undo step.  A fill seed outside the buffer is
    /// rejected before anything is modified.
    pub fn pointer_down(
        &mut self,
        pos: Pos2,
        buffer: &mut PixelBuffer,
        history: &mut HistoryStack,
    ) -> Result<ToolOutcome, MaskError> {
        if self.is_gesture_active() {
            self.pointer_leave(buffer);
        }
        let pos = floor_pos(pos);
        self.composite = self.active_tool.composite();

        match self.active_tool {
            Tool::Fill => {
                let (x, y) = pixel_coord(pos);
                if !buffer.in_bounds(x, y) {
                    // Reject before the snapshot so a bad click leaves no undo step.
                    let (width, height) = buffer.dimensions();
                    crate::log_warn!("Fill seed ({}, {}) outside {}×{} buffer", x, y, width, height);
                    return Err(MaskError::OutOfBoundsSeed {
                        x,
                        y,
                        width,
                        height,
                    });
                }
                history.push(buffer);
                let outcome = flood_fill(buffer, x, y, &self.properties.color)?;
                Ok(ToolOutcome::Filled(outcome))
            }
            Tool::Line => {
                self.gesture = Gesture::Line {
                    start: pos,
                    original: Snapshot::capture(buffer),
                };
                Ok(ToolOutcome::Started)
            }
            Tool::Draw | Tool::Delete => {
                history.push(buffer);
                self.gesture = Gesture::Stroke { last: pos };
                Ok(ToolOutcome::Painted(self.render(buffer, pos, pos)))
            }
        }
    }

    /// Continue the active gesture.  Ignored when no gesture is active.
    pub fn pointer_move(&mut self, pos: Pos2, buffer: &mut PixelBuffer) -> ToolOutcome {
        match &mut self.gesture {
            Gesture::Idle => ToolOutcome::Unchanged,
            Gesture::Stroke { last } => {
                let from = std::mem::replace(last, pos);
                ToolOutcome::Painted(self.render(buffer, from, pos))
            }
            Gesture::Line { start, original } => {
                let start = *start;
                original.restore_into(buffer);
                ToolOutcome::Painted(self.render(buffer, start, pos))
            }
        }
    }

    /// Finish the active gesture.  For the line tool this records the
    /// pre-gesture state in `history` and commits the final `start → pos`
    /// segment over it.
    pub fn pointer_up(
        &mut self,
        pos: Pos2,
        buffer: &mut PixelBuffer,
        history: &mut HistoryStack,
    ) -> ToolOutcome {
        match std::mem::take(&mut self.gesture) {
            Gesture::Line { start, original } => {
                history.push(original.buffer());
                original.restore_into(buffer);
                ToolOutcome::Painted(self.render(buffer, start, floor_pos(pos)))
            }
            Gesture::Stroke { .. } | Gesture::Idle => ToolOutcome::Unchanged,
        }
    }

    /// Pointer left the drawing surface.  Free-hand strokes keep what was
    /// drawn; an uncommitted line preview is discarded and leaves no trace
    /// in the history.
    pub fn pointer_leave(&mut self, buffer: &mut PixelBuffer) -> ToolOutcome {
        match std::mem::take(&mut self.gesture) {
            Gesture::Line { original, .. } => {
                original.restore_into(buffer);
                ToolOutcome::Restored
            }
            Gesture::Stroke { .. } | Gesture::Idle => ToolOutcome::Unchanged,
        }
    }

    /// Pointer re-entered the surface.  With the primary button still held
    /// this starts a fresh gesture, exactly like a pointer-down.
    pub fn pointer_enter(
        &mut self,
        pos: Pos2,
        primary_down: bool,
        buffer: &mut PixelBuffer,
        history: &mut HistoryStack,
    ) -> Result<ToolOutcome, MaskError> {
        if primary_down {
            self.pointer_down(pos, buffer, history)
        } else {
            Ok(ToolOutcome::Unchanged)
        }
    }

    fn render(&self, buffer: &mut PixelBuffer, from: Pos2, to: Pos2) -> Option<Rect> {
        draw_segment(
            buffer,
            from,
            to,
            &self.properties.color,
            self.properties.brush_size,
            self.composite,
        )
    }
}

fn floor_pos(pos: Pos2) -> Pos2 {
    pos2(pos.x.floor(), pos.y.floor())
}
