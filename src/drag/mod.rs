// Drag-and-drop intake: coalesces nested enter/leave events and hands dropped files to the caller.

pub mod event;
pub mod zone;
