use std::sync::Arc;

use crate::shared::frame::Frame;

/// A live video stream bound to the running session.
///
/// Implementations decode in the background; the pump only ever asks for
/// the most recent frame.
pub trait VideoSource: Send {
    /// Intrinsic frame size, or `None` until the first frame's metadata is known.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// True while playback is paused. Paused sources are not sampled.
    fn is_paused(&self) -> bool;

    /// The latest decoded frame, if any has arrived yet.
    fn current_frame(&self) -> Option<Arc<Frame>>;
}
