pub use crate::draw::{BulletMark, DrawData, DrawProtocol, DrawStyle, FixedPitch, Options};
pub use crate::error::{Error, Result};
pub use crate::geometry::{Dimensions, Point, Rectangle};
pub use crate::id::{Tracker, WidgetId};
pub use crate::layout::{Layout, Normalize, Position, Vertex};
pub use crate::screen::{Screen, ScreenBase, SharedAdapter};
pub use crate::text::{CharSizeMap, Text, TextAlign};
pub use crate::widget::{Widget, WidgetClass};
pub use crate::{UpEvent, UpEventCb};
