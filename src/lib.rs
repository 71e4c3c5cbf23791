//! Interactive snapping for dragged 3D objects.
//!
//! While a manipulation tool drags an object, [`SnapEngine`] decides each
//! frame whether to override the raw motion with a pose resting on a nearby
//! surface (found by raycast) or on an implicit ground plane, and when to let
//! go again. Snapping is easy to enter and harder to leave: acquisition needs
//! a closer hit than maintenance, and release waits for the unconstrained
//! target to drift past a break distance.
//!
//! The host supplies geometry through [`SnapScene`] and the camera/viewer
//! scale through a [`SnapContext`] on every call.

pub mod constants;
pub mod directions;
pub mod engine;
pub mod geometry;
pub mod probe;
pub mod scene;
pub mod session;
pub mod settings;

pub use directions::{DirectionDescriptor, DIRECTIONS};
pub use engine::{AxisConstraints, SnapEngine, SnapIndicator};
pub use geometry::{Aabb, Pose, Ray};
pub use scene::{
    IgnoreList, NodeId, Pointer, PointerId, RaycastHit, SnapContext, SnapScene, WidgetId,
};
pub use session::{PivotMode, SessionError, SessionHandle, SnapMode, SnapSession};
pub use settings::{SettingsError, SnapSettings, SnapTuning};
