//! The manager layer: bridges declared entities to native object handles.
//!
//! Each manager owns the native objects for one overlay category. All
//! mutation of shared native state (the map context, the clusterer) funnels
//! through a manager's narrow setters; handles are never exposed for
//! outside mutation.

pub mod cluster;
pub mod drawing;
pub mod infowindow;
pub mod lifecycle;
pub mod marker;
pub mod polygon;
