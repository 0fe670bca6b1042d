pub mod capability;
pub mod category;
pub mod detected_shape;
pub mod detection_set;
pub mod shape_detector;
