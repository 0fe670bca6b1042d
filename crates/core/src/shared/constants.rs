pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Directory name used under the platform cache dir for downloaded models.
pub const APP_DIR_NAME: &str = "ShapeCam";

/// Host display refresh rate assumed when none is configured.
pub const DEFAULT_REFRESH_RATE_HZ: f64 = 60.0;

/// Playback rate for still-image sequences acting as a camera.
pub const DEFAULT_SEQUENCE_FPS: f64 = 30.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const FALLBACK_MESSAGE: &str =
    "This host does not provide every detection capability this demo needs. \
     Enable the missing detectors or run with fewer capabilities.";
